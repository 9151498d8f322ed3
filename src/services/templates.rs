use async_trait::async_trait;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("Template fragment '{id}' not found at {path}")]
    Missing { id: String, path: String },

    #[error("Invalid template fragment id: {0}")]
    InvalidId(String),

    #[error("Failed to read template fragment '{id}': {source}")]
    Io {
        id: String,
        #[source]
        source: std::io::Error,
    },
}

/// Read-only source of prompt fragment text.
#[async_trait]
pub trait TemplateStore: Send + Sync {
    async fn read(&self, fragment_id: &str) -> Result<String, TemplateError>;
}

/// Fragments stored as `<dir>/<fragment-id>.txt`.
///
/// Files are read on every call so redeployed templates take effect without a restart.
#[derive(Debug, Clone)]
pub struct FsTemplateStore {
    dir: PathBuf,
}

impl FsTemplateStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn is_valid_id(id: &str) -> bool {
        !id.is_empty()
            && id.len() <= 64
            && id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    }
}

#[async_trait]
impl TemplateStore for FsTemplateStore {
    async fn read(&self, fragment_id: &str) -> Result<String, TemplateError> {
        if !Self::is_valid_id(fragment_id) {
            return Err(TemplateError::InvalidId(fragment_id.to_string()));
        }

        let path = self.dir.join(format!("{fragment_id}.txt"));
        match tokio::fs::read_to_string(&path).await {
            Ok(text) => Ok(text),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(TemplateError::Missing {
                id: fragment_id.to_string(),
                path: path.display().to_string(),
            }),
            Err(source) => Err(TemplateError::Io {
                id: fragment_id.to_string(),
                source,
            }),
        }
    }
}
