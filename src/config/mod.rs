use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub generation: GenerationConfig,
    pub templates: TemplateConfig,
    pub identity: IdentityConfig,
    pub database: DatabaseConfig,
    pub api: ApiConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    pub model: String,
    pub temperature: f32,
    pub max_completion_tokens: u32,
    /// Attempts per request before giving up on malformed output.
    pub max_attempts: u32,
    pub call_timeout_secs: u64,
    pub api_base_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateConfig {
    pub dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityConfig {
    pub api_base_url: String,
    pub project_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub max_connections: u32,
    pub connection_timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub enable_request_logging: bool,
    pub max_request_size_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    #[serde(skip_serializing)]
    pub jwt_secret: String,
    pub jwt_expiry_hours: u64,
    /// Include error details in 500 responses. Never enabled by the production profile.
    pub expose_error_details: bool,
}

impl GenerationConfig {
    /// Per-call timeout, never shorter than one second.
    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.call_timeout_secs.max(1))
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // Generation overrides
        if let Ok(v) = env::var("GENERATION_MODEL") {
            self.generation.model = v;
        }
        if let Ok(v) = env::var("GENERATION_TEMPERATURE") {
            self.generation.temperature = v.parse().unwrap_or(self.generation.temperature);
        }
        if let Ok(v) = env::var("GENERATION_MAX_COMPLETION_TOKENS") {
            self.generation.max_completion_tokens = v.parse().unwrap_or(self.generation.max_completion_tokens);
        }
        if let Ok(v) = env::var("GENERATION_MAX_ATTEMPTS") {
            self.generation.max_attempts = v.parse().unwrap_or(self.generation.max_attempts);
        }
        if let Ok(v) = env::var("GENERATION_CALL_TIMEOUT_SECS") {
            self.generation.call_timeout_secs = v.parse().unwrap_or(self.generation.call_timeout_secs);
        }
        if let Ok(v) = env::var("GENERATION_API_BASE_URL") {
            self.generation.api_base_url = v;
        }

        if let Ok(v) = env::var("TEMPLATES_DIR") {
            self.templates.dir = PathBuf::from(v);
        }

        // Identity provider overrides
        if let Ok(v) = env::var("IDENTITY_API_BASE_URL") {
            self.identity.api_base_url = v;
        }
        if let Ok(v) = env::var("IDENTITY_PROJECT_ID") {
            self.identity.project_id = v;
        }

        // Database overrides
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = v.parse().unwrap_or(self.database.connection_timeout);
        }

        // API overrides
        if let Ok(v) = env::var("API_ENABLE_REQUEST_LOGGING") {
            self.api.enable_request_logging = v.parse().unwrap_or(self.api.enable_request_logging);
        }
        if let Ok(v) = env::var("API_MAX_REQUEST_SIZE_BYTES") {
            self.api.max_request_size_bytes = v.parse().unwrap_or(self.api.max_request_size_bytes);
        }

        // Security overrides
        if let Ok(v) = env::var("JWT_SECRET") {
            self.security.jwt_secret = v;
        }
        if let Ok(v) = env::var("SECURITY_JWT_EXPIRY_HOURS") {
            self.security.jwt_expiry_hours = v.parse().unwrap_or(self.security.jwt_expiry_hours);
        }
        if let Ok(v) = env::var("SECURITY_EXPOSE_ERROR_DETAILS") {
            self.security.expose_error_details = v.parse().unwrap_or(self.security.expose_error_details);
        }

        self
    }

    fn generation_defaults(call_timeout_secs: u64) -> GenerationConfig {
        GenerationConfig {
            model: "gpt-4.1-mini".to_string(),
            temperature: 0.3,
            max_completion_tokens: 4096,
            max_attempts: 2,
            call_timeout_secs,
            api_base_url: "https://api.openai.com/v1".to_string(),
        }
    }

    fn identity_defaults() -> IdentityConfig {
        IdentityConfig {
            api_base_url: "https://identitytoolkit.googleapis.com/v1".to_string(),
            project_id: String::new(),
        }
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            generation: Self::generation_defaults(90),
            templates: TemplateConfig {
                dir: PathBuf::from("templates"),
            },
            identity: Self::identity_defaults(),
            database: DatabaseConfig {
                max_connections: 5,
                connection_timeout: 30,
            },
            api: ApiConfig {
                enable_request_logging: true,
                max_request_size_bytes: 1024 * 1024, // 1MB
            },
            security: SecurityConfig {
                jwt_secret: String::new(),
                jwt_expiry_hours: 24,
                expose_error_details: true,
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            generation: Self::generation_defaults(60),
            templates: TemplateConfig {
                dir: PathBuf::from("templates"),
            },
            identity: Self::identity_defaults(),
            database: DatabaseConfig {
                max_connections: 10,
                connection_timeout: 10,
            },
            api: ApiConfig {
                enable_request_logging: true,
                max_request_size_bytes: 512 * 1024,
            },
            security: SecurityConfig {
                jwt_secret: String::new(),
                jwt_expiry_hours: 4,
                expose_error_details: false,
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            generation: Self::generation_defaults(60),
            templates: TemplateConfig {
                dir: PathBuf::from("templates"),
            },
            identity: Self::identity_defaults(),
            database: DatabaseConfig {
                max_connections: 20,
                connection_timeout: 5,
            },
            api: ApiConfig {
                enable_request_logging: false,
                max_request_size_bytes: 512 * 1024,
            },
            security: SecurityConfig {
                jwt_secret: String::new(),
                jwt_expiry_hours: 1,
                expose_error_details: false,
            },
        }
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}

#[macro_export]
macro_rules! is_production {
    () => {
        matches!($crate::config::CONFIG.environment, $crate::config::Environment::Production)
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_development_config() {
        let config = AppConfig::development();
        assert!(config.security.expose_error_details);
        assert_eq!(config.generation.max_attempts, 2);
        assert_eq!(config.generation.model, "gpt-4.1-mini");
    }

    #[test]
    fn test_default_production_config() {
        let config = AppConfig::production();
        assert!(!config.security.expose_error_details);
        assert_eq!(config.generation.call_timeout(), Duration::from_secs(60));
        assert_eq!(config.generation.max_completion_tokens, 4096);
    }

    #[test]
    fn zero_call_timeout_is_clamped() {
        let mut config = AppConfig::development();
        config.generation.call_timeout_secs = 0;
        assert_eq!(config.generation.call_timeout(), Duration::from_secs(1));

        config.generation.call_timeout_secs = 45;
        assert_eq!(config.generation.call_timeout(), Duration::from_secs(45));
    }

    #[test]
    fn secret_is_not_serialized() {
        let mut config = AppConfig::development();
        config.security.jwt_secret = "hunter2".to_string();
        let dumped = serde_json::to_string(&config).unwrap();
        assert!(!dumped.contains("hunter2"));
    }
}
