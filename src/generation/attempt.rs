use std::time::Duration;
use thiserror::Error;

use super::validator::{AttemptResult, GeneratedArticle};
use super::{ConversationMessage, GenerativeApi, GenerativeError, SystemPrompt};

pub const DEFAULT_MAX_ATTEMPTS: u32 = 2;
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(60);

/// Characters of the last raw answer kept in a failure report.
pub const DEBUG_PREVIEW_CHARS: usize = 500;

/// How many times to ask, and how long to wait for each answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttemptPolicy {
    pub max_attempts: u32,
    pub call_timeout: Duration,
}

impl Default for AttemptPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            call_timeout: DEFAULT_CALL_TIMEOUT,
        }
    }
}

impl AttemptPolicy {
    pub fn from_config(config: &crate::config::GenerationConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            call_timeout: config.call_timeout(),
        }
    }
}

#[derive(Debug, Error)]
pub enum GenerationError {
    /// Transport failure or timeout; the loop stops immediately.
    #[error(transparent)]
    Generative(#[from] GenerativeError),

    #[error("output failed validation after {attempts} attempts ({last_kind})")]
    Exhausted {
        attempts: u32,
        last_kind: &'static str,
        debug_preview: String,
    },
}

/// Ask the generative API for an article until one validates or the policy runs out.
///
/// A valid answer ends the loop at once. Parse and shape failures are retried;
/// transport failures and timeouts are not. Dropping the returned future
/// cancels the in-flight call.
pub async fn generate_article(
    api: &dyn GenerativeApi,
    system_prompt: &SystemPrompt,
    messages: &[ConversationMessage],
    policy: &AttemptPolicy,
) -> Result<GeneratedArticle, GenerationError> {
    let max_attempts = policy.max_attempts.max(1);
    let mut last = None;

    for attempt in 1..=max_attempts {
        let raw = tokio::time::timeout(policy.call_timeout, api.complete(system_prompt, messages))
            .await
            .map_err(|_| GenerativeError::Timeout(policy.call_timeout))??;

        match AttemptResult::decode(raw) {
            AttemptResult::Valid(article) => {
                tracing::info!(attempt, "Generated article passed validation");
                return Ok(article);
            }
            failed => {
                tracing::warn!(
                    attempt,
                    max_attempts,
                    outcome = failed.kind(),
                    "Generated output rejected"
                );
                last = Some(failed);
            }
        }
    }

    let (last_kind, debug_preview) = match &last {
        Some(result) => (result.kind(), preview(result.raw().unwrap_or_default())),
        None => ("none", String::new()),
    };

    Err(GenerationError::Exhausted {
        attempts: max_attempts,
        last_kind,
        debug_preview,
    })
}

/// First [`DEBUG_PREVIEW_CHARS`] characters of `raw`, cut on a char boundary.
pub fn preview(raw: &str) -> String {
    raw.chars().take(DEBUG_PREVIEW_CHARS).collect()
}
