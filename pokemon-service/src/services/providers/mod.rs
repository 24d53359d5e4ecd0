//! Generative text provider abstraction and implementations.
//!
//! The recommendation flow only needs prompt-in, text-out; the trait keeps
//! the Gemini client swappable for the mock in tests.

pub mod gemini;
pub mod mock;

use async_trait::async_trait;
use thiserror::Error;

/// Error type for provider operations.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Rate limited")]
    RateLimited,

    #[error("Content filtered")]
    ContentFiltered,

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Provider returned no text")]
    EmptyCompletion,
}

/// Result of a completion request.
#[derive(Debug, Clone)]
pub struct ProviderResponse {
    /// Completion text, never empty.
    pub text: String,

    /// Input tokens consumed.
    pub input_tokens: i32,

    /// Output tokens generated.
    pub output_tokens: i32,

    pub finish_reason: FinishReason,
}

/// Reason why generation stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishReason {
    Complete,
    Length,
    ContentFilter,
    Error,
}

impl FinishReason {
    pub fn from_api(reason: Option<&str>) -> Self {
        match reason {
            Some("STOP") | None => FinishReason::Complete,
            Some("MAX_TOKENS") => FinishReason::Length,
            Some("SAFETY") | Some("PROHIBITED_CONTENT") | Some("BLOCKLIST") => {
                FinishReason::ContentFilter
            }
            Some(_) => FinishReason::Error,
        }
    }
}

/// Trait for text generation providers (e.g., Gemini).
#[async_trait]
pub trait TextProvider: Send + Sync {
    /// Complete `prompt` in a single request.
    async fn generate(&self, prompt: &str) -> Result<ProviderResponse, ProviderError>;

    /// Model identifier requests are sent to.
    fn model(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finish_reason_maps_api_values() {
        assert_eq!(FinishReason::from_api(Some("STOP")), FinishReason::Complete);
        assert_eq!(FinishReason::from_api(None), FinishReason::Complete);
        assert_eq!(FinishReason::from_api(Some("MAX_TOKENS")), FinishReason::Length);
        assert_eq!(FinishReason::from_api(Some("SAFETY")), FinishReason::ContentFilter);
        assert_eq!(FinishReason::from_api(Some("RECITATION")), FinishReason::Error);
    }
}
