//! Suggestion providers.
//!
//! Defines the [`SuggestionProvider`] trait and error type, plus concrete
//! backends: GitHub Copilot (token exchange + chat API), OpenAI-compatible
//! endpoints, OpenRouter, and a local `claude` CLI invocation.

pub mod claude;
pub mod copilot;
pub mod openai;
pub mod openrouter;
pub mod types;

use std::future::Future;
use std::pin::Pin;

use crate::auth::AuthError;

/// Boxed future returned by [`SuggestionProvider`] methods.
pub type ProviderFuture<'a, T> =
    Pin<Box<dyn Future<Output = Result<T, ProviderError>> + Send + 'a>>;

/// Errors that can occur while generating suggestions.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("no diff provided")]
    EmptyDiff,

    #[error("no suggestions generated")]
    NoSuggestions,

    #[error("claude CLI error: {0}")]
    Cli(String),
}

/// Trait implemented by all suggestion backends.
///
/// Async methods return boxed futures so the trait is dyn-compatible (can
/// be used as `Box<dyn SuggestionProvider>`). No `async_trait` macro is
/// needed.
pub trait SuggestionProvider: Send + Sync {
    /// Provider identifier (e.g. "copilot", "openai").
    fn id(&self) -> &str;

    /// Generate commit message suggestions for a staged diff, one entry
    /// per suggestion.
    fn commit_messages(&self, diff: &str) -> ProviderFuture<'_, Vec<String>>;

    /// Generate pull-request title suggestions for a branch diff.
    fn pr_titles(&self, diff: &str) -> ProviderFuture<'_, Vec<String>>;
}

/// Whether a downstream failure indicates the bearer token was rejected.
///
/// Classification is the caller's job, not the token layer's: a 401/403
/// status, or an unauthorized marker in the error text.
pub fn is_auth_error(err: &ProviderError) -> bool {
    match err {
        ProviderError::Api { status, message } => {
            matches!(status, 401 | 403)
                || message.contains("unauthorized")
                || message.contains("Unauthorized")
        }
        _ => false,
    }
}

/// Split completion output into one suggestion per non-empty line.
pub fn parse_suggestion_lines(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect()
}
