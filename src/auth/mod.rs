//! Bearer-token acquisition and caching for the Copilot provider.
//!
//! The long-lived GitHub credential is exchanged for a short-lived bearer
//! token by [`TokenExchanger`]; [`TokenCache`] keeps the result in memory
//! and on disk (keyed by a fingerprint of the credential, never the
//! credential itself) so repeated invocations skip the exchange.

pub mod cache;
pub mod exchange;
pub mod token;

pub use cache::TokenCache;
pub use exchange::TokenExchanger;
pub use token::CachedToken;

/// Errors that can occur while obtaining or caching bearer tokens.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// No long-lived credential was configured or discoverable.
    #[error(
        "GitHub token is required for the Copilot provider; run 'gh auth login' or set GITHUB_TOKEN"
    )]
    MissingCredential,

    /// The exchange endpoint rejected the credential.
    #[error("token exchange failed (HTTP {status}): {message}")]
    ExchangeFailed { status: u16, message: String },

    /// The exchange endpoint returned success with an empty token field.
    #[error("token exchange returned an empty bearer token")]
    EmptyToken,

    /// Durable cache I/O failure. Callers treat this as non-fatal.
    #[error("token cache error: {0}")]
    Storage(String),

    /// The exchange request timed out or was cancelled.
    #[error("token exchange timed out")]
    Timeout,

    /// Transport-level HTTP failure.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = AuthError::ExchangeFailed {
            status: 403,
            message: "forbidden".into(),
        };
        assert_eq!(
            err.to_string(),
            "token exchange failed (HTTP 403): forbidden"
        );

        assert!(AuthError::MissingCredential
            .to_string()
            .contains("gh auth login"));
    }
}
