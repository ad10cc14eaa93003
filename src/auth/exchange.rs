//! Exchange of a long-lived GitHub credential for a short-lived bearer
//! token.
//!
//! The exchange is a single authenticated GET against a fixed endpoint.
//! A successful exchange is written to the token cache on a best-effort
//! basis: persistence failure is logged, never surfaced to the caller.

use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, warn};

use super::cache::TokenCache;
use super::token::CachedToken;
use super::AuthError;

/// Fixed endpoint that exchanges a GitHub credential for a Copilot bearer
/// token.
const EXCHANGE_URL: &str = "https://api.github.com/copilot_internal/v2/token";

/// Identifying client header sent with every exchange request.
const CLIENT_USER_AGENT: &str = "lazycommit/1.0";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const POOL_IDLE_TIMEOUT: Duration = Duration::from_secs(90);
const POOL_MAX_IDLE_PER_HOST: usize = 5;

#[derive(Debug, Deserialize)]
struct ExchangeResponse {
    #[serde(default)]
    token: String,
    #[serde(default)]
    expires_at: i64,
}

#[derive(Debug, Default, Deserialize)]
struct ExchangeErrorBody {
    #[serde(default)]
    message: String,
}

/// Performs the credential-for-token exchange and caches the result.
pub struct TokenExchanger {
    http: reqwest::Client,
    endpoint: String,
    cache: Arc<TokenCache>,
}

impl TokenExchanger {
    /// Create an exchanger against the default endpoint, caching results
    /// in `cache`.
    pub fn new(cache: Arc<TokenCache>) -> Self {
        Self {
            http: http_client(),
            endpoint: EXCHANGE_URL.to_string(),
            cache,
        }
    }

    /// Point the exchanger at a different endpoint (tests, proxies).
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Exchange `credential` for a fresh bearer token.
    ///
    /// Fails on non-success status (carrying the status code and any
    /// server-provided message) and on a success response with an empty
    /// token field; the latter is a protocol violation by the remote side
    /// and is never cached.
    pub async fn exchange(&self, credential: &str) -> Result<CachedToken, AuthError> {
        debug!("exchanging credential for a bearer token");

        let response = self
            .http
            .get(&self.endpoint)
            .header(reqwest::header::AUTHORIZATION, format!("Token {credential}"))
            .header(reqwest::header::USER_AGENT, CLIENT_USER_AGENT)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body: ExchangeErrorBody = response.json().await.unwrap_or_default();
            return Err(AuthError::ExchangeFailed {
                status: status.as_u16(),
                message: body.message,
            });
        }

        let body: ExchangeResponse = response.json().await.map_err(map_transport_error)?;
        if body.token.is_empty() {
            return Err(AuthError::EmptyToken);
        }

        if let Err(e) = self.cache.save(&body.token, body.expires_at, credential) {
            warn!(error = %e, "failed to cache exchanged token");
        }

        debug!(expires_at = body.expires_at, "bearer token exchanged");
        Ok(CachedToken::new(body.token, body.expires_at, credential))
    }
}

fn map_transport_error(err: reqwest::Error) -> AuthError {
    if err.is_timeout() {
        AuthError::Timeout
    } else {
        AuthError::Http(err)
    }
}

/// Connection-reuse-friendly client for a CLI making occasional calls:
/// bounded idle pool, bounded idle lifetime, overall request timeout.
fn http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .pool_max_idle_per_host(POOL_MAX_IDLE_PER_HOST)
        .pool_idle_timeout(POOL_IDLE_TIMEOUT)
        .build()
        .unwrap_or_default()
}
