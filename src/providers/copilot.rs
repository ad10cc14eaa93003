//! GitHub Copilot provider.
//!
//! Copilot's chat API is not driven by the GitHub credential directly: the
//! long-lived credential is exchanged for a short-lived bearer token
//! (cached across invocations by [`TokenCache`]), and a chat client bound
//! to that bearer is kept for the lifetime of the token. When a chat call
//! fails with an authentication error the caches are invalidated and the
//! whole chain is rebuilt, exactly once.

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue};
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::auth::{AuthError, TokenCache, TokenExchanger};
use crate::prompts::Prompts;
use crate::providers::types::{ChatRequest, ChatResponse};
use crate::providers::{
    is_auth_error, parse_suggestion_lines, ProviderError, ProviderFuture, SuggestionProvider,
};

/// Default chat completions endpoint.
const DEFAULT_ENDPOINT: &str = "https://api.githubcopilot.com";

/// Default model when none is configured.
const DEFAULT_MODEL: &str = "gpt-4o";

/// Editor identification required by the Copilot API.
const EDITOR_VERSION: &str = "lazycommit/1.0";
const INTEGRATION_ID: &str = "vscode-chat";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const POOL_IDLE_TIMEOUT: Duration = Duration::from_secs(90);
const POOL_MAX_IDLE_PER_HOST: usize = 5;

/// Chat client bound to one bearer token.
///
/// Building the reqwest client (connection pool, default headers) is the
/// expensive part; it is reused for every request made with the same
/// bearer and only rebuilt when the bearer changes.
struct BoundClient {
    http: reqwest::Client,
    bearer: String,
}

impl BoundClient {
    fn new(bearer: String) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert("Editor-Version", HeaderValue::from_static(EDITOR_VERSION));
        headers.insert(
            "Editor-Plugin-Version",
            HeaderValue::from_static(EDITOR_VERSION),
        );
        headers.insert(
            "Copilot-Integration-Id",
            HeaderValue::from_static(INTEGRATION_ID),
        );

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .pool_max_idle_per_host(POOL_MAX_IDLE_PER_HOST)
            .pool_idle_timeout(POOL_IDLE_TIMEOUT)
            .build()
            .unwrap_or_default();

        Self { http, bearer }
    }
}

/// Suggestion provider backed by the GitHub Copilot chat API.
pub struct CopilotProvider {
    credential: Option<String>,
    model: String,
    endpoint: String,
    exchanger: TokenExchanger,
    cache: Arc<TokenCache>,
    prompts: Prompts,
    client: RwLock<Option<Arc<BoundClient>>>,
}

impl CopilotProvider {
    /// Create a provider.
    ///
    /// `credential` is the configured long-lived GitHub token; when empty
    /// the `GITHUB_TOKEN` environment variable is consulted at call time.
    /// Empty `model`/`endpoint` select the defaults.
    pub fn new(
        credential: Option<String>,
        model: &str,
        endpoint: &str,
        cache: Arc<TokenCache>,
        prompts: Prompts,
    ) -> Self {
        let endpoint = if endpoint.is_empty() {
            DEFAULT_ENDPOINT.to_string()
        } else {
            endpoint.trim_end_matches('/').to_string()
        };

        Self {
            credential: credential.filter(|c| !c.is_empty()),
            model: normalize_model(model),
            endpoint,
            exchanger: TokenExchanger::new(cache.clone()),
            cache,
            prompts,
            client: RwLock::new(None),
        }
    }

    /// Point the token exchange at a different endpoint (tests, proxies).
    pub fn with_exchange_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.exchanger = TokenExchanger::new(self.cache.clone()).with_endpoint(endpoint);
        self
    }

    /// The long-lived credential: configured value, or `GITHUB_TOKEN`.
    fn credential(&self) -> Option<String> {
        self.credential.clone().or_else(|| {
            std::env::var("GITHUB_TOKEN")
                .ok()
                .filter(|t| !t.is_empty())
        })
    }

    /// A usable bearer token: cache tiers first, exchange on a full miss.
    async fn bearer_token(&self) -> Result<String, AuthError> {
        let credential = self.credential().ok_or(AuthError::MissingCredential)?;

        if let Some(cached) = self.cache.get(&credential) {
            return Ok(cached.token);
        }

        let token = self.exchanger.exchange(&credential).await?;
        Ok(token.token)
    }

    /// The chat client bound to the current bearer token.
    ///
    /// The rebuild check is a plain value comparison against the bearer
    /// the existing client was built with; validity was already checked
    /// when the bearer was obtained.
    async fn get_or_create_client(&self) -> Result<Arc<BoundClient>, ProviderError> {
        let bearer = self.bearer_token().await?;

        // Fast path: the client for this bearer already exists.
        {
            let guard = self.client.read().await;
            if let Some(client) = guard.as_ref() {
                if client.bearer == bearer {
                    return Ok(client.clone());
                }
            }
        }

        let mut guard = self.client.write().await;
        // Another caller may have built the client while we waited.
        match guard.as_ref() {
            Some(client) if client.bearer == bearer => Ok(client.clone()),
            _ => {
                debug!("building chat client for current bearer token");
                let client = Arc::new(BoundClient::new(bearer));
                *guard = Some(client.clone());
                Ok(client)
            }
        }
    }

    /// Recovery path for authentication failures observed on a chat call:
    /// drop both cache tiers and the bound client, then rebuild from a
    /// fresh exchange.
    async fn invalidate_and_retry(&self) -> Result<Arc<BoundClient>, ProviderError> {
        info!("bearer token rejected; invalidating token cache");
        self.cache.invalidate();
        {
            let mut guard = self.client.write().await;
            *guard = None;
        }
        self.get_or_create_client().await
    }

    async fn complete(
        &self,
        client: &BoundClient,
        request: &ChatRequest,
    ) -> Result<ChatResponse, ProviderError> {
        let response = client
            .http
            .post(format!("{}/chat/completions", self.endpoint))
            .bearer_auth(&client.bearer)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ProviderError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response.json().await?)
    }

    async fn generate(&self, request: ChatRequest) -> Result<Vec<String>, ProviderError> {
        let client = self.get_or_create_client().await?;

        let response = match self.complete(&client, &request).await {
            Ok(response) => response,
            Err(err) if is_auth_error(&err) => {
                let client = self.invalidate_and_retry().await?;
                self.complete(&client, &request).await?
            }
            Err(err) => return Err(err),
        };

        let suggestions =
            parse_suggestion_lines(response.first_content().unwrap_or_default());
        if suggestions.is_empty() {
            return Err(ProviderError::NoSuggestions);
        }
        Ok(suggestions)
    }
}

/// Normalize configured model names: strip a `vendor/` prefix, default
/// when empty.
fn normalize_model(model: &str) -> String {
    let model = model.trim();
    if model.is_empty() {
        return DEFAULT_MODEL.to_string();
    }
    match model.split_once('/') {
        Some((_, suffix)) if !suffix.is_empty() => suffix.to_string(),
        _ => model.to_string(),
    }
}

impl SuggestionProvider for CopilotProvider {
    fn id(&self) -> &str {
        "copilot"
    }

    fn commit_messages(&self, diff: &str) -> ProviderFuture<'_, Vec<String>> {
        let diff = diff.to_string();
        Box::pin(async move {
            if diff.trim().is_empty() {
                return Err(ProviderError::EmptyDiff);
            }
            let request = ChatRequest::new(
                &self.model,
                self.prompts.system_message(),
                self.prompts.commit_prompt(&diff),
            );
            self.generate(request).await
        })
    }

    fn pr_titles(&self, diff: &str) -> ProviderFuture<'_, Vec<String>> {
        let diff = diff.to_string();
        Box::pin(async move {
            if diff.trim().is_empty() {
                return Err(ProviderError::EmptyDiff);
            }
            let request = ChatRequest::new(
                &self.model,
                self.prompts.system_message(),
                self.prompts.pr_title_prompt(&diff),
            );
            self.generate(request).await
        })
    }
}
