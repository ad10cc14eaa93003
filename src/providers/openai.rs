//! OpenAI-compatible provider.
//!
//! Talks to any endpoint that speaks the OpenAI chat completions format
//! with a static bearer API key. Unlike the Copilot provider there is no
//! token exchange; an authentication failure here is final.

use std::time::Duration;

use crate::prompts::Prompts;
use crate::providers::types::{ChatRequest, ChatResponse};
use crate::providers::{
    parse_suggestion_lines, ProviderError, ProviderFuture, SuggestionProvider,
};

/// Default OpenAI API endpoint.
const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1";

/// Default model when none is configured.
const DEFAULT_MODEL: &str = "gpt-3.5-turbo";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Suggestion provider for OpenAI and OpenAI-compatible endpoints.
pub struct OpenAiProvider {
    id: &'static str,
    http: reqwest::Client,
    api_key: String,
    model: String,
    endpoint: String,
    prompts: Prompts,
}

impl OpenAiProvider {
    /// Create a provider against `endpoint` (empty selects the OpenAI
    /// default).
    pub fn new(api_key: String, model: &str, endpoint: &str, prompts: Prompts) -> Self {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self::with_http("openai", http, api_key, model, endpoint, prompts)
    }

    /// Shared constructor for OpenAI-compatible providers that bring their
    /// own pre-configured client (e.g. with identification headers).
    pub(super) fn with_http(
        id: &'static str,
        http: reqwest::Client,
        api_key: String,
        model: &str,
        endpoint: &str,
        prompts: Prompts,
    ) -> Self {
        let model = model.trim();
        let endpoint = if endpoint.is_empty() {
            DEFAULT_ENDPOINT.to_string()
        } else {
            endpoint.trim_end_matches('/').to_string()
        };

        Self {
            id,
            http,
            api_key,
            model: if model.is_empty() {
                DEFAULT_MODEL.to_string()
            } else {
                model.to_string()
            },
            endpoint,
            prompts,
        }
    }

    async fn generate(&self, request: ChatRequest) -> Result<Vec<String>, ProviderError> {
        let response = self
            .http
            .post(format!("{}/chat/completions", self.endpoint))
            .bearer_auth(&self.api_key)
            .json(&request)
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

        let response: ChatResponse = response.json().await?;
        let suggestions =
            parse_suggestion_lines(response.first_content().unwrap_or_default());
        if suggestions.is_empty() {
            return Err(ProviderError::NoSuggestions);
        }
        Ok(suggestions)
    }
}

impl SuggestionProvider for OpenAiProvider {
    fn id(&self) -> &str {
        self.id
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

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider_against(server: &MockServer) -> OpenAiProvider {
        OpenAiProvider::new(
            "sk-test".to_string(),
            "gpt-4o-mini",
            &server.uri(),
            Prompts::defaults(),
        )
    }

    #[test]
    fn test_defaults() {
        let provider =
            OpenAiProvider::new("sk-test".into(), "", "", Prompts::defaults());
        assert_eq!(provider.model, "gpt-3.5-turbo");
        assert_eq!(provider.endpoint, "https://api.openai.com/v1");
        assert_eq!(provider.id(), "openai");
    }

    #[tokio::test]
    async fn test_commit_messages() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("Authorization", "Bearer sk-test"))
            .and(body_partial_json(serde_json::json!({"model": "gpt-4o-mini"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [
                    {"message": {"role": "assistant", "content": "feat: one\nfix: two"}}
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let provider = provider_against(&server);
        let suggestions = provider.commit_messages("diff --git a/x b/x").await.unwrap();
        assert_eq!(suggestions, vec!["feat: one", "fix: two"]);
    }

    #[tokio::test]
    async fn test_api_error_carries_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid key"))
            .mount(&server)
            .await;

        let provider = provider_against(&server);
        let err = provider.pr_titles("diff --git a/x b/x").await.unwrap_err();
        match err {
            ProviderError::Api { status, message } => {
                assert_eq!(status, 401);
                assert_eq!(message, "invalid key");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_empty_diff_rejected() {
        let server = MockServer::start().await;
        let provider = provider_against(&server);
        let err = provider.commit_messages("").await.unwrap_err();
        assert!(matches!(err, ProviderError::EmptyDiff));
    }

    #[tokio::test]
    async fn test_empty_choices_is_no_suggestions() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"choices": []})),
            )
            .mount(&server)
            .await;

        let provider = provider_against(&server);
        let err = provider.commit_messages("diff --git a/x b/x").await.unwrap_err();
        assert!(matches!(err, ProviderError::NoSuggestions));
    }
}
