//! OpenRouter provider.
//!
//! OpenRouter speaks the OpenAI chat completions format; this wraps the
//! OpenAI provider with the fixed OpenRouter endpoint and the app
//! identification headers OpenRouter asks integrations to send.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue};

use crate::prompts::Prompts;
use crate::providers::openai::OpenAiProvider;
use crate::providers::{ProviderFuture, SuggestionProvider};

const ENDPOINT: &str = "https://openrouter.ai/api/v1";

const REFERER: &str = "https://github.com/m7medvision/lazycommit";
const APP_TITLE: &str = "LazyCommit";
const CLIENT_USER_AGENT: &str = "LazyCommit/1.0";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Suggestion provider backed by OpenRouter.
pub struct OpenRouterProvider {
    inner: OpenAiProvider,
}

impl OpenRouterProvider {
    pub fn new(api_key: String, model: &str, prompts: Prompts) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert("HTTP-Referer", HeaderValue::from_static(REFERER));
        headers.insert("X-Title", HeaderValue::from_static(APP_TITLE));
        headers.insert(
            reqwest::header::USER_AGENT,
            HeaderValue::from_static(CLIENT_USER_AGENT),
        );

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_default();

        Self {
            inner: OpenAiProvider::with_http(
                "openrouter",
                http,
                api_key,
                model,
                ENDPOINT,
                prompts,
            ),
        }
    }
}

impl SuggestionProvider for OpenRouterProvider {
    fn id(&self) -> &str {
        self.inner.id()
    }

    fn commit_messages(&self, diff: &str) -> ProviderFuture<'_, Vec<String>> {
        self.inner.commit_messages(diff)
    }

    fn pr_titles(&self, diff: &str) -> ProviderFuture<'_, Vec<String>> {
        self.inner.pr_titles(diff)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id() {
        let provider =
            OpenRouterProvider::new("sk-or".into(), "gpt-4o", Prompts::defaults());
        assert_eq!(provider.id(), "openrouter");
    }
}
