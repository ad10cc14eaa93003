//! Command implementations for the CLI.

pub mod commit;
pub mod config;
pub mod pr;

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;

use crate::auth::TokenCache;
use crate::config::Config;
use crate::prompts::Prompts;
use crate::providers::claude::ClaudeCliProvider;
use crate::providers::copilot::CopilotProvider;
use crate::providers::openai::OpenAiProvider;
use crate::providers::openrouter::OpenRouterProvider;
use crate::providers::SuggestionProvider;

/// Build the configured suggestion provider.
///
/// An unrecognized provider name falls back to Copilot, the default
/// backend.
pub(crate) async fn resolve_provider(cfg: &Config) -> Result<Box<dyn SuggestionProvider>> {
    let config_dir = crate::config::config_dir();
    let cwd = std::env::current_dir()?;
    let repo_root = crate::git::repo_root(&cwd).await.ok();
    let prompts = Prompts::load(&config_dir, repo_root.as_deref());

    let provider: Box<dyn SuggestionProvider> = match cfg.provider_name() {
        "claude" => Box::new(ClaudeCliProvider::new(
            &cfg.model().unwrap_or_default(),
            cfg.num_suggestions(),
            prompts,
        )),
        "openai" => Box::new(OpenAiProvider::new(
            cfg.api_key()?,
            &cfg.model().unwrap_or_default(),
            &cfg.endpoint()?,
            prompts,
        )),
        "openrouter" => Box::new(OpenRouterProvider::new(
            cfg.api_key()?,
            &cfg.model().unwrap_or_default(),
            prompts,
        )),
        _ => {
            let credential = copilot_credential(cfg, &config_dir).await;
            let cache = Arc::new(TokenCache::new(&config_dir));
            Box::new(CopilotProvider::new(
                credential,
                &cfg.model().unwrap_or_default(),
                &cfg.endpoint().unwrap_or_default(),
                cache,
                prompts,
            ))
        }
    };

    tracing::debug!(provider = provider.id(), "provider resolved");
    Ok(provider)
}

/// Long-lived GitHub credential for the Copilot provider: the configured
/// API key when present, otherwise gh CLI / host-file discovery. The
/// provider itself falls back to `GITHUB_TOKEN` when this returns `None`.
async fn copilot_credential(cfg: &Config, config_dir: &Path) -> Option<String> {
    if let Ok(key) = cfg.api_key() {
        return Some(key);
    }
    crate::config::load_github_token(config_dir).await.ok()
}
