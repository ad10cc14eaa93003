//! `lazycommit config`: inspect and update configuration.

use anyhow::{bail, Context, Result};

use crate::config::{self, Config};
use crate::prompts::{Prompts, PROMPTS_FILE_NAME};

/// Print the active provider, model and endpoint.
pub fn get(cfg: &Config) -> Result<()> {
    println!("Active Provider: {}", cfg.provider_name());
    println!("Model: {}", cfg.model().unwrap_or_default());
    println!("Endpoint: {}", cfg.endpoint().unwrap_or_default());
    Ok(())
}

/// Update one configuration value. Provider-scoped keys apply to the
/// active provider.
pub fn set(cfg: &mut Config, key: &str, value: &str) -> Result<()> {
    match key {
        "provider" => {
            cfg.set_active_provider(value)?;
            println!("Provider set to: {value}");
        }
        "model" => {
            cfg.set_model(value)?;
            println!("Model for {} set to: {value}", cfg.provider_name());
        }
        "api-key" => {
            cfg.set_api_key(value)?;
            println!("API key for {} set.", cfg.provider_name());
        }
        "endpoint" => {
            cfg.set_endpoint(value)?;
            println!("Endpoint for {} set to: {value}", cfg.provider_name());
        }
        "num-suggestions" => {
            let count: u32 = value
                .parse()
                .with_context(|| format!("'{value}' is not a valid suggestion count"))?;
            cfg.set_num_suggestions(count)?;
            println!("Suggestion count for {} set to: {count}", cfg.provider_name());
        }
        "language" => {
            let path = config::config_dir().join(PROMPTS_FILE_NAME);
            let mut prompts = Prompts::load(&config::config_dir(), None);
            prompts.language = value.to_string();
            prompts
                .save(&path)
                .with_context(|| format!("failed to write {}", path.display()))?;
            println!("Language set to: {value}");
        }
        other => bail!(
            "unknown config key '{other}' (expected provider, model, api-key, endpoint, num-suggestions, or language)"
        ),
    }
    Ok(())
}
