//! User configuration: provider selection, credentials, endpoints.
//!
//! Configuration lives in a TOML file in the user config directory and is
//! written with defaults on first run. API keys may reference environment
//! variables with a `$VAR` value, resolved at read time.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tokio::process::Command;
use tracing::{debug, info};

/// Configuration file name, under the config directory.
pub const CONFIG_FILE_NAME: &str = ".lazycommit.toml";

/// Default number of suggestions when unset.
const DEFAULT_NUM_SUGGESTIONS: u32 = 10;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("provider '{0}' is not configured")]
    UnknownProvider(String),

    #[error("API key for provider '{0}' is not set")]
    MissingApiKey(String),

    #[error("environment variable '{var}' for provider '{provider}' is not set or empty")]
    MissingEnvVar { var: String, provider: String },

    #[error("model for provider '{0}' is not set")]
    MissingModel(String),

    #[error("no default endpoint available for provider '{0}'")]
    NoDefaultEndpoint(String),

    #[error("invalid endpoint URL: {0}")]
    InvalidEndpoint(String),

    #[error(
        "GitHub token not found via 'gh auth token'; run 'gh auth login' to authenticate the GitHub CLI"
    )]
    GitHubTokenNotFound,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Per-provider settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub endpoint_url: String,
    #[serde(default)]
    pub num_suggestions: u32,
}

/// Persisted user configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_active_provider")]
    pub active_provider: String,

    #[serde(default)]
    pub providers: BTreeMap<String, ProviderConfig>,

    /// Where this config was loaded from; used by the setters to save.
    #[serde(skip)]
    path: PathBuf,
}

fn default_active_provider() -> String {
    "copilot".to_string()
}

impl Config {
    /// Load the configuration from `path`, or create it with defaults on
    /// first run. The defaults prefer the Copilot provider when a GitHub
    /// credential is discoverable, OpenAI otherwise.
    pub async fn load_or_init(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let mut config: Config = toml::from_str(&content)?;
            config.path = path.to_path_buf();
            return Ok(config);
        }

        let has_github_token = load_github_token(&config_dir()).await.is_ok();
        let mut config = Self::with_defaults(has_github_token);
        config.path = path.to_path_buf();
        config.save()?;
        info!(path = %path.display(), "created default config");
        Ok(config)
    }

    /// Built-in defaults. `prefer_copilot` selects which provider starts
    /// active.
    fn with_defaults(prefer_copilot: bool) -> Self {
        let mut providers = BTreeMap::new();
        providers.insert(
            "copilot".to_string(),
            ProviderConfig {
                model: "openai/gpt-5-mini".to_string(),
                ..Default::default()
            },
        );
        providers.insert(
            "openai".to_string(),
            ProviderConfig {
                model: "gpt-5-mini".to_string(),
                ..Default::default()
            },
        );
        providers.insert(
            "claude".to_string(),
            ProviderConfig {
                model: "claude-haiku-4-5".to_string(),
                num_suggestions: DEFAULT_NUM_SUGGESTIONS,
                ..Default::default()
            },
        );

        Self {
            active_provider: if prefer_copilot {
                "copilot".to_string()
            } else {
                "openai".to_string()
            },
            providers,
            path: PathBuf::new(),
        }
    }

    /// Write the configuration back to its file.
    pub fn save(&self) -> Result<(), ConfigError> {
        if let Some(dir) = self.path.parent() {
            if !dir.as_os_str().is_empty() && !dir.exists() {
                std::fs::create_dir_all(dir)?;
            }
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(&self.path, content)?;
        Ok(())
    }

    /// Name of the active provider.
    pub fn provider_name(&self) -> &str {
        &self.active_provider
    }

    /// Settings of the active provider.
    pub fn active(&self) -> Result<&ProviderConfig, ConfigError> {
        self.providers
            .get(&self.active_provider)
            .ok_or_else(|| ConfigError::UnknownProvider(self.active_provider.clone()))
    }

    /// API key of the active provider, resolving `$VAR` references
    /// through the environment.
    pub fn api_key(&self) -> Result<String, ConfigError> {
        let provider = self.active()?;
        if provider.api_key.is_empty() {
            return Err(ConfigError::MissingApiKey(self.active_provider.clone()));
        }

        if let Some(var) = provider.api_key.strip_prefix('$') {
            let value = std::env::var(var).unwrap_or_default();
            if value.is_empty() {
                return Err(ConfigError::MissingEnvVar {
                    var: var.to_string(),
                    provider: self.active_provider.clone(),
                });
            }
            return Ok(value);
        }

        Ok(provider.api_key.clone())
    }

    /// Model of the active provider.
    pub fn model(&self) -> Result<String, ConfigError> {
        let provider = self.active()?;
        if provider.model.is_empty() {
            return Err(ConfigError::MissingModel(self.active_provider.clone()));
        }
        Ok(provider.model.clone())
    }

    /// Endpoint of the active provider: the configured custom endpoint,
    /// or the provider's well-known default.
    pub fn endpoint(&self) -> Result<String, ConfigError> {
        let provider = self.active()?;
        if !provider.endpoint_url.is_empty() {
            return Ok(provider.endpoint_url.clone());
        }

        match self.active_provider.as_str() {
            "openai" => Ok("https://api.openai.com/v1".to_string()),
            "copilot" => Ok("https://api.githubcopilot.com".to_string()),
            "openrouter" => Ok("https://openrouter.ai/api/v1".to_string()),
            // The claude provider runs a local CLI; no endpoint needed.
            "claude" => Ok(String::new()),
            other => Err(ConfigError::NoDefaultEndpoint(other.to_string())),
        }
    }

    /// Suggestion count of the active provider, with a default.
    pub fn num_suggestions(&self) -> u32 {
        match self.active() {
            Ok(provider) if provider.num_suggestions > 0 => provider.num_suggestions,
            _ => DEFAULT_NUM_SUGGESTIONS,
        }
    }

    /// Switch the active provider and save.
    pub fn set_active_provider(&mut self, provider: &str) -> Result<(), ConfigError> {
        self.active_provider = provider.to_string();
        self.providers.entry(provider.to_string()).or_default();
        self.save()
    }

    /// Set the active provider's model and save.
    pub fn set_model(&mut self, model: &str) -> Result<(), ConfigError> {
        self.active_entry().model = model.to_string();
        self.save()
    }

    /// Set the active provider's API key and save.
    pub fn set_api_key(&mut self, api_key: &str) -> Result<(), ConfigError> {
        self.active_entry().api_key = api_key.to_string();
        self.save()
    }

    /// Set (and validate) the active provider's endpoint, then save.
    pub fn set_endpoint(&mut self, endpoint: &str) -> Result<(), ConfigError> {
        validate_endpoint_url(endpoint)?;
        self.active_entry().endpoint_url = endpoint.to_string();
        self.save()
    }

    /// Set the active provider's suggestion count and save.
    pub fn set_num_suggestions(&mut self, count: u32) -> Result<(), ConfigError> {
        self.active_entry().num_suggestions = count;
        self.save()
    }

    fn active_entry(&mut self) -> &mut ProviderConfig {
        self.providers
            .entry(self.active_provider.clone())
            .or_default()
    }
}

/// Validate a custom endpoint URL. Empty means "use the default" and is
/// valid.
pub fn validate_endpoint_url(endpoint: &str) -> Result<(), ConfigError> {
    if endpoint.is_empty() {
        return Ok(());
    }

    let parsed = url::Url::parse(endpoint)
        .map_err(|e| ConfigError::InvalidEndpoint(e.to_string()))?;

    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(ConfigError::InvalidEndpoint(
            "endpoint must use http or https protocol".to_string(),
        ));
    }
    if parsed.host_str().unwrap_or_default().is_empty() {
        return Err(ConfigError::InvalidEndpoint(
            "endpoint must have a valid host".to_string(),
        ));
    }

    Ok(())
}

/// The user configuration directory: `$XDG_CONFIG_HOME` when set,
/// otherwise the platform config directory.
pub fn config_dir() -> PathBuf {
    if let Some(xdg) = std::env::var_os("XDG_CONFIG_HOME") {
        if !xdg.is_empty() {
            return PathBuf::from(xdg);
        }
    }
    dirs::config_dir().unwrap_or_else(|| PathBuf::from("."))
}

/// Discover a GitHub credential for the Copilot provider.
///
/// Tries the `gh` CLI first, then the GitHub Copilot host files under the
/// config directory.
pub async fn load_github_token(config_dir: &Path) -> Result<String, ConfigError> {
    if let Some(token) = token_from_gh_cli().await {
        debug!("GitHub token obtained from gh CLI");
        return Ok(token);
    }

    for name in ["hosts.json", "apps.json"] {
        let path = config_dir.join("github-copilot").join(name);
        if let Some(token) = token_from_host_file(&path) {
            debug!(path = %path.display(), "GitHub token obtained from host file");
            return Ok(token);
        }
    }

    Err(ConfigError::GitHubTokenNotFound)
}

async fn token_from_gh_cli() -> Option<String> {
    let output = Command::new("gh")
        .args(["auth", "token"])
        .output()
        .await
        .ok()?;
    if !output.status.success() {
        return None;
    }
    let token = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if token.is_empty() {
        None
    } else {
        Some(token)
    }
}

/// Extract an OAuth token from a Copilot host file: any entry whose key
/// mentions github.com with a non-empty `oauth_token`.
fn token_from_host_file(path: &Path) -> Option<String> {
    let content = std::fs::read_to_string(path).ok()?;
    let data: BTreeMap<String, serde_json::Value> = serde_json::from_str(&content).ok()?;

    for (key, value) in &data {
        if !key.contains("github.com") {
            continue;
        }
        if let Some(token) = value.get("oauth_token").and_then(|t| t.as_str()) {
            if !token.is_empty() {
                return Some(token.to_string());
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_at(dir: &Path) -> Config {
        let mut config = Config::with_defaults(true);
        config.path = dir.join(CONFIG_FILE_NAME);
        config
    }

    #[test]
    fn test_defaults_prefer_copilot_with_token() {
        let config = Config::with_defaults(true);
        assert_eq!(config.provider_name(), "copilot");
        assert_eq!(config.active().unwrap().model, "openai/gpt-5-mini");
    }

    #[test]
    fn test_defaults_fall_back_to_openai() {
        let config = Config::with_defaults(false);
        assert_eq!(config.provider_name(), "openai");
    }

    #[test]
    fn test_api_key_plain_value() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config_at(dir.path());
        config.set_api_key("ghp_secret").unwrap();
        assert_eq!(config.api_key().unwrap(), "ghp_secret");
    }

    #[test]
    fn test_api_key_missing() {
        let config = Config::with_defaults(true);
        assert!(matches!(
            config.api_key().unwrap_err(),
            ConfigError::MissingApiKey(_)
        ));
    }

    #[test]
    fn test_api_key_env_reference() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config_at(dir.path());

        std::env::set_var("LAZYCOMMIT_TEST_KEY", "resolved-value");
        config.set_api_key("$LAZYCOMMIT_TEST_KEY").unwrap();
        assert_eq!(config.api_key().unwrap(), "resolved-value");
        std::env::remove_var("LAZYCOMMIT_TEST_KEY");

        // Unset variable is an error naming the variable.
        let err = config.api_key().unwrap_err();
        match err {
            ConfigError::MissingEnvVar { var, provider } => {
                assert_eq!(var, "LAZYCOMMIT_TEST_KEY");
                assert_eq!(provider, "copilot");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_default_endpoints() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config_at(dir.path());

        assert_eq!(config.endpoint().unwrap(), "https://api.githubcopilot.com");

        config.set_active_provider("openai").unwrap();
        assert_eq!(config.endpoint().unwrap(), "https://api.openai.com/v1");

        config.set_active_provider("openrouter").unwrap();
        assert_eq!(config.endpoint().unwrap(), "https://openrouter.ai/api/v1");

        config.set_active_provider("claude").unwrap();
        assert_eq!(config.endpoint().unwrap(), "");

        config.set_active_provider("mystery").unwrap();
        assert!(matches!(
            config.endpoint().unwrap_err(),
            ConfigError::NoDefaultEndpoint(_)
        ));
    }

    #[test]
    fn test_custom_endpoint_wins() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config_at(dir.path());
        config.set_endpoint("https://proxy.example.com/v1").unwrap();
        assert_eq!(config.endpoint().unwrap(), "https://proxy.example.com/v1");
    }

    #[test]
    fn test_validate_endpoint_url() {
        assert!(validate_endpoint_url("").is_ok());
        assert!(validate_endpoint_url("https://api.example.com").is_ok());
        assert!(validate_endpoint_url("http://localhost:8080/v1").is_ok());
        assert!(validate_endpoint_url("ftp://example.com").is_err());
        assert!(validate_endpoint_url("not a url").is_err());
    }

    #[test]
    fn test_num_suggestions_default() {
        let config = Config::with_defaults(true);
        assert_eq!(config.num_suggestions(), 10);
    }

    #[test]
    fn test_set_values_persist() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config_at(dir.path());

        config.set_model("gpt-4o").unwrap();
        config.set_api_key("key-123").unwrap();
        config.set_num_suggestions(5).unwrap();

        let content =
            std::fs::read_to_string(dir.path().join(CONFIG_FILE_NAME)).unwrap();
        let reloaded: Config = toml::from_str(&content).unwrap();
        let copilot = reloaded.providers.get("copilot").unwrap();
        assert_eq!(copilot.model, "gpt-4o");
        assert_eq!(copilot.api_key, "key-123");
        assert_eq!(copilot.num_suggestions, 5);
    }

    #[test]
    fn test_set_provider_creates_entry() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config_at(dir.path());

        config.set_active_provider("openrouter").unwrap();
        assert_eq!(config.provider_name(), "openrouter");
        assert!(config.active().is_ok());
    }

    #[tokio::test]
    async fn test_load_or_init_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);

        let mut config = Config::load_or_init(&path).await.unwrap();
        assert!(path.exists());

        config.set_model("custom-model").unwrap();

        let reloaded = Config::load_or_init(&path).await.unwrap();
        assert_eq!(reloaded.model().unwrap(), "custom-model");
    }

    #[test]
    fn test_token_from_host_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hosts.json");
        std::fs::write(
            &path,
            r#"{"github.com": {"oauth_token": "gho_from_hosts", "user": "someone"}}"#,
        )
        .unwrap();
        assert_eq!(
            token_from_host_file(&path).as_deref(),
            Some("gho_from_hosts")
        );
    }

    #[test]
    fn test_token_from_host_file_ignores_other_hosts() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hosts.json");
        std::fs::write(
            &path,
            r#"{"example.com": {"oauth_token": "nope"}, "github.com": {"user": "x"}}"#,
        )
        .unwrap();
        assert!(token_from_host_file(&path).is_none());
    }

    #[test]
    fn test_token_from_host_file_missing() {
        assert!(token_from_host_file(Path::new("/nonexistent/hosts.json")).is_none());
    }
}
