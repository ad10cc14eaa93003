//! Prompt templates for suggestion generation.
//!
//! Templates live in a TOML file in the config directory and can be
//! overridden per repository by a file of the same name at the repo root.
//! The merge is field-wise: a non-empty local field wins. Empty fields
//! fall back to the built-in defaults at render time, except `language`,
//! where an empty value means "no language instruction".

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

/// File name for both the global (config dir) and repo-local template
/// files.
pub const PROMPTS_FILE_NAME: &str = ".lazycommit.prompts.toml";

/// Placeholder replaced with the diff when rendering a template.
const DIFF_PLACEHOLDER: &str = "{{diff}}";

const DEFAULT_SYSTEM_MESSAGE: &str =
    "You are a helpful assistant that generates git commit messages, and pull request titles.";

const DEFAULT_COMMIT_TEMPLATE: &str = "Based on the following git diff, generate 10 conventional commit messages. Each message should be on a new line, without any numbering or bullet points:\n\n{{diff}}";

const DEFAULT_PR_TITLE_TEMPLATE: &str = "Based on the following git diff, generate 10 pull request title suggestions. Each title should be on a new line, without any numbering or bullet points:\n\n{{diff}}";

const DEFAULT_LANGUAGE: &str = "English";

/// Prompt configuration, as stored on disk.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Prompts {
    #[serde(default)]
    pub system_message: String,
    #[serde(default)]
    pub commit_message_template: String,
    #[serde(default)]
    pub pr_title_template: String,
    #[serde(default)]
    pub language: String,
}

impl Prompts {
    /// Built-in defaults, used when no template file exists.
    pub fn defaults() -> Self {
        Self {
            system_message: DEFAULT_SYSTEM_MESSAGE.to_string(),
            commit_message_template: DEFAULT_COMMIT_TEMPLATE.to_string(),
            pr_title_template: DEFAULT_PR_TITLE_TEMPLATE.to_string(),
            language: DEFAULT_LANGUAGE.to_string(),
        }
    }

    /// Load the effective prompt configuration: the global file merged
    /// with a repo-local override when `repo_root` is known.
    pub fn load(config_dir: &Path, repo_root: Option<&Path>) -> Self {
        let global = Self::from_file(&config_dir.join(PROMPTS_FILE_NAME));
        match repo_root {
            Some(root) => {
                let local_path = root.join(PROMPTS_FILE_NAME);
                if local_path.exists() {
                    global.merged_with(Self::from_file(&local_path))
                } else {
                    global
                }
            }
            None => global,
        }
    }

    /// Read one template file. A missing or unparsable file yields the
    /// built-in defaults; a present file is taken as-is so that render-time
    /// fallbacks apply per field.
    fn from_file(path: &Path) -> Self {
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(_) => return Self::defaults(),
        };

        match toml::from_str(&content) {
            Ok(prompts) => prompts,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "ignoring unparsable prompts file");
                Self::defaults()
            }
        }
    }

    /// Field-wise merge: non-empty fields of `local` override `self`.
    fn merged_with(mut self, local: Self) -> Self {
        if !local.system_message.is_empty() {
            self.system_message = local.system_message;
        }
        if !local.commit_message_template.is_empty() {
            self.commit_message_template = local.commit_message_template;
        }
        if !local.pr_title_template.is_empty() {
            self.pr_title_template = local.pr_title_template;
        }
        if !local.language.is_empty() {
            self.language = local.language;
        }
        self
    }

    /// Write this configuration to `path` as TOML.
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| std::io::Error::other(e.to_string()))?;
        std::fs::write(path, content)
    }

    /// The system message to send with every request.
    pub fn system_message(&self) -> String {
        if self.system_message.is_empty() {
            DEFAULT_SYSTEM_MESSAGE.to_string()
        } else {
            self.system_message.clone()
        }
    }

    /// Rendered commit-message prompt for `diff`.
    pub fn commit_prompt(&self, diff: &str) -> String {
        let template = if self.commit_message_template.is_empty() {
            DEFAULT_COMMIT_TEMPLATE
        } else {
            &self.commit_message_template
        };
        let mut prompt = render(template, diff);
        prompt.push_str(&self.language_instruction());
        prompt
    }

    /// Rendered pull-request title prompt for `diff`.
    pub fn pr_title_prompt(&self, diff: &str) -> String {
        let template = if self.pr_title_template.is_empty() {
            DEFAULT_PR_TITLE_TEMPLATE
        } else {
            &self.pr_title_template
        };
        let mut prompt = render(template, diff);
        prompt.push_str(&self.language_instruction());
        prompt
    }

    fn language_instruction(&self) -> String {
        if self.language.is_empty() {
            String::new()
        } else {
            format!("\n\nIMPORTANT: Generate all content in {}.", self.language)
        }
    }
}

/// Substitute the diff into a template. Templates without the placeholder
/// get the diff appended.
fn render(template: &str, diff: &str) -> String {
    if template.contains(DIFF_PLACEHOLDER) {
        template.replace(DIFF_PLACEHOLDER, diff)
    } else {
        format!("{template}\n\n{diff}")
    }
}
