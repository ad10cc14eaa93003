//! Local Claude CLI provider.
//!
//! Instead of calling a remote API, this backend shells out to the
//! `claude` binary in print mode. CLI output is free-form, so it gets a
//! cleanup pass: markdown bullets and list numbering are stripped and
//! anything that cannot be a one-line suggestion is dropped.

use tokio::process::Command;
use tracing::debug;

use crate::prompts::Prompts;
use crate::providers::{ProviderError, ProviderFuture, SuggestionProvider};

/// Default model when none is configured.
const DEFAULT_MODEL: &str = "claude-haiku-4-5";

/// Default number of suggestions to request.
const DEFAULT_SUGGESTIONS: usize = 10;

/// Lines longer than this are explanatory text, not suggestions.
const MAX_SUGGESTION_LEN: usize = 200;

/// Suggestion provider that runs the `claude` CLI locally.
pub struct ClaudeCliProvider {
    model: String,
    num_suggestions: usize,
    prompts: Prompts,
}

impl ClaudeCliProvider {
    pub fn new(model: &str, num_suggestions: u32, prompts: Prompts) -> Self {
        let model = model.trim();
        Self {
            model: if model.is_empty() {
                DEFAULT_MODEL.to_string()
            } else {
                model.to_string()
            },
            num_suggestions: if num_suggestions == 0 {
                DEFAULT_SUGGESTIONS
            } else {
                num_suggestions as usize
            },
            prompts,
        }
    }

    fn full_prompt(&self, user_prompt: &str, kind: &str) -> String {
        format!(
            "{}\n\nUser request: {}\n\nIMPORTANT: Generate exactly {} {kind}, one per line. \
             Do not include any other text, explanations, or formatting - just the {kind}.",
            self.prompts.system_message(),
            user_prompt,
            self.num_suggestions,
        )
    }

    async fn generate(&self, prompt: String) -> Result<Vec<String>, ProviderError> {
        debug!(model = %self.model, "invoking claude CLI");

        let output = Command::new("claude")
            .arg("--model")
            .arg(&self.model)
            .arg("-p")
            .arg(&prompt)
            .output()
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    ProviderError::Cli(
                        "claude CLI not found in PATH; install the Claude Code CLI".into(),
                    )
                } else {
                    ProviderError::Cli(e.to_string())
                }
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ProviderError::Cli(format!(
                "claude exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        let content = String::from_utf8_lossy(&output.stdout);
        let suggestions = clean_cli_lines(&content, self.num_suggestions);
        if suggestions.is_empty() {
            return Err(ProviderError::NoSuggestions);
        }
        Ok(suggestions)
    }
}

/// Normalize raw CLI output into plain one-per-line suggestions.
fn clean_cli_lines(content: &str, limit: usize) -> Vec<String> {
    let mut suggestions = Vec::new();

    for line in content.lines() {
        let mut trimmed = line.trim();
        if trimmed.is_empty() || trimmed.len() > MAX_SUGGESTION_LEN {
            continue;
        }

        // Markdown headings and bullets: keep the text after the marker.
        if trimmed.starts_with('#') || trimmed.starts_with('-') || trimmed.starts_with('*') {
            if let Some((_, rest)) = trimmed.split_once(' ') {
                trimmed = rest.trim();
            }
        }

        // Numbered list prefixes like "1. " or "2) ".
        let bytes = trimmed.as_bytes();
        if bytes.len() > 3
            && bytes[0].is_ascii_digit()
            && (bytes[1] == b'.' || bytes[1] == b')')
        {
            trimmed = trimmed[2..].trim();
        }

        if !trimmed.is_empty() {
            suggestions.push(trimmed.to_string());
        }
        if suggestions.len() >= limit {
            break;
        }
    }

    suggestions
}

impl SuggestionProvider for ClaudeCliProvider {
    fn id(&self) -> &str {
        "claude"
    }

    fn commit_messages(&self, diff: &str) -> ProviderFuture<'_, Vec<String>> {
        let diff = diff.to_string();
        Box::pin(async move {
            if diff.trim().is_empty() {
                return Err(ProviderError::EmptyDiff);
            }
            let prompt =
                self.full_prompt(&self.prompts.commit_prompt(&diff), "commit messages");
            self.generate(prompt).await
        })
    }

    fn pr_titles(&self, diff: &str) -> ProviderFuture<'_, Vec<String>> {
        let diff = diff.to_string();
        Box::pin(async move {
            if diff.trim().is_empty() {
                return Err(ProviderError::EmptyDiff);
            }
            let prompt = self
                .full_prompt(&self.prompts.pr_title_prompt(&diff), "pull request titles");
            self.generate(prompt).await
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_plain_lines() {
        let out = "feat: add parser\nfix: trim input\n";
        assert_eq!(
            clean_cli_lines(out, 10),
            vec!["feat: add parser", "fix: trim input"]
        );
    }

    #[test]
    fn test_clean_strips_bullets_and_numbering() {
        let out = "- feat: add parser\n* fix: trim input\n1. chore: bump deps\n2) docs: readme\n";
        assert_eq!(
            clean_cli_lines(out, 10),
            vec![
                "feat: add parser",
                "fix: trim input",
                "chore: bump deps",
                "docs: readme"
            ]
        );
    }

    #[test]
    fn test_clean_skips_blank_and_overlong_lines() {
        let long = "x".repeat(MAX_SUGGESTION_LEN + 1);
        let out = format!("\n{long}\nfeat: keep me\n\n");
        assert_eq!(clean_cli_lines(&out, 10), vec!["feat: keep me"]);
    }

    #[test]
    fn test_clean_caps_at_limit() {
        let out = "one\ntwo\nthree\nfour\n";
        assert_eq!(clean_cli_lines(out, 2), vec!["one", "two"]);
    }

    #[test]
    fn test_defaults() {
        let provider = ClaudeCliProvider::new("", 0, Prompts::defaults());
        assert_eq!(provider.model, DEFAULT_MODEL);
        assert_eq!(provider.num_suggestions, DEFAULT_SUGGESTIONS);
        assert_eq!(provider.id(), "claude");
    }

    #[test]
    fn test_full_prompt_mentions_count_and_kind() {
        let provider = ClaudeCliProvider::new("", 5, Prompts::defaults());
        let prompt = provider.full_prompt("user prompt", "commit messages");
        assert!(prompt.contains("exactly 5 commit messages"));
        assert!(prompt.contains("user prompt"));
    }

    #[tokio::test]
    async fn test_empty_diff_rejected() {
        let provider = ClaudeCliProvider::new("", 0, Prompts::defaults());
        let err = provider.commit_messages(" \n").await.unwrap_err();
        assert!(matches!(err, ProviderError::EmptyDiff));
    }
}
