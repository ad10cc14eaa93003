//! `lazycommit commit`: commit message suggestions for staged changes.

use anyhow::{Context, Result};

use crate::config::Config;

pub async fn run(cfg: &Config) -> Result<()> {
    let cwd = std::env::current_dir()?;

    let diff = crate::git::staged_diff(&cwd)
        .await
        .context("failed to read staged diff")?;

    if diff.trim().is_empty() {
        let unstaged = crate::git::working_tree_diff(&cwd)
            .await
            .unwrap_or_default();
        if unstaged.trim().is_empty() {
            println!("No staged changes to commit.");
        } else {
            println!(
                "No staged changes to commit. There are unstaged changes; stage them with 'git add' first."
            );
        }
        return Ok(());
    }

    let provider = super::resolve_provider(cfg).await?;
    let suggestions = provider
        .commit_messages(&diff)
        .await
        .context("failed to generate commit messages")?;

    for suggestion in &suggestions {
        println!("{suggestion}");
    }
    Ok(())
}
