//! `lazycommit pr <target-branch>`: pull request title suggestions.

use anyhow::{Context, Result};

use crate::config::Config;

pub async fn run(cfg: &Config, target_branch: &str) -> Result<()> {
    let cwd = std::env::current_dir()?;

    let diff = crate::git::diff_against_branch(&cwd, target_branch)
        .await
        .context("failed to read branch comparison diff")?;

    if diff.trim().is_empty() {
        println!("No changes compared to base branch.");
        return Ok(());
    }

    let provider = super::resolve_provider(cfg).await?;
    let suggestions = provider
        .pr_titles(&diff)
        .await
        .context("failed to generate pull request titles")?;

    for suggestion in &suggestions {
        println!("{suggestion}");
    }
    Ok(())
}
