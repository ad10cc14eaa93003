//! Shell-outs to the git binary.
//!
//! Version control access is deliberately a thin collaborator: every
//! operation runs `git` in the given repository directory and returns its
//! stdout, with stderr carried on failure.

use std::path::{Path, PathBuf};

use tokio::process::Command;

#[derive(Debug, thiserror::Error)]
pub enum GitError {
    #[error("git not found in PATH")]
    NotInstalled,

    #[error("{command} failed: {stderr}")]
    Command { command: String, stderr: String },

    #[error("I/O error running git: {0}")]
    Io(#[from] std::io::Error),
}

async fn run_git(repo: &Path, args: &[&str]) -> Result<String, GitError> {
    let output = Command::new("git")
        .args(args)
        .current_dir(repo)
        .output()
        .await
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                GitError::NotInstalled
            } else {
                GitError::Io(e)
            }
        })?;

    if !output.status.success() {
        return Err(GitError::Command {
            command: format!("git {}", args.join(" ")),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Diff of the staged changes.
pub async fn staged_diff(repo: &Path) -> Result<String, GitError> {
    run_git(repo, &["diff", "--cached"]).await
}

/// Diff of unstaged working-tree changes.
pub async fn working_tree_diff(repo: &Path) -> Result<String, GitError> {
    run_git(repo, &["diff"]).await
}

/// Diff of the current branch against `target` (merge-base comparison,
/// i.e. what a pull request onto `target` would contain).
pub async fn diff_against_branch(repo: &Path, target: &str) -> Result<String, GitError> {
    run_git(repo, &["diff", &format!("{target}...HEAD")]).await
}

/// Root of the repository enclosing `repo`.
pub async fn repo_root(repo: &Path) -> Result<PathBuf, GitError> {
    let output = run_git(repo, &["rev-parse", "--show-toplevel"]).await?;
    Ok(PathBuf::from(output.trim()))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Skip tests gracefully on machines without git.
    async fn git_available() -> bool {
        Command::new("git")
            .arg("--version")
            .output()
            .await
            .is_ok()
    }

    async fn init_repo(dir: &Path) {
        for args in [
            vec!["init"],
            vec!["config", "user.email", "test@example.com"],
            vec!["config", "user.name", "Test"],
        ] {
            let status = Command::new("git")
                .args(&args)
                .current_dir(dir)
                .output()
                .await
                .unwrap();
            assert!(status.status.success(), "git {args:?} failed");
        }
        // Default branch name varies by git version/config; pin it.
        let _ = Command::new("git")
            .args(["checkout", "-b", "main"])
            .current_dir(dir)
            .output()
            .await;
    }

    async fn commit_all(dir: &Path, message: &str) {
        for args in [vec!["add", "."], vec!["commit", "-m", message]] {
            let status = Command::new("git")
                .args(&args)
                .current_dir(dir)
                .output()
                .await
                .unwrap();
            assert!(status.status.success(), "git {args:?} failed");
        }
    }

    #[tokio::test]
    async fn test_staged_diff() {
        if !git_available().await {
            return;
        }
        let dir = tempfile::tempdir().unwrap();
        init_repo(dir.path()).await;

        std::fs::write(dir.path().join("a.txt"), "hello\n").unwrap();
        commit_all(dir.path(), "initial").await;

        // Nothing staged yet.
        assert!(staged_diff(dir.path()).await.unwrap().is_empty());

        std::fs::write(dir.path().join("a.txt"), "hello world\n").unwrap();
        Command::new("git")
            .args(["add", "a.txt"])
            .current_dir(dir.path())
            .output()
            .await
            .unwrap();

        let diff = staged_diff(dir.path()).await.unwrap();
        assert!(diff.contains("a.txt"));
        assert!(diff.contains("+hello world"));

        // The staged change is not in the working-tree diff.
        assert!(working_tree_diff(dir.path()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_working_tree_diff() {
        if !git_available().await {
            return;
        }
        let dir = tempfile::tempdir().unwrap();
        init_repo(dir.path()).await;

        std::fs::write(dir.path().join("a.txt"), "one\n").unwrap();
        commit_all(dir.path(), "initial").await;

        std::fs::write(dir.path().join("a.txt"), "two\n").unwrap();
        let diff = working_tree_diff(dir.path()).await.unwrap();
        assert!(diff.contains("+two"));
    }

    #[tokio::test]
    async fn test_diff_against_branch() {
        if !git_available().await {
            return;
        }
        let dir = tempfile::tempdir().unwrap();
        init_repo(dir.path()).await;

        std::fs::write(dir.path().join("a.txt"), "base\n").unwrap();
        commit_all(dir.path(), "initial").await;

        Command::new("git")
            .args(["checkout", "-b", "feature"])
            .current_dir(dir.path())
            .output()
            .await
            .unwrap();
        std::fs::write(dir.path().join("b.txt"), "feature work\n").unwrap();
        commit_all(dir.path(), "add b").await;

        let diff = diff_against_branch(dir.path(), "main").await.unwrap();
        assert!(diff.contains("b.txt"));
        assert!(diff.contains("+feature work"));
    }

    #[tokio::test]
    async fn test_diff_against_unknown_branch() {
        if !git_available().await {
            return;
        }
        let dir = tempfile::tempdir().unwrap();
        init_repo(dir.path()).await;
        std::fs::write(dir.path().join("a.txt"), "x\n").unwrap();
        commit_all(dir.path(), "initial").await;

        let err = diff_against_branch(dir.path(), "no-such-branch")
            .await
            .unwrap_err();
        assert!(matches!(err, GitError::Command { .. }));
    }

    #[tokio::test]
    async fn test_repo_root() {
        if !git_available().await {
            return;
        }
        let dir = tempfile::tempdir().unwrap();
        init_repo(dir.path()).await;

        let sub = dir.path().join("src");
        std::fs::create_dir(&sub).unwrap();

        let root = repo_root(&sub).await.unwrap();
        assert_eq!(
            root.canonicalize().unwrap(),
            dir.path().canonicalize().unwrap()
        );
    }
}
