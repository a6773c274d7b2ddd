//! Git operations for DDL repositories
//!
//! Drives the `git` binary directly; nothing here links libgit2. Every
//! operation spawns one short-lived process rooted at the repository
//! path.

use std::path::{Path, PathBuf};
use std::process::Command;

/// Errors from git invocations
#[derive(Debug, thiserror::Error)]
pub enum GitError {
    /// The git binary could not be spawned at all
    #[error("Failed to run git: {0}")]
    Spawn(String),

    /// git ran and exited non-zero
    #[error("git {command} failed: {stderr}")]
    Command { command: String, stderr: String },
}

/// Snapshot of `git status` for the repository
#[derive(Debug, Clone, Default)]
pub struct GitStatus {
    pub branch: Option<String>,

    /// Tracked files with staged or unstaged modifications
    pub changed: Vec<String>,

    pub untracked: Vec<String>,

    /// True when anything is changed or untracked
    pub dirty: bool,
}

/// Manages git operations for one repository path
pub struct GitManager {
    repo_path: PathBuf,
}

impl GitManager {
    pub fn new(repo_path: impl Into<PathBuf>) -> Self {
        Self {
            repo_path: repo_path.into(),
        }
    }

    pub fn repo_path(&self) -> &Path {
        &self.repo_path
    }

    fn run(&self, args: &[&str]) -> Result<String, GitError> {
        let output = Command::new("git")
            .arg("-C")
            .arg(&self.repo_path)
            .args(args)
            .output()
            .map_err(|e| GitError::Spawn(e.to_string()))?;

        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).into_owned())
        } else {
            Err(GitError::Command {
                command: args.first().copied().unwrap_or("").to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            })
        }
    }

    /// Whether the path is inside a git work tree
    pub fn is_repository(&self) -> bool {
        self.repo_path.is_dir() && self.run(&["rev-parse", "--git-dir"]).is_ok()
    }

    /// Initialize a repository at the path, creating it if needed
    pub fn init_repository(&self) -> Result<(), GitError> {
        std::fs::create_dir_all(&self.repo_path).map_err(|e| GitError::Spawn(e.to_string()))?;
        self.run(&["init"])?;
        tracing::info!(path = %self.repo_path.display(), "initialized git repository");
        Ok(())
    }

    /// Name of the checked-out branch. `None` when HEAD is detached or
    /// the path is not a repository. Works on an unborn branch.
    pub fn current_branch(&self) -> Option<String> {
        self.run(&["symbolic-ref", "--short", "HEAD"])
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    }

    /// Stage the given paths
    pub fn add_files(&self, paths: &[PathBuf]) -> Result<(), GitError> {
        if paths.is_empty() {
            return Ok(());
        }
        let mut args = vec!["add".to_string(), "--".to_string()];
        args.extend(paths.iter().map(|p| p.display().to_string()));
        let arg_refs: Vec<&str> = args.iter().map(String::as_str).collect();
        self.run(&arg_refs)?;
        Ok(())
    }

    /// Commit staged changes. Author identity, when given, is passed
    /// per invocation and never written to the repository config.
    pub fn commit(
        &self,
        message: &str,
        author_name: Option<&str>,
        author_email: Option<&str>,
    ) -> Result<(), GitError> {
        let mut args: Vec<String> = Vec::new();
        if let Some(name) = author_name {
            args.push("-c".to_string());
            args.push(format!("user.name={}", name));
        }
        if let Some(email) = author_email {
            args.push("-c".to_string());
            args.push(format!("user.email={}", email));
        }
        args.push("commit".to_string());
        args.push("-m".to_string());
        args.push(message.to_string());

        let arg_refs: Vec<&str> = args.iter().map(String::as_str).collect();
        self.run(&arg_refs)?;
        tracing::info!(message, "committed staged changes");
        Ok(())
    }

    /// Parse `git status --porcelain` into changed/untracked buckets
    pub fn status(&self) -> Result<GitStatus, GitError> {
        let porcelain = self.run(&["status", "--porcelain"])?;

        let mut changed = Vec::new();
        let mut untracked = Vec::new();
        for line in porcelain.lines() {
            if line.len() < 4 {
                continue;
            }
            let (code, path) = line.split_at(3);
            if code.starts_with("??") {
                untracked.push(path.to_string());
            } else {
                changed.push(path.to_string());
            }
        }

        let dirty = !changed.is_empty() || !untracked.is_empty();
        Ok(GitStatus {
            branch: self.current_branch(),
            changed,
            untracked,
            dirty,
        })
    }
}
