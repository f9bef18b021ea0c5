//! Workspace snapshotter: initializes a content-versioned repository under
//! the workspace, configures an identity, and commits staged changes with a
//! message — a no-op when the staged tree is empty.
//!
//! The version-control binary itself (`git`) is an external collaborator
//! (spec.md §1); this crate only shells out to it, the way the teacher's
//! `rocode-session::snapshot` does for its own git-backed snapshots.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("failed to run git {args}: {source}")]
    Spawn {
        args: String,
        #[source]
        source: std::io::Error,
    },
    #[error("git {args} failed: {stderr}")]
    GitFailed { args: String, stderr: String },
}

/// A content-versioned snapshot repository rooted under a workspace.
pub struct Workspace {
    root: PathBuf,
    git_dir: PathBuf,
}

impl Workspace {
    /// Initialize (or reuse) the snapshot repository under `root`.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, SnapshotError> {
        let root = root.into();
        let git_dir = root.join(".opencode-evolve").join("snapshot.git");
        let this = Self { root, git_dir };
        this.ensure_repo()?;
        Ok(this)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn ensure_repo(&self) -> Result<(), SnapshotError> {
        if self.git_dir.join("HEAD").exists() {
            return Ok(());
        }

        if let Some(parent) = self.git_dir.parent() {
            std::fs::create_dir_all(parent).map_err(|source| SnapshotError::Spawn {
                args: format!("mkdir -p {}", parent.display()),
                source,
            })?;
        }

        self.run(&["init", "--quiet"])?;
        self.run(&["config", "user.name", "opencode-evolve"])?;
        self.run(&["config", "user.email", "evolve@localhost"])?;
        self.run(&["config", "core.autocrlf", "false"])?;
        Ok(())
    }

    /// Stage everything under the worktree and commit with `message` if (and
    /// only if) there is something staged. Returns the new commit hash, or
    /// `None` when the staged tree was already empty.
    pub fn commit(&self, message: &str) -> Result<Option<String>, SnapshotError> {
        self.run(&["add", "-A"])?;

        if self.status_ok(&["diff", "--cached", "--quiet"]) {
            // Exit 0 from `diff --quiet` means nothing is staged.
            return Ok(None);
        }

        self.run(&["commit", "--quiet", "--message", message])?;
        let output = self.run(&["rev-parse", "HEAD"])?;
        Ok(Some(
            String::from_utf8_lossy(&output.stdout).trim().to_string(),
        ))
    }

    /// Run a git subcommand that is allowed to fail with a non-zero status
    /// (the status itself is the signal), returning whether it exited 0.
    fn status_ok(&self, args: &[&str]) -> bool {
        self.command(args)
            .status()
            .map(|status| status.success())
            .unwrap_or(false)
    }

    fn command(&self, args: &[&str]) -> Command {
        let mut cmd = Command::new("git");
        cmd.arg("--git-dir")
            .arg(&self.git_dir)
            .arg("--work-tree")
            .arg(&self.root)
            .args(args)
            .current_dir(&self.root);
        cmd
    }

    fn run(&self, args: &[&str]) -> Result<Output, SnapshotError> {
        let output = self
            .command(args)
            .output()
            .map_err(|source| SnapshotError::Spawn {
                args: args.join(" "),
                source,
            })?;

        if !output.status.success() {
            return Err(SnapshotError::GitFailed {
                args: args.join(" "),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(output)
    }
}
