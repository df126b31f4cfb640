//! Git source control backed by the `git` binary.

use async_trait::async_trait;
use bundleit_core::repository::{CheckedOutRepository, SourceControl, SourceSpec};
use bundleit_core::secret::CredentialSource;
use bundleit_core::{Error, Result};
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info, warn};

/// Runs `git` as a child process.
///
/// Credentials only reach git through the child's `GIT_SSH_COMMAND`; the
/// parent environment is left untouched.
pub struct GitSource {
    credentials: CredentialSource,
    program: String,
}

impl GitSource {
    pub fn new(credentials: CredentialSource) -> Self {
        Self {
            credentials,
            program: "git".to_string(),
        }
    }

    /// Use a different git executable.
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    fn command(&self, args: &[&str], cwd: Option<&Path>) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(args).stdin(Stdio::null());
        if let Some(cwd) = cwd {
            cmd.current_dir(cwd);
        }
        if let Some(ssh_command) = self.credentials.git_ssh_command() {
            cmd.env("GIT_SSH_COMMAND", ssh_command);
        }
        cmd
    }

    fn describe(&self, args: &[&str]) -> String {
        format!("{} {}", self.program, args.join(" "))
    }

    /// Run a git command with inherited output, failing on non-zero exit.
    async fn run(&self, args: &[&str], cwd: Option<&Path>) -> Result<()> {
        let command = self.describe(args);
        debug!(command = %command, "Running git");

        let status = self
            .command(args, cwd)
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .await?;

        if !status.success() {
            warn!(command = %command, exit_code = ?status.code(), "Git command failed");
            return Err(Error::SourceFetch {
                command,
                exit_code: status.code(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl SourceControl for GitSource {
    async fn fetch(&self, source: &SourceSpec, dest: &Path) -> Result<CheckedOutRepository> {
        let dest_str = dest.to_string_lossy();
        info!(
            path = %dest.display(),
            revision = %source.revision_label(),
            "Cloning repository"
        );

        self.run(&["clone", source.url.as_str(), &*dest_str], None).await?;

        if let Some(revision) = &source.revision {
            info!(revision = %revision, "Checking out revision");
            self.run(&["checkout", revision.as_str()], Some(dest)).await?;
        }

        info!(path = %dest.display(), "Clone & checkout completed");
        Ok(CheckedOutRepository::new(dest))
    }

    async fn head_commit(&self, repo: &CheckedOutRepository) -> Result<String> {
        let args = ["rev-parse", "HEAD"];
        let output = self
            .command(&args, Some(repo.root()))
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .output()
            .await?;

        let commit = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if !output.status.success() || !is_commit_hash(&commit) {
            return Err(Error::SourceFetch {
                command: self.describe(&args),
                exit_code: output.status.code(),
            });
        }

        Ok(commit)
    }
}

/// Full SHA-1 or SHA-256 object name.
fn is_commit_hash(value: &str) -> bool {
    value.len() >= 40 && value.bytes().all(|b| b.is_ascii_hexdigit())
}
