//! Credentials handed to the source fetcher.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Where git transport credentials come from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CredentialSource {
    /// Use whatever the ambient ssh setup provides.
    #[default]
    Ambient,
    /// Authenticate with this private key file only.
    SshKey(PathBuf),
}

impl CredentialSource {
    pub fn ssh_key(path: impl Into<PathBuf>) -> Self {
        CredentialSource::SshKey(path.into())
    }

    pub fn key_path(&self) -> Option<&Path> {
        match self {
            CredentialSource::Ambient => None,
            CredentialSource::SshKey(path) => Some(path),
        }
    }

    /// Value for `GIT_SSH_COMMAND`, if this source needs one.
    ///
    /// Host keys are not verified: build hosts are ephemeral and start
    /// without a `known_hosts` file.
    ///
    /// git runs the value through a shell, so the key path is quoted.
    pub fn git_ssh_command(&self) -> Option<String> {
        self.key_path().map(|key| {
            format!(
                "ssh -i {} -o IdentitiesOnly=yes -o StrictHostKeyChecking=no",
                shell_quote(&key.to_string_lossy())
            )
        })
    }
}

/// Single-quote `value` for a POSIX shell.
fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}
