//! Source repositories and the version-control seam.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::Result;

/// What to fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceSpec {
    /// Repository URL to clone.
    pub url: String,
    /// Commit, tag or branch to check out; `None` keeps the default branch tip.
    pub revision: Option<String>,
}

impl SourceSpec {
    /// Human-readable revision for logs.
    pub fn revision_label(&self) -> &str {
        self.revision.as_deref().unwrap_or("latest")
    }
}

/// A git working tree on disk, checked out at a known commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckedOutRepository {
    root: PathBuf,
}

impl CheckedOutRepository {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory of the project inside the working tree.
    pub fn project_dir(&self, project_path: &Path) -> PathBuf {
        if project_path.as_os_str().is_empty() {
            self.root.clone()
        } else {
            self.root.join(project_path)
        }
    }
}

/// Trait for version-control backends.
#[async_trait]
pub trait SourceControl: Send + Sync {
    /// Clone `source` into `dest` and check out the requested revision.
    async fn fetch(&self, source: &SourceSpec, dest: &Path) -> Result<CheckedOutRepository>;

    /// Full hash of the commit currently checked out.
    async fn head_commit(&self, repo: &CheckedOutRepository) -> Result<String>;
}
