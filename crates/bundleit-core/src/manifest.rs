//! Project manifest (`package.json`) reading.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::version::{DEFAULT_VERSION, ProjectVersion};
use crate::{Error, Result};

/// File name of the manifest inside the project directory.
pub const MANIFEST_FILE: &str = "package.json";

/// Bundle name used when the manifest does not declare one.
pub const DEFAULT_BUNDLE_NAME: &str = "unknown.lynx.bundle";

/// The parts of the project manifest the pipeline cares about.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectManifest {
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub bundle_config: Option<BundleConfig>,
}

/// The `bundleConfig` section of the manifest.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleConfig {
    #[serde(default)]
    pub bundle_name: Option<String>,
    #[serde(default)]
    pub preset: Option<bool>,
}

impl ProjectManifest {
    /// Path of the manifest for a project directory.
    pub fn path_in(project_dir: &Path) -> PathBuf {
        project_dir.join(MANIFEST_FILE)
    }

    /// Load the manifest from a project directory.
    pub async fn load(project_dir: &Path) -> Result<Self> {
        let path = Self::path_in(project_dir);
        let content = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| Error::Manifest {
                path: path.clone(),
                message: e.to_string(),
            })?;
        Self::parse(&path, &content)
    }

    pub fn parse(path: &Path, content: &str) -> Result<Self> {
        serde_json::from_str(content).map_err(|e| Error::Manifest {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// The declared version, `0.0.0` when absent.
    pub fn project_version(&self) -> Result<ProjectVersion> {
        ProjectVersion::parse(self.version.as_deref().unwrap_or(DEFAULT_VERSION))
    }

    pub fn bundle_name(&self) -> &str {
        self.bundle_config
            .as_ref()
            .and_then(|c| c.bundle_name.as_deref())
            .unwrap_or(DEFAULT_BUNDLE_NAME)
    }

    pub fn is_preset(&self) -> bool {
        self.bundle_config
            .as_ref()
            .and_then(|c| c.preset)
            .unwrap_or(false)
    }
}
