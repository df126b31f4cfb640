//! The JSON configuration file.

use serde::Deserialize;
use std::path::Path;

use crate::{ConfigError, ConfigResult};

/// Configuration file as written on disk.
///
/// Every field is optional here; required fields are checked when the file
/// is resolved together with the overrides.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigFile {
    pub project_path: Option<String>,
    pub repo: Option<String>,
    pub dist_path: Option<String>,
    pub assets_upload_url: Option<String>,
    pub assets_upload_token: Option<String>,
    pub bundle_upload_url: Option<String>,
    pub bundle_upload_token: Option<String>,
    /// Revision to build when no commit override is given.
    #[serde(rename = "BUILD_BRANCH")]
    pub build_branch: Option<String>,
    pub app_name: Option<String>,
    pub min_app_version: Option<u64>,
    pub max_app_version: Option<u64>,
    pub package_manager: Option<String>,
}

impl ConfigFile {
    pub fn parse(content: &str) -> ConfigResult<Self> {
        Ok(serde_json::from_str(content)?)
    }

    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content)
    }
}
