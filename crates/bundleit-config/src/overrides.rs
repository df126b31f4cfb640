//! Values that take precedence over the configuration file.
//!
//! The CLI fills these from flags and environment variables; nothing below
//! the CLI reads the process environment.

use bundleit_core::secret::CredentialSource;
use std::path::PathBuf;

/// Overrides for a single run. Empty strings count as unset.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    /// `PROJECT_PATH`
    pub project_path: Option<String>,
    /// `REPO_URL`
    pub repo_url: Option<String>,
    /// `BUILD_COMMIT`, wins over the file's `BUILD_BRANCH`.
    pub build_commit: Option<String>,
    /// `APP_NAME`
    pub app_name: Option<String>,
    /// `MIN_APP_VERSION`, kept raw so a bad value can be reported.
    pub min_app_version: Option<String>,
    /// `MAX_APP_VERSION`
    pub max_app_version: Option<String>,
    pub package_manager: Option<String>,
    /// Directory the repository is cloned into.
    pub checkout_dir: Option<PathBuf>,
    pub credentials: CredentialSource,
}

impl Overrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_project_path(mut self, value: impl Into<String>) -> Self {
        self.project_path = Some(value.into());
        self
    }

    pub fn with_repo_url(mut self, value: impl Into<String>) -> Self {
        self.repo_url = Some(value.into());
        self
    }

    pub fn with_build_commit(mut self, value: impl Into<String>) -> Self {
        self.build_commit = Some(value.into());
        self
    }

    pub fn with_app_name(mut self, value: impl Into<String>) -> Self {
        self.app_name = Some(value.into());
        self
    }

    pub fn with_app_version_bounds(
        mut self,
        min: Option<String>,
        max: Option<String>,
    ) -> Self {
        self.min_app_version = min;
        self.max_app_version = max;
        self
    }

    pub fn with_package_manager(mut self, value: impl Into<String>) -> Self {
        self.package_manager = Some(value.into());
        self
    }

    pub fn with_checkout_dir(mut self, value: impl Into<PathBuf>) -> Self {
        self.checkout_dir = Some(value.into());
        self
    }

    pub fn with_credentials(mut self, credentials: CredentialSource) -> Self {
        self.credentials = credentials;
        self
    }
}

/// `Some` only for non-empty values.
pub(crate) fn non_empty(value: Option<&String>) -> Option<&str> {
    value.map(String::as_str).filter(|v| !v.is_empty())
}
