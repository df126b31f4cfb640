//! Resolved pipeline settings.

use bundleit_core::executor::DEFAULT_PACKAGE_MANAGER;
use bundleit_core::repository::SourceSpec;
use bundleit_core::secret::CredentialSource;
use std::fmt;
use std::path::PathBuf;
use url::Url;

use crate::file::ConfigFile;
use crate::overrides::{Overrides, non_empty};
use crate::{ConfigError, ConfigResult};

pub const DEFAULT_APP_NAME: &str = "app";
pub const DEFAULT_MIN_APP_VERSION: u64 = 1;
pub const DEFAULT_MAX_APP_VERSION: u64 = 999_999_999;
pub const DEFAULT_CHECKOUT_DIR: &str = "repo";

/// An authenticated HTTP endpoint. The token never appears in `Debug` output.
#[derive(Clone)]
pub struct Endpoint {
    pub url: Url,
    token: String,
}

impl Endpoint {
    pub fn new(url: Url, token: impl Into<String>) -> Self {
        Self {
            url,
            token: token.into(),
        }
    }

    /// Bearer token for the `Authorization` header.
    pub fn token(&self) -> &str {
        &self.token
    }
}

impl fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Endpoint")
            .field("url", &self.url.as_str())
            .field("token", &"[REDACTED]")
            .finish()
    }
}

/// Which app builds may load the bundle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppCompatibility {
    pub app_name: String,
    pub min_app_version: u64,
    pub max_app_version: u64,
}

/// Settings for one pipeline run, fixed once resolved.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub source: SourceSpec,
    /// Project directory relative to the repository root.
    pub project_path: PathBuf,
    /// Artifact path relative to the project directory.
    pub dist_path: PathBuf,
    pub upload: Endpoint,
    pub registration: Endpoint,
    pub app: AppCompatibility,
    pub package_manager: String,
    pub checkout_dir: PathBuf,
    pub credentials: CredentialSource,
}

impl PipelineConfig {
    /// Merge the file with the overrides. Overrides win, then the file,
    /// then defaults.
    pub fn resolve(file: ConfigFile, overrides: Overrides) -> ConfigResult<Self> {
        let project_path = non_empty(overrides.project_path.as_ref())
            .or(file.project_path.as_deref())
            .unwrap_or_default();

        let repo = non_empty(overrides.repo_url.as_ref())
            .or(non_empty(file.repo.as_ref()))
            .ok_or_else(|| ConfigError::MissingField("repo".to_string()))?;

        let revision = non_empty(overrides.build_commit.as_ref())
            .or(non_empty(file.build_branch.as_ref()))
            .map(str::to_string);

        let dist_path = require(file.dist_path.as_ref(), "distPath")?;

        let upload = endpoint(
            file.assets_upload_url.as_ref(),
            file.assets_upload_token.as_ref(),
            "assetsUploadUrl",
            "assetsUploadToken",
        )?;
        let registration = endpoint(
            file.bundle_upload_url.as_ref(),
            file.bundle_upload_token.as_ref(),
            "bundleUploadUrl",
            "bundleUploadToken",
        )?;

        let app_name = non_empty(overrides.app_name.as_ref())
            .or(non_empty(file.app_name.as_ref()))
            .unwrap_or(DEFAULT_APP_NAME)
            .to_string();
        let min_app_version = version_bound(
            overrides.min_app_version.as_ref(),
            file.min_app_version,
            "MIN_APP_VERSION",
        )?
        .unwrap_or(DEFAULT_MIN_APP_VERSION);
        let max_app_version = version_bound(
            overrides.max_app_version.as_ref(),
            file.max_app_version,
            "MAX_APP_VERSION",
        )?
        .unwrap_or(DEFAULT_MAX_APP_VERSION);
        if min_app_version > max_app_version {
            return Err(ConfigError::InvalidValue {
                field: "MIN_APP_VERSION".to_string(),
                message: format!(
                    "{min_app_version} is greater than the maximum {max_app_version}"
                ),
            });
        }

        let package_manager = non_empty(overrides.package_manager.as_ref())
            .or(non_empty(file.package_manager.as_ref()))
            .unwrap_or(DEFAULT_PACKAGE_MANAGER)
            .to_string();

        let checkout_dir = overrides
            .checkout_dir
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CHECKOUT_DIR));

        Ok(Self {
            source: SourceSpec {
                url: repo.to_string(),
                revision,
            },
            project_path: PathBuf::from(project_path),
            dist_path: PathBuf::from(dist_path),
            upload,
            registration,
            app: AppCompatibility {
                app_name,
                min_app_version,
                max_app_version,
            },
            package_manager,
            checkout_dir,
            credentials: overrides.credentials,
        })
    }

    /// Directory the build runs in.
    pub fn project_dir(&self) -> PathBuf {
        self.checkout_dir.join(&self.project_path)
    }

    /// Location of the build artifact once the build has run.
    pub fn artifact_path(&self) -> PathBuf {
        self.project_dir().join(&self.dist_path)
    }
}

fn require<'a>(value: Option<&'a String>, field: &str) -> ConfigResult<&'a str> {
    non_empty(value).ok_or_else(|| ConfigError::MissingField(field.to_string()))
}

fn endpoint(
    url: Option<&String>,
    token: Option<&String>,
    url_field: &str,
    token_field: &str,
) -> ConfigResult<Endpoint> {
    let raw = require(url, url_field)?;
    let url = Url::parse(raw).map_err(|e| ConfigError::InvalidValue {
        field: url_field.to_string(),
        message: e.to_string(),
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidValue {
            field: url_field.to_string(),
            message: format!("unsupported scheme {:?}", url.scheme()),
        });
    }
    let token = require(token, token_field)?;
    Ok(Endpoint::new(url, token))
}

fn version_bound(
    raw: Option<&String>,
    from_file: Option<u64>,
    field: &str,
) -> ConfigResult<Option<u64>> {
    match non_empty(raw) {
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue {
                field: field.to_string(),
                message: format!("{value:?} is not a non-negative integer"),
            }),
        None => Ok(from_file),
    }
}
