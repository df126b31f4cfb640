//! CLI command implementations.

pub mod run;

use anyhow::{Context, Result};
use bundleit_config::{ConfigFile, Overrides, PipelineConfig};
use bundleit_core::artifact::BuildArtifact;
use bundleit_core::secret::CredentialSource;
use bundleit_core::version::ProjectVersion;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::SettingsArgs;

/// File name of the deploy key looked up next to the config file.
const DEPLOY_KEY_FILE: &str = "deploy_key";

/// Read the config file and merge in the CLI/environment overrides.
pub fn load_config(settings: &SettingsArgs) -> Result<PipelineConfig> {
    let file = ConfigFile::load(&settings.config)
        .with_context(|| format!("Failed to load config file: {}", settings.config.display()))?;

    let mut overrides = Overrides::new()
        .with_checkout_dir(&settings.checkout_dir)
        .with_app_version_bounds(
            settings.min_app_version.clone(),
            settings.max_app_version.clone(),
        )
        .with_credentials(credentials(settings));
    if let Some(value) = &settings.project_path {
        overrides = overrides.with_project_path(value);
    }
    if let Some(value) = &settings.repo_url {
        overrides = overrides.with_repo_url(value);
    }
    if let Some(value) = &settings.build_commit {
        overrides = overrides.with_build_commit(value);
    }
    if let Some(value) = &settings.app_name {
        overrides = overrides.with_app_name(value);
    }
    if let Some(value) = &settings.package_manager {
        overrides = overrides.with_package_manager(value);
    }

    PipelineConfig::resolve(file, overrides)
        .with_context(|| format!("Invalid configuration in {}", settings.config.display()))
}

/// An explicit key wins; otherwise use `deploy_key` beside the config file
/// when it exists.
fn credentials(settings: &SettingsArgs) -> CredentialSource {
    if let Some(key) = &settings.deploy_key {
        return CredentialSource::ssh_key(key);
    }
    let default_key = default_deploy_key(&settings.config);
    if default_key.is_file() {
        CredentialSource::SshKey(default_key)
    } else {
        info!(path = %default_key.display(), "No deploy key found, using ambient ssh credentials");
        CredentialSource::Ambient
    }
}

fn default_deploy_key(config: &Path) -> PathBuf {
    config
        .parent()
        .unwrap_or(Path::new("."))
        .join(DEPLOY_KEY_FILE)
}

pub fn validate(settings: &SettingsArgs) -> Result<()> {
    let config = load_config(settings)?;

    println!("Configuration is valid");
    println!("  repository:      {}", config.source.url);
    println!("  revision:        {}", config.source.revision_label());
    println!("  project dir:     {}", config.project_dir().display());
    println!("  artifact:        {}", config.artifact_path().display());
    println!("  build:           {} install && {} build", config.package_manager, config.package_manager);
    println!("  upload to:       {}", config.upload.url);
    println!("  register with:   {}", config.registration.url);
    println!(
        "  app:             {} ({}..={})",
        config.app.app_name, config.app.min_app_version, config.app.max_app_version
    );
    match config.credentials.key_path() {
        Some(key) => println!("  deploy key:      {}", key.display()),
        None => println!("  deploy key:      (ambient)"),
    }
    Ok(())
}

pub async fn hash(path: &Path) -> Result<()> {
    let artifact = BuildArtifact::read(path)
        .await
        .with_context(|| format!("Failed to hash {}", path.display()))?;
    println!("{}  {}", artifact.sha256(), artifact.path().display());
    println!("upload path: {}", artifact.upload_path());
    Ok(())
}

pub fn version_code(version: &str) -> Result<()> {
    let version = ProjectVersion::parse(version)?;
    println!("{}", version.code());
    Ok(())
}
