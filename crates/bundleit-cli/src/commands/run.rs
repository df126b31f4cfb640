//! Full pipeline execution command.

use anyhow::Result;
use bundleit_deployer::{HttpAssetUploader, HttpBundleRegistry};
use bundleit_executor::{GitSource, ProcessBuildRunner};
use bundleit_scheduler::{PipelineOrchestrator, failure_kind};
use std::sync::Arc;
use tracing::info;

use super::load_config;
use crate::SettingsArgs;

/// Run the pipeline once; any failure becomes a non-zero exit.
pub async fn run(settings: &SettingsArgs) -> Result<()> {
    let config = load_config(settings)?;

    let orchestrator = PipelineOrchestrator::new(
        Arc::new(GitSource::new(config.credentials.clone())),
        Arc::new(ProcessBuildRunner::new()),
        Arc::new(HttpAssetUploader::new(config.upload.clone())),
        Arc::new(HttpBundleRegistry::new(config.registration.clone())),
    );

    let result = orchestrator.execute(&config).await;

    info!(
        run_id = %result.run.id,
        state = %result.run.state(),
        elapsed_ms = result.run.elapsed().num_milliseconds(),
        "Run finished"
    );

    match result.outcome {
        Ok(published) => {
            println!(
                "Bundle {} ({}) registered: {}",
                published.record.version_name,
                published.record.version_code,
                serde_json::to_string(&published.registration)?
            );
            Ok(())
        }
        Err(e) => {
            let kind = failure_kind(&e);
            Err(anyhow::Error::new(e).context(format!("Pipeline failed ({kind})")))
        }
    }
}
