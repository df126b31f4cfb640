//! Local child-process build runner.

use async_trait::async_trait;
use bundleit_core::executor::{BuildRunner, BuildStep};
use bundleit_core::{Error, Result};
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{info, warn};

/// Runs build steps as child processes sharing this process's stdout/stderr.
#[derive(Debug, Default, Clone)]
pub struct ProcessBuildRunner;

impl ProcessBuildRunner {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl BuildRunner for ProcessBuildRunner {
    async fn run(&self, step: &BuildStep, working_dir: &Path) -> Result<()> {
        let command = step.command_line();
        info!(command = %command, dir = %working_dir.display(), "Running build step");

        let status = Command::new(&step.program)
            .args(&step.args)
            .current_dir(working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .await?;

        if !status.success() {
            warn!(command = %command, exit_code = ?status.code(), "Build step failed");
            return Err(Error::Build {
                command,
                exit_code: status.code(),
            });
        }

        Ok(())
    }
}
