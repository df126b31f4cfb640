//! Build steps and the runner trait that executes them.
//!
//! Steps run as child processes in the project directory with the parent's
//! output streams. There is no timeout: a hung step blocks the pipeline.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

use crate::Result;

/// Package manager used when none is configured.
pub const DEFAULT_PACKAGE_MANAGER: &str = "pnpm";

/// A single external command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildStep {
    /// Program to execute, resolved through `PATH`.
    pub program: String,
    pub args: Vec<String>,
}

impl BuildStep {
    pub fn new(program: impl Into<String>, args: &[&str]) -> Self {
        Self {
            program: program.into(),
            args: args.iter().map(|a| a.to_string()).collect(),
        }
    }

    /// The step as a shell-like string, for logs and errors.
    pub fn command_line(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for BuildStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// `install` followed by `build` for a package manager.
pub fn package_manager_steps(package_manager: &str) -> Vec<BuildStep> {
    vec![
        BuildStep::new(package_manager, &["install"]),
        BuildStep::new(package_manager, &["build"]),
    ]
}

/// Trait for build step runners.
#[async_trait]
pub trait BuildRunner: Send + Sync {
    /// Run one step to completion in `working_dir`.
    ///
    /// A non-zero exit is [`crate::Error::Build`].
    async fn run(&self, step: &BuildStep, working_dir: &Path) -> Result<()>;
}
