//! Error types for the publish pipeline.

use std::path::PathBuf;

use thiserror::Error;

/// Every pipeline failure is terminal; none of these is retried.
#[derive(Debug, Error)]
pub enum Error {
    #[error("source fetch failed: `{command}` {}", describe_exit(.exit_code))]
    SourceFetch {
        command: String,
        exit_code: Option<i32>,
    },

    #[error("invalid version {version:?}: {reason}")]
    VersionParse { version: String, reason: String },

    #[error("build failed: `{command}` {}", describe_exit(.exit_code))]
    Build {
        command: String,
        exit_code: Option<i32>,
    },

    #[error("build artifact not found: {}", .0.display())]
    ArtifactNotFound(PathBuf),

    #[error("request to {endpoint} failed with HTTP status {status}")]
    Upload { endpoint: String, status: u16 },

    #[error("upload response missing data.url: {body}")]
    MalformedUploadResponse { body: String },

    #[error("bundle registration rejected (code {}): {body}", describe_code(.code))]
    Registration { code: Option<i64>, body: String },

    #[error("invalid project manifest {}: {message}", .path.display())]
    Manifest { path: PathBuf, message: String },

    #[error("request to {endpoint} could not be sent: {message}")]
    Transport { endpoint: String, message: String },

    #[error(transparent)]
    Transition(#[from] crate::pipeline::TransitionError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

fn describe_exit(exit_code: &Option<i32>) -> String {
    match exit_code {
        Some(code) => format!("exited with code {code}"),
        None => "was terminated by a signal".to_string(),
    }
}

fn describe_code(code: &Option<i64>) -> String {
    match code {
        Some(code) => code.to_string(),
        None => "missing".to_string(),
    }
}
