//! Core domain types and traits for the bundleit publish pipeline.
//!
//! This crate contains:
//! - The pipeline error taxonomy
//! - Version code derivation and manifest reading
//! - Build artifacts and content hashing
//! - Bundle metadata
//! - The seams the pipeline runs through (source control, build runner,
//!   uploader, registry)
//! - The pipeline run state machine

pub mod artifact;
pub mod bundle;
pub mod error;
pub mod executor;
pub mod id;
pub mod manifest;
pub mod pipeline;
pub mod repository;
pub mod secret;
pub mod version;

pub use error::{Error, Result};
pub use id::RunId;
