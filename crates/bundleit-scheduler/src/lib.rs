//! Pipeline orchestration for bundleit.
//!
//! Runs the publish steps one after another against the configured
//! backends and records the run's state transitions.

pub mod orchestrator;

pub use orchestrator::{PipelineOrchestrator, PipelineResult, PublishedBundle, failure_kind};
