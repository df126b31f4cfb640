//! Process-backed pipeline backends.
//!
//! - [`GitSource`]: clone, checkout and HEAD resolution through `git`
//! - [`ProcessBuildRunner`]: package manager steps as child processes

pub mod git;
pub mod process;

pub use git::GitSource;
pub use process::ProcessBuildRunner;
