//! Bundle metadata and the registry it is published to.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::Result;

/// Metadata describing one published bundle.
///
/// Field names are the registration endpoint's wire format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BundleRecord {
    pub app_name: String,
    pub version_code: u64,
    pub version_name: String,
    pub min_app_version: u64,
    pub max_app_version: u64,
    pub bundle_name: String,
    /// The commit actually checked out, never the requested ref.
    pub commit_hash: String,
    pub bundle_sha256: String,
    pub download_url: String,
    pub is_preset: bool,
}

/// Trait for bundle management backends.
#[async_trait]
pub trait BundleRegistry: Send + Sync {
    /// Register a bundle, returning the registry's `data` payload.
    async fn register(&self, record: &BundleRecord) -> Result<serde_json::Value>;
}
