//! Bundle registration with the management API.

use async_trait::async_trait;
use bundleit_config::Endpoint;
use bundleit_core::bundle::{BundleRecord, BundleRegistry};
use bundleit_core::{Error, Result};
use serde_json::Value;
use tracing::info;

use crate::http;

/// Registers bundles by POSTing the record as JSON.
///
/// The API reports application errors in a `code` field of a 2xx response;
/// anything other than `0` is a rejection.
pub struct HttpBundleRegistry {
    client: reqwest::Client,
    endpoint: Endpoint,
}

impl HttpBundleRegistry {
    pub fn new(endpoint: Endpoint) -> Self {
        Self::with_client(reqwest::Client::new(), endpoint)
    }

    pub fn with_client(client: reqwest::Client, endpoint: Endpoint) -> Self {
        Self { client, endpoint }
    }
}

#[async_trait]
impl BundleRegistry for HttpBundleRegistry {
    async fn register(&self, record: &BundleRecord) -> Result<Value> {
        info!(
            app = %record.app_name,
            version = %record.version_name,
            version_code = record.version_code,
            commit = %record.commit_hash,
            endpoint = %http::label(&self.endpoint),
            "Registering bundle"
        );

        let request = self
            .client
            .post(self.endpoint.url.clone())
            .json(record);
        let body = http::send(&self.endpoint, request).await?;

        let data = registration_data(&body)?;
        info!("Bundle registered");
        Ok(data)
    }
}

/// Check the application-level `code` and extract `data`.
fn registration_data(body: &str) -> Result<Value> {
    let rejected = |code| Error::Registration {
        code,
        body: body.to_string(),
    };

    let value: Value = serde_json::from_str(body).map_err(|_| rejected(None))?;
    let code = value.get("code");
    // `0` and `0.0` are the same number on the wire
    if code.and_then(Value::as_f64) == Some(0.0) {
        Ok(value.get("data").cloned().unwrap_or(Value::Null))
    } else {
        Err(rejected(code.and_then(Value::as_i64)))
    }
}
