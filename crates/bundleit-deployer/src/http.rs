//! Shared request plumbing for the publishing endpoints.

use bundleit_config::Endpoint;
use bundleit_core::{Error, Result};

/// Endpoint URL as shown in errors and logs.
pub(crate) fn label(endpoint: &Endpoint) -> String {
    let mut url = endpoint.url.clone();
    url.set_query(None);
    url.to_string()
}

/// Send a request, turning non-2xx statuses into [`Error::Upload`].
/// Returns the response body text.
pub(crate) async fn send(endpoint: &Endpoint, request: reqwest::RequestBuilder) -> Result<String> {
    let transport = |e: reqwest::Error| Error::Transport {
        endpoint: label(endpoint),
        message: e.to_string(),
    };

    let response = request
        .bearer_auth(endpoint.token())
        .send()
        .await
        .map_err(transport)?;

    let status = response.status();
    if !status.is_success() {
        return Err(Error::Upload {
            endpoint: label(endpoint),
            status: status.as_u16(),
        });
    }

    response.text().await.map_err(transport)
}
