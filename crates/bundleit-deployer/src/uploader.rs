//! Multipart artifact upload to the assets endpoint.

use async_trait::async_trait;
use bundleit_config::Endpoint;
use bundleit_core::artifact::{ArtifactUploader, BuildArtifact, UploadedArtifact};
use bundleit_core::{Error, Result};
use reqwest::multipart::{Form, Part};
use tracing::info;
use url::Url;

use crate::http;

/// Uploads artifacts as `POST <url>?name=<path>` with a multipart `file` part.
pub struct HttpAssetUploader {
    client: reqwest::Client,
    endpoint: Endpoint,
}

impl HttpAssetUploader {
    pub fn new(endpoint: Endpoint) -> Self {
        Self::with_client(reqwest::Client::new(), endpoint)
    }

    pub fn with_client(client: reqwest::Client, endpoint: Endpoint) -> Self {
        Self { client, endpoint }
    }

    /// The endpoint with `name=<path>` added to any existing query.
    fn request_url(&self, upload_path: &str) -> Url {
        let mut url = self.endpoint.url.clone();
        url.set_fragment(None);
        url.query_pairs_mut().append_pair("name", upload_path);
        url
    }
}

#[async_trait]
impl ArtifactUploader for HttpAssetUploader {
    async fn upload(&self, artifact: &BuildArtifact) -> Result<UploadedArtifact> {
        let upload_path = artifact.upload_path();
        info!(
            upload_path = %upload_path,
            size = artifact.size(),
            endpoint = %http::label(&self.endpoint),
            "Uploading artifact"
        );

        let part = Part::bytes(artifact.contents().to_vec())
            .file_name(format!("{}.bundle", artifact.sha256()))
            .mime_str("application/octet-stream")
            .map_err(|e| Error::Transport {
                endpoint: http::label(&self.endpoint),
                message: e.to_string(),
            })?;
        let form = Form::new().part("file", part);

        let request = self
            .client
            .post(self.request_url(&upload_path))
            .multipart(form);
        let body = http::send(&self.endpoint, request).await?;

        let download_url =
            download_url(&body).ok_or_else(|| Error::MalformedUploadResponse { body })?;

        info!(download_url = %download_url, "Artifact uploaded");
        Ok(UploadedArtifact {
            sha256: artifact.sha256().to_string(),
            upload_path,
            download_url,
        })
    }
}

/// `data.url` from an upload response body.
fn download_url(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value
        .get("data")?
        .get("url")?
        .as_str()
        .filter(|url| !url.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use mockito::Matcher;

    fn endpoint(server: &mockito::ServerGuard, path: &str) -> Endpoint {
        let url = Url::parse(&format!("{}{}", server.url(), path)).unwrap();
        Endpoint::new(url, "asset-token")
    }

    fn artifact() -> BuildArtifact {
        BuildArtifact::from_bytes("dist/main.lynx.bundle", Bytes::from_static(b"bundle bytes"))
    }

    #[test]
    fn test_download_url_extraction() {
        assert_eq!(
            download_url(r#"{"data":{"url":"https://cdn.example.com/a.bundle"}}"#).as_deref(),
            Some("https://cdn.example.com/a.bundle")
        );
        assert_eq!(download_url(r#"{"data":{}}"#), None);
        assert_eq!(download_url(r#"{"data":{"url":""}}"#), None);
        assert_eq!(download_url(r#"{"data":{"url":42}}"#), None);
        assert_eq!(download_url(r#"{"url":"https://cdn.example.com"}"#), None);
        assert_eq!(download_url("<html>"), None);
    }

    #[tokio::test]
    async fn test_upload_returns_download_url() {
        let mut server = mockito::Server::new_async().await;
        let artifact = artifact();
        let mock = server
            .mock("POST", "/upload")
            .match_query(Matcher::UrlEncoded(
                "name".to_string(),
                artifact.upload_path(),
            ))
            .match_header("authorization", "Bearer asset-token")
            .match_header(
                "content-type",
                Matcher::Regex("^multipart/form-data".to_string()),
            )
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"data":{"url":"https://cdn.example.com/x.bundle"}}"#)
            .create_async()
            .await;

        let uploader = HttpAssetUploader::new(endpoint(&server, "/upload"));
        let uploaded = uploader.upload(&artifact).await.unwrap();

        mock.assert_async().await;
        assert_eq!(uploaded.download_url, "https://cdn.example.com/x.bundle");
        assert_eq!(uploaded.sha256, artifact.sha256());
        assert_eq!(uploaded.upload_path, artifact.upload_path());
    }

    #[tokio::test]
    async fn test_upload_path_is_percent_encoded() {
        let server = mockito::Server::new_async().await;
        let uploader = HttpAssetUploader::new(endpoint(&server, "/upload"));
        let url = uploader.request_url("lynxbundles/abc.bundle");
        assert!(url.as_str().ends_with("/upload?name=lynxbundles%2Fabc.bundle"), "{url}");

        let uploader = HttpAssetUploader::new(endpoint(&server, "/upload?bucket=b"));
        let url = uploader.request_url("lynxbundles/abc.bundle");
        assert!(url.as_str().ends_with("/upload?bucket=b&name=lynxbundles%2Fabc.bundle"), "{url}");
    }

    #[test]
    fn test_fragment_does_not_swallow_name() {
        let url = Url::parse("https://assets.example.com/upload#x").unwrap();
        let uploader = HttpAssetUploader::new(Endpoint::new(url, "asset-token"));
        let url = uploader.request_url("lynxbundles/abc.bundle");

        assert_eq!(url.fragment(), None);
        assert_eq!(url.query(), Some("name=lynxbundles%2Fabc.bundle"));
        assert_eq!(
            url.as_str(),
            "https://assets.example.com/upload?name=lynxbundles%2Fabc.bundle"
        );
    }

    #[tokio::test]
    async fn test_http_failure_is_upload_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/upload")
            .match_query(Matcher::Any)
            .with_status(413)
            .create_async()
            .await;

        let uploader = HttpAssetUploader::new(endpoint(&server, "/upload"));
        let err = uploader.upload(&artifact()).await.unwrap_err();

        assert!(matches!(err, Error::Upload { status: 413, .. }));
    }

    #[tokio::test]
    async fn test_missing_url_is_malformed_response() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/upload")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"data":{"key":"lynxbundles/x.bundle"}}"#)
            .create_async()
            .await;

        let uploader = HttpAssetUploader::new(endpoint(&server, "/upload"));
        let err = uploader.upload(&artifact()).await.unwrap_err();

        match err {
            Error::MalformedUploadResponse { body } => assert!(body.contains("lynxbundles")),
            other => panic!("unexpected error: {other}"),
        }
    }
}
