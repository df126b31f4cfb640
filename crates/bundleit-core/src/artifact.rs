//! Build artifacts and the storage seam they are uploaded through.

use async_trait::async_trait;
use bytes::Bytes;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

use crate::{Error, Result};

/// Storage prefix for content-addressed bundle uploads.
pub const UPLOAD_PREFIX: &str = "lynxbundles";

/// Extension of uploaded bundle objects.
pub const UPLOAD_EXTENSION: &str = "bundle";

/// A build output held in memory together with its digest.
///
/// The bytes are read once; the digest and the upload both use them.
#[derive(Debug, Clone)]
pub struct BuildArtifact {
    path: PathBuf,
    contents: Bytes,
    sha256: String,
}

impl BuildArtifact {
    /// Read the artifact at `path` and hash it.
    ///
    /// A missing file is reported as [`Error::ArtifactNotFound`] before
    /// any read is attempted.
    pub async fn read(path: &Path) -> Result<Self> {
        if !tokio::fs::try_exists(path).await? {
            return Err(Error::ArtifactNotFound(path.to_path_buf()));
        }
        let contents = Bytes::from(tokio::fs::read(path).await?);
        Ok(Self::from_bytes(path, contents))
    }

    pub fn from_bytes(path: impl Into<PathBuf>, contents: Bytes) -> Self {
        let sha256 = sha256_hex(&contents);
        Self {
            path: path.into(),
            contents,
            sha256,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn contents(&self) -> &Bytes {
        &self.contents
    }

    pub fn size(&self) -> u64 {
        self.contents.len() as u64
    }

    /// Lowercase hex SHA-256 of the contents.
    pub fn sha256(&self) -> &str {
        &self.sha256
    }

    /// Content-addressed storage path, `lynxbundles/<sha256>.bundle`.
    pub fn upload_path(&self) -> String {
        upload_path_for(&self.sha256)
    }
}

pub fn upload_path_for(sha256: &str) -> String {
    format!("{UPLOAD_PREFIX}/{sha256}.{UPLOAD_EXTENSION}")
}

/// Lowercase hex SHA-256 digest of `data`.
pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// Where an artifact ended up after upload.
#[derive(Debug, Clone, Serialize)]
pub struct UploadedArtifact {
    pub sha256: String,
    pub upload_path: String,
    pub download_url: String,
}

/// Trait for artifact storage backends.
#[async_trait]
pub trait ArtifactUploader: Send + Sync {
    /// Upload the artifact and return its public download URL.
    async fn upload(&self, artifact: &BuildArtifact) -> Result<UploadedArtifact>;
}
