//! Publishing backends for bundleit.
//!
//! - [`HttpAssetUploader`]: content-addressed multipart upload of the artifact
//! - [`HttpBundleRegistry`]: bundle metadata registration

mod http;
pub mod registrar;
pub mod uploader;

pub use registrar::HttpBundleRegistry;
pub use uploader::HttpAssetUploader;
