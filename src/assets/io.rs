use std::future::Future;
use std::path::{Path, PathBuf};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::errors::{PeopleError, Result};

/// Async byte source for model files and their side resources.
pub trait AssetReader: Send + Sync {
    /// Reads `uri`, relative to the reader's root.
    fn read_bytes(&self, uri: &str) -> impl Future<Output = Result<Vec<u8>>> + Send;
}

/// Reads assets from a directory on disk.
#[derive(Debug, Clone)]
pub struct FileAssetReader {
    root_path: PathBuf,
}

impl FileAssetReader {
    /// `path` may name a directory or a file inside the asset root.
    pub fn new(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let root_path = if path.is_file() {
            path.parent().unwrap_or(Path::new(".")).to_path_buf()
        } else {
            path.to_path_buf()
        };
        Self { root_path }
    }

    #[inline]
    #[must_use]
    pub fn root_path(&self) -> &Path {
        &self.root_path
    }

    /// Full path of `uri` under the root.
    #[must_use]
    pub fn resolve(&self, uri: &str) -> PathBuf {
        self.root_path.join(uri)
    }
}

impl AssetReader for FileAssetReader {
    async fn read_bytes(&self, uri: &str) -> Result<Vec<u8>> {
        let path = self.resolve(uri);
        tokio::fs::read(&path)
            .await
            .map_err(|source| PeopleError::AssetRead { path, source })
    }
}

/// Directory part of `uri`, with a trailing slash when non-empty.
///
/// Resources referenced from a model are relative to the model file.
#[must_use]
pub fn base_uri(uri: &str) -> &str {
    match uri.rfind('/') {
        Some(i) => &uri[..=i],
        None => "",
    }
}

/// Decodes an RFC 2397 `data:` URI. Only base64 payloads are accepted.
pub fn decode_data_uri(uri: &str) -> Result<Vec<u8>> {
    let rest = uri
        .strip_prefix("data:")
        .ok_or_else(|| PeopleError::DataUriError(format!("not a data URI: {:.32}", uri)))?;
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| PeopleError::DataUriError("missing ',' separator".to_string()))?;
    if !header.ends_with(";base64") {
        return Err(PeopleError::DataUriError(format!(
            "unsupported data URI encoding: {header}"
        )));
    }
    Ok(STANDARD.decode(payload)?)
}
