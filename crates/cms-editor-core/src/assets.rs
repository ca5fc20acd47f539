//! Asset Store interface consumed by the image upload flow.
//!
//! The editor never talks to a storage backend directly; the host supplies
//! an [`AssetStore`] and the upload flow awaits it.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Mutex;

use bytes::Bytes;
use rand::Rng;
use rand::distr::Alphanumeric;
use web_time::{SystemTime, UNIX_EPOCH};

use crate::error::{AssetStoreError, ValidationError};

/// A file picked by the user for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageFile {
    pub name: String,
    pub mime_type: String,
    pub data: Bytes,
}

impl ImageFile {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            data: data.into(),
        }
    }

    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }

    /// Extension after the last `.`, if the name has one.
    pub fn extension(&self) -> Option<&str> {
        self.name
            .rsplit_once('.')
            .map(|(_, ext)| ext)
            .filter(|ext| !ext.is_empty())
    }
}

/// Where an uploaded asset ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedAsset {
    /// Durable URL to embed.
    pub url: String,
    /// Store-relative path, `<destination>/<name>`.
    pub path: String,
    /// Generated object name.
    pub name: String,
}

/// A binary object store that hands back a durable URL.
pub trait AssetStore {
    fn upload(
        &self,
        file: &ImageFile,
        destination: &str,
    ) -> impl Future<Output = Result<UploadedAsset, AssetStoreError>>;
}

/// Check a file against the upload rules: an `image/*` type no larger than
/// `max_bytes`.
pub fn validate_image(file: &ImageFile, max_bytes: u64) -> Result<(), ValidationError> {
    if !file.mime_type.starts_with("image/") {
        return Err(ValidationError::NotAnImage {
            mime_type: file.mime_type.clone(),
        });
    }
    if file.size() > max_bytes {
        return Err(ValidationError::TooLarge {
            size: file.size(),
            limit: max_bytes,
        });
    }
    Ok(())
}

/// Collision-resistant object name: `<unix-millis>-<random>.<ext>`.
pub fn unique_object_name(file: &ImageFile) -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default();
    let suffix: String = rand::rng()
        .sample_iter(Alphanumeric)
        .take(6)
        .map(|b| char::from(b).to_ascii_lowercase())
        .collect();
    match file.extension() {
        Some(ext) => format!("{millis}-{suffix}.{ext}"),
        None => format!("{millis}-{suffix}"),
    }
}

/// In-process store. Objects live in memory and URLs are `<base_url>/<path>`.
#[derive(Debug, Default)]
pub struct MemoryAssetStore {
    base_url: String,
    objects: Mutex<HashMap<String, Bytes>>,
}

impl MemoryAssetStore {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            objects: Mutex::default(),
        }
    }

    pub fn get(&self, path: &str) -> Option<Bytes> {
        self.objects.lock().ok()?.get(path).cloned()
    }

    pub fn len(&self) -> usize {
        self.objects.lock().map(|objects| objects.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl AssetStore for MemoryAssetStore {
    async fn upload(&self, file: &ImageFile, destination: &str) -> Result<UploadedAsset, AssetStoreError> {
        let name = unique_object_name(file);
        let path = format!("{}/{}", destination.trim_matches('/'), name);
        let mut objects = self
            .objects
            .lock()
            .map_err(|_| AssetStoreError::new("asset store lock poisoned"))?;
        objects.insert(path.clone(), file.data.clone());
        tracing::debug!(target: "cms_editor::assets", %path, bytes = file.size(), "stored asset");
        Ok(UploadedAsset {
            url: format!("{}/{}", self.base_url, path),
            path,
            name,
        })
    }
}
