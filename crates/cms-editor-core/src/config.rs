//! Editor configuration.
//!
//! Every field has a default, so an empty file (or no file) is valid.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::document::DEFAULT_IMAGE_MAX_WIDTH;
use crate::error::ConfigError;

/// Largest image accepted by the upload flow (5 MiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 5 * 1024 * 1024;

/// Placeholder shown in an empty editor.
pub const DEFAULT_PLACEHOLDER: &str = "Makale içeriğinizi yazın...";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Undo steps kept before the oldest is dropped.
    pub history_depth: usize,
    pub max_upload_bytes: u64,
    /// Destination hint passed to the asset store.
    pub upload_destination: String,
    /// `max-width` given to newly inserted images.
    pub image_max_width: String,
    /// Abandon an upload after this long. `None` waits indefinitely.
    pub upload_timeout_ms: Option<u64>,
    /// Hint shown by the surface while the document is empty. Blank disables it.
    pub placeholder: Option<String>,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            history_depth: 100,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            upload_destination: "article-images".to_owned(),
            image_max_width: DEFAULT_IMAGE_MAX_WIDTH.to_owned(),
            upload_timeout_ms: None,
            placeholder: Some(DEFAULT_PLACEHOLDER.to_owned()),
        }
    }
}

impl EditorConfig {
    /// Load from a `.toml` or `.json` file, chosen by extension.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Self::from_toml_str(&std::fs::read_to_string(path)?),
            Some("json") => Ok(serde_json::from_str(&std::fs::read_to_string(path)?)?),
            _ => Err(ConfigError::UnsupportedFormat(path.to_path_buf())),
        }
    }

    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(source)?)
    }

    pub fn upload_timeout(&self) -> Option<Duration> {
        self.upload_timeout_ms.map(Duration::from_millis)
    }
}
