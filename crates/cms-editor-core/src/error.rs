//! Error types for the editor core.
//!
//! Nothing here is fatal to the host: every error leaves the document as it
//! was and carries a message fit to show the user.

use std::path::PathBuf;
use std::time::Duration;

use miette::Diagnostic;

/// Rejection of a file before any upload is attempted.
#[derive(thiserror::Error, Debug, Diagnostic, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Please select an image file (got `{mime_type}`).")]
    #[diagnostic(code(cms_editor::upload::not_an_image))]
    NotAnImage { mime_type: String },

    #[error("File size must be smaller than {}MB.", .limit / (1024 * 1024))]
    #[diagnostic(code(cms_editor::upload::too_large))]
    TooLarge { size: u64, limit: u64 },
}

/// Failure reported by an [`AssetStore`](crate::assets::AssetStore).
#[derive(thiserror::Error, Debug, Diagnostic)]
#[error("{message}")]
#[diagnostic(code(cms_editor::asset_store))]
pub struct AssetStoreError {
    pub message: String,
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
}

impl AssetStoreError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}

/// Everything that can stop an image from being inserted.
#[derive(thiserror::Error, Debug, Diagnostic)]
pub enum UploadError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Validation(#[from] ValidationError),

    #[error("an image upload is already in progress")]
    #[diagnostic(code(cms_editor::upload::busy))]
    Busy,

    #[error("image upload failed: {0}")]
    #[diagnostic(code(cms_editor::upload::store))]
    Store(#[from] AssetStoreError),

    #[error("image upload timed out after {0:?}")]
    #[diagnostic(code(cms_editor::upload::timed_out))]
    TimedOut(Duration),
}

impl UploadError {
    /// Text for the user-facing notice.
    pub fn user_message(&self) -> String {
        match self {
            UploadError::Validation(err) => err.to_string(),
            UploadError::Busy => "Please wait for the current upload to finish.".to_string(),
            UploadError::Store(err) => {
                format!("An error occurred while uploading the image: {}", err.message)
            }
            UploadError::TimedOut(_) => "The image upload took too long. Please try again.".to_string(),
        }
    }
}

/// A named command could not be resolved to an action.
#[derive(thiserror::Error, Debug, Diagnostic, Clone, PartialEq, Eq)]
pub enum CommandError {
    #[error("unknown editor command `{0}`")]
    #[diagnostic(code(cms_editor::command::unknown))]
    Unknown(String),

    #[error("editor command `{command}` needs a payload")]
    #[diagnostic(code(cms_editor::command::missing_payload))]
    MissingPayload { command: String },

    #[error("invalid payload `{payload}` for editor command `{command}`")]
    #[diagnostic(code(cms_editor::command::invalid_payload))]
    InvalidPayload { command: String, payload: String },
}

#[derive(thiserror::Error, Debug, Diagnostic)]
pub enum ConfigError {
    #[error("failed to read editor config")]
    #[diagnostic(code(cms_editor::config::io))]
    Io(#[from] std::io::Error),

    #[error("invalid TOML editor config")]
    #[diagnostic(code(cms_editor::config::toml))]
    Toml(#[from] toml::de::Error),

    #[error("invalid JSON editor config")]
    #[diagnostic(code(cms_editor::config::json))]
    Json(#[from] serde_json::Error),

    #[error("unsupported config format: {}", .0.display())]
    #[diagnostic(
        code(cms_editor::config::format),
        help("use a .toml or .json file")
    )]
    UnsupportedFormat(PathBuf),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_messages_are_user_facing() {
        let err = ValidationError::TooLarge {
            size: 6 * 1024 * 1024,
            limit: 5 * 1024 * 1024,
        };
        assert_eq!(err.to_string(), "File size must be smaller than 5MB.");

        let err = UploadError::from(ValidationError::NotAnImage {
            mime_type: "application/pdf".into(),
        });
        assert_eq!(
            err.user_message(),
            "Please select an image file (got `application/pdf`)."
        );
    }

    #[test]
    fn test_store_error_message() {
        let err = UploadError::from(AssetStoreError::new("quota exceeded"));
        assert_eq!(
            err.user_message(),
            "An error occurred while uploading the image: quota exceeded"
        );
    }
}
