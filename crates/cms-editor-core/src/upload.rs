//! Image upload flow.
//!
//! An upload runs in two phases so a host can keep the editor usable while
//! the store is working: [`Editor::begin_image_upload`] validates the file
//! and marks the upload pending, [`Editor::finish_image_upload`] inserts the
//! image (or leaves the document untouched on failure) and clears the
//! pending flag. [`Editor::upload_image`] runs both around an [`AssetStore`].

use crate::actions::EditorAction;
use crate::assets::{AssetStore, ImageFile, UploadedAsset, validate_image};
use crate::document::ImageEmbed;
use crate::editor::Editor;
use crate::error::UploadError;
use crate::types::Selection;

/// Proof that an upload was started. Consumed by
/// [`Editor::finish_image_upload`] or [`Editor::cancel_image_upload`].
#[derive(Debug)]
#[must_use = "an upload stays pending until the ticket is finished or cancelled"]
pub struct UploadTicket {
    file_name: String,
}

impl UploadTicket {
    pub fn file_name(&self) -> &str {
        &self.file_name
    }
}

impl Editor {
    /// Validate `file` and mark an upload as pending.
    ///
    /// Fails without side effects when the file is rejected or another upload
    /// is still running.
    pub fn begin_image_upload(&mut self, file: &ImageFile) -> Result<UploadTicket, UploadError> {
        if self.upload_pending {
            return Err(UploadError::Busy);
        }
        validate_image(file, self.config.max_upload_bytes).inspect_err(|err| {
            tracing::debug!(target: "cms_editor::upload", name = %file.name, %err, "image rejected");
        })?;

        self.upload_pending = true;
        tracing::debug!(target: "cms_editor::upload", name = %file.name, bytes = file.size(), "upload started");
        self.notify();
        Ok(UploadTicket {
            file_name: file.name.clone(),
        })
    }

    /// Complete an upload started with [`begin_image_upload`](Self::begin_image_upload).
    ///
    /// On success the image is inserted at the selection, or at the end of
    /// the document when the surface has no selection. On failure the
    /// document is unchanged. Either way the upload stops being pending.
    pub fn finish_image_upload(
        &mut self,
        ticket: UploadTicket,
        result: Result<UploadedAsset, UploadError>,
    ) -> Result<UploadedAsset, UploadError> {
        self.upload_pending = false;
        let asset = match result {
            Ok(asset) => asset,
            Err(err) => {
                tracing::warn!(target: "cms_editor::upload", name = %ticket.file_name, %err, "upload failed");
                self.notify();
                return Err(err);
            }
        };

        if self.state.inner().selection.is_none() {
            let end = self.state.inner().end_position();
            self.state.inner_mut().set_selection(Some(Selection::collapsed(end)));
        }
        let image = ImageEmbed::new(asset.url.clone(), ticket.file_name)
            .with_max_width(self.config.image_max_width.clone());
        tracing::debug!(target: "cms_editor::upload", url = %asset.url, "inserting uploaded image");
        // dispatch notifies listeners
        self.dispatch(&EditorAction::InsertImage(image));
        Ok(asset)
    }

    /// Abandon a pending upload without touching the document.
    pub fn cancel_image_upload(&mut self, ticket: UploadTicket) {
        tracing::debug!(target: "cms_editor::upload", name = %ticket.file_name, "upload cancelled");
        self.upload_pending = false;
        self.notify();
    }

    /// Validate, upload to `store` and insert the resulting image.
    ///
    /// Honours the configured upload timeout.
    pub async fn upload_image(
        &mut self,
        file: &ImageFile,
        store: &impl AssetStore,
    ) -> Result<UploadedAsset, UploadError> {
        let ticket = self.begin_image_upload(file)?;
        let upload = store.upload(file, &self.config.upload_destination);
        let result = match self.config.upload_timeout() {
            Some(limit) => match n0_future::time::timeout(limit, upload).await {
                Ok(result) => result.map_err(UploadError::from),
                Err(_) => Err(UploadError::TimedOut(limit)),
            },
            None => upload.await.map_err(UploadError::from),
        };
        self.finish_image_upload(ticket, result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EditorConfig;
    use crate::error::{AssetStoreError, ValidationError};
    use crate::types::Position;

    fn asset(url: &str) -> UploadedAsset {
        UploadedAsset {
            url: url.to_string(),
            path: "article-images/x.png".to_string(),
            name: "x.png".to_string(),
        }
    }

    fn png(size: usize) -> ImageFile {
        ImageFile::new("photo.png", "image/png", vec![0u8; size])
    }

    #[test]
    fn test_rejects_non_images_and_large_files() {
        let mut editor = Editor::detached(EditorConfig::default());
        let text = ImageFile::new("notes.txt", "text/plain", vec![1u8, 2, 3]);
        assert!(matches!(
            editor.begin_image_upload(&text),
            Err(UploadError::Validation(ValidationError::NotAnImage { .. }))
        ));
        assert!(matches!(
            editor.begin_image_upload(&png(6 * 1024 * 1024)),
            Err(UploadError::Validation(ValidationError::TooLarge { .. }))
        ));
        assert!(!editor.is_uploading());
    }

    #[test]
    fn test_second_upload_is_busy_until_finished() {
        let mut editor = Editor::detached(EditorConfig::default());
        let ticket = editor.begin_image_upload(&png(10)).unwrap();
        assert!(editor.is_uploading());
        assert!(!editor.toolbar_state().can_insert_image());
        assert!(matches!(editor.begin_image_upload(&png(10)), Err(UploadError::Busy)));

        editor.cancel_image_upload(ticket);
        assert!(!editor.is_uploading());
        assert!(editor.document().is_empty());
    }

    #[test]
    fn test_failure_leaves_document_unchanged() {
        let mut editor = Editor::detached(EditorConfig::default());
        let before = editor.html();
        let ticket = editor.begin_image_upload(&png(10)).unwrap();
        let result = editor.finish_image_upload(ticket, Err(AssetStoreError::new("quota").into()));
        assert!(matches!(result, Err(UploadError::Store(_))));
        assert_eq!(editor.html(), before);
        assert!(!editor.is_uploading());
        assert!(!editor.can_undo());
    }

    #[test]
    fn test_success_inserts_at_selection() {
        let mut editor = Editor::new(EditorConfig::default(), Some("<p>ab</p>"), |_| {});
        editor.set_selection(Some(Selection::collapsed(Position::new(0, 1))));
        let ticket = editor.begin_image_upload(&png(10)).unwrap();
        editor
            .finish_image_upload(ticket, Ok(asset("https://cdn/x.png")))
            .unwrap();
        insta::assert_snapshot!(
            editor.html(),
            @r#"<p>a<img src="https://cdn/x.png" alt="photo.png" style="max-width: 100%; border-radius: 8px; margin: 10px 0; display: block;">b</p>"#
        );
        assert!(editor.can_undo());
    }

    #[test]
    fn test_success_without_selection_appends() {
        let mut editor = Editor::new(EditorConfig::default(), Some("<p>ab</p>"), |_| {});
        let ticket = editor.begin_image_upload(&png(10)).unwrap();
        editor
            .finish_image_upload(ticket, Ok(asset("https://cdn/x.png")))
            .unwrap();
        assert!(editor.html().starts_with(r#"<p>ab<img src="https://cdn/x.png""#));
    }
}
