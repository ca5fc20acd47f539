//! Rendering the document for the editing surface.
//!
//! Display markup differs from export only for images: each image renders
//! as its own block-level unit and an image whose source failed to load is
//! drawn in a distinct failed state. A broken image is never an error and
//! is never removed from the document; it is exported unchanged. An empty
//! document renders its caret line with the placeholder as a data attribute
//! for the surface to draw.

use std::collections::HashSet;

use crate::document::{Document, ImageEmbed};
use crate::html::{ImageMarkup, write_document, write_img_tag};

/// Alt text shown in place of an image that failed to load.
pub const FAILED_IMAGE_ALT: &str = "Failed to load image";

/// Reports which image sources the embedding surface failed to load.
///
/// Implementations are provided by the embedding application.
pub trait ImageLoadState {
    fn is_failed(&self, src: &str) -> bool;
}

/// Unit type implementation - every image loads.
impl ImageLoadState for () {
    fn is_failed(&self, _src: &str) -> bool {
        false
    }
}

impl<T: ImageLoadState> ImageLoadState for &T {
    fn is_failed(&self, src: &str) -> bool {
        (*self).is_failed(src)
    }
}

/// Set of image sources reported broken by the surface.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FailedImages {
    sources: HashSet<String>,
}

impl FailedImages {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a load failure for `src`.
    pub fn mark_failed(&mut self, src: impl Into<String>) {
        let src = src.into();
        tracing::debug!(target: "cms_editor::render", %src, "image failed to load");
        self.sources.insert(src);
    }

    /// Forget a failure, e.g. after the surface retried successfully.
    pub fn clear(&mut self, src: &str) -> bool {
        self.sources.remove(src)
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

impl ImageLoadState for FailedImages {
    fn is_failed(&self, src: &str) -> bool {
        self.sources.contains(src)
    }
}

struct DisplayImages<'a, L> {
    load_state: &'a L,
}

impl<L: ImageLoadState> ImageMarkup for DisplayImages<'_, L> {
    fn write_image(&self, out: &mut String, image: &ImageEmbed) {
        // A span styled as a block keeps the surrounding `<p>` valid.
        out.push_str("<span class=\"editor-image\" contenteditable=\"false\">");
        if self.load_state.is_failed(&image.src) {
            write_img_tag(out, image, &["image-failed"], Some(FAILED_IMAGE_ALT));
        } else {
            write_img_tag(out, image, &[], None);
        }
        out.push_str("</span>");
    }
}

/// Render display HTML for the editing surface.
pub fn render_document(
    doc: &Document,
    load_state: &impl ImageLoadState,
    placeholder: Option<&str>,
) -> String {
    let mut out = String::new();
    match placeholder.map(str::trim).filter(|text| !text.is_empty()) {
        Some(text) if doc.is_empty() => {
            out.push_str("<p class=\"editor-placeholder\" data-placeholder=\"");
            out.push_str(&html_escape::encode_double_quoted_attribute(text));
            out.push_str("\"><br></p>");
        }
        _ => write_document(&mut out, doc, &DisplayImages { load_state }),
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Inline, TextBlock};
    use crate::html::export_html;

    fn doc_with_image() -> Document {
        Document::from_blocks(vec![
            TextBlock::paragraph(vec![
                Inline::text("see "),
                Inline::Image(ImageEmbed::new("https://cdn/broken.png", "chart")),
            ])
            .into(),
        ])
    }

    #[test]
    fn test_images_render_as_block_units() {
        let html = render_document(&doc_with_image(), &(), None);
        assert!(html.contains(r#"<span class="editor-image" contenteditable="false"><img src="https://cdn/broken.png" alt="chart""#));
        assert!(!html.contains("image-failed"));
    }

    #[test]
    fn test_failed_image_renders_distinctly() {
        let doc = doc_with_image();
        let mut failed = FailedImages::new();
        failed.mark_failed("https://cdn/broken.png");

        let html = render_document(&doc, &failed, Some("Write here"));
        assert!(html.contains(r#"class="image-failed""#));
        assert!(html.contains(FAILED_IMAGE_ALT));

        // The tree and its export are untouched.
        assert_eq!(doc, doc_with_image());
        assert!(export_html(&doc).contains(r#"alt="chart""#));
    }

    #[test]
    fn test_clear_failure() {
        let mut failed = FailedImages::new();
        failed.mark_failed("a.png");
        assert!(failed.is_failed("a.png"));
        assert!(failed.clear("a.png"));
        assert!(failed.is_empty());
    }

    #[test]
    fn test_placeholder_only_for_empty_document() {
        let empty = Document::new();
        insta::assert_snapshot!(
            render_document(&empty, &(), Some("Say \"hi\"")),
            @r#"<p class="editor-placeholder" data-placeholder="Say &quot;hi&quot;"><br></p>"#
        );
        assert_eq!(render_document(&empty, &(), Some("  ")), "<p><br></p>");
        assert_eq!(render_document(&empty, &(), None), "<p><br></p>");
        assert!(!render_document(&doc_with_image(), &(), Some("Write")).contains("editor-placeholder"));
        // Export never carries the placeholder.
        assert_eq!(export_html(&empty), "<p><br></p>");
    }
}
