//! Document to HTML fragment.
//!
//! The writer walks the tree in document order. Runs open their tags in a
//! fixed order (link, colour span, then marks outermost to innermost), which
//! together with normalisation is what makes export a fixed point of
//! import-then-export.

use std::borrow::Cow;

use crate::document::{
    Block, BlockKind, DEFAULT_IMAGE_MAX_WIDTH, Document, ImageEmbed, Inline, LinkSpan, ListKind,
    TextRun,
};
use crate::inline;
use crate::types::{Alignment, css_value};

/// Inline style every exported image carries after its `max-width`.
pub(crate) const IMAGE_STYLE_SUFFIX: &str = "border-radius: 8px; margin: 10px 0; display: block;";

/// How the writer renders an [`ImageEmbed`].
///
/// Export and the editing-surface renderer share the block and inline
/// writer and differ only here.
pub(crate) trait ImageMarkup {
    fn write_image(&self, out: &mut String, image: &ImageEmbed);
}

/// Persistence markup: a bare `<img>`.
pub(crate) struct ExportImages;

impl ImageMarkup for ExportImages {
    fn write_image(&self, out: &mut String, image: &ImageEmbed) {
        write_img_tag(out, image, &[], None);
    }
}

/// Serialize a document to an HTML fragment.
///
/// The document is normalised first, so two observably equal trees always
/// export to the same string.
pub fn export_html(doc: &Document) -> String {
    let doc = doc.normalized();
    let mut out = String::new();
    write_document(&mut out, &doc, &ExportImages);
    out
}

pub(crate) fn write_document(out: &mut String, doc: &Document, images: &impl ImageMarkup) {
    for block in doc.blocks() {
        match block {
            Block::Text(text) => {
                let tag = match text.kind {
                    BlockKind::Paragraph => Cow::Borrowed("p"),
                    BlockKind::Heading(level) => {
                        Cow::Owned(format!("h{}", level.as_u8()))
                    }
                    BlockKind::Quote => Cow::Borrowed("blockquote"),
                };
                write_leaf(out, &tag, text.align, &text.children, images);
            }
            Block::List(list) => {
                let tag = match list.kind {
                    ListKind::Ordered => "ol",
                    ListKind::Unordered => "ul",
                };
                out.push('<');
                out.push_str(tag);
                out.push('>');
                for item in &list.items {
                    write_leaf(out, "li", item.align, &item.children, images);
                }
                out.push_str("</");
                out.push_str(tag);
                out.push('>');
            }
        }
    }
}

fn write_leaf(
    out: &mut String,
    tag: &str,
    align: Alignment,
    children: &[Inline],
    images: &impl ImageMarkup,
) {
    out.push('<');
    out.push_str(tag);
    if align != Alignment::Left {
        out.push_str(" style=\"text-align: ");
        out.push_str(align.as_str());
        out.push_str(";\"");
    }
    out.push('>');
    if inline::content_len(children) == 0 {
        // Keeps the empty block visible and editable.
        out.push_str("<br>");
    }
    for child in children {
        match child {
            Inline::Text(run) => write_run(out, run),
            Inline::Link(link) => write_link(out, link),
            Inline::Image(image) => images.write_image(out, image),
        }
    }
    out.push_str("</");
    out.push_str(tag);
    out.push('>');
}

fn write_link(out: &mut String, link: &LinkSpan) {
    out.push_str("<a href=\"");
    out.push_str(&html_escape::encode_double_quoted_attribute(&link.url));
    out.push_str("\">");
    for run in &link.children {
        write_run(out, run);
    }
    out.push_str("</a>");
}

fn write_run(out: &mut String, run: &TextRun) {
    let css = run.style.to_css();
    if let Some(css) = &css {
        out.push_str("<span style=\"");
        out.push_str(&html_escape::encode_double_quoted_attribute(css));
        out.push_str("\">");
    }
    for mark in run.marks.marks() {
        out.push('<');
        out.push_str(mark.tag());
        out.push('>');
    }
    out.push_str(&html_escape::encode_text(&run.text));
    for mark in run.marks.marks().collect::<Vec<_>>().into_iter().rev() {
        out.push_str("</");
        out.push_str(mark.tag());
        out.push('>');
    }
    if css.is_some() {
        out.push_str("</span>");
    }
}

/// Write an `<img>` carrying every attribute import reads back.
pub(crate) fn write_img_tag(
    out: &mut String,
    image: &ImageEmbed,
    classes: &[&str],
    alt_override: Option<&str>,
) {
    out.push_str("<img src=\"");
    out.push_str(&html_escape::encode_double_quoted_attribute(&image.src));
    out.push_str("\" alt=\"");
    let alt = alt_override.unwrap_or(&image.alt_text);
    out.push_str(&html_escape::encode_double_quoted_attribute(alt));
    out.push('"');
    if !classes.is_empty() {
        out.push_str(" class=\"");
        out.push_str(&classes.join(" "));
        out.push('"');
    }
    let max_width = css_value(&image.max_width);
    out.push_str(" style=\"max-width: ");
    out.push_str(&html_escape::encode_double_quoted_attribute(
        max_width.as_deref().unwrap_or(DEFAULT_IMAGE_MAX_WIDTH),
    ));
    out.push_str("; ");
    out.push_str(IMAGE_STYLE_SUFFIX);
    out.push('"');
    if let Some(width) = image.width {
        out.push_str(&format!(" width=\"{width}\""));
    }
    if let Some(height) = image.height {
        out.push_str(&format!(" height=\"{height}\""));
    }
    out.push('>');
}
