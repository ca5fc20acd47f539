//! HTML fragment to document.
//!
//! Import never fails. Recognised elements map onto node types, anything
//! the editor cannot represent is either unwrapped (its children kept) or,
//! for executable and embedded content, dropped with its whole subtree.

use crate::document::{Document, HeadingLevel, ImageEmbed, Leaf, LeafKind, ListKind};
use crate::inline::{self, Piece, RunFormat};
use crate::types::{Alignment, Marks, css_value};

use super::dom::{self, Element, Node};
use super::tokenizer;

/// Subtrees dropped entirely on import.
const IGNORED_ELEMENTS: &[&str] = &[
    "audio", "button", "canvas", "embed", "head", "iframe", "input", "link", "math", "meta",
    "noscript", "object", "script", "select", "style", "svg", "template", "textarea", "title",
    "video",
];

/// Block containers that separate content but carry no block kind.
const CONTAINER_ELEMENTS: &[&str] = &[
    "address", "article", "aside", "body", "dd", "div", "dl", "dt", "fieldset", "figcaption",
    "figure", "footer", "form", "header", "hr", "html", "main", "nav", "pre", "section",
    "table", "tbody", "td", "tfoot", "th", "thead", "tr",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Role {
    Ignored,
    LineBreak,
    Image,
    /// A text-bearing block. `None` keeps the surrounding kind (`<p>` inside
    /// a list item or quote stays part of it).
    TextBlock(Option<LeafKind>),
    List(ListKind),
    ListItem,
    Container,
    Inline,
}

fn role(name: &str) -> Role {
    match name {
        "br" => Role::LineBreak,
        "img" => Role::Image,
        "p" => Role::TextBlock(None),
        "h1" => Role::TextBlock(Some(LeafKind::Heading(HeadingLevel::H1))),
        "h2" => Role::TextBlock(Some(LeafKind::Heading(HeadingLevel::H2))),
        // Deeper headings clamp to the smallest supported level.
        "h3" | "h4" | "h5" | "h6" => Role::TextBlock(Some(LeafKind::Heading(HeadingLevel::H3))),
        "blockquote" => Role::TextBlock(Some(LeafKind::Quote)),
        "ol" => Role::List(ListKind::Ordered),
        "ul" => Role::List(ListKind::Unordered),
        "li" => Role::ListItem,
        name if IGNORED_ELEMENTS.contains(&name) => Role::Ignored,
        name if CONTAINER_ELEMENTS.contains(&name) => Role::Container,
        _ => Role::Inline,
    }
}

/// Parse an HTML fragment into a document.
///
/// Blank input yields the empty document.
pub fn import_html(html: &str) -> Document {
    let nodes = dom::build(tokenizer::tokenize(html));
    let mut builder = Builder::default();
    builder.visit_all(&nodes, &Context::default());
    builder.flush(false);
    tracing::debug!(
        target: "cms_editor::html",
        input_bytes = html.len(),
        leaves = builder.leaves.len(),
        "imported html"
    );
    Document::from_leaves(builder.leaves)
}

#[derive(Debug, Clone)]
struct Context {
    kind: LeafKind,
    align: Alignment,
    format: RunFormat,
}

impl Default for Context {
    fn default() -> Self {
        Self {
            kind: LeafKind::Paragraph,
            align: Alignment::Left,
            format: RunFormat::default(),
        }
    }
}

struct OpenLeaf {
    kind: LeafKind,
    align: Alignment,
    pieces: Vec<Piece>,
}

impl OpenLeaf {
    fn is_blank(&self) -> bool {
        self.pieces.iter().all(|piece| match piece {
            Piece::Text { text, .. } => text.trim().is_empty(),
            Piece::Image(_) => false,
        })
    }
}

#[derive(Default)]
struct Builder {
    leaves: Vec<Leaf>,
    current: Option<OpenLeaf>,
}

impl Builder {
    fn visit_all(&mut self, nodes: &[Node], ctx: &Context) {
        for node in nodes {
            match node {
                Node::Text(text) => self.text(text, ctx),
                Node::Element(element) => self.element(element, ctx),
            }
        }
    }

    fn leaf(&mut self, ctx: &Context) -> &mut OpenLeaf {
        self.current.get_or_insert_with(|| OpenLeaf {
            kind: ctx.kind,
            align: ctx.align,
            pieces: Vec::new(),
        })
    }

    /// Close the open leaf. A blank leaf survives only with `keep_blank`.
    fn flush(&mut self, keep_blank: bool) {
        let Some(open) = self.current.take() else {
            return;
        };
        if open.is_blank() && !keep_blank {
            return;
        }
        self.leaves.push(Leaf {
            kind: open.kind,
            align: open.align,
            children: inline::rebuild(open.pieces),
            restore: None,
        });
    }

    fn text(&mut self, text: &str, ctx: &Context) {
        // Formatting whitespace between blocks.
        if self.current.is_none() && text.trim().is_empty() {
            return;
        }
        let format = ctx.format.clone();
        self.leaf(ctx).pieces.push(Piece::Text {
            text: text.to_string(),
            format,
        });
    }

    fn element(&mut self, element: &Element, ctx: &Context) {
        let mut inner = ctx.clone();
        apply_inline_format(element, &mut inner.format);

        match role(&element.name) {
            Role::Ignored => {
                tracing::trace!(target: "cms_editor::html", element = %element.name, "dropping subtree");
            }
            Role::LineBreak => {}
            Role::Image => match image_from(element) {
                Some(image) => self.leaf(ctx).pieces.push(Piece::Image(image)),
                None => {
                    tracing::trace!(target: "cms_editor::html", "dropping image without src");
                }
            },
            Role::Inline => self.visit_all(&element.children, &inner),
            Role::Container => {
                inner.align = alignment_of(element).unwrap_or(ctx.align);
                self.flush(false);
                self.visit_all(&element.children, &inner);
                self.flush(false);
            }
            Role::List(kind) => {
                inner.kind = LeafKind::ListItem(kind);
                self.flush(false);
                self.visit_all(&element.children, &inner);
                self.flush(false);
            }
            Role::ListItem => {
                let kind = LeafKind::ListItem(ctx.kind.list_kind().unwrap_or(ListKind::Unordered));
                self.leaf_element(element, kind, inner);
            }
            Role::TextBlock(kind) => {
                let kind = kind.unwrap_or(ctx.kind);
                self.leaf_element(element, kind, inner);
            }
        }
    }

    /// An element that is one leaf block, unless it nests other blocks.
    fn leaf_element(&mut self, element: &Element, kind: LeafKind, mut inner: Context) {
        inner.kind = kind;
        inner.align = alignment_of(element).unwrap_or(inner.align);
        self.flush(false);
        let before = self.leaves.len();
        self.current = Some(OpenLeaf {
            kind,
            align: inner.align,
            pieces: Vec::new(),
        });
        self.visit_all(&element.children, &inner);
        let nested = self.leaves.len() > before;
        self.flush(!nested);
    }
}

fn apply_inline_format(element: &Element, format: &mut RunFormat) {
    match element.name.as_str() {
        "b" | "strong" => format.marks.insert(Marks::BOLD),
        "i" | "em" => format.marks.insert(Marks::ITALIC),
        "u" | "ins" => format.marks.insert(Marks::UNDERLINE),
        "s" | "strike" | "del" => format.marks.insert(Marks::STRIKETHROUGH),
        "sup" => format.marks.insert(Marks::SUPERSCRIPT),
        "sub" => format.marks.insert(Marks::SUBSCRIPT),
        "code" | "kbd" | "samp" | "tt" => format.marks.insert(Marks::CODE),
        "a" => {
            if let Some(href) = element.attr("href").map(str::trim).filter(|h| !h.is_empty()) {
                format.link = Some(href.to_string());
            }
        }
        _ => {}
    }

    // Pasted content often carries formatting as CSS instead of tags.
    if let Some(weight) = element.style_property("font-weight") {
        if weight.eq_ignore_ascii_case("bold")
            || weight.eq_ignore_ascii_case("bolder")
            || weight.parse::<u16>().is_ok_and(|w| w >= 600)
        {
            format.marks.insert(Marks::BOLD);
        }
    }
    if element
        .style_property("font-style")
        .is_some_and(|s| s.eq_ignore_ascii_case("italic"))
    {
        format.marks.insert(Marks::ITALIC);
    }
    if let Some(decoration) = element.style_property("text-decoration") {
        let decoration = decoration.to_ascii_lowercase();
        if decoration.contains("underline") {
            format.marks.insert(Marks::UNDERLINE);
        }
        if decoration.contains("line-through") {
            format.marks.insert(Marks::STRIKETHROUGH);
        }
    }
    if let Some(color) = element.style_property("color").and_then(css_value) {
        format.style.color = Some(color);
    }
    if let Some(background) = element
        .style_property("background-color")
        .and_then(css_value)
    {
        format.style.background = Some(background);
    }
}

fn alignment_of(element: &Element) -> Option<Alignment> {
    element
        .style_property("text-align")
        .or_else(|| element.attr("align"))
        .and_then(Alignment::from_name)
}

fn image_from(element: &Element) -> Option<ImageEmbed> {
    let src = element.attr("src").map(str::trim).filter(|s| !s.is_empty())?;
    let alt = element.attr("alt").unwrap_or_default();
    let image = ImageEmbed::new(src, alt)
        .with_size(dimension(element.attr("width")), dimension(element.attr("height")));
    Some(match element.style_property("max-width") {
        Some(max_width) => image.with_max_width(max_width),
        None => image,
    })
}

/// Leading integer of a size attribute (`"300"`, `"300px"`).
fn dimension(value: Option<&str>) -> Option<u32> {
    let value = value?.trim();
    let digits = value
        .find(|c: char| !c.is_ascii_digit())
        .map(|end| &value[..end])
        .unwrap_or(value);
    digits.parse().ok()
}
