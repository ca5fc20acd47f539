//! The document tree.
//!
//! A [`Document`] owns an ordered sequence of [`Block`]s. Text-bearing blocks
//! own [`Inline`] content; lists own [`ListItem`]s. Plain `Vec` ownership is
//! the whole story: every node has exactly one parent and there is no way to
//! share or cycle nodes.
//!
//! Editing code does not walk this shape directly. It works on the flat
//! [`Leaf`] view (one entry per paragraph, heading, quote or list item) and
//! hands the result back to [`Document::from_leaves`], which regroups list
//! items into lists.

use serde::{Deserialize, Serialize};

use crate::inline;
use crate::types::{Alignment, Marks, TextStyle, css_value};

/// Default `max-width` applied to embedded images.
pub const DEFAULT_IMAGE_MAX_WIDTH: &str = "100%";

/// The editor's document: the root of the tree.
///
/// Deserializing goes through [`Document::from_blocks`], so a stored value
/// with no blocks still yields an editable document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "DocumentRepr")]
pub struct Document {
    blocks: Vec<Block>,
}

#[derive(Deserialize)]
struct DocumentRepr {
    #[serde(default)]
    blocks: Vec<Block>,
}

impl From<DocumentRepr> for Document {
    fn from(repr: DocumentRepr) -> Self {
        Document::from_blocks(repr.blocks)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Block {
    Text(TextBlock),
    List(ListBlock),
}

/// Paragraph, heading or quote.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextBlock {
    pub kind: BlockKind,
    #[serde(default)]
    pub align: Alignment,
    pub children: Vec<Inline>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockKind {
    Paragraph,
    Heading(HeadingLevel),
    Quote,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum HeadingLevel {
    H1,
    H2,
    H3,
}

impl HeadingLevel {
    pub fn as_u8(self) -> u8 {
        match self {
            HeadingLevel::H1 => 1,
            HeadingLevel::H2 => 2,
            HeadingLevel::H3 => 3,
        }
    }

    pub fn from_u8(level: u8) -> Option<Self> {
        match level {
            1 => Some(HeadingLevel::H1),
            2 => Some(HeadingLevel::H2),
            3 => Some(HeadingLevel::H3),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListBlock {
    pub kind: ListKind,
    pub items: Vec<ListItem>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListKind {
    Ordered,
    Unordered,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListItem {
    #[serde(default)]
    pub align: Alignment,
    pub children: Vec<Inline>,
    /// Block kind the item had before it was wrapped into a list. Unwrapping
    /// the list turns the item back into it. Not part of the content, so
    /// it is ignored by equality and never exported.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub restore: Option<BlockKind>,
}

impl PartialEq for ListItem {
    fn eq(&self, other: &Self) -> bool {
        self.align == other.align && self.children == other.children
    }
}

/// Inline content of a text-bearing block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Inline {
    Text(TextRun),
    Link(LinkSpan),
    Image(ImageEmbed),
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TextRun {
    pub text: String,
    #[serde(default)]
    pub marks: Marks,
    #[serde(default, skip_serializing_if = "TextStyle::is_empty")]
    pub style: TextStyle,
}

/// A hyperlink. Children are text runs only, so an image can never sit
/// inside a link.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkSpan {
    pub url: String,
    pub children: Vec<TextRun>,
}

/// An embedded image. Rendered as its own block even when it was inserted
/// at an inline caret.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImageEmbed {
    pub src: String,
    pub alt_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    pub max_width: String,
}

impl TextRun {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            marks: Marks::empty(),
            style: TextStyle::default(),
        }
    }

    pub fn with_marks(mut self, marks: Marks) -> Self {
        self.marks = marks;
        self
    }

    pub fn with_style(mut self, style: TextStyle) -> Self {
        self.style = style;
        self
    }
}

impl LinkSpan {
    pub fn new(url: impl Into<String>, children: Vec<TextRun>) -> Self {
        Self {
            url: url.into(),
            children,
        }
    }
}

impl ImageEmbed {
    pub fn new(src: impl Into<String>, alt_text: impl Into<String>) -> Self {
        Self {
            src: src.into(),
            alt_text: alt_text.into(),
            width: None,
            height: None,
            max_width: DEFAULT_IMAGE_MAX_WIDTH.to_string(),
        }
    }

    pub fn with_size(mut self, width: Option<u32>, height: Option<u32>) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Set the CSS max width. A value that is not a single CSS value keeps
    /// the current one.
    pub fn with_max_width(mut self, max_width: impl AsRef<str>) -> Self {
        if let Some(max_width) = css_value(max_width.as_ref()) {
            self.max_width = max_width;
        }
        self
    }

    /// Canonical form: trimmed `src`, and the default max width in place of
    /// an unusable one. `None` when there is no source left.
    pub fn sanitized(&self) -> Option<Self> {
        let src = self.src.trim();
        if src.is_empty() {
            return None;
        }
        Some(Self {
            src: src.to_string(),
            alt_text: self.alt_text.clone(),
            width: self.width,
            height: self.height,
            max_width: css_value(&self.max_width)
                .unwrap_or_else(|| DEFAULT_IMAGE_MAX_WIDTH.to_string()),
        })
    }
}

impl Inline {
    pub fn text(text: impl Into<String>) -> Self {
        Inline::Text(TextRun::new(text))
    }

    pub fn marked(text: impl Into<String>, marks: Marks) -> Self {
        Inline::Text(TextRun::new(text).with_marks(marks))
    }

    /// Length in editor characters; an image counts as one.
    pub fn char_len(&self) -> usize {
        match self {
            Inline::Text(run) => run.text.chars().count(),
            Inline::Link(link) => link.children.iter().map(|r| r.text.chars().count()).sum(),
            Inline::Image(_) => 1,
        }
    }
}

impl TextBlock {
    pub fn new(kind: BlockKind, children: Vec<Inline>) -> Self {
        Self {
            kind,
            align: Alignment::default(),
            children,
        }
    }

    pub fn paragraph(children: Vec<Inline>) -> Self {
        Self::new(BlockKind::Paragraph, children)
    }

    pub fn heading(level: HeadingLevel, children: Vec<Inline>) -> Self {
        Self::new(BlockKind::Heading(level), children)
    }

    pub fn quote(children: Vec<Inline>) -> Self {
        Self::new(BlockKind::Quote, children)
    }
}

impl ListItem {
    pub fn new(children: Vec<Inline>) -> Self {
        Self {
            align: Alignment::default(),
            children,
            restore: None,
        }
    }
}

impl ListBlock {
    pub fn new(kind: ListKind, items: Vec<ListItem>) -> Self {
        Self { kind, items }
    }
}

impl From<TextBlock> for Block {
    fn from(block: TextBlock) -> Self {
        Block::Text(block)
    }
}

impl From<ListBlock> for Block {
    fn from(list: ListBlock) -> Self {
        Block::List(list)
    }
}

/// What a leaf block is: its own kind, or an item of a list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeafKind {
    Paragraph,
    Heading(HeadingLevel),
    Quote,
    ListItem(ListKind),
}

impl From<BlockKind> for LeafKind {
    fn from(kind: BlockKind) -> Self {
        match kind {
            BlockKind::Paragraph => LeafKind::Paragraph,
            BlockKind::Heading(level) => LeafKind::Heading(level),
            BlockKind::Quote => LeafKind::Quote,
        }
    }
}

impl LeafKind {
    pub fn list_kind(self) -> Option<ListKind> {
        match self {
            LeafKind::ListItem(kind) => Some(kind),
            _ => None,
        }
    }

    /// The block kind of a leaf outside a list.
    pub fn block_kind(self) -> Option<BlockKind> {
        match self {
            LeafKind::Paragraph => Some(BlockKind::Paragraph),
            LeafKind::Heading(level) => Some(BlockKind::Heading(level)),
            LeafKind::Quote => Some(BlockKind::Quote),
            LeafKind::ListItem(_) => None,
        }
    }
}

/// Flat, owned view of one text-bearing block.
#[derive(Debug, Clone, PartialEq)]
pub struct Leaf {
    pub kind: LeafKind,
    pub align: Alignment,
    pub children: Vec<Inline>,
    /// See [`ListItem::restore`]. Only kept for list items.
    pub restore: Option<BlockKind>,
}

impl Leaf {
    pub fn new(kind: LeafKind, children: Vec<Inline>) -> Self {
        Self {
            kind,
            align: Alignment::default(),
            children,
            restore: None,
        }
    }

    pub fn char_len(&self) -> usize {
        inline::content_len(&self.children)
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// An empty document: one empty paragraph.
    pub fn new() -> Self {
        Self {
            blocks: vec![Block::Text(TextBlock::paragraph(Vec::new()))],
        }
    }

    /// Build a document from blocks.
    ///
    /// Empty lists are dropped, adjacent lists of the same kind are merged and
    /// a document with no blocks gets a single empty paragraph.
    pub fn from_blocks(blocks: Vec<Block>) -> Self {
        let mut out: Vec<Block> = Vec::with_capacity(blocks.len());
        for block in blocks {
            match block {
                Block::List(list) if list.items.is_empty() => {}
                Block::List(list) => match out.last_mut() {
                    Some(Block::List(prev)) if prev.kind == list.kind => {
                        prev.items.extend(list.items);
                    }
                    _ => out.push(Block::List(list)),
                },
                text => out.push(text),
            }
        }
        if out.is_empty() {
            return Self::new();
        }
        Self { blocks: out }
    }

    /// Rebuild a document from its flat leaf view.
    pub fn from_leaves(leaves: Vec<Leaf>) -> Self {
        let blocks = leaves
            .into_iter()
            .map(|leaf| match leaf.kind {
                LeafKind::ListItem(kind) => Block::List(ListBlock::new(
                    kind,
                    vec![ListItem {
                        align: leaf.align,
                        children: leaf.children,
                        restore: leaf.restore,
                    }],
                )),
                LeafKind::Paragraph => Block::Text(TextBlock {
                    kind: BlockKind::Paragraph,
                    align: leaf.align,
                    children: leaf.children,
                }),
                LeafKind::Heading(level) => Block::Text(TextBlock {
                    kind: BlockKind::Heading(level),
                    align: leaf.align,
                    children: leaf.children,
                }),
                LeafKind::Quote => Block::Text(TextBlock {
                    kind: BlockKind::Quote,
                    align: leaf.align,
                    children: leaf.children,
                }),
            })
            .collect();
        Self::from_blocks(blocks)
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Owned flat view of every leaf block, in document order.
    pub fn leaves(&self) -> Vec<Leaf> {
        let mut leaves = Vec::with_capacity(self.leaf_count());
        for block in &self.blocks {
            match block {
                Block::Text(text) => leaves.push(Leaf {
                    kind: text.kind.into(),
                    align: text.align,
                    children: text.children.clone(),
                    restore: None,
                }),
                Block::List(list) => leaves.extend(list.items.iter().map(|item| Leaf {
                    kind: LeafKind::ListItem(list.kind),
                    align: item.align,
                    children: item.children.clone(),
                    restore: item.restore,
                })),
            }
        }
        leaves
    }

    /// Borrowing iterator over leaf blocks: `(kind, alignment, inline content)`.
    pub fn iter_leaves(&self) -> impl Iterator<Item = (LeafKind, Alignment, &[Inline])> + '_ {
        self.blocks.iter().flat_map(|block| {
            let leaves: Vec<(LeafKind, Alignment, &[Inline])> = match block {
                Block::Text(text) => vec![(text.kind.into(), text.align, text.children.as_slice())],
                Block::List(list) => list
                    .items
                    .iter()
                    .map(|item| (LeafKind::ListItem(list.kind), item.align, item.children.as_slice()))
                    .collect(),
            };
            leaves
        })
    }

    pub fn leaf_count(&self) -> usize {
        self.blocks
            .iter()
            .map(|block| match block {
                Block::Text(_) => 1,
                Block::List(list) => list.items.len(),
            })
            .sum()
    }

    /// Kind, alignment and content of one leaf.
    pub fn leaf(&self, index: usize) -> Option<(LeafKind, Alignment, &[Inline])> {
        self.iter_leaves().nth(index)
    }

    /// Character length of one leaf (0 when out of range).
    pub fn leaf_len(&self, index: usize) -> usize {
        self.leaf(index)
            .map(|(_, _, children)| inline::content_len(children))
            .unwrap_or(0)
    }

    /// The same document with every block's inline content in canonical
    /// form: adjacent runs with identical formatting merged, empty runs
    /// dropped, images lifted out of links.
    pub fn normalized(&self) -> Self {
        let blocks = self
            .blocks
            .iter()
            .cloned()
            .map(|block| match block {
                Block::Text(mut text) => {
                    text.children = inline::normalize(&text.children);
                    Block::Text(text)
                }
                Block::List(mut list) => {
                    for item in &mut list.items {
                        item.children = inline::normalize(&item.children);
                    }
                    Block::List(list)
                }
            })
            .collect();
        Self::from_blocks(blocks)
    }

    /// Concatenated text of the document, one line per leaf block.
    pub fn plain_text(&self) -> String {
        self.iter_leaves()
            .map(|(_, _, children)| inline::plain_text(children))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// True when the document holds a single empty paragraph.
    pub fn is_empty(&self) -> bool {
        *self == Self::new()
    }
}
