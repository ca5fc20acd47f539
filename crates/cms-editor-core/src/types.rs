//! Core editor types: positions, selection, marks and text styling.
//!
//! These types are UI-agnostic; the embedding layer maps its native
//! selection onto [`Position`]s before dispatching actions.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

/// A caret position inside the document.
///
/// `block` is the index of a leaf block (paragraph, heading, quote or list
/// item) in document order. `offset` counts characters in that block's
/// flattened inline content, where an embedded image counts as one.
#[derive(Clone, Debug, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Position {
    pub block: usize,
    pub offset: usize,
}

impl Position {
    pub fn new(block: usize, offset: usize) -> Self {
        Self { block, offset }
    }
}

/// Selection with anchor and head positions.
///
/// The anchor is where the selection started, the head is where the caret is now.
/// They may be in any order - use `start()` and `end()` for ordered bounds.
#[derive(Clone, Debug, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    /// Where selection started
    pub anchor: Position,
    /// Where the caret is now
    pub head: Position,
}

impl Selection {
    pub fn new(anchor: Position, head: Position) -> Self {
        Self { anchor, head }
    }

    /// Create a collapsed selection (caret only).
    pub fn collapsed(at: Position) -> Self {
        Self {
            anchor: at,
            head: at,
        }
    }

    /// Selection covering `start..end` inside a single leaf block.
    pub fn in_block(block: usize, start: usize, end: usize) -> Self {
        Self::new(Position::new(block, start), Position::new(block, end))
    }

    /// Get the start (lower bound) of the selection.
    pub fn start(&self) -> Position {
        self.anchor.min(self.head)
    }

    /// Get the end (upper bound) of the selection.
    pub fn end(&self) -> Position {
        self.anchor.max(self.head)
    }

    /// Check if the selection is collapsed (caret only).
    pub fn is_collapsed(&self) -> bool {
        self.anchor == self.head
    }
}

bitflags! {
    /// Inline formatting marks carried by a text run.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct Marks: u8 {
        const BOLD = 1 << 0;
        const ITALIC = 1 << 1;
        const UNDERLINE = 1 << 2;
        const STRIKETHROUGH = 1 << 3;
        const SUPERSCRIPT = 1 << 4;
        const SUBSCRIPT = 1 << 5;
        const CODE = 1 << 6;
    }
}

/// A single formatting mark, as named by toolbar commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mark {
    Bold,
    Italic,
    Underline,
    Strikethrough,
    Superscript,
    Subscript,
    Code,
}

impl Mark {
    /// Every mark, in the order the HTML writer nests them (outermost first).
    pub const ALL: [Mark; 7] = [
        Mark::Bold,
        Mark::Italic,
        Mark::Underline,
        Mark::Strikethrough,
        Mark::Superscript,
        Mark::Subscript,
        Mark::Code,
    ];

    pub fn flag(self) -> Marks {
        match self {
            Mark::Bold => Marks::BOLD,
            Mark::Italic => Marks::ITALIC,
            Mark::Underline => Marks::UNDERLINE,
            Mark::Strikethrough => Marks::STRIKETHROUGH,
            Mark::Superscript => Marks::SUPERSCRIPT,
            Mark::Subscript => Marks::SUBSCRIPT,
            Mark::Code => Marks::CODE,
        }
    }

    /// HTML element emitted for this mark.
    pub fn tag(self) -> &'static str {
        match self {
            Mark::Bold => "strong",
            Mark::Italic => "em",
            Mark::Underline => "u",
            Mark::Strikethrough => "s",
            Mark::Superscript => "sup",
            Mark::Subscript => "sub",
            Mark::Code => "code",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Mark::Bold => "bold",
            Mark::Italic => "italic",
            Mark::Underline => "underline",
            Mark::Strikethrough => "strikethrough",
            Mark::Superscript => "superscript",
            Mark::Subscript => "subscript",
            Mark::Code => "code",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.name() == name)
    }
}

impl Default for Marks {
    fn default() -> Self {
        Marks::empty()
    }
}

impl Marks {
    /// Iterate the marks present, in nesting order.
    pub fn marks(self) -> impl Iterator<Item = Mark> {
        Mark::ALL.into_iter().filter(move |m| self.contains(m.flag()))
    }
}

/// Colour styling on a run. Independent of marks; "clear formatting" keeps it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct TextStyle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background: Option<String>,
}

impl TextStyle {
    pub fn is_empty(&self) -> bool {
        self.color.is_none() && self.background.is_none()
    }

    /// The same style with every value passed through [`css_value`].
    pub fn sanitized(&self) -> Self {
        Self {
            color: self.color.as_deref().and_then(css_value),
            background: self.background.as_deref().and_then(css_value),
        }
    }

    /// Inline CSS for this style, or `None` when unstyled. Values that are not
    /// a single CSS value are left out.
    pub fn to_css(&self) -> Option<String> {
        let mut parts = Vec::new();
        if let Some(color) = self.color.as_deref().and_then(css_value) {
            parts.push(format!("color: {color};"));
        }
        if let Some(background) = self.background.as_deref().and_then(css_value) {
            parts.push(format!("background-color: {background};"));
        }
        if parts.is_empty() {
            None
        } else {
            Some(parts.join(" "))
        }
    }
}

/// Trimmed `value` if it is one CSS value that can sit inside a `style`
/// declaration, or `None` when it is blank or could end the declaration or
/// the attribute.
pub fn css_value(value: &str) -> Option<String> {
    let value = value.trim();
    let valid = !value.is_empty()
        && !value
            .chars()
            .any(|c| matches!(c, ';' | ':' | '"' | '\'' | '<' | '>' | '\\') || c.is_control());
    valid.then(|| value.to_string())
}

/// Block alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    #[default]
    Left,
    Center,
    Right,
}

impl Alignment {
    pub fn as_str(self) -> &'static str {
        match self {
            Alignment::Left => "left",
            Alignment::Center => "center",
            Alignment::Right => "right",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "left" | "start" => Some(Alignment::Left),
            "center" => Some(Alignment::Center),
            "right" | "end" => Some(Alignment::Right),
            _ => None,
        }
    }
}
