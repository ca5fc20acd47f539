//! Editor actions and keybindings.
//!
//! Platform-agnostic definitions for editor operations. The `EditorAction`
//! enum represents semantic editing operations; toolbar buttons name them
//! with a command string and an optional payload, keyboard shortcuts reach
//! them through a `KeybindingConfig`.

use std::collections::HashMap;

use smol_str::SmolStr;

use crate::document::{BlockKind, HeadingLevel, ImageEmbed, ListKind};
use crate::error::CommandError;
use crate::types::{Alignment, Mark, Position};

/// All possible editor actions.
///
/// These represent semantic operations on the document, decoupled from
/// how they're triggered (toolbar, keyboard, programmatic). Actions that
/// need a location read it from the editor's current selection.
#[derive(Debug, Clone, PartialEq)]
pub enum EditorAction {
    // === Text Insertion ===
    /// Insert text at the caret (replacing any selected content).
    InsertText { text: String },

    /// Split the block at the caret (Enter).
    InsertParagraph,

    // === Deletion ===
    /// Delete content backward (Backspace).
    DeleteBackward,

    /// Delete content forward (Delete key).
    DeleteForward,

    // === History ===
    /// Undo the last change.
    Undo,

    /// Redo the last undone change.
    Redo,

    // === Inline formatting ===
    /// Toggle one mark over the selection.
    ToggleMark(Mark),

    /// Remove every mark from the selection.
    ClearFormatting,

    /// Set the text colour of the selection.
    SetTextColor(String),

    /// Set the background colour of the selection.
    SetBackgroundColor(String),

    /// Wrap the selection in a link.
    InsertLink { url: String },

    /// Remove links from the selection (or the link under the caret).
    RemoveLink,

    // === Block formatting ===
    /// Convert every selected block to the given kind.
    SetBlockType(BlockKind),

    /// Wrap, unwrap or switch a list around the selected blocks.
    ToggleList(ListKind),

    /// Align every selected block.
    SetAlignment(Alignment),

    // === Embeds ===
    /// Insert an already-uploaded image at the caret.
    InsertImage(ImageEmbed),

    // === Selection ===
    /// Select all content.
    SelectAll,

    /// Move cursor to position.
    MoveCursor { to: Position },

    /// Extend selection to position.
    ExtendSelection { to: Position },
}

impl EditorAction {
    /// Resolve a named toolbar command.
    ///
    /// Names are case-insensitive and accept `-` for `_`. Commands that
    /// need a payload (`link`, `heading`, `align`, colours, `insert_text`,
    /// `insert_image`, `format_text`) fail with
    /// [`CommandError::MissingPayload`] without one.
    pub fn from_name(name: &str, payload: Option<&str>) -> Result<Self, CommandError> {
        let command = name.trim().to_ascii_lowercase().replace('-', "_");
        let require = || {
            payload.ok_or_else(|| CommandError::MissingPayload {
                command: command.clone(),
            })
        };
        let invalid = |payload: &str| CommandError::InvalidPayload {
            command: command.clone(),
            payload: payload.to_string(),
        };

        if let Some(mark) = Mark::from_name(&command) {
            return Ok(EditorAction::ToggleMark(mark));
        }

        let action = match command.as_str() {
            "format_text" => {
                let payload = require()?;
                let mark = Mark::from_name(&payload.trim().to_ascii_lowercase())
                    .ok_or_else(|| invalid(payload))?;
                EditorAction::ToggleMark(mark)
            }
            "paragraph" => EditorAction::SetBlockType(BlockKind::Paragraph),
            "h1" => EditorAction::SetBlockType(BlockKind::Heading(HeadingLevel::H1)),
            "h2" => EditorAction::SetBlockType(BlockKind::Heading(HeadingLevel::H2)),
            "h3" => EditorAction::SetBlockType(BlockKind::Heading(HeadingLevel::H3)),
            "heading" => {
                let payload = require()?;
                let level = payload
                    .trim()
                    .trim_start_matches(['h', 'H'])
                    .parse::<u8>()
                    .ok()
                    .and_then(HeadingLevel::from_u8)
                    .ok_or_else(|| invalid(payload))?;
                EditorAction::SetBlockType(BlockKind::Heading(level))
            }
            "quote" => EditorAction::SetBlockType(BlockKind::Quote),
            "bullet_list" | "unordered_list" | "ul" => EditorAction::ToggleList(ListKind::Unordered),
            "number_list" | "ordered_list" | "ol" => EditorAction::ToggleList(ListKind::Ordered),
            "align" => {
                let payload = require()?;
                EditorAction::SetAlignment(Alignment::from_name(payload).ok_or_else(|| invalid(payload))?)
            }
            "align_left" => EditorAction::SetAlignment(Alignment::Left),
            "align_center" => EditorAction::SetAlignment(Alignment::Center),
            "align_right" => EditorAction::SetAlignment(Alignment::Right),
            "link" => EditorAction::InsertLink {
                url: require()?.trim().to_string(),
            },
            "unlink" | "remove_link" => EditorAction::RemoveLink,
            "clear_formatting" => EditorAction::ClearFormatting,
            "text_color" => EditorAction::SetTextColor(require()?.trim().to_string()),
            "background_color" => EditorAction::SetBackgroundColor(require()?.trim().to_string()),
            "insert_text" => EditorAction::InsertText {
                text: require()?.to_string(),
            },
            "insert_paragraph" => EditorAction::InsertParagraph,
            "delete_backward" => EditorAction::DeleteBackward,
            "delete_forward" => EditorAction::DeleteForward,
            "insert_image" => {
                let src = require()?.trim();
                if src.is_empty() {
                    return Err(invalid(src));
                }
                EditorAction::InsertImage(ImageEmbed::new(src, ""))
            }
            "undo" => EditorAction::Undo,
            "redo" => EditorAction::Redo,
            "select_all" => EditorAction::SelectAll,
            _ => return Err(CommandError::Unknown(name.to_string())),
        };
        Ok(action)
    }
}

/// Key values for keyboard input.
///
/// Platform-agnostic key representation. Platform-specific code converts
/// from native key events to this enum.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Key {
    /// A character key.
    Character(SmolStr),

    /// Unknown/unidentified key.
    Unidentified,

    // === Whitespace / editing ===
    Backspace,
    Delete,
    Enter,
    Tab,
    Escape,

    // === Navigation ===
    ArrowLeft,
    ArrowRight,
    ArrowUp,
    ArrowDown,
    Home,
    End,
    PageUp,
    PageDown,

    // === Modifiers ===
    Alt,
    CapsLock,
    Control,
    Meta,
    Shift,
}

impl Key {
    /// Create a character key.
    pub fn character(s: impl Into<SmolStr>) -> Self {
        Self::Character(s.into())
    }

    /// Check if this is a navigation key.
    pub fn is_navigation(&self) -> bool {
        matches!(
            self,
            Self::ArrowLeft
                | Self::ArrowRight
                | Self::ArrowUp
                | Self::ArrowDown
                | Self::Home
                | Self::End
                | Self::PageUp
                | Self::PageDown
        )
    }

    /// Check if this is a modifier key.
    pub fn is_modifier(&self) -> bool {
        matches!(
            self,
            Self::Alt | Self::CapsLock | Self::Control | Self::Meta | Self::Shift
        )
    }

    /// Character keys compare case-insensitively (Shift+Z reports `Z`).
    fn normalized(&self) -> Self {
        match self {
            Self::Character(s) => Self::Character(SmolStr::new(s.to_lowercase())),
            other => other.clone(),
        }
    }
}

/// Modifier key state for a key combination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Modifiers {
    pub ctrl: bool,
    pub alt: bool,
    pub shift: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Self = Self {
        ctrl: false,
        alt: false,
        shift: false,
        meta: false,
    };

    pub const CTRL: Self = Self {
        ctrl: true,
        alt: false,
        shift: false,
        meta: false,
    };

    pub const SHIFT: Self = Self {
        ctrl: false,
        alt: false,
        shift: true,
        meta: false,
    };

    pub const META: Self = Self {
        ctrl: false,
        alt: false,
        shift: false,
        meta: true,
    };

    pub const CTRL_SHIFT: Self = Self {
        ctrl: true,
        alt: false,
        shift: true,
        meta: false,
    };

    pub const META_SHIFT: Self = Self {
        ctrl: false,
        alt: false,
        shift: true,
        meta: true,
    };

    /// Get the primary modifier for the platform (Cmd on Mac, Ctrl elsewhere).
    pub fn primary(is_mac: bool) -> Self {
        if is_mac { Self::META } else { Self::CTRL }
    }

    /// Get the primary modifier + Shift for the platform.
    pub fn primary_shift(is_mac: bool) -> Self {
        if is_mac {
            Self::META_SHIFT
        } else {
            Self::CTRL_SHIFT
        }
    }
}

/// A key combination for triggering an action.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyCombo {
    pub key: Key,
    pub modifiers: Modifiers,
}

impl KeyCombo {
    pub fn new(key: Key) -> Self {
        Self {
            key,
            modifiers: Modifiers::NONE,
        }
    }

    pub fn with_modifiers(key: Key, modifiers: Modifiers) -> Self {
        Self { key, modifiers }
    }

    pub fn primary(key: Key, is_mac: bool) -> Self {
        Self {
            key,
            modifiers: Modifiers::primary(is_mac),
        }
    }

    pub fn primary_shift(key: Key, is_mac: bool) -> Self {
        Self {
            key,
            modifiers: Modifiers::primary_shift(is_mac),
        }
    }

    fn normalized(&self) -> Self {
        Self {
            key: self.key.normalized(),
            modifiers: self.modifiers,
        }
    }
}

/// Mapping from key combinations to actions.
#[derive(Debug, Clone, PartialEq)]
pub struct KeybindingConfig {
    bindings: HashMap<KeyCombo, EditorAction>,
}

impl Default for KeybindingConfig {
    fn default() -> Self {
        Self::default_for_platform(false)
    }
}

impl KeybindingConfig {
    /// An empty configuration.
    pub fn empty() -> Self {
        Self {
            bindings: HashMap::new(),
        }
    }

    /// The standard rich-text shortcuts, using Cmd on Mac and Ctrl elsewhere.
    pub fn default_for_platform(is_mac: bool) -> Self {
        let mut config = Self::empty();
        let primary = |c: &str| KeyCombo::primary(Key::character(c), is_mac);

        config.bind(primary("b"), EditorAction::ToggleMark(Mark::Bold));
        config.bind(primary("i"), EditorAction::ToggleMark(Mark::Italic));
        config.bind(primary("u"), EditorAction::ToggleMark(Mark::Underline));
        config.bind(primary("e"), EditorAction::ToggleMark(Mark::Code));
        config.bind(primary("a"), EditorAction::SelectAll);
        config.bind(primary("z"), EditorAction::Undo);
        config.bind(
            KeyCombo::primary_shift(Key::character("z"), is_mac),
            EditorAction::Redo,
        );
        if !is_mac {
            config.bind(primary("y"), EditorAction::Redo);
        }

        config.bind(KeyCombo::new(Key::Enter), EditorAction::InsertParagraph);
        config.bind(KeyCombo::new(Key::Backspace), EditorAction::DeleteBackward);
        config.bind(KeyCombo::new(Key::Delete), EditorAction::DeleteForward);
        config
    }

    /// Add or replace a binding.
    pub fn bind(&mut self, combo: KeyCombo, action: EditorAction) {
        self.bindings.insert(combo.normalized(), action);
    }

    /// Remove a binding, returning the action it triggered.
    pub fn unbind(&mut self, combo: &KeyCombo) -> Option<EditorAction> {
        self.bindings.remove(&combo.normalized())
    }

    /// Look up the action bound to a key combination.
    pub fn lookup(&self, combo: &KeyCombo) -> Option<EditorAction> {
        self.bindings.get(&combo.normalized()).cloned()
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

/// Result of handling a keydown event.
#[derive(Debug, Clone, PartialEq)]
pub enum KeydownResult {
    /// Event was handled, prevent default.
    Handled,
    /// Event was not a keybinding, let platform handle it.
    NotHandled,
    /// Event should be passed through (navigation, etc.).
    PassThrough,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mark_commands() {
        assert_eq!(
            EditorAction::from_name("bold", None),
            Ok(EditorAction::ToggleMark(Mark::Bold))
        );
        assert_eq!(
            EditorAction::from_name("Strikethrough", None),
            Ok(EditorAction::ToggleMark(Mark::Strikethrough))
        );
        assert_eq!(
            EditorAction::from_name("format_text", Some("superscript")),
            Ok(EditorAction::ToggleMark(Mark::Superscript))
        );
    }

    #[test]
    fn test_block_commands() {
        assert_eq!(
            EditorAction::from_name("heading", Some("h2")),
            Ok(EditorAction::SetBlockType(BlockKind::Heading(HeadingLevel::H2)))
        );
        assert_eq!(
            EditorAction::from_name("heading", Some("3")),
            Ok(EditorAction::SetBlockType(BlockKind::Heading(HeadingLevel::H3)))
        );
        assert_eq!(
            EditorAction::from_name("bullet-list", None),
            Ok(EditorAction::ToggleList(ListKind::Unordered))
        );
        assert_eq!(
            EditorAction::from_name("align", Some("center")),
            Ok(EditorAction::SetAlignment(Alignment::Center))
        );
    }

    #[test]
    fn test_payload_errors() {
        assert_eq!(
            EditorAction::from_name("link", None),
            Err(CommandError::MissingPayload {
                command: "link".into()
            })
        );
        assert_eq!(
            EditorAction::from_name("heading", Some("h4")),
            Err(CommandError::InvalidPayload {
                command: "heading".into(),
                payload: "h4".into()
            })
        );
        assert_eq!(
            EditorAction::from_name("blink", None),
            Err(CommandError::Unknown("blink".into()))
        );
    }

    #[test]
    fn test_link_payload_is_trimmed() {
        assert_eq!(
            EditorAction::from_name("link", Some("  https://example.com ")),
            Ok(EditorAction::InsertLink {
                url: "https://example.com".into()
            })
        );
    }

    #[test]
    fn test_default_keybindings() {
        let config = KeybindingConfig::default_for_platform(false);
        assert_eq!(
            config.lookup(&KeyCombo::primary(Key::character("b"), false)),
            Some(EditorAction::ToggleMark(Mark::Bold))
        );
        // Shift reports the upper-case character.
        assert_eq!(
            config.lookup(&KeyCombo::primary_shift(Key::character("Z"), false)),
            Some(EditorAction::Redo)
        );
        assert_eq!(
            config.lookup(&KeyCombo::primary(Key::character("y"), false)),
            Some(EditorAction::Redo)
        );
        assert_eq!(config.lookup(&KeyCombo::new(Key::character("b"))), None);
    }

    #[test]
    fn test_mac_keybindings_use_meta() {
        let config = KeybindingConfig::default_for_platform(true);
        assert_eq!(
            config.lookup(&KeyCombo::with_modifiers(Key::character("i"), Modifiers::META)),
            Some(EditorAction::ToggleMark(Mark::Italic))
        );
        assert_eq!(
            config.lookup(&KeyCombo::with_modifiers(Key::character("i"), Modifiers::CTRL)),
            None
        );
    }

    #[test]
    fn test_rebinding() {
        let mut config = KeybindingConfig::empty();
        let combo = KeyCombo::primary(Key::character("k"), false);
        config.bind(combo.clone(), EditorAction::RemoveLink);
        assert_eq!(config.len(), 1);
        assert_eq!(config.unbind(&combo), Some(EditorAction::RemoveLink));
        assert!(config.is_empty());
    }
}
