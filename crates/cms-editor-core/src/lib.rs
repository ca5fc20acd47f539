//! cms-editor-core: rich-text editing for article bodies, without a UI framework.
//!
//! This crate provides:
//! - `Document` - the block/inline tree (paragraphs, headings, quotes, lists,
//!   text runs, links, images)
//! - `EditorAction` and `execute_action` - every editing command
//! - `Editor` - the embeddable handle with bounded undo, change callback and
//!   toolbar subscriptions
//! - `import_html` / `export_html` - the HTML bridge, stable under round trips
//! - `AssetStore` and the image upload flow

pub mod actions;
pub mod assets;
pub mod config;
pub mod document;
pub mod editor;
pub mod error;
pub mod execute;
pub mod html;
pub mod inline;
pub mod render;
pub mod toolbar;
pub mod types;
pub mod undo;
pub mod upload;

pub use actions::{EditorAction, Key, KeyCombo, KeybindingConfig, KeydownResult, Modifiers};
pub use assets::{AssetStore, ImageFile, MemoryAssetStore, UploadedAsset, validate_image};
pub use config::EditorConfig;
pub use document::{
    Block, BlockKind, Document, HeadingLevel, ImageEmbed, Inline, LeafKind, LinkSpan, ListBlock,
    ListItem, ListKind, TextBlock, TextRun,
};
pub use editor::{Editor, SubscriptionId};
pub use error::{AssetStoreError, CommandError, ConfigError, UploadError, ValidationError};
pub use execute::{EditorState, execute_action};
pub use html::{export_html, import_html};
pub use render::{FailedImages, ImageLoadState, render_document};
pub use smol_str::SmolStr;
pub use toolbar::ToolbarState;
pub use types::{Alignment, Mark, Marks, Position, Selection, TextStyle, css_value};
pub use undo::{UndoManager, UndoableState};
pub use upload::UploadTicket;
