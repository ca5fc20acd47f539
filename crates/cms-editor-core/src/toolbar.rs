//! Toolbar state derived from the selection.

use serde::Serialize;

use crate::document::LeafKind;
use crate::execute::{EditorState, selected_formats};
use crate::inline;
use crate::types::{Alignment, Mark, Marks};

/// What the toolbar shows as active or disabled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolbarState {
    /// Marks carried by every character of the selection, or the caret's
    /// pending format.
    pub marks: Marks,
    pub link: bool,
    /// Kind of the block holding the selection start.
    pub block: Option<LeafKind>,
    pub alignment: Alignment,
    pub can_undo: bool,
    pub can_redo: bool,
    /// Image insertion is disabled while an upload is pending.
    pub uploading: bool,
}

impl ToolbarState {
    pub fn compute(state: &EditorState, can_undo: bool, can_redo: bool, uploading: bool) -> Self {
        let mut toolbar = Self {
            marks: Marks::empty(),
            link: false,
            block: None,
            alignment: Alignment::default(),
            can_undo,
            can_redo,
            uploading,
        };
        let Some(sel) = state.clamped_selection() else {
            return toolbar;
        };

        if let Some((kind, align, children)) = state.document.leaf(sel.start().block) {
            toolbar.block = Some(kind);
            toolbar.alignment = align;
            if sel.is_collapsed() {
                let format = state
                    .pending_format
                    .clone()
                    .unwrap_or_else(|| inline::format_at(children, sel.head.offset));
                toolbar.marks = format.marks;
                toolbar.link = inline::link_extent(children, sel.head.offset).is_some();
                return toolbar;
            }
        }

        let formats = selected_formats(&state.document, sel);
        if let Some(first) = formats.first() {
            toolbar.marks = formats.iter().fold(first.marks, |acc, f| acc & f.marks);
            toolbar.link = formats.iter().all(|f| f.link.is_some());
        }
        toolbar
    }

    pub fn is_active(&self, mark: Mark) -> bool {
        self.marks.contains(mark.flag())
    }

    pub fn can_insert_image(&self) -> bool {
        !self.uploading
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Document, HeadingLevel, Inline, LinkSpan, TextBlock, TextRun};
    use crate::types::{Position, Selection};

    fn state(sel: Selection) -> EditorState {
        let doc = Document::from_blocks(vec![
            TextBlock::heading(
                HeadingLevel::H2,
                vec![
                    Inline::marked("ab", Marks::BOLD | Marks::ITALIC),
                    Inline::marked("cd", Marks::BOLD),
                    Inline::Link(LinkSpan::new("https://a", vec![TextRun::new("ef")])),
                ],
            )
            .into(),
        ]);
        EditorState {
            document: doc,
            selection: Some(sel),
            pending_format: None,
        }
    }

    #[test]
    fn test_marks_common_to_selection() {
        let toolbar = ToolbarState::compute(&state(Selection::in_block(0, 0, 4)), false, false, false);
        assert!(toolbar.is_active(Mark::Bold));
        assert!(!toolbar.is_active(Mark::Italic));
        assert_eq!(toolbar.block, Some(LeafKind::Heading(HeadingLevel::H2)));
        assert!(!toolbar.link);
    }

    #[test]
    fn test_caret_inside_link() {
        let toolbar = ToolbarState::compute(
            &state(Selection::collapsed(Position::new(0, 5))),
            true,
            false,
            false,
        );
        assert!(toolbar.link);
        assert!(toolbar.can_undo);
    }

    #[test]
    fn test_uploading_disables_image_button() {
        let toolbar = ToolbarState::compute(&EditorState::default(), false, false, true);
        assert!(!toolbar.can_insert_image());
        assert_eq!(toolbar.block, None);
    }
}
