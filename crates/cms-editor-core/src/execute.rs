//! Action execution for editor state.
//!
//! This module provides the `execute_action` function that applies
//! `EditorAction` operations to an `EditorState`. Every edit works on the
//! document's flat leaf view and rebuilds the tree afterwards, so list
//! grouping and inline normalisation are re-established after each step.

use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::actions::EditorAction;
use crate::document::{BlockKind, Document, ImageEmbed, Leaf, LeafKind, ListKind};
use crate::inline::{self, RunFormat};
use crate::types::{Alignment, Mark, Position, Selection, TextStyle, css_value};

/// Everything an action reads or writes.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EditorState {
    pub document: Document,
    /// `None` while the editing surface has no focus.
    pub selection: Option<Selection>,
    /// Formatting for the next typed text at a collapsed caret.
    #[serde(skip)]
    pub pending_format: Option<RunFormat>,
}

impl EditorState {
    pub fn new(document: Document) -> Self {
        Self {
            document,
            selection: None,
            pending_format: None,
        }
    }

    /// The selection clamped to the current document.
    pub fn clamped_selection(&self) -> Option<Selection> {
        self.selection.map(|sel| {
            Selection::new(
                clamp_position(&self.document, sel.anchor),
                clamp_position(&self.document, sel.head),
            )
        })
    }

    /// Replace the selection, dropping any pending caret format.
    pub fn set_selection(&mut self, selection: Option<Selection>) {
        self.selection = selection;
        self.pending_format = None;
    }

    /// Position just past the last character of the document.
    pub fn end_position(&self) -> Position {
        let last = self.document.leaf_count().saturating_sub(1);
        Position::new(last, self.document.leaf_len(last))
    }
}

/// Pull a position back inside the document.
pub fn clamp_position(doc: &Document, pos: Position) -> Position {
    let block = pos.block.min(doc.leaf_count().saturating_sub(1));
    Position::new(block, pos.offset.min(doc.leaf_len(block)))
}

/// Per-leaf character ranges covered by a selection, in document order.
pub(crate) fn leaf_ranges(doc: &Document, sel: Selection) -> Vec<(usize, Range<usize>)> {
    let (start, end) = (sel.start(), sel.end());
    (start.block..=end.block)
        .map(|block| {
            let from = if block == start.block { start.offset } else { 0 };
            let to = if block == end.block {
                end.offset
            } else {
                doc.leaf_len(block)
            };
            (block, from..to)
        })
        .collect()
}

/// Execute an editor action on the editor state.
///
/// This is the central dispatch point for all editor operations.
/// Returns true if the action was handled. Structural commands without a
/// selection are silent no-ops and return false. Undo and redo need the
/// history owned by [`Editor`](crate::Editor) and are not handled here.
pub fn execute_action(state: &mut EditorState, action: &EditorAction) -> bool {
    tracing::trace!(target: "cms_editor::execute", ?action, "execute");
    match action {
        EditorAction::InsertText { text } => execute_insert_text(state, text),
        EditorAction::InsertParagraph => execute_insert_paragraph(state),
        EditorAction::DeleteBackward => execute_delete_backward(state),
        EditorAction::DeleteForward => execute_delete_forward(state),
        EditorAction::Undo | EditorAction::Redo => {
            // History lives on the editor handle.
            false
        }
        EditorAction::ToggleMark(mark) => execute_toggle_mark(state, *mark),
        EditorAction::ClearFormatting => execute_clear_formatting(state),
        EditorAction::SetTextColor(color) => match style_value(color) {
            Some(color) => execute_style(state, |style| style.color = color.clone()),
            None => false,
        },
        EditorAction::SetBackgroundColor(color) => match style_value(color) {
            Some(background) => execute_style(state, |style| style.background = background.clone()),
            None => false,
        },
        EditorAction::InsertLink { url } => execute_insert_link(state, url),
        EditorAction::RemoveLink => execute_remove_link(state),
        EditorAction::SetBlockType(kind) => execute_set_block_type(state, *kind),
        EditorAction::ToggleList(kind) => execute_toggle_list(state, *kind),
        EditorAction::SetAlignment(align) => execute_set_alignment(state, *align),
        EditorAction::InsertImage(image) => execute_insert_image(state, image.clone()),
        EditorAction::SelectAll => execute_select_all(state),
        EditorAction::MoveCursor { to } => execute_move_cursor(state, *to),
        EditorAction::ExtendSelection { to } => execute_extend_selection(state, *to),
    }
}

/// Colour payload of a style command: `Some(None)` clears the property,
/// `None` rejects a value that is not a single CSS value.
fn style_value(value: &str) -> Option<Option<String>> {
    if value.trim().is_empty() {
        return Some(None);
    }
    let parsed = css_value(value);
    if parsed.is_none() {
        tracing::debug!(target: "cms_editor::execute", value, "rejecting style value");
        return None;
    }
    Some(parsed)
}

/// Remove the selected content, joining the boundary blocks. Returns the
/// collapsed caret.
fn delete_selection(leaves: &mut Vec<Leaf>, sel: Selection) -> Position {
    let (start, end) = (sel.start(), sel.end());
    if start.block == end.block {
        inline::delete_range(&mut leaves[start.block].children, start.offset..end.offset);
    } else {
        let tail = inline::split_off(&mut leaves[end.block].children, end.offset);
        inline::split_off(&mut leaves[start.block].children, start.offset);
        inline::append(&mut leaves[start.block].children, tail);
        leaves.drain(start.block + 1..=end.block);
    }
    start
}

fn commit(state: &mut EditorState, leaves: Vec<Leaf>, caret: Position) {
    state.document = Document::from_leaves(leaves);
    state.set_selection(Some(Selection::collapsed(caret)));
}

fn execute_insert_text(state: &mut EditorState, text: &str) -> bool {
    let Some(sel) = state.clamped_selection() else {
        return false;
    };
    if text.is_empty() {
        return false;
    }

    let pending = state.pending_format.take().filter(|_| sel.is_collapsed());
    let mut leaves = state.document.leaves();
    let mut caret = delete_selection(&mut leaves, sel);
    let format = pending.unwrap_or_else(|| inline::format_at(&leaves[caret.block].children, caret.offset));

    for (i, line) in text.split('\n').enumerate() {
        if i > 0 {
            caret = split_leaf(&mut leaves, caret);
        }
        inline::insert_text(&mut leaves[caret.block].children, caret.offset, line, &format);
        caret.offset += line.chars().count();
    }

    commit(state, leaves, caret);
    true
}

/// Split the leaf at `caret`, returning the start of the new leaf.
fn split_leaf(leaves: &mut Vec<Leaf>, caret: Position) -> Position {
    let leaf = &mut leaves[caret.block];
    let tail = inline::split_off(&mut leaf.children, caret.offset);
    let tail_empty = inline::content_len(&tail) == 0;
    let kind = match leaf.kind {
        LeafKind::Heading(_) if tail_empty => LeafKind::Paragraph,
        LeafKind::Quote => LeafKind::Paragraph,
        kind => kind,
    };
    let new_leaf = Leaf {
        kind,
        align: leaf.align,
        children: tail,
        restore: leaf.restore,
    };
    leaves.insert(caret.block + 1, new_leaf);
    Position::new(caret.block + 1, 0)
}

fn execute_insert_paragraph(state: &mut EditorState) -> bool {
    let Some(sel) = state.clamped_selection() else {
        return false;
    };
    let mut leaves = state.document.leaves();
    let caret = delete_selection(&mut leaves, sel);

    let leaf = &mut leaves[caret.block];
    if matches!(leaf.kind, LeafKind::ListItem(_)) && leaf.char_len() == 0 {
        // Enter on an empty item leaves the list.
        leaf.kind = LeafKind::Paragraph;
        commit(state, leaves, caret);
        return true;
    }

    let caret = split_leaf(&mut leaves, caret);
    commit(state, leaves, caret);
    true
}

fn execute_delete_backward(state: &mut EditorState) -> bool {
    let Some(sel) = state.clamped_selection() else {
        return false;
    };
    let mut leaves = state.document.leaves();

    if !sel.is_collapsed() {
        let caret = delete_selection(&mut leaves, sel);
        commit(state, leaves, caret);
        return true;
    }

    let caret = sel.head;
    if caret.offset > 0 {
        inline::delete_range(&mut leaves[caret.block].children, caret.offset - 1..caret.offset);
        commit(state, leaves, Position::new(caret.block, caret.offset - 1));
        return true;
    }

    // At the start of a block.
    let leaf = &mut leaves[caret.block];
    if matches!(leaf.kind, LeafKind::ListItem(_) | LeafKind::Quote) {
        leaf.kind = LeafKind::Paragraph;
        commit(state, leaves, caret);
        return true;
    }
    if caret.block == 0 {
        return false;
    }
    let removed = leaves.remove(caret.block);
    let previous = &mut leaves[caret.block - 1];
    let joined_at = previous.char_len();
    inline::append(&mut previous.children, removed.children);
    commit(state, leaves, Position::new(caret.block - 1, joined_at));
    true
}

fn execute_delete_forward(state: &mut EditorState) -> bool {
    let Some(sel) = state.clamped_selection() else {
        return false;
    };
    let mut leaves = state.document.leaves();

    if !sel.is_collapsed() {
        let caret = delete_selection(&mut leaves, sel);
        commit(state, leaves, caret);
        return true;
    }

    let caret = sel.head;
    if caret.offset < leaves[caret.block].char_len() {
        inline::delete_range(&mut leaves[caret.block].children, caret.offset..caret.offset + 1);
    } else if caret.block + 1 < leaves.len() {
        let next = leaves.remove(caret.block + 1);
        inline::append(&mut leaves[caret.block].children, next.children);
    } else {
        return false;
    }
    commit(state, leaves, caret);
    true
}

/// Apply `f` to every run format in the selection. Returns false when the
/// selection covers no text.
fn update_selected_formats(state: &mut EditorState, sel: Selection, mut f: impl FnMut(&mut RunFormat)) -> bool {
    let mut leaves = state.document.leaves();
    let mut touched = 0;
    for (block, range) in leaf_ranges(&state.document, sel) {
        touched += inline::update_formats(&mut leaves[block].children, range, &mut f);
    }
    if touched == 0 {
        return false;
    }
    state.document = Document::from_leaves(leaves);
    true
}

/// Formats of every text piece inside the selection.
pub(crate) fn selected_formats(doc: &Document, sel: Selection) -> Vec<RunFormat> {
    leaf_ranges(doc, sel)
        .into_iter()
        .flat_map(|(block, range)| {
            doc.leaf(block)
                .map(|(_, _, children)| inline::formats_in(children, range))
                .unwrap_or_default()
        })
        .collect()
}

/// Caret format with `f` applied, kept for the next typed text.
fn update_pending_format(state: &mut EditorState, caret: Position, f: impl FnOnce(&mut RunFormat)) -> bool {
    let mut format = match state.pending_format.take() {
        Some(format) => format,
        None => state
            .document
            .leaf(caret.block)
            .map(|(_, _, children)| inline::format_at(children, caret.offset))
            .unwrap_or_default(),
    };
    f(&mut format);
    state.pending_format = Some(format);
    true
}

fn execute_toggle_mark(state: &mut EditorState, mark: Mark) -> bool {
    let Some(sel) = state.clamped_selection() else {
        return false;
    };
    let flag = mark.flag();
    if sel.is_collapsed() {
        return update_pending_format(state, sel.head, |format| format.marks.toggle(flag));
    }

    let formats = selected_formats(&state.document, sel);
    // Mixed state resolves to "applied".
    let all_have = !formats.is_empty() && formats.iter().all(|f| f.marks.contains(flag));
    update_selected_formats(state, sel, |format| format.marks.set(flag, !all_have))
}

fn execute_clear_formatting(state: &mut EditorState) -> bool {
    let Some(sel) = state.clamped_selection() else {
        return false;
    };
    if sel.is_collapsed() {
        return update_pending_format(state, sel.head, |format| format.marks = Default::default());
    }
    update_selected_formats(state, sel, |format| format.marks = Default::default())
}

fn execute_style(state: &mut EditorState, f: impl Fn(&mut TextStyle)) -> bool {
    let Some(sel) = state.clamped_selection() else {
        return false;
    };
    if sel.is_collapsed() {
        return false;
    }
    update_selected_formats(state, sel, |format| f(&mut format.style))
}

fn execute_insert_link(state: &mut EditorState, url: &str) -> bool {
    let url = url.trim();
    if url.is_empty() {
        return false;
    }
    let Some(sel) = state.clamped_selection() else {
        return false;
    };
    if sel.is_collapsed() {
        return false;
    }
    update_selected_formats(state, sel, |format| format.link = Some(url.to_string()))
}

fn execute_remove_link(state: &mut EditorState) -> bool {
    let Some(sel) = state.clamped_selection() else {
        return false;
    };
    let sel = if sel.is_collapsed() {
        let Some((_, _, children)) = state.document.leaf(sel.head.block) else {
            return false;
        };
        let Some(extent) = inline::link_extent(children, sel.head.offset) else {
            return false;
        };
        Selection::in_block(sel.head.block, extent.start, extent.end)
    } else {
        sel
    };
    update_selected_formats(state, sel, |format| format.link = None)
}

/// Apply `f` to every leaf touched by the selection.
fn update_selected_leaves(state: &mut EditorState, f: impl Fn(&mut [Leaf], Range<usize>)) -> bool {
    let Some(sel) = state.clamped_selection() else {
        return false;
    };
    let mut leaves = state.document.leaves();
    f(&mut leaves, sel.start().block..sel.end().block + 1);
    state.document = Document::from_leaves(leaves);
    true
}

fn execute_set_block_type(state: &mut EditorState, kind: BlockKind) -> bool {
    update_selected_leaves(state, |leaves, range| {
        for leaf in &mut leaves[range] {
            leaf.kind = kind.into();
        }
    })
}

fn execute_set_alignment(state: &mut EditorState, align: Alignment) -> bool {
    update_selected_leaves(state, |leaves, range| {
        for leaf in &mut leaves[range] {
            leaf.align = align;
        }
    })
}

fn execute_toggle_list(state: &mut EditorState, kind: ListKind) -> bool {
    update_selected_leaves(state, |leaves, range| {
        let target = LeafKind::ListItem(kind);
        let selected = &leaves[range.clone()];
        if selected.iter().all(|leaf| leaf.kind == target) {
            // Same ordering again: unwrap to the kind each item had before.
            for leaf in &mut leaves[range] {
                leaf.kind = leaf
                    .restore
                    .take()
                    .map(LeafKind::from)
                    .unwrap_or(LeafKind::Paragraph);
            }
        } else if selected.iter().all(|leaf| leaf.kind.list_kind().is_some()) {
            // Already in lists: switch each touched list in place.
            for index in range {
                let current = leaves[index].kind;
                if current == target {
                    continue;
                }
                let mut first = index;
                while first > 0 && leaves[first - 1].kind == current {
                    first -= 1;
                }
                let mut last = index;
                while last + 1 < leaves.len() && leaves[last + 1].kind == current {
                    last += 1;
                }
                for leaf in &mut leaves[first..=last] {
                    leaf.kind = target;
                }
            }
        } else {
            for leaf in &mut leaves[range] {
                if let Some(previous) = leaf.kind.block_kind() {
                    leaf.restore = Some(previous);
                }
                leaf.kind = target;
            }
        }
    })
}

fn execute_insert_image(state: &mut EditorState, image: ImageEmbed) -> bool {
    let Some(sel) = state.clamped_selection() else {
        return false;
    };
    let Some(image) = image.sanitized() else {
        tracing::debug!(target: "cms_editor::execute", "ignoring image without a source");
        return false;
    };
    let mut leaves = state.document.leaves();
    let caret = delete_selection(&mut leaves, sel);
    inline::insert_image(&mut leaves[caret.block].children, caret.offset, image);
    commit(state, leaves, Position::new(caret.block, caret.offset + 1));
    true
}

fn execute_select_all(state: &mut EditorState) -> bool {
    let end = state.end_position();
    state.set_selection(Some(Selection::new(Position::default(), end)));
    true
}

fn execute_move_cursor(state: &mut EditorState, to: Position) -> bool {
    let to = clamp_position(&state.document, to);
    state.set_selection(Some(Selection::collapsed(to)));
    true
}

fn execute_extend_selection(state: &mut EditorState, to: Position) -> bool {
    let head = clamp_position(&state.document, to);
    let anchor = state.clamped_selection().map(|sel| sel.anchor).unwrap_or(head);
    state.set_selection(Some(Selection::new(anchor, head)));
    true
}
