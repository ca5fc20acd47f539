//! The editor handle embedded by the host page.
//!
//! `Editor` owns the document, its bounded history and the subscribers. All
//! mutations go through [`Editor::dispatch`], which records history, emits the
//! serialized HTML to the change callback and notifies toolbar listeners.

use crate::actions::{EditorAction, KeyCombo, KeybindingConfig, KeydownResult};
use crate::config::EditorConfig;
use crate::document::Document;
use crate::error::CommandError;
use crate::execute::{EditorState, execute_action};
use crate::html::{export_html, import_html};
use crate::render::{ImageLoadState, render_document};
use crate::toolbar::ToolbarState;
use crate::types::Selection;
use crate::undo::{UndoManager, UndoableState};

/// Handle returned by [`Editor::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type ChangeCallback = Box<dyn FnMut(&str)>;
type ToolbarListener = Box<dyn FnMut(&ToolbarState)>;

pub struct Editor {
    pub(crate) state: UndoableState<EditorState>,
    pub(crate) config: EditorConfig,
    keybindings: KeybindingConfig,
    on_change: Option<ChangeCallback>,
    listeners: Vec<(SubscriptionId, ToolbarListener)>,
    next_subscription: u64,
    pub(crate) upload_pending: bool,
}

impl std::fmt::Debug for Editor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Editor")
            .field("state", self.state.inner())
            .field("config", &self.config)
            .field("listeners", &self.listeners.len())
            .field("upload_pending", &self.upload_pending)
            .finish()
    }
}

impl Editor {
    /// Mount an editor.
    ///
    /// `initial_html` is imported once, here. The host's later copies of the
    /// value are never re-read, so the editor cannot fight the user's edits.
    /// Hydration is not an edit: it leaves the history empty and does not
    /// call `on_change`.
    pub fn new(
        config: EditorConfig,
        initial_html: Option<&str>,
        on_change: impl FnMut(&str) + 'static,
    ) -> Self {
        let mut editor = Self::detached(config);
        editor.on_change = Some(Box::new(on_change));
        if let Some(html) = initial_html.filter(|html| !html.trim().is_empty()) {
            let document = import_html(html);
            tracing::debug!(
                target: "cms_editor::editor",
                leaves = document.leaf_count(),
                "hydrated from initial html"
            );
            editor.state.inner_mut().document = document;
        }
        editor
    }

    /// An editor with an empty document and no change callback.
    pub fn detached(config: EditorConfig) -> Self {
        let history_depth = config.history_depth;
        Self {
            state: UndoableState::new(EditorState::default(), history_depth),
            config,
            keybindings: KeybindingConfig::default(),
            on_change: None,
            listeners: Vec::new(),
            next_subscription: 0,
            upload_pending: false,
        }
    }

    pub fn with_keybindings(mut self, keybindings: KeybindingConfig) -> Self {
        self.keybindings = keybindings;
        self
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn document(&self) -> &Document {
        &self.state.inner().document
    }

    pub fn state(&self) -> &EditorState {
        self.state.inner()
    }

    pub fn selection(&self) -> Option<Selection> {
        self.state.inner().clamped_selection()
    }

    /// Serialized HTML of the current document.
    pub fn html(&self) -> String {
        export_html(self.document())
    }

    /// Display markup for the editing surface.
    pub fn render(&self, load_state: &impl ImageLoadState) -> String {
        render_document(self.document(), load_state, self.config.placeholder.as_deref())
    }

    pub fn can_undo(&self) -> bool {
        self.state.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.state.can_redo()
    }

    pub fn is_uploading(&self) -> bool {
        self.upload_pending
    }

    pub fn toolbar_state(&self) -> ToolbarState {
        ToolbarState::compute(
            self.state.inner(),
            self.can_undo(),
            self.can_redo(),
            self.upload_pending,
        )
    }

    /// Register a listener called after every change that can affect the
    /// toolbar: edits, selection moves and upload state.
    pub fn subscribe(&mut self, listener: impl FnMut(&ToolbarState) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(existing, _)| *existing != id);
        self.listeners.len() != before
    }

    /// Move the selection. `None` means the surface lost focus.
    pub fn set_selection(&mut self, selection: Option<Selection>) {
        self.state.inner_mut().set_selection(selection);
        self.notify();
    }

    /// Apply an action. Returns whether it was handled.
    pub fn dispatch(&mut self, action: &EditorAction) -> bool {
        let handled = match action {
            EditorAction::Undo => self.step_history(|state| state.undo()),
            EditorAction::Redo => self.step_history(|state| state.redo()),
            _ => {
                let before = self.state.inner().clone();
                let handled = execute_action(self.state.inner_mut(), action);
                if handled && before.document != self.state.inner().document {
                    self.state.record(before);
                    self.emit_change();
                }
                handled
            }
        };
        if handled {
            self.notify();
        } else {
            tracing::trace!(target: "cms_editor::editor", ?action, "action not handled");
        }
        handled
    }

    /// Resolve a toolbar command by name and dispatch it.
    pub fn dispatch_named(&mut self, name: &str, payload: Option<&str>) -> Result<bool, CommandError> {
        let action = EditorAction::from_name(name, payload)?;
        Ok(self.dispatch(&action))
    }

    /// Route a keydown through the keybindings.
    pub fn handle_keydown(&mut self, combo: &KeyCombo) -> KeydownResult {
        if let Some(action) = self.keybindings.lookup(combo) {
            self.dispatch(&action);
            return KeydownResult::Handled;
        }
        if combo.key.is_navigation() || combo.key.is_modifier() {
            return KeydownResult::PassThrough;
        }
        KeydownResult::NotHandled
    }

    fn step_history(&mut self, step: fn(&mut UndoableState<EditorState>) -> bool) -> bool {
        if !step(&mut self.state) {
            return false;
        }
        self.state.inner_mut().pending_format = None;
        self.emit_change();
        true
    }

    fn emit_change(&mut self) {
        let html = self.html();
        tracing::trace!(target: "cms_editor::editor", len = html.len(), "content changed");
        if let Some(on_change) = self.on_change.as_mut() {
            on_change(&html);
        }
    }

    pub(crate) fn notify(&mut self) {
        if self.listeners.is_empty() {
            return;
        }
        let toolbar = self.toolbar_state();
        for (_, listener) in &mut self.listeners {
            listener(&toolbar);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::actions::Key;
    use crate::types::{Mark, Position};

    fn recording_editor(initial: Option<&str>) -> (Editor, Rc<RefCell<Vec<String>>>) {
        let changes = Rc::new(RefCell::new(Vec::new()));
        let sink = changes.clone();
        let editor = Editor::new(EditorConfig::default(), initial, move |html| {
            sink.borrow_mut().push(html.to_string())
        });
        (editor, changes)
    }

    #[test]
    fn test_hydration_is_one_shot_and_silent() {
        let (editor, changes) = recording_editor(Some("<p>Hello</p>"));
        assert_eq!(editor.html(), "<p>Hello</p>");
        assert!(changes.borrow().is_empty());
        assert!(!editor.can_undo());
    }

    #[test]
    fn test_blank_initial_value_gives_empty_document() {
        let (editor, _) = recording_editor(Some("   "));
        assert!(editor.document().is_empty());
    }

    #[test]
    fn test_edits_emit_html() {
        let (mut editor, changes) = recording_editor(Some("<p>Hi</p>"));
        editor.set_selection(Some(Selection::collapsed(Position::new(0, 2))));
        assert!(editor.dispatch(&EditorAction::InsertText { text: "!".into() }));
        assert_eq!(changes.borrow().as_slice(), ["<p>Hi!</p>"]);

        // Selection-only actions do not emit.
        editor.dispatch(&EditorAction::SelectAll);
        assert_eq!(changes.borrow().len(), 1);
    }

    #[test]
    fn test_undo_redo_restore_document() {
        let (mut editor, changes) = recording_editor(Some("<p>Hi</p>"));
        editor.set_selection(Some(Selection::in_block(0, 0, 2)));
        editor.dispatch(&EditorAction::ToggleMark(Mark::Bold));
        assert_eq!(editor.html(), "<p><strong>Hi</strong></p>");

        assert!(editor.dispatch(&EditorAction::Undo));
        assert_eq!(editor.html(), "<p>Hi</p>");
        assert!(editor.can_redo());

        assert!(editor.dispatch(&EditorAction::Redo));
        assert_eq!(editor.html(), "<p><strong>Hi</strong></p>");
        assert_eq!(changes.borrow().len(), 3);

        assert!(!editor.dispatch(&EditorAction::Redo));
    }

    #[test]
    fn test_history_is_bounded() {
        let config = EditorConfig {
            history_depth: 2,
            ..EditorConfig::default()
        };
        let mut editor = Editor::new(config, None, |_| {});
        editor.set_selection(Some(Selection::collapsed(Position::default())));
        for text in ["a", "b", "c"] {
            editor.dispatch(&EditorAction::InsertText { text: text.into() });
        }
        assert!(editor.dispatch(&EditorAction::Undo));
        assert!(editor.dispatch(&EditorAction::Undo));
        assert!(!editor.dispatch(&EditorAction::Undo));
        assert_eq!(editor.document().plain_text(), "a");
    }

    #[test]
    fn test_subscribers_see_toolbar_state() {
        let (mut editor, _) = recording_editor(Some("<p><strong>bold</strong> plain</p>"));
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        let id = editor.subscribe(move |toolbar| sink.borrow_mut().push(toolbar.is_active(Mark::Bold)));

        editor.set_selection(Some(Selection::in_block(0, 0, 4)));
        editor.set_selection(Some(Selection::in_block(0, 5, 10)));
        assert_eq!(seen.borrow().as_slice(), [true, false]);

        assert!(editor.unsubscribe(id));
        editor.set_selection(None);
        assert_eq!(seen.borrow().len(), 2);
    }

    #[test]
    fn test_named_commands() {
        let (mut editor, _) = recording_editor(Some("<p>Title</p>"));
        editor.set_selection(Some(Selection::collapsed(Position::new(0, 0))));
        assert_eq!(editor.dispatch_named("h2", None), Ok(true));
        assert_eq!(editor.html(), "<h2>Title</h2>");
        assert!(matches!(
            editor.dispatch_named("explode", None),
            Err(CommandError::Unknown(_))
        ));
    }

    #[test]
    fn test_keydown_routing() {
        let (mut editor, _) = recording_editor(Some("<p>ab</p>"));
        editor.set_selection(Some(Selection::in_block(0, 0, 2)));

        let bold = KeyCombo::primary(Key::character("b"), false);
        assert_eq!(editor.handle_keydown(&bold), KeydownResult::Handled);
        assert_eq!(editor.html(), "<p><strong>ab</strong></p>");

        assert_eq!(
            editor.handle_keydown(&KeyCombo::new(Key::ArrowLeft)),
            KeydownResult::PassThrough
        );
        assert_eq!(
            editor.handle_keydown(&KeyCombo::new(Key::character("x"))),
            KeydownResult::NotHandled
        );
    }
}
