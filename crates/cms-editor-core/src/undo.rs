//! Undo/redo management for editor operations.
//!
//! Provides:
//! - `UndoManager` trait for abstracting undo implementations
//! - `UndoableState<T>` - wraps editor state and keeps whole-state snapshots

/// Trait for managing undo/redo operations.
///
/// Implementations must actually perform the undo/redo, not just track state.
pub trait UndoManager {
    /// Check if undo is available.
    fn can_undo(&self) -> bool;

    /// Check if redo is available.
    fn can_redo(&self) -> bool;

    /// Perform undo. Returns true if successful.
    fn undo(&mut self) -> bool;

    /// Perform redo. Returns true if successful.
    fn redo(&mut self) -> bool;

    /// Clear all undo/redo history.
    fn clear_history(&mut self);
}

/// A state wrapper with bounded snapshot history.
///
/// Callers take a snapshot of the state before a mutation and hand it to
/// [`record`](Self::record) once the mutation is known to have changed
/// something. Undo swaps the current state with the newest snapshot.
#[derive(Debug, Clone)]
pub struct UndoableState<T> {
    current: T,
    undo_stack: Vec<T>,
    redo_stack: Vec<T>,
    max_steps: usize,
}

impl<T: Default> Default for UndoableState<T> {
    fn default() -> Self {
        Self::new(T::default(), 100)
    }
}

impl<T> UndoableState<T> {
    /// Create a new undoable state with an empty history.
    pub fn new(current: T, max_steps: usize) -> Self {
        Self {
            current,
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            max_steps,
        }
    }

    /// Get a reference to the current state.
    pub fn inner(&self) -> &T {
        &self.current
    }

    /// Get a mutable reference to the current state.
    /// WARNING: Edits made directly are only undoable if followed by `record`!
    pub fn inner_mut(&mut self) -> &mut T {
        &mut self.current
    }

    /// Record `previous` as the state before the latest edit.
    pub fn record(&mut self, previous: T) {
        // Clear redo stack on new edit
        self.redo_stack.clear();
        self.undo_stack.push(previous);

        // Trim if over max
        while self.undo_stack.len() > self.max_steps {
            self.undo_stack.remove(0);
        }
    }
}

impl<T> UndoManager for UndoableState<T> {
    fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    fn undo(&mut self) -> bool {
        let Some(previous) = self.undo_stack.pop() else {
            return false;
        };
        let undone = std::mem::replace(&mut self.current, previous);
        self.redo_stack.push(undone);
        true
    }

    fn redo(&mut self) -> bool {
        let Some(next) = self.redo_stack.pop() else {
            return false;
        };
        let replaced = std::mem::replace(&mut self.current, next);
        self.undo_stack.push(replaced);
        true
    }

    fn clear_history(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }
}
