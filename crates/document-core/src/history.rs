//! Mergeable undo/redo history.
//!
//! Every mutation is recorded as an inverse-applicable [`UndoAction`].
//! Actions can be grouped into tagged composites (nesting allowed) so that a
//! multi-step operation undoes as one unit, and consecutive single-character
//! typing composites merge into one entry so a typed word undoes in one step.

use crate::location::{Location, LocationRange};

/// The user-level operation a history entry belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionType {
    /// Cut the selection to the clipboard.
    Cut,
    /// Paste clipboard content.
    Paste,
    /// Plain character typing. Eligible for coalescing.
    Type,
    /// Tab key insertion.
    Tab,
    /// Line break insertion.
    Enter,
    /// Delete backward from the caret.
    Backspace,
    /// Delete forward from the caret.
    Delete,
    /// Shift lines one indent unit right.
    Indent,
    /// Shift lines one indent unit left.
    Unindent,
    /// Prefix lines with the line comment token.
    CommentLines,
    /// Strip the line comment token from lines.
    UncommentLines,
    /// Move text by drag and drop.
    DragDrop,
    /// Convert between tabs and spaces.
    ConvertTabsSpaces,
    /// Replace one match.
    Replace,
    /// Replace every match in the document.
    ReplaceAll,
    /// Upper/lower case conversion.
    ChangeCase,
    /// Remove runs of spaces and tabs around the caret.
    DeleteHorizontalWhiteSpace,
    /// Anything else.
    Unknown,
}

/// One recorded mutation, stored so it can be applied in reverse.
#[derive(Debug, Clone)]
pub enum UndoAction {
    /// `text` was inserted and now occupies `range`. Undone by deleting the
    /// range.
    Insert {
        /// The range the inserted text occupies.
        range: LocationRange,
        /// The inserted text.
        text: String,
    },
    /// `text` was deleted from `start`. Undone by reinserting it there.
    Delete {
        /// Where the deleted text began.
        start: Location,
        /// The deleted text.
        text: String,
    },
    /// The caret moved. Undone by restoring `from`.
    CaretMove {
        /// Caret location before the move.
        from: Location,
        /// Caret location after the move.
        to: Location,
    },
    /// A tagged group of actions undone as one unit.
    Composite(Composite),
}

/// A tagged group of history actions.
#[derive(Debug, Clone)]
pub struct Composite {
    /// The operation this group belongs to.
    pub tag: ActionType,
    /// Child actions in the order they were performed.
    pub children: Vec<UndoAction>,
}

impl Composite {
    fn new(tag: ActionType) -> Self {
        Self {
            tag,
            children: Vec::new(),
        }
    }
}

/// History bookkeeping errors.
#[derive(Debug, PartialEq, Eq)]
pub enum HistoryStateError {
    /// `end_composite` was called with no composite open.
    NoOpenComposite,
}

impl std::fmt::Display for HistoryStateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoOpenComposite => write!(f, "No composite action is open"),
        }
    }
}

impl std::error::Error for HistoryStateError {}

/// Undo/redo stacks with composite grouping and typing coalescing.
#[derive(Debug)]
pub struct EditHistory {
    undo_stack: Vec<UndoAction>,
    redo_stack: Vec<UndoAction>,
    open: Vec<Composite>,
    suppress_depth: usize,
    max_undo: usize,
}

impl EditHistory {
    /// An empty history keeping at most `max_undo` top-level entries.
    pub fn new(max_undo: usize) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            open: Vec::new(),
            suppress_depth: 0,
            max_undo: max_undo.max(1),
        }
    }

    /// Change the top-level entry cap, dropping the oldest entries if the
    /// stack already exceeds it.
    pub fn set_max_undo(&mut self, max_undo: usize) {
        self.max_undo = max_undo.max(1);
        while self.undo_stack.len() > self.max_undo {
            self.undo_stack.remove(0);
        }
    }

    /// Returns `true` if there is anything to undo.
    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    /// Returns `true` if there is anything to redo.
    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Number of top-level undo entries.
    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }

    /// Number of top-level redo entries.
    pub fn redo_depth(&self) -> usize {
        self.redo_stack.len()
    }

    /// Returns `true` if a composite is currently open.
    pub fn in_composite(&self) -> bool {
        !self.open.is_empty()
    }

    /// Returns `true` while recording is suppressed (during undo/redo replay).
    pub fn is_suppressed(&self) -> bool {
        self.suppress_depth > 0
    }

    /// Stop recording until the matching [`resume`](Self::resume).
    pub fn suppress(&mut self) {
        self.suppress_depth += 1;
    }

    /// Resume recording after [`suppress`](Self::suppress).
    pub fn resume(&mut self) {
        self.suppress_depth = self.suppress_depth.saturating_sub(1);
    }

    /// Open a composite tagged with `tag`. Composites may nest; a nested one
    /// becomes a child of its parent when closed.
    pub fn begin_composite(&mut self, tag: ActionType) {
        if self.is_suppressed() {
            return;
        }
        self.open.push(Composite::new(tag));
    }

    /// Close the innermost open composite.
    ///
    /// An empty composite is discarded. A closed top-level `Type` composite
    /// holding a single insert merges into the previous entry when that entry
    /// is a `Type` composite whose insert ends exactly where the new one
    /// begins.
    pub fn end_composite(&mut self) -> Result<(), HistoryStateError> {
        if self.is_suppressed() {
            return Ok(());
        }
        let composite = self.open.pop().ok_or(HistoryStateError::NoOpenComposite)?;
        if composite.children.is_empty() {
            return Ok(());
        }

        if let Some(outer) = self.open.last_mut() {
            outer.children.push(UndoAction::Composite(composite));
            return Ok(());
        }

        if self.try_merge_typing(&composite) {
            return Ok(());
        }

        self.push_top_level(UndoAction::Composite(composite));
        Ok(())
    }

    /// Record `action`. Inside a composite it joins the innermost group;
    /// otherwise it becomes a top-level entry and clears the redo stack.
    pub fn record(&mut self, action: UndoAction) {
        if self.is_suppressed() {
            return;
        }
        if let Some(inner) = self.open.last_mut() {
            inner.children.push(action);
            return;
        }
        self.push_top_level(action);
    }

    /// Take the most recent undo entry. The caller applies its inverse and
    /// pushes the entry back via [`push_redo`](Self::push_redo).
    pub fn pop_undo(&mut self) -> Option<UndoAction> {
        self.undo_stack.pop()
    }

    /// Take the most recent redo entry.
    pub fn pop_redo(&mut self) -> Option<UndoAction> {
        self.redo_stack.pop()
    }

    /// Move an undone entry onto the redo stack.
    pub fn push_redo(&mut self, action: UndoAction) {
        self.redo_stack.push(action);
    }

    /// Move a redone entry back onto the undo stack without clearing redo.
    pub fn push_undo(&mut self, action: UndoAction) {
        self.undo_stack.push(action);
    }

    /// Drop all undo entries.
    pub fn clear_undo(&mut self) {
        self.undo_stack.clear();
    }

    /// Drop all redo entries.
    pub fn clear_redo(&mut self) {
        self.redo_stack.clear();
    }

    /// Drop everything, including any open composites.
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.open.clear();
    }

    fn push_top_level(&mut self, action: UndoAction) {
        self.redo_stack.clear();
        if self.undo_stack.len() >= self.max_undo {
            self.undo_stack.remove(0);
        }
        self.undo_stack.push(action);
    }

    /// Typing coalescing: a single-insert `Type` composite extends the
    /// previous single-insert `Type` composite when the inserts are adjacent.
    fn try_merge_typing(&mut self, composite: &Composite) -> bool {
        if composite.tag != ActionType::Type || composite.children.len() != 1 {
            return false;
        }
        let UndoAction::Insert { range, text } = &composite.children[0] else {
            return false;
        };

        let Some(UndoAction::Composite(prev)) = self.undo_stack.last_mut() else {
            return false;
        };
        if prev.tag != ActionType::Type || prev.children.len() != 1 {
            return false;
        }
        let UndoAction::Insert {
            range: prev_range,
            text: prev_text,
        } = &mut prev.children[0]
        else {
            return false;
        };
        if prev_range.end != range.start {
            return false;
        }

        prev_range.end = range.end;
        prev_text.push_str(text);
        self.redo_stack.clear();
        true
    }
}
