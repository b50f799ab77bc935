//! Selection state: a normalized anchor/active location pair.
//!
//! A selection is either a character range or a linewise range. Linewise
//! selections are semantically bound to whole lines: normalization snaps the
//! start to column 1 and, when the end sits past column 1, advances it to the
//! start of the following line. An end exactly at column 1 already excludes
//! its line, so it is left alone.

use crate::location::{Location, LocationRange};

/// Anchor/active selection pair with linewise semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionModel {
    /// The fixed end of the selection.
    pub anchor: Location,
    /// The moving end of the selection (the caret).
    pub active: Location,
    /// Whether an interactive extension gesture is in progress.
    pub is_selecting: bool,
    /// Whether the selection covers whole lines.
    pub linewise: bool,
}

impl SelectionModel {
    /// A collapsed caret at the start of the document.
    pub fn new() -> Self {
        Self::caret_at(Location::START)
    }

    /// A collapsed caret at `loc`.
    pub fn caret_at(loc: Location) -> Self {
        Self {
            anchor: loc,
            active: loc,
            is_selecting: false,
            linewise: false,
        }
    }

    /// Returns `true` if the selection covers any text.
    pub fn has_selection(&self) -> bool {
        self.anchor != self.active
    }

    /// The caret location (the active end).
    pub fn caret(&self) -> Location {
        self.active
    }

    /// Begin an interactive selection at `at`.
    pub fn start_selecting(&mut self, at: Location, linewise: bool) {
        self.anchor = at;
        self.active = at;
        self.is_selecting = true;
        self.linewise = linewise;
    }

    /// Move the active end to `loc`, extending the selection.
    pub fn extend_to(&mut self, loc: Location) {
        self.active = loc;
    }

    /// Finish an interactive extension gesture, keeping the selection.
    pub fn stop_selecting(&mut self) {
        self.is_selecting = false;
    }

    /// Collapse the selection onto `loc`.
    pub fn collapse_to(&mut self, loc: Location) {
        self.anchor = loc;
        self.active = loc;
        self.is_selecting = false;
        self.linewise = false;
    }

    /// Set the selection explicitly.
    pub fn select(&mut self, anchor: Location, active: Location, linewise: bool) {
        self.anchor = anchor;
        self.active = active;
        self.is_selecting = false;
        self.linewise = linewise;
    }

    /// The ordered selection range, with linewise snapping applied.
    ///
    /// For linewise selections the start snaps to column 1 and an end past
    /// column 1 advances to the start of the following line, so the range
    /// always covers whole lines.
    pub fn normalized(&self) -> LocationRange {
        let mut start = self.anchor.min(self.active);
        let mut end = self.anchor.max(self.active);

        if self.linewise {
            start.ch = 1;
            if end.ch > 1 {
                end = Location::new(end.line + 1, 1);
            }
        }

        LocationRange::new(start, end)
    }
}

impl Default for SelectionModel {
    fn default() -> Self {
        Self::new()
    }
}
