//! The document engine facade.
//!
//! [`Document`] aggregates all underlying components, including:
//!
//! - **LineStore**: line-indexed text storage with per-line overlay state
//! - **FoldingTree**: hierarchical folding regions with hide/show state
//! - **ColumnModel**: tab-aware and folding-aware column arithmetic
//! - **EditHistory**: mergeable undo/redo with composite grouping
//! - **Searcher**: location-aware find with wildcard/regex patterns
//! - **EventSink**: change notifications with version tracking
//!
//! Every mutation goes through two private splice primitives that keep the
//! store, the folding tree, the hidden-line flags and the selection
//! consistent, bump the document version and notify subscribers. Public edit
//! operations additionally record their inverse into the history; undo and
//! redo replay recorded actions with recording suppressed.

use unicode_segmentation::UnicodeSegmentation;

use crate::columns::ColumnModel;
use crate::folding::{FoldingError, FoldingTree, NodeId, ROOT};
use crate::history::{ActionType, Composite, EditHistory, HistoryStateError, UndoAction};
use crate::line_store::{split_segments, Line, LineStore};
use crate::location::{Location, LocationRange};
use crate::notify::{DocumentEvent, EventSink, InvalidationScope};
use crate::overlays::{Color, ColorSpan, MarkerRegistry, MarkerTypeId, WaveSpan};
use crate::search::{PatternError, SearchOptions, Searcher};
use crate::selection::SelectionModel;
use crate::tabs::{self, IndentStyle};

/// Document behavior configuration.
#[derive(Debug, Clone)]
pub struct DocumentConfig {
    /// Tab stop width in display columns.
    pub tab_size: usize,
    /// Indent unit width in display columns.
    pub indent_size: usize,
    /// How synthesized indentation is materialized.
    pub indent_style: IndentStyle,
    /// Placeholder text shown in place of a collapsed folding region.
    pub fold_placeholder: String,
    /// Line comment token used by comment/uncomment operations.
    pub line_comment: String,
    /// Whether [`DocumentEvent::ContentChanged`] events are emitted.
    pub content_change_events: bool,
    /// Maximum number of top-level undo entries kept.
    pub max_undo: usize,
}

impl Default for DocumentConfig {
    fn default() -> Self {
        Self {
            tab_size: 4,
            indent_size: 4,
            indent_style: IndentStyle::Spaces,
            fold_placeholder: "...".to_string(),
            line_comment: "//".to_string(),
            content_change_events: false,
            max_undo: 1000,
        }
    }
}

/// A text document with folding, overlays, selection, search and undo.
///
/// All locations taken by the public API are clamped to valid positions, so
/// out-of-range input degrades to the nearest edge instead of panicking.
pub struct Document {
    config: DocumentConfig,
    store: LineStore,
    folding: FoldingTree,
    markers: MarkerRegistry,
    selection: SelectionModel,
    history: EditHistory,
    events: EventSink,
    version: u64,
}

impl Document {
    /// An empty document (one empty line).
    pub fn new() -> Self {
        Self::from_text("")
    }

    /// A document loaded from `text` with the default configuration.
    pub fn from_text(text: &str) -> Self {
        Self::with_config(text, DocumentConfig::default())
    }

    /// A document loaded from `text` with an explicit configuration.
    pub fn with_config(text: &str, config: DocumentConfig) -> Self {
        let store = LineStore::from_text(text);
        let folding = FoldingTree::new(store.line_count());
        let history = EditHistory::new(config.max_undo);
        Self {
            config,
            store,
            folding,
            markers: MarkerRegistry::new(),
            selection: SelectionModel::new(),
            history,
            events: EventSink::new(),
            version: 0,
        }
    }

    // ---- queries ----

    /// The current configuration.
    pub fn config(&self) -> &DocumentConfig {
        &self.config
    }

    /// Replace the configuration. Derived state (columns, indent synthesis)
    /// picks the new values up immediately.
    pub fn set_config(&mut self, config: DocumentConfig) {
        self.history.set_max_undo(config.max_undo);
        self.config = config;
        self.bump_version();
        self.emit(DocumentEvent::Invalidated {
            scope: InvalidationScope::Whole,
            version: self.version,
        });
    }

    /// Monotonic document version, incremented on every state change.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Number of lines. Always at least 1.
    pub fn line_count(&self) -> usize {
        self.store.line_count()
    }

    /// The line at 1-based `line`, if valid.
    pub fn line(&self, line: usize) -> Option<&Line> {
        self.store.line(line)
    }

    /// The raw text of `line`, if valid.
    pub fn line_text(&self, line: usize) -> Option<&str> {
        self.store.line_text(line)
    }

    /// Length of `line` in characters, if valid.
    pub fn line_length(&self, line: usize) -> Option<usize> {
        self.store.line_len(line)
    }

    /// The whole document joined with `\n`.
    pub fn text(&self) -> String {
        self.store.full_text()
    }

    /// The text covered by `range`.
    pub fn text_of_range(&self, range: LocationRange) -> String {
        self.store.text_of_range(range)
    }

    /// Returns `true` if `loc` addresses an existing position.
    pub fn is_valid_location(&self, loc: Location) -> bool {
        self.store.is_valid_location(loc)
    }

    /// The nearest valid position to `loc`.
    pub fn clamp_location(&self, loc: Location) -> Location {
        self.store.clamp_location(loc)
    }

    /// The position just past the last character of the document.
    pub fn end_location(&self) -> Location {
        self.store.end_location()
    }

    /// Subscribe to change notifications.
    pub fn subscribe<F>(&mut self, callback: F)
    where
        F: FnMut(&DocumentEvent) + Send + 'static,
    {
        self.events.subscribe(callback);
    }

    // ---- loading ----

    /// Replace the whole document with `text`.
    ///
    /// Folding regions, overlays, history and the selection are reset; this
    /// is a load, not an edit.
    pub fn load(&mut self, text: &str) {
        self.store.replace_all(text);
        self.folding.clear(self.store.line_count());
        self.history.clear();
        self.selection = SelectionModel::new();
        self.bump_version();
        self.emit(DocumentEvent::Invalidated {
            scope: InvalidationScope::Whole,
            version: self.version,
        });
    }

    // ---- columns ----

    /// The 1-based display column of `loc` (tab- and folding-aware).
    pub fn column_of(&self, loc: Location) -> usize {
        self.column_model().column_of(loc)
    }

    /// The location covering display `column` on the row of `line`.
    pub fn char_of(&self, line: usize, column: usize) -> Location {
        self.column_model().char_of(line, column)
    }

    fn column_model(&self) -> ColumnModel<'_> {
        ColumnModel::new(
            &self.store,
            &self.folding,
            self.config.tab_size,
            &self.config.fold_placeholder,
        )
    }

    // ---- editing ----

    /// Insert `text` at `at`, recording the edit for undo. Returns the range
    /// the inserted text occupies.
    pub fn insert(&mut self, at: Location, text: &str) -> LocationRange {
        let at = self.store.clamp_location(at);
        let range = self.splice_insert(at, text);
        if !range.is_empty() {
            self.history.record(UndoAction::Insert {
                range,
                text: text.to_string(),
            });
        }
        range
    }

    /// Delete the text in `range`, recording the edit for undo. Returns
    /// `false` when the range was empty.
    pub fn delete(&mut self, range: LocationRange) -> bool {
        let range = self.clamp_range(range);
        let Some(text) = self.splice_delete(range) else {
            return false;
        };
        self.history.record(UndoAction::Delete {
            start: range.start,
            text,
        });
        true
    }

    fn clamp_range(&self, range: LocationRange) -> LocationRange {
        let range = range.normalized();
        LocationRange::new(
            self.store.clamp_location(range.start),
            self.store.clamp_location(range.end),
        )
    }

    /// Splice `text` in without touching the history.
    fn splice_insert(&mut self, at: Location, text: &str) -> LocationRange {
        if text.is_empty() {
            return LocationRange::empty_at(at);
        }

        let segments = split_segments(text);
        let refs: Vec<&str> = segments.iter().map(|s| s.as_str()).collect();
        let range = self.store.insert_lines(at, &refs);

        let added = segments.len() - 1;
        if added > 0 {
            let first_moved = if at.ch == 1 { at.line } else { at.line + 1 };
            self.folding
                .apply_insert(first_moved, added, self.store.line_count());
            self.refresh_hidden();
        }

        let end = range.end;
        self.selection.anchor = shift_after_insert(self.selection.anchor, at, end, added);
        self.selection.active = shift_after_insert(self.selection.active, at, end, added);

        self.bump_version();
        self.emit_edited(at.line, added > 0);
        if self.config.content_change_events {
            let event = DocumentEvent::ContentChanged {
                text: text.to_string(),
                range,
                is_insertion: true,
                version: self.version,
            };
            self.emit(event);
        }
        range
    }

    /// Splice the text in `range` out without touching the history.
    fn splice_delete(&mut self, range: LocationRange) -> Option<String> {
        let range = self.clamp_range(range);
        let text = self.store.delete_range(range)?;

        let removed_lines = range.end.line - range.start.line;
        if removed_lines > 0 {
            self.folding.apply_delete(
                range.start.line + 1,
                range.end.line,
                self.store.line_count(),
            );
            self.refresh_hidden();
        }

        self.selection.anchor = shift_after_delete(self.selection.anchor, range);
        self.selection.active = shift_after_delete(self.selection.active, range);

        self.bump_version();
        self.emit_edited(range.start.line, removed_lines > 0);
        if self.config.content_change_events {
            let event = DocumentEvent::ContentChanged {
                text: text.clone(),
                range,
                is_insertion: false,
                version: self.version,
            };
            self.emit(event);
        }
        Some(text)
    }

    fn emit_edited(&mut self, first_line: usize, structure_changed: bool) {
        let scope = if structure_changed {
            InvalidationScope::Lines {
                start: first_line,
                end: self.store.line_count(),
            }
        } else {
            InvalidationScope::Lines {
                start: first_line,
                end: first_line,
            }
        };
        let version = self.version;
        self.emit(DocumentEvent::Invalidated { scope, version });
    }

    fn emit(&mut self, event: DocumentEvent) {
        self.events.emit(&event);
    }

    fn bump_version(&mut self) {
        self.version += 1;
    }

    /// Recompute per-line hidden flags from the folding tree.
    fn refresh_hidden(&mut self) {
        for line in 1..=self.store.line_count() {
            if let Some(l) = self.store.line_mut(line) {
                l.hidden = false;
            }
        }
        for (start, end) in self.folding.hidden_spans() {
            for line in start..=end {
                if let Some(l) = self.store.line_mut(line) {
                    l.hidden = true;
                }
            }
        }
    }

    // ---- folding ----

    /// Create a user folding region covering lines `start_line..=end_line`.
    pub fn create_region(
        &mut self,
        start_line: usize,
        end_line: usize,
    ) -> Result<NodeId, FoldingError> {
        let id = self.folding.create_region(start_line, end_line)?;
        self.folding_changed();
        Ok(id)
    }

    /// Create a derived (automatically produced) folding region.
    pub fn create_derived_region(
        &mut self,
        start_line: usize,
        end_line: usize,
    ) -> Result<NodeId, FoldingError> {
        let id = self.folding.create_derived_region(start_line, end_line)?;
        self.folding_changed();
        Ok(id)
    }

    /// Remove the region exactly covering `start_line..=end_line`.
    pub fn remove_region(&mut self, start_line: usize, end_line: usize) -> bool {
        let Some(id) = self.folding.region_with_range(start_line, end_line) else {
            return false;
        };
        let removed = self.folding.remove_region(id);
        if removed {
            self.folding_changed();
        }
        removed
    }

    /// Collapse or expand the region exactly covering `start_line..=end_line`.
    /// Returns `false` when no such region exists or the state did not change.
    pub fn set_folding(&mut self, start_line: usize, end_line: usize, collapsed: bool) -> bool {
        let Some(id) = self.folding.region_with_range(start_line, end_line) else {
            return false;
        };
        let changed = if collapsed {
            self.folding.collapse(id)
        } else {
            self.folding.expand(id)
        };
        if changed {
            self.folding_changed();
        }
        changed
    }

    /// Collapse every region.
    pub fn collapse_all(&mut self) {
        self.folding.collapse_all();
        self.folding_changed();
    }

    /// Expand every region.
    pub fn expand_all(&mut self) {
        self.folding.expand_all();
        self.folding_changed();
    }

    /// Remove every derived region, keeping user regions.
    pub fn clear_derived_regions(&mut self) {
        self.folding.clear_derived();
        self.folding_changed();
    }

    /// The innermost region containing `line`, as `(start_line, end_line)`.
    pub fn leaf_region_containing(&self, line: usize) -> Option<(usize, usize)> {
        let id = self.folding.leaf_region_containing(line);
        if id == ROOT {
            return None;
        }
        self.folding
            .node(id)
            .map(|n| (n.start_line(), n.end_line()))
    }

    /// All folding regions as `(start_line, end_line, collapsed, derived)`.
    pub fn regions(&self) -> Vec<(usize, usize, bool, bool)> {
        let mut out: Vec<_> = self
            .folding
            .region_ids()
            .filter_map(|id| self.folding.node(id))
            .map(|n| (n.start_line(), n.end_line(), n.collapsed(), n.is_derived()))
            .collect();
        out.sort_unstable();
        out
    }

    /// Returns `true` if `line` is hidden by a collapsed region.
    pub fn is_line_hidden(&self, line: usize) -> bool {
        self.folding.is_line_hidden(line)
    }

    /// Number of lines not hidden by collapsed regions.
    pub fn visible_line_count(&self) -> usize {
        (1..=self.store.line_count())
            .filter(|&l| !self.folding.is_line_hidden(l))
            .count()
    }

    /// The nearest visible line after `line`, if any.
    pub fn next_visible_line(&self, line: usize) -> Option<usize> {
        (line + 1..=self.store.line_count()).find(|&l| !self.folding.is_line_hidden(l))
    }

    /// The nearest visible line before `line`, if any.
    pub fn previous_visible_line(&self, line: usize) -> Option<usize> {
        (1..line).rev().find(|&l| !self.folding.is_line_hidden(l))
    }

    fn folding_changed(&mut self) {
        self.refresh_hidden();
        self.bump_version();
        let version = self.version;
        self.emit(DocumentEvent::FoldingChanged { version });
    }

    // ---- overlays ----

    /// Register a marker type by name, returning its interned id.
    pub fn register_marker(&mut self, name: &str) -> MarkerTypeId {
        self.markers.register(name)
    }

    /// Look up a previously registered marker type.
    pub fn marker_id(&self, name: &str) -> Option<MarkerTypeId> {
        self.markers.lookup(name)
    }

    /// Set or clear a marker on `line`. Returns `false` for an invalid line.
    pub fn set_marker(&mut self, line: usize, id: MarkerTypeId, present: bool) -> bool {
        let Some(l) = self.store.line_mut(line) else {
            return false;
        };
        l.set_marker(id, present);
        self.overlay_changed(line);
        true
    }

    /// Returns `true` if the marker is present on `line`.
    pub fn has_marker(&self, line: usize, id: MarkerTypeId) -> bool {
        self.store.line(line).is_some_and(|l| l.has_marker(id))
    }

    /// The nearest line after `from_line` carrying the marker. Does not wrap.
    pub fn next_line_with_marker(&self, from_line: usize, id: MarkerTypeId) -> Option<usize> {
        (from_line + 1..=self.store.line_count())
            .find(|&l| self.store.line(l).is_some_and(|line| line.has_marker(id)))
    }

    /// The nearest line before `from_line` carrying the marker. Does not wrap.
    pub fn previous_line_with_marker(&self, from_line: usize, id: MarkerTypeId) -> Option<usize> {
        (1..from_line)
            .rev()
            .find(|&l| self.store.line(l).is_some_and(|line| line.has_marker(id)))
    }

    /// Set or clear the whole-line highlight on `line`.
    pub fn set_highlight(&mut self, line: usize, highlighted: bool) -> bool {
        let Some(l) = self.store.line_mut(line) else {
            return false;
        };
        l.highlighted = highlighted;
        self.overlay_changed(line);
        true
    }

    /// Override or clear the foreground color of `line`.
    pub fn set_custom_fore(&mut self, line: usize, color: Option<Color>) -> bool {
        let Some(l) = self.store.line_mut(line) else {
            return false;
        };
        l.custom_fore = color;
        self.overlay_changed(line);
        true
    }

    /// Override or clear the background color of `line`.
    pub fn set_custom_back(&mut self, line: usize, color: Option<Color>) -> bool {
        let Some(l) = self.store.line_mut(line) else {
            return false;
        };
        l.custom_back = color;
        self.overlay_changed(line);
        true
    }

    /// Set or clear the whole-line highlight on an inclusive line range.
    ///
    /// Lines are clamped to the document; one invalidation covers the span.
    pub fn set_highlight_lines(&mut self, start_line: usize, end_line: usize, highlighted: bool) {
        let (start, end) = self.clamp_line_span(start_line, end_line);
        for line in start..=end {
            if let Some(l) = self.store.line_mut(line) {
                l.highlighted = highlighted;
            }
        }
        self.overlays_changed(start, end);
    }

    /// Override or clear the foreground color of an inclusive line range.
    pub fn set_custom_fore_lines(
        &mut self,
        start_line: usize,
        end_line: usize,
        color: Option<Color>,
    ) {
        let (start, end) = self.clamp_line_span(start_line, end_line);
        for line in start..=end {
            if let Some(l) = self.store.line_mut(line) {
                l.custom_fore = color;
            }
        }
        self.overlays_changed(start, end);
    }

    /// Override or clear the background color of an inclusive line range.
    pub fn set_custom_back_lines(
        &mut self,
        start_line: usize,
        end_line: usize,
        color: Option<Color>,
    ) {
        let (start, end) = self.clamp_line_span(start_line, end_line);
        for line in start..=end {
            if let Some(l) = self.store.line_mut(line) {
                l.custom_back = color;
            }
        }
        self.overlays_changed(start, end);
    }

    /// Replace the tokenizer color spans of `line`.
    pub fn set_color_spans(&mut self, line: usize, spans: Vec<ColorSpan>) -> bool {
        let Some(l) = self.store.line_mut(line) else {
            return false;
        };
        l.color_spans = spans;
        self.overlay_changed(line);
        true
    }

    /// Replace the diagnostic wave spans of `line`.
    pub fn set_wave_spans(&mut self, line: usize, spans: Vec<WaveSpan>) -> bool {
        let Some(l) = self.store.line_mut(line) else {
            return false;
        };
        l.wave_spans = spans;
        self.overlay_changed(line);
        true
    }

    fn overlay_changed(&mut self, line: usize) {
        self.overlays_changed(line, line);
    }

    fn overlays_changed(&mut self, start: usize, end: usize) {
        self.bump_version();
        let version = self.version;
        self.emit(DocumentEvent::Invalidated {
            scope: InvalidationScope::Lines { start, end },
            version,
        });
    }

    // ---- selection ----

    /// The current selection state.
    pub fn selection(&self) -> &SelectionModel {
        &self.selection
    }

    /// The caret location.
    pub fn caret(&self) -> Location {
        self.selection.caret()
    }

    /// Set the selection explicitly. Locations are clamped.
    pub fn select(&mut self, anchor: Location, active: Location, linewise: bool) {
        let anchor = self.store.clamp_location(anchor);
        let active = self.store.clamp_location(active);
        self.selection.select(anchor, active, linewise);
    }

    /// Begin an interactive selection gesture at `at`.
    pub fn start_selecting(&mut self, at: Location, linewise: bool) {
        let at = self.store.clamp_location(at);
        self.selection.start_selecting(at, linewise);
    }

    /// Extend the active selection end to `loc`.
    pub fn extend_selection(&mut self, loc: Location) {
        let loc = self.store.clamp_location(loc);
        self.selection.extend_to(loc);
    }

    /// Finish the interactive selection gesture.
    pub fn stop_selecting(&mut self) {
        self.selection.stop_selecting();
    }

    /// Collapse the selection onto `loc`.
    pub fn collapse_selection_to(&mut self, loc: Location) {
        let loc = self.store.clamp_location(loc);
        self.selection.collapse_to(loc);
    }

    /// The selected text, or `None` when the selection is empty.
    pub fn selected_text(&self) -> Option<String> {
        if !self.selection.has_selection() {
            return None;
        }
        Some(self.store.text_of_range(self.selection.normalized()))
    }

    /// Delete the selected text as one undoable unit. Returns `false` when
    /// nothing was selected.
    pub fn delete_selection(&mut self) -> bool {
        if !self.selection.has_selection() {
            return false;
        }
        let range = self.clamp_range(self.selection.normalized());
        self.history.begin_composite(ActionType::Delete);
        let deleted = self.delete(range);
        self.end_composite_checked();
        if deleted {
            self.selection.collapse_to(range.start);
        }
        deleted
    }

    // ---- history ----

    /// Open a composite undo group tagged with `tag`.
    pub fn begin_composite(&mut self, tag: ActionType) {
        self.history.begin_composite(tag);
    }

    /// Close the innermost composite undo group.
    pub fn end_composite(&mut self) -> Result<(), HistoryStateError> {
        self.history.end_composite()
    }

    /// Returns `true` if there is anything to undo.
    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    /// Returns `true` if there is anything to redo.
    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Drop all undo entries.
    pub fn clear_undo(&mut self) {
        self.history.clear_undo();
    }

    /// Drop all redo entries.
    pub fn clear_redo(&mut self) {
        self.history.clear_redo();
    }

    /// Undo the most recent entry. Returns `false` when there is none.
    pub fn undo(&mut self) -> bool {
        let Some(action) = self.history.pop_undo() else {
            return false;
        };
        self.history.suppress();
        self.apply_inverse(&action);
        self.history.resume();
        self.history.push_redo(action);
        true
    }

    /// Redo the most recently undone entry. Returns `false` when there is
    /// none.
    pub fn redo(&mut self) -> bool {
        let Some(action) = self.history.pop_redo() else {
            return false;
        };
        self.history.suppress();
        self.apply_forward(&action);
        self.history.resume();
        self.history.push_undo(action);
        true
    }

    fn apply_inverse(&mut self, action: &UndoAction) {
        match action {
            UndoAction::Insert { range, .. } => {
                self.splice_delete(*range);
                self.selection.collapse_to(range.start);
            }
            UndoAction::Delete { start, text } => {
                let range = self.splice_insert(*start, text);
                self.selection.collapse_to(range.end);
            }
            UndoAction::CaretMove { from, .. } => {
                self.selection.collapse_to(*from);
            }
            UndoAction::Composite(Composite { children, .. }) => {
                for child in children.iter().rev() {
                    self.apply_inverse(child);
                }
            }
        }
    }

    fn apply_forward(&mut self, action: &UndoAction) {
        match action {
            UndoAction::Insert { range, text } => {
                let inserted = self.splice_insert(range.start, text);
                self.selection.collapse_to(inserted.end);
            }
            UndoAction::Delete { start, text } => {
                let range = range_of_text_at(*start, text);
                self.splice_delete(range);
                self.selection.collapse_to(*start);
            }
            UndoAction::CaretMove { to, .. } => {
                self.selection.collapse_to(*to);
            }
            UndoAction::Composite(Composite { children, .. }) => {
                for child in children {
                    self.apply_forward(child);
                }
            }
        }
    }

    /// Close a composite this module opened itself. The pair is balanced by
    /// construction.
    fn end_composite_checked(&mut self) {
        self.history.end_composite().expect("composite opened above");
    }

    // ---- search and replace ----

    /// Find the nearest occurrence of `query` from `from`.
    pub fn find(
        &self,
        query: &str,
        options: SearchOptions,
        from: Location,
    ) -> Result<Option<LocationRange>, PatternError> {
        Searcher::new(&self.store, &self.folding).find(query, options, from)
    }

    /// All occurrences of `query` in document order.
    pub fn find_all(
        &self,
        query: &str,
        options: SearchOptions,
    ) -> Result<Vec<LocationRange>, PatternError> {
        Searcher::new(&self.store, &self.folding).find_all(query, options)
    }

    /// Replace the nearest occurrence of `query` from `from` with
    /// `replacement` as one undoable unit. Returns the range of the
    /// replacement text, or `None` when there was no match.
    pub fn replace_next(
        &mut self,
        query: &str,
        replacement: &str,
        options: SearchOptions,
        from: Location,
    ) -> Result<Option<LocationRange>, PatternError> {
        let Some(found) = self.find(query, options, from)? else {
            return Ok(None);
        };
        self.history.begin_composite(ActionType::Replace);
        self.delete(found);
        let inserted = self.insert(found.start, replacement);
        self.end_composite_checked();
        self.selection.collapse_to(inserted.end);
        Ok(Some(inserted))
    }

    /// Replace every occurrence of `query` with `replacement` as one
    /// undoable unit. Returns the number of replacements.
    pub fn replace_all(
        &mut self,
        query: &str,
        replacement: &str,
        options: SearchOptions,
    ) -> Result<usize, PatternError> {
        let matches = self.find_all(query, options)?;
        if matches.is_empty() {
            return Ok(0);
        }

        self.history.begin_composite(ActionType::ReplaceAll);
        // Back to front keeps the remaining match locations valid.
        for m in matches.iter().rev() {
            self.delete(*m);
            self.insert(m.start, replacement);
        }
        self.end_composite_checked();

        let caret = self.store.clamp_location(self.selection.caret());
        self.selection.collapse_to(caret);
        Ok(matches.len())
    }

    /// Set `marker` on every line containing a match of `query`. Returns the
    /// number of matches.
    pub fn mark_all(
        &mut self,
        query: &str,
        options: SearchOptions,
        marker: MarkerTypeId,
    ) -> Result<usize, PatternError> {
        let matches = self.find_all(query, options)?;
        let mut lines: Vec<usize> = matches.iter().map(|m| m.start.line).collect();
        lines.dedup();
        for &line in &lines {
            if let Some(l) = self.store.line_mut(line) {
                l.set_marker(marker, true);
            }
        }
        if let (Some(&first), Some(&last)) = (lines.first(), lines.last()) {
            self.bump_version();
            let version = self.version;
            self.emit(DocumentEvent::Invalidated {
                scope: InvalidationScope::Lines {
                    start: first,
                    end: last,
                },
                version,
            });
        }
        Ok(matches.len())
    }

    // ---- edit operations ----

    /// Type `text` at the caret, replacing the selection if one exists.
    ///
    /// Consecutive single-character typings at adjacent positions coalesce
    /// into one undo entry.
    pub fn type_text(&mut self, text: &str) {
        self.history.begin_composite(ActionType::Type);
        if self.selection.has_selection() {
            let range = self.clamp_range(self.selection.normalized());
            self.delete(range);
            self.selection.collapse_to(range.start);
        }
        let caret = self.store.clamp_location(self.selection.caret());
        let range = self.insert(caret, text);
        self.end_composite_checked();
        self.selection.collapse_to(range.end);
    }

    /// Insert a line break at the caret, replacing the selection if one
    /// exists.
    pub fn insert_newline(&mut self) {
        self.history.begin_composite(ActionType::Enter);
        if self.selection.has_selection() {
            let range = self.clamp_range(self.selection.normalized());
            self.delete(range);
            self.selection.collapse_to(range.start);
        }
        let caret = self.store.clamp_location(self.selection.caret());
        let range = self.insert(caret, "\n");
        self.end_composite_checked();
        self.selection.collapse_to(range.end);
    }

    /// Handle the Tab key: indent the selected lines when the selection
    /// spans more than one line, otherwise advance the caret to the next tab
    /// stop.
    pub fn insert_tab(&mut self) {
        let sel = self.selection.normalized();
        if self.selection.has_selection() && sel.start.line != sel.end.line {
            let last = if sel.end.ch == 1 {
                sel.end.line - 1
            } else {
                sel.end.line
            };
            self.indent_lines(sel.start.line, last);
            return;
        }

        self.history.begin_composite(ActionType::Tab);
        if self.selection.has_selection() {
            let range = self.clamp_range(sel);
            self.delete(range);
            self.selection.collapse_to(range.start);
        }
        let caret = self.store.clamp_location(self.selection.caret());
        let text = match self.config.indent_style {
            IndentStyle::Tabs => "\t".to_string(),
            IndentStyle::Spaces => {
                let tab_size = self.config.tab_size.max(1);
                let column = self.column_of(caret);
                let gap = tab_size - (column - 1) % tab_size;
                " ".repeat(gap)
            }
        };
        let range = self.insert(caret, &text);
        self.end_composite_checked();
        self.selection.collapse_to(range.end);
    }

    /// Delete backward: the selection if one exists, otherwise the grapheme
    /// cluster before the caret (joining with the previous line at column 1).
    pub fn backspace(&mut self) -> bool {
        if self.selection.has_selection() {
            let range = self.clamp_range(self.selection.normalized());
            self.history.begin_composite(ActionType::Backspace);
            let deleted = self.delete(range);
            self.end_composite_checked();
            if deleted {
                self.selection.collapse_to(range.start);
            }
            return deleted;
        }

        let caret = self.store.clamp_location(self.selection.caret());
        let start = if caret.ch > 1 {
            let text = self.store.line_text(caret.line).unwrap_or("");
            let prefix = prefix_by_chars(text, caret.ch - 1);
            let cluster_chars = prefix
                .graphemes(true)
                .next_back()
                .map(|g| g.chars().count())
                .unwrap_or(1);
            Location::new(caret.line, caret.ch - cluster_chars)
        } else if caret.line > 1 {
            let prev_len = self.store.line_len(caret.line - 1).unwrap_or(0);
            Location::new(caret.line - 1, prev_len + 1)
        } else {
            return false;
        };

        self.history.begin_composite(ActionType::Backspace);
        let deleted = self.delete(LocationRange::new(start, caret));
        self.end_composite_checked();
        if deleted {
            self.selection.collapse_to(start);
        }
        deleted
    }

    /// Delete forward: the selection if one exists, otherwise the grapheme
    /// cluster after the caret (joining with the next line at end of line).
    pub fn delete_forward(&mut self) -> bool {
        if self.selection.has_selection() {
            let range = self.clamp_range(self.selection.normalized());
            self.history.begin_composite(ActionType::Delete);
            let deleted = self.delete(range);
            self.end_composite_checked();
            if deleted {
                self.selection.collapse_to(range.start);
            }
            return deleted;
        }

        let caret = self.store.clamp_location(self.selection.caret());
        let line_len = self.store.line_len(caret.line).unwrap_or(0);
        let end = if caret.ch <= line_len {
            let text = self.store.line_text(caret.line).unwrap_or("");
            let rest = suffix_by_chars(text, caret.ch - 1);
            let cluster_chars = rest
                .graphemes(true)
                .next()
                .map(|g| g.chars().count())
                .unwrap_or(1);
            Location::new(caret.line, caret.ch + cluster_chars)
        } else if caret.line < self.store.line_count() {
            Location::new(caret.line + 1, 1)
        } else {
            return false;
        };

        self.history.begin_composite(ActionType::Delete);
        let deleted = self.delete(LocationRange::new(caret, end));
        self.end_composite_checked();
        if deleted {
            self.selection.collapse_to(caret);
        }
        deleted
    }

    /// Shift lines `start_line..=end_line` one indent unit right.
    pub fn indent_lines(&mut self, start_line: usize, end_line: usize) {
        let (start_line, end_line) = self.clamp_line_span(start_line, end_line);
        self.history.begin_composite(ActionType::Indent);
        for line in start_line..=end_line {
            if self.store.line_len(line).unwrap_or(0) == 0 {
                continue;
            }
            let unit = tabs::indent_string(
                self.config.indent_style,
                self.config.indent_size,
                self.config.tab_size,
                0,
            );
            self.insert(Location::new(line, 1), &unit);
        }
        self.end_composite_checked();
    }

    /// Shift lines `start_line..=end_line` one indent unit left.
    pub fn unindent_lines(&mut self, start_line: usize, end_line: usize) {
        let (start_line, end_line) = self.clamp_line_span(start_line, end_line);
        self.history.begin_composite(ActionType::Unindent);
        for line in start_line..=end_line {
            let text = self.store.line_text(line).unwrap_or("").to_string();
            let (_, cut) =
                tabs::strip_one_indent(&text, self.config.indent_size, self.config.tab_size);
            if cut > 0 {
                self.delete(LocationRange::new(
                    Location::new(line, 1),
                    Location::new(line, cut + 1),
                ));
            }
        }
        self.end_composite_checked();
    }

    /// Prefix lines `start_line..=end_line` with the line comment token.
    pub fn comment_lines(&mut self, start_line: usize, end_line: usize) {
        let (start_line, end_line) = self.clamp_line_span(start_line, end_line);
        let token = self.config.line_comment.clone();
        self.history.begin_composite(ActionType::CommentLines);
        for line in start_line..=end_line {
            self.insert(Location::new(line, 1), &token);
        }
        self.end_composite_checked();
    }

    /// Strip the line comment token from lines `start_line..=end_line`.
    /// Lines not starting with the token (after leading whitespace) are left
    /// alone.
    pub fn uncomment_lines(&mut self, start_line: usize, end_line: usize) {
        let (start_line, end_line) = self.clamp_line_span(start_line, end_line);
        let token = self.config.line_comment.clone();
        let token_chars = token.chars().count();
        self.history.begin_composite(ActionType::UncommentLines);
        for line in start_line..=end_line {
            let text = self.store.line_text(line).unwrap_or("");
            let leading = text.chars().take_while(|c| *c == ' ' || *c == '\t').count();
            let rest: String = text.chars().skip(leading).collect();
            if rest.starts_with(&token) {
                self.delete(LocationRange::new(
                    Location::new(line, leading + 1),
                    Location::new(line, leading + token_chars + 1),
                ));
            }
        }
        self.end_composite_checked();
    }

    /// Expand every tab in the document to spaces.
    pub fn convert_tabs_to_spaces(&mut self) {
        let tab_size = self.config.tab_size;
        self.convert_lines(|text| tabs::tabs_to_spaces(text, tab_size));
    }

    /// Convert stop-aligned space runs in the document to tabs.
    pub fn convert_spaces_to_tabs(&mut self) {
        let tab_size = self.config.tab_size;
        self.convert_lines(|text| tabs::spaces_to_tabs(text, tab_size));
    }

    fn convert_lines<F>(&mut self, convert: F)
    where
        F: Fn(&str) -> String,
    {
        self.history.begin_composite(ActionType::ConvertTabsSpaces);
        for line in 1..=self.store.line_count() {
            let text = self.store.line_text(line).unwrap_or("").to_string();
            let converted = convert(&text);
            if converted == text {
                continue;
            }
            let len = text.chars().count();
            self.delete(LocationRange::new(
                Location::new(line, 1),
                Location::new(line, len + 1),
            ));
            self.insert(Location::new(line, 1), &converted);
        }
        self.end_composite_checked();
    }

    /// Convert the text in `range` (or the selection when `range` is `None`)
    /// to upper or lower case as one undoable unit.
    pub fn change_case(&mut self, range: Option<LocationRange>, upper: bool) -> bool {
        let range = match range {
            Some(r) => self.clamp_range(r),
            None => {
                if !self.selection.has_selection() {
                    return false;
                }
                self.clamp_range(self.selection.normalized())
            }
        };
        if range.is_empty() {
            return false;
        }

        let text = self.store.text_of_range(range);
        let converted = if upper {
            text.to_uppercase()
        } else {
            text.to_lowercase()
        };
        if converted == text {
            return false;
        }

        self.history.begin_composite(ActionType::ChangeCase);
        self.delete(range);
        let inserted = self.insert(range.start, &converted);
        self.end_composite_checked();
        self.selection.select(inserted.start, inserted.end, false);
        true
    }

    /// Delete the run of spaces and tabs around the caret on its line.
    pub fn delete_horizontal_whitespace(&mut self) -> bool {
        let caret = self.store.clamp_location(self.selection.caret());
        let text = self.store.line_text(caret.line).unwrap_or("");
        let chars: Vec<char> = text.chars().collect();

        let mut start_ch = caret.ch;
        while start_ch > 1 && matches!(chars.get(start_ch - 2), Some(' ' | '\t')) {
            start_ch -= 1;
        }
        let mut end_ch = caret.ch;
        while matches!(chars.get(end_ch - 1), Some(' ' | '\t')) {
            end_ch += 1;
        }
        if start_ch == end_ch {
            return false;
        }

        self.history
            .begin_composite(ActionType::DeleteHorizontalWhiteSpace);
        let deleted = self.delete(LocationRange::new(
            Location::new(caret.line, start_ch),
            Location::new(caret.line, end_ch),
        ));
        self.end_composite_checked();
        if deleted {
            self.selection.collapse_to(Location::new(caret.line, start_ch));
        }
        deleted
    }

    /// Remove and return the selected text as one undoable unit.
    pub fn cut(&mut self) -> Option<String> {
        let text = self.selected_text()?;
        let range = self.clamp_range(self.selection.normalized());
        self.history.begin_composite(ActionType::Cut);
        self.delete(range);
        self.end_composite_checked();
        self.selection.collapse_to(range.start);
        Some(text)
    }

    /// Insert `text` at the caret, replacing the selection if one exists.
    pub fn paste(&mut self, text: &str) {
        self.history.begin_composite(ActionType::Paste);
        if self.selection.has_selection() {
            let range = self.clamp_range(self.selection.normalized());
            self.delete(range);
            self.selection.collapse_to(range.start);
        }
        let caret = self.store.clamp_location(self.selection.caret());
        let range = self.insert(caret, text);
        self.end_composite_checked();
        self.selection.collapse_to(range.end);
    }

    /// Move the text in `from` to `to` as one undoable unit. The caret moves
    /// with the text; undo restores both the text and the original caret.
    pub fn drag_drop(&mut self, from: LocationRange, to: Location) -> bool {
        let from = self.clamp_range(from);
        let to = self.store.clamp_location(to);
        if from.is_empty() || from.contains(to) {
            return false;
        }

        let caret_before = self.selection.caret();
        let text = self.store.text_of_range(from);

        self.history.begin_composite(ActionType::DragDrop);
        // Recorded first so undo restores the original caret last.
        self.history.record(UndoAction::CaretMove {
            from: caret_before,
            to,
        });
        self.delete(from);
        // Deleting shifted the target if it sat past the removed range.
        let to = shift_after_delete(to, from);
        let inserted = self.insert(to, &text);
        self.end_composite_checked();
        self.selection.select(inserted.start, inserted.end, false);
        true
    }

    fn clamp_line_span(&self, start_line: usize, end_line: usize) -> (usize, usize) {
        let count = self.store.line_count();
        let start = start_line.clamp(1, count);
        let end = end_line.clamp(start, count);
        (start, end)
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Document")
            .field("lines", &self.store.line_count())
            .field("version", &self.version)
            .field("regions", &self.folding.region_count())
            .finish()
    }
}

/// Where `loc` ends up after inserting text at `at` ending at `end` and
/// adding `added` lines.
fn shift_after_insert(loc: Location, at: Location, end: Location, added: usize) -> Location {
    if loc < at {
        return loc;
    }
    if loc.line == at.line {
        if added == 0 {
            Location::new(loc.line, loc.ch + (end.ch - at.ch))
        } else {
            Location::new(end.line, end.ch + (loc.ch - at.ch))
        }
    } else {
        Location::new(loc.line + added, loc.ch)
    }
}

/// Where `loc` ends up after deleting `range`. Locations inside the range
/// clamp to its start.
fn shift_after_delete(loc: Location, range: LocationRange) -> Location {
    if loc <= range.start {
        return loc;
    }
    if loc < range.end {
        return range.start;
    }
    if loc.line == range.end.line {
        Location::new(range.start.line, range.start.ch + (loc.ch - range.end.ch))
    } else {
        Location::new(loc.line - (range.end.line - range.start.line), loc.ch)
    }
}

/// The range `text` occupies when inserted at `start`. Mirrors the splice
/// arithmetic of [`LineStore::insert_lines`].
fn range_of_text_at(start: Location, text: &str) -> LocationRange {
    let segments = split_segments(text);
    let added = segments.len() - 1;
    let end = if added == 0 {
        Location::new(start.line, start.ch + segments[0].chars().count())
    } else {
        Location::new(start.line + added, segments[added].chars().count() + 1)
    };
    LocationRange::new(start, end)
}

/// The prefix of `text` covering its first `chars` characters.
fn prefix_by_chars(text: &str, chars: usize) -> &str {
    match text.char_indices().nth(chars) {
        Some((byte, _)) => &text[..byte],
        None => text,
    }
}

/// The suffix of `text` starting at character offset `chars`.
fn suffix_by_chars(text: &str, chars: usize) -> &str {
    match text.char_indices().nth(chars) {
        Some((byte, _)) => &text[byte..],
        None => "",
    }
}
