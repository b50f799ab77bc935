//! Line-indexed text storage.
//!
//! A [`LineStore`] is an ordered sequence of [`Line`]s. Each line owns its raw
//! text (never containing `\r` or `\n`) together with its per-line overlay
//! state, so splicing lines moves markers, highlights and colors with the
//! text they annotate.
//!
//! Both structural operations ([`LineStore::insert_lines`] and
//! [`LineStore::delete_range`]) are O(affected lines).

use crate::location::{Location, LocationRange};
use crate::overlays::{Color, ColorSpan, MarkerTypeId, WaveSpan};

/// A single document line and its overlay state.
#[derive(Debug, Clone, Default)]
pub struct Line {
    text: String,
    char_len: usize,
    /// Whether the line is hidden by a collapsed folding region.
    pub hidden: bool,
    /// Whether the line carries a whole-line highlight.
    pub highlighted: bool,
    /// Custom foreground color override, if any.
    pub custom_fore: Option<Color>,
    /// Custom background color override, if any.
    pub custom_back: Option<Color>,
    /// Sorted list of marker-type ids present on this line.
    markers: Vec<MarkerTypeId>,
    /// Tokenizer-produced color spans (consumed read-only by rendering).
    pub color_spans: Vec<ColorSpan>,
    /// Diagnostic wave-line spans.
    pub wave_spans: Vec<WaveSpan>,
}

impl Line {
    /// Create a line from raw text. The text must not contain line terminators.
    pub fn new(text: &str) -> Self {
        debug_assert!(
            !text.contains('\n') && !text.contains('\r'),
            "line text must not contain line terminators"
        );
        Self {
            char_len: text.chars().count(),
            text: text.to_string(),
            ..Self::default()
        }
    }

    /// The line's raw text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Length of the line in characters.
    pub fn char_len(&self) -> usize {
        self.char_len
    }

    fn set_text(&mut self, text: String) {
        debug_assert!(!text.contains('\n') && !text.contains('\r'));
        self.char_len = text.chars().count();
        self.text = text;
    }

    /// Set or clear a marker on this line. Idempotent.
    pub fn set_marker(&mut self, id: MarkerTypeId, present: bool) {
        match self.markers.binary_search(&id) {
            Ok(pos) => {
                if !present {
                    self.markers.remove(pos);
                }
            }
            Err(pos) => {
                if present {
                    self.markers.insert(pos, id);
                }
            }
        }
    }

    /// Returns `true` if the marker is present on this line.
    pub fn has_marker(&self, id: MarkerTypeId) -> bool {
        self.markers.binary_search(&id).is_ok()
    }

    /// The sorted marker-type ids present on this line.
    pub fn markers(&self) -> &[MarkerTypeId] {
        &self.markers
    }

    /// Drop derived span tables (tokenizer colors, wave lines). Called when
    /// the line's text changes; producers re-derive them.
    fn clear_spans(&mut self) {
        self.color_spans.clear();
        self.wave_spans.clear();
    }

    /// Merge overlay state from another line fragment into this one.
    fn absorb_overlays(&mut self, other: &Line) {
        for id in &other.markers {
            self.set_marker(*id, true);
        }
        self.highlighted |= other.highlighted;
        if self.custom_fore.is_none() {
            self.custom_fore = other.custom_fore;
        }
        if self.custom_back.is_none() {
            self.custom_back = other.custom_back;
        }
    }
}

/// Byte offset of the 0-based `char_idx` within `text`.
fn byte_at_char(text: &str, char_idx: usize) -> usize {
    text.char_indices()
        .nth(char_idx)
        .map(|(b, _)| b)
        .unwrap_or(text.len())
}

/// Ordered sequence of lines with O(affected lines) editing.
#[derive(Debug, Default)]
pub struct LineStore {
    lines: Vec<Line>,
}

impl LineStore {
    /// Create an empty (zero-line) store.
    ///
    /// A zero-line store cannot be edited; seed it with
    /// [`insert_empty_first_line`](Self::insert_empty_first_line) or load text
    /// with [`replace_all`](Self::replace_all) first.
    pub fn new() -> Self {
        Self { lines: Vec::new() }
    }

    /// Build a store from whole text. Empty text yields a single empty line.
    /// CRLF terminators are normalized to LF before splitting.
    pub fn from_text(text: &str) -> Self {
        let mut store = Self::new();
        store.replace_all(text);
        store
    }

    /// Replace the entire content with `text` (whole-buffer load).
    pub fn replace_all(&mut self, text: &str) {
        let normalized = text.replace("\r\n", "\n").replace('\r', "\n");
        self.lines = normalized.split('\n').map(Line::new).collect();
        if self.lines.is_empty() {
            self.lines.push(Line::new(""));
        }
    }

    /// Seed a zero-line store with exactly one empty line.
    ///
    /// No-op when the store already has lines.
    pub fn insert_empty_first_line(&mut self) {
        if self.lines.is_empty() {
            self.lines.push(Line::new(""));
        }
    }

    /// Number of lines.
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Returns `true` if the store has no lines at all (never seeded).
    pub fn is_unseeded(&self) -> bool {
        self.lines.is_empty()
    }

    /// Get the 1-based `line`, if valid.
    pub fn line(&self, line: usize) -> Option<&Line> {
        if line == 0 {
            return None;
        }
        self.lines.get(line - 1)
    }

    /// Get the 1-based `line` mutably, if valid.
    pub fn line_mut(&mut self, line: usize) -> Option<&mut Line> {
        if line == 0 {
            return None;
        }
        self.lines.get_mut(line - 1)
    }

    /// Text of the 1-based `line`, if valid.
    pub fn line_text(&self, line: usize) -> Option<&str> {
        self.line(line).map(|l| l.text())
    }

    /// Character length of the 1-based `line`, if valid.
    pub fn line_len(&self, line: usize) -> Option<usize> {
        self.line(line).map(|l| l.char_len())
    }

    /// Returns `true` if `loc` addresses an existing line and a char offset
    /// within `1..=length + 1` on that line.
    pub fn is_valid_location(&self, loc: Location) -> bool {
        match self.line(loc.line) {
            Some(line) => loc.ch >= 1 && loc.ch <= line.char_len() + 1,
            None => false,
        }
    }

    /// Clamp a location to the nearest valid one.
    pub fn clamp_location(&self, loc: Location) -> Location {
        if self.lines.is_empty() {
            return Location::START;
        }
        let line = loc.line.clamp(1, self.lines.len());
        let max_ch = self.lines[line - 1].char_len() + 1;
        Location::new(line, loc.ch.clamp(1, max_ch))
    }

    /// The location just past the last character of the document.
    pub fn end_location(&self) -> Location {
        match self.lines.last() {
            Some(last) => Location::new(self.lines.len(), last.char_len() + 1),
            None => Location::START,
        }
    }

    /// Reassemble the whole document text with LF terminators.
    pub fn full_text(&self) -> String {
        let mut out = String::new();
        for (idx, line) in self.lines.iter().enumerate() {
            if idx > 0 {
                out.push('\n');
            }
            out.push_str(line.text());
        }
        out
    }

    /// Text covered by `[start, end)` with LF terminators, after clamping.
    pub fn text_of_range(&self, range: LocationRange) -> String {
        let range = range.normalized();
        let start = self.clamp_location(range.start);
        let end = self.clamp_location(range.end);
        if start >= end {
            return String::new();
        }

        if start.line == end.line {
            let text = self.lines[start.line - 1].text();
            let b0 = byte_at_char(text, start.ch - 1);
            let b1 = byte_at_char(text, end.ch - 1);
            return text[b0..b1].to_string();
        }

        let mut out = String::new();
        let first = self.lines[start.line - 1].text();
        out.push_str(&first[byte_at_char(first, start.ch - 1)..]);
        for line in &self.lines[start.line..end.line - 1] {
            out.push('\n');
            out.push_str(line.text());
        }
        out.push('\n');
        let last = self.lines[end.line - 1].text();
        out.push_str(&last[..byte_at_char(last, end.ch - 1)]);
        out
    }

    /// Splice line segments into the document at `at`.
    ///
    /// `segments` is the inserted text already split on line terminators; a
    /// single segment inserts within the line, multiple segments split the
    /// line at `at` and splice new lines in between. Returns the range
    /// spanning the inserted text (`end` is the location immediately after
    /// the last inserted character).
    pub fn insert_lines(&mut self, at: Location, segments: &[&str]) -> LocationRange {
        assert!(
            !self.lines.is_empty(),
            "cannot insert into a zero-line store; seed it first"
        );
        if segments.is_empty() {
            return LocationRange::empty_at(self.clamp_location(at));
        }

        let at = self.clamp_location(at);
        let idx = at.line - 1;

        let split_byte = byte_at_char(self.lines[idx].text(), at.ch - 1);
        let tail = self.lines[idx].text()[split_byte..].to_string();
        let head = &self.lines[idx].text()[..split_byte];

        if segments.len() == 1 {
            let mut text = String::with_capacity(head.len() + segments[0].len() + tail.len());
            text.push_str(head);
            text.push_str(segments[0]);
            text.push_str(&tail);
            let inserted_chars = segments[0].chars().count();
            let new_text_line = text;
            let line = &mut self.lines[idx];
            line.set_text(new_text_line);
            line.clear_spans();
            let end = Location::new(at.line, at.ch + inserted_chars);
            return LocationRange::new(at, end);
        }

        let first_text = format!("{}{}", head, segments[0]);
        let last_seg = segments[segments.len() - 1];
        let last_seg_chars = last_seg.chars().count();
        let last_text = format!("{}{}", last_seg, tail);

        {
            let line = &mut self.lines[idx];
            line.set_text(first_text);
            line.clear_spans();
        }

        let mut new_lines: Vec<Line> = Vec::with_capacity(segments.len() - 1);
        for seg in &segments[1..segments.len() - 1] {
            new_lines.push(Line::new(seg));
        }
        new_lines.push(Line::new(&last_text));

        self.lines.splice(idx + 1..idx + 1, new_lines);

        let end = Location::new(at.line + segments.len() - 1, last_seg_chars + 1);
        LocationRange::new(at, end)
    }

    /// Remove the text in `[start, end)`, merging the surviving fragments
    /// into one line. Returns the removed text, or `None` when the range is
    /// empty (a no-op, not an error).
    pub fn delete_range(&mut self, range: LocationRange) -> Option<String> {
        let range = range.normalized();
        let start = self.clamp_location(range.start);
        let end = self.clamp_location(range.end);
        if start >= end {
            return None;
        }

        if start.line == end.line {
            let line = &mut self.lines[start.line - 1];
            let b0 = byte_at_char(line.text(), start.ch - 1);
            let b1 = byte_at_char(line.text(), end.ch - 1);
            let removed = line.text()[b0..b1].to_string();
            let mut text = line.text().to_string();
            text.replace_range(b0..b1, "");
            line.set_text(text);
            line.clear_spans();
            return Some(removed);
        }

        let removed = self.text_of_range(LocationRange::new(start, end));

        let last_idx = end.line - 1;
        let tail = {
            let last = self.lines[last_idx].text();
            last[byte_at_char(last, end.ch - 1)..].to_string()
        };
        let last_overlays = self.lines[last_idx].clone();

        let first_idx = start.line - 1;
        {
            let first = &mut self.lines[first_idx];
            let b0 = byte_at_char(first.text(), start.ch - 1);
            let mut text = first.text()[..b0].to_string();
            text.push_str(&tail);
            first.set_text(text);
            first.clear_spans();
            first.absorb_overlays(&last_overlays);
        }

        self.lines.drain(first_idx + 1..=last_idx);
        Some(removed)
    }
}

/// Split insertion text into line segments, normalizing CRLF/CR to LF.
pub fn split_segments(text: &str) -> Vec<String> {
    let normalized = text.replace("\r\n", "\n").replace('\r', "\n");
    normalized.split('\n').map(|s| s.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(lines: &[&str]) -> LineStore {
        LineStore::from_text(&lines.join("\n"))
    }

    #[test]
    fn test_from_text_empty() {
        let store = LineStore::from_text("");
        assert_eq!(store.line_count(), 1);
        assert_eq!(store.line_text(1), Some(""));
    }

    #[test]
    fn test_new_is_unseeded() {
        let mut store = LineStore::new();
        assert!(store.is_unseeded());
        assert_eq!(store.line_count(), 0);

        store.insert_empty_first_line();
        assert_eq!(store.line_count(), 1);

        // Seeding again is a no-op.
        store.insert_empty_first_line();
        assert_eq!(store.line_count(), 1);
    }

    #[test]
    fn test_crlf_normalized_on_load() {
        let store = LineStore::from_text("a\r\nb\rc");
        assert_eq!(store.line_count(), 3);
        assert_eq!(store.full_text(), "a\nb\nc");
    }

    #[test]
    fn test_insert_within_line() {
        let mut s = store(&["hello world"]);
        let range = s.insert_lines(Location::new(1, 7), &["brave "]);
        assert_eq!(s.line_text(1), Some("hello brave world"));
        assert_eq!(range.start, Location::new(1, 7));
        assert_eq!(range.end, Location::new(1, 13));
    }

    #[test]
    fn test_insert_splits_line() {
        let mut s = store(&["headtail"]);
        let range = s.insert_lines(Location::new(1, 5), &["AA", "BB", "CC"]);
        assert_eq!(s.line_count(), 3);
        assert_eq!(s.line_text(1), Some("headAA"));
        assert_eq!(s.line_text(2), Some("BB"));
        assert_eq!(s.line_text(3), Some("CCtail"));
        assert_eq!(range.end, Location::new(3, 3));
    }

    #[test]
    fn test_insert_at_end_of_line() {
        let mut s = store(&["ab"]);
        let range = s.insert_lines(Location::new(1, 3), &["", ""]);
        assert_eq!(s.line_count(), 2);
        assert_eq!(s.line_text(1), Some("ab"));
        assert_eq!(s.line_text(2), Some(""));
        assert_eq!(range.end, Location::new(2, 1));
    }

    #[test]
    fn test_delete_within_line() {
        let mut s = store(&["hello brave world"]);
        let removed = s.delete_range(LocationRange::new(
            Location::new(1, 7),
            Location::new(1, 13),
        ));
        assert_eq!(removed.as_deref(), Some("brave "));
        assert_eq!(s.line_text(1), Some("hello world"));
    }

    #[test]
    fn test_delete_across_lines_merges() {
        let mut s = store(&["one", "two", "three"]);
        let removed = s.delete_range(LocationRange::new(
            Location::new(1, 3),
            Location::new(3, 4),
        ));
        assert_eq!(removed.as_deref(), Some("e\ntwo\nthr"));
        assert_eq!(s.line_count(), 1);
        assert_eq!(s.line_text(1), Some("onee"));
    }

    #[test]
    fn test_delete_empty_range_is_noop() {
        let mut s = store(&["abc"]);
        let loc = Location::new(1, 2);
        assert!(s.delete_range(LocationRange::new(loc, loc)).is_none());
        assert_eq!(s.line_text(1), Some("abc"));
    }

    #[test]
    fn test_insert_then_delete_round_trip() {
        let mut s = store(&["alpha", "beta"]);
        let before = s.full_text();
        let range = s.insert_lines(Location::new(1, 3), &["X", "YY", "Z"]);
        let removed = s.delete_range(range).unwrap();
        assert_eq!(removed, "X\nYY\nZ");
        assert_eq!(s.full_text(), before);
        assert_eq!(s.line_count(), 2);
    }

    #[test]
    fn test_merge_unions_markers() {
        let mut s = store(&["one", "two"]);
        let a = MarkerTypeId::new(0);
        let b = MarkerTypeId::new(1);
        s.line_mut(1).unwrap().set_marker(a, true);
        s.line_mut(2).unwrap().set_marker(b, true);
        s.line_mut(2).unwrap().highlighted = true;

        s.delete_range(LocationRange::new(Location::new(1, 4), Location::new(2, 1)));
        assert_eq!(s.line_count(), 1);
        let line = s.line(1).unwrap();
        assert!(line.has_marker(a));
        assert!(line.has_marker(b));
        assert!(line.highlighted);
    }

    #[test]
    fn test_spans_cleared_on_edit() {
        let mut s = store(&["text"]);
        s.line_mut(1).unwrap().color_spans.push(ColorSpan {
            start_ch: 1,
            end_ch: 3,
            style_id: 7,
        });
        s.insert_lines(Location::new(1, 1), &["x"]);
        assert!(s.line(1).unwrap().color_spans.is_empty());
    }

    #[test]
    fn test_text_of_range_multiline() {
        let s = store(&["abc", "def", "ghi"]);
        let text = s.text_of_range(LocationRange::new(
            Location::new(1, 2),
            Location::new(3, 2),
        ));
        assert_eq!(text, "bc\ndef\ng");
    }

    #[test]
    fn test_clamp_location() {
        let s = store(&["abc", "defgh"]);
        assert_eq!(s.clamp_location(Location::new(0, 0)), Location::new(1, 1));
        assert_eq!(s.clamp_location(Location::new(9, 9)), Location::new(2, 6));
        assert_eq!(s.clamp_location(Location::new(1, 99)), Location::new(1, 4));
    }

    #[test]
    fn test_is_valid_location() {
        let s = store(&["abc"]);
        assert!(s.is_valid_location(Location::new(1, 1)));
        assert!(s.is_valid_location(Location::new(1, 4))); // end-of-line
        assert!(!s.is_valid_location(Location::new(1, 5)));
        assert!(!s.is_valid_location(Location::new(2, 1)));
        assert!(!s.is_valid_location(Location::new(1, 0)));
    }

    #[test]
    fn test_unicode_offsets() {
        let mut s = store(&["日本語"]);
        let range = s.insert_lines(Location::new(1, 2), &["x"]);
        assert_eq!(s.line_text(1), Some("日x本語"));
        assert_eq!(range.end, Location::new(1, 3));

        let removed = s.delete_range(range);
        assert_eq!(removed.as_deref(), Some("x"));
        assert_eq!(s.line_text(1), Some("日本語"));
    }
}
