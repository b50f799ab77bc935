//! Document locations and location ranges.
//!
//! A [`Location`] is a 1-based `(line, ch)` pair where `ch` is a raw character
//! offset into the line's text, exclusive of line terminators. `ch == length + 1`
//! denotes end-of-line. Locations are totally ordered lexicographically.

use std::cmp::Ordering;
use std::fmt;

/// A 1-based position in a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Location {
    /// 1-based line number.
    pub line: usize,
    /// 1-based character offset within the line (`length + 1` = end-of-line).
    pub ch: usize,
}

impl Location {
    /// The start of a document.
    pub const START: Location = Location { line: 1, ch: 1 };

    /// Create a new location.
    pub fn new(line: usize, ch: usize) -> Self {
        Self { line, ch }
    }

    /// Returns the smaller of two locations.
    pub fn min(self, other: Self) -> Self {
        if self <= other { self } else { other }
    }

    /// Returns the larger of two locations.
    pub fn max(self, other: Self) -> Self {
        if self >= other { self } else { other }
    }
}

impl Ord for Location {
    fn cmp(&self, other: &Self) -> Ordering {
        self.line
            .cmp(&other.line)
            .then_with(|| self.ch.cmp(&other.ch))
    }
}

impl PartialOrd for Location {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.line, self.ch)
    }
}

/// An ordered pair of locations describing a text range `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocationRange {
    /// Range start (inclusive).
    pub start: Location,
    /// Range end (exclusive).
    pub end: Location,
}

impl LocationRange {
    /// Create a new range from two locations, preserving their order.
    pub fn new(start: Location, end: Location) -> Self {
        Self { start, end }
    }

    /// An empty range collapsed onto a single location.
    pub fn empty_at(loc: Location) -> Self {
        Self {
            start: loc,
            end: loc,
        }
    }

    /// Returns the range with `start <= end`.
    pub fn normalized(self) -> Self {
        if self.start <= self.end {
            self
        } else {
            Self {
                start: self.end,
                end: self.start,
            }
        }
    }

    /// Returns `true` if the range covers no text.
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Returns `true` if `loc` falls inside `[start, end)` of the normalized range.
    pub fn contains(&self, loc: Location) -> bool {
        let n = self.normalized();
        n.start <= loc && loc < n.end
    }
}

impl fmt::Display for LocationRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}
