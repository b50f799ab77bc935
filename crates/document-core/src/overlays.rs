//! Overlay metadata types and the marker-type registry.
//!
//! Overlays are per-line annotations that do not change the document text:
//! named markers (bookmarks, breakpoints, ...), line highlights, custom line
//! colors, tokenizer-produced color spans, and diagnostic wave-line spans.
//!
//! Marker types are open-ended: the presentation layer registers each type by
//! name once and receives an interned small-integer id. Per-line marker state
//! is stored as a compact sorted id list on the line itself (see
//! [`crate::line_store::Line`]), not as a fixed-width bitmask.

use std::fmt;

/// Identifier of a style produced by an external tokenizer or diagnostic source.
pub type StyleId = u32;

/// Interned identifier of a registered marker type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MarkerTypeId(pub u32);

impl MarkerTypeId {
    /// Create a marker type id from a raw numeric identifier.
    pub const fn new(id: u32) -> Self {
        Self(id)
    }
}

impl fmt::Display for MarkerTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "marker#{}", self.0)
    }
}

/// An RGB color for custom line foreground/background overrides.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
}

impl Color {
    /// Create a new color.
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

/// A tokenizer-produced color span within one line, in 1-based char offsets.
///
/// Spans are produced by an external tokenizer and consumed read-only by
/// rendering; the engine only stores and shifts them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorSpan {
    /// 1-based start character offset (inclusive).
    pub start_ch: usize,
    /// 1-based end character offset (exclusive).
    pub end_ch: usize,
    /// Style the span should be rendered with.
    pub style_id: StyleId,
}

/// A diagnostic wave-line (squiggle) span within one line.
///
/// Wave spans are independent of tokenizer color spans; both may coexist on a
/// line and are rendered as separate overlay passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaveSpan {
    /// 1-based start character offset (inclusive).
    pub start_ch: usize,
    /// 1-based end character offset (exclusive).
    pub end_ch: usize,
    /// Style the squiggle should be rendered with (severity mapping is host-defined).
    pub style_id: StyleId,
}

/// Registry interning marker-type names to small integer ids.
///
/// Names are a presentation-layer concern only; the engine never looks a
/// marker up by name after registration.
#[derive(Debug, Default)]
pub struct MarkerRegistry {
    names: Vec<String>,
}

impl MarkerRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self { names: Vec::new() }
    }

    /// Register a marker type, returning its interned id.
    ///
    /// Registering the same name twice returns the existing id.
    pub fn register(&mut self, name: &str) -> MarkerTypeId {
        if let Some(idx) = self.names.iter().position(|n| n == name) {
            return MarkerTypeId(idx as u32);
        }
        self.names.push(name.to_string());
        MarkerTypeId((self.names.len() - 1) as u32)
    }

    /// Look up a registered marker type by name.
    pub fn lookup(&self, name: &str) -> Option<MarkerTypeId> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|idx| MarkerTypeId(idx as u32))
    }

    /// Get the display name of a marker type.
    pub fn name(&self, id: MarkerTypeId) -> Option<&str> {
        self.names.get(id.0 as usize).map(|s| s.as_str())
    }

    /// Number of registered marker types.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Returns `true` if no marker types are registered.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
