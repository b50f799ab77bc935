#![warn(missing_docs)]
//! Document Core - Headless Text Document Engine
//!
//! # Overview
//!
//! `document-core` is the document engine of a syntax-coloring editing
//! widget: line-indexed text storage, tab-aware column arithmetic,
//! hierarchical code folding, per-line overlays, mergeable undo/redo and
//! location-aware search. It is headless; the presentation layer owns fonts,
//! pixels and painting and consumes this crate's line/column model.
//!
//! # Core Features
//!
//! - **Line Storage**: line-indexed buffer, O(affected lines) editing
//! - **Columns**: tab stops and collapsed-fold placeholders, 1-based columns
//! - **Folding**: hierarchical user and derived regions with hide/show state
//! - **Overlays**: markers, highlights, custom colors, color and wave spans
//! - **Undo/Redo**: tagged composites with single-character typing coalescing
//! - **Search**: literal, wildcard and regex patterns with directional find
//!
//! # Coordinates
//!
//! Everything is addressed by 1-based [`Location`] `(line, ch)` pairs, where
//! `ch` is a raw character offset (tabs count as one). Display columns are a
//! derived view computed on demand by [`Document::column_of`] and
//! [`Document::char_of`].
//!
//! # Quick Start
//!
//! ```rust
//! use document_core::{Document, Location, SearchOptions};
//!
//! let mut doc = Document::from_text("fn main() {\n    body();\n}\n");
//!
//! // Fold the function body and ask where column 12 of row 1 lands.
//! let region = doc.create_region(1, 3).unwrap();
//! doc.set_folding(1, 3, true);
//! assert!(doc.is_line_hidden(2));
//!
//! // Edit, search, undo.
//! doc.type_text("x");
//! let hit = doc.find("body", SearchOptions::default(), Location::START).unwrap();
//! assert!(hit.is_some());
//! assert!(doc.undo());
//! # let _ = region;
//! ```
//!
//! # Module Description
//!
//! - [`location`] - 1-based locations and half-open location ranges
//! - [`line_store`] - line-indexed text storage with per-line overlay state
//! - [`columns`] - tab-aware and folding-aware column arithmetic
//! - [`folding`] - hierarchical folding region tree
//! - [`overlays`] - overlay metadata types and the marker registry
//! - [`selection`] - anchor/active selection with linewise semantics
//! - [`search`] - location-aware find with wildcard/regex patterns
//! - [`history`] - mergeable undo/redo stacks
//! - [`tabs`] - lossless tabs/spaces conversion
//! - [`notify`] - change notifications
//! - [`document`] - the [`Document`] facade tying everything together

pub mod columns;
pub mod document;
pub mod folding;
pub mod history;
pub mod line_store;
pub mod location;
pub mod notify;
pub mod overlays;
pub mod search;
pub mod selection;
pub mod tabs;

pub use columns::ColumnModel;
pub use document::{Document, DocumentConfig};
pub use folding::{FoldingError, FoldingNode, FoldingTree, NodeId, ROOT};
pub use history::{ActionType, Composite, EditHistory, HistoryStateError, UndoAction};
pub use line_store::{Line, LineStore};
pub use location::{Location, LocationRange};
pub use notify::{DocumentEvent, EventCallback, EventSink, InvalidationScope};
pub use overlays::{Color, ColorSpan, MarkerRegistry, MarkerTypeId, StyleId, WaveSpan};
pub use search::{PatternError, SearchOptions, Searcher};
pub use selection::SelectionModel;
pub use tabs::IndentStyle;
