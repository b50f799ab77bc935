//! Tab-aware column arithmetic.
//!
//! Columns are 1-based display positions independent of pixels: every
//! character occupies one column except `'\t'`, which advances to the next
//! tab stop (the next multiple of the tab size, counted from line start).
//!
//! When a folding region is collapsed, the mapping is folding-aware: columns
//! are counted as if the region's placeholder string were spliced between the
//! start line's text and the end line's text, without touching the stored
//! characters.

use crate::folding::FoldingTree;
use crate::line_store::LineStore;
use crate::location::Location;

/// Display width consumed by the first `upto_chars` characters of `text`,
/// starting at display offset `base` from line start.
pub fn expanded_width(text: &str, upto_chars: usize, base: usize, tab_size: usize) -> usize {
    let tab_size = tab_size.max(1);
    let mut width = base;
    for ch in text.chars().take(upto_chars) {
        if ch == '\t' {
            width = (width / tab_size + 1) * tab_size;
        } else {
            width += 1;
        }
    }
    width
}

/// Scan `text` (starting at display offset `base`) for the character covering
/// the 0-based display offset `target`.
///
/// Returns `Ok(char_index)` for the covering character (a `target` inside a
/// tab's visual span snaps back to the tab itself), or `Err(width_after_text)`
/// when `target` lies past the end of `text`.
fn char_at_width(text: &str, target: usize, base: usize, tab_size: usize) -> Result<usize, usize> {
    let tab_size = tab_size.max(1);
    let mut width = base;
    for (idx, ch) in text.chars().enumerate() {
        let next = if ch == '\t' {
            (width / tab_size + 1) * tab_size
        } else {
            width + 1
        };
        if target < next {
            return Ok(idx);
        }
        width = next;
    }
    Err(width)
}

/// Converter between `(line, ch)` locations and tab-expanded display columns.
///
/// Borrowed from the document for the duration of a query; construction is
/// free.
pub struct ColumnModel<'a> {
    store: &'a LineStore,
    folding: &'a FoldingTree,
    tab_size: usize,
    placeholder: &'a str,
}

impl<'a> ColumnModel<'a> {
    /// Create a column model over the given store and folding state.
    pub fn new(
        store: &'a LineStore,
        folding: &'a FoldingTree,
        tab_size: usize,
        placeholder: &'a str,
    ) -> Self {
        Self {
            store,
            folding,
            tab_size,
            placeholder,
        }
    }

    fn line_width(&self, line: usize) -> usize {
        let text = self.store.line_text(line).unwrap_or("");
        expanded_width(text, usize::MAX, 0, self.tab_size)
    }

    /// The 1-based display column of `loc`.
    ///
    /// Locations on lines hidden by a collapsed region map through the
    /// region's placeholder: interior lines snap to the placeholder's first
    /// column, and locations on the region's end line continue after it.
    pub fn column_of(&self, loc: Location) -> usize {
        let loc = self.store.clamp_location(loc);

        if let Some(region) = self.folding.hidden_span_containing(loc.line) {
            let node = self.folding.node(region).expect("live region");
            let start_width = self.line_width(node.start_line());
            let placeholder_width = self.placeholder.chars().count();

            if loc.line < node.end_line() {
                // Fully swallowed by the placeholder.
                return start_width + 1;
            }

            // End line: its text continues after the placeholder.
            let text = self.store.line_text(loc.line).unwrap_or("");
            return expanded_width(
                text,
                loc.ch - 1,
                start_width + placeholder_width,
                self.tab_size,
            ) + 1;
        }

        let text = self.store.line_text(loc.line).unwrap_or("");
        expanded_width(text, loc.ch - 1, 0, self.tab_size) + 1
    }

    /// The location covering display `column` on the row of `line`.
    ///
    /// A column inside a tab's visual span snaps to the tab's character; a
    /// column inside a collapsed region's placeholder snaps to the end of the
    /// start line (the placeholder is never split). When the row belongs to a
    /// collapsed region, columns past the placeholder resolve onto the
    /// region's end line.
    pub fn char_of(&self, line: usize, column: usize) -> Location {
        let line = line.clamp(1, self.store.line_count().max(1));
        let target = column.saturating_sub(1);
        let text = self.store.line_text(line).unwrap_or("");

        // A region truncated to a single line hides nothing and has no
        // placeholder row.
        let region = self
            .folding
            .collapsed_region_starting_at(line)
            .filter(|&id| self.folding.node(id).is_some_and(|n| n.end_line() > line));

        match char_at_width(text, target, 0, self.tab_size) {
            Ok(idx) => Location::new(line, idx + 1),
            Err(end_width) => {
                let Some(region) = region else {
                    return Location::new(line, text.chars().count() + 1);
                };

                let node = self.folding.node(region).expect("live region");
                let placeholder_width = self.placeholder.chars().count();

                if target < end_width + placeholder_width {
                    // Inside the placeholder: snap to end of the start line.
                    return Location::new(line, text.chars().count() + 1);
                }

                let end_line = node.end_line();
                let end_text = self.store.line_text(end_line).unwrap_or("");
                match char_at_width(end_text, target, end_width + placeholder_width, self.tab_size)
                {
                    Ok(idx) => Location::new(end_line, idx + 1),
                    Err(_) => Location::new(end_line, end_text.chars().count() + 1),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::line_store::LineStore;

    fn model<'a>(
        store: &'a LineStore,
        folding: &'a FoldingTree,
    ) -> ColumnModel<'a> {
        ColumnModel::new(store, folding, 4, "...")
    }

    #[test]
    fn test_expanded_width_tabs() {
        assert_eq!(expanded_width("\tx", usize::MAX, 0, 4), 5);
        assert_eq!(expanded_width("ab\tc", usize::MAX, 0, 4), 5);
        assert_eq!(expanded_width("abcd\t", usize::MAX, 0, 4), 8);
    }

    #[test]
    fn test_column_of_plain_text() {
        let store = LineStore::from_text("hello");
        let folding = FoldingTree::new(1);
        let m = model(&store, &folding);

        assert_eq!(m.column_of(Location::new(1, 1)), 1);
        assert_eq!(m.column_of(Location::new(1, 3)), 3);
        assert_eq!(m.column_of(Location::new(1, 6)), 6); // end-of-line
    }

    #[test]
    fn test_column_of_with_tabs() {
        let store = LineStore::from_text("a\tb");
        let folding = FoldingTree::new(1);
        let m = model(&store, &folding);

        assert_eq!(m.column_of(Location::new(1, 1)), 1); // 'a'
        assert_eq!(m.column_of(Location::new(1, 2)), 2); // '\t'
        assert_eq!(m.column_of(Location::new(1, 3)), 5); // 'b' after the stop
    }

    #[test]
    fn test_char_of_snaps_inside_tab() {
        let store = LineStore::from_text("a\tb");
        let folding = FoldingTree::new(1);
        let m = model(&store, &folding);

        // Columns 2..=4 all fall inside the tab's visual span.
        assert_eq!(m.char_of(1, 2), Location::new(1, 2));
        assert_eq!(m.char_of(1, 3), Location::new(1, 2));
        assert_eq!(m.char_of(1, 4), Location::new(1, 2));
        assert_eq!(m.char_of(1, 5), Location::new(1, 3));
    }

    #[test]
    fn test_char_of_past_end_of_line() {
        let store = LineStore::from_text("ab");
        let folding = FoldingTree::new(1);
        let m = model(&store, &folding);

        assert_eq!(m.char_of(1, 10), Location::new(1, 3));
    }

    #[test]
    fn test_column_monotonicity() {
        let store = LineStore::from_text("x\tyz\tw");
        let folding = FoldingTree::new(1);
        let m = model(&store, &folding);

        let len = store.line_len(1).unwrap();
        for ch in 1..len + 1 {
            assert!(
                m.column_of(Location::new(1, ch)) < m.column_of(Location::new(1, ch + 1)),
                "column must grow strictly at ch {}",
                ch
            );
        }
    }

    #[test]
    fn test_collapsed_region_maps_through_placeholder() {
        let store = LineStore::from_text("head\nmid1\nmid2\ntail");
        let mut folding = FoldingTree::new(4);
        let id = folding.create_region(1, 4).unwrap();
        folding.collapse(id);
        let m = model(&store, &folding);

        // "head" occupies columns 1..=4, placeholder "..." 5..=7, "tail" 8..
        assert_eq!(m.column_of(Location::new(1, 5)), 5);
        assert_eq!(m.column_of(Location::new(2, 3)), 5); // interior: snap to placeholder
        assert_eq!(m.column_of(Location::new(4, 1)), 8);
        assert_eq!(m.column_of(Location::new(4, 3)), 10);

        // Reverse mapping across the same row.
        assert_eq!(m.char_of(1, 2), Location::new(1, 2));
        assert_eq!(m.char_of(1, 6), Location::new(1, 5)); // inside placeholder
        assert_eq!(m.char_of(1, 8), Location::new(4, 1));
        assert_eq!(m.char_of(1, 11), Location::new(4, 4));
        assert_eq!(m.char_of(1, 50), Location::new(4, 5));
    }

    #[test]
    fn test_expanded_region_maps_normally() {
        let store = LineStore::from_text("head\nmid\ntail");
        let mut folding = FoldingTree::new(3);
        folding.create_region(1, 3).unwrap();
        let m = model(&store, &folding);

        assert_eq!(m.column_of(Location::new(2, 2)), 2);
        assert_eq!(m.char_of(2, 2), Location::new(2, 2));
    }
}
