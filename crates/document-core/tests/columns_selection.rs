use document_core::{Document, DocumentConfig, Location};

#[test]
fn test_columns_expand_tabs_to_stops() {
    let doc = Document::from_text("\tx\nab\tc");
    assert_eq!(doc.column_of(Location::new(1, 1)), 1); // the tab itself
    assert_eq!(doc.column_of(Location::new(1, 2)), 5); // 'x' after the stop
    assert_eq!(doc.column_of(Location::new(2, 3)), 3); // '\t' on line 2
    assert_eq!(doc.column_of(Location::new(2, 4)), 5); // 'c'
}

#[test]
fn test_char_of_snaps_into_tab_span() {
    let doc = Document::from_text("\tx");
    for column in 1..=4 {
        assert_eq!(doc.char_of(1, column), Location::new(1, 1));
    }
    assert_eq!(doc.char_of(1, 5), Location::new(1, 2));
}

#[test]
fn test_column_round_trip_on_tabbed_line() {
    let doc = Document::from_text("a\tb\tc");
    for ch in 1..=6 {
        let loc = Location::new(1, ch);
        let column = doc.column_of(loc);
        assert_eq!(doc.char_of(1, column), loc, "round trip at ch {}", ch);
    }
}

#[test]
fn test_collapsed_fold_maps_through_placeholder() {
    let mut doc = Document::from_text("head\nmid\ntail!");
    doc.create_region(1, 3).unwrap();
    doc.set_folding(1, 3, true);

    // Display row 1 reads "head" + "..." + "tail!".
    assert_eq!(doc.column_of(Location::new(1, 5)), 5);
    assert_eq!(doc.column_of(Location::new(2, 2)), 5); // hidden line snaps
    assert_eq!(doc.column_of(Location::new(3, 1)), 8);
    assert_eq!(doc.column_of(Location::new(3, 6)), 13);

    assert_eq!(doc.char_of(1, 6), Location::new(1, 5)); // inside placeholder
    assert_eq!(doc.char_of(1, 9), Location::new(3, 2));
}

#[test]
fn test_custom_tab_size() {
    let mut config = DocumentConfig::default();
    config.tab_size = 8;
    let doc = Document::with_config("\tx", config);
    assert_eq!(doc.column_of(Location::new(1, 2)), 9);
}

#[test]
fn test_character_selection_normalizes_backwards() {
    let mut doc = Document::from_text("one\ntwo\nthree");
    doc.select(Location::new(3, 2), Location::new(1, 3), false);
    let range = doc.selection().normalized();
    assert_eq!(range.start, Location::new(1, 3));
    assert_eq!(range.end, Location::new(3, 2));
    assert_eq!(doc.selected_text().as_deref(), Some("e\ntwo\nt"));
}

#[test]
fn test_linewise_selection_covers_whole_lines() {
    let mut doc = Document::from_text("one\ntwo\nthree");
    doc.select(Location::new(1, 2), Location::new(2, 2), true);
    let range = doc.selection().normalized();
    assert_eq!(range.start, Location::new(1, 1));
    assert_eq!(range.end, Location::new(3, 1));
    assert_eq!(doc.selected_text().as_deref(), Some("one\ntwo\n"));
}

#[test]
fn test_linewise_end_at_column_one_excludes_that_line() {
    let mut doc = Document::from_text("one\ntwo\nthree");
    doc.select(Location::new(1, 1), Location::new(3, 1), true);
    let range = doc.selection().normalized();
    assert_eq!(range.end, Location::new(3, 1));
    assert_eq!(doc.selected_text().as_deref(), Some("one\ntwo\n"));
}

#[test]
fn test_interactive_selection_gesture() {
    let mut doc = Document::from_text("drag over this");
    doc.start_selecting(Location::new(1, 6), false);
    assert!(doc.selection().is_selecting);

    doc.extend_selection(Location::new(1, 10));
    doc.stop_selecting();
    assert!(!doc.selection().is_selecting);
    assert_eq!(doc.selected_text().as_deref(), Some("over"));
}

#[test]
fn test_delete_selection_collapses_to_start() {
    let mut doc = Document::from_text("keep CUT keep");
    doc.select(Location::new(1, 6), Location::new(1, 10), false);
    assert!(doc.delete_selection());
    assert_eq!(doc.text(), "keep keep");
    assert_eq!(doc.caret(), Location::new(1, 6));
    assert!(!doc.selection().has_selection());
}

#[test]
fn test_delete_linewise_selection() {
    let mut doc = Document::from_text("one\ntwo\nthree");
    doc.select(Location::new(2, 2), Location::new(2, 3), true);
    assert!(doc.delete_selection());
    assert_eq!(doc.text(), "one\nthree");
}

#[test]
fn test_selection_survives_remote_edit() {
    let mut doc = Document::from_text("alpha\nbeta");
    doc.select(Location::new(2, 1), Location::new(2, 5), false);

    // An edit above the selection shifts both ends down.
    doc.insert(Location::new(1, 1), "inserted\n");
    let range = doc.selection().normalized();
    assert_eq!(range.start, Location::new(3, 1));
    assert_eq!(range.end, Location::new(3, 5));
    assert_eq!(doc.selected_text().as_deref(), Some("beta"));
}
