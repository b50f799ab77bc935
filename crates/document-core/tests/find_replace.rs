use document_core::{Document, Location, LocationRange, SearchOptions};

fn range(line: usize, start: usize, end: usize) -> LocationRange {
    LocationRange::new(Location::new(line, start), Location::new(line, end))
}

#[test]
fn test_find_next_walks_matches_in_order() {
    let doc = Document::from_text("foo bar\nbaz foo\nfoo");
    let opts = SearchOptions::default();

    let first = doc.find("foo", opts, Location::START).unwrap().unwrap();
    assert_eq!(first, range(1, 1, 4));

    let second = doc.find("foo", opts, first.end).unwrap().unwrap();
    assert_eq!(second, range(2, 5, 8));

    let third = doc.find("foo", opts, second.end).unwrap().unwrap();
    assert_eq!(third, range(3, 1, 4));

    assert_eq!(doc.find("foo", opts, third.end).unwrap(), None);
}

#[test]
fn test_wrapped_find_visits_every_match_exactly_once() {
    let doc = Document::from_text("a one\nb one\nc one");
    let opts = SearchOptions {
        wrap_around: true,
        ..Default::default()
    };

    // Start mid-document and walk until we return to the first match seen.
    let mut from = Location::new(2, 1);
    let mut seen = Vec::new();
    let first = doc.find("one", opts, from).unwrap().unwrap();
    let mut current = first;
    loop {
        seen.push(current);
        from = current.end;
        current = doc.find("one", opts, from).unwrap().unwrap();
        if current == first {
            break;
        }
    }
    assert_eq!(seen, vec![range(2, 3, 6), range(3, 3, 6), range(1, 3, 6)]);
}

#[test]
fn test_search_up_walks_backward() {
    let doc = Document::from_text("x\ny hit\nz\nhit");
    let opts = SearchOptions {
        search_up: true,
        ..Default::default()
    };

    let from = doc.end_location();
    let first = doc.find("hit", opts, from).unwrap().unwrap();
    assert_eq!(first, range(4, 1, 4));

    let second = doc.find("hit", opts, first.start).unwrap().unwrap();
    assert_eq!(second, range(2, 3, 6));
}

#[test]
fn test_replace_next_replaces_one_match() {
    let mut doc = Document::from_text("old old");
    let replaced = doc
        .replace_next("old", "new", SearchOptions::default(), Location::START)
        .unwrap();
    assert_eq!(replaced, Some(range(1, 1, 4)));
    assert_eq!(doc.text(), "new old");
}

#[test]
fn test_replace_all_counts_and_groups() {
    let mut doc = Document::from_text("foo bar foo");
    let n = doc
        .replace_all("foo", "X", SearchOptions::default())
        .unwrap();
    assert_eq!(n, 2);
    assert_eq!(doc.text(), "X bar X");

    // The whole pass is one undo entry.
    assert!(doc.undo());
    assert_eq!(doc.text(), "foo bar foo");
    assert!(!doc.can_undo());
}

#[test]
fn test_replace_all_with_longer_replacement() {
    let mut doc = Document::from_text("a a a\na");
    let n = doc
        .replace_all("a", "long", SearchOptions::default())
        .unwrap();
    assert_eq!(n, 4);
    assert_eq!(doc.text(), "long long long\nlong");
}

#[test]
fn test_replace_all_with_multiline_replacement() {
    let mut doc = Document::from_text("x|x");
    let n = doc
        .replace_all("|", "\n", SearchOptions::default())
        .unwrap();
    assert_eq!(n, 1);
    assert_eq!(doc.text(), "x\nx");
    assert_eq!(doc.line_count(), 2);

    assert!(doc.undo());
    assert_eq!(doc.text(), "x|x");
}

#[test]
fn test_whole_word_and_case_options() {
    let doc = Document::from_text("Cat category cat scatter");
    let opts = SearchOptions {
        whole_word: true,
        match_case: false,
        ..Default::default()
    };
    let all = doc.find_all("cat", opts).unwrap();
    assert_eq!(all, vec![range(1, 1, 4), range(1, 14, 17)]);
}

#[test]
fn test_wildcard_query() {
    let doc = Document::from_text("get_name set_name get_value");
    let opts = SearchOptions {
        use_wildcards: true,
        ..Default::default()
    };
    let all = doc.find_all("get_*e", opts).unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].start, Location::new(1, 1));
}

#[test]
fn test_regex_query_and_error() {
    let doc = Document::from_text("v1 v22 v333");
    let opts = SearchOptions {
        use_regex: true,
        ..Default::default()
    };
    let all = doc.find_all(r"v\d{2,}", opts).unwrap();
    assert_eq!(all, vec![range(1, 4, 7), range(1, 8, 12)]);

    assert!(doc.find_all(r"(", opts).is_err());
}

#[test]
fn test_hidden_lines_excluded_when_requested() {
    let mut doc = Document::from_text("visible\nburied\nvisible");
    doc.create_region(1, 3).unwrap();
    doc.set_folding(1, 3, true);

    let skipping = SearchOptions {
        include_hidden: false,
        ..Default::default()
    };
    assert_eq!(doc.find("buried", skipping, Location::START).unwrap(), None);
    assert!(doc
        .find("buried", SearchOptions::default(), Location::START)
        .unwrap()
        .is_some());
}

#[test]
fn test_mark_all_marks_each_matching_line_once() {
    let mut doc = Document::from_text("hit hit\nclean\nhit");
    let marker = doc.register_marker("find-hit");
    let n = doc
        .mark_all("hit", SearchOptions::default(), marker)
        .unwrap();
    assert_eq!(n, 3);
    assert!(doc.has_marker(1, marker));
    assert!(!doc.has_marker(2, marker));
    assert!(doc.has_marker(3, marker));
}
