//! Lossless tabs/spaces conversion and indent-string synthesis.
//!
//! All conversions are relative to line start and a configured tab size, so
//! `spaces_to_tabs(tabs_to_spaces(text))` restores stop-aligned whitespace
//! exactly.

/// How indentation is materialized when the engine synthesizes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndentStyle {
    /// Indent with literal tab characters (spaces for any remainder).
    Tabs,
    /// Indent with spaces only.
    Spaces,
}

/// Expand every tab in `text` to spaces up to the next tab stop.
///
/// `text` may span multiple lines; expansion restarts at each LF.
pub fn tabs_to_spaces(text: &str, tab_size: usize) -> String {
    let tab_size = tab_size.max(1);
    let mut out = String::with_capacity(text.len());
    let mut width = 0usize;

    for ch in text.chars() {
        match ch {
            '\t' => {
                let next = (width / tab_size + 1) * tab_size;
                for _ in width..next {
                    out.push(' ');
                }
                width = next;
            }
            '\n' => {
                out.push('\n');
                width = 0;
            }
            _ => {
                out.push(ch);
                width += 1;
            }
        }
    }
    out
}

/// Convert runs of spaces that reach a tab stop back into tabs.
///
/// Only space runs are converted; a run contributes one tab per stop it
/// crosses and keeps its remainder as spaces, so non-aligned spacing is
/// preserved. Conversion restarts at each LF.
pub fn spaces_to_tabs(text: &str, tab_size: usize) -> String {
    let tab_size = tab_size.max(1);
    let mut out = String::with_capacity(text.len());
    let mut width = 0usize;
    let mut pending_spaces = 0usize;

    let flush = |out: &mut String, run_start: usize, run_len: usize| {
        let mut pos = run_start;
        let end = run_start + run_len;
        while pos < end {
            let next_stop = (pos / tab_size + 1) * tab_size;
            if next_stop <= end {
                out.push('\t');
                pos = next_stop;
            } else {
                for _ in pos..end {
                    out.push(' ');
                }
                pos = end;
            }
        }
    };

    for ch in text.chars() {
        match ch {
            ' ' => pending_spaces += 1,
            '\t' => {
                // Existing tab: the pending spaces merge into its stop.
                out.push('\t');
                width = (width + pending_spaces) / tab_size * tab_size + tab_size;
                pending_spaces = 0;
            }
            _ => {
                if pending_spaces > 0 {
                    flush(&mut out, width, pending_spaces);
                    width += pending_spaces;
                    pending_spaces = 0;
                }
                out.push(ch);
                if ch == '\n' {
                    width = 0;
                } else {
                    width += 1;
                }
            }
        }
    }
    if pending_spaces > 0 {
        flush(&mut out, width, pending_spaces);
    }
    out
}

/// Synthesize one indent unit of `indent_size` columns starting at display
/// offset `base`, honoring the configured style.
pub fn indent_string(style: IndentStyle, indent_size: usize, tab_size: usize, base: usize) -> String {
    let tab_size = tab_size.max(1);
    let indent_size = indent_size.max(1);
    let target = base + indent_size;

    match style {
        IndentStyle::Spaces => " ".repeat(indent_size),
        IndentStyle::Tabs => {
            let mut out = String::new();
            let mut pos = base;
            loop {
                let next_stop = (pos / tab_size + 1) * tab_size;
                if next_stop <= target {
                    out.push('\t');
                    pos = next_stop;
                } else {
                    break;
                }
            }
            for _ in pos..target {
                out.push(' ');
            }
            out
        }
    }
}

/// Remove one leading indent unit (up to `indent_size` columns of whitespace)
/// from `line`, returning the trimmed text and how many characters were cut.
pub fn strip_one_indent(line: &str, indent_size: usize, tab_size: usize) -> (String, usize) {
    let tab_size = tab_size.max(1);
    let indent_size = indent_size.max(1);
    let mut width = 0usize;
    let mut chars_cut = 0usize;

    for ch in line.chars() {
        if width >= indent_size {
            break;
        }
        match ch {
            ' ' => {
                width += 1;
                chars_cut += 1;
            }
            '\t' => {
                let next = (width / tab_size + 1) * tab_size;
                if next > indent_size {
                    break;
                }
                width = next;
                chars_cut += 1;
            }
            _ => break,
        }
    }

    let rest: String = line.chars().skip(chars_cut).collect();
    (rest, chars_cut)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tabs_to_spaces_aligns_stops() {
        assert_eq!(tabs_to_spaces("\tx", 4), "    x");
        assert_eq!(tabs_to_spaces("ab\tc", 4), "ab  c");
        assert_eq!(tabs_to_spaces("abcd\tc", 4), "abcd    c");
    }

    #[test]
    fn test_tabs_to_spaces_restarts_per_line() {
        assert_eq!(tabs_to_spaces("a\t\nb\t", 4), "a   \nb   ");
    }

    #[test]
    fn test_spaces_to_tabs_converts_aligned_runs() {
        assert_eq!(spaces_to_tabs("    x", 4), "\tx");
        assert_eq!(spaces_to_tabs("        x", 4), "\t\tx");
        assert_eq!(spaces_to_tabs("ab  c", 4), "ab\tc");
    }

    #[test]
    fn test_spaces_to_tabs_keeps_remainder() {
        assert_eq!(spaces_to_tabs("     x", 4), "\t x");
        assert_eq!(spaces_to_tabs("a b", 4), "a b");
    }

    #[test]
    fn test_round_trip_is_lossless() {
        for text in ["\tfn main() {\n\t\tbody\n\t}", "a\tb\tc", "\t\t\tdeep"] {
            let spaces = tabs_to_spaces(text, 4);
            assert!(!spaces.contains('\t'));
            assert_eq!(spaces_to_tabs(&spaces, 4), text);
        }
    }

    #[test]
    fn test_indent_string_spaces() {
        assert_eq!(indent_string(IndentStyle::Spaces, 4, 4, 0), "    ");
        assert_eq!(indent_string(IndentStyle::Spaces, 2, 8, 3), "  ");
    }

    #[test]
    fn test_indent_string_tabs() {
        assert_eq!(indent_string(IndentStyle::Tabs, 4, 4, 0), "\t");
        assert_eq!(indent_string(IndentStyle::Tabs, 8, 4, 0), "\t\t");
        // Base offset 2 with 4-column indent: tab reaches stop 4, spaces fill to 6.
        assert_eq!(indent_string(IndentStyle::Tabs, 4, 4, 2), "\t  ");
        // Indent smaller than the distance to the next stop: spaces only.
        assert_eq!(indent_string(IndentStyle::Tabs, 2, 8, 0), "  ");
    }

    #[test]
    fn test_strip_one_indent() {
        assert_eq!(strip_one_indent("    x", 4, 4), ("x".to_string(), 4));
        assert_eq!(strip_one_indent("\tx", 4, 4), ("x".to_string(), 1));
        assert_eq!(strip_one_indent("  x", 4, 4), ("x".to_string(), 2));
        assert_eq!(strip_one_indent("x", 4, 4), ("x".to_string(), 0));
    }
}
