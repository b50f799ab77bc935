//! Location-aware text search.
//!
//! Patterns are matched line by line (a match never spans a line break) and
//! results are reported as [`LocationRange`]s with 1-based character columns.
//! The query string is interpreted as a literal, a wildcard expression
//! (`*`/`?`) or a full regex depending on the options; literals and wildcards
//! are escaped and compiled into a regex so one engine serves all three.

use regex::{Regex, RegexBuilder};

use crate::folding::FoldingTree;
use crate::line_store::LineStore;
use crate::location::{Location, LocationRange};

/// Options that control how search is performed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchOptions {
    /// If `true`, performs a case-sensitive search.
    pub match_case: bool,
    /// If `true`, matches only whole words (`_` and alphanumerics).
    pub whole_word: bool,
    /// If `true`, lines hidden by collapsed folding regions are searched too.
    pub include_hidden: bool,
    /// If `true`, searches backward from the starting location.
    pub search_up: bool,
    /// If `true`, treats the query as a regex pattern.
    pub use_regex: bool,
    /// If `true`, treats `*` and `?` in the query as wildcards.
    ///
    /// Ignored when [`use_regex`](Self::use_regex) is set.
    pub use_wildcards: bool,
    /// If `true`, the search continues from the opposite end of the document
    /// once the starting location is passed.
    pub wrap_around: bool,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            match_case: true,
            whole_word: false,
            include_hidden: true,
            search_up: false,
            use_regex: false,
            use_wildcards: false,
            wrap_around: false,
        }
    }
}

/// Pattern compilation errors.
#[derive(Debug)]
pub enum PatternError {
    /// The provided regex pattern failed to compile.
    InvalidRegex(regex::Error),
}

impl std::fmt::Display for PatternError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidRegex(err) => write!(f, "Invalid regex: {}", err),
        }
    }
}

impl std::error::Error for PatternError {}

fn wildcard_to_regex(query: &str) -> String {
    let mut pattern = String::with_capacity(query.len() * 2);
    for ch in query.chars() {
        match ch {
            '*' => pattern.push_str(".*"),
            '?' => pattern.push('.'),
            _ => pattern.push_str(&regex::escape(&ch.to_string())),
        }
    }
    pattern
}

fn compile_pattern(query: &str, options: SearchOptions) -> Result<Regex, PatternError> {
    let pattern = if options.use_regex {
        query.to_string()
    } else if options.use_wildcards {
        wildcard_to_regex(query)
    } else {
        regex::escape(query)
    };

    RegexBuilder::new(&pattern)
        .case_insensitive(!options.match_case)
        .build()
        .map_err(PatternError::InvalidRegex)
}

fn is_word_char(ch: char) -> bool {
    ch == '_' || ch.is_alphanumeric()
}

/// Matches of `re` in a single line, as 1-based `(start_ch, end_ch)` pairs
/// with an exclusive end. Empty matches are dropped; line edges count as
/// non-word characters for the whole-word check.
fn line_matches(re: &Regex, text: &str, whole_word: bool) -> Vec<(usize, usize)> {
    let char_starts: Vec<usize> = text.char_indices().map(|(b, _)| b).collect();
    let byte_to_char = |byte: usize| match char_starts.binary_search(&byte) {
        Ok(idx) => idx,
        Err(idx) => idx,
    };

    let mut out = Vec::new();
    for m in re.find_iter(text) {
        if m.start() == m.end() {
            continue;
        }
        let start = byte_to_char(m.start());
        let end = byte_to_char(m.end());

        if whole_word {
            let before = start
                .checked_sub(1)
                .and_then(|idx| text[char_starts[idx]..].chars().next());
            let after = char_starts
                .get(end)
                .and_then(|&b| text[b..].chars().next());
            if before.is_some_and(is_word_char) || after.is_some_and(is_word_char) {
                continue;
            }
        }

        out.push((start + 1, end + 1));
    }
    out
}

fn line_visible(folding: &FoldingTree, line: usize, options: SearchOptions) -> bool {
    options.include_hidden || !folding.is_line_hidden(line)
}

/// Engine behind [`find`] and [`find_all`], borrowed from the document for
/// the duration of a query.
pub struct Searcher<'a> {
    store: &'a LineStore,
    folding: &'a FoldingTree,
}

impl<'a> Searcher<'a> {
    /// Create a searcher over the given store and folding state.
    pub fn new(store: &'a LineStore, folding: &'a FoldingTree) -> Self {
        Self { store, folding }
    }

    /// Find the nearest occurrence of `query` from `from`, honoring the
    /// direction, hidden-line and wrap options.
    ///
    /// Forward search returns the first match starting at or after `from`;
    /// backward search returns the last match ending at or before `from`.
    /// With `wrap_around` the scan continues from the opposite end but stops
    /// before re-reporting anything already covered, so a wrapped search
    /// never yields the same range twice.
    pub fn find(
        &self,
        query: &str,
        options: SearchOptions,
        from: Location,
    ) -> Result<Option<LocationRange>, PatternError> {
        if query.is_empty() {
            return Ok(None);
        }
        let re = compile_pattern(query, options)?;
        let from = self.store.clamp_location(from);

        let found = if options.search_up {
            self.scan_backward(&re, options, from)
        } else {
            self.scan_forward(&re, options, from)
        };
        Ok(found)
    }

    /// All occurrences of `query` in document order, honoring the
    /// hidden-line option. Direction and wrap options are ignored.
    pub fn find_all(
        &self,
        query: &str,
        options: SearchOptions,
    ) -> Result<Vec<LocationRange>, PatternError> {
        if query.is_empty() {
            return Ok(Vec::new());
        }
        let re = compile_pattern(query, options)?;

        let mut out = Vec::new();
        for line in 1..=self.store.line_count() {
            if !line_visible(self.folding, line, options) {
                continue;
            }
            let text = self.store.line_text(line).unwrap_or("");
            for (start_ch, end_ch) in line_matches(&re, text, options.whole_word) {
                out.push(LocationRange::new(
                    Location::new(line, start_ch),
                    Location::new(line, end_ch),
                ));
            }
        }
        Ok(out)
    }

    fn scan_forward(
        &self,
        re: &Regex,
        options: SearchOptions,
        from: Location,
    ) -> Option<LocationRange> {
        let line_count = self.store.line_count();

        for line in from.line..=line_count {
            if !line_visible(self.folding, line, options) {
                continue;
            }
            let text = self.store.line_text(line).unwrap_or("");
            for (start_ch, end_ch) in line_matches(re, text, options.whole_word) {
                if line == from.line && start_ch < from.ch {
                    continue;
                }
                return Some(LocationRange::new(
                    Location::new(line, start_ch),
                    Location::new(line, end_ch),
                ));
            }
        }

        if !options.wrap_around {
            return None;
        }

        // Second pass covers only what the first pass skipped.
        for line in 1..=from.line.min(line_count) {
            if !line_visible(self.folding, line, options) {
                continue;
            }
            let text = self.store.line_text(line).unwrap_or("");
            for (start_ch, end_ch) in line_matches(re, text, options.whole_word) {
                if line == from.line && start_ch >= from.ch {
                    break;
                }
                return Some(LocationRange::new(
                    Location::new(line, start_ch),
                    Location::new(line, end_ch),
                ));
            }
        }
        None
    }

    fn scan_backward(
        &self,
        re: &Regex,
        options: SearchOptions,
        from: Location,
    ) -> Option<LocationRange> {
        let line_count = self.store.line_count();

        for line in (1..=from.line).rev() {
            if !line_visible(self.folding, line, options) {
                continue;
            }
            let text = self.store.line_text(line).unwrap_or("");
            let mut best = None;
            for (start_ch, end_ch) in line_matches(re, text, options.whole_word) {
                if line == from.line && end_ch > from.ch {
                    break;
                }
                best = Some((start_ch, end_ch));
            }
            if let Some((start_ch, end_ch)) = best {
                return Some(LocationRange::new(
                    Location::new(line, start_ch),
                    Location::new(line, end_ch),
                ));
            }
        }

        if !options.wrap_around {
            return None;
        }

        for line in (from.line..=line_count).rev() {
            if !line_visible(self.folding, line, options) {
                continue;
            }
            let text = self.store.line_text(line).unwrap_or("");
            let mut best = None;
            for (start_ch, end_ch) in line_matches(re, text, options.whole_word) {
                if line == from.line && end_ch <= from.ch {
                    continue;
                }
                best = Some((start_ch, end_ch));
            }
            if let Some((start_ch, end_ch)) = best {
                return Some(LocationRange::new(
                    Location::new(line, start_ch),
                    Location::new(line, end_ch),
                ));
            }
        }
        None
    }
}
