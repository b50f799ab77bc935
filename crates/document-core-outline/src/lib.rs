//! `document-core-outline` - Automatic folding-region discovery for `document-core`.
//!
//! Scanners read the document text and propose foldable regions (brace pairs,
//! indentation blocks). An [`OutlineJob`] snapshots the document version when
//! scanning starts, supports cooperative cancellation between lines, and only
//! applies its result when the document has not changed in the meantime, so a
//! stale scan from an abandoned edit state never clobbers newer regions.
//!
//! The scan itself runs over a plain text snapshot and can therefore be moved
//! to a worker thread; applying the result happens on the document owner's
//! thread.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use document_core::Document;
use thiserror::Error;

/// A proposed foldable region, in 1-based inclusive lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutlineRegion {
    /// First line of the region (stays visible when collapsed).
    pub start_line: usize,
    /// Last line of the region.
    pub end_line: usize,
}

impl OutlineRegion {
    /// Create a region. `start_line` must be less than `end_line`.
    pub fn new(start_line: usize, end_line: usize) -> Self {
        debug_assert!(start_line < end_line);
        Self {
            start_line,
            end_line,
        }
    }
}

/// Outline errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum OutlineError {
    /// The scan was cancelled before it finished.
    #[error("outline scan was cancelled")]
    Cancelled,
    /// The document changed while the scan was running.
    #[error("outline result is stale: scanned version {scanned}, document is at {current}")]
    Stale {
        /// Version the scan was computed against.
        scanned: u64,
        /// Version the document is at now.
        current: u64,
    },
}

/// Discovers foldable regions in a text snapshot.
///
/// `lines` is the document content split into lines; implementations must
/// call `cancelled` between lines and bail out with [`OutlineError::Cancelled`]
/// when it returns `true`.
pub trait OutlineScanner {
    /// Scan `lines` and return the discovered regions in any order.
    fn scan(
        &self,
        lines: &[&str],
        cancelled: &dyn Fn() -> bool,
    ) -> Result<Vec<OutlineRegion>, OutlineError>;
}

/// Pairs opening and closing brace characters across lines.
///
/// A region spans from the line holding the opening brace to the line holding
/// its match; single-line pairs produce no region. String and character
/// literals are not parsed, so a brace inside one counts. That matches the
/// cheap scanners this crate is for; use a language-aware producer when it
/// matters.
#[derive(Debug, Clone)]
pub struct BraceScanner {
    open: char,
    close: char,
}

impl BraceScanner {
    /// A scanner pairing `{` with `}`.
    pub fn curly() -> Self {
        Self::new('{', '}')
    }

    /// A scanner pairing a custom brace character pair.
    pub fn new(open: char, close: char) -> Self {
        Self { open, close }
    }
}

impl OutlineScanner for BraceScanner {
    fn scan(
        &self,
        lines: &[&str],
        cancelled: &dyn Fn() -> bool,
    ) -> Result<Vec<OutlineRegion>, OutlineError> {
        let mut stack: Vec<usize> = Vec::new();
        let mut regions = Vec::new();

        for (idx, text) in lines.iter().enumerate() {
            if cancelled() {
                return Err(OutlineError::Cancelled);
            }
            let line = idx + 1;
            for ch in text.chars() {
                if ch == self.open {
                    stack.push(line);
                } else if ch == self.close {
                    if let Some(start_line) = stack.pop()
                        && start_line < line
                    {
                        regions.push(OutlineRegion::new(start_line, line));
                    }
                }
            }
        }
        Ok(regions)
    }
}

/// Groups runs of deeper-indented lines under their header line.
///
/// A region starts at a line whose successor is indented deeper and extends
/// to the last line of that deeper run. Blank lines inherit the indentation
/// of the surrounding block.
#[derive(Debug, Clone)]
pub struct IndentScanner {
    tab_size: usize,
}

impl IndentScanner {
    /// A scanner measuring indentation with the given tab size.
    pub fn new(tab_size: usize) -> Self {
        Self {
            tab_size: tab_size.max(1),
        }
    }

    fn indent_of(&self, text: &str) -> Option<usize> {
        if text.trim().is_empty() {
            return None;
        }
        let mut width = 0usize;
        for ch in text.chars() {
            match ch {
                ' ' => width += 1,
                '\t' => width = (width / self.tab_size + 1) * self.tab_size,
                _ => break,
            }
        }
        Some(width)
    }
}

impl OutlineScanner for IndentScanner {
    fn scan(
        &self,
        lines: &[&str],
        cancelled: &dyn Fn() -> bool,
    ) -> Result<Vec<OutlineRegion>, OutlineError> {
        // (header line, header indent), innermost last.
        let mut stack: Vec<(usize, usize)> = Vec::new();
        let mut regions = Vec::new();
        let mut last_content: Option<(usize, usize)> = None; // (line, indent)

        for (idx, text) in lines.iter().enumerate() {
            if cancelled() {
                return Err(OutlineError::Cancelled);
            }
            let line = idx + 1;
            let Some(indent) = self.indent_of(text) else {
                continue;
            };

            while let Some(&(header_line, header_indent)) = stack.last() {
                if indent > header_indent {
                    break;
                }
                stack.pop();
                if let Some((end_line, _)) = last_content
                    && end_line > header_line
                {
                    regions.push(OutlineRegion::new(header_line, end_line));
                }
            }

            if let Some((prev_line, prev_indent)) = last_content
                && indent > prev_indent
            {
                stack.push((prev_line, prev_indent));
            }
            last_content = Some((line, indent));
        }

        while let Some((header_line, _)) = stack.pop() {
            if let Some((end_line, _)) = last_content
                && end_line > header_line
            {
                regions.push(OutlineRegion::new(header_line, end_line));
            }
        }
        Ok(regions)
    }
}

/// One outline pass: snapshot, scan, apply-if-current.
///
/// The job captures the document text and version up front. [`run`](Self::run)
/// performs the scan (safe to call off-thread); [`apply`](Self::apply) writes
/// the result back as derived regions, refusing if the document has moved on.
pub struct OutlineJob {
    text: String,
    scanned_version: u64,
    cancel: Arc<AtomicBool>,
}

impl OutlineJob {
    /// Snapshot `doc` for scanning.
    pub fn new(doc: &Document) -> Self {
        Self {
            text: doc.text(),
            scanned_version: doc.version(),
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    /// A handle that cancels this job when flagged.
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        self.cancel.clone()
    }

    /// The document version this job scans against.
    pub fn scanned_version(&self) -> u64 {
        self.scanned_version
    }

    /// Run `scanner` over the snapshot.
    pub fn run(&self, scanner: &dyn OutlineScanner) -> Result<Vec<OutlineRegion>, OutlineError> {
        let lines: Vec<&str> = self.text.split('\n').collect();
        let cancel = self.cancel.clone();
        scanner.scan(&lines, &move || cancel.load(Ordering::Relaxed))
    }

    /// Replace the document's derived regions with `regions`.
    ///
    /// Fails with [`OutlineError::Stale`] when the document has changed since
    /// the snapshot was taken; the caller should start a fresh job (last
    /// edit wins). Regions the folding tree rejects (crossing a user region,
    /// duplicating one) are skipped. Returns the number of regions created.
    pub fn apply(&self, doc: &mut Document, regions: &[OutlineRegion]) -> Result<usize, OutlineError> {
        if doc.version() != self.scanned_version {
            return Err(OutlineError::Stale {
                scanned: self.scanned_version,
                current: doc.version(),
            });
        }

        doc.clear_derived_regions();
        let mut created = 0usize;
        for region in regions {
            if doc
                .create_derived_region(region.start_line, region.end_line)
                .is_ok()
            {
                created += 1;
            }
        }
        Ok(created)
    }
}
