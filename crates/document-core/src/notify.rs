//! Change notifications.
//!
//! The document owns a list of subscriber callbacks and fires a
//! [`DocumentEvent`] after every state change, carrying the document version
//! so consumers can discard stale derived data.

use crate::location::LocationRange;

/// Which part of the document a change invalidated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidationScope {
    /// An inclusive 1-based line span.
    Lines {
        /// First invalidated line.
        start: usize,
        /// Last invalidated line.
        end: usize,
    },
    /// The whole document.
    Whole,
}

/// A state change notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentEvent {
    /// Text or overlay state changed inside the given scope.
    Invalidated {
        /// Affected lines.
        scope: InvalidationScope,
        /// Document version after the change.
        version: u64,
    },
    /// Text content changed. Only fired when content change events are
    /// enabled in the configuration.
    ContentChanged {
        /// The inserted or deleted text.
        text: String,
        /// The affected range. For insertions this is the range the text now
        /// occupies; for deletions, the range it occupied before.
        range: LocationRange,
        /// `true` for insertions, `false` for deletions.
        is_insertion: bool,
        /// Document version after the change.
        version: u64,
    },
    /// Folding regions were created, removed, collapsed or expanded.
    FoldingChanged {
        /// Document version after the change.
        version: u64,
    },
}

/// Subscriber callback type.
pub type EventCallback = Box<dyn FnMut(&DocumentEvent) + Send>;

/// Subscriber list. Fires events in subscription order.
#[derive(Default)]
pub struct EventSink {
    callbacks: Vec<EventCallback>,
}

impl EventSink {
    /// An empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a subscriber.
    pub fn subscribe<F>(&mut self, callback: F)
    where
        F: FnMut(&DocumentEvent) + Send + 'static,
    {
        self.callbacks.push(Box::new(callback));
    }

    /// Number of subscribers.
    pub fn len(&self) -> usize {
        self.callbacks.len()
    }

    /// Returns `true` if nobody is subscribed.
    pub fn is_empty(&self) -> bool {
        self.callbacks.is_empty()
    }

    /// Deliver `event` to every subscriber.
    pub fn emit(&mut self, event: &DocumentEvent) {
        for callback in &mut self.callbacks {
            callback(event);
        }
    }
}

impl std::fmt::Debug for EventSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventSink")
            .field("callbacks", &self.callbacks.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_emit_reaches_all_subscribers() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut sink = EventSink::new();
        for _ in 0..2 {
            let seen = seen.clone();
            sink.subscribe(move |event| {
                if let DocumentEvent::Invalidated { version, .. } = event {
                    seen.lock().unwrap().push(*version);
                }
            });
        }

        sink.emit(&DocumentEvent::Invalidated {
            scope: InvalidationScope::Whole,
            version: 7,
        });
        assert_eq!(*seen.lock().unwrap(), vec![7, 7]);
    }
}
