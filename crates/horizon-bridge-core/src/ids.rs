//! Monotonic identifier generation.
//!
//! Generated identifiers name things on the native side: widget path
//! suffixes (`.f.button3`), font objects (`font2`), virtual events
//! (`<<VirtEvent1>>`) and callback tokens. The read-increment-format step runs
//! under a lock so concurrent callers never receive the same identifier.

use std::collections::HashMap;

use parking_lot::Mutex;

/// Prefix used for generated virtual event names.
pub const VIRTUAL_EVENT_PREFIX: &str = "VirtEvent";

/// Per-prefix counters for generated identifiers.
#[derive(Debug, Default)]
pub struct IdGenerator {
    counters: Mutex<HashMap<String, u64>>,
}

impl IdGenerator {
    /// Create a generator with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return `prefix` followed by the next counter value for that prefix.
    ///
    /// Counting starts at 1.
    pub fn next(&self, prefix: &str) -> String {
        let mut counters = self.counters.lock();
        let counter = counters.entry(prefix.to_string()).or_insert(0);
        *counter += 1;
        format!("{prefix}{counter}")
    }

    /// Generate a child path under `parent`.
    ///
    /// The root path `.` yields `.prefixN`; any other parent yields
    /// `parent.prefixN`.
    pub fn child_path(&self, parent: &str, prefix: &str) -> String {
        let leaf = self.next(prefix);
        if parent == "." || parent.is_empty() {
            format!(".{leaf}")
        } else {
            format!("{parent}.{leaf}")
        }
    }

    /// Generate a virtual event name such as `<<VirtEvent1>>`.
    pub fn next_virtual_event(&self) -> String {
        format!("<<{}>>", self.next(VIRTUAL_EVENT_PREFIX))
    }

    /// The last value handed out for `prefix` (0 if none).
    pub fn current(&self, prefix: &str) -> u64 {
        self.counters.lock().get(prefix).copied().unwrap_or(0)
    }
}
