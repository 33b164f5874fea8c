//! Output sinks for migration progress.
//!
//! `say` lines look like:
//!
//! ```text
//! -- Renaming label Book to Publication
//!    -> 0.0213s
//!    -> 3 rows
//! ```

use std::sync::{Arc, Mutex};

use crate::graph::Row;

/// Receives progress lines written by the migration helpers.
pub trait Output: Send + Sync {
    fn output(&self, line: &str);
}

/// Prints every line to standard output.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdoutOutput;

impl Output for StdoutOutput {
    fn output(&self, line: &str) {
        println!("{}", line);
    }
}

/// Logs every line at info level under the `graphshift::migrations` target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingOutput;

impl Output for TracingOutput {
    fn output(&self, line: &str) {
        tracing::info!(target: "graphshift::migrations", "{}", line);
    }
}

/// Collects lines in memory. Clones share the same buffer.
#[derive(Debug, Clone, Default)]
pub struct MemoryOutput {
    lines: Arc<Mutex<Vec<String>>>,
}

impl MemoryOutput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the lines written so far.
    pub fn lines(&self) -> Vec<String> {
        self.lines
            .lock()
            .map(|lines| lines.clone())
            .unwrap_or_default()
    }
}

impl Output for MemoryOutput {
    fn output(&self, line: &str) {
        if let Ok(mut lines) = self.lines.lock() {
            lines.push(line.to_string());
        }
    }
}

/// Formats a `say` line: `-- text`, or `   -> text` for a sub-item.
pub fn format_say(text: &str, subitem: bool) -> String {
    if subitem {
        format!("   -> {}", text)
    } else {
        format!("-- {}", text)
    }
}

/// Results that `say_with_time` can report as a row count.
pub trait RowCount {
    /// Number of rows to report, or `None` to report nothing.
    fn row_count(&self) -> Option<u64> {
        None
    }
}

impl RowCount for () {}

impl RowCount for u64 {
    fn row_count(&self) -> Option<u64> {
        Some(*self)
    }
}

impl RowCount for usize {
    fn row_count(&self) -> Option<u64> {
        Some(*self as u64)
    }
}

impl RowCount for Vec<Row> {
    fn row_count(&self) -> Option<u64> {
        Some(self.len() as u64)
    }
}
