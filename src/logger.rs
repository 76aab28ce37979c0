//! Logging collaborator.
//!
//! Build output is delivered as `(label, line)` pairs, where the label is
//! the artifact's base name. Lines for one document arrive in the order the
//! tools emitted them; lines from different documents may interleave.

use std::io::{self, Write};
use std::path::Path;

use owo_colors::{OwoColorize, Stream};
use parking_lot::Mutex;

/// Sink for build output lines.
///
/// One sink is shared by every concurrently building document, so
/// implementations must serialize writes internally.
pub trait BuildLog: Send + Sync {
    /// Deliver one line of output for the document labeled `label`.
    fn line(&self, label: &str, text: &str);

    /// Deliver a diagnostic warning for the document labeled `label`.
    fn warn(&self, label: &str, text: &str) {
        self.line(label, text);
    }
}

/// Label for a document's build output: the artifact's base name.
pub fn artifact_label(artifact: &Path) -> String {
    artifact
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| artifact.display().to_string())
}

/// Terminal sink printing `[label]: line`, with a bold label when the
/// output is a terminal.
pub struct ConsoleLog {
    sink: Mutex<Box<dyn Write + Send>>,
}

impl ConsoleLog {
    /// Create a sink writing to stdout.
    pub fn new() -> Self {
        Self::with_writer(Box::new(io::stdout()))
    }

    /// Create a sink writing to an arbitrary writer.
    pub fn with_writer(writer: Box<dyn Write + Send>) -> Self {
        Self {
            sink: Mutex::new(writer),
        }
    }
}

impl Default for ConsoleLog {
    fn default() -> Self {
        Self::new()
    }
}

impl BuildLog for ConsoleLog {
    fn line(&self, label: &str, text: &str) {
        let label = label.if_supports_color(Stream::Stdout, |label| label.bold());
        // One writeln per call keeps concurrent documents from splicing
        // into each other mid-line.
        let mut sink = self.sink.lock();
        let _ = writeln!(sink, "[{label}]: {text}");
    }
}

/// Capturing sink that records every `(label, line)` pair.
///
/// Useful in tests and for embedders that post-process build output.
#[derive(Default)]
pub struct MemoryLog {
    lines: Mutex<Vec<(String, String)>>,
}

impl MemoryLog {
    /// Create an empty capturing sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all recorded `(label, line)` pairs, in delivery order.
    pub fn lines(&self) -> Vec<(String, String)> {
        self.lines.lock().clone()
    }

    /// Lines recorded for a single label, in delivery order.
    pub fn lines_for(&self, label: &str) -> Vec<String> {
        self.lines
            .lock()
            .iter()
            .filter(|(recorded, _)| recorded == label)
            .map(|(_, text)| text.clone())
            .collect()
    }
}

impl BuildLog for MemoryLog {
    fn line(&self, label: &str, text: &str) {
        self.lines.lock().push((label.to_string(), text.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_log_preserves_order() {
        let log = MemoryLog::new();
        log.line("a.pdf", "first");
        log.line("b.pdf", "interleaved");
        log.line("a.pdf", "second");

        assert_eq!(log.lines_for("a.pdf"), vec!["first", "second"]);
        assert_eq!(log.lines().len(), 3);
    }

    #[test]
    fn test_artifact_label_is_base_name() {
        assert_eq!(artifact_label(Path::new("notes/deep/main.pdf")), "main.pdf");
        assert_eq!(artifact_label(Path::new("main.pdf")), "main.pdf");
    }
}
