//! Build error type.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Error type for build failures.
///
/// Errors are scoped to a single document's build. The scheduler reports
/// them through the log sink and keeps going, so one failing document never
/// cancels its siblings.
#[derive(Debug, Error)]
pub enum BuildError {
    /// The source document could not be read for scanning.
    #[error("failed to read {}: {source}", path.display())]
    SourceRead {
        /// Path of the unreadable document.
        path: PathBuf,
        /// The underlying I/O error.
        source: io::Error,
    },

    /// An external tool process could not be started.
    #[error("failed to launch {tool}: {source}")]
    ToolLaunch {
        /// Name of the executable that failed to spawn.
        tool: String,
        /// The underlying I/O error.
        source: io::Error,
    },

    /// The worker pool could not be built.
    #[error("failed to build worker pool: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),

    /// Other file I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl BuildError {
    /// Create a source-read error.
    pub fn source_read(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::SourceRead {
            path: path.into(),
            source,
        }
    }

    /// Create a tool-launch error.
    pub fn tool_launch(tool: impl Into<String>, source: io::Error) -> Self {
        Self::ToolLaunch {
            tool: tool.into(),
            source,
        }
    }
}
