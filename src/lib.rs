//! # tex-batch
//!
//! An incremental build orchestrator for LaTeX document trees.
//!
//! Given a directory of `.tex` sources, `tex-batch` determines which
//! documents are stale relative to their compiled PDFs and their
//! bibliography dependencies, picks the right compiler and bibliography
//! backend per document, and drives the (possibly multi-pass,
//! bibliography-augmented) compilation sequence for each stale document on
//! a bounded worker pool. Independent documents build concurrently; every
//! build is joined before a run returns.
//!
//! ## Quick Start
//!
//! ```ignore
//! use tex_batch::{BuildConfig, ConsoleLog, Scheduler};
//! use std::path::Path;
//!
//! let log = ConsoleLog::new();
//! let scheduler = Scheduler::new(BuildConfig::default().with_jobs(4), &log)?;
//!
//! // Rebuild every stale document under the current directory.
//! scheduler.run_tree(Path::new("."));
//!
//! // Or build one document, with the default artifact path.
//! scheduler.run_single(Path::new("notes/main.tex"), None)?;
//! ```
//!
//! ## Pieces
//!
//! - [`mod@scan`]: finds a document's bibliography resources and backend needs
//! - [`stale`]: decides whether an artifact must be rebuilt, and how
//! - [`pipeline`]: runs the external tool sequence for one document
//! - [`schedule`]: fans stale documents out across the worker pool
//! - [`config`]: explicit scanner patterns, extensions, and tool names
//! - [`logger`]: the shared `(label, line)` output sink

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod logger;
pub mod pipeline;
pub mod scan;
pub mod schedule;
pub mod stale;

// =============================================================================
// High-Level API
// =============================================================================

pub use config::{BuildConfig, ScanPatterns, ToolSet};
pub use schedule::{discover, Scheduler};

// =============================================================================
// Core pieces
// =============================================================================

pub use error::BuildError;
pub use logger::{artifact_label, BuildLog, ConsoleLog, MemoryLog};
pub use scan::{scan, CompilerBackend, ScanReport};
pub use stale::{decide, BibBackend, BuildDecision};
