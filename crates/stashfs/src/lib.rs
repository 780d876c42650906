//! # stashfs
//!
//! Bounded on-disk cache engine: one file per entry, one directory per bucket.
//!
//! ## Layout
//! - `<root>/simple_storage/<bucket>/(<tag>) <name>`
//! - The recency tag orders entries for eviction and listing
//! - Empty bucket and library directories are deleted after remove/clear
//!
//! ## Failure model
//! Engine operations never return I/O errors. Failures are reported to the
//! [`Diagnostics`] sink and the operation degrades to a miss / no-op.

#![warn(missing_docs)]

mod config;
mod diagnostics;
mod entry;
mod error;
mod stats;
mod storage;

pub use config::{BucketConfig, LIBRARY_DIR_NAME};
pub use diagnostics::{Diagnostics, FailureRecord, Operation, RecordingDiagnostics, TracingDiagnostics};
pub use entry::{format_entry_name, parse_entry_name, validate_logical_name, Entry};
pub use error::{Error, Result};
pub use stats::CacheStats;
pub use storage::FileCache;
