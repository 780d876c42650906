//! Failure reporting for the cache engine
//!
//! The engine never returns I/O errors to its caller. Instead each failure is
//! handed to the [`Diagnostics`] sink the engine was opened with.

use std::fmt;

use parking_lot::Mutex;

use crate::error::Error;

/// Engine operation during which a failure happened
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// Opening the bucket
    Open,
    /// Writing an entry
    Put,
    /// Reading an entry
    Get,
    /// Deleting an entry
    Remove,
    /// Deleting the whole bucket
    Clear,
    /// Listing the bucket directory
    List,
    /// Deleting entries over the limit
    Evict,
    /// Decoding an entry in a typed layer above the engine
    Decode,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::Open => "open",
            Operation::Put => "put",
            Operation::Get => "get",
            Operation::Remove => "remove",
            Operation::Clear => "clear",
            Operation::List => "list",
            Operation::Evict => "evict",
            Operation::Decode => "decode",
        };
        f.write_str(name)
    }
}

/// Sink for failures swallowed at the engine boundary
pub trait Diagnostics: Send + Sync {
    /// Record a failure in `bucket` during `op`
    fn record_failure(&self, bucket: &str, op: Operation, error: &Error);
}

/// Default sink, logs through `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingDiagnostics;

impl Diagnostics for TracingDiagnostics {
    fn record_failure(&self, bucket: &str, op: Operation, error: &Error) {
        tracing::warn!(bucket, op = %op, error = %error, "cache operation failed");
    }
}

/// A failure captured by [`RecordingDiagnostics`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureRecord {
    /// Bucket name
    pub bucket: String,
    /// Operation that failed
    pub op: Operation,
    /// Rendered error
    pub message: String,
}

/// Sink that keeps failures in memory
#[derive(Debug, Default)]
pub struct RecordingDiagnostics {
    records: Mutex<Vec<FailureRecord>>,
}

impl RecordingDiagnostics {
    /// Create an empty recorder
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything recorded so far
    pub fn records(&self) -> Vec<FailureRecord> {
        self.records.lock().clone()
    }

    /// Number of recorded failures
    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    /// True if nothing failed
    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }
}

impl Diagnostics for RecordingDiagnostics {
    fn record_failure(&self, bucket: &str, op: Operation, error: &Error) {
        self.records.lock().push(FailureRecord {
            bucket: bucket.to_string(),
            op,
            message: error.to_string(),
        });
    }
}
