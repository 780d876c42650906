//! Cache engine implementation
//!
//! Directory layout:
//! - `<root>/simple_storage/`: library directory shared by all buckets
//! - `<root>/simple_storage/<bucket>/`: one directory per [`FileCache`]
//! - `<root>/simple_storage/<bucket>/(<tag>) <name>`: one file per entry
//!
//! The recency tag in each file name is the only ordering state. It is
//! reconstructed from disk on open, so no index file is needed.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use ahash::AHashSet;
use parking_lot::RwLock;
use tracing::debug;

use crate::config::BucketConfig;
use crate::diagnostics::{Diagnostics, Operation, TracingDiagnostics};
use crate::entry::{format_entry_name, validate_logical_name, Entry};
use crate::error::{Error, Result};
use crate::stats::CacheStats;

/// FileCache owns one bucket directory and everything inside it
pub struct FileCache {
    config: BucketConfig,

    library_dir: PathBuf,

    bucket_dir: PathBuf,

    /// Largest recency tag handed out or seen on disk.
    ///
    /// Writers hold it exclusively for the whole operation, readers share it.
    clock: RwLock<u64>,

    diagnostics: Arc<dyn Diagnostics>,

    stats: CacheStats,
}

impl FileCache {
    /// Open a bucket, reporting failures through `tracing`
    ///
    /// # Arguments
    /// * `config` - Root path, bucket name and entry limit
    ///
    /// # Returns
    /// * `Result<FileCache>` - Fails only if `config` is invalid
    pub fn open(config: BucketConfig) -> Result<Self> {
        Self::open_with(config, Arc::new(TracingDiagnostics))
    }

    /// Open a bucket with a custom diagnostics sink
    ///
    /// The bucket directory is not created until the first `put`.
    pub fn open_with(config: BucketConfig, diagnostics: Arc<dyn Diagnostics>) -> Result<Self> {
        config.validate()?;

        let cache = FileCache {
            library_dir: config.library_dir(),
            bucket_dir: config.bucket_dir(),
            config,
            clock: RwLock::new(0),
            diagnostics,
            stats: CacheStats::new(),
        };

        match cache.scan() {
            Ok(entries) => {
                let last = entries.first().map(|e| e.tag).unwrap_or(0);
                *cache.clock.write() = last;
                debug!(
                    bucket = %cache.config.bucket,
                    entries = entries.len(),
                    last_tag = last,
                    "opened cache bucket"
                );
            }
            Err(e) => cache.fail(Operation::Open, &e),
        }

        Ok(cache)
    }

    /// Store `data` under the logical `name`, replacing any previous entry
    ///
    /// Evicts the oldest entries if the bucket grows past `max_entries`.
    /// Failures are reported to the diagnostics sink, never returned.
    pub fn put(&self, name: &str, data: &[u8]) {
        let mut clock = self.clock.write();
        if let Err(e) = self.try_put(&mut clock, name, data) {
            self.fail(Operation::Put, &e);
        }
    }

    fn try_put(&self, clock: &mut u64, name: &str, data: &[u8]) -> Result<()> {
        validate_logical_name(name)?;
        fs::create_dir_all(&self.bucket_dir)?;

        let existing = self.scan()?;
        if let Some(newest) = existing.first() {
            *clock = (*clock).max(newest.tag);
        }

        let tag = next_tag(clock)?;

        // Every stale copy must be gone before writing, or the name would be duplicated
        for entry in existing.iter().filter(|e| e.name == name) {
            remove_entry_file(&entry.path)?;
        }

        let path = self.bucket_dir.join(format_entry_name(tag, name));
        if let Err(e) = fs::write(&path, data) {
            let _ = remove_entry_file(&path);
            return Err(e.into());
        }

        self.stats.record_insert();
        debug!(bucket = %self.config.bucket, name, tag, size = data.len(), "cached entry");

        self.evict_excess();
        Ok(())
    }

    /// Delete the oldest entries until at most `max_entries` remain
    fn evict_excess(&self) {
        let entries = match self.scan() {
            Ok(entries) => entries,
            Err(e) => {
                self.fail(Operation::Evict, &e);
                return;
            }
        };

        if entries.len() <= self.config.max_entries {
            return;
        }

        let mut evicted = 0;
        for entry in &entries[self.config.max_entries..] {
            match remove_entry_file(&entry.path) {
                Ok(()) => evicted += 1,
                Err(e) => self.fail(Operation::Evict, &e.into()),
            }
        }

        self.stats.record_evictions(evicted);
        debug!(
            bucket = %self.config.bucket,
            evicted,
            remaining = self.config.max_entries,
            "evicted oldest entries"
        );
    }

    /// Read the entry stored under `name`
    ///
    /// # Returns
    /// * `Option<Vec<u8>>` - `None` on a miss or on a read error
    pub fn get(&self, name: &str) -> Option<Vec<u8>> {
        let _clock = self.clock.read();

        match self.try_get(name) {
            Ok(Some(data)) => {
                self.stats.record_hit();
                debug!(bucket = %self.config.bucket, name, "cache hit");
                Some(data)
            }
            Ok(None) => {
                self.stats.record_miss();
                debug!(bucket = %self.config.bucket, name, "cache miss");
                None
            }
            Err(e) => {
                self.stats.record_miss();
                self.fail(Operation::Get, &e);
                None
            }
        }
    }

    fn try_get(&self, name: &str) -> Result<Option<Vec<u8>>> {
        match self.find(name)? {
            Some(entry) => Ok(Some(fs::read(&entry.path)?)),
            None => Ok(None),
        }
    }

    /// Delete every entry stored under `name`
    ///
    /// Afterwards the bucket directory is deleted if it is empty, and then the
    /// library directory if that is empty too.
    pub fn remove(&self, name: &str) {
        let _clock = self.clock.write();
        if let Err(e) = self.try_remove(name) {
            self.fail(Operation::Remove, &e);
        }
    }

    fn try_remove(&self, name: &str) -> Result<()> {
        validate_logical_name(name)?;

        let mut removed = 0;
        for entry in self.scan()?.iter().filter(|e| e.name == name) {
            remove_entry_file(&entry.path)?;
            removed += 1;
        }
        debug!(bucket = %self.config.bucket, name, removed, "removed entry");

        if remove_dir_if_empty(&self.bucket_dir)? {
            debug!(path = %self.bucket_dir.display(), "deleted empty bucket directory");
            if remove_dir_if_empty(&self.library_dir)? {
                debug!(path = %self.library_dir.display(), "deleted empty library directory");
            }
        }
        Ok(())
    }

    /// Delete the bucket directory with all its contents
    ///
    /// The library directory is deleted too if no other bucket remains.
    pub fn clear(&self) {
        let _clock = self.clock.write();
        if let Err(e) = self.try_clear() {
            self.fail(Operation::Clear, &e);
        }
    }

    fn try_clear(&self) -> Result<()> {
        match fs::remove_dir_all(&self.bucket_dir) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        remove_dir_if_empty(&self.library_dir)?;
        debug!(bucket = %self.config.bucket, "cleared cache bucket");
        Ok(())
    }

    /// Is there an entry stored under `name`?
    pub fn contains(&self, name: &str) -> bool {
        let _clock = self.clock.read();
        match self.find(name) {
            Ok(found) => found.is_some(),
            Err(e) => {
                self.fail(Operation::Get, &e);
                false
            }
        }
    }

    /// True if the bucket holds no entries or does not exist
    ///
    /// A listing failure is reported and counts as empty, matching what every
    /// lookup would see.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of entries in the bucket
    pub fn len(&self) -> usize {
        self.entries().len()
    }

    /// Logical names of all entries, most recently written first
    pub fn list_logical_names(&self) -> Vec<String> {
        let mut seen = AHashSet::new();
        self.entries()
            .into_iter()
            .filter(|e| seen.insert(e.name.clone()))
            .map(|e| e.name)
            .collect()
    }

    fn entries(&self) -> Vec<Entry> {
        let _clock = self.clock.read();
        self.scan().unwrap_or_else(|e| {
            self.fail(Operation::List, &e);
            Vec::new()
        })
    }

    /// Most recent entry for `name`
    fn find(&self, name: &str) -> Result<Option<Entry>> {
        validate_logical_name(name)?;
        Ok(self.scan()?.into_iter().find(|e| e.name == name))
    }

    /// List entries sorted by descending recency tag
    ///
    /// A missing bucket directory is an empty bucket. Files that do not parse
    /// as entries are skipped.
    fn scan(&self) -> Result<Vec<Entry>> {
        let read_dir = match fs::read_dir(&self.bucket_dir) {
            Ok(read_dir) => read_dir,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut entries = Vec::new();
        for dir_entry in read_dir {
            let dir_entry = dir_entry?;
            if !dir_entry.file_type()?.is_file() {
                continue;
            }

            let path = dir_entry.path();
            match Entry::from_path(&path) {
                Ok(entry) => entries.push(entry),
                Err(_) => debug!(path = %path.display(), "skipping non-entry file"),
            }
        }

        entries.sort_by(|a, b| b.tag.cmp(&a.tag).then_with(|| a.name.cmp(&b.name)));
        Ok(entries)
    }

    /// Hand a failure to the diagnostics sink
    ///
    /// Layers built on the engine use this to report their own swallowed
    /// failures to the same sink.
    pub fn record_failure(&self, op: Operation, error: &Error) {
        self.fail(op, error);
    }

    fn fail(&self, op: Operation, error: &Error) {
        self.stats.record_failure();
        self.diagnostics.record_failure(&self.config.bucket, op, error);
    }

    /// Bucket configuration
    pub fn config(&self) -> &BucketConfig {
        &self.config
    }

    /// Maximum number of entries kept
    pub fn max_entries(&self) -> usize {
        self.config.max_entries
    }

    /// `<root>/simple_storage`
    pub fn library_dir(&self) -> &Path {
        &self.library_dir
    }

    /// `<root>/simple_storage/<bucket>`
    pub fn bucket_dir(&self) -> &Path {
        &self.bucket_dir
    }

    /// Operation counters
    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }
}

/// Next recency tag: wall-clock millis, bumped past `last` when the clock
/// has not moved (or moved backwards)
///
/// Fails once `last` is `u64::MAX`; reusing it would tie with an existing entry.
fn next_tag(last: &mut u64) -> Result<u64> {
    let bumped = last
        .checked_add(1)
        .ok_or_else(|| Error::configuration("recency tag space exhausted"))?;
    let tag = now_millis().max(bumped);
    *last = tag;
    Ok(tag)
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

/// Delete an entry file; already gone counts as success
fn remove_entry_file(path: &Path) -> io::Result<()> {
    match fs::remove_file(path) {
        Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
        _ => Ok(()),
    }
}

/// Delete `dir` if it exists and is empty, returns whether it was deleted
fn remove_dir_if_empty(dir: &Path) -> io::Result<bool> {
    match fs::read_dir(dir) {
        Ok(mut read_dir) => {
            if read_dir.next().is_some() {
                return Ok(false);
            }
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(false),
        Err(e) => return Err(e),
    }

    match fs::remove_dir(dir) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}
