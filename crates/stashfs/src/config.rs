//! Bucket configuration

use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Name of the directory shared by all buckets under a root
pub const LIBRARY_DIR_NAME: &str = "simple_storage";

/// Where a bucket lives and how many entries it may hold
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketConfig {
    /// Caller-supplied root, usually an app-private directory
    pub root: PathBuf,
    /// Bucket directory name, distinguishes sibling caches
    pub bucket: String,
    /// Maximum number of entries kept in the bucket
    pub max_entries: usize,
}

impl BucketConfig {
    /// Create a bucket config
    pub fn new(root: impl Into<PathBuf>, bucket: impl Into<String>, max_entries: usize) -> Self {
        Self {
            root: root.into(),
            bucket: bucket.into(),
            max_entries,
        }
    }

    /// Reject configurations the engine cannot honor
    pub fn validate(&self) -> Result<()> {
        if self.max_entries == 0 {
            return Err(Error::configuration("max_entries must be at least 1"));
        }

        let mut components = Path::new(&self.bucket).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(_)), None) => Ok(()),
            _ => Err(Error::configuration(format!(
                "bucket name {:?} must be a single directory name",
                self.bucket
            ))),
        }
    }

    /// `<root>/simple_storage`
    pub fn library_dir(&self) -> PathBuf {
        self.root.join(LIBRARY_DIR_NAME)
    }

    /// `<root>/simple_storage/<bucket>`
    pub fn bucket_dir(&self) -> PathBuf {
        self.library_dir().join(&self.bucket)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths() {
        let config = BucketConfig::new("/data/app", "users_cache", 3);

        assert_eq!(config.library_dir(), PathBuf::from("/data/app/simple_storage"));
        assert_eq!(config.bucket_dir(), PathBuf::from("/data/app/simple_storage/users_cache"));
    }

    #[test]
    fn test_validate_ok() {
        assert!(BucketConfig::new("/data", "users_cache", 1).validate().is_ok());
    }

    #[test]
    fn test_validate_zero_entries() {
        let result = BucketConfig::new("/data", "users_cache", 0).validate();
        assert!(matches!(result, Err(Error::Configuration(_))));
    }

    #[test]
    fn test_validate_bucket_name() {
        for bucket in ["", ".", "..", "a/b", "/abs"] {
            let result = BucketConfig::new("/data", bucket, 3).validate();
            assert!(
                matches!(result, Err(Error::Configuration(_))),
                "{:?} should be rejected",
                bucket
            );
        }
    }

    #[test]
    fn test_deserialize_from_json() {
        let json = r#"{"root": "/data/app", "bucket": "users_cache", "max_entries": 5}"#;
        let config: BucketConfig = serde_json::from_str(json).unwrap();

        assert_eq!(config, BucketConfig::new("/data/app", "users_cache", 5));
    }
}
