//! # stashkv
//!
//! Typed key-value storage on top of a [`stashfs::FileCache`] bucket.
//!
//! ## Architecture
//! - **KeyToName**: maps caller keys to logical entry names (identity, SHA-256)
//! - **Codec**: converts values to entry bytes (text, JSON, CBOR)
//! - **TypedStorage**: put/get/get_all/remove/clear over the bucket
//!
//! ```no_run
//! use stashfs::{BucketConfig, FileCache};
//! use stashkv::{Sha256Names, TextStorage};
//!
//! let cache = FileCache::open(BucketConfig::new("/var/lib/app", "users_cache", 5))?;
//! let users = TextStorage::text(cache, Sha256Names);
//!
//! users.put("user_1", &"Alice".to_string())?;
//! assert_eq!(users.get("user_1")?.as_deref(), Some("Alice"));
//! # Ok::<(), stashfs::Error>(())
//! ```

#![warn(missing_docs)]

mod codec;
mod naming;
mod storage;

pub use codec::{CborCodec, Codec, JsonCodec, TextCodec};
pub use naming::{IdentityNames, KeyToName, Sha256Names};
pub use storage::{CborStorage, JsonStorage, TextStorage, TypedStorage};
pub use stashfs::{Error, Result};
