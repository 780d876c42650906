//! TypedStorage: typed map over a FileCache bucket

use std::marker::PhantomData;

use serde::de::DeserializeOwned;
use serde::Serialize;
use stashfs::{validate_logical_name, Error, FileCache, Operation, Result};
use tracing::debug;

use crate::codec::{CborCodec, Codec, JsonCodec, TextCodec};
use crate::naming::KeyToName;

/// Typed storage layer combining a key-to-name strategy and a codec with a
/// [`FileCache`] bucket
///
/// Configuration and serialization errors are returned to the caller.
/// I/O failures stay inside the engine and show up as misses.
pub struct TypedStorage<T, N, C> {
    /// Underlying bucket
    cache: FileCache,

    /// Key to logical name strategy
    names: N,

    /// Value codec
    codec: C,

    _marker: PhantomData<fn() -> T>,
}

/// Storage for plain strings
pub type TextStorage<N> = TypedStorage<String, N, TextCodec>;

/// Storage for serde types encoded as JSON
pub type JsonStorage<T, N> = TypedStorage<T, N, JsonCodec<T>>;

/// Storage for serde types encoded as CBOR
pub type CborStorage<T, N> = TypedStorage<T, N, CborCodec<T>>;

impl<T, N, C> TypedStorage<T, N, C>
where
    N: KeyToName,
    C: Codec<T>,
{
    /// Create a typed storage
    ///
    /// # Arguments
    /// * `cache` - Bucket the entries are written to
    /// * `names` - Key to logical name strategy
    /// * `codec` - Value encoder/decoder
    pub fn new(cache: FileCache, names: N, codec: C) -> Self {
        Self {
            cache,
            names,
            codec,
            _marker: PhantomData,
        }
    }

    /// Store `value` under `key`, replacing any previous value
    ///
    /// # Errors
    /// * `Error::Configuration` - the generated name or the encoded payload is empty
    /// * `Error::Serialization` - the codec could not encode `value`
    pub fn put(&self, key: &str, value: &T) -> Result<()> {
        let name = self.resolve(key)?;
        let bytes = self.codec.encode(value)?;
        if bytes.is_empty() {
            return Err(Error::configuration(format!(
                "encoded value for key {:?} is empty",
                key
            )));
        }

        self.cache.put(&name, &bytes);
        Ok(())
    }

    /// Store every `(key, value)` pair in order
    ///
    /// Stops at the first error; pairs stored before it stay stored.
    pub fn put_all<'a, I>(&self, entries: I) -> Result<()>
    where
        I: IntoIterator<Item = (&'a str, &'a T)>,
        T: 'a,
    {
        for (key, value) in entries {
            self.put(key, value)?;
        }
        Ok(())
    }

    /// Get the value stored under `key`
    ///
    /// # Returns
    /// * `Ok(None)` - nothing stored (or the entry could not be read)
    ///
    /// # Errors
    /// * `Error::Configuration` - the generated name is empty
    /// * `Error::Serialization` - the stored bytes do not decode
    pub fn get(&self, key: &str) -> Result<Option<T>> {
        let name = self.resolve(key)?;
        match self.cache.get(&name) {
            Some(bytes) => self.codec.decode(&bytes).map(Some),
            None => Ok(None),
        }
    }

    /// All stored values, most recently written first
    ///
    /// Entries that disappear while iterating or fail to decode are skipped and
    /// reported to the bucket's diagnostics sink, so the result may be shorter
    /// than [`len`](Self::len).
    pub fn get_all(&self) -> Vec<T> {
        let names = self.cache.list_logical_names();
        let mut values = Vec::with_capacity(names.len());

        for name in &names {
            let Some(bytes) = self.cache.get(name) else {
                continue;
            };
            match self.codec.decode(&bytes) {
                Ok(value) => values.push(value),
                Err(e) => {
                    debug!(name = %name, "skipping undecodable entry");
                    self.cache.record_failure(Operation::Decode, &e);
                }
            }
        }

        values
    }

    /// Delete the value stored under `key`
    pub fn remove(&self, key: &str) -> Result<()> {
        let name = self.resolve(key)?;
        self.cache.remove(&name);
        Ok(())
    }

    /// Delete every stored value
    pub fn clear(&self) {
        self.cache.clear();
    }

    /// Is a value stored under `key`?
    pub fn contains(&self, key: &str) -> Result<bool> {
        let name = self.resolve(key)?;
        Ok(self.cache.contains(&name))
    }

    /// True if nothing is stored
    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    /// Number of stored entries
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    /// Underlying bucket
    pub fn cache(&self) -> &FileCache {
        &self.cache
    }

    /// Key to name strategy
    pub fn names(&self) -> &N {
        &self.names
    }

    /// Value codec
    pub fn codec(&self) -> &C {
        &self.codec
    }

    /// Generated names must be a single file name component, or the engine
    /// would drop the write
    fn resolve(&self, key: &str) -> Result<String> {
        let name = match self.names.generate(key) {
            Some(name) if !name.is_empty() => name,
            _ => {
                return Err(Error::configuration(format!(
                    "generated file name for key {:?} is empty",
                    key
                )))
            }
        };
        validate_logical_name(&name)?;
        Ok(name)
    }
}

impl<N: KeyToName> TypedStorage<String, N, TextCodec> {
    /// String storage
    pub fn text(cache: FileCache, names: N) -> Self {
        Self::new(cache, names, TextCodec)
    }
}

impl<T, N> TypedStorage<T, N, JsonCodec<T>>
where
    T: Serialize + DeserializeOwned,
    N: KeyToName,
{
    /// JSON storage for a serde type
    pub fn json(cache: FileCache, names: N) -> Self {
        Self::new(cache, names, JsonCodec::new())
    }
}

impl<T, N> TypedStorage<T, N, CborCodec<T>>
where
    T: Serialize + DeserializeOwned,
    N: KeyToName,
{
    /// CBOR storage for a serde type
    pub fn cbor(cache: FileCache, names: N) -> Self {
        Self::new(cache, names, CborCodec::new())
    }
}
