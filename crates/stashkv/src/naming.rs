//! Key-to-name strategies
//!
//! A strategy turns a caller key into the logical name the engine stores the
//! entry under. `None` or an empty name is a misconfigured strategy and is
//! rejected by [`TypedStorage`](crate::TypedStorage).

use sha2::{Digest, Sha256};

/// Maps caller keys to logical entry names
pub trait KeyToName {
    /// Logical name for `key`
    fn generate(&self, key: &str) -> Option<String>;
}

/// Uses the key as the name
///
/// Keys must then be valid file names themselves.
#[derive(Debug, Default, Clone, Copy)]
pub struct IdentityNames;

impl KeyToName for IdentityNames {
    fn generate(&self, key: &str) -> Option<String> {
        Some(key.to_string())
    }
}

/// Uppercase hex SHA-256 of the key's UTF-8 bytes (64 characters)
#[derive(Debug, Default, Clone, Copy)]
pub struct Sha256Names;

impl KeyToName for Sha256Names {
    fn generate(&self, key: &str) -> Option<String> {
        Some(hex::encode_upper(Sha256::digest(key.as_bytes())))
    }
}

impl<F> KeyToName for F
where
    F: Fn(&str) -> Option<String>,
{
    fn generate(&self, key: &str) -> Option<String> {
        self(key)
    }
}
