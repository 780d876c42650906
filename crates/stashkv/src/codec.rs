//! Value codecs
//!
//! - [`TextCodec`]: UTF-8 strings
//! - [`JsonCodec`]: any serde type as JSON
//! - [`CborCodec`]: any serde type as CBOR (compact binary)

use std::fmt;
use std::marker::PhantomData;

use serde::de::DeserializeOwned;
use serde::Serialize;
use stashfs::{Error, Result};

/// Converts values to and from the bytes stored in an entry
pub trait Codec<T> {
    /// Encode `value` into entry bytes
    fn encode(&self, value: &T) -> Result<Vec<u8>>;

    /// Decode entry bytes back into a value
    fn decode(&self, bytes: &[u8]) -> Result<T>;
}

/// UTF-8 text codec
///
/// Decoding replaces invalid sequences, so it never fails.
#[derive(Debug, Default, Clone, Copy)]
pub struct TextCodec;

impl Codec<String> for TextCodec {
    fn encode(&self, value: &String) -> Result<Vec<u8>> {
        Ok(value.as_bytes().to_vec())
    }

    fn decode(&self, bytes: &[u8]) -> Result<String> {
        Ok(String::from_utf8_lossy(bytes).into_owned())
    }
}

/// JSON codec backed by serde_json
pub struct JsonCodec<T> {
    pretty: bool,
    _marker: PhantomData<fn() -> T>,
}

impl<T> JsonCodec<T> {
    /// Compact JSON
    pub fn new() -> Self {
        Self {
            pretty: false,
            _marker: PhantomData,
        }
    }

    /// Indented JSON, easier to inspect on disk
    pub fn pretty() -> Self {
        Self {
            pretty: true,
            _marker: PhantomData,
        }
    }
}

impl<T> Default for JsonCodec<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for JsonCodec<T> {
    fn clone(&self) -> Self {
        Self {
            pretty: self.pretty,
            _marker: PhantomData,
        }
    }
}

impl<T> fmt::Debug for JsonCodec<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsonCodec").field("pretty", &self.pretty).finish()
    }
}

impl<T> Codec<T> for JsonCodec<T>
where
    T: Serialize + DeserializeOwned,
{
    fn encode(&self, value: &T) -> Result<Vec<u8>> {
        let encoded = if self.pretty {
            serde_json::to_vec_pretty(value)
        } else {
            serde_json::to_vec(value)
        };
        encoded.map_err(|e| Error::serialization(format!("JSON encode: {}", e)))
    }

    fn decode(&self, bytes: &[u8]) -> Result<T> {
        serde_json::from_slice(bytes).map_err(|e| Error::serialization(format!("JSON decode: {}", e)))
    }
}

/// Binary codec backed by ciborium
pub struct CborCodec<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> CborCodec<T> {
    /// Create a CBOR codec
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<T> Default for CborCodec<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for CborCodec<T> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for CborCodec<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CborCodec")
    }
}

impl<T> Codec<T> for CborCodec<T>
where
    T: Serialize + DeserializeOwned,
{
    fn encode(&self, value: &T) -> Result<Vec<u8>> {
        let mut bytes = Vec::new();
        ciborium::into_writer(value, &mut bytes)
            .map_err(|e| Error::serialization(format!("CBOR encode: {}", e)))?;
        Ok(bytes)
    }

    fn decode(&self, bytes: &[u8]) -> Result<T> {
        ciborium::from_reader(bytes).map_err(|e| Error::serialization(format!("CBOR decode: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct User {
        name: String,
        surname: String,
    }

    fn user() -> User {
        User {
            name: "Name".to_string(),
            surname: "Surname".to_string(),
        }
    }

    #[test]
    fn test_text_codec() {
        let codec = TextCodec;
        let bytes = codec.encode(&"héllo".to_string()).unwrap();

        assert_eq!(bytes, "héllo".as_bytes());
        assert_eq!(codec.decode(&bytes).unwrap(), "héllo");
    }

    #[test]
    fn test_text_codec_lossy_decode() {
        let decoded = TextCodec.decode(&[b'a', 0xff, b'b']).unwrap();
        assert_eq!(decoded, "a\u{FFFD}b");
    }

    #[test]
    fn test_json_encode_bytes() {
        let bytes = JsonCodec::<User>::new().encode(&user()).unwrap();
        assert_eq!(bytes, br#"{"name":"Name","surname":"Surname"}"#);
    }

    #[test]
    fn test_json_decode() {
        let decoded = JsonCodec::<User>::new()
            .decode(br#"{"name":"Name","surname":"Surname"}"#)
            .unwrap();
        assert_eq!(decoded, user());
    }

    #[test]
    fn test_json_pretty_decodes_with_compact() {
        let bytes = JsonCodec::<User>::pretty().encode(&user()).unwrap();

        assert!(bytes.contains(&b'\n'));
        assert_eq!(JsonCodec::<User>::new().decode(&bytes).unwrap(), user());
    }

    #[test]
    fn test_json_decode_malformed() {
        let result = JsonCodec::<User>::new().decode(b"{\"name\":");
        assert!(matches!(result, Err(Error::Serialization(_))));

        let result = JsonCodec::<User>::new().decode(br#"{"name": 5, "surname": "x"}"#);
        assert!(matches!(result, Err(Error::Serialization(_))));
    }

    #[test]
    fn test_cbor_codec() {
        let codec = CborCodec::<User>::new();
        let bytes = codec.encode(&user()).unwrap();

        assert!(!bytes.is_empty());
        assert_eq!(codec.decode(&bytes).unwrap(), user());
    }

    #[test]
    fn test_cbor_decode_corrupt() {
        let codec = CborCodec::<User>::new();
        let mut bytes = codec.encode(&user()).unwrap();
        bytes.truncate(bytes.len() / 2);

        assert!(matches!(codec.decode(&bytes), Err(Error::Serialization(_))));
    }
}
