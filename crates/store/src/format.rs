//! Record serialization formats
//!
//! A format turns a value into the bytes inside a record's compression
//! envelope and back. The store is generic over [`Format`], so each store
//! instance picks its own.

use crate::{Error, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;

/// Serialize/deserialize capability of a result store
pub trait Format: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Encode a value
    ///
    /// # Errors
    ///
    /// Returns a serialization error if the value cannot be encoded
    fn serialize<T: Serialize + ?Sized>(&self, value: &T) -> Result<Vec<u8>>;

    /// Decode a value
    ///
    /// # Errors
    ///
    /// Returns a serialization error if the bytes do not decode as `T`
    fn deserialize<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T>;
}

/// MessagePack with named struct fields (the default format)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MessagePack;

impl Format for MessagePack {
    fn name(&self) -> &'static str {
        "msgpack"
    }

    fn serialize<T: Serialize + ?Sized>(&self, value: &T) -> Result<Vec<u8>> {
        rmp_serde::to_vec_named(value)
            .map_err(|e| Error::serialization(format!("Failed to encode MessagePack: {e}")))
    }

    fn deserialize<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T> {
        rmp_serde::from_slice(bytes)
            .map_err(|e| Error::serialization(format!("Failed to decode MessagePack: {e}")))
    }
}

/// JSON, for records that should stay inspectable after decompression
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Json;

impl Format for Json {
    fn name(&self) -> &'static str {
        "json"
    }

    fn serialize<T: Serialize + ?Sized>(&self, value: &T) -> Result<Vec<u8>> {
        serde_json::to_vec(value)
            .map_err(|e| Error::serialization(format!("Failed to encode JSON: {e}")))
    }

    fn deserialize<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T> {
        serde_json::from_slice(bytes)
            .map_err(|e| Error::serialization(format!("Failed to decode JSON: {e}")))
    }
}
