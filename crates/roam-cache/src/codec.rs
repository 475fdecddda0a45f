//! Value codecs: symmetric encode/decode between application values and the
//! opaque byte payloads stored in the cache.
//!
//! The cache itself only ever sees bytes. What those bytes mean is fixed by a
//! [`ValueCodec`] chosen at the call site: [`RawCodec`] for callers that bring
//! their own serialization, [`JsonCodec`] for serde types, and [`Base64Codec`]
//! as a text-safe wrapper for backends or transports that require printable
//! payloads.

use std::marker::PhantomData;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::CodecError;

/// Symmetric value codec. For every supported value,
/// `decode(encode(v)) == v`; decoding malformed or truncated bytes returns an
/// error, never a partial value.
pub trait ValueCodec: Send + Sync {
    /// The application value type this codec handles.
    type Value;

    fn encode(&self, value: &Self::Value) -> Result<Vec<u8>, CodecError>;

    fn decode(&self, bytes: &[u8]) -> Result<Self::Value, CodecError>;
}

/// Identity codec over opaque bytes, for callers that serialize themselves.
#[derive(Debug, Clone, Copy, Default)]
pub struct RawCodec;

impl ValueCodec for RawCodec {
    type Value = Vec<u8>;

    fn encode(&self, value: &Vec<u8>) -> Result<Vec<u8>, CodecError> {
        Ok(value.clone())
    }

    fn decode(&self, bytes: &[u8]) -> Result<Vec<u8>, CodecError> {
        Ok(bytes.to_vec())
    }
}

/// JSON codec for any serde-serializable value type.
#[derive(Debug)]
pub struct JsonCodec<T> {
    _value: PhantomData<fn() -> T>,
}

impl<T> JsonCodec<T> {
    pub fn new() -> Self {
        Self {
            _value: PhantomData,
        }
    }
}

impl<T> Default for JsonCodec<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ValueCodec for JsonCodec<T>
where
    T: Serialize + DeserializeOwned,
{
    type Value = T;

    fn encode(&self, value: &T) -> Result<Vec<u8>, CodecError> {
        Ok(serde_json::to_vec(value)?)
    }

    fn decode(&self, bytes: &[u8]) -> Result<T, CodecError> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

/// Text-safe wrapper: runs the inner codec, then base64 so the payload stays
/// within a printable alphabet.
#[derive(Debug, Clone, Copy, Default)]
pub struct Base64Codec<C> {
    inner: C,
}

impl<C> Base64Codec<C> {
    pub fn new(inner: C) -> Self {
        Self { inner }
    }
}

impl<C: ValueCodec> ValueCodec for Base64Codec<C> {
    type Value = C::Value;

    fn encode(&self, value: &C::Value) -> Result<Vec<u8>, CodecError> {
        let raw = self.inner.encode(value)?;
        Ok(BASE64.encode(raw).into_bytes())
    }

    fn decode(&self, bytes: &[u8]) -> Result<C::Value, CodecError> {
        let text = std::str::from_utf8(bytes)?;
        let raw = BASE64.decode(text)?;
        self.inner.decode(&raw)
    }
}
