use bytes::{BufMut, Bytes, BytesMut};
use serde_json::Value;

use crate::error::{FrameError, Result};

/// A brace-balanced byte range cut from the stream.
///
/// A frame is only a candidate message: its braces balance, but the bytes
/// may still fail to parse as JSON.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    bytes: Bytes,
}

impl Frame {
    /// Create a frame from raw bytes.
    pub fn new(bytes: impl Into<Bytes>) -> Self {
        Self {
            bytes: bytes.into(),
        }
    }

    /// The raw frame bytes, closing brace included.
    pub fn as_bytes(&self) -> &[u8] {
        self.bytes.as_ref()
    }

    /// Number of bytes the frame occupied in the stream.
    pub fn wire_size(&self) -> usize {
        self.bytes.len()
    }

    /// Consume the frame and return its bytes.
    pub fn into_bytes(self) -> Bytes {
        self.bytes
    }

    /// Parse the frame as a JSON text.
    pub fn decode(&self) -> Result<Message> {
        let value = serde_json::from_slice(&self.bytes).map_err(|source| FrameError::Decode {
            len: self.bytes.len(),
            source,
        })?;
        Ok(Message {
            value,
            raw: self.bytes.clone(),
        })
    }
}

/// A decoded JSON message and the frame bytes it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    value: Value,
    raw: Bytes,
}

impl Message {
    /// Build a message from an already decoded value.
    ///
    /// The raw bytes are the compact encoding of `value`.
    pub fn from_value(value: Value) -> Self {
        let raw = Bytes::from(value.to_string());
        Self { value, raw }
    }

    /// The decoded JSON value.
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Consume the message and return the decoded value.
    pub fn into_value(self) -> Value {
        self.value
    }

    /// The frame bytes exactly as received.
    pub fn raw(&self) -> &[u8] {
        self.raw.as_ref()
    }

    /// Number of bytes the message occupied in the stream.
    pub fn wire_size(&self) -> usize {
        self.raw.len()
    }

    /// The top-level `"type"` field, when it is a string.
    pub fn message_type(&self) -> Option<&str> {
        self.value.get("type").and_then(Value::as_str)
    }
}

/// Encode a value as compact JSON text into `dst`.
///
/// No separator is appended: the receiving side frames by brace depth.
pub fn encode_message(value: &Value, dst: &mut BytesMut) -> Result<()> {
    let encoded = serde_json::to_vec(value).map_err(FrameError::Encode)?;
    dst.reserve(encoded.len());
    dst.put_slice(&encoded);
    Ok(())
}
