//! Wire encoder.

use crate::error::{CodecError, CodecResult};
use crate::params::{Params, Row};
use crate::value::Value;
use crate::{FrameTag, MAX_PAYLOAD_LEN};
use bytes::{BufMut, BytesMut};

/// Encode a single value.
pub fn encode_value(value: &Value) -> CodecResult<Vec<u8>> {
    let mut encoder = Encoder::new();
    encoder.encode_value(value)?;
    Ok(encoder.into_bytes())
}

/// Encode a parameter set, including its shape discriminant.
pub fn encode_params(params: &Params) -> CodecResult<Vec<u8>> {
    let mut encoder = Encoder::new();
    encoder.encode_params(params)?;
    Ok(encoder.into_bytes())
}

/// Encode a result row.
pub fn encode_row(row: &Row) -> CodecResult<Vec<u8>> {
    let mut encoder = Encoder::with_capacity(4 + row.len() * 9);
    encoder.encode_row(row)?;
    Ok(encoder.into_bytes())
}

/// A streaming encoder writing into an owned buffer.
pub struct Encoder {
    buffer: BytesMut,
}

impl Encoder {
    /// Create a new encoder.
    pub fn new() -> Self {
        Self {
            buffer: BytesMut::new(),
        }
    }

    /// Create a new encoder with the specified capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: BytesMut::with_capacity(capacity),
        }
    }

    /// Encode a value: tag byte followed by its payload.
    pub fn encode_value(&mut self, value: &Value) -> CodecResult<()> {
        self.buffer.put_u8(value.value_type().tag());
        match value {
            Value::Null => {}
            Value::Integer(n) => self.buffer.put_i64(*n),
            Value::Real(r) => self.buffer.put_u64(r.to_bits()),
            Value::Text(s) => self.put_length_prefixed(s.as_bytes())?,
            Value::Blob(b) => self.put_length_prefixed(b)?,
        }
        Ok(())
    }

    /// Encode a parameter frame.
    pub fn encode_params(&mut self, params: &Params) -> CodecResult<()> {
        match params {
            Params::Positional(values) => {
                self.buffer.put_u8(FrameTag::Positional as u8);
                self.put_count(values.len())?;
                for value in values {
                    self.encode_value(value)?;
                }
            }
            Params::Named(map) => {
                self.buffer.put_u8(FrameTag::Named as u8);
                self.put_count(map.len())?;
                for (name, value) in map {
                    self.put_length_prefixed(name.as_bytes())?;
                    self.encode_value(value)?;
                }
            }
        }
        Ok(())
    }

    /// Encode a row: column count followed by the values.
    pub fn encode_row(&mut self, row: &Row) -> CodecResult<()> {
        self.put_count(row.len())?;
        for value in row.values() {
            self.encode_value(value)?;
        }
        Ok(())
    }

    /// Consume this encoder and return the encoded bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.buffer.to_vec()
    }

    /// Get a reference to the encoded bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer
    }

    fn put_count(&mut self, count: usize) -> CodecResult<()> {
        let count = u32::try_from(count)
            .map_err(|_| CodecError::encoding_failed(format!("count {count} exceeds u32")))?;
        self.buffer.put_u32(count);
        Ok(())
    }

    #[allow(clippy::cast_possible_truncation)]
    fn put_length_prefixed(&mut self, bytes: &[u8]) -> CodecResult<()> {
        let len = bytes.len() as u64;
        if len > MAX_PAYLOAD_LEN {
            return Err(CodecError::SizeLimitExceeded {
                claimed: len,
                max_allowed: MAX_PAYLOAD_LEN,
            });
        }
        // MAX_PAYLOAD_LEN fits in u32
        self.buffer.put_u32(len as u32);
        self.buffer.put_slice(bytes);
        Ok(())
    }
}

impl Default for Encoder {
    fn default() -> Self {
        Self::new()
    }
}
