//! Wire decoder.

use crate::error::{CodecError, CodecResult};
use crate::params::{Params, Row};
use crate::value::{Value, ValueType};
use crate::{FrameTag, MAX_PAYLOAD_LEN};
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

/// Decode a single value. The input must contain exactly one value.
pub fn decode_value(bytes: &[u8]) -> CodecResult<Value> {
    let mut decoder = Decoder::new(bytes);
    let value = decoder.decode_value()?;
    decoder.finish()?;
    Ok(value)
}

/// Decode a parameter frame. The input must contain exactly one frame.
pub fn decode_params(bytes: &[u8]) -> CodecResult<Params> {
    let mut decoder = Decoder::new(bytes);
    let params = decoder.decode_params()?;
    decoder.finish()?;
    Ok(params)
}

/// Decode a result row. The input must contain exactly one row.
pub fn decode_row(bytes: &[u8]) -> CodecResult<Row> {
    let mut decoder = Decoder::new(bytes);
    let row = decoder.decode_row()?;
    decoder.finish()?;
    Ok(row)
}

/// Smallest encoded value: a bare tag byte (`Null`).
const MIN_VALUE_LEN: usize = 1;

/// Smallest encoded named entry: empty name length plus a `Null`.
const MIN_NAMED_ENTRY_LEN: usize = 4 + MIN_VALUE_LEN;

/// A bounds-checked decoder over a borrowed byte slice.
///
/// Every read checks the remaining input first, and every declared length
/// or count is validated against the remaining input before anything is
/// allocated.
pub struct Decoder<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Decoder<'a> {
    /// Create a new decoder for the given bytes.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Decode the next value.
    pub fn decode_value(&mut self) -> CodecResult<Value> {
        let tag = self.read_u8()?;
        let ty = ValueType::from_tag(tag).ok_or(CodecError::UnknownValueTag { tag })?;
        match ty {
            ValueType::Null => Ok(Value::Null),
            ValueType::Integer => Ok(Value::Integer(i64::from_be_bytes(self.read_array()?))),
            ValueType::Real => Ok(Value::Real(f64::from_bits(u64::from_be_bytes(
                self.read_array()?,
            )))),
            ValueType::Text => {
                let bytes = self.read_length_prefixed()?;
                let text = std::str::from_utf8(bytes).map_err(|_| CodecError::InvalidUtf8)?;
                Ok(Value::Text(text.to_string()))
            }
            ValueType::Blob => Ok(Value::Blob(self.read_length_prefixed()?.to_vec())),
        }
    }

    /// Decode the next parameter frame.
    pub fn decode_params(&mut self) -> CodecResult<Params> {
        let tag = self.read_u8()?;
        if tag == FrameTag::Positional as u8 {
            let count = self.read_count(MIN_VALUE_LEN)?;
            let mut values = Vec::with_capacity(count);
            for _ in 0..count {
                values.push(self.decode_value()?);
            }
            Ok(Params::Positional(values))
        } else if tag == FrameTag::Named as u8 {
            let count = self.read_count(MIN_NAMED_ENTRY_LEN)?;
            let mut map = BTreeMap::new();
            for _ in 0..count {
                let name = self.read_length_prefixed()?;
                let name = std::str::from_utf8(name).map_err(|_| CodecError::InvalidUtf8)?;
                let value = self.decode_value()?;
                match map.entry(name.to_string()) {
                    Entry::Vacant(slot) => {
                        slot.insert(value);
                    }
                    Entry::Occupied(slot) => {
                        return Err(CodecError::DuplicateName {
                            name: slot.key().clone(),
                        });
                    }
                }
            }
            Ok(Params::Named(map))
        } else {
            Err(CodecError::UnknownFrameTag { tag })
        }
    }

    /// Decode the next row.
    pub fn decode_row(&mut self) -> CodecResult<Row> {
        let count = self.read_count(MIN_VALUE_LEN)?;
        let mut values = Vec::with_capacity(count);
        for _ in 0..count {
            values.push(self.decode_value()?);
        }
        Ok(Row::new(values))
    }

    /// Check if all bytes have been consumed.
    pub fn is_empty(&self) -> bool {
        self.pos >= self.data.len()
    }

    /// Get remaining bytes.
    pub fn remaining(&self) -> &[u8] {
        &self.data[self.pos..]
    }

    /// Fails if any input is left over.
    pub fn finish(&self) -> CodecResult<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(CodecError::TrailingBytes {
                remaining: self.data.len() - self.pos,
            })
        }
    }

    #[inline]
    fn read_u8(&mut self) -> CodecResult<u8> {
        let byte = *self.data.get(self.pos).ok_or(CodecError::UnexpectedEof)?;
        self.pos += 1;
        Ok(byte)
    }

    #[inline]
    fn read_bytes(&mut self, len: usize) -> CodecResult<&'a [u8]> {
        let end = self.pos.checked_add(len).ok_or(CodecError::UnexpectedEof)?;
        let bytes = self
            .data
            .get(self.pos..end)
            .ok_or(CodecError::UnexpectedEof)?;
        self.pos = end;
        Ok(bytes)
    }

    #[inline]
    fn read_array<const N: usize>(&mut self) -> CodecResult<[u8; N]> {
        let bytes = self.read_bytes(N)?;
        let mut out = [0u8; N];
        out.copy_from_slice(bytes);
        Ok(out)
    }

    #[inline]
    fn read_u32(&mut self) -> CodecResult<u32> {
        Ok(u32::from_be_bytes(self.read_array()?))
    }

    fn read_length_prefixed(&mut self) -> CodecResult<&'a [u8]> {
        let len = u64::from(self.read_u32()?);
        if len > MAX_PAYLOAD_LEN {
            return Err(CodecError::SizeLimitExceeded {
                claimed: len,
                max_allowed: MAX_PAYLOAD_LEN,
            });
        }
        let len = usize::try_from(len).map_err(|_| CodecError::UnexpectedEof)?;
        self.read_bytes(len)
    }

    /// Reads an element count and rejects counts the remaining input cannot
    /// possibly hold, given the smallest encoding of one element.
    fn read_count(&mut self, min_element_len: usize) -> CodecResult<usize> {
        let count = usize::try_from(self.read_u32()?)
            .map_err(|_| CodecError::invalid_structure("count does not fit in memory"))?;
        let remaining = self.data.len() - self.pos;
        if count.saturating_mul(min_element_len) > remaining {
            return Err(CodecError::invalid_structure(format!(
                "count {count} exceeds remaining input of {remaining} bytes"
            )));
        }
        Ok(count)
    }
}
