//! # sqlbridge codec
//!
//! Typed SQL values and the byte encoding used to pass statement
//! parameters in and result rows out across the engine boundary.
//!
//! ## Wire Format
//!
//! All multi-byte integers are big-endian.
//!
//! - A value is a tag byte followed by its payload: `Integer` (1) and
//!   `Real` (2) carry 8 fixed bytes, `Text` (3) and `Blob` (4) carry a u32
//!   length and that many bytes, `Null` (5) carries nothing.
//! - A parameter frame is a shape byte (`Positional` = 1, `Named` = 2), a
//!   u32 count, then the values; named entries prefix each value with a
//!   length-prefixed UTF-8 name.
//! - A row is a u32 column count followed by the values.
//!
//! Decoding never panics: truncated input, unknown tags, bad UTF-8,
//! duplicate names, oversized lengths and trailing bytes are all reported
//! as [`CodecError`].
//!
//! ## Usage
//!
//! ```
//! use sqlbridge_codec::{decode_params, encode_params, Params, Value};
//!
//! let params = Params::named([("id", Value::Integer(7))]);
//! let bytes = encode_params(&params).unwrap();
//! assert_eq!(decode_params(&bytes).unwrap(), params);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod decoder;
mod encoder;
mod error;
mod params;
mod value;

pub use decoder::{decode_params, decode_row, decode_value, Decoder};
pub use encoder::{encode_params, encode_row, encode_value, Encoder};
pub use error::{CodecError, CodecResult};
pub use params::{Params, Row};
pub use value::{Value, ValueType};

/// Maximum length of a single text or blob payload (256 MiB).
pub const MAX_PAYLOAD_LEN: u64 = 256 * 1024 * 1024;

/// Shape discriminant of a parameter frame.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameTag {
    /// Ordered values.
    Positional = 1,
    /// Name to value pairs.
    Named = 2,
}

/// Trait for types that can be encoded to wire bytes.
pub trait Encode {
    /// Encode this value to bytes.
    fn encode(&self) -> CodecResult<Vec<u8>>;
}

/// Trait for types that can be decoded from wire bytes.
pub trait Decode: Sized {
    /// Decode this value from bytes.
    fn decode(bytes: &[u8]) -> CodecResult<Self>;
}

impl Encode for Value {
    fn encode(&self) -> CodecResult<Vec<u8>> {
        encode_value(self)
    }
}

impl Decode for Value {
    fn decode(bytes: &[u8]) -> CodecResult<Self> {
        decode_value(bytes)
    }
}

impl Encode for Params {
    fn encode(&self) -> CodecResult<Vec<u8>> {
        encode_params(self)
    }
}

impl Decode for Params {
    fn decode(bytes: &[u8]) -> CodecResult<Self> {
        decode_params(bytes)
    }
}

impl Encode for Row {
    fn encode(&self) -> CodecResult<Vec<u8>> {
        encode_row(self)
    }
}

impl Decode for Row {
    fn decode(bytes: &[u8]) -> CodecResult<Self> {
        decode_row(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn arb_value() -> impl Strategy<Value = Value> {
        prop_oneof![
            Just(Value::Null),
            any::<i64>().prop_map(Value::Integer),
            any::<f64>().prop_map(Value::Real),
            any::<u64>().prop_map(|bits| Value::Real(f64::from_bits(bits))),
            ".{0,32}".prop_map(Value::Text),
            proptest::collection::vec(any::<u8>(), 0..64).prop_map(Value::Blob),
        ]
    }

    fn arb_params() -> impl Strategy<Value = Params> {
        prop_oneof![
            proptest::collection::vec(arb_value(), 0..8).prop_map(Params::Positional),
            proptest::collection::btree_map(".{0,12}", arb_value(), 0..8).prop_map(Params::Named),
        ]
    }

    proptest! {
        #[test]
        fn value_roundtrip(value in arb_value()) {
            let bytes = value.encode().unwrap();
            prop_assert_eq!(Value::decode(&bytes).unwrap(), value);
        }

        #[test]
        fn params_roundtrip(params in arb_params()) {
            let bytes = params.encode().unwrap();
            prop_assert_eq!(Params::decode(&bytes).unwrap(), params);
        }

        #[test]
        fn row_roundtrip(values in proptest::collection::vec(arb_value(), 0..16)) {
            let row = Row::new(values);
            let bytes = row.encode().unwrap();
            prop_assert_eq!(Row::decode(&bytes).unwrap(), row);
        }

        #[test]
        fn arbitrary_bytes_never_panic(bytes in proptest::collection::vec(any::<u8>(), 0..128)) {
            let _ = decode_value(&bytes);
            let _ = decode_params(&bytes);
            let _ = decode_row(&bytes);
        }
    }

    #[test]
    fn empty_named_and_positional_frames_differ() {
        let positional = encode_params(&Params::Positional(vec![])).unwrap();
        let named = encode_params(&Params::Named(Default::default())).unwrap();
        assert_ne!(positional, named);
        assert_eq!(decode_params(&positional).unwrap(), Params::empty());
        assert_eq!(
            decode_params(&named).unwrap(),
            Params::Named(Default::default())
        );
    }
}
