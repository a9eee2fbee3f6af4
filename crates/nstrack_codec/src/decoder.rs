//! CBOR decoder.

use crate::encoder::ensure_finite;
use crate::error::{CodecError, CodecResult};
use ciborium::Value;
use serde::de::DeserializeOwned;

/// Decode a single CBOR item into a [`ciborium::Value`] tree.
///
/// # Errors
///
/// Returns an error if the bytes are not one complete CBOR item, carry
/// trailing bytes, or contain a non-finite float.
pub fn decode_tree(bytes: &[u8]) -> CodecResult<Value> {
    let mut reader = bytes;
    let tree: Value = ciborium::from_reader(&mut reader).map_err(CodecError::decoding_failed)?;
    if !reader.is_empty() {
        return Err(CodecError::TrailingBytes(reader.len()));
    }
    ensure_finite(&tree)?;
    Ok(tree)
}

/// Decode CBOR bytes into any deserializable type.
///
/// # Errors
///
/// See [`decode_tree`]; additionally fails if the tree does not match `T`.
pub fn from_cbor<T: DeserializeOwned>(bytes: &[u8]) -> CodecResult<T> {
    decode_tree(bytes)?
        .deserialized()
        .map_err(CodecError::decoding_failed)
}
