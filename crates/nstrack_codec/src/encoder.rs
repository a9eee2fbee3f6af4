//! CBOR encoder.

use crate::error::{CodecError, CodecResult};
use ciborium::Value;
use serde::Serialize;

/// Encode any serde value to CBOR bytes.
///
/// The value is first lowered to a [`ciborium::Value`] tree so that floats can
/// be checked before anything is written; star histories are all about times
/// and a NaN in a persisted history would poison every later report.
///
/// # Errors
///
/// Returns [`CodecError::NonFiniteFloat`] if the value contains NaN or an
/// infinity, or [`CodecError::EncodingFailed`] if serde rejects it.
pub fn to_cbor<T: Serialize + ?Sized>(value: &T) -> CodecResult<Vec<u8>> {
    let tree = Value::serialized(value).map_err(CodecError::encoding_failed)?;
    ensure_finite(&tree)?;
    write_tree(&tree)
}

pub(crate) fn write_tree(tree: &Value) -> CodecResult<Vec<u8>> {
    let mut buffer = Vec::new();
    ciborium::into_writer(tree, &mut buffer).map_err(CodecError::encoding_failed)?;
    Ok(buffer)
}

/// Reject NaN and infinities anywhere in the tree.
pub(crate) fn ensure_finite(value: &Value) -> CodecResult<()> {
    match value {
        Value::Float(f) if !f.is_finite() => Err(CodecError::NonFiniteFloat),
        Value::Array(items) => items.iter().try_for_each(ensure_finite),
        Value::Map(pairs) => pairs.iter().try_for_each(|(key, value)| {
            ensure_finite(key)?;
            ensure_finite(value)
        }),
        Value::Tag(_, inner) => ensure_finite(inner),
        _ => Ok(()),
    }
}
