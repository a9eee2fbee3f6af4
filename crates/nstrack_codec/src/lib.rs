//! # nstrack Codec
//!
//! CBOR documents for persisted star histories.
//!
//! Histories are written through serde and [`ciborium`]. Every stored document
//! is wrapped in a small versioned envelope so that a history log written by an
//! older build is rejected instead of misread:
//!
//! ```text
//! { "v": FORMAT_VERSION, "body": <document> }
//! ```
//!
//! Floats must be finite; NaN and infinities are refused both on write and on
//! read.
//!
//! ## Usage
//!
//! ```
//! use nstrack_codec::{Decode, Encode};
//!
//! let times = vec![0.0f64, 1.25, 2.5];
//! let bytes = times.encode().unwrap();
//! let decoded = Vec::<f64>::decode(&bytes).unwrap();
//! assert_eq!(times, decoded);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod decoder;
mod encoder;
mod error;

pub use decoder::{decode_tree, from_cbor};
pub use encoder::to_cbor;
pub use error::{CodecError, CodecResult};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Version stamped into every document envelope.
pub const FORMAT_VERSION: u16 = 1;

#[derive(Serialize)]
struct EnvelopeRef<'a, T: ?Sized> {
    v: u16,
    body: &'a T,
}

#[derive(Deserialize)]
struct Envelope {
    v: u16,
    body: ciborium::Value,
}

/// Trait for types that are stored as versioned CBOR documents.
pub trait Encode {
    /// Encode this value inside a versioned envelope.
    fn encode(&self) -> CodecResult<Vec<u8>>;
}

/// Trait for types that are read back from versioned CBOR documents.
pub trait Decode: Sized {
    /// Decode this value from an enveloped document.
    fn decode(bytes: &[u8]) -> CodecResult<Self>;
}

impl<T: Serialize> Encode for T {
    fn encode(&self) -> CodecResult<Vec<u8>> {
        to_cbor(&EnvelopeRef {
            v: FORMAT_VERSION,
            body: self,
        })
    }
}

impl<T: DeserializeOwned> Decode for T {
    fn decode(bytes: &[u8]) -> CodecResult<Self> {
        let envelope: Envelope = from_cbor(bytes)?;
        if envelope.v != FORMAT_VERSION {
            return Err(CodecError::UnsupportedVersion {
                found: envelope.v,
                expected: FORMAT_VERSION,
            });
        }
        envelope
            .body
            .deserialized()
            .map_err(CodecError::decoding_failed)
    }
}
