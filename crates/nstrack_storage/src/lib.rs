//! # nstrack Storage
//!
//! Byte-store backends underneath the nstrack history log.
//!
//! Backends are **opaque append-only byte stores**. They know nothing about
//! star histories, record framing or CBOR; the history store in
//! `nstrack_core` owns every byte it writes.
//!
//! ## Available Backends
//!
//! - [`InMemoryBackend`] - For tests and throwaway runs
//! - [`FileBackend`] - A single file, exclusively locked while open
//!
//! ## Example
//!
//! ```rust
//! use nstrack_storage::{StorageBackend, InMemoryBackend};
//!
//! let mut backend = InMemoryBackend::new();
//! let offset = backend.append(b"save01").unwrap();
//! assert_eq!(backend.read_at(offset, 6).unwrap(), b"save01");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod error;
mod file;
mod memory;

pub use backend::StorageBackend;
pub use error::{StorageError, StorageResult};
pub use file::FileBackend;
pub use memory::InMemoryBackend;
