//! In-memory storage backend.

use crate::backend::StorageBackend;
use crate::error::{StorageError, StorageResult};
use parking_lot::RwLock;

/// A storage backend that keeps the history log in a `Vec<u8>`.
///
/// Used by unit tests and by `nstrack ingest --dry-run` style flows where
/// nothing should touch disk.
///
/// # Example
///
/// ```rust
/// use nstrack_storage::{StorageBackend, InMemoryBackend};
///
/// let mut backend = InMemoryBackend::new();
/// assert_eq!(backend.append(b"bev.82").unwrap(), 0);
/// assert_eq!(backend.size().unwrap(), 6);
/// ```
#[derive(Debug, Default)]
pub struct InMemoryBackend {
    data: RwLock<Vec<u8>>,
}

impl InMemoryBackend {
    /// Creates a new empty in-memory backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a backend preloaded with `data`, e.g. a log with a torn tail.
    #[must_use]
    pub fn with_data(data: Vec<u8>) -> Self {
        Self {
            data: RwLock::new(data),
        }
    }

    /// Returns a copy of every stored byte.
    #[must_use]
    pub fn data(&self) -> Vec<u8> {
        self.data.read().clone()
    }
}

impl StorageBackend for InMemoryBackend {
    fn read_at(&self, offset: u64, len: usize) -> StorageResult<Vec<u8>> {
        let data = self.data.read();
        let size = data.len() as u64;
        usize::try_from(offset)
            .ok()
            .and_then(|start| data.get(start..start.checked_add(len)?))
            .map(<[u8]>::to_vec)
            .ok_or(StorageError::ReadPastEnd { offset, len, size })
    }

    fn append(&mut self, bytes: &[u8]) -> StorageResult<u64> {
        let data = self.data.get_mut();
        let offset = data.len() as u64;
        data.extend_from_slice(bytes);
        Ok(offset)
    }

    fn flush(&mut self) -> StorageResult<()> {
        Ok(())
    }

    fn size(&self) -> StorageResult<u64> {
        Ok(self.data.read().len() as u64)
    }

    fn sync(&mut self) -> StorageResult<()> {
        Ok(())
    }

    fn truncate(&mut self, new_size: u64) -> StorageResult<()> {
        let data = self.data.get_mut();
        match usize::try_from(new_size) {
            Ok(len) if len <= data.len() => {
                data.truncate(len);
                Ok(())
            }
            _ => Err(StorageError::TruncateBeyondEnd {
                requested: new_size,
                size: data.len() as u64,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_returns_running_offset() {
        let mut backend = InMemoryBackend::new();
        assert_eq!(backend.append(b"save01").unwrap(), 0);
        assert_eq!(backend.append(b"save02").unwrap(), 6);
        assert_eq!(backend.size().unwrap(), 12);
    }

    #[test]
    fn read_at_returns_slice() {
        let mut backend = InMemoryBackend::new();
        backend.append(b"sev.83_0.000").unwrap();
        assert_eq!(backend.read_at(0, 3).unwrap(), b"sev");
        assert_eq!(backend.read_at(7, 5).unwrap(), b"0.000");
    }

    #[test]
    fn read_past_end_fails() {
        let mut backend = InMemoryBackend::new();
        backend.append(b"esc").unwrap();
        assert!(matches!(
            backend.read_at(1, 10),
            Err(StorageError::ReadPastEnd { .. })
        ));
        assert!(matches!(
            backend.read_at(10, 0),
            Err(StorageError::ReadPastEnd { .. })
        ));
    }

    #[test]
    fn read_all_on_empty_backend() {
        let backend = InMemoryBackend::new();
        assert!(backend.read_all().unwrap().is_empty());
    }

    #[test]
    fn truncate_drops_tail() {
        let mut backend = InMemoryBackend::with_data(b"record+torn".to_vec());
        backend.truncate(6).unwrap();
        assert_eq!(backend.read_all().unwrap(), b"record");
    }

    #[test]
    fn truncate_cannot_grow() {
        let mut backend = InMemoryBackend::with_data(b"abc".to_vec());
        assert!(matches!(
            backend.truncate(4),
            Err(StorageError::TruncateBeyondEnd {
                requested: 4,
                size: 3
            })
        ));
    }
}
