//! History log record framing.
//!
//! ```text
//! | len: u32 LE | kind: u8 | run_len: u16 LE | run | payload | crc32: u32 LE |
//!               \_________________ len bytes ________________/
//! ```
//!
//! The checksum covers the length field and the body. Bodies are capped at
//! [`MAX_BODY_LEN`] so a damaged length field cannot pass for a record that
//! was cut short.

use crate::error::{CoreError, CoreResult};

/// Bytes before the body.
pub(crate) const LEN_SIZE: usize = 4;

/// Bytes after the body.
pub(crate) const CRC_SIZE: usize = 4;

/// `kind` plus `run_len`.
const BODY_HEADER_SIZE: usize = 3;

/// Largest body a record may carry.
pub(crate) const MAX_BODY_LEN: usize = 1 << 24;

/// What a record does to its run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub(crate) enum RecordKind {
    /// One encoded star history.
    Document = 1,
    /// Drops every earlier document of the run.
    Tombstone = 2,
}

impl RecordKind {
    fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            1 => Some(Self::Document),
            2 => Some(Self::Tombstone),
            _ => None,
        }
    }
}

/// A record as it sits in the log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct LogRecord {
    pub kind: RecordKind,
    pub run: String,
    pub payload: Vec<u8>,
}

impl LogRecord {
    pub fn document(run: &str, payload: Vec<u8>) -> Self {
        Self {
            kind: RecordKind::Document,
            run: run.to_string(),
            payload,
        }
    }

    pub fn tombstone(run: &str) -> Self {
        Self {
            kind: RecordKind::Tombstone,
            run: run.to_string(),
            payload: Vec::new(),
        }
    }

    /// Offset of the payload relative to the start of the record.
    pub fn payload_offset(&self) -> usize {
        LEN_SIZE + BODY_HEADER_SIZE + self.run.len()
    }

    /// Appends the framed record to `out`.
    pub fn encode_into(&self, out: &mut Vec<u8>) -> CoreResult<()> {
        let run_len = u16::try_from(self.run.len()).map_err(|_| CoreError::RecordTooLarge {
            what: "run name",
            len: self.run.len(),
            limit: usize::from(u16::MAX),
        })?;
        let body_len = BODY_HEADER_SIZE + self.run.len() + self.payload.len();
        if body_len > MAX_BODY_LEN {
            return Err(CoreError::RecordTooLarge {
                what: "record body",
                len: body_len,
                limit: MAX_BODY_LEN,
            });
        }
        let len = body_len as u32;

        let start = out.len();
        out.reserve(LEN_SIZE + body_len + CRC_SIZE);
        out.extend_from_slice(&len.to_le_bytes());
        out.push(self.kind as u8);
        out.extend_from_slice(&run_len.to_le_bytes());
        out.extend_from_slice(self.run.as_bytes());
        out.extend_from_slice(&self.payload);

        let crc = crc32(&out[start..]);
        out.extend_from_slice(&crc.to_le_bytes());
        Ok(())
    }

    /// Decodes the record starting at `buf[0]`.
    ///
    /// Returns `Ok(None)` when `buf` ends before the record does, and the
    /// record plus its framed size otherwise. A partial record whose length
    /// or kind could never have been written is an error, not `None`.
    /// `offset` is only used for error messages.
    pub fn decode(buf: &[u8], offset: u64) -> CoreResult<Option<(Self, usize)>> {
        let Some(len_bytes) = buf.get(..LEN_SIZE) else {
            return Ok(None);
        };
        let len = u32::from_le_bytes([len_bytes[0], len_bytes[1], len_bytes[2], len_bytes[3]]) as usize;
        if len > MAX_BODY_LEN {
            return Err(CoreError::store_corruption(
                offset,
                format!("record length {len} exceeds the limit of {MAX_BODY_LEN}"),
            ));
        }
        let total = LEN_SIZE + len + CRC_SIZE;
        if buf.len() < total {
            if let Some(&kind) = buf.get(LEN_SIZE) {
                if RecordKind::from_byte(kind).is_none() {
                    return Err(CoreError::store_corruption(offset, format!("unknown record kind {kind}")));
                }
            }
            return Ok(None);
        }

        let framed = &buf[..LEN_SIZE + len];
        let stored = &buf[LEN_SIZE + len..total];
        let expected = u32::from_le_bytes([stored[0], stored[1], stored[2], stored[3]]);
        let actual = crc32(framed);
        if expected != actual {
            return Err(CoreError::ChecksumMismatch { expected, actual });
        }

        let body = &framed[LEN_SIZE..];
        if body.len() < BODY_HEADER_SIZE {
            return Err(CoreError::store_corruption(offset, format!("record body of {len} bytes has no header")));
        }
        let kind = RecordKind::from_byte(body[0])
            .ok_or_else(|| CoreError::store_corruption(offset, format!("unknown record kind {}", body[0])))?;
        let run_len = u16::from_le_bytes([body[1], body[2]]) as usize;
        let rest = &body[BODY_HEADER_SIZE..];
        if rest.len() < run_len {
            return Err(CoreError::store_corruption(
                offset,
                format!("run name of {run_len} bytes overruns a {len} byte body"),
            ));
        }

        let run = std::str::from_utf8(&rest[..run_len])
            .map_err(|_| CoreError::store_corruption(offset, "run name is not UTF-8"))?
            .to_string();
        let payload = rest[run_len..].to_vec();
        Ok(Some((Self { kind, run, payload }, total)))
    }
}

/// Finds the first offset at or after `from` where a complete record with a
/// valid checksum starts.
///
/// Bytes left by an interrupted append are a prefix of one write, so a valid
/// record after them means the log was damaged rather than cut short.
pub(crate) fn next_valid_record(buf: &[u8], from: usize) -> Option<usize> {
    (from..buf.len()).find(|&start| matches!(LogRecord::decode(&buf[start..], start as u64), Ok(Some(_))))
}

const CRC_TABLE: [u32; 256] = crc_table();

const fn crc_table() -> [u32; 256] {
    let mut table = [0u32; 256];
    let mut n = 0;
    while n < 256 {
        let mut value = n as u32;
        let mut bit = 0;
        while bit < 8 {
            value = if value & 1 == 1 {
                0xEDB8_8320 ^ (value >> 1)
            } else {
                value >> 1
            };
            bit += 1;
        }
        table[n] = value;
        n += 1;
    }
    table
}

/// CRC-32 (IEEE, reflected).
pub(crate) fn crc32(data: &[u8]) -> u32 {
    !data.iter().fold(u32::MAX, |crc, &byte| {
        CRC_TABLE[((crc ^ u32::from(byte)) & 0xFF) as usize] ^ (crc >> 8)
    })
}
