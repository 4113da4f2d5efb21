//! TFRecord framing.
//!
//! Each record is `len: u64 LE | masked_crc32c(len): u32 LE | data |
//! masked_crc32c(data): u32 LE`.

use std::io::{self, Write};

use thiserror::Error;

const MASK_DELTA: u32 = 0xa282_ead8;
const HEADER_LEN: usize = 12;
const FOOTER_LEN: usize = 4;

/// CRC-32C rotated and offset the way TensorFlow stores it.
pub fn masked_crc32c(data: &[u8]) -> u32 {
    crc32c::crc32c(data).rotate_right(15).wrapping_add(MASK_DELTA)
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RecordError {
    #[error("record at byte {offset} is truncated")]
    Truncated { offset: usize },

    #[error("{what} checksum mismatch in record at byte {offset}")]
    Checksum { offset: usize, what: &'static str },
}

pub struct RecordWriter<W: Write> {
    inner: W,
    records: usize,
}

impl<W: Write> RecordWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner, records: 0 }
    }

    pub fn write_record(&mut self, data: &[u8]) -> io::Result<()> {
        let len = (data.len() as u64).to_le_bytes();
        self.inner.write_all(&len)?;
        self.inner.write_all(&masked_crc32c(&len).to_le_bytes())?;
        self.inner.write_all(data)?;
        self.inner.write_all(&masked_crc32c(data).to_le_bytes())?;
        self.records += 1;
        Ok(())
    }

    pub fn records(&self) -> usize {
        self.records
    }

    /// Flushes and hands back the underlying writer.
    pub fn finish(mut self) -> io::Result<W> {
        self.inner.flush()?;
        Ok(self.inner)
    }
}

/// Splits a whole TFRecord file into its payloads, verifying both checksums.
pub fn read_records(mut bytes: &[u8]) -> Result<Vec<&[u8]>, RecordError> {
    let mut records = Vec::new();
    let mut offset = 0usize;

    while !bytes.is_empty() {
        if bytes.len() < HEADER_LEN {
            return Err(RecordError::Truncated { offset });
        }
        let (len_bytes, rest) = bytes.split_at(8);
        let (len_crc, rest) = rest.split_at(4);
        if masked_crc32c(len_bytes).to_le_bytes() != len_crc {
            return Err(RecordError::Checksum {
                offset,
                what: "length",
            });
        }

        let mut len = [0u8; 8];
        len.copy_from_slice(len_bytes);
        let len = u64::from_le_bytes(len) as usize;
        if rest.len() < len.saturating_add(FOOTER_LEN) {
            return Err(RecordError::Truncated { offset });
        }
        let (data, rest) = rest.split_at(len);
        let (data_crc, rest) = rest.split_at(FOOTER_LEN);
        if masked_crc32c(data).to_le_bytes() != data_crc {
            return Err(RecordError::Checksum {
                offset,
                what: "data",
            });
        }

        records.push(data);
        offset += HEADER_LEN + len + FOOTER_LEN;
        bytes = rest;
    }

    Ok(records)
}
