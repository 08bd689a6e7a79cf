//! Checksummed, versioned record store on top of the flash block device.
//!
//! A single fixed-offset record holds the persisted settings blob. The
//! on-flash layout is a 20-byte little-endian header
//! `{magic: u32, version: u32, checksum: u32, length: u64}` immediately
//! followed by the raw payload bytes, written as one aligned write.
//!
//! Reads validate the header before ever touching the payload region: an
//! erased flash region (all `0xFF`) fails the magic check immediately, and a
//! schema change shows up as a version mismatch. Both are treated the same
//! as "no prior data" by callers, which fall back to in-memory defaults.

use log::debug;
use thiserror_no_std::Error;

extern crate alloc;
use alloc::vec;
use alloc::vec::Vec;

use crate::flash::{FlashDevice, FlashError};

/// Sector-aligned base address of the record within the flash region.
pub const RECORD_BASE_ADDRESS: usize = 0x0000_0000;

/// Serialized size of [`RecordHeader`].
pub const HEADER_SIZE: usize = 20;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum StorageError {
    #[error("flash access failed: {0}")]
    Flash(#[from] FlashError),

    /// Magic, version, or declared length did not match the caller's
    /// expectation. Indistinguishable from uninitialized flash.
    #[error("record header mismatch")]
    HeaderMismatch,

    /// Header was plausible but the payload failed its integrity check.
    #[error("record checksum mismatch")]
    ChecksumMismatch,
}

/// On-flash record header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RecordHeader {
    magic: u32,
    version: u32,
    checksum: u32,
    length: u64,
}

impl RecordHeader {
    fn to_bytes(self) -> [u8; HEADER_SIZE] {
        let mut bytes = [0u8; HEADER_SIZE];
        bytes[0..4].copy_from_slice(&self.magic.to_le_bytes());
        bytes[4..8].copy_from_slice(&self.version.to_le_bytes());
        bytes[8..12].copy_from_slice(&self.checksum.to_le_bytes());
        bytes[12..20].copy_from_slice(&self.length.to_le_bytes());
        bytes
    }

    fn from_bytes(bytes: &[u8; HEADER_SIZE]) -> Self {
        // Slice bounds are fixed, so the conversions cannot fail.
        let field = |range: core::ops::Range<usize>| {
            let mut word = [0u8; 4];
            word.copy_from_slice(&bytes[range]);
            u32::from_le_bytes(word)
        };
        let mut length = [0u8; 8];
        length.copy_from_slice(&bytes[12..20]);

        Self {
            magic: field(0..4),
            version: field(4..8),
            checksum: field(8..12),
            length: u64::from_le_bytes(length),
        }
    }
}

/// Single-record store at a fixed flash offset.
///
/// Holds the flash backend it persists through. There is no wear-leveling
/// and no journaling: each write overwrites the same base address, and a
/// power loss mid-write is caught by the checksum on the next read.
pub struct RecordStore<F: FlashDevice> {
    flash: F,
}

impl<F: FlashDevice> RecordStore<F> {
    /// Take ownership of an already-initialized flash backend.
    pub fn new(flash: F) -> Self {
        Self { flash }
    }

    /// Write `payload` as a checksummed record tagged with `magic` and
    /// `version`.
    ///
    /// Callers that want to detect silent flash corruption can re-read the
    /// record afterwards and compare; that verification is caller policy,
    /// not enforced here.
    pub fn write(&mut self, magic: u32, version: u32, payload: &[u8]) -> Result<(), StorageError> {
        let header = RecordHeader {
            magic,
            version,
            checksum: crc32(payload),
            length: payload.len() as u64,
        };

        debug!(
            "record write: magic={:#010x} version={} chk={:#010x} len={}",
            header.magic, header.version, header.checksum, header.length
        );

        let mut record = Vec::with_capacity(HEADER_SIZE + payload.len());
        record.extend_from_slice(&header.to_bytes());
        record.extend_from_slice(payload);

        self.flash.write(RECORD_BASE_ADDRESS, &record)?;
        Ok(())
    }

    /// Read back a record written with the same `magic`, `version`, and
    /// payload length.
    ///
    /// The header is validated first; on any mismatch the payload region is
    /// never read. A payload whose recomputed checksum disagrees with the
    /// header is reported as [`StorageError::ChecksumMismatch`].
    pub fn read(&self, magic: u32, version: u32, len: usize) -> Result<Vec<u8>, StorageError> {
        let mut header_bytes = [0u8; HEADER_SIZE];
        self.flash.read(RECORD_BASE_ADDRESS, &mut header_bytes)?;
        let header = RecordHeader::from_bytes(&header_bytes);

        debug!(
            "record read: magic={:#010x} version={} chk={:#010x} len={}",
            header.magic, header.version, header.checksum, header.length
        );

        if header.magic != magic || header.version != version || header.length != len as u64 {
            debug!("record read: header mismatch");
            return Err(StorageError::HeaderMismatch);
        }

        let mut payload = vec![0u8; len];
        self.flash
            .read(RECORD_BASE_ADDRESS + HEADER_SIZE, &mut payload)?;

        if crc32(&payload) != header.checksum {
            debug!("record read: checksum mismatch");
            return Err(StorageError::ChecksumMismatch);
        }

        Ok(payload)
    }

    /// Access the underlying flash backend.
    pub fn flash_mut(&mut self) -> &mut F {
        &mut self.flash
    }
}

/// Reflected CRC-32 (polynomial `0xEDB88320`, init/final XOR all-ones),
/// computed bit-serially per byte.
///
/// This exact convention is what existing records on flash were written
/// with, so it must not change.
pub fn crc32(data: &[u8]) -> u32 {
    let mut r: u32 = !0;

    for &byte in data {
        r ^= u32::from(byte);
        for _ in 0..8 {
            let t = (r & 1).wrapping_sub(1);
            r = (r >> 1) ^ (0xEDB8_8320 & !t);
        }
    }

    !r
}
