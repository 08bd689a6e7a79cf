//! Sector-erasable flash block device abstraction.
//!
//! The record store persists settings through this interface. Flash is
//! organized in erase sectors: writes must start on a sector boundary and
//! every covered sector is erased back to `0xFF` before programming, so a
//! rewrite of the same base address never leaves stale tail bytes behind.
//! Reads are byte-granular and may start at any offset.
//!
//! There is deliberately no wear-leveling or journaling here. A power loss
//! mid-write can corrupt the record; the record store's checksum catches
//! that on the next boot.

use thiserror_no_std::Error;

extern crate alloc;
use alloc::vec;
use alloc::vec::Vec;

/// Erase granularity of the flash medium, in bytes.
pub const SECTOR_SIZE: usize = 4096;

/// Total addressable flash capacity, in bytes (4 MiB).
pub const FLASH_CAPACITY: usize = 4 * 1024 * 1024;

/// Value every byte of an erased sector reads as.
pub const ERASED_BYTE: u8 = 0xFF;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum FlashError {
    /// The medium was used before a successful `init`.
    #[error("flash medium not initialized")]
    NotInitialized,

    /// A write started at an address that is not a sector boundary.
    #[error("write address {0:#x} is not aligned to the 4096-byte sector size")]
    UnalignedWrite(usize),

    /// The access would run past the end of the flash region.
    #[error("access at {address:#x} of {len} bytes exceeds flash capacity")]
    OutOfRange { address: usize, len: usize },
}

/// Capability interface for a sector-erasable flash region.
///
/// Platform shims provide one implementation per target (QSPI chip on
/// hardware, [`MemFlash`] on the desktop). The record store depends only on
/// this trait.
pub trait FlashDevice {
    /// Prepare the underlying medium. Fails if it cannot be opened or
    /// allocated.
    fn init(&mut self) -> Result<(), FlashError>;

    /// Read `buf.len()` bytes starting at `address`. No alignment
    /// constraint; fails only on out-of-range access.
    fn read(&self, address: usize, buf: &mut [u8]) -> Result<(), FlashError>;

    /// Write `data` starting at the sector-aligned `address`.
    ///
    /// Every sector overlapping `[address, address + data.len())` is erased
    /// to [`ERASED_BYTE`] before the bytes are programmed. Fails on a
    /// misaligned address or a write past the end of the region.
    fn write(&mut self, address: usize, data: &[u8]) -> Result<(), FlashError>;
}

/// Heap-backed in-memory flash region.
///
/// Backs the simulator and the unit tests with the same erase-before-write
/// semantics a real chip has. Contents do not survive the process; the
/// hardware backend is what makes settings stick across power cycles.
#[derive(Debug, Default)]
pub struct MemFlash {
    /// Erased to `0xFF` on `init`; `None` beforehand.
    storage: Option<Vec<u8>>,
}

impl MemFlash {
    pub const fn new() -> Self {
        Self { storage: None }
    }

    fn check_range(&self, address: usize, len: usize) -> Result<(), FlashError> {
        if address.saturating_add(len) > FLASH_CAPACITY {
            return Err(FlashError::OutOfRange { address, len });
        }
        Ok(())
    }
}

impl FlashDevice for MemFlash {
    fn init(&mut self) -> Result<(), FlashError> {
        self.storage = Some(vec![ERASED_BYTE; FLASH_CAPACITY]);
        Ok(())
    }

    fn read(&self, address: usize, buf: &mut [u8]) -> Result<(), FlashError> {
        let storage = self.storage.as_ref().ok_or(FlashError::NotInitialized)?;
        self.check_range(address, buf.len())?;
        buf.copy_from_slice(&storage[address..address + buf.len()]);
        Ok(())
    }

    fn write(&mut self, address: usize, data: &[u8]) -> Result<(), FlashError> {
        if self.storage.is_none() {
            return Err(FlashError::NotInitialized);
        }
        if address % SECTOR_SIZE != 0 {
            return Err(FlashError::UnalignedWrite(address));
        }
        self.check_range(address, data.len())?;

        let storage = self.storage.as_mut().ok_or(FlashError::NotInitialized)?;

        let start_sector = address / SECTOR_SIZE;
        let end_sector = start_sector + data.len().div_ceil(SECTOR_SIZE);
        for sector in start_sector..end_sector {
            let base = sector * SECTOR_SIZE;
            storage[base..base + SECTOR_SIZE].fill(ERASED_BYTE);
        }

        storage[address..address + data.len()].copy_from_slice(data);
        Ok(())
    }
}
