//! # On-Disk Record Layout
//!
//! Packed little-endian definitions for everything LogKV writes to disk.
//! Both files begin with a header carrying the shared magic and a format
//! version; the log holds self-describing entry headers followed by raw
//! payload bytes, and the index holds fixed-size sorted entries.
//!
//! ## Log File
//!
//! ```text
//! Offset  Size  Field
//! ------  ----  ---------------------------
//! 0       4     magic  (0x53474F4C, "LOGS")
//! 4       2     version (0x0001)
//! 6       ...   entries, packed contiguously
//! ```
//!
//! Each entry is a 9-byte header followed by `length` payload bytes:
//!
//! ```text
//! Offset  Size  Field
//! ------  ----  ---------------------------
//! 0       1     record_type
//! 1       2     length
//! 3       4     key
//! 7       1     status           (user data, opaque to the engine)
//! 8       1     internal_status  (bit 0x01 = DELETED tombstone)
//! ```
//!
//! The two status bytes at offsets 7 and 8 are the only bytes of the log
//! ever rewritten in place; [`LOG_STATUS_OFFSET`] and
//! [`LOG_INTERNAL_STATUS_OFFSET`] pin those positions.
//!
//! ## Index File
//!
//! ```text
//! Offset  Size  Field
//! ------  ----  ---------------------------
//! 0       4     magic
//! 4       2     version
//! 6       4     index_count
//! 10      ...   pages of 256 × 10-byte entries
//! ```
//!
//! `index_count` counts every entry ever inserted; deletions set the
//! tombstone bit and never decrement it. The region of the final page
//! beyond `index_count` entries is unspecified bytes.
//!
//! ## Zerocopy Safety
//!
//! All structs derive `FromBytes`, `IntoBytes`, `Immutable`, `KnownLayout`
//! and `Unaligned`, with little-endian `U16`/`U32` field types. Sizes are
//! pinned by compile-time assertions so layout drift fails the build.

use eyre::{ensure, Result};
use zerocopy::little_endian::{U16, U32};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

/// Shared file magic, "LOGS" as on-disk bytes `4C 4F 47 53`.
pub const FORMAT_MAGIC: u32 = 0x53474F4C;

/// Current format version of both files.
pub const FORMAT_VERSION: u16 = 0x0001;

/// Tombstone bit within `internal_status`. All other bits are reserved:
/// written as zero, ignored on read.
pub const INTERNAL_STATUS_DELETED: u8 = 0x01;

pub const LOG_HEADER_SIZE: usize = 6;
pub const INDEX_HEADER_SIZE: usize = 10;
pub const LOG_ENTRY_HEADER_SIZE: usize = 9;
pub const INDEX_ENTRY_SIZE: usize = 10;

/// Byte offset of the `status` field within a log entry, relative to the
/// entry's start.
pub const LOG_STATUS_OFFSET: u32 = 7;

/// Byte offset of the `internal_status` field within a log entry.
pub const LOG_INTERNAL_STATUS_OFFSET: u32 = 8;

#[repr(C)]
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
pub struct LogFileHeader {
    magic: U32,
    version: U16,
}

const _: () = assert!(std::mem::size_of::<LogFileHeader>() == LOG_HEADER_SIZE);

impl LogFileHeader {
    pub fn new() -> Self {
        Self {
            magic: U32::new(FORMAT_MAGIC),
            version: U16::new(FORMAT_VERSION),
        }
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<&Self> {
        ensure!(
            bytes.len() >= LOG_HEADER_SIZE,
            "buffer too small for LogFileHeader: {} < {}",
            bytes.len(),
            LOG_HEADER_SIZE
        );

        let header = Self::ref_from_bytes(&bytes[..LOG_HEADER_SIZE])
            .map_err(|e| eyre::eyre!("failed to parse LogFileHeader: {:?}", e))?;

        ensure!(
            header.magic.get() == FORMAT_MAGIC,
            "invalid magic number in log file"
        );

        ensure!(
            header.version.get() == FORMAT_VERSION,
            "unsupported log file version: {:#06x} (expected {:#06x})",
            header.version.get(),
            FORMAT_VERSION
        );

        Ok(header)
    }

    pub fn version(&self) -> u16 {
        self.version.get()
    }
}

impl Default for LogFileHeader {
    fn default() -> Self {
        Self::new()
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
pub struct IndexFileHeader {
    magic: U32,
    version: U16,
    index_count: U32,
}

const _: () = assert!(std::mem::size_of::<IndexFileHeader>() == INDEX_HEADER_SIZE);

impl IndexFileHeader {
    pub fn new(index_count: u32) -> Self {
        Self {
            magic: U32::new(FORMAT_MAGIC),
            version: U16::new(FORMAT_VERSION),
            index_count: U32::new(index_count),
        }
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<&Self> {
        ensure!(
            bytes.len() >= INDEX_HEADER_SIZE,
            "buffer too small for IndexFileHeader: {} < {}",
            bytes.len(),
            INDEX_HEADER_SIZE
        );

        let header = Self::ref_from_bytes(&bytes[..INDEX_HEADER_SIZE])
            .map_err(|e| eyre::eyre!("failed to parse IndexFileHeader: {:?}", e))?;

        ensure!(
            header.magic.get() == FORMAT_MAGIC,
            "invalid magic number in index file"
        );

        ensure!(
            header.version.get() == FORMAT_VERSION,
            "unsupported index file version: {:#06x} (expected {:#06x})",
            header.version.get(),
            FORMAT_VERSION
        );

        Ok(header)
    }

    pub fn index_count(&self) -> u32 {
        self.index_count.get()
    }

    pub fn version(&self) -> u16 {
        self.version.get()
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
pub struct LogEntryHeader {
    record_type: u8,
    length: U16,
    key: U32,
    status: u8,
    internal_status: u8,
}

const _: () = assert!(std::mem::size_of::<LogEntryHeader>() == LOG_ENTRY_HEADER_SIZE);

impl LogEntryHeader {
    pub fn new(record_type: u8, length: u16, key: u32) -> Self {
        Self {
            record_type,
            length: U16::new(length),
            key: U32::new(key),
            status: 0,
            internal_status: 0,
        }
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<&Self> {
        ensure!(
            bytes.len() >= LOG_ENTRY_HEADER_SIZE,
            "buffer too small for LogEntryHeader: {} < {}",
            bytes.len(),
            LOG_ENTRY_HEADER_SIZE
        );

        Self::ref_from_bytes(&bytes[..LOG_ENTRY_HEADER_SIZE])
            .map_err(|e| eyre::eyre!("failed to parse LogEntryHeader: {:?}", e))
    }

    pub fn record_type(&self) -> u8 {
        self.record_type
    }

    pub fn length(&self) -> u16 {
        self.length.get()
    }

    pub fn key(&self) -> u32 {
        self.key.get()
    }

    pub fn status(&self) -> u8 {
        self.status
    }

    pub fn internal_status(&self) -> u8 {
        self.internal_status
    }
}

/// One sorted index slot: key, byte offset of the record's log entry, and
/// the two status bytes mirrored from the log.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
pub struct IndexEntry {
    key: U32,
    offset: U32,
    status: u8,
    internal_status: u8,
}

const _: () = assert!(std::mem::size_of::<IndexEntry>() == INDEX_ENTRY_SIZE);

impl IndexEntry {
    pub fn new(key: u32, offset: u32, status: u8, internal_status: u8) -> Self {
        Self {
            key: U32::new(key),
            offset: U32::new(offset),
            status,
            internal_status,
        }
    }

    pub fn key(&self) -> u32 {
        self.key.get()
    }

    pub fn offset(&self) -> u32 {
        self.offset.get()
    }

    pub fn set_offset(&mut self, offset: u32) {
        self.offset = U32::new(offset);
    }

    pub fn status(&self) -> u8 {
        self.status
    }

    pub fn set_status(&mut self, status: u8) {
        self.status = status;
    }

    pub fn internal_status(&self) -> u8 {
        self.internal_status
    }

    pub fn set_internal_status(&mut self, internal_status: u8) {
        self.internal_status = internal_status;
    }

    /// True when the DELETED tombstone bit is set.
    pub fn is_deleted(&self) -> bool {
        self.internal_status & INTERNAL_STATUS_DELETED != 0
    }
}
