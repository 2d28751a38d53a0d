//! # Storage Module
//!
//! Foundation layer for LogKV: the byte-I/O backend abstraction and the
//! packed on-disk record layout shared by the log and index files.
//!
//! ## Byte-I/O Backend
//!
//! The engine performs all file access through the [`FileBackend`] trait:
//! open by name in one of three modes, seek, tell, read, write, close. The
//! trait mirrors the C `fopen` surface the engine was designed around so
//! that an embedded port only has to wrap its filesystem library (FatFs,
//! SdFat, ...). [`StdFileBackend`] is the `std::fs` implementation used on
//! desktop hosts and in tests.
//!
//! ## On-Disk Records
//!
//! All four record types are packed little-endian structs defined in
//! [`layout`]:
//!
//! ```text
//! LogFileHeader    6 B   magic, version
//! IndexFileHeader  10 B  magic, version, index_count
//! LogEntryHeader   9 B   record_type, length, key, status, internal_status
//! IndexEntry       10 B  key, offset, status, internal_status
//! ```
//!
//! Serialization goes through `zerocopy` with explicit little-endian field
//! types, so the in-memory representation is byte-for-byte the on-disk one
//! on every platform, with no alignment or padding hazards.

mod backend;
mod layout;

pub use backend::{FileBackend, OpenMode, StdFileBackend};
pub use layout::{
    IndexEntry, IndexFileHeader, LogEntryHeader, LogFileHeader, FORMAT_MAGIC, FORMAT_VERSION,
    INDEX_ENTRY_SIZE, INDEX_HEADER_SIZE, INTERNAL_STATUS_DELETED, LOG_ENTRY_HEADER_SIZE,
    LOG_HEADER_SIZE, LOG_INTERNAL_STATUS_OFFSET, LOG_STATUS_OFFSET,
};

use eyre::{ensure, Result};

use crate::config::{MAX_FILENAME_LEN, PAGE_CAPACITY};

/// Byte size of one full index page on disk.
pub const PAGE_BYTES: usize = PAGE_CAPACITY * INDEX_ENTRY_SIZE;

/// Absolute byte offset of index page `page` within the index file.
/// Returned as `u64`; the caller checks it against the backend's 32-bit
/// offset space before seeking.
pub fn page_byte_offset(page: u32) -> u64 {
    INDEX_HEADER_SIZE as u64 + u64::from(page) * PAGE_BYTES as u64
}

/// Enforces the 8.3-compatible file name bound shared by both files.
pub(crate) fn validate_filename(name: &str) -> Result<()> {
    ensure!(!name.is_empty(), "file name is empty");
    ensure!(
        name.len() <= MAX_FILENAME_LEN,
        "file name '{}' exceeds {} characters",
        name,
        MAX_FILENAME_LEN
    );
    Ok(())
}
