//! # Append-Only Record Log
//!
//! The log file is a 6-byte header followed by records packed back to
//! back, each a 9-byte [`LogEntryHeader`] and its payload. Records are
//! only ever appended; after that, exactly two bytes of an entry may be
//! rewritten in place: the user `status` byte (offset 7 within the entry)
//! and the engine's `internal_status` byte (offset 8, tombstone bit).
//!
//! The log knows nothing about the index. It hands out the byte offset of
//! each appended record and reads records back by offset; pairing offsets
//! with keys is the engine's business. A record whose index entry never
//! made it to disk (crash between the two writes) is an orphan: it
//! occupies log space and is invisible to key lookup, which is accepted.

use eyre::{ensure, Result};
use tracing::trace;
use zerocopy::IntoBytes;

use crate::storage::{
    validate_filename, FileBackend, LogEntryHeader, LogFileHeader, OpenMode, LOG_ENTRY_HEADER_SIZE,
    LOG_HEADER_SIZE, LOG_INTERNAL_STATUS_OFFSET, LOG_STATUS_OFFSET,
};

/// The append-only record log over one backing file.
#[derive(Debug)]
pub struct LogFile<B: FileBackend> {
    backend: B,
    name: String,
}

impl<B: FileBackend> LogFile<B> {
    /// Opens the log, creating a fresh one (header only) when the file is
    /// absent or too short to hold a header. A present header with a bad
    /// magic or version fails instead of being overwritten.
    pub fn open(backend: B, name: &str) -> Result<Self> {
        validate_filename(name)?;

        let mut log = Self {
            backend,
            name: name.to_string(),
        };

        if !log.load_header()? {
            log.create_header()?;
        }
        Ok(log)
    }

    /// Appends one record and returns the byte offset of its entry header.
    pub fn append(&mut self, key: u32, record_type: u8, payload: &[u8]) -> Result<u32> {
        ensure!(
            payload.len() <= u16::MAX as usize,
            "payload of {} bytes exceeds the u16 length field",
            payload.len()
        );

        // Lazily recreate the file if it vanished since open.
        if self
            .backend
            .open(&self.name, OpenMode::ReadWrite)
            .is_err()
        {
            self.backend.open(&self.name, OpenMode::Truncate)?;
            let written = self.backend.write(LogFileHeader::new().as_bytes())?;
            ensure!(
                written == LOG_HEADER_SIZE,
                "short write of log header: {} of {} bytes",
                written,
                LOG_HEADER_SIZE
            );
        }

        self.backend.seek_to_end()?;
        let offset = self.backend.tell()?;

        let header = LogEntryHeader::new(record_type, payload.len() as u16, key);
        let written = self.backend.write(header.as_bytes())?;
        ensure!(
            written == LOG_ENTRY_HEADER_SIZE,
            "short write of log entry header: {} of {} bytes",
            written,
            LOG_ENTRY_HEADER_SIZE
        );

        let written = self.backend.write(payload)?;
        ensure!(
            written == payload.len(),
            "short write of payload: {} of {} bytes",
            written,
            payload.len()
        );

        self.backend.close();
        trace!(key, offset, len = payload.len(), "appended log record");
        Ok(offset)
    }

    /// Reads the record at `offset` into `buf`, returning the entry
    /// header and the payload length. Fails when `buf` is too small for
    /// the stored payload.
    pub fn read(&mut self, offset: u32, buf: &mut [u8]) -> Result<(LogEntryHeader, u16)> {
        self.backend.open(&self.name, OpenMode::Read)?;
        self.backend.seek(offset)?;

        let mut header_buf = [0u8; LOG_ENTRY_HEADER_SIZE];
        let got = self.backend.read(&mut header_buf)?;
        ensure!(
            got == LOG_ENTRY_HEADER_SIZE,
            "short read of log entry header at offset {}",
            offset
        );
        let header = *LogEntryHeader::from_bytes(&header_buf)?;

        let len = usize::from(header.length());
        ensure!(
            len <= buf.len(),
            "payload buffer too small: {} < {} bytes",
            buf.len(),
            len
        );

        let got = self.backend.read(&mut buf[..len])?;
        ensure!(
            got == len,
            "short read of payload at offset {}: {} of {} bytes",
            offset,
            got,
            len
        );

        self.backend.close();
        Ok((header, header.length()))
    }

    /// Rewrites the user `status` byte of the entry at `entry_offset`.
    pub fn write_status(&mut self, entry_offset: u32, status: u8) -> Result<()> {
        self.write_byte(entry_offset + LOG_STATUS_OFFSET, status)
    }

    /// Rewrites the `internal_status` byte of the entry at `entry_offset`.
    pub fn write_internal_status(&mut self, entry_offset: u32, value: u8) -> Result<()> {
        self.write_byte(entry_offset + LOG_INTERNAL_STATUS_OFFSET, value)
    }

    fn write_byte(&mut self, offset: u32, value: u8) -> Result<()> {
        self.backend.open(&self.name, OpenMode::ReadWrite)?;
        self.backend.seek(offset)?;
        let written = self.backend.write(&[value])?;
        ensure!(written == 1, "short write at offset {}", offset);
        self.backend.close();
        Ok(())
    }

    /// Reads and validates the header. `Ok(false)` means the file is
    /// absent or too short; a magic/version mismatch is an error.
    fn load_header(&mut self) -> Result<bool> {
        if self.backend.open(&self.name, OpenMode::Read).is_err() {
            return Ok(false);
        }

        let mut buf = [0u8; LOG_HEADER_SIZE];
        let got = self.backend.read(&mut buf)?;
        self.backend.close();
        if got < LOG_HEADER_SIZE {
            return Ok(false);
        }

        LogFileHeader::from_bytes(&buf)?;
        Ok(true)
    }

    fn create_header(&mut self) -> Result<()> {
        if self
            .backend
            .open(&self.name, OpenMode::ReadWrite)
            .is_err()
        {
            self.backend.open(&self.name, OpenMode::Truncate)?;
        }
        self.backend.seek(0)?;

        let written = self.backend.write(LogFileHeader::new().as_bytes())?;
        ensure!(
            written == LOG_HEADER_SIZE,
            "short write of log header: {} of {} bytes",
            written,
            LOG_HEADER_SIZE
        );
        self.backend.close();
        trace!(name = %self.name, "created fresh log file");
        Ok(())
    }
}
