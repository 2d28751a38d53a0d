//! # Engine Facade
//!
//! [`Engine`] ties the append-only [`LogFile`] and the paged sorted
//! [`IndexFile`] into one key-value store. It exclusively owns the two
//! byte-I/O backends and the single resident index page; there is no
//! other state.
//!
//! ## Operation Flow
//!
//! ```text
//! append(key, payload)            get(key, buf)
//!   │                               │
//!   ├─ search index for key         ├─ search index for key ── miss ─> error
//!   │    live hit ──> error         │
//!   │    tombstone ─> reuse slot    └─ read log at entry.offset into buf
//!   │    miss ──────> fresh insert
//!   │
//!   ├─ append record to log, note its offset
//!   └─ write offset into the index (reused or newly inserted entry)
//! ```
//!
//! ## Failure Semantics
//!
//! Failures propagate immediately and nothing is rolled back: a failed
//! `append` may leave an orphaned record in the log with no index entry.
//! Orphans are invisible to key lookup and a later append of the same key
//! simply points past them. Recoverable conditions (duplicate live key,
//! absent key, out-of-range position) are reported as errors with
//! descriptive messages; callers receive no structured discriminant.
//!
//! ## Tombstones on the Read Path
//!
//! `get` does not check the DELETED bit: a tombstoned record stays
//! retrievable by key until its slot is reused. Callers that care filter
//! through [`Engine::index_entry`] or the scan helpers.

use eyre::{ensure, eyre, Result};
use tracing::debug;

use crate::index::IndexFile;
use crate::log::LogFile;
use crate::storage::{
    FileBackend, IndexEntry, LogEntryHeader, FORMAT_VERSION, INTERNAL_STATUS_DELETED,
};

/// Counters reported by [`Engine::stats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stats {
    /// Total index entries (tombstones included).
    pub records: u32,
    /// Index pages the entries occupy.
    pub pages: u32,
    /// Distinct keys across all entries.
    pub unique_keys: u32,
}

/// The embedded key-value storage engine.
#[derive(Debug)]
pub struct Engine<B: FileBackend> {
    log: LogFile<B>,
    index: IndexFile<B>,
}

impl<B: FileBackend> Engine<B> {
    /// Opens (creating as needed) the paired log and index files and
    /// validates their headers plus the first index page. File names are
    /// bounded at 12 characters for 8.3 compatibility.
    pub fn open(
        log_backend: B,
        index_backend: B,
        log_name: &str,
        index_name: &str,
    ) -> Result<Self> {
        let log = LogFile::open(log_backend, log_name)?;
        let index = IndexFile::open(index_backend, index_name)?;
        debug!(log_name, index_name, count = index.count(), "engine open");
        Ok(Self { log, index })
    }

    /// Appends a record under `key`.
    ///
    /// A live entry with the same key rejects the append. A tombstoned
    /// entry is reused in place: its offset is pointed at the new record
    /// and its DELETED bit cleared, without moving the entry or touching
    /// its user status. Otherwise a fresh index entry is inserted in
    /// sorted position.
    pub fn append(&mut self, key: u32, record_type: u8, payload: &[u8]) -> Result<()> {
        let reuse = match self.index.search(key)? {
            Some(position) => {
                let entry = self.index.entry(position)?;
                ensure!(
                    entry.is_deleted(),
                    "append rejected: live record with key {} at index position {}",
                    key,
                    position
                );
                Some(position)
            }
            None => None,
        };

        let offset = self.log.append(key, record_type, payload)?;

        match reuse {
            Some(position) => {
                let mut entry = self.index.entry(position)?;
                entry.set_offset(offset);
                entry.set_internal_status(entry.internal_status() & !INTERNAL_STATUS_DELETED);
                self.index.set_entry(position, entry)?;
                debug!(key, position, offset, "reused tombstoned index entry");
            }
            None => {
                self.index.insert(IndexEntry::new(key, offset, 0, 0))?;
            }
        }
        Ok(())
    }

    /// Retrieves the record stored under `key` into `buf`, returning the
    /// payload length. Fails when the key is absent or `buf` is smaller
    /// than the stored payload. Tombstoned records are not filtered.
    pub fn get(&mut self, key: u32, buf: &mut [u8]) -> Result<u16> {
        let position = self
            .index
            .search(key)?
            .ok_or_else(|| eyre!("key {} not found", key))?;
        let entry = self.index.entry(position)?;
        let (_, len) = self.log.read(entry.offset(), buf)?;
        Ok(len)
    }

    /// Retrieves the record at a global index position into `buf`,
    /// returning its log entry header and payload length.
    pub fn get_by_position(
        &mut self,
        global_index: u32,
        buf: &mut [u8],
    ) -> Result<(LogEntryHeader, u16)> {
        let entry = self.index.entry(global_index)?;
        self.log.read(entry.offset(), buf)
    }

    /// Rewrites the user status byte of the record at a global index
    /// position, in the log and in the index entry.
    pub fn update_status(&mut self, global_index: u32, new_status: u8) -> Result<()> {
        let mut entry = self.index.entry(global_index)?;
        self.log.write_status(entry.offset(), new_status)?;
        entry.set_status(new_status);
        self.index.set_entry(global_index, entry)
    }

    /// Marks the record under `key` as deleted by setting the tombstone
    /// bit in the log and the index. Succeeds as a no-op when the record
    /// is already tombstoned; fails when the key is absent.
    pub fn delete_record(&mut self, key: u32) -> Result<()> {
        let position = self
            .index
            .search(key)?
            .ok_or_else(|| eyre!("key {} not found", key))?;

        let mut entry = self.index.entry(position)?;
        if entry.is_deleted() {
            debug!(key, position, "already tombstoned");
            return Ok(());
        }

        let internal = entry.internal_status() | INTERNAL_STATUS_DELETED;
        self.log.write_internal_status(entry.offset(), internal)?;
        entry.set_internal_status(internal);
        self.index.set_entry(position, entry)?;
        debug!(key, position, "record tombstoned");
        Ok(())
    }

    /// Total number of index entries (tombstones included).
    pub fn index_count(&self) -> u32 {
        self.index.count()
    }

    /// The index entry at a global position.
    pub fn index_entry(&mut self, global_index: u32) -> Result<IndexEntry> {
        self.index.entry(global_index)
    }

    /// Collects the global positions of entries whose user status equals
    /// `status`, in ascending position order, up to `results.len()`.
    pub fn find_by_status(&mut self, status: u8, results: &mut [u32]) -> Result<usize> {
        self.index.find_by_status(status, results)
    }

    /// Counts entries whose `internal_status` has all `must_be_set` bits
    /// set and all `must_be_clear` bits clear.
    pub fn record_count(&mut self, must_be_set: u8, must_be_clear: u8) -> Result<u32> {
        self.index.record_count(must_be_set, must_be_clear)
    }

    /// First entry (smallest global position) matching the
    /// `internal_status` bit criteria.
    pub fn first_matching_entry(
        &mut self,
        must_be_set: u8,
        must_be_clear: u8,
    ) -> Result<Option<(IndexEntry, u32)>> {
        self.index.first_matching(must_be_set, must_be_clear)
    }

    /// First entry whose tombstone bit is clear.
    pub fn first_active_entry(&mut self) -> Result<Option<(IndexEntry, u32)>> {
        self.index.first_matching(0, INTERNAL_STATUS_DELETED)
    }

    /// First entry whose tombstone bit is set.
    pub fn first_deleted_entry(&mut self) -> Result<Option<(IndexEntry, u32)>> {
        self.index.first_matching(INTERNAL_STATUS_DELETED, 0)
    }

    /// Exact-match search; the global position of `key` if present.
    pub fn find_key(&mut self, key: u32) -> Result<Option<u32>> {
        self.index.search(key)
    }

    /// Smallest global position whose key is `>= key`; `None` when every
    /// key is strictly smaller.
    pub fn locate_key(&mut self, key: u32) -> Result<Option<u32>> {
        self.index.locate(key)
    }

    /// The position after `current`, if still in range. Tombstones are
    /// not skipped.
    pub fn next_key(&self, current: u32) -> Option<u32> {
        let next = current.checked_add(1)?;
        (next < self.index.count()).then_some(next)
    }

    /// The position before `current`, if in range. Tombstones are not
    /// skipped.
    pub fn prev_key(&self, current: u32) -> Option<u32> {
        (current > 0 && current <= self.index.count()).then(|| current - 1)
    }

    /// Flushes the resident index page (and header) if dirty.
    pub fn flush(&mut self) -> Result<()> {
        self.index.flush()
    }

    /// The on-disk format version of both files.
    pub fn version(&self) -> u16 {
        FORMAT_VERSION
    }

    /// Scans the whole index and reports record, page and distinct-key
    /// counts.
    pub fn stats(&mut self) -> Result<Stats> {
        let records = self.index.count();
        let mut unique_keys = 0;
        let mut last_key = 0;
        for global in 0..records {
            let key = self.index.entry(global)?.key();
            if global == 0 || key != last_key {
                unique_keys += 1;
                last_key = key;
            }
        }
        Ok(Stats {
            records,
            pages: self.index.pages(),
            unique_keys,
        })
    }
}
