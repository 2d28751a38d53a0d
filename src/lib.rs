//! # LogKV - Embedded Append-Only Key-Value Store
//!
//! LogKV is a durable key-value storage engine built from two plain files:
//! an append-only log of variable-length records and a sorted, paged index
//! keyed by a 32-bit integer. It targets resource-constrained hosts
//! (microcontrollers writing to FAT filesystems on SD or flash) but runs
//! unchanged on desktop hosts against ordinary files.
//!
//! ## Design Goals
//!
//! - **Bounded RAM**: exactly one index page (~2.5 KB) resident at a time
//! - **Fast point lookups**: binary search over the sorted index
//! - **Append-only durability**: record payloads are never rewritten; only
//!   two status bytes are ever mutated in place
//! - **Consistency checks**: headers carry magic/version, the first
//!   index page is order-checked on every open
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────┐
//! │         Engine (facade)              │
//! │  open / append / get / delete / ...  │
//! ├──────────────────┬──────────────────┤
//! │    IndexFile     │     LogFile      │
//! │  paged sorted    │  append-only     │
//! │  index + cache   │  record log      │
//! ├──────────────────┴──────────────────┤
//! │      Record Layout (zerocopy LE)     │
//! ├─────────────────────────────────────┤
//! │   FileBackend (seek/read/write)      │
//! └─────────────────────────────────────┘
//! ```
//!
//! ## File Layout
//!
//! ```text
//! log file:    [LogFileHeader (6 B)] [entry header (9 B)][payload] ...
//! index file:  [IndexFileHeader (10 B)] [page 0: 256 × 10 B] [page 1] ...
//! ```
//!
//! Both files start with the magic `0x53474F4C` ("LOGS" on disk) and a
//! format version. Index entries are strictly ascending by key across all
//! pages; deletion marks a tombstone bit instead of removing the entry, and
//! a later append of the same key reuses the tombstoned slot.
//!
//! ## Quick Start
//!
//! ```ignore
//! use logkv::{Engine, StdFileBackend};
//!
//! let log = StdFileBackend::new("/data");
//! let index = StdFileBackend::new("/data");
//! let mut db = Engine::open(log, index, "SENSOR.LOG", "SENSOR.IDX")?;
//!
//! db.append(42, 1, b"reading")?;
//! let mut buf = [0u8; 64];
//! let len = db.get(42, &mut buf)?;
//! assert_eq!(&buf[..len as usize], b"reading");
//! ```
//!
//! ## Concurrency Model
//!
//! Single-threaded, non-reentrant, synchronous blocking I/O. The engine
//! exclusively owns its two file backends and assumes no other process
//! touches either file while open. There is no internal locking.
//!
//! ## Module Overview
//!
//! - [`config`]: compile-time constants (page capacity, filename bound)
//! - [`storage`]: byte-I/O backend trait and the on-disk record layout
//! - [`index`]: paged sorted index with a single-page cache
//! - [`log`]: append-only record log
//! - [`engine`]: the public facade tying the two files together

pub mod config;
pub mod engine;
pub mod index;
pub mod log;
pub mod storage;

pub use engine::{Engine, Stats};
pub use storage::{
    FileBackend, IndexEntry, LogEntryHeader, OpenMode, StdFileBackend, INTERNAL_STATUS_DELETED,
};
