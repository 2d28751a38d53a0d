//! # Engine Configuration Constants
//!
//! ## Dependency Graph
//!
//! ```text
//! PAGE_CAPACITY (256 entries)
//!       │
//!       ├─> resident page buffer size (PAGE_CAPACITY × 10 B ≈ 2.5 KB RAM)
//!       │
//!       └─> index page byte size (storage::PAGE_BYTES, derived)
//!             Changing PAGE_CAPACITY changes the on-disk page geometry:
//!             existing index files become unreadable.
//!
//! MAX_FILENAME_LEN (12 characters)
//!       │
//!       └─> 8.3 FAT filename compatibility ("DATALOG1.IDX")
//! ```
//!
//! ## Critical Invariants
//!
//! 1. `PAGE_CAPACITY` is fixed for the lifetime of a database file; it is
//!    not recorded in the header, so readers and writers must agree.
//! 2. `MAX_FILENAME_LEN` matches the 8.3 limit of FAT filesystems the
//!    engine targets (12 characters, NUL excluded).

/// Number of index entries per page, on disk and in the resident buffer.
pub const PAGE_CAPACITY: usize = 256;

/// Maximum accepted file name length in characters (8.3-compatible).
pub const MAX_FILENAME_LEN: usize = 12;

const _: () = assert!(PAGE_CAPACITY.is_power_of_two());
const _: () = assert!(PAGE_CAPACITY <= u16::MAX as usize);
