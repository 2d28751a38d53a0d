//! # End-to-End Engine Scenarios
//!
//! Exercises the engine through its public API against real files:
//!
//! 1. Fresh open produces header-only files and an empty index
//! 2. Monotonic appends fill pages densely and every key reads back
//! 3. Duplicate live keys are rejected without disturbing stored data
//! 4. Delete + reinsert reuses the tombstoned slot in place
//! 5. Status updates are visible to ordered status scans
//! 6. Reverse-order appends keep the index sorted (overflow-carry path)
//! 7. Close/reopen preserves the index byte-identically

use tempfile::{tempdir, TempDir};

use logkv::{Engine, StdFileBackend};

const LOG_NAME: &str = "DATA.LOG";
const INDEX_NAME: &str = "DATA.IDX";

fn open_engine(dir: &TempDir) -> Engine<StdFileBackend> {
    Engine::open(
        StdFileBackend::new(dir.path()),
        StdFileBackend::new(dir.path()),
        LOG_NAME,
        INDEX_NAME,
    )
    .unwrap()
}

/// Payload used by the bulk scenarios: a little id + name record.
fn payload_for(key: u32) -> Vec<u8> {
    let mut payload = key.to_le_bytes().to_vec();
    payload.extend_from_slice(format!("rec-{}", key).as_bytes());
    payload
}

fn assert_key_reads_back(db: &mut Engine<StdFileBackend>, key: u32) {
    let expected = payload_for(key);
    let mut buf = [0u8; 64];
    let len = db.get(key, &mut buf).unwrap();
    assert_eq!(&buf[..len as usize], &expected[..], "payload for key {}", key);
}

mod empty_open_tests {
    use super::*;

    #[test]
    fn fresh_open_creates_header_only_files() {
        let dir = tempdir().unwrap();
        let db = open_engine(&dir);
        assert_eq!(db.index_count(), 0);
        drop(db);

        let db = open_engine(&dir);
        assert_eq!(db.index_count(), 0, "reopen sees the same empty index");
        drop(db);

        let log_len = std::fs::metadata(dir.path().join(LOG_NAME)).unwrap().len();
        let index_len = std::fs::metadata(dir.path().join(INDEX_NAME)).unwrap().len();
        assert_eq!(log_len, 6, "log is exactly its header");
        assert_eq!(index_len, 10, "index is exactly its header");
    }

    #[test]
    fn overlong_names_are_rejected() {
        let dir = tempdir().unwrap();
        let result = Engine::open(
            StdFileBackend::new(dir.path()),
            StdFileBackend::new(dir.path()),
            "THIRTEEN.CHAR",
            INDEX_NAME,
        );
        assert!(result.is_err());
    }
}

mod monotonic_append_tests {
    use super::*;

    #[test]
    fn thousand_ascending_appends_read_back() {
        let dir = tempdir().unwrap();
        let mut db = open_engine(&dir);

        for key in 1..=1000u32 {
            db.append(key, 1, &payload_for(key)).unwrap();
        }

        assert_eq!(db.index_count(), 1000);
        for key in 1..=1000u32 {
            assert_key_reads_back(&mut db, key);
        }

        let stats = db.stats().unwrap();
        assert_eq!(stats.records, 1000);
        assert_eq!(stats.unique_keys, 1000);
        assert_eq!(stats.pages, 4, "new pages started at positions 256, 512, 768");

        // Page-initial entries hold the keys their positions demand.
        for position in [256u32, 512, 768] {
            assert_eq!(db.index_entry(position).unwrap().key(), position + 1);
        }
    }

    #[test]
    fn ordering_holds_across_page_boundaries() {
        let dir = tempdir().unwrap();
        let mut db = open_engine(&dir);

        for key in 1..=600u32 {
            db.append(key, 0, b"x").unwrap();
        }

        let mut previous = db.index_entry(0).unwrap().key();
        for position in 1..db.index_count() {
            let key = db.index_entry(position).unwrap().key();
            assert!(previous < key, "keys ascend at position {}", position);
            previous = key;
        }
    }
}

mod duplicate_key_tests {
    use super::*;

    #[test]
    fn duplicate_append_fails_and_preserves_original() {
        let dir = tempdir().unwrap();
        let mut db = open_engine(&dir);

        for key in 1..=1000u32 {
            db.append(key, 1, &payload_for(key)).unwrap();
        }

        assert!(db.append(500, 1, b"usurper").is_err());
        assert_eq!(db.index_count(), 1000);
        assert_key_reads_back(&mut db, 500);
    }
}

mod delete_reinsert_tests {
    use super::*;

    #[test]
    fn tombstone_reuse_keeps_position_and_count() {
        let dir = tempdir().unwrap();
        let mut db = open_engine(&dir);

        for key in 1..=1000u32 {
            db.append(key, 1, &payload_for(key)).unwrap();
        }

        db.delete_record(500).unwrap();
        let position = db.find_key(500).unwrap().unwrap();
        assert!(db.index_entry(position).unwrap().is_deleted());

        db.append(500, 1, b"replacement").unwrap();
        assert_eq!(db.index_count(), 1000, "reuse does not grow the index");

        let mut buf = [0u8; 32];
        let len = db.get(500, &mut buf).unwrap();
        assert_eq!(&buf[..len as usize], b"replacement");

        let entry = db.index_entry(position).unwrap();
        assert!(!entry.is_deleted(), "tombstone bit cleared on reuse");
        assert_eq!(entry.key(), 500);
    }

    #[test]
    fn scans_see_tombstones() {
        let dir = tempdir().unwrap();
        let mut db = open_engine(&dir);

        for key in 1..=10u32 {
            db.append(key, 0, b"x").unwrap();
        }
        db.delete_record(3).unwrap();
        db.delete_record(7).unwrap();

        assert_eq!(db.record_count(logkv::INTERNAL_STATUS_DELETED, 0).unwrap(), 2);
        assert_eq!(db.record_count(0, logkv::INTERNAL_STATUS_DELETED).unwrap(), 8);

        let (first_deleted, position) = db.first_deleted_entry().unwrap().unwrap();
        assert_eq!(first_deleted.key(), 3);
        assert_eq!(position, 2);

        let (first_active, position) = db.first_active_entry().unwrap().unwrap();
        assert_eq!(first_active.key(), 1);
        assert_eq!(position, 0);
    }
}

mod status_scan_tests {
    use super::*;

    #[test]
    fn find_by_status_returns_positions_in_order() {
        let dir = tempdir().unwrap();
        let mut db = open_engine(&dir);

        for key in 1..=1000u32 {
            db.append(key, 1, &payload_for(key)).unwrap();
        }

        for position in [0u32, 100, 999] {
            db.update_status(position, 0xAA).unwrap();
        }

        let mut results = [0u32; 10];
        let found = db.find_by_status(0xAA, &mut results).unwrap();
        assert_eq!(&results[..found], &[0, 100, 999]);
    }

    #[test]
    fn find_by_status_respects_capacity() {
        let dir = tempdir().unwrap();
        let mut db = open_engine(&dir);

        for key in 1..=20u32 {
            db.append(key, 0, b"x").unwrap();
        }
        for position in 0..20u32 {
            db.update_status(position, 0x11).unwrap();
        }

        let mut results = [0u32; 5];
        let found = db.find_by_status(0x11, &mut results).unwrap();
        assert_eq!(found, 5);
        assert_eq!(&results[..found], &[0, 1, 2, 3, 4]);
    }
}

mod reverse_stress_tests {
    use super::*;

    #[test]
    fn descending_appends_keep_index_sorted() {
        let dir = tempdir().unwrap();
        let mut db = open_engine(&dir);

        for key in (1..=1000u32).rev() {
            db.append(key, 1, &payload_for(key)).unwrap();
        }

        assert_eq!(db.index_count(), 1000);

        let mut previous = db.index_entry(0).unwrap().key();
        for position in 1..db.index_count() {
            let key = db.index_entry(position).unwrap().key();
            assert!(previous < key, "keys ascend at position {}", position);
            previous = key;
        }

        for key in 1..=1000u32 {
            assert_key_reads_back(&mut db, key);
        }
    }
}

mod reopen_persistence_tests {
    use super::*;

    #[test]
    fn reopen_preserves_index_byte_identically() {
        let dir = tempdir().unwrap();
        {
            let mut db = open_engine(&dir);
            for key in 1..=300u32 {
                db.append(key, 1, &payload_for(key)).unwrap();
            }
            db.delete_record(42).unwrap();
            db.flush().unwrap();
        }

        let index_before = std::fs::read(dir.path().join(INDEX_NAME)).unwrap();

        {
            let mut db = open_engine(&dir);
            assert_eq!(db.index_count(), 300);
            for key in 1..=300u32 {
                assert_key_reads_back(&mut db, key);
            }
            let position = db.find_key(42).unwrap().unwrap();
            assert!(db.index_entry(position).unwrap().is_deleted());
        }

        let index_after = std::fs::read(dir.path().join(INDEX_NAME)).unwrap();
        assert_eq!(index_before, index_after, "read-only reopen rewrites nothing");
    }

    #[test]
    fn unflushed_tail_survives_via_drop() {
        let dir = tempdir().unwrap();
        {
            let mut db = open_engine(&dir);
            for key in 1..=10u32 {
                db.append(key, 0, b"x").unwrap();
            }
            // No explicit flush; Engine's drop path flushes the page.
        }

        let mut db = open_engine(&dir);
        assert_eq!(db.index_count(), 10);
        let mut buf = [0u8; 1];
        assert_eq!(db.get(10, &mut buf).unwrap(), 1);
    }
}

mod navigation_tests {
    use super::*;

    #[test]
    fn locate_and_find_agree_on_boundaries() {
        let dir = tempdir().unwrap();
        let mut db = open_engine(&dir);

        for key in [5u32, 10, 15, 20] {
            db.append(key, 0, b"x").unwrap();
        }

        let first_key = db.index_entry(0).unwrap().key();
        assert_eq!(db.find_key(first_key).unwrap(), Some(0));
        assert_eq!(db.locate_key(0).unwrap(), Some(0));
        assert_eq!(db.locate_key(u32::MAX).unwrap(), None);

        assert_eq!(db.locate_key(12).unwrap(), Some(2));
        assert_eq!(db.find_key(12).unwrap(), None);
    }

    #[test]
    fn next_and_prev_are_inverses_in_range() {
        let dir = tempdir().unwrap();
        let mut db = open_engine(&dir);

        for key in 1..=50u32 {
            db.append(key, 0, b"x").unwrap();
        }

        for position in 0..49u32 {
            let next = db.next_key(position).unwrap();
            assert_eq!(db.prev_key(next), Some(position));
        }
        assert_eq!(db.next_key(49), None);
        assert_eq!(db.prev_key(0), None);
    }
}
