use crate::*;
use sstable::{BloomParams, Table};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use tempfile::tempdir;

static SEQ: AtomicU64 = AtomicU64::new(0);

fn table(dir: &Path, level: u64, records: &[Record]) -> Table {
    let seq = SEQ.fetch_add(1, Ordering::Relaxed);
    Table::create(records, dir, level, seq, BloomParams::new(100, 0.01)).unwrap()
}

#[test]
fn overlapping_uses_inclusive_bounds() {
    let dir = tempdir().unwrap();
    let mut level = Level::new();
    level.push(table(dir.path(), 1, &[Record::new("a", "1"), Record::new("c", "1")]));
    level.push(table(dir.path(), 1, &[Record::new("e", "1"), Record::new("g", "1")]));
    level.push(table(dir.path(), 1, &[Record::new("m", "1")]));

    assert_eq!(level.overlapping(b"c", b"e"), vec![0, 1]);
    assert_eq!(level.overlapping(b"d", b"d"), Vec::<usize>::new());
    assert_eq!(level.overlapping(b"m", b"m"), vec![2]);
    assert_eq!(level.overlapping(b"0", b"z"), vec![0, 1, 2]);
    assert_eq!(
        level.key_range(),
        Some((b"a".to_vec(), b"m".to_vec()))
    );
}

#[test]
fn remove_returns_selected_tables() {
    let dir = tempdir().unwrap();
    let mut level = Level::new();
    for k in ["a", "b", "c", "d"] {
        level.push(table(dir.path(), 1, &[Record::new(k, "1")]));
    }

    let removed = level.remove(&[1, 3]);
    let removed_keys: Vec<Vec<u8>> = removed.iter().map(|t| t.boundaries().0.to_vec()).collect();
    assert_eq!(removed_keys, vec![b"b".to_vec(), b"d".to_vec()]);

    let kept: Vec<Vec<u8>> = level.tables().iter().map(|t| t.boundaries().0.to_vec()).collect();
    assert_eq!(kept, vec![b"a".to_vec(), b"c".to_vec()]);

    // Files are the caller's to delete.
    assert!(removed.iter().all(|t| t.path().exists()));
    assert_eq!(level.take_all().len(), 2);
    assert!(level.is_empty());
    assert_eq!(level.key_range(), None);
}

#[test]
fn get_prefers_newest_table() {
    let dir = tempdir().unwrap();
    let mut level = Level::new();
    level.push(table(dir.path(), 0, &[Record::new("k", "old"), Record::new("x", "1")]));
    level.push(table(dir.path(), 0, &[Record::tombstone("k")]));
    level.push(table(dir.path(), 0, &[Record::new("j", "1"), Record::new("l", "1")]));

    // The last table covers "k" by range but does not hold it.
    let hit = level.get(b"k").unwrap().unwrap();
    assert!(hit.tombstone);
    assert_eq!(level.get(b"x").unwrap().unwrap().value, b"1");
    assert!(level.get(b"zz").unwrap().is_none());
}

#[test]
fn disk_manager_reports_levels() {
    let dir = tempdir().unwrap();
    let config = EngineConfig::new(dir.path()).with_bloom(100, 0.01);
    let disk = DiskManager::new(&config);
    assert_eq!(disk.dir(), dir.path());
    assert_eq!(disk.level_count(), 1);
    assert_eq!(disk.table_counts(), vec![0]);
    assert_eq!(disk.capacity(0), 4);
    assert_eq!(disk.capacity(2), config.level_capacity(2));
    assert!(matches!(disk.get(b"k"), Err(EngineError::NotFound)));

    disk.flush(&[Record::new("k", "v")]).unwrap();
    disk.flush(&[]).unwrap();
    assert_eq!(disk.table_counts(), vec![1]);
    assert_eq!(disk.get(b"k").unwrap().value, b"v");
    assert!(format!("{:?}", disk).contains("DiskManager"));
}
