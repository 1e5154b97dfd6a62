use super::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::BTreeMap;

fn rec(k: &str, v: &str) -> Record {
    Record::new(k.as_bytes(), v.as_bytes())
}

// -------------------- Basic CRUD --------------------

#[test]
fn put_and_get_single_key() {
    let mut m = Memtable::new();
    m.put(rec("k1", "v1"));
    assert_eq!(m.len(), 1);
    let r = m.get(b"k1").unwrap();
    assert_eq!(r, &rec("k1", "v1"));
    assert!(!r.is_tombstone());
}

#[test]
fn put_overwrites_in_place() {
    let mut m = Memtable::new();
    m.put(rec("k1", "v1"));
    m.put(rec("k1", "v2"));
    assert_eq!(m.len(), 1);
    assert_eq!(m.get(b"k1").unwrap().value, b"v2");
}

#[test]
fn get_distinguishes_empty_from_missing() {
    let mut m = Memtable::new();
    assert_eq!(m.get(b"k"), Err(MemtableError::Empty));

    m.put(rec("a", "1"));
    assert_eq!(m.get(b"k"), Err(MemtableError::NotFound));
}

#[test]
fn delete_overwrites_live_record_with_tombstone() {
    let mut m = Memtable::new();
    m.put(rec("k1", "v1"));
    assert_eq!(m.delete(b"k1"), DeleteOutcome::Tombstoned);

    let r = m.get(b"k1").unwrap();
    assert!(r.is_tombstone());
    assert_eq!(r.key, b"k1");
    assert!(r.value.is_empty());
    assert_eq!(m.len(), 1); // tombstone still present
}

#[test]
fn delete_twice_reports_already_deleted() {
    let mut m = Memtable::new();
    m.put(rec("k", "v"));
    m.delete(b"k");
    assert_eq!(m.delete(b"k"), DeleteOutcome::AlreadyDeleted);
}

#[test]
fn delete_absent_key_leaves_memtable_untouched() {
    let mut m = Memtable::new();
    m.put(rec("a", "1"));
    assert_eq!(m.delete(b"zzz"), DeleteOutcome::Absent);
    assert_eq!(m.len(), 1);
    assert_eq!(m.get(b"zzz").unwrap_err(), MemtableError::NotFound);
}

#[test]
fn put_after_delete_revives_key() {
    let mut m = Memtable::new();
    m.put(rec("k", "v1"));
    m.delete(b"k");
    m.put(rec("k", "v2"));
    let r = m.get(b"k").unwrap();
    assert!(!r.is_tombstone());
    assert_eq!(r.value, b"v2");
}

// -------------------- Size estimate --------------------

#[test]
fn approx_size_tracks_key_value_and_overhead() {
    let mut m = Memtable::new();
    assert_eq!(m.approx_size(), 0);

    m.put(rec("a", "aaa"));
    assert_eq!(m.approx_size(), 1 + 3 + RECORD_OVERHEAD);

    m.put(rec("a", "bb"));
    assert_eq!(m.approx_size(), 1 + 2 + RECORD_OVERHEAD);

    m.put(rec("bc", ""));
    assert_eq!(m.approx_size(), (1 + 2) + (2 + 0) + 2 * RECORD_OVERHEAD);

    m.delete(b"a");
    assert_eq!(m.approx_size(), 1 + (2 + 0) + 2 * RECORD_OVERHEAD);
}

#[test]
fn clear_resets_everything() {
    let mut m = Memtable::new();
    for i in 0..100 {
        m.put(rec(&format!("k{}", i), "v"));
    }
    m.clear();
    assert!(m.is_empty());
    assert_eq!(m.len(), 0);
    assert_eq!(m.approx_size(), 0);
    assert_eq!(m.get(b"k1"), Err(MemtableError::Empty));
}

// -------------------- Ordering --------------------

#[test]
fn get_all_is_ascending_by_raw_bytes() {
    let mut m = Memtable::new();
    for k in ["b", "a", "B", "ab", "\u{7f}", "aa", "0"] {
        m.put(rec(k, "v"));
    }
    m.put(Record::new(vec![0xFFu8], b"hi".to_vec()));
    m.put(Record::new(vec![0x00u8], b"lo".to_vec()));

    let keys: Vec<Vec<u8>> = m.get_all().into_iter().map(|r| r.key).collect();
    let mut sorted = keys.clone();
    sorted.sort();
    assert_eq!(keys, sorted);
    assert_eq!(keys.first().unwrap(), &vec![0x00u8]);
    assert_eq!(keys.last().unwrap(), &vec![0xFFu8]);
}

#[test]
fn get_all_includes_tombstones() {
    let mut m = Memtable::new();
    m.put(rec("a", "1"));
    m.put(rec("b", "2"));
    m.delete(b"a");

    let all = m.get_all();
    assert_eq!(all.len(), 2);
    assert!(all[0].is_tombstone());
    assert!(!all[1].is_tombstone());
}

// -------------------- AVL tree --------------------

#[test]
fn sequential_inserts_stay_logarithmic() {
    let mut t = AvlTree::new();
    for i in 0..1024u32 {
        t.insert(Record::new(i.to_be_bytes().to_vec(), Vec::new()));
        assert!(t.check_invariants());
    }
    assert_eq!(t.len(), 1024);
    // A perfectly balanced tree of 1024 nodes has height 11; AVL allows ~1.44x.
    assert!(t.height() <= 15, "height {}", t.height());
}

#[test]
fn remove_leaf_one_child_and_two_children() {
    let mut t = AvlTree::new();
    for k in ["d", "b", "f", "a", "c", "e", "g", "h"] {
        t.insert(rec(k, k));
    }

    // leaf
    assert_eq!(t.remove(b"a").unwrap().key, b"a");
    assert!(t.check_invariants());
    // one child ("g" has right child "h")
    assert_eq!(t.remove(b"g").unwrap().key, b"g");
    assert!(t.check_invariants());
    // two children
    assert_eq!(t.remove(b"d").unwrap().key, b"d");
    assert!(t.check_invariants());

    assert!(t.remove(b"zz").is_none());
    let keys: Vec<Vec<u8>> = t.iter().map(|r| r.key.clone()).collect();
    let expected: Vec<Vec<u8>> = ["b", "c", "e", "f", "h"]
        .iter()
        .map(|k| k.as_bytes().to_vec())
        .collect();
    assert_eq!(keys, expected);
    assert_eq!(t.len(), 5);
}

#[test]
fn remove_everything_empties_the_tree() {
    let mut t = AvlTree::new();
    for i in 0..64u8 {
        t.insert(Record::new(vec![i], vec![i]));
    }
    for i in (0..64u8).rev() {
        assert!(t.remove(&[i]).is_some());
        assert!(t.check_invariants());
    }
    assert!(t.is_empty());
    assert_eq!(t.height(), 0);
}

#[test]
fn random_operations_preserve_avl_invariant() {
    let mut rng = StdRng::seed_from_u64(0xA71);
    let mut tree = AvlTree::new();
    let mut model: BTreeMap<Vec<u8>, Vec<u8>> = BTreeMap::new();

    for step in 0..5_000 {
        let key = vec![rng.gen_range(0..200u8), rng.gen_range(0..4u8)];
        if rng.gen_bool(0.6) {
            let value = vec![step as u8];
            let old = tree.insert(Record::new(key.clone(), value.clone()));
            assert_eq!(old.map(|r| r.value), model.insert(key, value));
        } else {
            let old = tree.remove(&key);
            assert_eq!(old.map(|r| r.value), model.remove(&key));
        }
        assert!(tree.check_invariants(), "AVL invariant broken at step {}", step);
        assert_eq!(tree.len(), model.len());
    }

    let tree_items: Vec<(Vec<u8>, Vec<u8>)> =
        tree.iter().map(|r| (r.key.clone(), r.value.clone())).collect();
    let model_items: Vec<(Vec<u8>, Vec<u8>)> = model.into_iter().collect();
    assert_eq!(tree_items, model_items);
}

#[test]
fn memtable_workload_keeps_tree_balanced() {
    let mut rng = StdRng::seed_from_u64(99);
    let mut m = Memtable::new();
    for _ in 0..2_000 {
        let key = format!("key{:03}", rng.gen_range(0..300));
        if rng.gen_bool(0.25) {
            m.delete(key.as_bytes());
        } else {
            m.put(rec(&key, "value"));
        }
    }
    assert!(m.tree().check_invariants());
}

// -------------------- Load --------------------

#[test]
fn write_load_10k_unique_keys() {
    let mut m = Memtable::new();
    for i in 0..10_000u64 {
        m.put(Record::new(format!("key{:05}", i), vec![b'x'; 32]));
    }
    assert_eq!(m.len(), 10_000);
    for i in (0..10_000u64).step_by(997) {
        assert!(m.get(format!("key{:05}", i).as_bytes()).is_ok());
    }
}
