use super::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashSet;
use std::io::Cursor;

// -------------------- BitVector --------------------

#[test]
fn bitvector_set_and_test() {
    let mut bv = BitVector::new(20);
    assert_eq!(bv.len(), 20);
    assert_eq!(bv.as_bytes().len(), 3);

    bv.set(0).unwrap();
    bv.set(9).unwrap();
    bv.set(19).unwrap();

    assert!(bv.is_set(0).unwrap());
    assert!(bv.is_set(9).unwrap());
    assert!(bv.is_set(19).unwrap());
    assert!(!bv.is_set(1).unwrap());
    assert!(!bv.is_set(10).unwrap());
    assert_eq!(bv.count_ones(), 3);
}

#[test]
fn bitvector_set_is_idempotent() {
    let mut bv = BitVector::new(8);
    bv.set(3).unwrap();
    bv.set(3).unwrap();
    assert!(bv.is_set(3).unwrap());
    assert_eq!(bv.as_bytes(), &[0b0000_1000]);
}

#[test]
fn bitvector_out_of_bounds() {
    let mut bv = BitVector::new(10);
    assert!(matches!(
        bv.set(10),
        Err(BloomError::OutOfBounds { index: 10, len: 10 })
    ));
    assert!(matches!(bv.is_set(64), Err(BloomError::OutOfBounds { .. })));
}

#[test]
fn bitvector_from_bytes_checks_length() {
    let bv = BitVector::from_bytes(vec![0xFF, 0x01], 9).unwrap();
    assert!(bv.is_set(8).unwrap());
    assert!(BitVector::from_bytes(vec![0xFF], 9).is_err());
}

// -------------------- Construction --------------------

#[test]
fn new_creates_valid_filter() {
    let bf = BloomFilter::new(100, 0.01);
    assert!(bf.num_bits() > 0);
    assert!(bf.num_hashes() > 0);
    assert!(!bf.bits().is_empty());
}

#[test]
fn dimensions_follow_sizing_formula() {
    let (m, k) = BloomParams::new(10_000, 0.01).dimensions();
    assert_eq!(m, 95_851);
    assert_eq!(k, 7);
}

#[test]
#[should_panic(expected = "expected_items must be > 0")]
fn new_panics_on_zero_items() {
    BloomFilter::new(0, 0.01);
}

#[test]
#[should_panic(expected = "false_positive_rate must be in (0, 1)")]
fn new_panics_on_zero_fpr() {
    BloomFilter::new(100, 0.0);
}

#[test]
#[should_panic(expected = "false_positive_rate must be in (0, 1)")]
fn new_panics_on_one_fpr() {
    BloomFilter::new(100, 1.0);
}

// -------------------- Insert / Contains --------------------

#[test]
fn inserted_key_is_found() {
    let mut bf = BloomFilter::new(100, 0.01);
    bf.insert(b"hello");
    assert!(bf.may_contain(b"hello"));
}

#[test]
fn missing_key_is_not_found() {
    let bf = BloomFilter::new(100, 0.01);
    assert!(!bf.may_contain(b"hello"));
}

#[test]
fn no_false_negatives_for_random_keys() {
    let mut rng = StdRng::seed_from_u64(7);
    let mut bf = BloomFilter::new(2_000, 0.01);
    let keys: Vec<Vec<u8>> = (0..2_000)
        .map(|_| {
            let len = rng.gen_range(1..32);
            (0..len).map(|_| rng.gen()).collect()
        })
        .collect();

    for k in &keys {
        bf.insert(k);
    }
    for k in &keys {
        assert!(bf.may_contain(k), "false negative for {:?}", k);
    }
}

#[test]
fn false_positive_rate_is_reasonable() {
    let n = 10_000;
    let fpr = 0.01;
    let mut rng = StdRng::seed_from_u64(42);
    let mut bf = BloomFilter::new(n, fpr);

    let mut inserted = HashSet::new();
    while inserted.len() < n {
        inserted.insert(rng.gen::<u64>());
    }
    for k in &inserted {
        bf.insert(&k.to_le_bytes());
    }

    let mut false_positives = 0;
    let mut tested = 0;
    while tested < 20_000 {
        let k = rng.gen::<u64>();
        if inserted.contains(&k) {
            continue;
        }
        tested += 1;
        if bf.may_contain(&k.to_le_bytes()) {
            false_positives += 1;
        }
    }

    let actual_fpr = false_positives as f64 / tested as f64;
    // Allow up to 3x the target FPR (statistical variance)
    assert!(
        actual_fpr < fpr * 3.0,
        "FPR too high: {:.4} (target {:.4})",
        actual_fpr,
        fpr
    );
}

#[test]
fn binary_key() {
    let mut bf = BloomFilter::new(10, 0.01);
    let key = vec![0u8, 1, 2, 255, 254, 253];
    bf.insert(&key);
    assert!(bf.may_contain(&key));
}

// -------------------- Serialization --------------------

#[test]
fn roundtrip_serialize_reconstruct() {
    let mut bf = BloomFilter::new(500, 0.01);
    for i in 0..500u64 {
        bf.insert(&i.to_le_bytes());
    }

    let buf = bf.to_bytes().unwrap();
    assert_eq!(buf.len(), bf.serialized_size());
    assert_eq!(&buf[..8], &(bf.bits().as_bytes().len() as u64).to_le_bytes());

    let bf2 = BloomFilter::read_from(&mut Cursor::new(&buf), 500, 0.01).unwrap();

    assert_eq!(bf2.num_bits(), bf.num_bits());
    assert_eq!(bf2.num_hashes(), bf.num_hashes());
    assert_eq!(bf2.bits(), bf.bits());

    for i in 0..500u64 {
        assert!(
            bf2.may_contain(&i.to_le_bytes()),
            "key {} missing after roundtrip",
            i
        );
    }
}

#[test]
fn serialized_size_is_correct() {
    let bf = BloomFilter::new(100, 0.05);
    // 8 (byte_len) + bits
    assert_eq!(bf.serialized_size(), 8 + bf.bits().as_bytes().len());
}

#[test]
fn reconstruct_rejects_mismatched_params() {
    let bf = BloomFilter::new(500, 0.01);
    let buf = bf.to_bytes().unwrap();

    let result = BloomFilter::read_from(&mut Cursor::new(&buf), 1_000, 0.01);
    assert!(matches!(result, Err(BloomError::Decode(_))));
}

#[test]
fn reconstruct_rejects_truncated_bytes() {
    let bf = BloomFilter::new(500, 0.01);
    let mut buf = bf.to_bytes().unwrap();
    buf.truncate(buf.len() - 3);

    let result = BloomFilter::read_from(&mut Cursor::new(&buf), 500, 0.01);
    assert!(matches!(result, Err(BloomError::Decode(_))));
}

#[test]
fn reconstruct_rejects_oversized_prefix() {
    let buf = (256 * 1024 * 1024u64).to_le_bytes();
    let result = BloomFilter::read_from(&mut Cursor::new(&buf), 500, 0.01);
    assert!(matches!(result, Err(BloomError::Decode(_))));
}

// -------------------- Debug --------------------

#[test]
fn debug_impl_works() {
    let bf = BloomFilter::new(100, 0.01);
    let debug = format!("{:?}", bf);
    assert!(debug.contains("BloomFilter"));
    assert!(debug.contains("num_bits"));
    assert!(debug.contains("num_hashes"));
}

// -------------------- Edge cases --------------------

#[test]
fn single_item_filter() {
    let mut bf = BloomFilter::new(1, 0.01);
    bf.insert(b"only");
    assert!(bf.may_contain(b"only"));
}

#[test]
fn very_low_fpr() {
    let bf = BloomFilter::new(100, 0.0001);
    assert!(bf.num_bits() > 1000);
    assert!(bf.num_hashes() > 5);
}
