use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use memtable::{Memtable, Record};

const N_KEYS: usize = 10_000;

fn memtable_insert_benchmark(c: &mut Criterion) {
    c.bench_function("memtable_insert_sequential_10k", |b| {
        b.iter_batched(
            Memtable::new,
            |mut mem| {
                for i in 0..N_KEYS {
                    mem.put(Record::new(format!("key{:06}", i), b"value".to_vec()));
                }
                mem
            },
            BatchSize::SmallInput,
        );
    });

    c.bench_function("memtable_insert_overwrite_10k", |b| {
        b.iter_batched(
            Memtable::new,
            |mut mem| {
                for i in 0..N_KEYS {
                    mem.put(Record::new(format!("key{}", i % 100), b"value".to_vec()));
                }
                mem
            },
            BatchSize::SmallInput,
        );
    });
}

fn memtable_get_benchmark(c: &mut Criterion) {
    let mut mem = Memtable::new();
    for i in 0..N_KEYS {
        mem.put(Record::new(format!("key{:06}", i), b"value".to_vec()));
    }

    c.bench_function("memtable_get_10k", |b| {
        b.iter(|| {
            for i in 0..N_KEYS {
                let key = format!("key{:06}", i).into_bytes();
                assert!(mem.get(&key).is_ok());
            }
        });
    });
}

criterion_group!(benches, memtable_insert_benchmark, memtable_get_benchmark);
criterion_main!(benches);
