//! Tier 5: Concurrency
//!
//! - writes are serialized
//! - readers never observe a half-applied batch or load
//! - concurrent inserts get distinct, dense ids

use crate::test_utils::*;
use haystack::{Haystack, Predicate, VectorId};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;

#[test]
fn concurrent_inserts_get_dense_ids() {
    init_tracing();
    let store = Arc::new(Haystack::new("threads"));
    let threads = 8;
    let per_thread = 200;
    let barrier = Arc::new(Barrier::new(threads));

    let handles: Vec<_> = (0..threads)
        .map(|t| {
            let store = Arc::clone(&store);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                (0..per_thread)
                    .map(|i| {
                        store
                            .add_vector(
                                &[t as f32, i as f32],
                                tags(&[("thread", &t.to_string())]),
                            )
                            .unwrap()
                    })
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let mut seen = HashSet::new();
    for handle in handles {
        for id in handle.join().unwrap() {
            assert!(seen.insert(id));
        }
    }
    assert_eq!(seen.len(), threads * per_thread);
    assert!((0..(threads * per_thread) as u64).all(|i| seen.contains(&VectorId::new(i))));

    for t in 0..threads {
        let hits = store
            .search(&[1.0, 1.0], &Predicate::eq("thread", t.to_string()), 1000)
            .unwrap();
        assert_eq!(hits.len(), per_thread);
        for hit in hits {
            assert_eq!(store.get_vector(hit.id).unwrap()[0], t as f32);
        }
    }
}

#[test]
fn readers_see_whole_batches_only() {
    init_tracing();
    let store = Arc::new(Haystack::new("batches"));
    let batch = 500;
    let rounds = 20;
    let done = Arc::new(AtomicBool::new(false));

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let store = Arc::clone(&store);
            let done = Arc::clone(&done);
            thread::spawn(move || {
                let mut observations = 0usize;
                while !done.load(Ordering::Acquire) {
                    let hits = store
                        .search(&[1.0, 0.0, 0.0], &Predicate::eq("all", "yes"), 100_000)
                        .unwrap();
                    assert_eq!(hits.len() % batch, 0, "saw {} hits", hits.len());
                    assert_eq!(store.len() % batch, 0);
                    observations += 1;
                }
                observations
            })
        })
        .collect();

    for round in 0..rounds {
        let vectors = random_vectors(round as u64, batch, 3);
        store
            .batch_add_vectors(vectors, vec![tags(&[("all", "yes")]); batch])
            .unwrap();
    }
    done.store(true, Ordering::Release);

    for reader in readers {
        assert!(reader.join().unwrap() > 0);
    }
    assert_eq!(store.len(), batch * rounds);
}

#[test]
fn readers_see_old_or_new_state_across_load() {
    init_tracing();
    let small = scenario_store();
    let small_bytes = small.save_state().unwrap();
    let big = Haystack::new("big");
    big.batch_add_vectors(random_vectors(1, 300, 2), vec![tags(&[("g", "A")]); 300])
        .unwrap();
    let big_bytes = big.save_state().unwrap();

    let store = Arc::new(Haystack::new("swap"));
    store.load_state(&small_bytes).unwrap();
    let done = Arc::new(AtomicBool::new(false));

    let reader = {
        let store = Arc::clone(&store);
        let done = Arc::clone(&done);
        thread::spawn(move || {
            while !done.load(Ordering::Acquire) {
                let n = store
                    .search(&[1.0, 0.0], &Predicate::eq("g", "A"), 1000)
                    .unwrap()
                    .len();
                assert!(n == 2 || n == 300, "saw {} hits", n);
            }
        })
    };

    for i in 0..50 {
        let bytes = if i % 2 == 0 { &big_bytes } else { &small_bytes };
        store.load_state(bytes).unwrap();
    }
    done.store(true, Ordering::Release);
    reader.join().unwrap();
}
