use criterion::{black_box, criterion_group, criterion_main, Criterion};
use lida_data::cache::{hash_memory, hash_string};
use lida_data::{Arena, LruCache};

fn bench_lru(c: &mut Criterion) {
    let mut group = c.benchmark_group("LRU Cache");
    let mut arena = Arena::new(64 * 1024);

    // Working set fits: every lookup after warm-up is a hit.
    let budget = LruCache::<u32, u64>::budget_for(256);
    let mut cache: LruCache<u32, u64> =
        LruCache::new_in(&mut arena, "bench-hits", budget, Box::new(|_, _| {})).unwrap();
    for key in 0..256 {
        cache.get(&mut arena, key);
    }
    group.bench_function("Hits (256 keys)", |b| {
        let mut key = 0u32;
        b.iter(|| {
            key = (key + 97) % 256;
            black_box(cache.get(&mut arena, black_box(key)).created);
        });
    });

    // Working set twice the capacity: cycling evicts on every lookup.
    let budget = LruCache::<u32, u64>::budget_for(128);
    let mut evicting: LruCache<u32, u64> =
        LruCache::new_in(&mut arena, "bench-evict", budget, Box::new(|_, v| *v = 0)).unwrap();
    group.bench_function("Misses with eviction (256 keys, 128 slots)", |b| {
        let mut key = 0u32;
        b.iter(|| {
            key = (key + 1) % 256;
            let lookup = evicting.get(&mut arena, black_box(key));
            *lookup.value += 1;
            black_box(lookup.created);
        });
    });

    group.finish();
}

fn bench_hashes(c: &mut Criterion) {
    let mut group = c.benchmark_group("Content Hashes");
    let attachments = [0u8; 96];
    group.bench_function("hash_memory (96 bytes)", |b| {
        b.iter(|| black_box(hash_memory(black_box(&attachments))));
    });
    group.bench_function("hash_string (shader tag)", |b| {
        b.iter(|| black_box(hash_string(black_box("shaders/deferred/gbuffer.frag"))));
    });
    group.finish();
}

criterion_group!(benches, bench_lru, bench_hashes);
criterion_main!(benches);
