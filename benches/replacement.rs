//! LRU vs random replacement under a skewed access stream.
//!
//! Each iteration runs a full hit/miss access cycle the way a coherence
//! driver would: look up, promote on hit, check for writeback and fill on
//! miss. Reads fill `Exclusive`, writes fill or upgrade to `Modified`.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use setcache::{CoherenceState, Policy, SetAssociativeCache};

const NUM_LINES: usize = 2048;
const OPS: u64 = 50_000;

/// 80% of accesses go to the first 10% of blocks.
fn next_block(rng: &mut SmallRng, universe: u64) -> u64 {
    let hot = (universe / 10).max(1);
    if rng.random::<f64>() < 0.8 {
        rng.random_range(0..hot)
    } else {
        rng.random_range(hot..universe)
    }
}

fn run(cache: &mut SetAssociativeCache, rng: &mut SmallRng) -> u64 {
    let num_sets = cache.num_sets() as u64;
    let universe = NUM_LINES as u64 * 8;
    let mut writebacks = 0;
    for _ in 0..OPS {
        let block = next_block(rng, universe);
        let set = (block % num_sets) as usize;
        // offset keeps real tags clear of the placeholder tags
        let tag = (block / num_sets) + (1 << 20);
        let write = rng.random::<f64>() < 0.3;

        if cache.find_state(set, tag).unwrap().is_valid() {
            cache.update_lru(set, tag).unwrap();
            if write {
                cache.change_state(set, tag, CoherenceState::Modified).unwrap();
            }
        } else {
            let (candidate, dirty) = cache.check_writeback(set).unwrap();
            writebacks += dirty as u64;
            let state = if write {
                CoherenceState::Modified
            } else {
                CoherenceState::Exclusive
            };
            cache.insert_line_evicting(candidate, tag, state).unwrap();
        }
    }
    writebacks
}

fn bench_policies(c: &mut Criterion) {
    let mut group = c.benchmark_group("replacement_hotset");
    group.throughput(Throughput::Elements(OPS));

    for assoc in [2usize, 8, 32] {
        for policy in [Policy::Lru, Policy::Random] {
            group.bench_with_input(
                BenchmarkId::new(policy.to_string(), assoc),
                &assoc,
                |b, &assoc| {
                    b.iter(|| {
                        let mut cache =
                            SetAssociativeCache::with_seed(NUM_LINES, assoc, policy, 42).unwrap();
                        let mut rng = SmallRng::seed_from_u64(7);
                        black_box(run(&mut cache, &mut rng))
                    })
                },
            );
        }
    }
    group.finish();
}

criterion_group!(benches, bench_policies);
criterion_main!(benches);
