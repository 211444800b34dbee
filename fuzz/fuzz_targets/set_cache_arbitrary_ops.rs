#![no_main]

use libfuzzer_sys::fuzz_target;
use setcache::error::AccessError;
use setcache::{CacheLine, CoherenceState, Policy, SetAssociativeCache};

// Fuzz arbitrary access sequences on SetAssociativeCache
//
// The first byte picks geometry and policy, then every pair of bytes is one
// operation: find, change, touch, check+insert, insert, or a stale insert.
fuzz_target!(|data: &[u8]| {
    let Some((&header, ops)) = data.split_first() else {
        return;
    };

    let associativity = usize::from(header % 4) + 1;
    let num_sets = usize::from((header >> 2) % 4) + 1;
    let policy = if header & 0x80 == 0 {
        Policy::Lru
    } else {
        Policy::Random
    };
    let mut cache =
        SetAssociativeCache::with_seed(num_sets * associativity, associativity, policy, 0xfeed)
            .unwrap();

    for pair in ops.chunks_exact(2) {
        let op = pair[0] % 6;
        let set = usize::from(pair[0] >> 3) % num_sets;
        let tag = u64::from(pair[1] % 16);
        let state = CoherenceState::ALL[usize::from(pair[1] >> 4) % CoherenceState::ALL.len()];

        match op {
            0 => {
                let found = cache.find_state(set, tag).unwrap();
                assert_eq!(cache.lookup(set, tag).unwrap().unwrap_or_default(), found);
            },
            1 => {
                let resident = cache.contains(set, tag).unwrap();
                assert_eq!(cache.change_state(set, tag, state).unwrap(), resident);
                if resident {
                    assert_eq!(cache.find_state(set, tag).unwrap(), state);
                }
            },
            2 => {
                let resident = cache.contains(set, tag).unwrap();
                assert_eq!(cache.update_lru(set, tag).unwrap(), resident);
                if resident && policy == Policy::Lru {
                    assert_eq!(cache.recency_order(set).unwrap()[0], tag);
                }
            },
            3 => {
                let resident = cache.contains(set, tag).unwrap();
                let (candidate, dirty) = cache.check_writeback(set).unwrap();
                assert_eq!(dirty, candidate.state.is_dirty());
                let evicted = cache.insert_line_evicting(candidate, tag, state).unwrap();
                if resident {
                    assert_eq!(evicted, None);
                } else {
                    assert_eq!(evicted, Some(candidate.line()));
                }
            },
            4 => {
                let resident = cache.contains(set, tag).unwrap();
                let result = cache.insert_line(set, tag, state);
                if policy == Policy::Random && !resident {
                    assert_eq!(result, Err(AccessError::CandidateRequired { set }));
                    assert!(!cache.contains(set, tag).unwrap());
                } else {
                    result.unwrap();
                    assert_eq!(cache.find_state(set, tag).unwrap(), state);
                }
            },
            _ => {
                // candidate goes stale before it is used
                let resident = cache.contains(set, tag).unwrap();
                let candidate = cache.select_eviction_candidate(set).unwrap();
                assert!(cache.update_lru(set, candidate.tag).unwrap());
                assert!(cache.change_state(set, candidate.tag, state).unwrap());

                let expected = match policy {
                    Policy::Lru => {
                        let tail = *cache.recency_order(set).unwrap().last().unwrap();
                        CacheLine::new(tail, cache.find_state(set, tail).unwrap())
                    },
                    Policy::Random => CacheLine::new(candidate.tag, state),
                };
                let evicted = cache.insert_line_evicting(candidate, tag, state).unwrap();
                if resident {
                    assert_eq!(evicted, None);
                } else {
                    assert_eq!(evicted, Some(expected));
                    assert!(!cache.contains(set, expected.tag).unwrap());
                }
            },
        }

        assert_eq!(cache.set(set).unwrap().len(), associativity);
    }

    cache.check_invariants().unwrap();
});
