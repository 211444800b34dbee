#![no_main]

use libfuzzer_sys::fuzz_target;
use setcache::ds::{RecencyList, WayId};

// Fuzz arbitrary operation sequences on RecencyList
//
// Tests random sequences of push_front, push_back, move_to_front, get_mut
// and positional lookup against the list's structural invariants.
fuzz_target!(|data: &[u8]| {
    let mut list: RecencyList<u32> = RecencyList::new();
    let mut ids: Vec<WayId> = Vec::new();

    for pair in data.chunks_exact(2) {
        let op = pair[0] % 5;
        let value = u32::from(pair[1]);

        match op {
            0 => {
                let id = list.push_front(value);
                ids.push(id);
                assert_eq!(list.front_id(), Some(id));
                assert_eq!(list.get(id), Some(&value));
            },
            1 => {
                let id = list.push_back(value);
                ids.push(id);
                assert_eq!(list.back_id(), Some(id));
            },
            2 => {
                if !ids.is_empty() {
                    let id = ids[value as usize % ids.len()];
                    let len = list.len();
                    assert!(list.move_to_front(id));
                    assert_eq!(list.front_id(), Some(id));
                    assert_eq!(list.len(), len);
                }
            },
            3 => {
                if !ids.is_empty() {
                    let id = ids[value as usize % ids.len()];
                    if let Some(slot) = list.get_mut(id) {
                        *slot = value;
                    }
                    assert_eq!(list.get(id), Some(&value));
                }
            },
            _ => {
                let slot = value as usize;
                assert_eq!(list.id_at(slot).is_some(), slot < list.len());
            },
        }

        #[cfg(debug_assertions)]
        list.debug_validate_invariants();
        assert_eq!(list.len(), ids.len());
        assert_eq!(list.iter().count(), list.len());
    }
});
