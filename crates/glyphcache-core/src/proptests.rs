use super::*;
use crate::test_support::{registry_with, MockEngine};
use proptest::prelude::*;
use std::cmp::Ordering;
use std::sync::Arc;

fn arb_key() -> impl Strategy<Value = FaceKey<'static>> {
    (
        proptest::option::of("[a-c]{0,3}"),
        -64i32..64,
        0u32..32,
    )
        .prop_map(|(name, size, bits)| {
            let size = Fixed::from_bits(size << 14);
            let flags = StyleFlags::from_bits_truncate(bits);
            match name {
                Some(name) => FaceKey::new(name, size, flags),
                None => FaceKey::unnamed(size, flags),
            }
        })
}

// Property: equal keys hash equally, and only equal keys compare Equal
proptest! {
    #[test]
    fn prop_hash_consistent_with_compare(a in arb_key(), b in arb_key()) {
        if a.compare(&b) == Ordering::Equal {
            prop_assert_eq!(a.hash_value(), b.hash_value());
            prop_assert_eq!(&a, &b);
        }
        prop_assert_eq!(a.compare(&b), b.compare(&a).reverse());
        prop_assert_eq!(a.compare(&a), Ordering::Equal);
    }
}

// Property: compare is transitive, so it is a total order
proptest! {
    #[test]
    fn prop_compare_transitive(a in arb_key(), b in arb_key(), c in arb_key()) {
        if a.compare(&b) != Ordering::Greater && b.compare(&c) != Ordering::Greater {
            prop_assert_ne!(a.compare(&c), Ordering::Greater);
        }
    }
}

// Property: a borrowed lookup key behaves exactly like its owned clone
proptest! {
    #[test]
    fn prop_owned_key_matches_borrowed(name in "[a-z ]{1,12}", size in 1i32..200) {
        let borrowed = FaceKey::new(name.as_str(), Fixed::from_int(size), StyleFlags::ANTIALIAS);
        let owned = borrowed.to_owned_key();
        prop_assert_eq!(borrowed.hash_value(), owned.hash_value());
        prop_assert_eq!(borrowed.compare(&owned), Ordering::Equal);
    }
}

#[derive(Debug, Clone)]
enum Op {
    Acquire(u8),
    Release(usize),
    Glyph(usize, u32),
    Budget(usize, usize),
    Flush,
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => (0u8..4).prop_map(Op::Acquire),
        2 => any::<usize>().prop_map(Op::Release),
        8 => (any::<usize>(), 0u32..24).prop_map(|(h, cp)| Op::Glyph(h, cp)),
        1 => (0usize..3000, 1usize..3000).prop_map(|(a, b)| Op::Budget(a.min(b), a.max(b))),
        1 => Just(Op::Flush),
    ]
}

// Property: any interleaving of face and glyph operations keeps the
// accounting and LRU/table bijection invariants, and eviction converges
proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]
    #[test]
    fn prop_cache_invariants(ops in proptest::collection::vec(arb_op(), 1..80)) {
        let engine = MockEngine::new(100).with_size(7, 400).with_size(13, 1200);
        let cache = CacheManager::with_config(
            Arc::new(engine),
            registry_with(&["Prop Sans"]),
            CacheConfig::with_budget(600, 1000),
        )
        .unwrap();
        let mut handles: Vec<FaceHandle> = Vec::new();

        for op in ops {
            match op {
                Op::Acquire(size) => {
                    let key = FaceKey::new("Prop Sans", Fixed::from_int(i32::from(size) + 8), StyleFlags::ANTIALIAS);
                    handles.push(cache.acquire_face(&key).unwrap());
                }
                Op::Release(i) if !handles.is_empty() => {
                    let handle = handles.swap_remove(i % handles.len());
                    cache.release_face(handle);
                }
                Op::Glyph(i, cp) if !handles.is_empty() => {
                    let handle = &handles[i % handles.len()];
                    let before = cache.stats();
                    let result = cache.get_glyph(handle, cp);
                    let after = cache.stats();
                    if cp == 0 {
                        prop_assert!(result.is_err());
                        prop_assert_eq!(after.running_total, before.running_total);
                        prop_assert_eq!(after.glyphs, before.glyphs);
                    } else {
                        prop_assert!(result.is_ok());
                        let missed = after.misses > before.misses;
                        if missed && before.running_total + result.unwrap().byte_size() > after.max_budget {
                            // Eviction ran and always reaches min, emptying the LRU if it must
                            prop_assert!(after.running_total <= after.min_budget);
                            prop_assert!(!after.budget_exceeded);
                        } else {
                            prop_assert_eq!(cache.lru_codepoints().first().copied(), Some(cp));
                        }
                    }
                }
                Op::Budget(min, max) => {
                    cache.configure_budget(min, max).unwrap();
                }
                Op::Flush => cache.flush(),
                _ => {}
            }
            prop_assert_eq!(cache.verify_consistency(), Ok(()));
        }

        drop(handles);
        let stats = cache.stats();
        prop_assert_eq!(stats.faces, 0);
        prop_assert_eq!(stats.glyphs, 0);
        prop_assert_eq!(stats.running_total, 0);
        prop_assert_eq!(stats.faces_created, stats.faces_destroyed);
    }
}
