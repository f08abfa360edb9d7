use dbt_cache::PcCache;
use dbt_core::TranslationError;

#[test]
fn lookup_miss_is_none() {
    let mut cache = PcCache::new(10);
    assert_eq!(cache.lookup(0x4000_0000), None);
}

#[test]
fn dense_colliding_inserts_stay_retrievable() {
    let mut cache = PcCache::new(10);
    // 32 translated addresses all sharing one home slot
    let n = 32;
    for i in 0..n {
        cache.insert(0x40 + (i << 10), 0x8000 + i * 4).unwrap();
    }
    // repeated lookups exercise the move-toward-home swap
    for _ in 0..3 {
        for i in 0..n {
            assert_eq!(cache.lookup(0x40 + (i << 10)), Some(0x8000 + i * 4));
        }
    }
}

#[test]
fn lookup_survives_swap_past_insertion_bound() {
    // 16 slots, insertion bound 1. 0x22 collides with 0x12 and lands
    // in the home slot of 0x13. The hit on 0x13 swaps it toward home,
    // displacing 0x22 beyond the bound an insert would tolerate; the
    // entry must still be found.
    let mut cache = PcCache::new(4);
    cache.insert(0x12, 0x8000).unwrap();
    cache.insert(0x22, 0x8004).unwrap();
    cache.insert(0x13, 0x8008).unwrap();
    assert_eq!(cache.lookup(0x13), Some(0x8008));
    assert_eq!(cache.lookup(0x22), Some(0x8004));
    assert_eq!(cache.lookup(0x12), Some(0x8000));
}

#[test]
fn reinsert_same_key_updates_in_place() {
    let mut cache = PcCache::new(10);
    cache.insert(0x1000, 0x8000).unwrap();
    cache.insert(0x1000, 0x9000).unwrap();
    assert_eq!(cache.lookup(0x1000), Some(0x9000));
}

#[test]
fn probe_bound_reports_full() {
    let mut cache = PcCache::new(6);
    // 64 entries, probe limit 6: the chain overflows quickly
    let mut err = None;
    for i in 0..16usize {
        if let Err(e) = cache.insert(0x40 + (i << 6), i) {
            err = Some(e);
            break;
        }
    }
    assert!(matches!(err, Some(TranslationError::PcCacheFull)));
    assert_eq!(cache.capacity(), 64);
}
