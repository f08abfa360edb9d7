use std::sync::Arc;
use std::thread;

use dbt_cache::ForwardCache;

#[test]
fn lookup_after_insert() {
    let fwd = ForwardCache::new();
    assert_eq!(fwd.lookup(0x8000), None);
    fwd.insert(0x8000, 0x4000_0000);
    assert_eq!(fwd.lookup(0x8000), Some(0x4000_0000));
    assert_eq!(fwd.len(), 1);
}

#[test]
fn reinsert_overwrites() {
    let fwd = ForwardCache::new();
    fwd.insert(0x8000, 0x1000);
    fwd.insert(0x8000, 0x2000);
    assert_eq!(fwd.lookup(0x8000), Some(0x2000));
    assert_eq!(fwd.len(), 1);
}

#[test]
fn shared_across_threads() {
    let fwd = Arc::new(ForwardCache::new());
    let mut handles = Vec::new();
    for t in 0..4usize {
        let fwd = Arc::clone(&fwd);
        handles.push(thread::spawn(move || {
            for i in 0..100usize {
                fwd.insert(t * 0x1000 + i * 4, t * 0x1000_0000 + i);
            }
        }));
    }
    for h in handles {
        h.join().unwrap();
    }
    assert_eq!(fwd.len(), 400);
    assert_eq!(fwd.lookup(0x3000 + 96), Some(0x3000_0000 + 24));
}
