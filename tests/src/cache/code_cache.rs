use dbt_cache::code_cache::LDR_PC_LITERAL;
use dbt_cache::CodeCache;

#[test]
fn emit_patch_read() {
    let mut cache = CodeCache::new(4096, 64).unwrap();
    let start = cache.transl_addr();
    cache.emit_u32(0xe1a0_0000);
    cache.emit_u32(0);
    assert_eq!(cache.read_u32(start), 0xe1a0_0000);
    cache.patch_u32(start + 4, 0x1234_5678);
    assert_eq!(cache.read_u32(start + 4), 0x1234_5678);
    assert_eq!(cache.transl_addr(), start + 8);
}

#[test]
fn emit_bytes_advances_cursor() {
    let mut cache = CodeCache::new(4096, 64).unwrap();
    let start = cache.transl_addr();
    cache.emit_bytes(&[1, 2, 3, 4, 5, 6, 7, 8]);
    assert_eq!(cache.read_u32(start), u32::from_le_bytes([1, 2, 3, 4]));
    assert_eq!(cache.transl_addr() - start, 8);
}

#[test]
fn reserve_within_region_is_stable() {
    let mut cache = CodeCache::new(4096, 64).unwrap();
    let a = cache.reserve(100).unwrap();
    assert_eq!(a, cache.transl_addr());
    cache.emit_u32(0);
    let b = cache.reserve(100).unwrap();
    assert_eq!(b, a + 4);
}

#[test]
fn exhausted_region_chains_with_absolute_jump() {
    let mut cache = CodeCache::new(4096, 64).unwrap();
    let first = cache.reserve(1024).unwrap();
    for _ in 0..256 {
        cache.emit_u32(0);
    }
    let tail = cache.transl_addr();
    // 3072 bytes left, request cannot fit with the guard
    let second = cache.reserve(3500).unwrap();
    assert_ne!(second, tail);
    assert_eq!(cache.read_u32(tail), LDR_PC_LITERAL);
    assert_eq!(cache.read_u32(tail + 4), second as u32);
    assert!(cache.contains(first));
    assert!(cache.contains(second));
}

#[test]
fn contains_tracks_all_regions() {
    let cache = CodeCache::new(4096, 64).unwrap();
    let base = cache.transl_addr();
    assert!(cache.contains(base));
    assert!(cache.contains(base + 4095));
    assert!(!cache.contains(base + 4096));
    assert!(!cache.contains(0x10));
}

#[test]
fn wx_toggle() {
    let mut cache = CodeCache::new(4096, 64).unwrap();
    cache.emit_u32(0xe1a0_0000);
    cache.set_executable().unwrap();
    cache.set_writable().unwrap();
    cache.emit_u32(0xe1a0_0000);
}
