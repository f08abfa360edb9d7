use dbt_core::{EngineConfig, TranslationError};
use dbt_engine as engine;

const ADD_R0_R0_1: u32 = 0xe280_0001;
const BX_LR: u32 = 0xe12f_ff1e;
const LDR_PC_LITERAL: u32 = 0xe51f_f004;

fn small_config() -> EngineConfig {
    EngineConfig {
        region_size: 1 << 16,
        pc_cache_bits: 12,
        ..EngineConfig::default()
    }
}

fn guest(words: &[u32]) -> Vec<u32> {
    words.to_vec()
}

#[test]
fn bx_lr_closes_without_trampoline() {
    let code = guest(&[BX_LR]);
    let mut tld = engine::init(small_config()).unwrap();
    let entry = code.as_ptr() as usize;
    let transl = engine::translate_block(&mut tld, entry).unwrap();
    assert!(tld.code_cache().contains(transl));
    assert!(tld.trampolines().is_empty());
    // resolver jump: ldr pc through the gate literal
    assert_eq!(tld.code_cache().read_u32(transl), LDR_PC_LITERAL);
    assert_eq!(tld.stats().blocks, 1);
    assert_eq!(tld.stats().bytes, 8);
}

#[test]
fn budget_limited_run_closes_with_glue() {
    let code = guest(&[ADD_R0_R0_1; 80]);
    let mut tld = engine::init(small_config()).unwrap();
    let entry = code.as_ptr() as usize;
    let max = small_config().max_block_size;
    let transl = engine::translate_block(&mut tld, entry).unwrap();

    // the budget cuts the unit after max/4 instructions
    let consumed = max / 4;
    assert_eq!(tld.last_continuation(), entry + consumed * 4);

    // one unpatched trampoline targeting the continuation
    assert_eq!(tld.trampolines().len(), 1);
    let tramp = *tld.trampolines().get(0);
    assert_eq!(tramp.target, entry + consumed * 4);
    assert!(!tramp.patched);

    // copied body, then the glue jump through the stub
    let cache = tld.code_cache();
    assert_eq!(cache.read_u32(transl), ADD_R0_R0_1);
    assert_eq!(cache.read_u32(transl + max - 4), ADD_R0_R0_1);
    assert_eq!(cache.read_u32(transl + max), LDR_PC_LITERAL);
    assert_eq!(cache.read_u32(transl + max + 4), tramp.stub_addr as u32);
    assert_eq!(cache.read_u32(tramp.patch_site), tramp.stub_addr as u32);
}

#[test]
fn emitted_words_map_back_to_their_source() {
    let code = guest(&[ADD_R0_R0_1, ADD_R0_R0_1, BX_LR]);
    let mut tld = engine::init(small_config()).unwrap();
    let entry = code.as_ptr() as usize;
    let transl = engine::translate_block(&mut tld, entry).unwrap();
    // copied words carry their own source address; both words of the
    // resolver jump belong to the bx that produced them
    assert_eq!(tld.pc_cache_mut().lookup(transl), Some(entry));
    assert_eq!(tld.pc_cache_mut().lookup(transl + 4), Some(entry + 4));
    assert_eq!(tld.pc_cache_mut().lookup(transl + 8), Some(entry + 8));
    assert_eq!(tld.pc_cache_mut().lookup(transl + 12), Some(entry + 8));
    assert_eq!(tld.pc_cache_mut().lookup(transl + 16), None);
}

#[test]
#[should_panic(expected = "cannot hold one unit")]
fn undersized_region_is_rejected_at_init() {
    let config = EngineConfig {
        region_size: 1 << 10,
        ..EngineConfig::default()
    };
    let _ = engine::init(config);
}

#[test]
fn forward_cache_prevents_reemission() {
    let code = guest(&[BX_LR]);
    let mut tld = engine::init(small_config()).unwrap();
    let entry = code.as_ptr() as usize;
    let first = engine::translate_block(&mut tld, entry).unwrap();
    let second = engine::translate_block(&mut tld, entry).unwrap();
    assert_eq!(first, second);
    assert_eq!(tld.stats().blocks, 1);
    assert_eq!(tld.forward_cache().len(), 1);
}

#[test]
fn translated_code_is_rejected_as_source() {
    let code = guest(&[BX_LR]);
    let mut tld = engine::init(small_config()).unwrap();
    let transl = engine::translate_block(&mut tld, code.as_ptr() as usize).unwrap();
    let err = engine::translate_block(&mut tld, transl).unwrap_err();
    assert!(matches!(
        err,
        TranslationError::RetranslatingCache { addr } if addr == transl
    ));
}

#[test]
fn undefined_encoding_fails_translation() {
    let code = guest(&[ADD_R0_R0_1, 0xe7f0_00f0]);
    let mut tld = engine::init(small_config()).unwrap();
    let entry = code.as_ptr() as usize;
    let err = engine::translate_block(&mut tld, entry).unwrap_err();
    assert!(matches!(
        err,
        TranslationError::UnsupportedOpcode { addr, word: 0xe7f0_00f0 } if addr == entry + 4
    ));
}

#[test]
fn unconditional_branch_takes_one_trampoline() {
    // b .+16, then unreachable padding
    let code = guest(&[0xea00_0002, 0, 0, 0, BX_LR]);
    let mut tld = engine::init(small_config()).unwrap();
    let entry = code.as_ptr() as usize;
    let transl = engine::translate_block(&mut tld, entry).unwrap();
    assert_eq!(tld.trampolines().len(), 1);
    assert_eq!(tld.trampolines().get(0).target, entry + 16);
    // the unit is just the jump through the stub
    assert_eq!(tld.code_cache().read_u32(transl), LDR_PC_LITERAL);
    assert_eq!(tld.stats().bytes, 8);
}

#[test]
fn self_branch_resolves_through_early_mapping() {
    // bne . : taken target is the unit entry itself, published before
    // the body was translated
    let code = guest(&[0x1aff_fffe, BX_LR]);
    let mut tld = engine::init(small_config()).unwrap();
    let entry = code.as_ptr() as usize;
    let transl = engine::translate_block(&mut tld, entry).unwrap();

    // guard skip, then a direct jump back to the block start
    assert_eq!(tld.code_cache().read_u32(transl + 4), LDR_PC_LITERAL);
    assert_eq!(tld.code_cache().read_u32(transl + 8), transl as u32);
    // only the fall-through glue needed a trampoline
    assert_eq!(tld.trampolines().len(), 1);
    assert_eq!(tld.trampolines().get(0).target, entry + 4);
}

#[test]
fn branch_link_stores_original_return_address() {
    // bl .+8 at entry
    let code = guest(&[0xeb00_0000, BX_LR, BX_LR]);
    let mut tld = engine::init(small_config()).unwrap();
    let entry = code.as_ptr() as usize;
    let transl = engine::translate_block(&mut tld, entry).unwrap();
    let cache = tld.code_cache();
    // lr setup: load literal, skip it
    assert_eq!(cache.read_u32(transl), 0xe59f_e000);
    assert_eq!(cache.read_u32(transl + 4), 0xea00_0000);
    // the literal is the source return address, not a cache address
    assert_eq!(cache.read_u32(transl + 8), (entry + 4) as u32);
    assert_eq!(tld.trampolines().get(0).target, entry + 8);
}

#[test]
fn syscall_closes_at_the_boundary() {
    let code = guest(&[0xef00_0000, BX_LR]);
    let mut tld = engine::init(small_config()).unwrap();
    let entry = code.as_ptr() as usize;
    let transl = engine::translate_block(&mut tld, entry).unwrap();
    let cache = tld.code_cache();
    // the swi itself is copied, then glue resumes after it
    assert_eq!(cache.read_u32(transl), 0xef00_0000);
    assert_eq!(cache.read_u32(transl + 4), LDR_PC_LITERAL);
    assert_eq!(tld.trampolines().len(), 1);
    assert_eq!(tld.trampolines().get(0).target, entry + 4);
}

#[test]
fn pc_writing_copy_closes_through_resolver() {
    // pop {pc}
    let code = guest(&[0xe8bd_8000]);
    let mut tld = engine::init(small_config()).unwrap();
    let entry = code.as_ptr() as usize;
    let transl = engine::translate_block(&mut tld, entry).unwrap();
    let cache = tld.code_cache();
    assert_eq!(cache.read_u32(transl), 0xe8bd_8000);
    assert_eq!(cache.read_u32(transl + 4), LDR_PC_LITERAL);
    assert!(tld.trampolines().is_empty());
    assert_eq!(tld.stats().bytes, 12);
}

#[test]
fn start_transaction_maps_commit_to_gate() {
    let code = guest(&[BX_LR]);
    let commit_addr = code.as_ptr() as usize;
    let gates = engine::EngineGates {
        resolve: 0,
        commit: 0xdead_0000,
    };
    let mut tld = engine::init_with_gates(small_config(), gates).unwrap();
    engine::start_transaction(&mut tld, commit_addr);
    // a branch that reaches the commit address now resolves to the
    // gate instead of being translated
    assert_eq!(tld.forward_cache().lookup(commit_addr), Some(0xdead_0000));
    let resolved = engine::translate_block(&mut tld, commit_addr).unwrap();
    assert_eq!(resolved, 0xdead_0000);
}
