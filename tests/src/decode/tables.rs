use dbt_core::{Action, Instr, InstrGroup, OperandFlags};
use dbt_decode::key;
use dbt_decode::{decode, DescriptorSlot, DEFAULT_OPCODE_TABLE};

fn word(major: u32, minor: u32) -> u32 {
    0xe000_0000 | (major << 20) | (minor << 4)
}

#[test]
fn every_slot_resolves() {
    for major in 0..=0xffu32 {
        match DEFAULT_OPCODE_TABLE.slot(major as usize) {
            DescriptorSlot::Terminal(_) => {}
            DescriptorSlot::SubTable(sub) => assert_eq!(sub.len(), 16),
        }
        for minor in 0..=0xfu32 {
            let desc = decode(&DEFAULT_OPCODE_TABLE, word(major, minor));
            if desc.is_undefined() {
                assert_eq!(desc.action, Action::Fail);
                assert_eq!(desc.mnemonic, "UNDEFINED");
            } else {
                assert!(!desc.mnemonic.is_empty());
                assert_ne!(desc.action, Action::Fail);
            }
        }
    }
}

#[test]
fn register_rows_split_shift_forms() {
    // and r0, r1, r2 vs and r0, r1, r2, lsl r3
    for major in [0x00u32, 0x01, 0x08, 0x18] {
        let by_imm = decode(&DEFAULT_OPCODE_TABLE, word(major, 0x0));
        let by_reg = decode(&DEFAULT_OPCODE_TABLE, word(major, 0x1));
        assert_eq!(by_imm.instr, by_reg.instr, "major {major:#x}");
        assert!(by_imm.operand_flags.contains(OperandFlags::REG_SHIFT_BY_IMM));
        assert!(by_reg.operand_flags.contains(OperandFlags::REG_SHIFT_BY_REG));
    }
}

#[test]
fn s_bit_majors_set_flags() {
    // adds r0, r1, #1
    let desc = decode(&DEFAULT_OPCODE_TABLE, 0xe291_0001);
    assert_eq!(desc.instr, Instr::Add);
    assert!(desc.sets_flags());
    // add without s
    assert!(!decode(&DEFAULT_OPCODE_TABLE, 0xe281_0001).sets_flags());
}

#[test]
fn multiply_family_in_slot_nine() {
    let cases: [(u32, Instr); 6] = [
        (0x00, Instr::Mul),
        (0x02, Instr::Mla),
        (0x08, Instr::Umull),
        (0x0a, Instr::Umlal),
        (0x0c, Instr::Smull),
        (0x0e, Instr::Smlal),
    ];
    for (major, instr) in cases {
        let desc = decode(&DEFAULT_OPCODE_TABLE, word(major, 0x9));
        assert_eq!(desc.instr, instr, "major {major:#x}");
        assert_eq!(desc.group, InstrGroup::DataArith);
        // the s variant one major up, except the absent smlals row
        if major != 0x0e {
            let s = decode(&DEFAULT_OPCODE_TABLE, word(major + 1, 0x9));
            assert_eq!(s.instr, instr);
            assert!(s.sets_flags());
        }
    }
    // no multiply lives between mla and umull
    for major in 0x04..=0x07u32 {
        assert!(decode(&DEFAULT_OPCODE_TABLE, word(major, 0x9)).is_undefined());
    }
}

#[test]
fn extra_load_store_slots() {
    // strh r0, [r1, #0] lives in slot 0xb of an even major
    let strh = decode(&DEFAULT_OPCODE_TABLE, 0xe1c1_00b0);
    assert_eq!(strh.instr, Instr::Strh);
    assert!(strh.operand_flags.contains(OperandFlags::IMM_OFFSET));
    let ldrh = decode(&DEFAULT_OPCODE_TABLE, 0xe1d1_00b0);
    assert_eq!(ldrh.instr, Instr::Ldrh);
    let ldrsb = decode(&DEFAULT_OPCODE_TABLE, 0xe1d1_00d0);
    assert_eq!(ldrsb.instr, Instr::Ldrsb);
    let ldrsh = decode(&DEFAULT_OPCODE_TABLE, 0xe1d1_00f0);
    assert_eq!(ldrsh.instr, Instr::Ldrsh);
    let ldrd = decode(&DEFAULT_OPCODE_TABLE, 0xe1c1_00d0);
    assert_eq!(ldrd.instr, Instr::Ldrd);
    let strd = decode(&DEFAULT_OPCODE_TABLE, 0xe1c1_00f0);
    assert_eq!(strd.instr, Instr::Strd);
}

#[test]
fn misc_rows() {
    let mrs = decode(&DEFAULT_OPCODE_TABLE, 0xe10f_0000);
    assert_eq!(mrs.instr, Instr::Mrs);
    assert_eq!(mrs.group, InstrGroup::Status);
    let bx = decode(&DEFAULT_OPCODE_TABLE, 0xe12f_ff10);
    assert_eq!(bx.instr, Instr::Bx);
    let blx = decode(&DEFAULT_OPCODE_TABLE, 0xe12f_ff30);
    assert_eq!(blx.instr, Instr::Blx);
    assert_eq!(blx.action, Action::BranchReg);
    let clz = decode(&DEFAULT_OPCODE_TABLE, 0xe16f_0f11);
    assert_eq!(clz.instr, Instr::Clz);
    let swp = decode(&DEFAULT_OPCODE_TABLE, 0xe101_0092);
    assert_eq!(swp.instr, Instr::Swp);
    assert_eq!(swp.action, Action::Warn);
    let qadd = decode(&DEFAULT_OPCODE_TABLE, 0xe101_0052);
    assert_eq!(qadd.instr, Instr::Qadd);
}

#[test]
fn load_store_addressing_bits() {
    // ldr r0, [r1, #4]
    let pre = decode(&DEFAULT_OPCODE_TABLE, 0xe591_0004);
    assert_eq!(pre.instr, Instr::Ldr);
    assert!(pre.operand_flags.contains(OperandFlags::IMM_OFFSET));
    assert!(pre.operand_flags.contains(OperandFlags::PRE_INDEX));
    assert!(pre.operand_flags.contains(OperandFlags::INCR_OFFSET));
    assert!(!pre.operand_flags.contains(OperandFlags::WRITE_BACK));
    // str r0, [r1], #-4 (post-indexed, decrement)
    let post = decode(&DEFAULT_OPCODE_TABLE, 0xe401_0004);
    assert_eq!(post.instr, Instr::Str);
    assert!(!post.operand_flags.contains(OperandFlags::PRE_INDEX));
    assert!(!post.operand_flags.contains(OperandFlags::INCR_OFFSET));
    // ldrt is the post-indexed writeback form
    let ldrt = decode(&DEFAULT_OPCODE_TABLE, 0xe4b1_0004);
    assert_eq!(ldrt.instr, Instr::Ldrt);
    // register-offset rows use even minors, odd minors are undefined
    let reg_off = decode(&DEFAULT_OPCODE_TABLE, 0xe791_0002);
    assert_eq!(reg_off.instr, Instr::Ldr);
    assert!(reg_off.operand_flags.contains(OperandFlags::REG_OFFSET));
    assert!(decode(&DEFAULT_OPCODE_TABLE, 0xe791_0012).is_undefined());
}

#[test]
fn load_store_multiple_forms() {
    let cases: [(u32, Instr); 4] = [
        (0xe801_0003, Instr::Stmda),
        (0xe891_0003, Instr::Ldmia),
        (0xe921_0003, Instr::Stmdb),
        (0xe9b1_0003, Instr::Ldmib),
    ];
    for (w, instr) in cases {
        let desc = decode(&DEFAULT_OPCODE_TABLE, w);
        assert_eq!(desc.instr, instr, "{w:#010x}");
        assert_eq!(desc.group, InstrGroup::LoadStoreMultiple);
    }
    // writeback bit
    assert!(decode(&DEFAULT_OPCODE_TABLE, 0xe8b1_0003)
        .operand_flags
        .contains(OperandFlags::WRITE_BACK));
}

#[test]
fn coprocessor_and_swi_rows() {
    let stc = decode(&DEFAULT_OPCODE_TABLE, 0xed81_0000);
    assert_eq!(stc.instr, Instr::Stc);
    let ldc = decode(&DEFAULT_OPCODE_TABLE, 0xed91_0000);
    assert_eq!(ldc.instr, Instr::Ldc);
    let cdp = decode(&DEFAULT_OPCODE_TABLE, 0xee01_0100);
    assert_eq!(cdp.instr, Instr::Cdp);
    let mcr = decode(&DEFAULT_OPCODE_TABLE, 0xee01_0110);
    assert_eq!(mcr.instr, Instr::Mcr);
    let mrc = decode(&DEFAULT_OPCODE_TABLE, 0xee11_0110);
    assert_eq!(mrc.instr, Instr::Mrc);
    let swi = decode(&DEFAULT_OPCODE_TABLE, 0xef12_3456);
    assert_eq!(swi.instr, Instr::Swi);
    assert_eq!(swi.action, Action::SyscallGuard);
}

#[test]
fn msr_immediate_rows() {
    let msr = decode(&DEFAULT_OPCODE_TABLE, 0xe321_f0d3);
    assert_eq!(msr.instr, Instr::Msr);
    assert!(msr.operand_flags.contains(OperandFlags::IMM));
    assert!(decode(&DEFAULT_OPCODE_TABLE, 0xe301_0000).is_undefined());
}

#[test]
fn key_extraction_matches_encoding() {
    let w = 0x1234_5678u32;
    assert_eq!(key::major_key(w), ((w >> 20) & 0xff) as usize);
    assert_eq!(key::minor_key(w), ((w >> 4) & 0xf) as usize);
    assert_eq!(key::rn(w), (w >> 16) & 0xf);
    assert_eq!(key::rd(w), (w >> 12) & 0xf);
    assert_eq!(key::rs(w), (w >> 8) & 0xf);
    assert_eq!(key::rm(w), w & 0xf);
    assert_eq!(key::sign_extend(0x00ff_ffff, 24), -1);
    assert_eq!(key::sign_extend(0x007f_ffff, 24), 0x007f_ffff);
}
