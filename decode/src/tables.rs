//! The static two-level opcode dispatch tables.
//!
//! The top table has 256 rows keyed by instruction bits 27:20. A row
//! is either a terminal descriptor (all sixteen values of bits 7:4
//! decode the same way) or a 16-entry subtable keyed by bits 7:4.
//! Unclaimed encodings collapse into [`OpcodeDescriptor::UNDEFINED`],
//! which routes to the `Fail` action, so lookup is total: every 32-bit
//! word resolves to exactly one descriptor.
//!
//! The tables are built in const context from the regular structure of
//! the A32 encoding. The irregular corners (the misc rows 0x10/0x12/
//! 0x14/0x16, the halfword and multiply slots inside the register
//! data-processing rows) are spelled out explicitly.

use dbt_core::{Action, Instr, InstrGroup, OpcodeDescriptor, OperandFlags};

use crate::key::{major_key, minor_key};

/// One row of the top-level table.
#[derive(Clone, Copy)]
pub enum DescriptorSlot {
    /// Bits 7:4 do not discriminate for this row.
    Terminal(OpcodeDescriptor),
    /// Second-level table keyed by bits 7:4.
    SubTable([OpcodeDescriptor; 16]),
}

/// A complete dispatch table. Rows are immutable once built; the
/// decoder only ever hands out shared borrows into them.
pub struct OpcodeTable {
    slots: [DescriptorSlot; 256],
}

impl OpcodeTable {
    /// Resolve an instruction word to its descriptor. Total: undefined
    /// encodings come back as [`OpcodeDescriptor::UNDEFINED`].
    #[inline]
    pub fn lookup(&self, word: u32) -> &OpcodeDescriptor {
        match &self.slots[major_key(word)] {
            DescriptorSlot::Terminal(desc) => desc,
            DescriptorSlot::SubTable(sub) => &sub[minor_key(word)],
        }
    }

    /// Raw access to a top-level row, for table consistency checks.
    pub fn slot(&self, major: usize) -> &DescriptorSlot {
        &self.slots[major]
    }
}

/// The stock A32 dispatch table.
pub static DEFAULT_OPCODE_TABLE: OpcodeTable = OpcodeTable {
    slots: build_slots(),
};

const UND: OpcodeDescriptor = OpcodeDescriptor::UNDEFINED;

const fn dp_group(op: u32) -> InstrGroup {
    match op {
        0x2 | 0x3 | 0x4 | 0x5 | 0x6 | 0x7 => InstrGroup::DataArith,
        0x8 | 0x9 | 0xa | 0xb => InstrGroup::DataCond,
        0x0 | 0x1 | 0xc | 0xe => InstrGroup::DataLogic,
        _ => InstrGroup::Data,
    }
}

const fn dp_instr(op: u32) -> Instr {
    match op {
        0x0 => Instr::And,
        0x1 => Instr::Eor,
        0x2 => Instr::Sub,
        0x3 => Instr::Rsb,
        0x4 => Instr::Add,
        0x5 => Instr::Adc,
        0x6 => Instr::Sbc,
        0x7 => Instr::Rsc,
        0x8 => Instr::Tst,
        0x9 => Instr::Teq,
        0xa => Instr::Cmp,
        0xb => Instr::Cmn,
        0xc => Instr::Orr,
        0xd => Instr::Mov,
        0xe => Instr::Bic,
        _ => Instr::Mvn,
    }
}

const fn dp_desc(op: u32, s: bool, mode: OperandFlags) -> OpcodeDescriptor {
    let group = dp_group(op);
    let mut flags = mode;
    // Comparison ops always write the flags, whatever the S bit says.
    if s || matches!(group, InstrGroup::DataCond) {
        flags = flags.union(OperandFlags::SET_FLAGS);
    }
    OpcodeDescriptor::new(group, dp_instr(op), flags, Action::Copy)
}

/// Multiply family living in slot 9 of the register data-processing
/// rows. Majors 0x04..=0x07 carry no multiply encoding, and the row
/// that would be flag-setting smlal is absent upstream as well; both
/// stay undefined.
const fn mul_slot(major: usize) -> OpcodeDescriptor {
    let s = major & 1 == 1;
    let instr = match major {
        0x00 | 0x01 => Instr::Mul,
        0x02 | 0x03 => Instr::Mla,
        0x08 | 0x09 => Instr::Umull,
        0x0a | 0x0b => Instr::Umlal,
        0x0c | 0x0d => Instr::Smull,
        0x0e => Instr::Smlal,
        _ => return UND,
    };
    let flags = if s {
        OperandFlags::SET_FLAGS
    } else {
        OperandFlags::empty()
    };
    OpcodeDescriptor::new(InstrGroup::DataArith, instr, flags, Action::Copy)
}

/// Addressing-mode flags for the extra (halfword/doubleword) load and
/// store encodings. P is major bit 4, U bit 3, immediate-form bit 2,
/// writeback bit 1.
const fn hword_flags(major: usize) -> OperandFlags {
    let mut f = if major & 0x04 != 0 {
        OperandFlags::IMM_OFFSET
    } else {
        OperandFlags::REG_OFFSET
    };
    if major & 0x08 != 0 {
        f = f.union(OperandFlags::INCR_OFFSET);
    }
    if major & 0x10 != 0 {
        f = f.union(OperandFlags::PRE_INDEX);
    }
    if major & 0x02 != 0 {
        f = f.union(OperandFlags::WRITE_BACK);
    }
    f
}

/// Extra load/store in slots 0xb/0xd/0xf of the register
/// data-processing rows. The L bit (major bit 0) picks the direction.
const fn hword_slot(major: usize, minor: usize) -> OpcodeDescriptor {
    let l = major & 1 == 1;
    let instr = match (minor, l) {
        (0xb, false) => Instr::Strh,
        (0xb, true) => Instr::Ldrh,
        (0xd, false) => Instr::Ldrd,
        (0xd, true) => Instr::Ldrsb,
        (0xf, false) => Instr::Strd,
        (0xf, true) => Instr::Ldrsh,
        _ => return UND,
    };
    OpcodeDescriptor::new(
        InstrGroup::LoadStore,
        instr,
        hword_flags(major),
        Action::Copy,
    )
}

/// Register data-processing rows, majors 0x00..=0x1f minus the four
/// misc rows. Even minors shift by immediate, odd minors 1/3/5/7 shift
/// by register; 9/b/d/f host the multiply and extra load/store
/// families.
const fn dp_reg_subtable(major: usize) -> [OpcodeDescriptor; 16] {
    let op = ((major >> 1) & 0xf) as u32;
    let s = major & 1 == 1;
    let mut t = [UND; 16];
    let mut m = 0;
    while m < 16 {
        t[m] = if m == 9 {
            mul_slot(major)
        } else if m == 0xb || m == 0xd || m == 0xf {
            hword_slot(major, m)
        } else if m & 1 == 0 {
            dp_desc(op, s, OperandFlags::REG_SHIFT_BY_IMM)
        } else {
            dp_desc(op, s, OperandFlags::REG_SHIFT_BY_REG)
        };
        m += 1;
    }
    t
}

const fn misc_desc(group: InstrGroup, instr: Instr, action: Action) -> OpcodeDescriptor {
    OpcodeDescriptor::new(group, instr, OperandFlags::empty(), action)
}

const fn half_mul(instr: Instr) -> OpcodeDescriptor {
    misc_desc(InstrGroup::DataArith, instr, Action::Copy)
}

const fn sat_arith(instr: Instr) -> OpcodeDescriptor {
    misc_desc(InstrGroup::DataArith, instr, Action::Copy)
}

/// The four misc rows (comparison opcodes with S clear): status
/// register access, saturating arithmetic, the signed half-multiply
/// families, swaps, and the branch-exchange encodings.
const fn misc_subtable(major: usize) -> [OpcodeDescriptor; 16] {
    let mut t = [UND; 16];
    t[0xb] = hword_slot(major, 0xb);
    t[0xd] = hword_slot(major, 0xd);
    t[0xf] = hword_slot(major, 0xf);
    match major {
        0x10 => {
            t[0x0] = misc_desc(InstrGroup::Status, Instr::Mrs, Action::Copy);
            t[0x5] = sat_arith(Instr::Qadd);
            t[0x8] = half_mul(Instr::Smlabb);
            t[0x9] = misc_desc(InstrGroup::Misc, Instr::Swp, Action::Warn);
            t[0xa] = half_mul(Instr::Smlatb);
            t[0xc] = half_mul(Instr::Smlabt);
            t[0xe] = half_mul(Instr::Smlatt);
        }
        0x12 => {
            t[0x0] = misc_desc(InstrGroup::Status, Instr::Msr, Action::Warn);
            t[0x1] = misc_desc(InstrGroup::Branch, Instr::Bx, Action::BranchReg);
            t[0x3] = misc_desc(InstrGroup::Branch, Instr::Blx, Action::BranchReg);
            t[0x5] = sat_arith(Instr::Qsub);
            t[0x7] = misc_desc(InstrGroup::Misc, Instr::Bkpt, Action::Warn);
            t[0x8] = half_mul(Instr::Smlawb);
            t[0xa] = half_mul(Instr::Smulwb);
            t[0xc] = half_mul(Instr::Smlawt);
            t[0xe] = half_mul(Instr::Smulwt);
        }
        0x14 => {
            t[0x0] = misc_desc(InstrGroup::Status, Instr::Mrs, Action::Copy);
            t[0x5] = sat_arith(Instr::Qdadd);
            t[0x8] = half_mul(Instr::Smlalbb);
            t[0x9] = misc_desc(InstrGroup::Misc, Instr::Swpb, Action::Warn);
            t[0xa] = half_mul(Instr::Smlaltb);
            t[0xc] = half_mul(Instr::Smlalbt);
            t[0xe] = half_mul(Instr::Smlaltt);
        }
        _ => {
            t[0x0] = misc_desc(InstrGroup::Status, Instr::Msr, Action::Warn);
            t[0x1] = misc_desc(InstrGroup::Data, Instr::Clz, Action::Copy);
            t[0x5] = sat_arith(Instr::Qdsub);
            t[0x8] = half_mul(Instr::Smulbb);
            t[0xa] = half_mul(Instr::Smultb);
            t[0xc] = half_mul(Instr::Smulbt);
            t[0xe] = half_mul(Instr::Smultt);
        }
    }
    t
}

/// Word/byte load and store, majors 0x40..=0x7f. The bit layout is
/// P U B W L in major bits 4:0; a post-indexed access with W set is
/// the user-mode (T) variant.
const fn ls_desc(major: usize, reg_offset: bool) -> OpcodeDescriptor {
    let l = major & 0x01 != 0;
    let w = major & 0x02 != 0;
    let b = major & 0x04 != 0;
    let u = major & 0x08 != 0;
    let p = major & 0x10 != 0;
    let user_mode = !p && w;
    let instr = match (l, b, user_mode) {
        (false, false, false) => Instr::Str,
        (false, false, true) => Instr::Strt,
        (false, true, false) => Instr::Strb,
        (false, true, true) => Instr::Strbt,
        (true, false, false) => Instr::Ldr,
        (true, false, true) => Instr::Ldrt,
        (true, true, false) => Instr::Ldrb,
        (true, true, true) => Instr::Ldrbt,
    };
    let mut flags = if reg_offset {
        OperandFlags::REG_OFFSET.union(OperandFlags::REG_SHIFT_BY_IMM)
    } else {
        OperandFlags::IMM_OFFSET
    };
    if u {
        flags = flags.union(OperandFlags::INCR_OFFSET);
    }
    if p {
        flags = flags.union(OperandFlags::PRE_INDEX);
    }
    if w {
        flags = flags.union(OperandFlags::WRITE_BACK);
    }
    OpcodeDescriptor::new(InstrGroup::LoadStore, instr, flags, Action::Copy)
}

/// Register-offset load/store rows: even minors carry the shifted
/// register forms, odd minors are media/undefined space.
const fn ls_reg_subtable(major: usize) -> [OpcodeDescriptor; 16] {
    let mut t = [UND; 16];
    let mut m = 0;
    while m < 16 {
        if m & 1 == 0 {
            t[m] = ls_desc(major, true);
        }
        m += 1;
    }
    t
}

/// Load/store multiple, majors 0x80..=0x9f. P and U in major bits 4:3
/// select the da/ia/db/ib form, W in bit 1 the writeback, L in bit 0
/// the direction. Major 0x87 has no defined encoding upstream.
const fn lsm_desc(major: usize) -> OpcodeDescriptor {
    if major == 0x87 {
        return UND;
    }
    let l = major & 0x01 != 0;
    let w = major & 0x02 != 0;
    let u = major & 0x08 != 0;
    let p = major & 0x10 != 0;
    let instr = match (p, u, l) {
        (false, false, false) => Instr::Stmda,
        (false, false, true) => Instr::Ldmda,
        (false, true, false) => Instr::Stmia,
        (false, true, true) => Instr::Ldmia,
        (true, false, false) => Instr::Stmdb,
        (true, false, true) => Instr::Ldmdb,
        (true, true, false) => Instr::Stmib,
        (true, true, true) => Instr::Ldmib,
    };
    let mut flags = OperandFlags::empty();
    if u {
        flags = flags.union(OperandFlags::INCR_OFFSET);
    }
    if p {
        flags = flags.union(OperandFlags::PRE_INDEX);
    }
    if w {
        flags = flags.union(OperandFlags::WRITE_BACK);
    }
    OpcodeDescriptor::new(InstrGroup::LoadStoreMultiple, instr, flags, Action::Copy)
}

/// Coprocessor load/store, majors 0xc0..=0xdf.
const fn cp_ls_desc(major: usize) -> OpcodeDescriptor {
    let instr = if major & 0x01 != 0 {
        Instr::Ldc
    } else {
        Instr::Stc
    };
    let mut flags = OperandFlags::empty();
    if major & 0x08 != 0 {
        flags = flags.union(OperandFlags::INCR_OFFSET);
    }
    if major & 0x10 != 0 {
        flags = flags.union(OperandFlags::PRE_INDEX);
    }
    if major & 0x02 != 0 {
        flags = flags.union(OperandFlags::WRITE_BACK);
    }
    OpcodeDescriptor::new(InstrGroup::Coprocessor, instr, flags, Action::Copy)
}

/// Coprocessor data/register ops, majors 0xe0..=0xef. Minor bit 0
/// separates cdp from the mcr/mrc register moves.
const fn cp_subtable(major: usize) -> [OpcodeDescriptor; 16] {
    let reg_move = if major & 0x01 != 0 {
        Instr::Mrc
    } else {
        Instr::Mcr
    };
    let mut t = [UND; 16];
    let mut m = 0;
    while m < 16 {
        let instr = if m & 1 == 0 { Instr::Cdp } else { reg_move };
        t[m] = misc_desc(InstrGroup::Coprocessor, instr, Action::Copy);
        m += 1;
    }
    t
}

const fn build_slots() -> [DescriptorSlot; 256] {
    let mut slots = [DescriptorSlot::Terminal(UND); 256];
    let mut major = 0;
    while major < 256 {
        slots[major] = match major {
            0x10 | 0x12 | 0x14 | 0x16 => DescriptorSlot::SubTable(misc_subtable(major)),
            0x00..=0x1f => DescriptorSlot::SubTable(dp_reg_subtable(major)),
            // Immediate comparisons with S clear are the msr-immediate
            // encodings (or nothing at all).
            0x30 | 0x34 => DescriptorSlot::Terminal(UND),
            0x32 | 0x36 => DescriptorSlot::Terminal(OpcodeDescriptor::new(
                InstrGroup::Status,
                Instr::Msr,
                OperandFlags::IMM,
                Action::Warn,
            )),
            0x20..=0x3f => DescriptorSlot::Terminal(dp_desc(
                ((major >> 1) & 0xf) as u32,
                major & 1 == 1,
                OperandFlags::IMM,
            )),
            0x40..=0x5f => DescriptorSlot::Terminal(ls_desc(major, false)),
            0x60..=0x7f => DescriptorSlot::SubTable(ls_reg_subtable(major)),
            0x80..=0x9f => DescriptorSlot::Terminal(lsm_desc(major)),
            0xa0..=0xaf => DescriptorSlot::Terminal(misc_desc(
                InstrGroup::Branch,
                Instr::B,
                Action::Branch,
            )),
            0xb0..=0xbf => DescriptorSlot::Terminal(misc_desc(
                InstrGroup::Branch,
                Instr::Bl,
                Action::BranchLink,
            )),
            0xc0..=0xdf => DescriptorSlot::Terminal(cp_ls_desc(major)),
            0xe0..=0xef => DescriptorSlot::SubTable(cp_subtable(major)),
            _ => DescriptorSlot::Terminal(misc_desc(
                InstrGroup::Misc,
                Instr::Swi,
                Action::SyscallGuard,
            )),
        };
        major += 1;
    }
    slots
}
