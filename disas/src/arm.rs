//! A32 disassembler.
//!
//! Classification comes from the decode tables; this module only does
//! the formatting. Output follows the usual assembler surface syntax:
//! condition suffix on the mnemonic, `#` immediates in hex, shifted
//! register operands spelled out, and the shift-form moves printed
//! under their pseudo mnemonics (`lsl`, `rrx`, ...).

use dbt_core::{Instr, InstrGroup, OpcodeDescriptor, OperandFlags};
use dbt_decode::key::{
    branch_offset, cond, expand_imm12, imm5, imm12, imm24, rd, reg_list, rm, rn, rs, shift_type,
};
use dbt_decode::{decode, DEFAULT_OPCODE_TABLE};

// -- Register and condition names --

const REG_NAMES: [&str; 16] = [
    "r0", "r1", "r2", "r3", "r4", "r5", "r6", "r7", "r8", "r9", "sl", "fp",
    "ip", "sp", "lr", "pc",
];

const COND_NAMES: [&str; 16] = [
    "eq", "ne", "cs", "cc", "mi", "pl", "vs", "vc", "hi", "ls", "ge", "lt",
    "gt", "le", "", "",
];

const SHIFT_NAMES: [&str; 4] = ["lsl", "lsr", "asr", "ror"];

fn reg(r: u32) -> &'static str {
    REG_NAMES[(r & 0xf) as usize]
}

fn cond_suffix(word: u32) -> &'static str {
    COND_NAMES[cond(word) as usize]
}

/// Disassemble one instruction at `pc`.
///
/// `data` must hold at least 4 bytes. Returns the assembly text and
/// the instruction length in bytes.
pub fn print_insn_arm(pc: u32, data: &[u8]) -> (String, usize) {
    if data.len() < 4 {
        return (".byte ???".into(), 0);
    }
    let word = u32::from_le_bytes([data[0], data[1], data[2], data[3]]);
    (disasm_word(word, pc), 4)
}

/// Disassemble a single instruction word located at `pc`.
pub fn disasm_word(word: u32, pc: u32) -> String {
    if cond(word) == 0xf {
        return disasm_uncond(word, pc);
    }
    let desc = decode(&DEFAULT_OPCODE_TABLE, word);
    match desc.group {
        InstrGroup::Data
        | InstrGroup::DataArith
        | InstrGroup::DataLogic
        | InstrGroup::DataCond => disasm_data(word, desc),
        InstrGroup::Branch => disasm_branch(word, pc, desc),
        InstrGroup::LoadStore => disasm_load_store(word, desc),
        InstrGroup::LoadStoreMultiple => disasm_multiple(word, desc),
        InstrGroup::Status => disasm_status(word, desc),
        InstrGroup::Coprocessor => disasm_coproc(word, desc),
        InstrGroup::Misc => disasm_misc(word, desc),
        InstrGroup::Undefined => format!(".word {word:#010x}"),
    }
}

/// The cond = 0b1111 space. Only the immediate blx form is
/// translatable; everything else prints as raw data.
fn disasm_uncond(word: u32, pc: u32) -> String {
    if (word >> 25) & 0x7 == 0b101 {
        // h bit adds a halfword to the target
        let h = (word >> 24) & 1;
        let target = pc.wrapping_add(branch_offset(word) as u32).wrapping_add(h * 2);
        return format!("blx {target:#x}");
    }
    format!(".word {word:#010x}")
}

// -- Data processing --

fn disasm_data(word: u32, desc: &OpcodeDescriptor) -> String {
    match desc.instr {
        Instr::Mul => format!(
            "mul{}{} {}, {}, {}",
            cond_suffix(word),
            s_suffix(desc),
            reg(rn(word)),
            reg(rm(word)),
            reg(rs(word)),
        ),
        Instr::Mla => format!(
            "mla{}{} {}, {}, {}, {}",
            cond_suffix(word),
            s_suffix(desc),
            reg(rn(word)),
            reg(rm(word)),
            reg(rs(word)),
            reg(rd(word)),
        ),
        Instr::Umull | Instr::Umlal | Instr::Smull | Instr::Smlal => format!(
            "{}{}{} {}, {}, {}, {}",
            desc.mnemonic,
            cond_suffix(word),
            s_suffix(desc),
            reg(rd(word)),
            reg(rn(word)),
            reg(rm(word)),
            reg(rs(word)),
        ),
        Instr::Smlabb | Instr::Smlatb | Instr::Smlabt | Instr::Smlatt
        | Instr::Smlawb | Instr::Smlawt => format!(
            "{}{} {}, {}, {}, {}",
            desc.mnemonic,
            cond_suffix(word),
            reg(rn(word)),
            reg(rm(word)),
            reg(rs(word)),
            reg(rd(word)),
        ),
        Instr::Smlalbb | Instr::Smlaltb | Instr::Smlalbt | Instr::Smlaltt => format!(
            "{}{} {}, {}, {}, {}",
            desc.mnemonic,
            cond_suffix(word),
            reg(rd(word)),
            reg(rn(word)),
            reg(rm(word)),
            reg(rs(word)),
        ),
        Instr::Smulbb | Instr::Smultb | Instr::Smulbt | Instr::Smultt
        | Instr::Smulwb | Instr::Smulwt => format!(
            "{}{} {}, {}, {}",
            desc.mnemonic,
            cond_suffix(word),
            reg(rn(word)),
            reg(rm(word)),
            reg(rs(word)),
        ),
        Instr::Clz => format!(
            "clz{} {}, {}",
            cond_suffix(word),
            reg(rd(word)),
            reg(rm(word)),
        ),
        Instr::Qadd | Instr::Qsub | Instr::Qdadd | Instr::Qdsub => format!(
            "{}{} {}, {}, {}",
            desc.mnemonic,
            cond_suffix(word),
            reg(rd(word)),
            reg(rm(word)),
            reg(rn(word)),
        ),
        Instr::Mov | Instr::Mvn => disasm_move(word, desc),
        Instr::Tst | Instr::Teq | Instr::Cmp | Instr::Cmn => format!(
            "{}{} {}, {}",
            desc.mnemonic,
            cond_suffix(word),
            reg(rn(word)),
            operand2(word, desc),
        ),
        _ => format!(
            "{}{}{} {}, {}, {}",
            desc.mnemonic,
            cond_suffix(word),
            s_suffix(desc),
            reg(rd(word)),
            reg(rn(word)),
            operand2(word, desc),
        ),
    }
}

/// mov/mvn, with the shift forms of mov printed as lsl/lsr/asr/ror/rrx.
fn disasm_move(word: u32, desc: &OpcodeDescriptor) -> String {
    if desc.instr == Instr::Mov {
        if desc.operand_flags.contains(OperandFlags::REG_SHIFT_BY_REG) {
            return format!(
                "{}{}{} {}, {}, {}",
                SHIFT_NAMES[shift_type(word) as usize],
                cond_suffix(word),
                s_suffix(desc),
                reg(rd(word)),
                reg(rm(word)),
                reg(rs(word)),
            );
        }
        if desc.operand_flags.contains(OperandFlags::REG_SHIFT_BY_IMM) {
            let st = shift_type(word);
            let amount = imm5(word);
            if st == 3 && amount == 0 {
                return format!(
                    "rrx{}{} {}, {}",
                    cond_suffix(word),
                    s_suffix(desc),
                    reg(rd(word)),
                    reg(rm(word)),
                );
            }
            if st != 0 || amount != 0 {
                // lsr/asr encode a 32-bit shift as zero
                let amount = if amount == 0 { 32 } else { amount };
                return format!(
                    "{}{}{} {}, {}, #{}",
                    SHIFT_NAMES[st as usize],
                    cond_suffix(word),
                    s_suffix(desc),
                    reg(rd(word)),
                    reg(rm(word)),
                    amount,
                );
            }
        }
    }
    format!(
        "{}{}{} {}, {}",
        desc.mnemonic,
        cond_suffix(word),
        s_suffix(desc),
        reg(rd(word)),
        operand2(word, desc),
    )
}

fn s_suffix(desc: &OpcodeDescriptor) -> &'static str {
    if desc.sets_flags() && desc.group != InstrGroup::DataCond {
        "s"
    } else {
        ""
    }
}

/// The flexible second operand of a data-processing instruction.
fn operand2(word: u32, desc: &OpcodeDescriptor) -> String {
    if desc.operand_flags.contains(OperandFlags::IMM) {
        let value = expand_imm12(word);
        return format!("#{value:#x}");
    }
    if desc.operand_flags.contains(OperandFlags::REG_SHIFT_BY_REG) {
        return format!(
            "{}, {} {}",
            reg(rm(word)),
            SHIFT_NAMES[shift_type(word) as usize],
            reg(rs(word)),
        );
    }
    format!("{}{}", reg(rm(word)), shift_by_imm(word))
}

/// Shift suffix of a register operand, empty for `lsl #0`.
fn shift_by_imm(word: u32) -> String {
    let st = shift_type(word);
    let amount = imm5(word);
    match (st, amount) {
        (0, 0) => String::new(),
        (3, 0) => ", rrx".into(),
        (1, 0) | (2, 0) => format!(", {} #32", SHIFT_NAMES[st as usize]),
        _ => format!(", {} #{amount}", SHIFT_NAMES[st as usize]),
    }
}

// -- Branches --

fn disasm_branch(word: u32, pc: u32, desc: &OpcodeDescriptor) -> String {
    match desc.instr {
        Instr::B | Instr::Bl => {
            let target = pc.wrapping_add(branch_offset(word) as u32);
            format!("{}{} {target:#x}", desc.mnemonic, cond_suffix(word))
        }
        _ => format!("{}{} {}", desc.mnemonic, cond_suffix(word), reg(rm(word))),
    }
}

// -- Loads and stores --

fn disasm_load_store(word: u32, desc: &OpcodeDescriptor) -> String {
    let addr = match desc.instr {
        Instr::Ldrh | Instr::Strh | Instr::Ldrsb | Instr::Ldrsh | Instr::Ldrd
        | Instr::Strd => addr_mode3(word, desc),
        _ => addr_mode2(word, desc),
    };
    format!(
        "{}{} {}, {}",
        desc.mnemonic,
        cond_suffix(word),
        reg(rd(word)),
        addr,
    )
}

fn offset_sign(desc: &OpcodeDescriptor) -> &'static str {
    if desc.operand_flags.contains(OperandFlags::INCR_OFFSET) {
        ""
    } else {
        "-"
    }
}

/// Word/byte addressing: imm12 or optionally shifted register offset.
fn addr_mode2(word: u32, desc: &OpcodeDescriptor) -> String {
    let base = reg(rn(word));
    let sign = offset_sign(desc);
    let offset = if desc.operand_flags.contains(OperandFlags::IMM_OFFSET) {
        let imm = imm12(word);
        if imm == 0 {
            String::new()
        } else {
            format!(", #{sign}{imm:#x}")
        }
    } else {
        format!(", {sign}{}{}", reg(rm(word)), shift_by_imm(word))
    };
    finish_addr(base, offset, desc)
}

/// Halfword/doubleword addressing: split imm8 or plain register.
fn addr_mode3(word: u32, desc: &OpcodeDescriptor) -> String {
    let base = reg(rn(word));
    let sign = offset_sign(desc);
    let offset = if desc.operand_flags.contains(OperandFlags::IMM_OFFSET) {
        let imm = ((word >> 4) & 0xf0) | (word & 0xf);
        if imm == 0 {
            String::new()
        } else {
            format!(", #{sign}{imm:#x}")
        }
    } else {
        format!(", {sign}{}", reg(rm(word)))
    };
    finish_addr(base, offset, desc)
}

fn finish_addr(base: &str, offset: String, desc: &OpcodeDescriptor) -> String {
    if desc.operand_flags.contains(OperandFlags::PRE_INDEX) {
        let wb = if desc.operand_flags.contains(OperandFlags::WRITE_BACK) {
            "!"
        } else {
            ""
        };
        format!("[{base}{offset}]{wb}")
    } else if offset.is_empty() {
        format!("[{base}]")
    } else {
        format!("[{base}]{offset}")
    }
}

fn disasm_multiple(word: u32, desc: &OpcodeDescriptor) -> String {
    let wb = if desc.operand_flags.contains(OperandFlags::WRITE_BACK) {
        "!"
    } else {
        ""
    };
    // bit 22 is the user-bank transfer marker
    let user = if word & (1 << 22) != 0 { "^" } else { "" };
    let mut list = String::new();
    for r in 0..16 {
        if reg_list(word) & (1 << r) != 0 {
            if !list.is_empty() {
                list.push_str(", ");
            }
            list.push_str(reg(r));
        }
    }
    format!(
        "{}{} {}{wb}, {{{list}}}{user}",
        desc.mnemonic,
        cond_suffix(word),
        reg(rn(word)),
    )
}

// -- Status, coprocessor, misc --

fn disasm_status(word: u32, desc: &OpcodeDescriptor) -> String {
    let psr = if word & (1 << 22) != 0 { "spsr" } else { "cpsr" };
    if desc.instr == Instr::Mrs {
        return format!("mrs{} {}, {psr}", cond_suffix(word), reg(rd(word)));
    }
    let mut fields = String::new();
    for (bit, name) in [(16, 'c'), (17, 'x'), (18, 's'), (19, 'f')] {
        if word & (1 << bit) != 0 {
            fields.push(name);
        }
    }
    let operand = if desc.operand_flags.contains(OperandFlags::IMM) {
        format!("#{:#x}", expand_imm12(word))
    } else {
        reg(rm(word)).to_string()
    };
    format!("msr{} {psr}_{fields}, {operand}", cond_suffix(word))
}

fn disasm_coproc(word: u32, desc: &OpcodeDescriptor) -> String {
    let cp = (word >> 8) & 0xf;
    match desc.instr {
        Instr::Ldc | Instr::Stc => {
            let imm = (word & 0xff) * 4;
            format!(
                "{}{} p{cp}, c{}, [{}, #{imm:#x}]",
                desc.mnemonic,
                cond_suffix(word),
                rd(word),
                reg(rn(word)),
            )
        }
        Instr::Mcr | Instr::Mrc => format!(
            "{}{} p{cp}, {}, {}, c{}, c{}, {}",
            desc.mnemonic,
            cond_suffix(word),
            (word >> 21) & 0x7,
            reg(rd(word)),
            rn(word),
            rm(word),
            (word >> 5) & 0x7,
        ),
        _ => format!(
            "cdp{} p{cp}, {}, c{}, c{}, c{}, {}",
            cond_suffix(word),
            (word >> 20) & 0xf,
            rd(word),
            rn(word),
            rm(word),
            (word >> 5) & 0x7,
        ),
    }
}

fn disasm_misc(word: u32, desc: &OpcodeDescriptor) -> String {
    match desc.instr {
        Instr::Swp | Instr::Swpb => format!(
            "{}{} {}, {}, [{}]",
            desc.mnemonic,
            cond_suffix(word),
            reg(rd(word)),
            reg(rm(word)),
            reg(rn(word)),
        ),
        Instr::Bkpt => {
            let imm = ((word >> 4) & 0xfff0) | (word & 0xf);
            format!("bkpt {imm:#x}")
        }
        Instr::Swi => format!("swi{} {:#x}", cond_suffix(word), imm24(word)),
        _ => format!(".word {word:#010x}"),
    }
}
