//! Field extraction for A32 instruction words.
//!
//! Every consumer of instruction encodings (table lookup, action
//! handlers, the disassembler) goes through these helpers so the bit
//! positions are defined in exactly one place.

/// Top-level dispatch key: bits 27:20 of the instruction word.
#[inline]
pub const fn major_key(word: u32) -> usize {
    ((word >> 20) & 0xff) as usize
}

/// Second-level dispatch key: bits 7:4 of the instruction word.
#[inline]
pub const fn minor_key(word: u32) -> usize {
    ((word >> 4) & 0xf) as usize
}

/// Condition field, bits 31:28.
#[inline]
pub const fn cond(word: u32) -> u32 {
    word >> 28
}

/// A register field at an arbitrary bit position.
#[inline]
pub const fn reg(word: u32, lsb: u32) -> u32 {
    (word >> lsb) & 0xf
}

#[inline]
pub const fn rn(word: u32) -> u32 {
    reg(word, 16)
}

#[inline]
pub const fn rd(word: u32) -> u32 {
    reg(word, 12)
}

#[inline]
pub const fn rm(word: u32) -> u32 {
    reg(word, 0)
}

#[inline]
pub const fn rs(word: u32) -> u32 {
    reg(word, 8)
}

/// Shift amount for register-shift-by-immediate forms, bits 11:7.
#[inline]
pub const fn imm5(word: u32) -> u32 {
    (word >> 7) & 0x1f
}

/// Shift type selector, bits 6:5 (lsl, lsr, asr, ror).
#[inline]
pub const fn shift_type(word: u32) -> u32 {
    (word >> 5) & 0x3
}

/// Unrotated immediate byte plus rotate field, bits 11:0.
#[inline]
pub const fn imm12(word: u32) -> u32 {
    word & 0xfff
}

/// The expanded data-processing immediate: imm8 rotated right by
/// twice the rotate field.
#[inline]
pub const fn expand_imm12(word: u32) -> u32 {
    let imm8 = word & 0xff;
    let rot = ((word >> 8) & 0xf) * 2;
    imm8.rotate_right(rot)
}

/// Branch offset field, bits 23:0.
#[inline]
pub const fn imm24(word: u32) -> u32 {
    word & 0x00ff_ffff
}

/// Sign-extend the low `bits` bits of `value`.
#[inline]
pub const fn sign_extend(value: u32, bits: u32) -> i32 {
    let shift = 32 - bits;
    ((value << shift) as i32) >> shift
}

/// Branch displacement relative to the branch instruction itself:
/// the sign-extended imm24 shifted left two, plus the 8-byte pipeline
/// offset A32 reads the pc with.
#[inline]
pub const fn branch_offset(word: u32) -> i32 {
    (sign_extend(imm24(word), 24) << 2) + 8
}

/// Register list of a load/store multiple, bits 15:0.
#[inline]
pub const fn reg_list(word: u32) -> u32 {
    word & 0xffff
}
