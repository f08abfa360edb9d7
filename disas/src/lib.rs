//! Textual disassembly for A32, driven by the decode tables.

mod arm;

pub use arm::{disasm_word, print_insn_arm};
