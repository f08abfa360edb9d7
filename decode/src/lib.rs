//! Instruction decoding: dispatch keys, the static two-level opcode
//! tables, and the lookup that resolves a raw instruction word to its
//! `OpcodeDescriptor`.
//!
//! The tables are data, not logic: an offline table-authoring tool may
//! regenerate them, but the key extraction in [`key`] is the single
//! definition both sides must agree on.

pub mod decoder;
pub mod key;
pub mod tables;

pub use decoder::decode;
pub use tables::{DescriptorSlot, OpcodeTable, DEFAULT_OPCODE_TABLE};
