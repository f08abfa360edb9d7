//! Descriptor lookup.

use dbt_core::OpcodeDescriptor;

use crate::tables::OpcodeTable;

/// Decode one instruction word against `table`.
///
/// Lookup never fails: encodings the table does not claim resolve to
/// the undefined descriptor, whose action reports the word as
/// untranslatable. Callers that only want classification (the
/// disassembler) can check [`OpcodeDescriptor::is_undefined`] instead
/// of the action.
#[inline]
pub fn decode(table: &OpcodeTable, word: u32) -> &OpcodeDescriptor {
    table.lookup(word)
}
