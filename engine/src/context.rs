//! Per-unit translation state.
//!
//! A `TranslationContext` is built on the stack for one
//! `translate_block` call and never outlives it. It carries the
//! source and output cursors plus exclusive borrows of everything an
//! action handler may touch, so handlers get one `&mut` argument and
//! nothing else.

use dbt_cache::code_cache::LDR_PC_LITERAL;
use dbt_cache::{CodeCache, ForwardCache, PcCache};
use dbt_core::{EngineConfig, OpcodeDescriptor, TranslationError, TranslationState};
use dbt_decode::key::cond;

use crate::trampoline::{OriginKind, TrampolinePool};

pub struct TranslationContext<'a> {
    pub config: &'a EngineConfig,
    pub cache: &'a mut CodeCache,
    pub trampolines: &'a mut TrampolinePool,
    pub fwd: &'a ForwardCache,
    pub pc_cache: &'a mut PcCache,
    /// Address the indirect-transfer resolver lives at.
    pub resolve_gate: usize,
    /// Translated address of the unit entry.
    pub block_start: usize,
    /// Source address of the instruction being handled.
    pub cur_instr: usize,
    /// Source address after it; the fall-through continuation.
    pub next_instr: usize,
    pub cur_word: u32,
    pub cur_desc: &'static OpcodeDescriptor,
    pub state: TranslationState,
    pub instr_count: usize,
}

impl<'a> TranslationContext<'a> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: &'a EngineConfig,
        cache: &'a mut CodeCache,
        trampolines: &'a mut TrampolinePool,
        fwd: &'a ForwardCache,
        pc_cache: &'a mut PcCache,
        resolve_gate: usize,
        block_start: usize,
        orig: usize,
    ) -> Self {
        TranslationContext {
            config,
            cache,
            trampolines,
            fwd,
            pc_cache,
            resolve_gate,
            block_start,
            cur_instr: orig,
            next_instr: orig,
            cur_word: 0,
            cur_desc: &OpcodeDescriptor::UNDEFINED,
            state: TranslationState::Neutral,
            instr_count: 0,
        }
    }

    /// Load the next source instruction and advance the cursor.
    pub fn fetch(&mut self) {
        self.cur_instr = self.next_instr;
        // SAFETY: the source stream is mapped guest memory; the
        // embedder guarantees the entry address it hands to
        // translate_block points at readable code, and a unit never
        // runs past its final control transfer.
        self.cur_word = unsafe { (self.cur_instr as *const u32).read_unaligned() };
        self.next_instr = self.cur_instr.wrapping_add(4);
        self.instr_count += 1;
    }

    /// Output bytes this unit has produced so far.
    #[inline]
    pub fn bytes_emitted(&self) -> usize {
        self.cache.transl_addr() - self.block_start
    }

    /// Emit one word and record its provenance.
    pub fn emit_word(&mut self, word: u32) -> Result<(), TranslationError> {
        self.pc_cache.insert(self.cache.transl_addr(), self.cur_instr)?;
        self.cache.emit_u32(word);
        Ok(())
    }

    /// Condition of the current instruction.
    #[inline]
    pub fn cur_cond(&self) -> u32 {
        cond(self.cur_word)
    }

    /// Emit a conditional skip over the next `words` words. The
    /// guarded sequence runs exactly when `cond` holds.
    pub fn emit_cond_guard(&mut self, cond: u32, words: u32) -> Result<(), TranslationError> {
        debug_assert!(cond < 0xe);
        let inverted = cond ^ 1;
        self.emit_word((inverted << 28) | 0x0a00_0000 | (words - 1))
    }

    /// Emit an unconditional jump to the source address `target`,
    /// direct if a translation exists, through a fresh trampoline
    /// otherwise.
    pub fn emit_jump_to(&mut self, target: usize) -> Result<(), TranslationError> {
        // the literal is the word after the ldr
        let patch_site = self.cache.transl_addr() + 4;
        let dest = match self.fwd.lookup(target) {
            Some(transl) => transl,
            None => {
                let idx =
                    self.trampolines
                        .create(target, patch_site, OriginKind::Absolute)?;
                self.trampolines.get(idx).stub_addr
            }
        };
        self.emit_word(LDR_PC_LITERAL)?;
        self.emit_word(dest as u32)
    }

    /// Emit the lr setup of a call: load the word after the sequence
    /// into lr and step over it.
    pub fn emit_link(&mut self, return_addr: usize) -> Result<(), TranslationError> {
        // ldr lr, [pc, #0]  reads the literal two words down
        self.emit_word(0xe59f_e000)?;
        // b past the literal
        self.emit_word(0xea00_0000)?;
        self.emit_word(return_addr as u32)
    }

    /// Emit the jump into the indirect-transfer resolver gate.
    pub fn emit_resolver_jump(&mut self) -> Result<(), TranslationError> {
        self.emit_word(LDR_PC_LITERAL)?;
        self.emit_word(self.resolve_gate as u32)
    }

    /// Close an open-ended unit: glue that resumes at `next_instr`.
    pub fn emit_close_glue(&mut self) -> Result<(), TranslationError> {
        self.emit_jump_to(self.next_instr)
    }
}
