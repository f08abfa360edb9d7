//! Lazy-linking trampolines.
//!
//! A branch to a not-yet-translated target does not trigger eager
//! translation. Instead the branch is emitted pointing at a small
//! relocatable stub that, when reached, transfers to the translator
//! gate with enough information to translate the real target and
//! rewrite the original branch. After the rewrite the stub is inert;
//! an embedder that resolves a stub early can release it back to the
//! pool for reuse.
//!
//! Stub layout, four words:
//!
//! ```text
//! ldr pc, [pc, #-4]    jump through the literal
//! .word gate           translator entry gate
//! .word target         untranslated destination
//! .word origin         patch site of the originating branch
//! ```

use std::io;

use dbt_cache::code_cache::LDR_PC_LITERAL;
use dbt_cache::CodeCache;
use dbt_core::TranslationError;
use log::{debug, trace};

/// Memory reserved for trampoline stubs.
const POOL_REGION_SIZE: usize = 1 << 16;

/// Pool reserve granularity; a stub is four words.
pub const STUB_BYTES: usize = 16;

/// How the originating branch gets rewritten once its target exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OriginKind {
    /// Nothing to rewrite; scrub the stub words instead.
    Clear,
    /// The patch site holds a pc-relative branch whose imm24 field is
    /// recomputed.
    Relative,
    /// The patch site holds an absolute address literal.
    Absolute,
}

/// Bookkeeping for one stub.
#[derive(Debug, Clone, Copy)]
pub struct Trampoline {
    pub stub_addr: usize,
    pub target: usize,
    pub patch_site: usize,
    pub origin: OriginKind,
    pub patched: bool,
}

pub type TrampolineIdx = usize;

/// Free-list-backed stub allocator over a dedicated code-cache arena.
pub struct TrampolinePool {
    mem: CodeCache,
    stubs: Vec<Trampoline>,
    free: Vec<TrampolineIdx>,
    gate: usize,
    created: usize,
}

impl TrampolinePool {
    /// `gate` is the translator entry address baked into every stub.
    pub fn new(gate: usize) -> io::Result<Self> {
        Ok(TrampolinePool {
            mem: CodeCache::new(POOL_REGION_SIZE, STUB_BYTES)?,
            stubs: Vec::new(),
            free: Vec::new(),
            gate,
            created: 0,
        })
    }

    /// Emit (or recycle) a stub for `target`. `patch_site` is the
    /// address inside the main code cache that `backpatch` rewrites.
    pub fn create(
        &mut self,
        target: usize,
        patch_site: usize,
        origin: OriginKind,
    ) -> Result<TrampolineIdx, TranslationError> {
        let tramp = Trampoline {
            stub_addr: 0,
            target,
            patch_site,
            origin,
            patched: false,
        };
        let idx = if let Some(idx) = self.free.pop() {
            let stub_addr = self.stubs[idx].stub_addr;
            self.stubs[idx] = Trampoline { stub_addr, ..tramp };
            self.rewrite_stub(idx);
            idx
        } else {
            let stub_addr = self.mem.reserve(STUB_BYTES)?;
            self.stubs.push(Trampoline { stub_addr, ..tramp });
            self.mem.emit_u32(LDR_PC_LITERAL);
            self.mem.emit_u32(self.gate as u32);
            self.mem.emit_u32(target as u32);
            self.mem.emit_u32(patch_site as u32);
            self.stubs.len() - 1
        };
        self.created += 1;
        trace!(
            "trampoline {idx}: stub {:#x} -> target {target:#x}, patch site {patch_site:#x}",
            self.stubs[idx].stub_addr
        );
        Ok(idx)
    }

    fn rewrite_stub(&mut self, idx: TrampolineIdx) {
        let t = self.stubs[idx];
        self.mem.patch_u32(t.stub_addr, LDR_PC_LITERAL);
        self.mem.patch_u32(t.stub_addr + 4, self.gate as u32);
        self.mem.patch_u32(t.stub_addr + 8, t.target as u32);
        self.mem.patch_u32(t.stub_addr + 12, t.patch_site as u32);
    }

    /// Rewrite the originating branch so control reaches
    /// `transl_target` directly, bypassing the stub from now on.
    pub fn backpatch(
        &mut self,
        idx: TrampolineIdx,
        cache: &mut CodeCache,
        transl_target: usize,
    ) {
        let t = self.stubs[idx];
        debug!(
            "backpatch trampoline {idx}: {:#x} now reaches {transl_target:#x}",
            t.patch_site
        );
        match t.origin {
            OriginKind::Relative => {
                // keep cond and opcode, recompute the displacement
                let old = cache.read_u32(t.patch_site);
                let disp = transl_target
                    .wrapping_sub(t.patch_site.wrapping_add(8))
                    as u32;
                let new = (old & 0xff00_0000) | ((disp >> 2) & 0x00ff_ffff);
                cache.patch_u32(t.patch_site, new);
            }
            OriginKind::Absolute => {
                cache.patch_u32(t.patch_site, transl_target as u32);
            }
            OriginKind::Clear => {
                let stub = t.stub_addr;
                self.mem.patch_u32(stub + 8, 0);
                self.mem.patch_u32(stub + 12, 0);
            }
        }
        self.stubs[idx].patched = true;
    }

    /// Return a resolved stub's memory to the free list.
    pub fn release(&mut self, idx: TrampolineIdx) {
        debug_assert!(self.stubs[idx].patched);
        self.free.push(idx);
    }

    pub fn get(&self, idx: TrampolineIdx) -> &Trampoline {
        &self.stubs[idx]
    }

    /// Stubs ever created, free-list reuse included.
    pub fn created(&self) -> usize {
        self.created
    }

    pub fn len(&self) -> usize {
        self.stubs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stubs.is_empty()
    }

    /// Word of the stub's own memory, for inspection.
    pub fn read_stub_word(&self, idx: TrampolineIdx, word: usize) -> u32 {
        debug_assert!(word < 4);
        self.mem.read_u32(self.stubs[idx].stub_addr + word * 4)
    }
}
