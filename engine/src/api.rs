//! Public surface of the translator.
//!
//! The lifecycle mirrors a transaction bracket: `init` builds the
//! per-thread state, `start_transaction` registers the commit gate,
//! `translate_block` is called for every unit entry, and `exit` tears
//! the state down. Errors returned by `translate_block` are fatal by
//! policy: the embedder must not keep translating on the same state
//! after one.

use std::sync::Arc;

use dbt_cache::{CodeCache, ForwardCache, PcCache};
use dbt_core::{EngineConfig, TranslationError};
use dbt_decode::{OpcodeTable, DEFAULT_OPCODE_TABLE};
use log::{debug, info};

use crate::actions::ActionTable;
use crate::trampoline::TrampolinePool;
use crate::translate::translate_noexecute;

/// Host addresses control leaves the cache through. Both default to
/// zero, which is fine for dry runs that never execute the cache; an
/// executing embedder installs its glue addresses here.
#[derive(Debug, Clone, Copy, Default)]
pub struct EngineGates {
    /// Indirect-transfer resolver.
    pub resolve: usize,
    /// End-of-transaction gate the commit address maps to.
    pub commit: usize,
}

/// Counters reported by the dump tool and the exit log.
#[derive(Debug, Clone, Copy, Default)]
pub struct TranslationStats {
    pub blocks: usize,
    pub bytes: usize,
}

/// Everything one translating thread owns. Only the forward cache is
/// ever shared; code cache, pc cache and trampoline pool stay private
/// to the thread.
pub struct ThreadLocalData {
    pub(crate) config: EngineConfig,
    pub(crate) table: &'static OpcodeTable,
    pub(crate) actions: ActionTable,
    pub(crate) gates: EngineGates,
    pub(crate) cache: CodeCache,
    pub(crate) trampolines: TrampolinePool,
    pub(crate) fwd: Arc<ForwardCache>,
    pub(crate) pc_cache: PcCache,
    pub(crate) stats: TranslationStats,
    pub(crate) last_continuation: usize,
}

impl ThreadLocalData {
    pub fn code_cache(&self) -> &CodeCache {
        &self.cache
    }

    pub fn forward_cache(&self) -> &ForwardCache {
        &self.fwd
    }

    pub fn pc_cache_mut(&mut self) -> &mut PcCache {
        &mut self.pc_cache
    }

    pub fn trampolines(&self) -> &TrampolinePool {
        &self.trampolines
    }

    pub fn stats(&self) -> TranslationStats {
        self.stats
    }

    /// Source address right after the last translated unit, where its
    /// fall-through continuation (if any) resumes. Only meaningful
    /// after a `translate_block` that actually translated.
    pub fn last_continuation(&self) -> usize {
        self.last_continuation
    }

    /// Install a different opcode table. Must happen before the first
    /// translation.
    pub fn set_table(&mut self, table: &'static OpcodeTable) {
        self.table = table;
    }

    /// Replace an action handler, see [`ActionTable::set`].
    pub fn actions_mut(&mut self) -> &mut ActionTable {
        &mut self.actions
    }
}

/// Forward-cache sharing for multi-thread setups. Each thread still
/// calls `init_shared` for its own caches and pool.
#[derive(Clone, Default)]
pub struct SharedData {
    fwd: Arc<ForwardCache>,
}

impl SharedData {
    pub fn new() -> Self {
        SharedData::default()
    }

    pub fn forward_cache(&self) -> &ForwardCache {
        &self.fwd
    }
}

/// Build a thread's translator state with a private forward cache.
pub fn init(config: EngineConfig) -> Result<ThreadLocalData, TranslationError> {
    init_inner(config, Arc::new(ForwardCache::new()), EngineGates::default())
}

/// Like [`init`], sharing the forward cache of `shared`.
pub fn init_shared(
    config: EngineConfig,
    shared: &SharedData,
) -> Result<ThreadLocalData, TranslationError> {
    init_inner(config, Arc::clone(&shared.fwd), EngineGates::default())
}

/// Like [`init`], with embedder glue addresses installed.
pub fn init_with_gates(
    config: EngineConfig,
    gates: EngineGates,
) -> Result<ThreadLocalData, TranslationError> {
    init_inner(config, Arc::new(ForwardCache::new()), gates)
}

fn init_inner(
    config: EngineConfig,
    fwd: Arc<ForwardCache>,
    gates: EngineGates,
) -> Result<ThreadLocalData, TranslationError> {
    // one reservation must always fit after a single grow
    assert!(
        config.max_block_size + config.transl_guard <= config.region_size,
        "region size {:#x} cannot hold one unit ({:#x} + {:#x} guard)",
        config.region_size,
        config.max_block_size,
        config.transl_guard
    );
    let cache = CodeCache::new(config.region_size, config.transl_guard)?;
    let trampolines = TrampolinePool::new(gates.resolve)?;
    let pc_cache = PcCache::new(config.pc_cache_bits);
    debug!(
        "engine up: {} byte regions, {} pc cache entries",
        config.region_size,
        pc_cache.capacity()
    );
    Ok(ThreadLocalData {
        config,
        table: &DEFAULT_OPCODE_TABLE,
        actions: ActionTable::default(),
        gates,
        cache,
        trampolines,
        fwd,
        pc_cache,
        stats: TranslationStats::default(),
        last_continuation: 0,
    })
}

/// Register the transaction bracket: a translated call that reaches
/// `commit_addr` must land on the end-of-transaction gate instead of
/// being translated. Call before the first `translate_block`.
pub fn start_transaction(tld: &mut ThreadLocalData, commit_addr: usize) {
    debug!(
        "transaction: commit {commit_addr:#x} -> gate {:#x}",
        tld.gates.commit
    );
    tld.fwd.insert(commit_addr, tld.gates.commit);
}

/// Translate the unit at `orig` (or return the existing translation).
pub fn translate_block(
    tld: &mut ThreadLocalData,
    orig: usize,
) -> Result<usize, TranslationError> {
    translate_noexecute(tld, orig)
}

/// Resolve a pending trampoline: translate its target and rewrite the
/// originating branch so the stub is bypassed from now on. This is
/// the operation the translator gate performs when a stub is reached
/// at run time.
pub fn resolve_trampoline(
    tld: &mut ThreadLocalData,
    idx: crate::trampoline::TrampolineIdx,
) -> Result<usize, TranslationError> {
    let target = tld.trampolines.get(idx).target;
    let transl = translate_noexecute(tld, target)?;
    tld.trampolines.backpatch(idx, &mut tld.cache, transl);
    Ok(transl)
}

/// Tear a thread's translator state down.
pub fn exit(tld: ThreadLocalData) {
    info!(
        "engine down: {} units, {} bytes emitted, {} trampolines",
        tld.stats.blocks,
        tld.stats.bytes,
        tld.trampolines.created()
    );
    drop(tld);
}
