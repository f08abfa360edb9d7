//! The per-unit translation loop.

use dbt_core::{TranslationError, TranslationState};
use dbt_decode::decode;
use log::debug;

use crate::api::ThreadLocalData;
use crate::context::TranslationContext;

/// Translate the unit starting at source address `orig` and return
/// the translated entry point. Nothing is executed; callers decide
/// when the cache becomes executable.
pub(crate) fn translate_noexecute(
    tld: &mut ThreadLocalData,
    orig: usize,
) -> Result<usize, TranslationError> {
    if let Some(transl) = tld.fwd.lookup(orig) {
        return Ok(transl);
    }
    if tld.cache.contains(orig) {
        // feeding translated code back through the translator means
        // the embedder lost track of an address; there is no sane way
        // to continue
        return Err(TranslationError::RetranslatingCache { addr: orig });
    }

    let block_start = tld.cache.reserve(tld.config.max_block_size)?;
    // Published before the body exists: a unit that branches to its
    // own entry resolves through the map instead of recursing.
    tld.fwd.insert(orig, block_start);
    debug!("translating unit {orig:#x} -> {block_start:#x}");

    let mut ctx = TranslationContext::new(
        &tld.config,
        &mut tld.cache,
        &mut tld.trampolines,
        tld.fwd.as_ref(),
        &mut tld.pc_cache,
        tld.gates.resolve,
        block_start,
        orig,
    );

    loop {
        ctx.fetch();
        ctx.cur_desc = decode(tld.table, ctx.cur_word);
        let handler = tld.actions.get(ctx.cur_desc.action);
        ctx.state = handler(&mut ctx)?;
        if !ctx
            .state
            .continues(ctx.bytes_emitted(), ctx.config.max_block_size)
        {
            break;
        }
    }

    if ctx.state != TranslationState::Close {
        ctx.emit_close_glue()?;
    }

    let instr_count = ctx.instr_count;
    let continuation = ctx.next_instr;
    drop(ctx);
    tld.last_continuation = continuation;

    let used = tld.cache.transl_addr() - block_start;
    assert!(
        used <= tld.config.max_block_size + tld.config.transl_guard,
        "unit overran its reservation"
    );
    debug!("unit {orig:#x}: {instr_count} instructions, {used} bytes emitted");
    tld.stats.blocks += 1;
    tld.stats.bytes += used;
    Ok(block_start)
}
