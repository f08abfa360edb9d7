//! Default action handlers and the dispatch table that maps
//! descriptor action tags to them.
//!
//! Descriptors carry a tag, not a function: the engine resolves tags
//! through an [`ActionTable`], so an embedding policy can swap the
//! handler for any tag (a stricter syscall guard, an instrumenting
//! copy) without touching the static opcode tables.

use dbt_core::{Action, Instr, InstrGroup, TranslationError, TranslationState};
use dbt_decode::key::{branch_offset, cond, rd, reg_list};
use log::warn;

use crate::context::TranslationContext;

pub type ActionFn = fn(&mut TranslationContext) -> Result<TranslationState, TranslationError>;

/// Tag-to-handler dispatch table.
#[derive(Clone)]
pub struct ActionTable {
    handlers: [ActionFn; 8],
}

const fn slot(action: Action) -> usize {
    match action {
        Action::None => 0,
        Action::Copy => 1,
        Action::Warn => 2,
        Action::Branch => 3,
        Action::BranchLink => 4,
        Action::BranchReg => 5,
        Action::SyscallGuard => 6,
        Action::Fail => 7,
    }
}

impl ActionTable {
    #[inline]
    pub fn get(&self, action: Action) -> ActionFn {
        self.handlers[slot(action)]
    }

    /// Replace the handler for one tag.
    pub fn set(&mut self, action: Action, handler: ActionFn) {
        self.handlers[slot(action)] = handler;
    }
}

impl Default for ActionTable {
    fn default() -> Self {
        let mut handlers: [ActionFn; 8] = [action_fail; 8];
        handlers[slot(Action::None)] = action_none;
        handlers[slot(Action::Copy)] = action_copy;
        handlers[slot(Action::Warn)] = action_warn;
        handlers[slot(Action::Branch)] = action_branch;
        handlers[slot(Action::BranchLink)] = action_branch_link;
        handlers[slot(Action::BranchReg)] = action_branch_reg;
        handlers[slot(Action::SyscallGuard)] = action_syscall_guard;
        ActionTable { handlers }
    }
}

// -- Handlers --

pub fn action_none(_ctx: &mut TranslationContext) -> Result<TranslationState, TranslationError> {
    Ok(TranslationState::Neutral)
}

/// True if executing the instruction writes the pc, turning a plain
/// copy into a control transfer.
fn writes_pc(ctx: &TranslationContext) -> bool {
    let word = ctx.cur_word;
    match ctx.cur_desc.group {
        InstrGroup::Data | InstrGroup::DataArith | InstrGroup::DataLogic => rd(word) == 15,
        InstrGroup::LoadStore => is_load(ctx.cur_desc.instr) && rd(word) == 15,
        InstrGroup::LoadStoreMultiple => {
            is_load(ctx.cur_desc.instr) && reg_list(word) & (1 << 15) != 0
        }
        _ => false,
    }
}

fn is_load(instr: Instr) -> bool {
    matches!(
        instr,
        Instr::Ldr
            | Instr::Ldrb
            | Instr::Ldrt
            | Instr::Ldrbt
            | Instr::Ldrh
            | Instr::Ldrsb
            | Instr::Ldrsh
            | Instr::Ldrd
            | Instr::Ldmda
            | Instr::Ldmia
            | Instr::Ldmdb
            | Instr::Ldmib
    )
}

pub fn action_copy(ctx: &mut TranslationContext) -> Result<TranslationState, TranslationError> {
    ctx.emit_word(ctx.cur_word)?;
    if writes_pc(ctx) {
        // the copied instruction computed a new pc; hand the value to
        // the resolver so control re-enters translated code
        ctx.emit_resolver_jump()?;
        return Ok(TranslationState::Close);
    }
    Ok(TranslationState::Neutral)
}

pub fn action_warn(ctx: &mut TranslationContext) -> Result<TranslationState, TranslationError> {
    warn!(
        "translating {} at {:#x} ({:#010x}) verbatim",
        ctx.cur_desc.mnemonic, ctx.cur_instr, ctx.cur_word
    );
    action_copy(ctx)
}

/// Direct branch. Unconditional branches close the unit; conditional
/// ones emit the taken path under a guard and leave the fall-through
/// to the close glue.
pub fn action_branch(ctx: &mut TranslationContext) -> Result<TranslationState, TranslationError> {
    let word = ctx.cur_word;
    if cond(word) == 0xf {
        // immediate blx lives in the unconditional space
        return blx_immediate(ctx);
    }
    let target = ctx.cur_instr.wrapping_add(branch_offset(word) as isize as usize);
    if cond(word) == 0xe {
        ctx.emit_jump_to(target)?;
        return Ok(TranslationState::Close);
    }
    ctx.emit_cond_guard(cond(word), 2)?;
    ctx.emit_jump_to(target)?;
    Ok(TranslationState::CloseGlue)
}

/// Branch and link. The link register gets the original return
/// address, never a code cache one: return targets resolve through
/// the caches like any other source address.
pub fn action_branch_link(
    ctx: &mut TranslationContext,
) -> Result<TranslationState, TranslationError> {
    let word = ctx.cur_word;
    if cond(word) == 0xf {
        return blx_immediate(ctx);
    }
    let target = ctx.cur_instr.wrapping_add(branch_offset(word) as isize as usize);
    if cond(word) == 0xe {
        ctx.emit_link(ctx.next_instr)?;
        ctx.emit_jump_to(target)?;
        return Ok(TranslationState::Close);
    }
    // guard covers the lr setup and the jump
    ctx.emit_cond_guard(cond(word), 5)?;
    ctx.emit_link(ctx.next_instr)?;
    ctx.emit_jump_to(target)?;
    Ok(TranslationState::CloseGlue)
}

fn blx_immediate(ctx: &mut TranslationContext) -> Result<TranslationState, TranslationError> {
    let word = ctx.cur_word;
    let h = (word >> 24) & 1;
    let target = ctx
        .cur_instr
        .wrapping_add(branch_offset(word) as isize as usize)
        .wrapping_add((h * 2) as usize);
    ctx.emit_link(ctx.next_instr)?;
    ctx.emit_jump_to(target)?;
    Ok(TranslationState::Close)
}

/// Register-indirect branch (bx / register blx). The destination is
/// only known at run time, so control goes through the resolver gate.
pub fn action_branch_reg(
    ctx: &mut TranslationContext,
) -> Result<TranslationState, TranslationError> {
    let word = ctx.cur_word;
    let is_call = ctx.cur_desc.instr == Instr::Blx;
    if cond(word) == 0xe {
        if is_call {
            ctx.emit_link(ctx.next_instr)?;
        }
        ctx.emit_resolver_jump()?;
        return Ok(TranslationState::Close);
    }
    let guarded = if is_call { 5 } else { 2 };
    ctx.emit_cond_guard(cond(word), guarded)?;
    if is_call {
        ctx.emit_link(ctx.next_instr)?;
    }
    ctx.emit_resolver_jump()?;
    Ok(TranslationState::CloseGlue)
}

/// Software interrupt. The instruction is copied so the mediation
/// policy sees it at a unit boundary; the close glue resumes at the
/// next source instruction afterwards.
pub fn action_syscall_guard(
    ctx: &mut TranslationContext,
) -> Result<TranslationState, TranslationError> {
    ctx.emit_word(ctx.cur_word)?;
    Ok(TranslationState::CloseGlue)
}

pub fn action_fail(ctx: &mut TranslationContext) -> Result<TranslationState, TranslationError> {
    Err(TranslationError::UnsupportedOpcode {
        addr: ctx.cur_instr,
        word: ctx.cur_word,
    })
}
