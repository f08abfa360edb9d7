//! The translation engine: per-unit state machine, default action
//! handlers, lazy-linking trampolines, and the public lifecycle
//! surface.

pub mod actions;
pub mod api;
pub mod context;
pub mod trampoline;
mod translate;

pub use actions::{ActionFn, ActionTable};
pub use api::{
    exit, init, init_shared, init_with_gates, resolve_trampoline, start_transaction,
    translate_block, EngineGates, SharedData, ThreadLocalData, TranslationStats,
};
pub use context::TranslationContext;
pub use trampoline::{OriginKind, Trampoline, TrampolineIdx, TrampolinePool};
