//! Forward mapping: source address to translated address.
//!
//! The entry for a unit is inserted before its body is translated, so
//! a unit that branches to its own entry resolves through the map
//! instead of being translated again. Lookups and inserts go through
//! one mutex; the translator holds it only for the duration of the
//! map operation, never across a translation.

use std::collections::HashMap;
use std::sync::Mutex;

use log::trace;

/// Shared source-to-translated address map.
#[derive(Default)]
pub struct ForwardCache {
    map: Mutex<HashMap<usize, usize>>,
}

impl ForwardCache {
    pub fn new() -> Self {
        ForwardCache::default()
    }

    /// Translated entry point for `orig`, if one exists.
    pub fn lookup(&self, orig: usize) -> Option<usize> {
        self.map.lock().unwrap_or_else(|e| e.into_inner()).get(&orig).copied()
    }

    /// Record the translation of `orig`. Re-inserting the same source
    /// address overwrites; callers check `lookup` first so this only
    /// happens when a unit is deliberately retranslated.
    pub fn insert(&self, orig: usize, transl: usize) {
        trace!("fwd cache: {orig:#x} -> {transl:#x}");
        self.map
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(orig, transl);
    }

    pub fn len(&self) -> usize {
        self.map.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
