//! Reverse mapping: translated address back to its source address.
//!
//! An open-addressed table with linear probing. The home slot of an
//! address is its low bits under the table mask; collisions probe
//! forward one slot at a time, wrapping at the end. Insertion probe
//! chains are bounded at a tenth of the table: a longer chain means
//! the table is effectively full and the caller gets an error instead
//! of a silent degradation into linear scans. Lookups probe to the
//! first empty slot unconditionally; a resident entry may sit past the
//! insertion bound once swaps have reshuffled its chain.
//!
//! Hits found away from their home slot are swapped one step toward
//! it, so repeatedly queried addresses migrate to the front of their
//! chain.

use dbt_core::TranslationError;

/// One mapping. A zero translated address marks the slot empty;
/// address zero is never a valid code cache location.
#[derive(Clone, Copy, Default)]
struct Entry {
    transl: usize,
    orig: usize,
}

/// Translated-to-source address map.
pub struct PcCache {
    entries: Vec<Entry>,
    mask: usize,
    probe_limit: usize,
}

impl PcCache {
    /// Table with `1 << bits` slots.
    pub fn new(bits: u32) -> Self {
        let n = 1usize << bits;
        PcCache {
            entries: vec![Entry::default(); n],
            mask: n - 1,
            probe_limit: n / 10,
        }
    }

    #[inline]
    fn home_slot(&self, transl: usize) -> usize {
        transl & self.mask
    }

    /// Record that the code at `transl` was produced from `orig`.
    pub fn insert(&mut self, transl: usize, orig: usize) -> Result<(), TranslationError> {
        debug_assert_ne!(transl, 0);
        let mut slot = self.home_slot(transl);
        let mut probes = 0;
        loop {
            let e = &mut self.entries[slot];
            if e.transl == 0 || e.transl == transl {
                *e = Entry { transl, orig };
                return Ok(());
            }
            probes += 1;
            if probes > self.probe_limit {
                return Err(TranslationError::PcCacheFull);
            }
            slot = (slot + 1) & self.mask;
        }
    }

    /// Source address of the instruction translated at `transl`.
    ///
    /// Takes `&mut self` for the move-toward-home swap on non-home
    /// hits.
    pub fn lookup(&mut self, transl: usize) -> Option<usize> {
        let home = self.home_slot(transl);
        let mut slot = home;
        loop {
            let e = self.entries[slot];
            if e.transl == transl {
                if slot != home {
                    let prev = (slot + self.mask) & self.mask;
                    self.entries.swap(slot, prev);
                }
                return Some(e.orig);
            }
            if e.transl == 0 {
                return None;
            }
            slot = (slot + 1) & self.mask;
            // a full table has no empty slot to stop at
            if slot == home {
                return None;
            }
        }
    }

    pub fn capacity(&self) -> usize {
        self.entries.len()
    }
}
