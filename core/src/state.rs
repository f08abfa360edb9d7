/// Outcome of translating one instruction, as reported by its action
/// handler. Drives the per-block translation loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TranslationState {
    /// Keep translating sequential instructions.
    Neutral,
    /// A multi-instruction construct is in progress; the loop must not
    /// stop here, even past the block byte budget.
    Open,
    /// The translation unit is finished and already ends in a
    /// terminating transfer. No glue code needed.
    Close,
    /// The translation unit must be closed synthetically: the engine
    /// appends a trampoline jump for the fall-through address.
    CloseGlue,
}

impl TranslationState {
    /// Whether the translation loop should decode another instruction,
    /// given the number of bytes emitted so far.
    #[inline]
    pub fn continues(self, bytes_translated: usize, max_block_size: usize) -> bool {
        (bytes_translated < max_block_size && self == TranslationState::Neutral)
            || self == TranslationState::Open
    }
}
