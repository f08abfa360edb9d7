/// Tunables for one translation engine instance.
///
/// Explicitly constructed and passed in at `init` time; there is no
/// ambient global configuration. The defaults mirror the sizing the
/// translator has always shipped with.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Soft byte budget per translation unit. The loop stops decoding
    /// once this many bytes were emitted (unless an action keeps the
    /// unit open).
    pub max_block_size: usize,
    /// Hard margin reserved past `max_block_size` in every code-cache
    /// reservation, so an action that overruns the soft budget can
    /// never emit a torn instruction at a region edge.
    pub transl_guard: usize,
    /// Size of each mmap'd code-cache region.
    pub region_size: usize,
    /// log2 of the PC-cache entry count. Must stay a power of two so
    /// probe wraparound is a single mask.
    pub pc_cache_bits: u32,
}

impl EngineConfig {
    pub fn pc_cache_entries(&self) -> usize {
        1usize << self.pc_cache_bits
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            max_block_size: 256,
            transl_guard: 1024,
            region_size: 1 << 20,
            pc_cache_bits: 20,
        }
    }
}
