use std::io;

use thiserror::Error;

/// Fatal translation failures.
///
/// None of these are recoverable mid-translation: once an error
/// surfaces the code cache may hold a partially emitted, unlinked
/// instruction, so the embedding process must stop rather than run a
/// half-translated block. Retrying or falling back to unmediated
/// execution is a policy decision above this crate.
#[derive(Debug, Error)]
pub enum TranslationError {
    /// The decoder resolved to an UNDEFINED/unsupported descriptor.
    /// Continuing would execute untrusted bytes as trusted code.
    #[error("unsupported opcode {word:#010x} at {addr:#x}")]
    UnsupportedOpcode { addr: usize, word: u32 },

    /// The PC cache could not place an entry within its probe bound.
    /// The table is sized at init; exhaustion is a configuration error.
    #[error("pc mapping table out of space")]
    PcCacheFull,

    /// mmap for a new code-cache region failed.
    #[error("code cache allocation failed: {0}")]
    CodeCacheAlloc(#[from] io::Error),

    /// Asked to translate an address that already lies inside the code
    /// cache. A logic error in the calling policy, not in the guest.
    #[error("refusing to translate already-translated code at {addr:#x}")]
    RetranslatingCache { addr: usize },
}
