//! Code cache memory and the two address maps.
//!
//! [`CodeCache`] owns the mmap'd regions translated code is emitted
//! into. [`ForwardCache`] maps source addresses to their translation,
//! [`PcCache`] maps the other way for provenance queries.

pub mod code_cache;
pub mod fwd_cache;
pub mod pc_cache;

pub use code_cache::CodeCache;
pub use fwd_cache::ForwardCache;
pub use pc_cache::PcCache;
