//! Shared data model for the binary translator.
//!
//! Holds the types every other crate agrees on: opcode descriptors,
//! operand encodings, the translation state machine states, the error
//! taxonomy and the engine configuration.

pub mod config;
pub mod descriptor;
pub mod error;
pub mod state;

pub use config::EngineConfig;
pub use descriptor::{Action, Instr, InstrGroup, OpcodeDescriptor, OperandFlags};
pub use error::TranslationError;
pub use state::TranslationState;
