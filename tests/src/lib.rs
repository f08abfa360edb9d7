//! Integration tests for the translator workspace, one module tree
//! per crate plus cross-crate scenarios.

#[cfg(test)]
mod engine;
