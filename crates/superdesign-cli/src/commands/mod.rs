//! CLI command implementations

pub mod assets;
pub mod cleanup;
pub mod diff;
pub mod serve;
