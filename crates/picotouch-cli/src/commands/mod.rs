//! CLI command implementations.

pub mod config;
pub mod info;
pub mod kits;
pub mod patches;
pub mod run;
