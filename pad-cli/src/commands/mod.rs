//! CLI command implementations.

pub mod create;
pub mod join;
pub mod show_config;
