//! CLI argument parsing and dispatch.

pub mod commands;
pub mod dispatch;

pub use commands::build_cli;
pub use dispatch::dispatch;
