//! Matrix core - persistent developer memory engine
//!
//! This crate provides:
//! - A single-file SQLite store with forward-only migrations
//! - A deterministic text embedding provider and cosine similarity
//! - Repo fingerprinting (languages, frameworks, dependencies, patterns)
//! - A multi-language code indexer built on `tree-sitter`
//! - A recall/reward memory engine for problem -> solution pairs
//! - A cron-backed task scheduler with platform registration
//!
//! Every fallible operation returns [`error::Result`]; there is no panicking
//! API surface.
#![forbid(unsafe_code)]

pub mod cache;
pub mod config;
pub mod diagnostics;
pub mod domain;
pub mod embedding;
pub mod error;
pub mod export;
pub mod fingerprint;
pub mod index;
pub mod memory;
pub mod paths;
pub mod scheduler;
pub mod session;
pub mod store;

pub use config::Config;
pub use error::{Error, Result};
pub use store::Store;
