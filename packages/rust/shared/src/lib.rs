//! Shared types, error model, and configuration for Huddle.
//!
//! This crate is the foundation depended on by all other Huddle crates.
//! It provides:
//! - [`HuddleError`]: the unified error type
//! - Domain types ([`SearchFragment`], [`Classification`], [`Outcome`], [`Reply`])
//! - Wire types for the chat endpoint ([`ChatRequest`], [`ChatResponse`])
//! - Configuration ([`AppConfig`], [`SearchConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, OffDomainPolicy, ResponderConfig, SearchConfig, ServerConfig, config_dir,
    config_file_path, init_config, load_config, load_config_from, resolve_api_key,
};
pub use error::{HuddleError, Result};
pub use types::{
    ChatRequest, ChatResponse, Classification, HistoryTurn, Outcome, Reply, SearchFragment,
};
