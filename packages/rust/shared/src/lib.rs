//! Shared types, error model, and configuration for Newsforge.
//!
//! This crate is the foundation depended on by all other Newsforge crates.
//! It provides:
//! - [`NewsforgeError`], the unified error type
//! - Research domain types ([`SearchHit`], [`FetchOutcome`], [`ResearchBundle`])
//! - Configuration ([`AppConfig`], [`ProviderSettings`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, ProviderSettings, ProvidersConfig, ResearchConfig, config_dir, config_file_path,
    init_config, load_config, load_config_from,
};
pub use error::{NewsforgeError, Result};
pub use types::{
    FetchOutcome, ProviderKind, ProviderUsage, ResearchBundle, SearchHit, SourceRecord,
    word_count,
};
