//! Shared types, error model, and configuration for econpub.
//!
//! This crate is the foundation depended on by all other econpub crates.
//! It provides:
//! - [`EconpubError`]: the unified error type
//! - Domain types ([`EditionId`], [`EditionPaths`], [`ArticleRef`], [`ArticleIndex`])
//! - Configuration ([`AppConfig`], [`PipelineConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, CompilerConfig, DefaultsConfig, PipelineConfig, SessionConfig, config_dir,
    config_file_path, init_config, load_config, load_config_from, resolve_cookie,
};
pub use error::{EconpubError, Result};
pub use types::{ArticleIndex, ArticleRef, EditionId, EditionPaths, url_last_segment};
