//! Content fetching: provider fallback chain and bounded fan-out.
//!
//! This crate provides:
//! - [`providers`]: the [`FetchProvider`] trait and the four built-in backends
//! - [`FallbackChain`]: tries providers in order for one URL
//! - [`FetchOrchestrator`]: runs the chain across many URLs under a concurrency cap
//! - [`probe_url`]: a `HEAD` reachability check

pub mod chain;
pub mod engine;
pub mod error;
pub mod extract;
mod guard;
pub mod probe;
pub mod providers;

pub use chain::FallbackChain;
pub use engine::FetchOrchestrator;
pub use error::FetchError;
pub use extract::{ExtractedText, extract_text};
pub use probe::{AccessibilityReport, probe_client, probe_url};
pub use providers::{
    CrawlServiceProvider, FetchProvider, FetchedContent, FirecrawlProvider, HttpBasicProvider,
    LinkupProvider,
};
