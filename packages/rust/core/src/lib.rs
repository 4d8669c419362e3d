//! Research orchestration for Newsforge.
//!
//! Ties search, URL filtering, content fetching and aggregation into the
//! company and article research flows.

pub mod aggregate;
pub mod pipeline;

pub use aggregate::{AggregateInput, aggregate, distinct_urls};
pub use pipeline::{
    ArticleResearchConfig, CompanyResearchConfig, DEFAULT_ARTICLE_PAGES, ProgressReporter,
    ResearchPipeline, SilentProgress,
};
