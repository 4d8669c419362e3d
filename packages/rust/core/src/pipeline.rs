//! End-to-end research pipelines: search → dedup → filter → fetch → aggregate.

use std::time::Instant;

use tokio_util::sync::CancellationToken;
use tracing::{info, instrument};

use newsforge_crawler::FetchOrchestrator;
use newsforge_filter::{FilterOptions, filter_urls};
use newsforge_search::{CompanyQuery, SearchExpander, SearchResults, TopicQuery};
use newsforge_shared::{
    FetchOutcome, ProviderSettings, ResearchBundle, ResearchConfig, Result,
};

use crate::aggregate::{AggregateInput, aggregate, distinct_urls};

/// Base search pages for article research, before the in-depth bump.
pub const DEFAULT_ARTICLE_PAGES: u32 = 2;

/// Settings for a company-profile research run.
#[derive(Debug, Clone)]
pub struct CompanyResearchConfig {
    pub company: CompanyQuery,
    /// Search result pages to request.
    pub pages: u32,
    /// Cap on URLs kept by the filter.
    pub max_urls: usize,
    /// Concurrent fetches.
    pub concurrency: usize,
}

impl CompanyResearchConfig {
    /// Defaults taken from the `[research]` config section.
    pub fn new(company: CompanyQuery, research: &ResearchConfig) -> Self {
        Self {
            company,
            pages: research.company_pages,
            max_urls: research.company_max_urls,
            concurrency: research.company_concurrency,
        }
    }
}

/// Settings for an article (topic) research run.
#[derive(Debug, Clone)]
pub struct ArticleResearchConfig {
    pub topic: TopicQuery,
    /// Base page count before the in-depth bump.
    pub pages: u32,
    /// Cap on URLs kept by the filter; also the fetch concurrency.
    pub max_sources: usize,
    pub exclude_paywalls: bool,
}

impl ArticleResearchConfig {
    pub fn new(topic: TopicQuery, research: &ResearchConfig) -> Self {
        Self {
            topic,
            pages: DEFAULT_ARTICLE_PAGES,
            max_sources: research.article_max_sources,
            exclude_paywalls: true,
        }
    }
}

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called as each URL's fetch settles.
    fn url_settled(&self, outcome: &FetchOutcome, current: usize, total: usize);
    /// Called when the bundle is ready.
    fn done(&self, bundle: &ResearchBundle);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn url_settled(&self, _outcome: &FetchOutcome, _current: usize, _total: usize) {}
    fn done(&self, _bundle: &ResearchBundle) {}
}

/// Search client plus fetch orchestrator, shared by both research flows.
#[derive(Debug, Clone)]
pub struct ResearchPipeline {
    search: SearchExpander,
    fetcher: FetchOrchestrator,
}

impl ResearchPipeline {
    pub fn new(search: SearchExpander, fetcher: FetchOrchestrator) -> Self {
        Self { search, fetcher }
    }

    /// Build the standard pipeline. Fails only when the search key is missing.
    pub fn from_settings(settings: &ProviderSettings, research: &ResearchConfig) -> Result<Self> {
        let search =
            SearchExpander::new(settings)?.with_results_per_page(research.results_per_page);
        let fetcher = FetchOrchestrator::from_settings(settings)?;
        Ok(Self::new(search, fetcher))
    }

    /// Research a company: two pages of news, authoritative sources first.
    #[instrument(skip_all, fields(company = %config.company.company_name))]
    pub async fn research_company(
        &self,
        config: &CompanyResearchConfig,
        cancel: &CancellationToken,
        progress: &dyn ProgressReporter,
    ) -> Result<ResearchBundle> {
        progress.phase("Searching news");
        let results = self.search.company_news(&config.company, config.pages).await?;

        let filter = FilterOptions::default().with_max_urls(config.max_urls);
        Ok(self
            .crawl_and_aggregate(results, &filter, config.concurrency, cancel, progress)
            .await)
    }

    /// Research a topic for an article.
    ///
    /// Concurrency equals `max_sources`, so every kept URL is fetched at once.
    #[instrument(skip_all, fields(topic = %config.topic.topic, article_type = config.topic.article_type.as_str()))]
    pub async fn research_article(
        &self,
        config: &ArticleResearchConfig,
        cancel: &CancellationToken,
        progress: &dyn ProgressReporter,
    ) -> Result<ResearchBundle> {
        progress.phase("Searching topic");
        let results = self.search.topic_research(&config.topic, config.pages).await?;

        let filter = FilterOptions {
            exclude_paywalls: config.exclude_paywalls,
            ..FilterOptions::default().with_max_urls(config.max_sources)
        };
        Ok(self
            .crawl_and_aggregate(results, &filter, config.max_sources, cancel, progress)
            .await)
    }

    async fn crawl_and_aggregate(
        &self,
        results: SearchResults,
        filter: &FilterOptions,
        concurrency: usize,
        cancel: &CancellationToken,
        progress: &dyn ProgressReporter,
    ) -> ResearchBundle {
        let start = Instant::now();

        progress.phase("Filtering URLs");
        let unique = distinct_urls(&results.urls);
        let ranked = filter_urls(&unique, filter);
        info!(
            urls_found = results.urls.len(),
            unique = unique.len(),
            urls_filtered = ranked.len(),
            "urls selected for crawling"
        );

        progress.phase("Fetching sources");
        let outcomes = self
            .fetcher
            .fetch_all_with_progress(&ranked, concurrency, cancel, |outcome, done, total| {
                progress.url_settled(outcome, done, total)
            })
            .await;

        progress.phase("Aggregating");
        let bundle = aggregate(&AggregateInput {
            query: &results.query,
            hits: &results.hits,
            urls_found: results.urls.len(),
            ranked_urls: &ranked,
            outcomes: &outcomes,
            search_cost: results.cost,
        });

        info!(
            urls_found = bundle.urls_found,
            urls_filtered = bundle.urls_filtered,
            urls_crawled = bundle.urls_crawled,
            total_words = bundle.total_words,
            cost = bundle.cost,
            elapsed_ms = start.elapsed().as_millis(),
            "research complete"
        );

        progress.done(&bundle);
        bundle
    }
}
