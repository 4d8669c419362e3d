//! Paginated news search against the Serper API.
//!
//! The [`SearchExpander`] issues one request per results page, tolerates
//! individual page failures, and returns every hit in page/position order
//! together with the accrued search cost. It never deduplicates: the same
//! URL may appear on several pages.

mod query;

use std::time::Duration;

use newsforge_shared::{NewsforgeError, ProviderSettings, Result, SearchHit};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

pub use query::{
    ArticleType, CompanyQuery, Jurisdiction, Recency, TopicQuery, prioritize_sources,
};

/// Maximum number of result pages a single search may request.
pub const MAX_PAGES: u32 = 3;

/// Fixed cost in USD charged per answered page request.
pub const COST_PER_REQUEST: f64 = 0.001;

/// Default results requested per page.
pub const DEFAULT_RESULTS_PER_PAGE: u32 = 10;

/// Timeout for a single page request.
const REQUEST_TIMEOUT_SECS: u64 = 30;

// ---------------------------------------------------------------------------
// Request / result types
// ---------------------------------------------------------------------------

/// One paginated search.
#[derive(Debug, Clone)]
pub struct SearchRequest {
    pub query: String,
    /// Pages to fetch; clamped to `1..=MAX_PAGES`.
    pub pages: u32,
    pub results_per_page: u32,
    pub location: Option<Jurisdiction>,
    pub recency: Option<Recency>,
}

impl SearchRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            pages: 2,
            results_per_page: DEFAULT_RESULTS_PER_PAGE,
            location: None,
            recency: Some(Recency::Year),
        }
    }
}

/// Hits collected across all pages of a search.
#[derive(Debug, Clone, Default)]
pub struct SearchResults {
    pub query: String,
    /// Hits in page-ascending, then position-ascending order.
    pub hits: Vec<SearchHit>,
    /// Non-empty hit URLs in hit order (duplicates retained).
    pub urls: Vec<String>,
    pub pages_requested: u32,
    pub pages_succeeded: u32,
    /// Accrued search cost in USD.
    pub cost: f64,
}

impl SearchResults {
    /// Replace the hit list (e.g. after reordering) and recompute `urls`.
    pub fn set_hits(&mut self, hits: Vec<SearchHit>) {
        self.urls = collect_urls(&hits);
        self.hits = hits;
    }
}

fn collect_urls(hits: &[SearchHit]) -> Vec<String> {
    hits.iter()
        .filter(|h| !h.url.is_empty())
        .map(|h| h.url.clone())
        .collect()
}

// Serper wire format.

#[derive(Debug, Serialize)]
struct NewsRequest<'a> {
    q: &'a str,
    #[serde(rename = "type")]
    kind: &'static str,
    num: u32,
    page: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    gl: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tbs: Option<&'static str>,
}

#[derive(Debug, Deserialize)]
struct NewsResponse {
    #[serde(default)]
    news: Vec<NewsItem>,
}

#[derive(Debug, Deserialize)]
struct NewsItem {
    #[serde(default)]
    link: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    snippet: String,
    #[serde(default)]
    source: String,
    #[serde(default)]
    date: String,
    #[serde(default)]
    position: Option<u32>,
}

// ---------------------------------------------------------------------------
// SearchExpander
// ---------------------------------------------------------------------------

/// Multi-page news search client.
#[derive(Clone)]
pub struct SearchExpander {
    client: Client,
    api_key: String,
    base_url: String,
    /// Page size used by the structured entry points.
    results_per_page: u32,
}

impl std::fmt::Debug for SearchExpander {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchExpander")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl SearchExpander {
    /// Build a search client from resolved provider settings.
    ///
    /// Fails with a config error when no search API key is available: without
    /// search there is nothing for the rest of the pipeline to work on.
    pub fn new(settings: &ProviderSettings) -> Result<Self> {
        let api_key = settings.serper_api_key.clone().ok_or_else(|| {
            NewsforgeError::config(
                "search API key not found. Set the SERPER_API_KEY environment variable \
                 (or the variable named by providers.serper_api_key_env).",
            )
        })?;

        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| NewsforgeError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key,
            base_url: settings.serper_base_url.trim_end_matches('/').to_string(),
            results_per_page: DEFAULT_RESULTS_PER_PAGE,
        })
    }

    /// Override the page size used by [`company_news`](Self::company_news)
    /// and [`topic_research`](Self::topic_research).
    pub fn with_results_per_page(mut self, results_per_page: u32) -> Self {
        self.results_per_page = results_per_page.max(1);
        self
    }

    /// Run a paginated search.
    ///
    /// Pages are requested concurrently and reassembled in order. A failed
    /// page is logged and skipped; if every page fails the result is empty
    /// and carries only the cost of pages that were answered. A blank query
    /// is not sent and yields empty, free results.
    #[instrument(skip_all, fields(query = %request.query, pages = request.pages))]
    pub async fn search(&self, request: &SearchRequest) -> Result<SearchResults> {
        let pages = request.pages.clamp(1, MAX_PAGES);

        if request.query.trim().is_empty() {
            warn!("blank search query, skipping search");
            return Ok(SearchResults {
                query: request.query.clone(),
                hits: Vec::new(),
                urls: Vec::new(),
                pages_requested: pages,
                pages_succeeded: 0,
                cost: 0.0,
            });
        }

        info!(pages, "starting multi-page news search");

        let fetches = (1..=pages)
            .map(|page| async move { (page, self.fetch_page(request, page).await) });
        let outcomes = futures::future::join_all(fetches).await;

        let mut hits = Vec::new();
        let mut pages_succeeded = 0;
        let mut cost = 0.0;

        for (page, outcome) in outcomes {
            match outcome {
                Ok(page_hits) => {
                    debug!(page, results = page_hits.len(), "page fetched");
                    pages_succeeded += 1;
                    cost += COST_PER_REQUEST;
                    hits.extend(page_hits);
                }
                Err(e) => {
                    warn!(page, error = %e, "search page failed, continuing");
                }
            }
        }

        let urls = collect_urls(&hits);

        info!(
            hits = hits.len(),
            urls = urls.len(),
            pages_succeeded,
            cost,
            "search complete"
        );

        Ok(SearchResults {
            query: request.query.clone(),
            hits,
            urls,
            pages_requested: pages,
            pages_succeeded,
            cost,
        })
    }

    /// Company news search built from structured inputs.
    pub async fn company_news(&self, company: &CompanyQuery, pages: u32) -> Result<SearchResults> {
        let request = SearchRequest {
            query: company.query_text(),
            pages,
            results_per_page: self.results_per_page,
            location: Some(company.jurisdiction),
            recency: Some(Recency::Year),
        };
        self.search(&request).await
    }

    /// Topic search for article research.
    ///
    /// In-depth article types get one extra page; hits from priority sources
    /// are moved to the front after collection.
    pub async fn topic_research(&self, topic: &TopicQuery, pages: u32) -> Result<SearchResults> {
        let request = SearchRequest {
            query: topic.query_text(),
            pages: topic.effective_pages(pages),
            results_per_page: self.results_per_page,
            location: None,
            recency: Some(Recency::Month),
        };

        let mut results = self.search(&request).await?;
        if !topic.priority_sources.is_empty() {
            let hits = std::mem::take(&mut results.hits);
            results.set_hits(prioritize_sources(hits, &topic.priority_sources));
        }
        Ok(results)
    }

    /// Fetch and decode a single results page.
    async fn fetch_page(&self, request: &SearchRequest, page: u32) -> Result<Vec<SearchHit>> {
        let url = format!("{}/news", self.base_url);
        let body = NewsRequest {
            q: request.query.trim(),
            kind: "news",
            num: request.results_per_page,
            page,
            gl: request.location.and_then(|j| j.country_code()),
            tbs: request.recency.map(|r| r.tbs()),
        };

        let response = self
            .client
            .post(&url)
            .header("X-API-KEY", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| NewsforgeError::Network(format!("{url} page {page}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(NewsforgeError::Network(format!(
                "{url} page {page}: HTTP {status}"
            )));
        }

        let decoded: NewsResponse = response
            .json()
            .await
            .map_err(|e| NewsforgeError::parse(format!("{url} page {page}: {e}")))?;

        Ok(page_hits(decoded.news, page))
    }
}

/// Convert wire items to hits, ordered by position within the page.
///
/// Items without a position take their 1-based index in the response.
fn page_hits(items: Vec<NewsItem>, page: u32) -> Vec<SearchHit> {
    let mut hits: Vec<SearchHit> = items
        .into_iter()
        .enumerate()
        .map(|(i, item)| SearchHit {
            url: item.link,
            title: item.title,
            snippet: item.snippet,
            source: item.source,
            date: item.date,
            page,
            position: item.position.unwrap_or(i as u32 + 1),
        })
        .collect();
    hits.sort_by_key(|h| h.position);
    hits
}
