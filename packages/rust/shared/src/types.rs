//! Core domain types for a research run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// SearchHit
// ---------------------------------------------------------------------------

/// A single news result returned by the search provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    /// Article URL (may repeat across pages).
    pub url: String,
    pub title: String,
    pub snippet: String,
    /// Publication name as reported by the search provider.
    pub source: String,
    /// Free-form published date string ("2 days ago", "Mar 3, 2025", ...).
    pub date: String,
    /// 1-based results page this hit came from.
    pub page: u32,
    /// 1-based position within its page.
    pub position: u32,
}

// ---------------------------------------------------------------------------
// ProviderKind
// ---------------------------------------------------------------------------

/// Identifies one tier of the fetch fallback chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    /// Internal browser-render microservice (free, runs JavaScript).
    CrawlService,
    /// Paid main-content scrape API.
    Firecrawl,
    /// Sourced-answer search API used as a content lookup.
    Linkup,
    /// Direct HTTP GET with client-side HTML text extraction.
    HttpBasic,
}

impl ProviderKind {
    /// All providers in fallback order.
    pub const CHAIN: [ProviderKind; 4] = [
        ProviderKind::CrawlService,
        ProviderKind::Firecrawl,
        ProviderKind::Linkup,
        ProviderKind::HttpBasic,
    ];

    /// Stable identifier used in logs and serialized bundles.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CrawlService => "crawl_service",
            Self::Firecrawl => "firecrawl",
            Self::Linkup => "linkup",
            Self::HttpBasic => "http_basic",
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// FetchOutcome
// ---------------------------------------------------------------------------

/// Final result of running the fallback chain for one URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchOutcome {
    pub url: String,
    pub success: bool,
    pub content: String,
    pub title: String,
    pub word_count: usize,
    /// The provider that succeeded, or the last one attempted on failure.
    pub provider: ProviderKind,
    /// Provider fee incurred for this fetch, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost: Option<f64>,
    /// Error from the last attempted provider when `success` is false.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FetchOutcome {
    /// A successful fetch. Word count is derived from `content`.
    pub fn succeeded(
        url: impl Into<String>,
        provider: ProviderKind,
        content: String,
        title: String,
        cost: Option<f64>,
    ) -> Self {
        Self {
            url: url.into(),
            success: true,
            word_count: word_count(&content),
            content,
            title,
            provider,
            cost,
            error: None,
        }
    }

    /// A fetch where every provider failed.
    pub fn failed(url: impl Into<String>, provider: ProviderKind, error: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            success: false,
            content: String::new(),
            title: String::new(),
            word_count: 0,
            provider,
            cost: None,
            error: Some(error.into()),
        }
    }
}

/// Whitespace-delimited word count.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

// ---------------------------------------------------------------------------
// ProviderUsage
// ---------------------------------------------------------------------------

/// Per-provider count of successful fetches in a bundle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderUsage {
    pub crawl_service: usize,
    pub firecrawl: usize,
    pub linkup: usize,
    pub http_basic: usize,
}

impl ProviderUsage {
    /// Count one successful fetch by `kind`.
    pub fn record(&mut self, kind: ProviderKind) {
        *self.slot(kind) += 1;
    }

    pub fn get(&self, kind: ProviderKind) -> usize {
        match kind {
            ProviderKind::CrawlService => self.crawl_service,
            ProviderKind::Firecrawl => self.firecrawl,
            ProviderKind::Linkup => self.linkup,
            ProviderKind::HttpBasic => self.http_basic,
        }
    }

    pub fn total(&self) -> usize {
        ProviderKind::CHAIN.iter().map(|k| self.get(*k)).sum()
    }

    fn slot(&mut self, kind: ProviderKind) -> &mut usize {
        match kind {
            ProviderKind::CrawlService => &mut self.crawl_service,
            ProviderKind::Firecrawl => &mut self.firecrawl,
            ProviderKind::Linkup => &mut self.linkup,
            ProviderKind::HttpBasic => &mut self.http_basic,
        }
    }
}

// ---------------------------------------------------------------------------
// ResearchBundle
// ---------------------------------------------------------------------------

/// One crawled source merged with its search metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceRecord {
    pub url: String,
    pub title: String,
    pub content: String,
    pub source: String,
    pub date: String,
    pub snippet: String,
    pub provider: ProviderKind,
    pub word_count: usize,
}

/// The research pipeline's single output artifact.
///
/// Field names are the contract read by the generation and storage
/// collaborators; renaming any of them is a breaking change.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResearchBundle {
    /// Time-sortable run identifier.
    pub id: Uuid,
    /// Search query that produced this bundle.
    pub query: String,
    pub generated_at: DateTime<Utc>,
    pub sources: Vec<SourceRecord>,
    pub total_sources: usize,
    pub total_words: usize,
    /// Search cost plus provider fees, in USD.
    pub cost: f64,
    pub providers_used: ProviderUsage,
    /// URLs returned by search, before filtering.
    pub urls_found: usize,
    /// URLs selected for crawling.
    pub urls_filtered: usize,
    /// URLs crawled successfully.
    pub urls_crawled: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_kind_serializes_snake_case() {
        let json = serde_json::to_string(&ProviderKind::CrawlService).expect("serialize");
        assert_eq!(json, "\"crawl_service\"");
        let parsed: ProviderKind = serde_json::from_str("\"http_basic\"").expect("deserialize");
        assert_eq!(parsed, ProviderKind::HttpBasic);
        assert_eq!(ProviderKind::Linkup.to_string(), "linkup");
    }

    #[test]
    fn chain_order_is_fixed() {
        assert_eq!(ProviderKind::CHAIN[0], ProviderKind::CrawlService);
        assert_eq!(ProviderKind::CHAIN[3], ProviderKind::HttpBasic);
    }

    #[test]
    fn outcome_constructors() {
        let ok = FetchOutcome::succeeded(
            "https://example.com/a",
            ProviderKind::Firecrawl,
            "three little words".into(),
            "Title".into(),
            Some(0.01),
        );
        assert!(ok.success);
        assert_eq!(ok.word_count, 3);
        assert!(ok.error.is_none());

        let failed = FetchOutcome::failed("https://example.com/b", ProviderKind::HttpBasic, "HTTP 404");
        assert!(!failed.success);
        assert_eq!(failed.word_count, 0);
        assert_eq!(failed.error.as_deref(), Some("HTTP 404"));
    }

    #[test]
    fn usage_counts_per_provider() {
        let mut usage = ProviderUsage::default();
        usage.record(ProviderKind::Linkup);
        usage.record(ProviderKind::Linkup);
        usage.record(ProviderKind::HttpBasic);
        assert_eq!(usage.get(ProviderKind::Linkup), 2);
        assert_eq!(usage.get(ProviderKind::CrawlService), 0);
        assert_eq!(usage.total(), 3);

        let json = serde_json::to_value(usage).expect("serialize");
        assert_eq!(json["linkup"], 2);
        assert_eq!(json["firecrawl"], 0);
    }

    #[test]
    fn bundle_field_names_are_stable() {
        let bundle = ResearchBundle {
            id: Uuid::now_v7(),
            query: "acme".into(),
            generated_at: Utc::now(),
            sources: vec![],
            total_sources: 0,
            total_words: 0,
            cost: 0.0,
            providers_used: ProviderUsage::default(),
            urls_found: 0,
            urls_filtered: 0,
            urls_crawled: 0,
        };
        let json = serde_json::to_value(&bundle).expect("serialize");
        for key in [
            "sources",
            "total_sources",
            "total_words",
            "cost",
            "providers_used",
            "urls_found",
            "urls_filtered",
            "urls_crawled",
        ] {
            assert!(json.get(key).is_some(), "missing field {key}");
        }
    }
}
