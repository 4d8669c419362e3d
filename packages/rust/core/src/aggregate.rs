//! Merge fetch outcomes with search metadata into a [`ResearchBundle`].

use std::collections::HashSet;

use chrono::Utc;
use newsforge_shared::{
    FetchOutcome, ProviderUsage, ResearchBundle, SearchHit, SourceRecord,
};
use tracing::debug;
use uuid::Uuid;

/// Everything [`aggregate`] needs from the earlier stages.
#[derive(Debug, Clone, Copy)]
pub struct AggregateInput<'a> {
    pub query: &'a str,
    /// Search hits, used to backfill metadata.
    pub hits: &'a [SearchHit],
    /// Raw URL count from search, before dedup and filtering.
    pub urls_found: usize,
    /// URLs chosen by the filter.
    pub ranked_urls: &'a [String],
    pub outcomes: &'a [FetchOutcome],
    /// Search spend, added to the bundle cost as-is.
    pub search_cost: f64,
}

/// Build the research bundle. Never fails.
///
/// Only successful outcomes for ranked URLs are merged, once per URL. The
/// first search hit with the exact same URL supplies `source`, `date` and
/// `snippet`, and the title when the fetch produced none.
pub fn aggregate(input: &AggregateInput<'_>) -> ResearchBundle {
    let ranked: HashSet<&str> = input.ranked_urls.iter().map(String::as_str).collect();
    let mut merged: HashSet<&str> = HashSet::new();

    let mut sources = Vec::new();
    let mut providers_used = ProviderUsage::default();
    let mut total_words = 0;
    let mut provider_cost = 0.0;

    for outcome in input.outcomes {
        if !outcome.success || !ranked.contains(outcome.url.as_str()) {
            continue;
        }
        if !merged.insert(outcome.url.as_str()) {
            debug!(url = %outcome.url, "duplicate outcome ignored");
            continue;
        }

        let hit = input.hits.iter().find(|h| h.url == outcome.url);
        let title = if outcome.title.is_empty() {
            hit.map(|h| h.title.clone()).unwrap_or_default()
        } else {
            outcome.title.clone()
        };

        providers_used.record(outcome.provider);
        total_words += outcome.word_count;
        provider_cost += outcome.cost.unwrap_or(0.0);

        sources.push(SourceRecord {
            url: outcome.url.clone(),
            title,
            content: outcome.content.clone(),
            source: hit.map(|h| h.source.clone()).unwrap_or_default(),
            date: hit.map(|h| h.date.clone()).unwrap_or_default(),
            snippet: hit.map(|h| h.snippet.clone()).unwrap_or_default(),
            provider: outcome.provider,
            word_count: outcome.word_count,
        });
    }

    ResearchBundle {
        id: Uuid::now_v7(),
        query: input.query.to_string(),
        generated_at: Utc::now(),
        total_sources: sources.len(),
        urls_crawled: sources.len(),
        sources,
        total_words,
        cost: input.search_cost + provider_cost,
        providers_used,
        urls_found: input.urls_found,
        urls_filtered: input.ranked_urls.len(),
    }
}

/// Drop repeated URLs, keeping the first occurrence of each.
pub fn distinct_urls(urls: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    urls.iter()
        .filter(|u| seen.insert(u.as_str()))
        .cloned()
        .collect()
}
