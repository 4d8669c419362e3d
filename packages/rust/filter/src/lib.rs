//! URL quality filter: drop low-value URLs and rank the rest for crawling.
//!
//! Everything here is a pure function of its inputs. The only clock read
//! happens in [`FilterOptions::default`], which picks the reference year
//! used for the "recent year in URL" signal.
//!
//! Scoring signals:
//! - `+10` host is an authoritative source (when enabled)
//! - `+5` path or query mentions a deal/company keyword
//! - `+3` deep article link (more than four `/` in the URL)
//! - `+1` HTTPS
//! - `+2` one of the three most recent years appears in the URL

mod domains;

use chrono::Datelike;
use tracing::debug;

use domains::UrlParts;
pub use domains::{AUTHORITATIVE_DOMAINS, PAYWALLED_DOMAINS, RELEVANT_KEYWORDS, SOCIAL_DOMAINS};

pub const AUTHORITATIVE_BONUS: i32 = 10;
pub const KEYWORD_BONUS: i32 = 5;
pub const DEEP_ARTICLE_BONUS: i32 = 3;
pub const HTTPS_BONUS: i32 = 1;
pub const RECENT_YEAR_BONUS: i32 = 2;

/// How many years (counting the reference year) count as "recent".
const RECENT_YEAR_WINDOW: i32 = 3;

// ---------------------------------------------------------------------------
// Options / results
// ---------------------------------------------------------------------------

/// Knobs for [`filter_urls`] / [`rank_urls`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterOptions {
    /// Upper bound on the number of URLs returned.
    pub max_urls: usize,
    pub exclude_paywalls: bool,
    pub exclude_social: bool,
    pub prefer_authoritative: bool,
    /// Latest year considered recent; the two before it also count.
    pub reference_year: i32,
}

impl Default for FilterOptions {
    fn default() -> Self {
        Self {
            max_urls: 15,
            exclude_paywalls: true,
            exclude_social: true,
            prefer_authoritative: true,
            reference_year: chrono::Utc::now().year(),
        }
    }
}

impl FilterOptions {
    pub fn with_max_urls(mut self, max_urls: usize) -> Self {
        self.max_urls = max_urls;
        self
    }
}

/// A URL that survived exclusion, with its crawl-worthiness score.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankedUrl {
    pub url: String,
    pub score: i32,
}

// ---------------------------------------------------------------------------
// Filtering
// ---------------------------------------------------------------------------

/// Filter and rank `urls`, returning at most `opts.max_urls` URLs.
///
/// Highest score first; equal scores keep their input order.
pub fn filter_urls<S: AsRef<str>>(urls: &[S], opts: &FilterOptions) -> Vec<String> {
    rank_urls(urls, opts).into_iter().map(|r| r.url).collect()
}

/// Like [`filter_urls`] but keeps the scores.
pub fn rank_urls<S: AsRef<str>>(urls: &[S], opts: &FilterOptions) -> Vec<RankedUrl> {
    let years = recent_years(opts.reference_year);

    let mut ranked: Vec<RankedUrl> = urls
        .iter()
        .map(|u| u.as_ref())
        .filter_map(|url| {
            let parts = UrlParts::new(url);
            if is_excluded(&parts, opts) {
                debug!(url, "excluded by domain rules");
                return None;
            }
            Some(RankedUrl {
                url: url.to_string(),
                score: score(url, &parts, opts, &years),
            })
        })
        .collect();

    // `sort_by` is stable, which keeps ties in input order.
    ranked.sort_by(|a, b| b.score.cmp(&a.score));
    ranked.truncate(opts.max_urls);

    debug!(
        input = urls.len(),
        kept = ranked.len(),
        max = opts.max_urls,
        "urls filtered"
    );

    ranked
}

/// Score a single URL as [`rank_urls`] would (exclusion is not applied).
pub fn score_url(url: &str, opts: &FilterOptions) -> i32 {
    score(url, &UrlParts::new(url), opts, &recent_years(opts.reference_year))
}

/// Whether the enabled exclusion rules would drop `url`.
pub fn is_excluded_url(url: &str, opts: &FilterOptions) -> bool {
    is_excluded(&UrlParts::new(url), opts)
}

fn is_excluded(parts: &UrlParts, opts: &FilterOptions) -> bool {
    (opts.exclude_paywalls && parts.matches_any(PAYWALLED_DOMAINS))
        || (opts.exclude_social && parts.matches_any(SOCIAL_DOMAINS))
}

fn score(raw: &str, parts: &UrlParts, opts: &FilterOptions, years: &[String]) -> i32 {
    let mut score = 0;

    if opts.prefer_authoritative && parts.matches_any(AUTHORITATIVE_DOMAINS) {
        score += AUTHORITATIVE_BONUS;
    }

    if RELEVANT_KEYWORDS
        .iter()
        .any(|kw| parts.path_and_query.contains(kw))
    {
        score += KEYWORD_BONUS;
    }

    if raw.matches('/').count() > 4 {
        score += DEEP_ARTICLE_BONUS;
    }

    if parts.lowered.starts_with("https://") {
        score += HTTPS_BONUS;
    }

    if years.iter().any(|y| raw.contains(y.as_str())) {
        score += RECENT_YEAR_BONUS;
    }

    score
}

fn recent_years(reference_year: i32) -> Vec<String> {
    (0..RECENT_YEAR_WINDOW)
        .map(|offset| (reference_year - offset).to_string())
        .collect()
}
