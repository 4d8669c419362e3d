//! Query builders for the structured research entry points.
//!
//! Company research turns a name, category and jurisdiction into a news
//! query; topic research passes the topic through and may front-load hits
//! from a list of preferred publications.

use std::str::FromStr;
use std::sync::LazyLock;

use newsforge_shared::{NewsforgeError, SearchHit};
use regex::Regex;

/// Collapses runs of whitespace in built queries.
static WHITESPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace regex"));

// ---------------------------------------------------------------------------
// Jurisdiction / Recency
// ---------------------------------------------------------------------------

/// Geographic focus for a search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Jurisdiction {
    Uk,
    Us,
    Eu,
    #[default]
    Other,
}

impl Jurisdiction {
    /// Country code sent to the search API, if any.
    pub fn country_code(&self) -> Option<&'static str> {
        match self {
            Self::Uk => Some("gb"),
            Self::Us => Some("us"),
            Self::Eu | Self::Other => None,
        }
    }

    /// Text appended to company queries.
    fn query_suffix(&self) -> Option<&'static str> {
        match self {
            Self::Uk => Some("UK"),
            Self::Us => Some("United States"),
            Self::Eu => Some("Europe"),
            Self::Other => None,
        }
    }
}

/// Any unrecognised region maps to [`Jurisdiction::Other`].
impl From<&str> for Jurisdiction {
    fn from(s: &str) -> Self {
        match s.trim().to_ascii_uppercase().as_str() {
            "UK" | "GB" => Self::Uk,
            "US" | "USA" => Self::Us,
            "EU" => Self::Eu,
            _ => Self::Other,
        }
    }
}

/// How far back search results may reach.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recency {
    Day,
    Week,
    Month,
    Year,
}

impl Recency {
    /// Serper `tbs` filter value.
    pub fn tbs(&self) -> &'static str {
        match self {
            Self::Day => "qdr:d",
            Self::Week => "qdr:w",
            Self::Month => "qdr:m",
            Self::Year => "qdr:y",
        }
    }
}

// ---------------------------------------------------------------------------
// Article types
// ---------------------------------------------------------------------------

/// Kind of article being researched; deeper formats search more pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ArticleType {
    #[default]
    News,
    Feature,
    DeepDive,
    Analysis,
}

impl ArticleType {
    /// Whether this article type warrants an extra page of search results.
    pub fn is_in_depth(&self) -> bool {
        matches!(self, Self::DeepDive | Self::Analysis)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::News => "news",
            Self::Feature => "feature",
            Self::DeepDive => "deep_dive",
            Self::Analysis => "analysis",
        }
    }
}

impl FromStr for ArticleType {
    type Err = NewsforgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "news" => Ok(Self::News),
            "feature" => Ok(Self::Feature),
            "deep_dive" => Ok(Self::DeepDive),
            "analysis" => Ok(Self::Analysis),
            other => Err(NewsforgeError::validation(format!(
                "unknown article type '{other}': expected news, feature, deep_dive or analysis"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Structured queries
// ---------------------------------------------------------------------------

/// Inputs for company-profile research.
#[derive(Debug, Clone)]
pub struct CompanyQuery {
    pub company_name: String,
    pub domain: String,
    /// Category slug, e.g. `private_equity`.
    pub category: String,
    pub jurisdiction: Jurisdiction,
}

impl CompanyQuery {
    /// Build the search text: `"<name> <category words> [<region>]"`.
    pub fn query_text(&self) -> String {
        let category = self.category.replace('_', " ");
        let mut query = format!("{} {}", self.company_name.trim(), category.trim());
        if let Some(suffix) = self.jurisdiction.query_suffix() {
            query.push(' ');
            query.push_str(suffix);
        }
        WHITESPACE_RE.replace_all(query.trim(), " ").into_owned()
    }
}

/// Inputs for topic (article) research.
#[derive(Debug, Clone, Default)]
pub struct TopicQuery {
    pub topic: String,
    pub article_type: ArticleType,
    /// Publications whose hits should be moved to the front.
    pub priority_sources: Vec<String>,
}

impl TopicQuery {
    pub fn query_text(&self) -> String {
        WHITESPACE_RE.replace_all(self.topic.trim(), " ").into_owned()
    }

    /// Page count after the in-depth bump, capped at the API maximum.
    pub fn effective_pages(&self, pages: u32) -> u32 {
        if self.article_type.is_in_depth() {
            (pages + 1).min(crate::MAX_PAGES)
        } else {
            pages
        }
    }
}

/// Stable partition moving hits from any priority source to the front.
///
/// Matching is a case-insensitive substring test against the hit's
/// `source`. Relative order within both groups is preserved.
pub fn prioritize_sources(hits: Vec<SearchHit>, priorities: &[String]) -> Vec<SearchHit> {
    let needles: Vec<String> = priorities
        .iter()
        .map(|p| p.trim().to_lowercase())
        .filter(|p| !p.is_empty())
        .collect();

    if needles.is_empty() {
        return hits;
    }

    let (boosted, regular): (Vec<_>, Vec<_>) = hits.into_iter().partition(|hit| {
        let source = hit.source.to_lowercase();
        needles.iter().any(|n| source.contains(n.as_str()))
    });

    boosted.into_iter().chain(regular).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hit(url: &str, source: &str) -> SearchHit {
        SearchHit {
            url: url.into(),
            title: String::new(),
            snippet: String::new(),
            source: source.into(),
            date: String::new(),
            page: 1,
            position: 1,
        }
    }

    #[test]
    fn company_query_includes_region() {
        let q = CompanyQuery {
            company_name: "Acme Capital".into(),
            domain: "acme.example".into(),
            category: "private_equity".into(),
            jurisdiction: Jurisdiction::Uk,
        };
        assert_eq!(q.query_text(), "Acme Capital private equity UK");

        let q = CompanyQuery {
            jurisdiction: Jurisdiction::Us,
            ..q
        };
        assert_eq!(q.query_text(), "Acme Capital private equity United States");
    }

    #[test]
    fn company_query_without_region() {
        let q = CompanyQuery {
            company_name: "  Beta  Corp ".into(),
            domain: "beta.example".into(),
            category: "fintech".into(),
            jurisdiction: Jurisdiction::Other,
        };
        assert_eq!(q.query_text(), "Beta Corp fintech");
    }

    #[test]
    fn jurisdiction_parsing_and_codes() {
        assert_eq!(Jurisdiction::from("uk"), Jurisdiction::Uk);
        assert_eq!(Jurisdiction::from("US"), Jurisdiction::Us);
        assert_eq!(Jurisdiction::from("eu"), Jurisdiction::Eu);
        assert_eq!(Jurisdiction::from("APAC"), Jurisdiction::Other);
        assert_eq!(Jurisdiction::Uk.country_code(), Some("gb"));
        assert_eq!(Jurisdiction::Eu.country_code(), None);
    }

    #[test]
    fn article_type_parsing() {
        assert_eq!("deep-dive".parse::<ArticleType>().unwrap(), ArticleType::DeepDive);
        assert_eq!("Analysis".parse::<ArticleType>().unwrap(), ArticleType::Analysis);
        assert!("listicle".parse::<ArticleType>().is_err());
    }

    #[test]
    fn in_depth_topics_get_an_extra_page() {
        let q = TopicQuery {
            topic: "secondaries market".into(),
            article_type: ArticleType::DeepDive,
            priority_sources: vec![],
        };
        assert_eq!(q.effective_pages(2), 3);
        assert_eq!(q.effective_pages(3), 3);

        let news = TopicQuery {
            article_type: ArticleType::News,
            ..q
        };
        assert_eq!(news.effective_pages(2), 2);
    }

    #[test]
    fn prioritize_moves_matching_sources_first() {
        let hits = vec![
            hit("https://a.example/1", "Daily Blog"),
            hit("https://b.example/2", "Reuters"),
            hit("https://c.example/3", "Some Wire"),
            hit("https://d.example/4", "Financial News by REUTERS"),
        ];
        let out = prioritize_sources(hits, &["reuters".to_string()]);
        let urls: Vec<_> = out.iter().map(|h| h.url.as_str()).collect();
        assert_eq!(
            urls,
            vec![
                "https://b.example/2",
                "https://d.example/4",
                "https://a.example/1",
                "https://c.example/3",
            ]
        );
    }

    #[test]
    fn prioritize_with_no_priorities_is_identity() {
        let hits = vec![hit("https://a.example/1", "A"), hit("https://b.example/2", "B")];
        let out = prioritize_sources(hits.clone(), &[" ".to_string()]);
        assert_eq!(out, hits);
    }
}
