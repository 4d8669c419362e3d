//! Curated domain tables and keyword vocabulary used for URL scoring.

/// Hosts that gate full content behind a subscription.
///
/// An entry with a path (`bloomberg.com/professional`) only matches URLs
/// under that path, so the rest of the host can still be authoritative.
pub const PAYWALLED_DOMAINS: &[&str] = &[
    "wsj.com",
    "ft.com",
    "economist.com",
    "bloomberg.com/professional",
    "barrons.com",
    "nytimes.com",
    "washingtonpost.com",
    "thetimes.co.uk",
    "telegraph.co.uk",
    "hbr.org",
    "seekingalpha.com",
];

/// Hosts known for citable journalism and industry coverage.
pub const AUTHORITATIVE_DOMAINS: &[&str] = &[
    // General and business news
    "reuters.com",
    "bloomberg.com",
    "cnbc.com",
    "bbc.com",
    "theguardian.com",
    "forbes.com",
    "axios.com",
    "businessinsider.com",
    // Tech
    "techcrunch.com",
    "wired.com",
    "theverge.com",
    "arstechnica.com",
    // Finance / private equity
    "privateequitywire.co.uk",
    "pehub.com",
    "pitchbook.com",
    "dealroom.co",
    "preqin.com",
    "privateequityinternational.com",
    // Business
    "inc.com",
    "entrepreneur.com",
    "fastcompany.com",
];

/// Social networks and aggregators.
pub const SOCIAL_DOMAINS: &[&str] = &[
    "twitter.com",
    "x.com",
    "linkedin.com",
    "facebook.com",
    "instagram.com",
    "reddit.com",
    "youtube.com",
    "tiktok.com",
    "pinterest.com",
    "medium.com",
];

/// Path keywords that signal deal/company news.
pub const RELEVANT_KEYWORDS: &[&str] = &[
    "acquisition",
    "funding",
    "deal",
    "investment",
    "placement",
    "relocation",
    "advisory",
    "capital",
    "merger",
    "partnership",
    "expansion",
    "launch",
    "raises",
    "series",
    "valuation",
];

/// A URL reduced to the parts the domain rules look at, all lower-cased.
pub(crate) struct UrlParts {
    /// Full lower-cased URL text.
    pub lowered: String,
    /// Host without a leading `www.`, if the URL parsed.
    pub host: Option<String>,
    /// Path plus query, lower-cased.
    pub path_and_query: String,
}

impl UrlParts {
    pub fn new(raw: &str) -> Self {
        let lowered = raw.trim().to_lowercase();
        match url::Url::parse(&lowered) {
            Ok(parsed) if parsed.host_str().is_some() => {
                let host = parsed
                    .host_str()
                    .map(|h| h.trim_start_matches("www.").to_string());
                let mut path_and_query = parsed.path().to_string();
                if let Some(q) = parsed.query() {
                    path_and_query.push('?');
                    path_and_query.push_str(q);
                }
                Self {
                    lowered,
                    host,
                    path_and_query,
                }
            }
            _ => Self {
                path_and_query: lowered.clone(),
                lowered,
                host: None,
            },
        }
    }

    /// Whether this URL falls under any rule in `table`.
    pub fn matches_any(&self, table: &[&str]) -> bool {
        table.iter().any(|rule| self.matches(rule))
    }

    fn matches(&self, rule: &str) -> bool {
        let Some(host) = &self.host else {
            // Unparseable: plain substring test on the whole text.
            return self.lowered.contains(rule);
        };

        let (rule_host, rule_path) = match rule.split_once('/') {
            Some((h, p)) => (h, Some(p)),
            None => (rule, None),
        };

        let host_matches = host
            .strip_suffix(rule_host)
            .is_some_and(|rest| rest.is_empty() || rest.ends_with('.'));

        match rule_path {
            None => host_matches,
            Some(p) => {
                host_matches
                    && self
                        .path_and_query
                        .trim_start_matches('/')
                        .starts_with(p)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn host_and_subdomain_match() {
        assert!(UrlParts::new("https://www.wsj.com/articles/x").matches_any(PAYWALLED_DOMAINS));
        assert!(UrlParts::new("https://markets.ft.com/data").matches_any(PAYWALLED_DOMAINS));
        assert!(UrlParts::new("HTTPS://WSJ.COM/A").matches_any(PAYWALLED_DOMAINS));
    }

    #[test]
    fn suffix_of_a_longer_label_does_not_match() {
        // "x.com" must not catch dropbox.com, nor "ft.com" catch microsoft.com.
        assert!(!UrlParts::new("https://dropbox.com/s/abc").matches_any(SOCIAL_DOMAINS));
        assert!(!UrlParts::new("https://microsoft.com/news").matches_any(PAYWALLED_DOMAINS));
    }

    #[test]
    fn path_scoped_rule() {
        assert!(
            UrlParts::new("https://www.bloomberg.com/professional/blog/x")
                .matches_any(PAYWALLED_DOMAINS)
        );
        assert!(
            !UrlParts::new("https://www.bloomberg.com/news/articles/x")
                .matches_any(PAYWALLED_DOMAINS)
        );
    }

    #[test]
    fn unparseable_falls_back_to_substring() {
        let parts = UrlParts::new("not a url but mentions reddit.com/r/x");
        assert!(parts.host.is_none());
        assert!(parts.matches_any(SOCIAL_DOMAINS));
    }

    #[test]
    fn path_and_query_are_lowercased() {
        let parts = UrlParts::new("https://Example.com/News/Merger?Id=1");
        assert_eq!(parts.host.as_deref(), Some("example.com"));
        assert_eq!(parts.path_and_query, "/news/merger?id=1");
    }
}
