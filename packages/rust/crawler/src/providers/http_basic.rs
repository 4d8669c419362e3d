//! Direct HTTP GET with client-side text extraction. Always configured.

use async_trait::async_trait;
use newsforge_shared::{NewsforgeError, ProviderKind, Result};
use reqwest::Client;
use tracing::{debug, warn};
use url::Url;

use super::{DIRECT_TIMEOUT, FetchProvider, FetchedContent};
use crate::FetchError;
use crate::extract::extract_text;
use crate::guard::is_private_target;

/// User-Agent for every outbound request.
pub const USER_AGENT: &str = concat!(
    "Mozilla/5.0 (compatible; NewsforgeBot/",
    env!("CARGO_PKG_VERSION"),
    ")"
);

const MAX_REDIRECTS: usize = 10;

pub struct HttpBasicProvider {
    client: Client,
    /// Allow loopback/private hosts (local mock servers in tests).
    allow_private_hosts: bool,
}

impl HttpBasicProvider {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .timeout(DIRECT_TIMEOUT)
            .build()
            .map_err(|e| NewsforgeError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            allow_private_hosts: false,
        })
    }

    /// Permit fetching loopback and private-network addresses.
    pub fn allow_private_hosts(mut self) -> Self {
        self.allow_private_hosts = true;
        self
    }
}

#[async_trait]
impl FetchProvider for HttpBasicProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::HttpBasic
    }

    fn timeout(&self) -> std::time::Duration {
        DIRECT_TIMEOUT
    }

    async fn fetch(&self, url: &str) -> std::result::Result<FetchedContent, FetchError> {
        let parsed =
            Url::parse(url).map_err(|e| FetchError::Network(format!("invalid URL: {e}")))?;
        if !self.allow_private_hosts && is_private_target(&parsed) {
            warn!(%url, "refusing direct fetch of private address");
            return Err(FetchError::Blocked(url.to_string()));
        }

        debug!(%url, "direct fetch");
        let response = self
            .client
            .get(parsed)
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(e, DIRECT_TIMEOUT))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Http(status.as_u16()));
        }

        let html = response
            .text()
            .await
            .map_err(|e| FetchError::from_reqwest(e, DIRECT_TIMEOUT))?;

        let extracted = extract_text(&html);
        if extracted.text.trim().is_empty() {
            return Err(FetchError::Empty);
        }

        Ok(FetchedContent {
            content: extracted.text,
            title: extracted.title,
            cost: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider() -> HttpBasicProvider {
        HttpBasicProvider::new().unwrap().allow_private_hosts()
    }

    #[tokio::test]
    async fn extracts_text_and_title() {
        let server = MockServer::start().await;
        let html = std::fs::read_to_string("../../../fixtures/html/article.html")
            .expect("missing fixture");
        Mock::given(method("GET"))
            .and(path("/story"))
            .and(header("user-agent", USER_AGENT))
            .respond_with(ResponseTemplate::new(200).set_body_raw(html, "text/html"))
            .expect(1)
            .mount(&server)
            .await;

        let out = provider()
            .fetch(&format!("{}/story", server.uri()))
            .await
            .unwrap();
        assert_eq!(out.title, "Acme Capital closes Fund IV at $2bn");
        assert!(out.content.contains("mid-market buyouts"));
        assert!(!out.content.contains("newsletter"));
    }

    #[tokio::test]
    async fn follows_redirects() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/old"))
            .respond_with(
                ResponseTemplate::new(301)
                    .insert_header("location", format!("{}/new", server.uri()).as_str()),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/new"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(
                "<html><body><p>moved here</p></body></html>",
                "text/html",
            ))
            .mount(&server)
            .await;

        let out = provider().fetch(&format!("{}/old", server.uri())).await.unwrap();
        assert_eq!(out.content, "moved here");
    }

    #[tokio::test]
    async fn not_found_maps_to_http() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let err = provider().fetch(&format!("{}/gone", server.uri())).await.unwrap_err();
        assert_eq!(err, FetchError::Http(404));
    }

    #[tokio::test]
    async fn chrome_only_page_is_empty() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(
                "<html><body><nav>Home</nav><footer>(c)</footer></body></html>",
                "text/html",
            ))
            .mount(&server)
            .await;

        let err = provider().fetch(&server.uri()).await.unwrap_err();
        assert_eq!(err, FetchError::Empty);
    }

    #[tokio::test]
    async fn private_hosts_blocked_by_default() {
        let p = HttpBasicProvider::new().unwrap();
        let err = p.fetch("http://127.0.0.1:9/").await.unwrap_err();
        assert!(matches!(err, FetchError::Blocked(_)));
    }
}
