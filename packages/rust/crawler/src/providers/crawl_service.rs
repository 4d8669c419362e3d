//! Internal browser-render microservice (`POST {base}/crawl`).

use async_trait::async_trait;
use newsforge_shared::ProviderKind;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{FetchProvider, FetchedContent, SERVICE_TIMEOUT};
use crate::FetchError;

pub struct CrawlServiceProvider {
    client: Client,
    base_url: Option<String>,
}

#[derive(Serialize)]
struct CrawlRequest<'a> {
    url: &'a str,
}

#[derive(Deserialize)]
struct CrawlResponse {
    #[serde(default = "default_success")]
    success: bool,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

fn default_success() -> bool {
    true
}

impl CrawlServiceProvider {
    /// `base_url` is the service root; `None` leaves the provider unconfigured.
    pub fn new(client: Client, base_url: Option<String>) -> Self {
        Self {
            client,
            base_url: base_url.map(|u| u.trim_end_matches('/').to_string()),
        }
    }
}

#[async_trait]
impl FetchProvider for CrawlServiceProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::CrawlService
    }

    fn is_configured(&self) -> bool {
        self.base_url.is_some()
    }

    async fn fetch(&self, url: &str) -> Result<FetchedContent, FetchError> {
        let Some(base) = &self.base_url else {
            return Err(FetchError::NotConfigured("crawl_service"));
        };

        debug!(%url, "crawl service request");
        let response = self
            .client
            .post(format!("{base}/crawl"))
            .json(&CrawlRequest { url })
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(e, SERVICE_TIMEOUT))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Http(status.as_u16()));
        }

        let body: CrawlResponse = response
            .json()
            .await
            .map_err(|e| FetchError::Decode(e.to_string()))?;

        if !body.success {
            return Err(FetchError::Rejected(
                body.error.unwrap_or_else(|| "crawl failed".into()),
            ));
        }

        let content = body.content.unwrap_or_default();
        if content.trim().is_empty() {
            return Err(FetchError::Empty);
        }

        Ok(FetchedContent {
            content,
            title: body.title.unwrap_or_default(),
            cost: None,
        })
    }
}
