//! Firecrawl scrape API: main-content extraction as markdown.

use async_trait::async_trait;
use newsforge_shared::ProviderKind;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{FetchProvider, FetchedContent, SERVICE_TIMEOUT};
use crate::FetchError;

/// Fee per successful scrape, in USD.
pub const FIRECRAWL_COST: f64 = 0.01;

pub struct FirecrawlProvider {
    client: Client,
    api_key: Option<String>,
    endpoint: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ScrapeRequest<'a> {
    url: &'a str,
    formats: [&'static str; 1],
    only_main_content: bool,
}

#[derive(Deserialize)]
struct ScrapeResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    data: Option<ScrapeData>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Deserialize)]
struct ScrapeData {
    #[serde(default)]
    markdown: Option<String>,
    #[serde(default)]
    metadata: Option<ScrapeMetadata>,
}

#[derive(Deserialize)]
struct ScrapeMetadata {
    #[serde(default)]
    title: Option<String>,
}

impl FirecrawlProvider {
    pub fn new(client: Client, api_key: Option<String>, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            api_key,
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl FetchProvider for FirecrawlProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Firecrawl
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    async fn fetch(&self, url: &str) -> Result<FetchedContent, FetchError> {
        let Some(key) = &self.api_key else {
            return Err(FetchError::NotConfigured("firecrawl"));
        };

        debug!(%url, "firecrawl scrape");
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(key)
            .json(&ScrapeRequest {
                url,
                formats: ["markdown"],
                only_main_content: true,
            })
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(e, SERVICE_TIMEOUT))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Http(status.as_u16()));
        }

        let body: ScrapeResponse = response
            .json()
            .await
            .map_err(|e| FetchError::Decode(e.to_string()))?;

        if !body.success {
            return Err(FetchError::Rejected(
                body.error.unwrap_or_else(|| "scrape failed".into()),
            ));
        }

        let data = body.data.ok_or(FetchError::Empty)?;
        let markdown = data.markdown.unwrap_or_default();
        if markdown.trim().is_empty() {
            return Err(FetchError::Empty);
        }

        Ok(FetchedContent {
            content: markdown,
            title: data.metadata.and_then(|m| m.title).unwrap_or_default(),
            cost: Some(FIRECRAWL_COST),
        })
    }
}
