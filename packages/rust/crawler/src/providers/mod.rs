//! Content providers and the capability trait they share.
//!
//! Each provider turns a URL into readable text using a different backend.
//! They are tried in a fixed order by [`crate::FallbackChain`]; the
//! direct HTTP provider is always configured and always last.

mod crawl_service;
mod firecrawl;
mod http_basic;
mod linkup;

use std::time::Duration;

use async_trait::async_trait;
use newsforge_shared::{NewsforgeError, ProviderKind, Result};
use reqwest::Client;

pub use crawl_service::CrawlServiceProvider;
pub use firecrawl::{FIRECRAWL_COST, FirecrawlProvider};
pub use http_basic::{HttpBasicProvider, USER_AGENT};
pub use linkup::LinkupProvider;

/// Request timeout for the remote extraction services.
pub const SERVICE_TIMEOUT: Duration = Duration::from_secs(60);

/// Request timeout for the direct HTTP fetch.
pub const DIRECT_TIMEOUT: Duration = Duration::from_secs(30);

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// What a provider hands back on success.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchedContent {
    pub content: String,
    /// Page title if the backend reports one; empty otherwise.
    pub title: String,
    /// Fee charged for this request, in USD.
    pub cost: Option<f64>,
}

/// One backend capable of fetching readable text for a URL.
#[async_trait]
pub trait FetchProvider: Send + Sync {
    fn kind(&self) -> ProviderKind;

    /// Whether the credentials/endpoint this provider needs are present.
    /// Unconfigured providers are skipped without a network call.
    fn is_configured(&self) -> bool {
        true
    }

    /// Upper bound on one [`FetchProvider::fetch`] call.
    fn timeout(&self) -> Duration {
        SERVICE_TIMEOUT
    }

    async fn fetch(&self, url: &str) -> std::result::Result<FetchedContent, crate::FetchError>;
}

/// Client used by the JSON API providers.
pub(crate) fn api_client() -> Result<Client> {
    Client::builder()
        .user_agent(USER_AGENT)
        .timeout(SERVICE_TIMEOUT)
        .build()
        .map_err(|e| NewsforgeError::Network(format!("failed to build HTTP client: {e}")))
}
