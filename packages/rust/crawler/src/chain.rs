//! Ordered provider fallback for a single URL.

use std::sync::Arc;

use newsforge_shared::{FetchOutcome, ProviderKind, ProviderSettings, Result};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::FetchError;
use crate::providers::{
    CrawlServiceProvider, FetchProvider, FirecrawlProvider, HttpBasicProvider, LinkupProvider,
    api_client,
};

/// Providers tried in order until one returns content.
#[derive(Clone)]
pub struct FallbackChain {
    providers: Vec<Arc<dyn FetchProvider>>,
}

impl std::fmt::Debug for FallbackChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FallbackChain")
            .field("providers", &self.kinds())
            .finish()
    }
}

impl FallbackChain {
    pub fn new(providers: Vec<Arc<dyn FetchProvider>>) -> Self {
        Self { providers }
    }

    /// The standard four-tier chain built from resolved settings.
    pub fn from_settings(settings: &ProviderSettings) -> Result<Self> {
        Ok(Self::new(Self::standard_providers(
            settings,
            HttpBasicProvider::new()?,
        )?))
    }

    /// Like [`FallbackChain::from_settings`] but the direct fetch may reach
    /// loopback and private-network hosts.
    pub fn from_settings_allowing_private_hosts(settings: &ProviderSettings) -> Result<Self> {
        Ok(Self::new(Self::standard_providers(
            settings,
            HttpBasicProvider::new()?.allow_private_hosts(),
        )?))
    }

    fn standard_providers(
        settings: &ProviderSettings,
        direct: HttpBasicProvider,
    ) -> Result<Vec<Arc<dyn FetchProvider>>> {
        let client = api_client()?;
        Ok(vec![
            Arc::new(CrawlServiceProvider::new(
                client.clone(),
                settings.crawl_service_url.clone(),
            )),
            Arc::new(FirecrawlProvider::new(
                client.clone(),
                settings.firecrawl_api_key.clone(),
                settings.firecrawl_endpoint.clone(),
            )),
            Arc::new(LinkupProvider::new(
                client,
                settings.linkup_api_key.clone(),
                settings.linkup_endpoint.clone(),
            )),
            Arc::new(direct),
        ])
    }

    /// Kinds in the order they are tried.
    pub fn kinds(&self) -> Vec<ProviderKind> {
        self.providers.iter().map(|p| p.kind()).collect()
    }

    /// Kind reported when every provider fails.
    pub fn last_kind(&self) -> ProviderKind {
        self.providers
            .last()
            .map(|p| p.kind())
            .unwrap_or(ProviderKind::HttpBasic)
    }

    /// Run the chain for `url`.
    ///
    /// The first provider returning non-blank content wins. Otherwise the
    /// outcome carries the error of the last provider attempted.
    pub async fn run(&self, url: &str, cancel: &CancellationToken) -> FetchOutcome {
        let mut last: Option<(ProviderKind, FetchError)> = None;

        for provider in &self.providers {
            let kind = provider.kind();

            if cancel.is_cancelled() {
                last = Some((kind, FetchError::Cancelled));
                break;
            }

            if !provider.is_configured() {
                debug!(%url, provider = %kind, "provider not configured, skipping");
                last = Some((kind, FetchError::NotConfigured(kind.as_str())));
                continue;
            }

            let limit = provider.timeout();
            let attempt = tokio::select! {
                biased;
                _ = cancel.cancelled() => Err(FetchError::Cancelled),
                result = tokio::time::timeout(limit, provider.fetch(url)) => {
                    result.unwrap_or(Err(FetchError::Timeout(limit)))
                }
            };

            match attempt {
                Ok(fetched) if !fetched.content.trim().is_empty() => {
                    debug!(%url, provider = %kind, "fetched");
                    return FetchOutcome::succeeded(
                        url,
                        kind,
                        fetched.content,
                        fetched.title,
                        fetched.cost,
                    );
                }
                Ok(_) => {
                    debug!(%url, provider = %kind, "provider returned no content");
                    last = Some((kind, FetchError::Empty));
                }
                Err(FetchError::Cancelled) => {
                    last = Some((kind, FetchError::Cancelled));
                    break;
                }
                Err(e) => {
                    debug!(%url, provider = %kind, error = %e, "provider failed");
                    last = Some((kind, e));
                }
            }
        }

        let (kind, error) = last.unwrap_or((self.last_kind(), FetchError::Empty));
        warn!(%url, provider = %kind, error = %error, "all providers failed");
        FetchOutcome::failed(url, kind, error.to_string())
    }
}
