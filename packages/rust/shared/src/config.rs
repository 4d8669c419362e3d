//! Application configuration for Newsforge.
//!
//! User config lives at `~/.newsforge/newsforge.toml`.
//! CLI flags override config file values, which override defaults.
//! Secrets never live in the file: it only names the environment variables
//! that hold them, and [`ProviderSettings::resolve`] reads those at runtime.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{NewsforgeError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "newsforge.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".newsforge";

// ---------------------------------------------------------------------------
// Config structs (matching newsforge.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Research pipeline defaults.
    #[serde(default)]
    pub research: ResearchConfig,

    /// Provider credentials (as env var names) and endpoints.
    #[serde(default)]
    pub providers: ProvidersConfig,
}

/// `[research]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResearchConfig {
    /// Search result pages fetched for company research.
    #[serde(default = "default_company_pages")]
    pub company_pages: u32,

    /// Results requested per search page.
    #[serde(default = "default_results_per_page")]
    pub results_per_page: u32,

    /// Maximum URLs crawled for a company profile.
    #[serde(default = "default_company_max_urls")]
    pub company_max_urls: usize,

    /// Concurrent fetches for company research.
    #[serde(default = "default_company_concurrency")]
    pub company_concurrency: usize,

    /// Maximum sources crawled for an article (also its concurrency cap).
    #[serde(default = "default_article_max_sources")]
    pub article_max_sources: usize,
}

impl Default for ResearchConfig {
    fn default() -> Self {
        Self {
            company_pages: default_company_pages(),
            results_per_page: default_results_per_page(),
            company_max_urls: default_company_max_urls(),
            company_concurrency: default_company_concurrency(),
            article_max_sources: default_article_max_sources(),
        }
    }
}

fn default_company_pages() -> u32 {
    2
}
fn default_results_per_page() -> u32 {
    10
}
fn default_company_max_urls() -> usize {
    15
}
fn default_company_concurrency() -> usize {
    5
}
fn default_article_max_sources() -> usize {
    30
}

/// `[providers]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvidersConfig {
    /// Env var holding the Serper search API key.
    #[serde(default = "default_serper_key_env")]
    pub serper_api_key_env: String,

    /// Serper API base URL.
    #[serde(default = "default_serper_base_url")]
    pub serper_base_url: String,

    /// Env var holding the browser-render crawl service base URL.
    #[serde(default = "default_crawl_service_env")]
    pub crawl_service_url_env: String,

    /// Env var holding the Firecrawl API key.
    #[serde(default = "default_firecrawl_key_env")]
    pub firecrawl_api_key_env: String,

    /// Firecrawl scrape endpoint.
    #[serde(default = "default_firecrawl_endpoint")]
    pub firecrawl_endpoint: String,

    /// Env var holding the Linkup API key.
    #[serde(default = "default_linkup_key_env")]
    pub linkup_api_key_env: String,

    /// Linkup search endpoint.
    #[serde(default = "default_linkup_endpoint")]
    pub linkup_endpoint: String,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            serper_api_key_env: default_serper_key_env(),
            serper_base_url: default_serper_base_url(),
            crawl_service_url_env: default_crawl_service_env(),
            firecrawl_api_key_env: default_firecrawl_key_env(),
            firecrawl_endpoint: default_firecrawl_endpoint(),
            linkup_api_key_env: default_linkup_key_env(),
            linkup_endpoint: default_linkup_endpoint(),
        }
    }
}

fn default_serper_key_env() -> String {
    "SERPER_API_KEY".into()
}
fn default_serper_base_url() -> String {
    "https://google.serper.dev".into()
}
fn default_crawl_service_env() -> String {
    "CRAWL_SERVICE_URL".into()
}
fn default_firecrawl_key_env() -> String {
    "FIRECRAWL_API_KEY".into()
}
fn default_firecrawl_endpoint() -> String {
    "https://api.firecrawl.dev/v1/scrape".into()
}
fn default_linkup_key_env() -> String {
    "LINKUP_API_KEY".into()
}
fn default_linkup_endpoint() -> String {
    "https://api.linkup.so/v1/search".into()
}

// ---------------------------------------------------------------------------
// Provider settings (runtime, resolved from config + environment)
// ---------------------------------------------------------------------------

/// Resolved provider credentials and endpoints for one pipeline run.
///
/// Every credential is optional. A `None` means "provider unconfigured",
/// which the fetch chain treats as an immediate skip rather than an error.
/// Read-only once built; share it behind an `Arc`.
#[derive(Clone, Default)]
pub struct ProviderSettings {
    pub serper_api_key: Option<String>,
    pub serper_base_url: String,
    pub crawl_service_url: Option<String>,
    pub firecrawl_api_key: Option<String>,
    pub firecrawl_endpoint: String,
    pub linkup_api_key: Option<String>,
    pub linkup_endpoint: String,
}

impl ProviderSettings {
    /// Resolve settings using `lookup` to read environment variables.
    ///
    /// Empty values are treated as unset.
    pub fn resolve(config: &AppConfig, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let read = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let p = &config.providers;

        Self {
            serper_api_key: read(&p.serper_api_key_env),
            serper_base_url: p.serper_base_url.trim_end_matches('/').to_string(),
            crawl_service_url: read(&p.crawl_service_url_env)
                .map(|u| u.trim_end_matches('/').to_string()),
            firecrawl_api_key: read(&p.firecrawl_api_key_env),
            firecrawl_endpoint: p.firecrawl_endpoint.clone(),
            linkup_api_key: read(&p.linkup_api_key_env),
            linkup_endpoint: p.linkup_endpoint.clone(),
        }
    }

    /// Resolve settings from the process environment.
    pub fn from_env(config: &AppConfig) -> Self {
        Self::resolve(config, |name| std::env::var(name).ok())
    }

    /// Availability of each external service, for display.
    pub fn availability(&self) -> Vec<(&'static str, bool)> {
        vec![
            ("serper", self.serper_api_key.is_some()),
            ("crawl_service", self.crawl_service_url.is_some()),
            ("firecrawl", self.firecrawl_api_key.is_some()),
            ("linkup", self.linkup_api_key.is_some()),
            ("http_basic", true),
        ]
    }
}

// Keys must never end up in logs.
impl std::fmt::Debug for ProviderSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let redact = |v: &Option<String>| if v.is_some() { "<set>" } else { "<unset>" };
        f.debug_struct("ProviderSettings")
            .field("serper_api_key", &redact(&self.serper_api_key))
            .field("serper_base_url", &self.serper_base_url)
            .field("crawl_service_url", &self.crawl_service_url)
            .field("firecrawl_api_key", &redact(&self.firecrawl_api_key))
            .field("firecrawl_endpoint", &self.firecrawl_endpoint)
            .field("linkup_api_key", &redact(&self.linkup_api_key))
            .field("linkup_endpoint", &self.linkup_endpoint)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.newsforge/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| NewsforgeError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.newsforge/newsforge.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| NewsforgeError::io(path, e))?;

    toml::from_str(&content).map_err(|e| {
        NewsforgeError::config(format!("failed to parse {}: {e}", path.display()))
    })
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| NewsforgeError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| NewsforgeError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| NewsforgeError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}
