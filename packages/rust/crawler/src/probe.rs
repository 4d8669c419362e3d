//! Lightweight reachability check for a single URL.

use std::time::Duration;

use reqwest::Client;
use serde::Serialize;
use tracing::{debug, instrument};

use crate::providers::USER_AGENT;

pub const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Result of a `HEAD` request against a URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccessibilityReport {
    pub url: String,
    /// True when the final response status is below 400.
    pub accessible: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    /// URL after redirects.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Client suited to [`probe_url`]: short timeout, redirects followed.
pub fn probe_client() -> newsforge_shared::Result<Client> {
    Client::builder()
        .user_agent(USER_AGENT)
        .timeout(PROBE_TIMEOUT)
        .build()
        .map_err(|e| {
            newsforge_shared::NewsforgeError::Network(format!("failed to build HTTP client: {e}"))
        })
}

/// Send a `HEAD` request and report whether the URL answers below 400.
///
/// Never fails; transport errors land in [`AccessibilityReport::error`].
#[instrument(skip(client))]
pub async fn probe_url(client: &Client, url: &str) -> AccessibilityReport {
    match client.head(url).timeout(PROBE_TIMEOUT).send().await {
        Ok(response) => {
            let status = response.status().as_u16();
            debug!(status, "probe answered");
            AccessibilityReport {
                url: url.to_string(),
                accessible: status < 400,
                status_code: Some(status),
                final_url: Some(response.url().to_string()),
                error: None,
            }
        }
        Err(e) => AccessibilityReport {
            url: url.to_string(),
            accessible: false,
            status_code: None,
            final_url: None,
            error: Some(e.to_string()),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn reachable_after_redirect() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .and(path("/old"))
            .respond_with(
                ResponseTemplate::new(302)
                    .insert_header("location", format!("{}/new", server.uri()).as_str()),
            )
            .mount(&server)
            .await;
        Mock::given(method("HEAD"))
            .and(path("/new"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let report = probe_url(&probe_client().unwrap(), &format!("{}/old", server.uri())).await;

        assert!(report.accessible);
        assert_eq!(report.status_code, Some(200));
        assert_eq!(report.final_url, Some(format!("{}/new", server.uri())));
    }

    #[tokio::test]
    async fn client_error_is_inaccessible() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let report = probe_url(&probe_client().unwrap(), &server.uri()).await;
        assert!(!report.accessible);
        assert_eq!(report.status_code, Some(403));
        assert!(report.error.is_none());
    }

    #[tokio::test]
    async fn transport_error_is_reported() {
        let report = probe_url(&probe_client().unwrap(), "http://127.0.0.1:1/").await;
        assert!(!report.accessible);
        assert!(report.status_code.is_none());
        assert!(report.error.is_some());
    }
}
