//! Linkup sourced-answer search, used as a content lookup for one URL.

use async_trait::async_trait;
use newsforge_shared::ProviderKind;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{FetchProvider, FetchedContent, SERVICE_TIMEOUT};
use crate::FetchError;

pub struct LinkupProvider {
    client: Client,
    api_key: Option<String>,
    endpoint: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SearchRequest<'a> {
    q: &'a str,
    depth: &'static str,
    output_type: &'static str,
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    sources: Vec<Source>,
}

#[derive(Deserialize)]
struct Source {
    #[serde(default)]
    url: String,
    #[serde(default)]
    content: Option<String>,
}

impl LinkupProvider {
    pub fn new(client: Client, api_key: Option<String>, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            api_key,
            endpoint: endpoint.into(),
        }
    }
}

/// Content of the source matching `url`, else of the first source.
fn pick_content(sources: Vec<Source>, url: &str) -> String {
    let exact = sources
        .iter()
        .find(|s| s.url == url)
        .and_then(|s| s.content.clone())
        .filter(|c| !c.trim().is_empty());

    exact
        .or_else(|| sources.into_iter().next().and_then(|s| s.content))
        .unwrap_or_default()
}

#[async_trait]
impl FetchProvider for LinkupProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Linkup
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    async fn fetch(&self, url: &str) -> Result<FetchedContent, FetchError> {
        let Some(key) = &self.api_key else {
            return Err(FetchError::NotConfigured("linkup"));
        };

        debug!(%url, "linkup lookup");
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(key)
            .json(&SearchRequest {
                q: url,
                depth: "standard",
                output_type: "sourcedAnswer",
            })
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(e, SERVICE_TIMEOUT))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Http(status.as_u16()));
        }

        let body: SearchResponse = response
            .json()
            .await
            .map_err(|e| FetchError::Decode(e.to_string()))?;

        let content = pick_content(body.sources, url);
        if content.trim().is_empty() {
            return Err(FetchError::Empty);
        }

        Ok(FetchedContent {
            content,
            title: String::new(),
            cost: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider(server: &MockServer) -> LinkupProvider {
        LinkupProvider::new(Client::new(), Some("lk-test".into()), server.uri())
    }

    #[tokio::test]
    async fn prefers_exact_url_source() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(header("authorization", "Bearer lk-test"))
            .and(body_json(json!({
                "q": "https://news.example/a",
                "depth": "standard",
                "outputType": "sourcedAnswer"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "answer": "summary",
                "sources": [
                    { "name": "Other", "url": "https://other.example/x", "content": "other text" },
                    { "name": "News", "url": "https://news.example/a", "content": "exact text" }
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let out = provider(&server).fetch("https://news.example/a").await.unwrap();
        assert_eq!(out.content, "exact text");
        assert_eq!(out.cost, None);
    }

    #[tokio::test]
    async fn falls_back_to_first_source() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "sources": [
                    { "url": "https://other.example/x", "content": "first text" },
                    { "url": "https://news.example/a", "content": "" }
                ]
            })))
            .mount(&server)
            .await;

        let out = provider(&server).fetch("https://news.example/a").await.unwrap();
        assert_eq!(out.content, "first text");
    }

    #[tokio::test]
    async fn no_sources_is_empty() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "sources": [] })))
            .mount(&server)
            .await;

        let err = provider(&server).fetch("https://news.example/a").await.unwrap_err();
        assert_eq!(err, FetchError::Empty);
    }
}
