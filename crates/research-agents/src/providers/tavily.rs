//! Tavily client — the general web-search provider.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{GeneralResult, GeneralSearch, ProviderError, ProviderResult};

const TAVILY_URL: &str = "https://api.tavily.com/search";

#[derive(Serialize)]
struct SearchRequest<'a> {
    api_key: &'a str,
    query: &'a str,
    max_results: u32,
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<GeneralResult>,
}

pub struct TavilyClient {
    http: reqwest::Client,
    api_key: Option<String>,
}

impl TavilyClient {
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: api_key.filter(|key| !key.is_empty()),
        }
    }
}

#[async_trait]
impl GeneralSearch for TavilyClient {
    async fn search(
        &self,
        query: &str,
        max_results: u32,
    ) -> ProviderResult<Vec<GeneralResult>> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(ProviderError::MissingCredentials)?;

        let request = SearchRequest {
            api_key,
            query,
            max_results,
        };

        let response = self
            .http
            .post(TAVILY_URL)
            .json(&request)
            .send()
            .await?
            .error_for_status()?
            .json::<SearchResponse>()
            .await?;

        Ok(response.results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_key_is_a_call_failure() {
        let client = TavilyClient::new(None);
        let err = client.search("anything", 3).await.unwrap_err();
        assert!(matches!(err, ProviderError::MissingCredentials));
    }

    #[tokio::test]
    async fn test_empty_key_counts_as_missing() {
        let client = TavilyClient::new(Some(String::new()));
        let err = client.search("anything", 3).await.unwrap_err();
        assert!(matches!(err, ProviderError::MissingCredentials));
    }

    #[test]
    fn test_response_decodes_with_missing_fields() {
        let json = r#"{"results": [{"title": "A"}, {"url": "https://b", "content": "c"}]}"#;
        let response: SearchResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.results.len(), 2);
        assert_eq!(response.results[0].title.as_deref(), Some("A"));
        assert!(response.results[0].url.is_none());
        assert!(response.results[1].published_date.is_none());
    }

    #[test]
    fn test_response_without_results_key_is_empty() {
        let response: SearchResponse = serde_json::from_str("{}").unwrap();
        assert!(response.results.is_empty());
    }
}
