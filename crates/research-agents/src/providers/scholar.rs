//! SerpAPI Google Scholar client — the academic-literature provider.

use async_trait::async_trait;
use serde::Deserialize;

use super::{AcademicResult, AcademicSearch, ProviderError, ProviderResult};

const SERPAPI_URL: &str = "https://serpapi.com/search.json";

#[derive(Deserialize)]
struct ScholarResponse {
    #[serde(default)]
    organic_results: Vec<AcademicResult>,
}

pub struct ScholarClient {
    http: reqwest::Client,
    api_key: Option<String>,
}

impl ScholarClient {
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: api_key.filter(|key| !key.is_empty()),
        }
    }
}

#[async_trait]
impl AcademicSearch for ScholarClient {
    async fn search(
        &self,
        query: &str,
        max_results: u32,
    ) -> ProviderResult<Vec<AcademicResult>> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(ProviderError::MissingCredentials)?;

        let num = max_results.to_string();
        let params: [(&str, &str); 4] = [
            ("engine", "google_scholar"),
            ("q", query),
            ("num", &num),
            ("api_key", api_key),
        ];

        let response = self
            .http
            .get(SERPAPI_URL)
            .query(&params)
            .send()
            .await?
            .error_for_status()?
            .json::<ScholarResponse>()
            .await?;

        Ok(response.organic_results)
    }
}
