//! HTTP client for the NeuralFlow backend

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{ExplainRequest, LookupApi, LookupResponse, LookupResult, ProviderError};

pub struct BackendClient {
    client: Client,
    base_url: String,
}

#[derive(Debug, Serialize)]
struct LookupRequest<'a> {
    query: &'a str,
}

#[derive(Debug, Deserialize)]
struct ExplainResponse {
    #[serde(default)]
    ai_answer: Option<serde_json::Value>,
}

impl ExplainResponse {
    fn answer(self) -> Option<String> {
        match self.ai_answer? {
            serde_json::Value::String(s) if !s.trim().is_empty() => Some(s),
            _ => None,
        }
    }
}

impl BackendClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ProviderError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn check(response: Response) -> Result<Response, ProviderError> {
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::InvalidResponse(format!(
                "{}: {}",
                status, body
            )));
        }
        Ok(response)
    }
}

#[async_trait]
impl LookupApi for BackendClient {
    async fn lookup(&self, query: &str) -> Result<LookupResult, ProviderError> {
        let response = self
            .client
            .post(self.url("/api/lookup"))
            .json(&LookupRequest { query })
            .send()
            .await?;

        let body: LookupResponse = Self::check(response).await?.json().await?;

        if let Some(error) = body.error_message() {
            tracing::debug!("Lookup for '{}' reported: {}", query, error);
        }

        Ok(body.into())
    }

    async fn explain(&self, request: &ExplainRequest) -> Result<Option<String>, ProviderError> {
        let response = self
            .client
            .post(self.url("/api/ask"))
            .json(request)
            .send()
            .await?;

        // Error statuses still carry a JSON body, which reads as no answer
        let status = response.status();
        if !status.is_success() {
            tracing::debug!("Explanation service answered {}", status);
        }

        let body: ExplainResponse = response.json().await?;
        Ok(body.answer())
    }
}
