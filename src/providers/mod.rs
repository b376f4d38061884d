//! Lookup and explanation service integrations

mod backend;
pub mod lookup;

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

pub use backend::BackendClient;
pub use lookup::{Confidence, LookupResponse, LookupResult, SpecValue};

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Timed out after {0:?}")]
    Timeout(Duration),
}

/// Body of an explanation request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExplainRequest {
    pub manufacturer: String,
    pub prodname: String,
    pub question: String,
}

impl ExplainRequest {
    /// Ask about the product a lookup resolved, using the user's own words
    pub fn for_result(result: &LookupResult, question: &str) -> Self {
        Self {
            manufacturer: result.manufacturer.clone().unwrap_or_default(),
            prodname: result.product.clone().unwrap_or_default(),
            question: question.to_string(),
        }
    }
}

/// The remote service, seen as a black box
#[async_trait]
pub trait LookupApi: Send + Sync {
    /// Resolve structured specifications from free text
    async fn lookup(&self, query: &str) -> Result<LookupResult, ProviderError>;

    /// Natural-language answer about a product; `None` when the service had none
    async fn explain(&self, request: &ExplainRequest) -> Result<Option<String>, ProviderError>;
}
