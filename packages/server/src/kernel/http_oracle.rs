//! Extraction oracle over HTTP.
//!
//! POSTs `{content, metadata}` to the configured endpoint. The endpoint
//! answers with either a payload object in the strict schema or
//! `{"failure": "<reason>"}`.

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::common::{PipelineError, PipelineResult};
use crate::domains::extraction::ExtractedPayload;
use crate::domains::source::SourceMetadata;

use super::simple_fetcher::SimpleFetcher;
use super::BaseExtractionOracle;

#[derive(Serialize)]
struct OracleRequest<'a> {
    content: &'a str,
    metadata: &'a SourceMetadata,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OracleResponse {
    Failure { failure: String },
    Payload(serde_json::Value),
}

pub struct HttpExtractionOracle {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpExtractionOracle {
    pub fn new(endpoint: impl Into<String>) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    /// Parse an oracle response body into the strict payload schema.
    pub(crate) fn parse_response(body: &str) -> PipelineResult<ExtractedPayload> {
        let response: OracleResponse = serde_json::from_str(body).map_err(|e| {
            PipelineError::PermanentSource(format!("oracle returned invalid JSON: {}", e))
        })?;

        match response {
            OracleResponse::Failure { failure } => Err(PipelineError::PermanentSource(format!(
                "oracle could not extract a pattern: {}",
                failure
            ))),
            OracleResponse::Payload(value) => ExtractedPayload::from_json(value).map_err(|e| {
                PipelineError::PermanentSource(format!("oracle payload rejected: {}", e))
            }),
        }
    }
}

#[async_trait]
impl BaseExtractionOracle for HttpExtractionOracle {
    async fn extract(
        &self,
        raw_content: &str,
        metadata: &SourceMetadata,
    ) -> PipelineResult<ExtractedPayload> {
        debug!(endpoint = %self.endpoint, content_length = raw_content.len(), "Calling extraction oracle");

        let response = self
            .client
            .post(&self.endpoint)
            .json(&OracleRequest {
                content: raw_content,
                metadata,
            })
            .send()
            .await
            .map_err(|e| SimpleFetcher::classify_transport(&e, &self.endpoint))?;

        if let Some(error) = SimpleFetcher::classify_status(response.status(), &self.endpoint) {
            return Err(error);
        }

        let body = response
            .text()
            .await
            .map_err(|e| SimpleFetcher::classify_transport(&e, &self.endpoint))?;
        Self::parse_response(&body)
    }
}
