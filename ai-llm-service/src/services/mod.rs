//! Chat services plus the HTTP plumbing they share.

pub mod ollama_service;
pub mod open_ai_service;

use std::time::{Duration, Instant};

use reqwest::header::HeaderMap;
use serde::{Serialize, de::DeserializeOwned};
use tracing::{debug, error};

use crate::error_handler::{
    AiLlmError, HttpError, Provider, ProviderError, ProviderErrorKind, make_snippet,
};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// One JSON POST endpoint with a bounded timeout.
#[derive(Debug)]
pub(crate) struct ChatTransport {
    provider: Provider,
    client: reqwest::Client,
    url: String,
    timeout: Duration,
}

impl ChatTransport {
    /// `endpoint` + `path`, after checking the scheme.
    pub(crate) fn new(
        provider: Provider,
        endpoint: &str,
        path: &str,
        timeout_secs: Option<u64>,
        headers: HeaderMap,
    ) -> Result<Self, AiLlmError> {
        let endpoint = endpoint.trim();
        if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
            return Err(ProviderError::new(
                provider,
                ProviderErrorKind::InvalidEndpoint(endpoint.to_string()),
            )
            .into());
        }

        let timeout = timeout_secs.map(Duration::from_secs).unwrap_or(DEFAULT_TIMEOUT);
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()?;

        Ok(Self {
            provider,
            client,
            url: format!("{}{path}", endpoint.trim_end_matches('/')),
            timeout,
        })
    }

    pub(crate) fn url(&self) -> &str {
        &self.url
    }

    pub(crate) fn timeout(&self) -> Duration {
        self.timeout
    }

    /// POSTs `body` and decodes a 2xx reply as `R`.
    ///
    /// Client timeouts become [`AiLlmError::Timeout`]; non-2xx replies carry
    /// a short body snippet.
    pub(crate) async fn post<B, R>(&self, body: &B) -> Result<R, AiLlmError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let started = Instant::now();
        debug!(provider = %self.provider, url = %self.url, "POST");

        let resp = match self.client.post(&self.url).json(body).send().await {
            Ok(r) => r,
            Err(e) if e.is_timeout() => return Err(AiLlmError::Timeout(self.timeout)),
            Err(e) => return Err(e.into()),
        };

        let status = resp.status();
        if !status.is_success() {
            let snippet = make_snippet(&resp.text().await.unwrap_or_default());
            error!(
                provider = %self.provider,
                %status,
                url = %self.url,
                %snippet,
                latency_ms = started.elapsed().as_millis(),
                "chat endpoint returned non-success status"
            );
            return Err(self.fail(ProviderErrorKind::HttpStatus(HttpError {
                status,
                url: self.url.clone(),
                snippet,
            })));
        }

        resp.json::<R>().await.map_err(|e| {
            error!(provider = %self.provider, error = %e, "undecodable chat response");
            self.fail(ProviderErrorKind::Decode(e.to_string()))
        })
    }

    pub(crate) fn fail(&self, kind: ProviderErrorKind) -> AiLlmError {
        ProviderError::new(self.provider, kind).into()
    }
}
