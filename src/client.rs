//! HTTP request execution for virtual users


use crate::{
    error::{AppError, Result},
    models::{ErrorKind, RequestSample, SampleError, TestConfig},
};
use async_trait::async_trait;
use chrono::Utc;
use futures::StreamExt;
use reqwest::Client;
use std::time::{Duration, Instant};
use tokio::time::timeout;

/// Issues one request and reports what happened
///
/// Implementations never fail: transport problems come back as an errored
/// sample so the calling virtual user keeps iterating.
#[async_trait]
pub trait RequestExecutor: Send + Sync {
    async fn execute(&self, vu_id: usize, url: &str) -> RequestSample;
}

/// reqwest-backed GET executor with a per-request timeout
#[derive(Debug, Clone)]
pub struct HttpExecutor {
    client: Client,
    timeout: Duration,
}

impl HttpExecutor {
    pub fn new(request_timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(request_timeout)
            .user_agent(concat!("vu-load-tester/", env!("CARGO_PKG_VERSION")))
            // Measure the target itself, not whatever it redirects to
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| AppError::request(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            timeout: request_timeout,
        })
    }

    pub fn from_config(config: &TestConfig) -> Result<Self> {
        Self::new(config.request_timeout)
    }

    pub fn request_timeout(&self) -> Duration {
        self.timeout
    }

    /// Send the request and drain the body, returning status and body size
    ///
    /// The body is counted chunk by chunk and never held in memory whole.
    async fn fetch(&self, url: &str) -> std::result::Result<(u16, usize), reqwest::Error> {
        let response = self.client.get(url).send().await?;
        let status = response.status().as_u16();

        let mut body_size = 0usize;
        let mut chunks = response.bytes_stream();
        while let Some(chunk) = chunks.next().await {
            body_size += chunk?.len();
        }
        Ok((status, body_size))
    }
}

#[async_trait]
impl RequestExecutor for HttpExecutor {
    async fn execute(&self, vu_id: usize, url: &str) -> RequestSample {
        let started_at = Utc::now();
        let start = Instant::now();

        // The outer timeout also bounds slow body transfers
        match timeout(self.timeout, self.fetch(url)).await {
            Ok(Ok((status, body_size))) => {
                RequestSample::response(vu_id, started_at, start.elapsed(), status, body_size)
            }
            Ok(Err(e)) => RequestSample::failed(vu_id, started_at, start.elapsed(), SampleError::from_reqwest(&e)),
            Err(_) => RequestSample::failed(
                vu_id,
                started_at,
                start.elapsed(),
                SampleError::new(
                    ErrorKind::Timeout,
                    format!("request timed out after {}ms", self.timeout.as_millis()),
                ),
            ),
        }
    }
}
