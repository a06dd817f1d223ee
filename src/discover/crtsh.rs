//! HTTP access to the crt.sh Certificate Transparency aggregator.
//!
//! Every attempt is classified into a [`FetchOutcome`]; transient failures are
//! retried with exponential backoff, anything else is returned as-is.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::config::ScanConfig;

/// The aggregator sometimes labels JSON as text/plain.
pub const ACCEPT_HEADER: &str = "application/json, text/plain;q=0.9, */*;q=0.8";

/// Statuses that are expected to clear up on their own.
pub const RETRYABLE_STATUSES: [u16; 5] = [429, 500, 502, 503, 504];

#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    Success(Value),
    RetryableFailure(String),
    FatalFailure(String),
}

impl FetchOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, FetchOutcome::Success(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpReply {
    pub status: u16,
    pub body: String,
}

/// One GET against the aggregator. `Err` carries a network-level reason
/// (timeout, refused connection, truncated body).
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, url: &str) -> Result<HttpReply, String>;
}

#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

pub struct ReqwestTransport {
    client: Client,
    timeout: Duration,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration, user_agent: &str) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout.min(Duration::from_secs(5)))
            .user_agent(user_agent)
            .gzip(true)
            .use_rustls_tls()
            .build()
            .unwrap_or_default();

        Self { client, timeout }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn get(&self, url: &str) -> Result<HttpReply, String> {
        let response = self
            .client
            .get(url)
            .header(reqwest::header::ACCEPT, ACCEPT_HEADER)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| describe_reqwest_error(&e))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| describe_reqwest_error(&e))?;

        Ok(HttpReply { status, body })
    }
}

fn describe_reqwest_error(e: &reqwest::Error) -> String {
    if e.is_timeout() {
        format!("request timed out: {}", e)
    } else if e.is_connect() {
        format!("connection error: {}", e)
    } else {
        format!("request failed: {}", e)
    }
}

/// Map a single HTTP reply onto the retry policy.
pub fn classify(reply: HttpReply) -> FetchOutcome {
    match reply.status {
        200 => match serde_json::from_str::<Value>(&reply.body) {
            Ok(value) => FetchOutcome::Success(value),
            Err(_) => FetchOutcome::RetryableFailure("invalid JSON".to_string()),
        },
        s if RETRYABLE_STATUSES.contains(&s) => FetchOutcome::RetryableFailure(format!("HTTP {}", s)),
        s => FetchOutcome::FatalFailure(format!("HTTP {}", s)),
    }
}

pub struct CrtShFetcher {
    transport: Arc<dyn Transport>,
    sleeper: Arc<dyn Sleeper>,
    config: ScanConfig,
}

impl CrtShFetcher {
    pub fn new(config: &ScanConfig) -> Self {
        let transport = ReqwestTransport::new(config.http_timeout, &config.user_agent);
        Self::with_transport(Arc::new(transport), Arc::new(TokioSleeper), config)
    }

    pub fn with_transport(
        transport: Arc<dyn Transport>,
        sleeper: Arc<dyn Sleeper>,
        config: &ScanConfig,
    ) -> Self {
        Self {
            transport,
            sleeper,
            config: config.clone(),
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.config.http_retries.max(1)
    }

    /// GET `url` until it succeeds, fails fatally, or attempts run out.
    ///
    /// Cancellation during a request or a backoff sleep returns
    /// `RetryableFailure("cancelled")`.
    pub async fn fetch(&self, url: &str, cancel: &CancellationToken) -> FetchOutcome {
        let attempts = self.max_attempts();
        let mut last_reason = String::from("no attempt made");

        for attempt in 1..=attempts {
            debug!("crt.sh attempt {}/{}: {}", attempt, attempts, url);

            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => return FetchOutcome::RetryableFailure("cancelled".to_string()),
                reply = self.transport.get(url) => match reply {
                    Ok(reply) => classify(reply),
                    Err(reason) => FetchOutcome::RetryableFailure(reason),
                },
            };

            match outcome {
                FetchOutcome::RetryableFailure(reason) => {
                    debug!("crt.sh attempt {} failed (retryable): {}", attempt, reason);
                    last_reason = reason;
                }
                FetchOutcome::FatalFailure(ref reason) => {
                    warn!("crt.sh returned a non-retryable response for {}: {}", url, reason);
                    return outcome;
                }
                FetchOutcome::Success(_) => return outcome,
            }

            if attempt < attempts {
                let delay = self.config.backoff_delay(attempt);
                debug!("Backing off {:?} before attempt {}", delay, attempt + 1);
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return FetchOutcome::RetryableFailure("cancelled".to_string()),
                    _ = self.sleeper.sleep(delay) => {}
                }
            }
        }

        warn!("All {} attempts against crt.sh exhausted: {}", attempts, last_reason);
        FetchOutcome::RetryableFailure(last_reason)
    }
}
