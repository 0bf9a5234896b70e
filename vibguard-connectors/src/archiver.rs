//! Archiver Appliance Connector - JSON Retrieval over HTTP
//!
//! ## Overview
//!
//! Fetches PV histories from an EPICS Archiver Appliance through its JSON
//! retrieval endpoint:
//!
//! ```text
//! GET {base_url}/retrieval/data/getData.json?pv=<name>&from=<rfc3339>&to=<rfc3339>
//! ```
//!
//! ## Implementation Choices
//!
//! - `ureq` blocking client, run on tokio's blocking pool so several PVs
//!   can be fetched concurrently
//! - Exponential backoff (100 ms × 2^attempt) on transport errors, 5xx
//!   and 429; other client errors fail immediately
//! - Optional basic/bearer authentication for appliances behind a proxy
//!
//! ## Example Usage
//!
//! ```no_run
//! use vibguard_connectors::archiver::{ArchiverClient, ArchiverConfig};
//! use vibguard_connectors::ArchiveSource;
//! use vibguard_core::TimeWindow;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ArchiverConfig::new("http://archappl.diamond.ac.uk")
//!     .timeout_secs(30)
//!     .max_retries(5);
//!
//! let archiver = ArchiverClient::new(config)?;
//! let records = archiver
//!     .fetch("BL20I-DI-ACCEL-01:DATA:CH01:VC_PEAK", TimeWindow::new(0, 86_400_000))
//!     .await?;
//! # Ok(())
//! # }
//! ```

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use base64::Engine;
use chrono::{DateTime, SecondsFormat, Utc};
use vibguard_core::{TimeWindow, Timestamp};

use crate::wire::parse_response;
use crate::{ArchiveError, ArchiveRecord, ArchiveSource, ConnectionStats};

/// Default appliance
pub const DEFAULT_APPLIANCE_URL: &str = "http://archappl.diamond.ac.uk";

/// Retrieval path below the appliance base URL
pub const RETRIEVAL_PATH: &str = "/retrieval/data/getData.json";

/// Archiver configuration
#[derive(Clone)]
pub struct ArchiverConfig {
    /// Appliance base URL
    pub base_url: String,
    /// Request timeout
    pub timeout: Duration,
    /// Authentication method
    pub auth: AuthMethod,
    /// Custom headers
    pub headers: HashMap<String, String>,
    /// Retries after the first attempt
    pub max_retries: u32,
    /// User agent string
    pub user_agent: String,
}

/// Authentication methods
#[derive(Clone)]
pub enum AuthMethod {
    /// No authentication
    None,
    /// Bearer token
    Bearer(String),
    /// Basic authentication
    Basic { username: String, password: String },
}

impl Default for ArchiverConfig {
    fn default() -> Self {
        Self::new(DEFAULT_APPLIANCE_URL)
    }
}

impl ArchiverConfig {
    /// Create new configuration with base URL
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(30),
            auth: AuthMethod::None,
            headers: HashMap::new(),
            max_retries: 3,
            user_agent: format!("vibguard/{}", env!("CARGO_PKG_VERSION")),
        }
    }

    /// Set bearer token authentication
    pub fn bearer_token(mut self, token: impl Into<String>) -> Self {
        self.auth = AuthMethod::Bearer(token.into());
        self
    }

    /// Set basic authentication
    pub fn basic_auth(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.auth = AuthMethod::Basic {
            username: username.into(),
            password: password.into(),
        };
        self
    }

    /// Set request timeout in seconds
    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.timeout = Duration::from_secs(secs);
        self
    }

    /// Set retry count
    pub fn max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    /// Add custom header
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }
}

/// Archiver Appliance client using the lightweight ureq agent
pub struct ArchiverClient {
    config: ArchiverConfig,
    agent: ureq::Agent,
    stats: Arc<Mutex<ConnectionStats>>,
}

/// Outcome of one HTTP attempt
enum Attempt {
    Body(String),
    Retryable(ArchiveError),
    Fatal(ArchiveError),
}

impl ArchiverClient {
    /// Create new archiver client
    pub fn new(config: ArchiverConfig) -> Result<Self, ArchiveError> {
        if !config.base_url.starts_with("http://") && !config.base_url.starts_with("https://") {
            return Err(ArchiveError::Config("Base URL must start with http:// or https://".into()));
        }

        let agent = ureq::AgentBuilder::new()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build();

        Ok(Self {
            config,
            agent,
            stats: Arc::new(Mutex::new(ConnectionStats::default())),
        })
    }

    /// Full retrieval URL
    pub fn data_url(&self) -> String {
        format!("{}{}", self.config.base_url, RETRIEVAL_PATH)
    }

    /// Build the request for `pv` over `window`
    fn build_request(&self, pv: &str, window: TimeWindow) -> Result<ureq::Request, ArchiveError> {
        let mut request = self
            .agent
            .get(&self.data_url())
            .query("pv", pv)
            .query("from", &format_timestamp(window.start_ms)?)
            .query("to", &format_timestamp(window.end_ms)?);

        match &self.config.auth {
            AuthMethod::None => {}
            AuthMethod::Bearer(token) => {
                request = request.set("Authorization", &format!("Bearer {}", token));
            }
            AuthMethod::Basic { username, password } => {
                let credentials = base64::engine::general_purpose::STANDARD
                    .encode(format!("{}:{}", username, password));
                request = request.set("Authorization", &format!("Basic {}", credentials));
            }
        }

        for (name, value) in &self.config.headers {
            request = request.set(name, value);
        }

        Ok(request.set("Accept", "application/json"))
    }

    /// Execute request with retry logic, returning the response body
    async fn execute_with_retry(&self, request: ureq::Request) -> Result<String, ArchiveError> {
        let mut last_error = None;

        for attempt in 0..=self.config.max_retries {
            if attempt > 0 {
                let delay = Duration::from_millis(100 * (1 << attempt.min(10)));
                log::warn!("Retrying {} in {:?} (attempt {})", request.url(), delay, attempt);
                self.update_stats(|s| s.retries += 1);
                tokio::time::sleep(delay).await;
            }

            let pending = request.clone();
            let outcome = tokio::task::spawn_blocking(move || call_once(pending))
                .await
                .map_err(|e| ArchiveError::Task(e.to_string()))?;

            match outcome {
                Attempt::Body(body) => {
                    self.update_stats(|s| {
                        s.requests_ok += 1;
                        s.bytes_received += body.len() as u64;
                    });
                    return Ok(body);
                }
                Attempt::Retryable(err) => last_error = Some(err),
                Attempt::Fatal(err) => {
                    self.record_failure(&err);
                    return Err(err);
                }
            }
        }

        // All retries exhausted
        let err = last_error.unwrap_or_else(|| ArchiveError::Request("Unknown error".into()));
        self.record_failure(&err);
        Err(err)
    }

    fn record_failure(&self, err: &ArchiveError) {
        self.update_stats(|s| {
            s.requests_failed += 1;
            s.last_error = Some(err.to_string());
        });
    }

    fn update_stats(&self, f: impl FnOnce(&mut ConnectionStats)) {
        let mut stats = self.stats.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut stats);
    }
}

fn call_once(request: ureq::Request) -> Attempt {
    match request.call() {
        Ok(resp) => match resp.into_string() {
            Ok(body) => Attempt::Body(body),
            Err(e) => Attempt::Retryable(ArchiveError::Request(e.to_string())),
        },
        Err(ureq::Error::Status(code, resp)) => {
            let err = ArchiveError::ServerError {
                status: code,
                message: resp.into_string().unwrap_or_default(),
            };
            // Server error or rate limit - retry
            if code >= 500 || code == 429 {
                Attempt::Retryable(err)
            } else {
                Attempt::Fatal(err)
            }
        }
        Err(ureq::Error::Transport(e)) => Attempt::Retryable(ArchiveError::Request(e.to_string())),
    }
}

/// RFC 3339 UTC rendering used by the retrieval API
pub fn format_timestamp(timestamp_ms: Timestamp) -> Result<String, ArchiveError> {
    let millis = i64::try_from(timestamp_ms)
        .map_err(|_| ArchiveError::Config(format!("timestamp {} out of range", timestamp_ms)))?;
    DateTime::<Utc>::from_timestamp_millis(millis)
        .map(|t| t.to_rfc3339_opts(SecondsFormat::Millis, true))
        .ok_or_else(|| ArchiveError::Config(format!("timestamp {} out of range", timestamp_ms)))
}

#[async_trait::async_trait]
impl ArchiveSource for ArchiverClient {
    async fn fetch(&self, pv: &str, window: TimeWindow) -> Result<Vec<ArchiveRecord>, ArchiveError> {
        let request = self.build_request(pv, window)?;
        log::debug!("GET {}", request.url());

        let body = self.execute_with_retry(request).await?;
        let payloads = parse_response(&body)?;

        let records = payloads
            .iter()
            .find(|p| p.meta.name == pv)
            .or_else(|| payloads.first())
            .map(|p| p.records())
            .unwrap_or_default();

        if records.is_empty() {
            log::warn!("{}: archiver returned no data for the requested window", pv);
        }

        self.update_stats(|s| s.records_returned += records.len() as u64);
        Ok(records)
    }

    fn describe(&self) -> String {
        self.config.base_url.clone()
    }

    fn stats(&self) -> ConnectionStats {
        self.stats.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}
