//! External validation and evaluation services.
//!
//! [`HttpCheckClient`] issues `GET {base_url}/{value}` with bounded connect
//! and request timeouts. A 200 response accepts the value; anything else is
//! reported as a distinct [`ExternalCheckError`]. There is no retry: a
//! submission waits on at most one round trip per external rule.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{StatusCode, Url};

/// Default overall timeout for one external check.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default connect timeout for one external check.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Outcome of an external check that did not accept the value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExternalCheckError {
    /// The service answered with a non-200 status.
    #[error("service responded with {status} {reason}")]
    Rejected { status: u16, reason: String },

    /// No response within the configured timeout.
    #[error("request timed out")]
    Timeout,

    /// Any other transport failure (DNS, refused connection, bad URL).
    #[error("transport error: {0}")]
    Transport(String),

    /// The value cannot be carried as a single path segment. URL
    /// normalisation would drop it and send the request to the base URL.
    #[error("value '{0}' cannot be sent as a path segment")]
    UnsendableValue(String),
}

impl From<reqwest::Error> for ExternalCheckError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ExternalCheckError::Timeout
        } else {
            ExternalCheckError::Transport(err.to_string())
        }
    }
}

// ---------------------------------------------------------------------------
// Client trait
// ---------------------------------------------------------------------------

/// Checks a single value against an external service.
#[async_trait]
pub trait ExternalCheckClient: Send + Sync {
    async fn check(&self, base_url: &str, value: &str) -> Result<(), ExternalCheckError>;
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Whether external checks go over the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExternalCheckMode {
    #[default]
    Live,
    /// Every check passes without a request. For local development only.
    Offline,
}

impl ExternalCheckMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Live => "live",
            Self::Offline => "offline",
        }
    }
}

impl FromStr for ExternalCheckMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "live" => Ok(Self::Live),
            "offline" => Ok(Self::Offline),
            other => Err(format!(
                "unknown external check mode '{other}', expected 'live' or 'offline'"
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalCheckConfig {
    pub mode: ExternalCheckMode,
    pub timeout: Duration,
    pub connect_timeout: Duration,
}

impl Default for ExternalCheckConfig {
    fn default() -> Self {
        Self {
            mode: ExternalCheckMode::Live,
            timeout: DEFAULT_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }
}

/// Build the client selected by `config`.
///
/// Offline mode is logged once here so that it is visible at startup.
pub fn client_from_config(
    config: &ExternalCheckConfig,
) -> Result<Arc<dyn ExternalCheckClient>, ExternalCheckError> {
    match config.mode {
        ExternalCheckMode::Live => Ok(Arc::new(HttpCheckClient::new(
            config.timeout,
            config.connect_timeout,
        )?)),
        ExternalCheckMode::Offline => {
            tracing::warn!("External checks are OFFLINE: every validation_url and evaluation_url rule will pass");
            Ok(Arc::new(OfflineCheckClient))
        }
    }
}

// ---------------------------------------------------------------------------
// HttpCheckClient
// ---------------------------------------------------------------------------

pub struct HttpCheckClient {
    client: reqwest::Client,
}

impl HttpCheckClient {
    pub fn new(timeout: Duration, connect_timeout: Duration) -> Result<Self, ExternalCheckError> {
        // A redirect is a non-200 answer from the service, never a pass.
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(connect_timeout)
            .redirect(reqwest::redirect::Policy::none())
            .build()?;
        Ok(Self { client })
    }
}

/// Append `value` to `base_url` as one percent-encoded path segment.
///
/// Empty, `.` and `..` values are refused: `%2E` is itself a dot segment
/// in the WHATWG URL standard, so there is no encoding that survives.
pub fn check_url(base_url: &str, value: &str) -> Result<Url, ExternalCheckError> {
    if matches!(value, "" | "." | "..") {
        return Err(ExternalCheckError::UnsendableValue(value.to_string()));
    }
    let mut url =
        Url::parse(base_url).map_err(|e| ExternalCheckError::Transport(e.to_string()))?;
    url.path_segments_mut()
        .map_err(|_| ExternalCheckError::Transport(format!("'{base_url}' cannot be a base URL")))?
        .pop_if_empty()
        .push(value);
    Ok(url)
}

#[async_trait]
impl ExternalCheckClient for HttpCheckClient {
    async fn check(&self, base_url: &str, value: &str) -> Result<(), ExternalCheckError> {
        let url = check_url(base_url, value)?;
        let response = self.client.get(url).send().await?;
        let status = response.status();

        if status == StatusCode::OK {
            return Ok(());
        }
        Err(ExternalCheckError::Rejected {
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
        })
    }
}

// ---------------------------------------------------------------------------
// OfflineCheckClient
// ---------------------------------------------------------------------------

/// Accepts every value without contacting any service.
pub struct OfflineCheckClient;

#[async_trait]
impl ExternalCheckClient for OfflineCheckClient {
    async fn check(&self, base_url: &str, _value: &str) -> Result<(), ExternalCheckError> {
        tracing::debug!(url = base_url, "External check skipped (offline mode)");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
