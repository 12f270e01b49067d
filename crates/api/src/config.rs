use std::time::Duration;

use dynforms_core::validation::coercion::CoercionSettings;
use dynforms_core::validation::external::{ExternalCheckConfig, ExternalCheckMode};

/// Server configuration loaded from environment variables.
///
/// All fields have defaults suitable for local development.
/// In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Upper bound on post-shutdown cleanup in seconds (default: `30`).
    pub shutdown_timeout_secs: u64,
    /// External validation/evaluation service settings.
    pub external_checks: ExternalCheckConfig,
    /// Currency and phone number defaults used during coercion.
    pub coercion: CoercionSettings,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                               | Default                 |
    /// |---------------------------------------|-------------------------|
    /// | `HOST`                                | `0.0.0.0`               |
    /// | `PORT`                                | `3000`                  |
    /// | `CORS_ORIGINS`                        | `http://localhost:5173` |
    /// | `REQUEST_TIMEOUT_SECS`                | `30`                    |
    /// | `SHUTDOWN_TIMEOUT_SECS`               | `30`                    |
    /// | `EXTERNAL_CHECKS_MODE`                | `live`                  |
    /// | `EXTERNAL_CHECK_TIMEOUT_SECS`         | `10`                    |
    /// | `EXTERNAL_CHECK_CONNECT_TIMEOUT_SECS` | `5`                     |
    /// | `DEFAULT_CURRENCY`                    | `KES`                   |
    /// | `DEFAULT_CALLING_CODE`                | `254` (empty disables)  |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let shutdown_timeout_secs: u64 = std::env::var("SHUTDOWN_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("SHUTDOWN_TIMEOUT_SECS must be a valid u64");

        let mode: ExternalCheckMode = std::env::var("EXTERNAL_CHECKS_MODE")
            .unwrap_or_else(|_| "live".into())
            .parse()
            .unwrap_or_else(|e| panic!("EXTERNAL_CHECKS_MODE: {e}"));

        let timeout_secs: u64 = std::env::var("EXTERNAL_CHECK_TIMEOUT_SECS")
            .unwrap_or_else(|_| "10".into())
            .parse()
            .expect("EXTERNAL_CHECK_TIMEOUT_SECS must be a valid u64");

        let connect_timeout_secs: u64 = std::env::var("EXTERNAL_CHECK_CONNECT_TIMEOUT_SECS")
            .unwrap_or_else(|_| "5".into())
            .parse()
            .expect("EXTERNAL_CHECK_CONNECT_TIMEOUT_SECS must be a valid u64");

        let default_currency = std::env::var("DEFAULT_CURRENCY")
            .unwrap_or_else(|_| "KES".into())
            .trim()
            .to_ascii_uppercase();
        assert!(
            dynforms_core::reference::find_currency(&default_currency).is_some(),
            "DEFAULT_CURRENCY must be an ISO 4217 code, got '{default_currency}'"
        );

        let default_calling_code = match std::env::var("DEFAULT_CALLING_CODE") {
            Ok(code) => parse_calling_code(&code),
            Err(_) => Some("254".to_string()),
        };

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            shutdown_timeout_secs,
            external_checks: ExternalCheckConfig {
                mode,
                timeout: Duration::from_secs(timeout_secs),
                connect_timeout: Duration::from_secs(connect_timeout_secs),
            },
            coercion: CoercionSettings {
                default_currency,
                default_calling_code,
            },
        }
    }
}

/// `"+254"`, `"254"` and `" 254 "` all mean 254; an empty value disables
/// trunk-prefix expansion.
fn parse_calling_code(raw: &str) -> Option<String> {
    let code = raw.trim().trim_start_matches('+');
    if code.is_empty() {
        return None;
    }
    assert!(
        code.len() <= 3 && code.chars().all(|c| c.is_ascii_digit()),
        "DEFAULT_CALLING_CODE must be 1-3 digits, got '{raw}'"
    );
    Some(code.to_string())
}
