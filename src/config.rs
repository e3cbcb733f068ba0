use anyhow::{Context, bail};
use std::env;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_GATE_BASE_URL: &str = "https://api.gateio.ws/api/v4";

/// Gate listings run to several megabytes, never accept less than this.
pub const MIN_BODY_BYTES: usize = 10 * 1024 * 1024;

/// What a refresh does when the exchange answers with an empty listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmptyResponsePolicy {
    /// Leave the previous snapshot in place.
    Keep,
    /// Replace the snapshot with the empty listing.
    Clear,
}

impl FromStr for EmptyResponsePolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "keep" => Ok(Self::Keep),
            "clear" => Ok(Self::Clear),
            other => bail!("unknown empty response policy `{other}` (expected keep or clear)"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => bail!("unknown log format `{other}` (expected text or json)"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub api_port: u16,
    pub gate_base_url: String,
    pub http_timeout: Duration,
    pub max_body_bytes: usize,
    pub empty_policy: EmptyResponsePolicy,
    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_port: 3000,
            gate_base_url: DEFAULT_GATE_BASE_URL.to_string(),
            http_timeout: Duration::from_secs(30),
            max_body_bytes: 16 * 1024 * 1024,
            empty_policy: EmptyResponsePolicy::Keep,
            log_format: LogFormat::Text,
        }
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key lookup; unset keys fall back to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let defaults = Self::default();

        let api_port = match lookup("API_PORT") {
            Some(v) => v
                .trim()
                .parse::<u16>()
                .context("API_PORT must be a valid port number (1-65535)")?,
            None => defaults.api_port,
        };

        let gate_base_url = lookup("GATE_BASE_URL")
            .map(|v| v.trim().trim_end_matches('/').to_string())
            .unwrap_or(defaults.gate_base_url);

        let http_timeout = match lookup("HTTP_TIMEOUT_SECS") {
            Some(v) => Duration::from_secs(
                v.trim()
                    .parse::<u64>()
                    .context("HTTP_TIMEOUT_SECS must be a whole number of seconds")?,
            ),
            None => defaults.http_timeout,
        };

        let max_body_bytes = match lookup("MAX_BODY_BYTES") {
            Some(v) => v
                .trim()
                .parse::<usize>()
                .context("MAX_BODY_BYTES must be a byte count")?,
            None => defaults.max_body_bytes,
        };
        if max_body_bytes < MIN_BODY_BYTES {
            bail!("MAX_BODY_BYTES must be at least {MIN_BODY_BYTES}, got {max_body_bytes}");
        }

        let empty_policy = match lookup("EMPTY_RESPONSE_POLICY") {
            Some(v) => v.parse()?,
            None => defaults.empty_policy,
        };

        let log_format = match lookup("LOG_FORMAT") {
            Some(v) => v.parse()?,
            None => defaults.log_format,
        };

        Ok(Self {
            api_port,
            gate_base_url,
            http_timeout,
            max_body_bytes,
            empty_policy,
            log_format,
        })
    }
}
