//! Runtime configuration from environment variables.
//!
//! Every setting has a default; an unparsable value is logged and replaced by
//! its default rather than aborting startup.

use std::fmt::Display;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use lineup_events::DEFAULT_SUBSCRIBER_CAPACITY;
use lineup_observability::LogFormat;

pub const BIND_ADDR: &str = "LINEUP_BIND_ADDR";
pub const SUBSCRIBER_CAPACITY: &str = "LINEUP_SUBSCRIBER_CAPACITY";
pub const SSE_RETRY_MS: &str = "LINEUP_SSE_RETRY_MS";
pub const SSE_KEEP_ALIVE_SECS: &str = "LINEUP_SSE_KEEP_ALIVE_SECS";
pub const LOG_FORMAT: &str = "LINEUP_LOG_FORMAT";

const DEFAULT_BIND_ADDR: SocketAddr =
    SocketAddr::new(std::net::IpAddr::V4(std::net::Ipv4Addr::UNSPECIFIED), 8080);
const DEFAULT_SSE_RETRY: Duration = Duration::from_millis(5_000);
const DEFAULT_SSE_KEEP_ALIVE: Duration = Duration::from_secs(15);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub bind_addr: SocketAddr,
    /// Per-viewer bus channel capacity (at least 1).
    pub subscriber_capacity: usize,
    /// Reconnect delay suggested to SSE clients.
    pub sse_retry: Duration,
    pub sse_keep_alive: Duration,
    pub log_format: LogFormat,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR,
            subscriber_capacity: DEFAULT_SUBSCRIBER_CAPACITY,
            sse_retry: DEFAULT_SSE_RETRY,
            sse_keep_alive: DEFAULT_SSE_KEEP_ALIVE,
            log_format: LogFormat::default(),
        }
    }
}

impl Settings {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from any key/value source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            bind_addr: setting(&lookup, BIND_ADDR, defaults.bind_addr),
            subscriber_capacity: setting(&lookup, SUBSCRIBER_CAPACITY, defaults.subscriber_capacity)
                .max(1),
            sse_retry: Duration::from_millis(setting(
                &lookup,
                SSE_RETRY_MS,
                defaults.sse_retry.as_millis() as u64,
            )),
            sse_keep_alive: Duration::from_secs(setting(
                &lookup,
                SSE_KEEP_ALIVE_SECS,
                defaults.sse_keep_alive.as_secs(),
            )),
            log_format: setting(&lookup, LOG_FORMAT, defaults.log_format),
        }
    }
}

/// Log format alone, read before tracing is installed.
pub fn log_format_from_env() -> LogFormat {
    std::env::var(LOG_FORMAT)
        .ok()
        .and_then(|raw| raw.parse().ok())
        .unwrap_or_default()
}

fn setting<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T
where
    T: FromStr + Display,
    T::Err: Display,
{
    let Some(raw) = lookup(key) else {
        return default;
    };
    match raw.trim().parse() {
        Ok(value) => value,
        Err(err) => {
            tracing::warn!(key, value = %raw, error = %err, %default, "invalid setting; using default");
            default
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings(pairs: &[(&str, &str)]) -> Settings {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let s = settings(&[]);
        assert_eq!(s, Settings::default());
        assert_eq!(s.bind_addr.to_string(), "0.0.0.0:8080");
        assert_eq!(s.subscriber_capacity, 1);
        assert_eq!(s.sse_retry, Duration::from_millis(5_000));
        assert_eq!(s.log_format, LogFormat::Json);
    }

    #[test]
    fn reads_every_setting() {
        let s = settings(&[
            (BIND_ADDR, "127.0.0.1:9000"),
            (SUBSCRIBER_CAPACITY, "4"),
            (SSE_RETRY_MS, "250"),
            (SSE_KEEP_ALIVE_SECS, "3"),
            (LOG_FORMAT, "pretty"),
        ]);
        assert_eq!(s.bind_addr.to_string(), "127.0.0.1:9000");
        assert_eq!(s.subscriber_capacity, 4);
        assert_eq!(s.sse_retry, Duration::from_millis(250));
        assert_eq!(s.sse_keep_alive, Duration::from_secs(3));
        assert_eq!(s.log_format, LogFormat::Pretty);
    }

    #[test]
    fn invalid_values_fall_back_to_defaults() {
        let s = settings(&[
            (BIND_ADDR, "not an address"),
            (SSE_RETRY_MS, "-5"),
            (LOG_FORMAT, "xml"),
        ]);
        assert_eq!(s.bind_addr, DEFAULT_BIND_ADDR);
        assert_eq!(s.sse_retry, DEFAULT_SSE_RETRY);
        assert_eq!(s.log_format, LogFormat::Json);
    }

    #[test]
    fn capacity_is_at_least_one() {
        assert_eq!(settings(&[(SUBSCRIBER_CAPACITY, "0")]).subscriber_capacity, 1);
    }
}
