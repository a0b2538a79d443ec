//! Error types for probes and watchers

use std::time::Duration;
use thiserror::Error;

/// Why a single probe attempt failed
///
/// Failures fall into two groups, see [`ProbeError::is_transport`] and
/// [`ProbeError::is_semantic`]. A [`Watcher`](crate::watcher::Watcher) retries both
/// the same way.
#[derive(Error, Debug)]
pub enum ProbeError {
    /// The configured method, URL or headers could not form a request
    #[error("failed to create request for {method}: {url}: {reason}")]
    InvalidRequest {
        method: String,
        url: String,
        reason: String,
    },

    /// The default HTTP client could not be built
    #[error("failed to build http client for {url}: {source}")]
    Client {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The request could not be completed (DNS, refused, timeout, TLS, ...)
    #[error("request for {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// A response arrived but its status code was not the expected one
    #[error("request for {url} returned {actual} instead of expected {expected}")]
    UnexpectedStatus {
        url: String,
        actual: u16,
        expected: u16,
    },

    /// TCP connect failed
    #[error("tcp connection to {host}:{port} failed: {source}")]
    Connect {
        host: String,
        port: u16,
        #[source]
        source: std::io::Error,
    },

    /// TCP connect did not finish in time
    #[error("tcp connection to {host}:{port} timed out after {timeout:?}")]
    ConnectTimeout {
        host: String,
        port: u16,
        timeout: Duration,
    },

    /// Failure reported by a caller-defined probe
    #[error("{0}")]
    Other(String),
}

impl ProbeError {
    /// Build an [`ProbeError::Other`] from any message.
    pub fn other<T: Into<String>>(message: T) -> ProbeError {
        ProbeError::Other(message.into())
    }

    /// The target could not be reached or the exchange broke off.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            ProbeError::Request { .. }
                | ProbeError::Connect { .. }
                | ProbeError::ConnectTimeout { .. }
        )
    }

    /// The target answered, but not the way it was expected to.
    pub fn is_semantic(&self) -> bool {
        matches!(self, ProbeError::UnexpectedStatus { .. })
    }
}

/// Terminal outcome of a failed wait
#[derive(Error, Debug)]
pub enum WatchError {
    /// `recheck_limit` failed attempts were observed
    #[error("limit reached after {limit} failed checks waiting for checker to become healthy")]
    LimitReached {
        limit: usize,
        #[source]
        source: ProbeError,
    },

    /// The wait was cancelled before the probe succeeded
    #[error("wait for checker to become healthy cancelled after {failures} failed checks")]
    Cancelled { failures: usize },

    /// A zero interval would turn the wait into a busy loop
    #[error("recheck interval must be greater than zero")]
    InvalidInterval,
}

impl WatchError {
    pub fn is_limit_reached(&self) -> bool {
        matches!(self, WatchError::LimitReached { .. })
    }

    /// The probe error that exhausted the budget, if any.
    pub fn last_probe_error(&self) -> Option<&ProbeError> {
        match self {
            WatchError::LimitReached { source, .. } => Some(source),
            _ => None,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn unexpected_status_names_both_codes() {
        let err = ProbeError::UnexpectedStatus {
            url: "http://localhost/health".to_string(),
            actual: 204,
            expected: 200,
        };
        assert_eq!(
            err.to_string(),
            "request for http://localhost/health returned 204 instead of expected 200"
        );
        assert!(err.is_semantic());
        assert!(!err.is_transport());
    }

    #[test]
    fn connect_is_transport() {
        let err = ProbeError::Connect {
            host: "localhost".to_string(),
            port: 8080,
            source: std::io::Error::from(std::io::ErrorKind::ConnectionRefused),
        };
        assert_eq!(
            err.to_string(),
            format!(
                "tcp connection to localhost:8080 failed: {}",
                std::io::Error::from(std::io::ErrorKind::ConnectionRefused)
            )
        );
        assert!(err.is_transport());
        assert!(!err.is_semantic());
    }

    #[test]
    fn other_is_neither() {
        let err = ProbeError::other("boom");
        assert_eq!(err.to_string(), "boom");
        assert!(!err.is_transport());
        assert!(!err.is_semantic());
    }

    #[test]
    fn limit_reached_keeps_last_error() {
        let err = WatchError::LimitReached {
            limit: 3,
            source: ProbeError::other("still down"),
        };
        assert!(err.is_limit_reached());
        assert_eq!(
            err.to_string(),
            "limit reached after 3 failed checks waiting for checker to become healthy"
        );
        assert_eq!(err.last_probe_error().unwrap().to_string(), "still down");
        assert!(std::error::Error::source(&err).is_some());
    }
}
