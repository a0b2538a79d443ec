//! Probe and watcher configuration loaded from YAML.
//!
//! ```yaml
//! watcher:
//!   recheck_interval: 500ms
//!   recheck_limit: 30
//! probe:
//!   type: http
//!   url: http://localhost:8080/health
//!   method: GET
//!   headers:
//!     - [Accept, application/json]
//! ```

use super::http::{HttpProbe, HttpProbeOptions};
use super::probe::Probe;
use super::tcp::{TcpProbe, TcpProbeOptions};
use super::watcher::{DEFAULT_RECHECK_INTERVAL, DEFAULT_RECHECK_LIMIT};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::time::Duration;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config")]
    Parse(#[from] serde_yaml::Error),
}

/// Retry policy of a [`Watcher`](crate::watcher::Watcher)
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct WatcherPolicy {
    #[serde(with = "humantime_serde")]
    pub recheck_interval: Duration,
    pub recheck_limit: usize,
}

impl Default for WatcherPolicy {
    fn default() -> Self {
        WatcherPolicy {
            recheck_interval: DEFAULT_RECHECK_INTERVAL,
            recheck_limit: DEFAULT_RECHECK_LIMIT,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ProbeConfig {
    Http(HttpProbeOptions),
    Tcp(TcpProbeOptions),
}

impl ProbeConfig {
    pub fn into_probe(self) -> Box<dyn Probe> {
        match self {
            ProbeConfig::Http(options) => Box::new(HttpProbe::with_options(options)),
            ProbeConfig::Tcp(options) => Box::new(TcpProbe::with_options(options)),
        }
    }

    /// Human readable target, e.g. for log lines
    pub fn target(&self) -> String {
        match self {
            ProbeConfig::Http(options) => options.url.clone(),
            ProbeConfig::Tcp(options) => format!("{}:{}", options.hostname, options.port),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub watcher: WatcherPolicy,
    pub probe: ProbeConfig,
}

impl Config {
    pub fn from_yaml_str(yaml: &str) -> Result<Config, ConfigError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Config::from_yaml_str(&yaml)
    }
}


#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn http_with_defaults() {
        let config = Config::from_yaml_str(
            r#"
probe:
  type: http
  url: http://localhost:8080/health
"#,
        )
        .unwrap();

        assert_eq!(config.watcher, WatcherPolicy::default());
        match config.probe {
            ProbeConfig::Http(options) => {
                assert_eq!(options.url, "http://localhost:8080/health");
                assert_eq!(options.method, "HEAD");
                assert_eq!(options.expected_status, 200);
                assert_eq!(options.timeout, Duration::from_secs(30));
                assert!(options.credentials.is_none());
                assert!(options.headers.is_empty());
                assert!(options.client.is_none());
            }
            probe => panic!("unexpected probe: {:?}", probe),
        }
    }

    #[test]
    fn http_with_options() {
        let config = Config::from_yaml_str(
            r#"
watcher:
  recheck_interval: 250ms
  recheck_limit: 3
probe:
  type: http
  url: http://localhost:8080/healthy
  method: POST
  expected_status: 204
  timeout: 2s
  credentials:
    username: trillian
    password: tricia123
  headers:
    - [Content-Type, nothing]
    - [X-Trace, a]
    - [X-Trace, b]
"#,
        )
        .unwrap();

        assert_eq!(config.watcher.recheck_interval, Duration::from_millis(250));
        assert_eq!(config.watcher.recheck_limit, 3);
        match config.probe {
            ProbeConfig::Http(options) => {
                assert_eq!(options.method, "POST");
                assert_eq!(options.expected_status, 204);
                assert_eq!(options.timeout, Duration::from_secs(2));
                assert_eq!(options.credentials.unwrap().username, "trillian");
                assert_eq!(options.headers.len(), 3);
                assert_eq!(options.headers[2], ("X-Trace".to_string(), "b".to_string()));
            }
            probe => panic!("unexpected probe: {:?}", probe),
        }
    }

    #[test]
    fn tcp() {
        let config = Config::from_yaml_str(
            r#"
watcher:
  recheck_limit: 10
probe:
  type: tcp
  port: 5432
"#,
        )
        .unwrap();

        assert_eq!(config.watcher.recheck_limit, 10);
        assert_eq!(config.watcher.recheck_interval, Duration::from_secs(1));
        assert_eq!(config.probe.target(), "localhost:5432");
        match config.probe {
            ProbeConfig::Tcp(options) => assert_eq!(options.timeout, Duration::from_secs(30)),
            probe => panic!("unexpected probe: {:?}", probe),
        }
    }

    #[test]
    fn missing_port() {
        let err = Config::from_yaml_str("probe:\n  type: tcp\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn unknown_probe_type() {
        assert!(Config::from_yaml_str("probe:\n  type: udp\n  port: 53\n").is_err());
    }

    #[test]
    fn missing_file() {
        let err = Config::from_path("/definitely/not/here.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
        assert!(err.to_string().contains("/definitely/not/here.yaml"));
    }
}
