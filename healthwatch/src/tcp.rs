//! TCP probe
//!

use super::error::ProbeError;
use super::probe::Probe;
use async_trait::async_trait;
use serde::Deserialize;
use tokio::net::TcpStream;
use tokio::time::Duration;
use tracing::debug;

/// Options for the TCP probe
///
/// # Defaults
/// * hostname: `localhost`
/// * timeout: 30 seconds
#[derive(Clone, Debug, Deserialize)]
pub struct TcpProbeOptions {
    #[serde(default = "default_hostname")]
    pub hostname: String,

    pub port: u16,

    #[serde(default = "default_timeout", with = "humantime_serde")]
    pub timeout: Duration,
}

fn default_hostname() -> String {
    "localhost".to_string()
}

fn default_timeout() -> Duration {
    Duration::from_secs(30)
}

impl TcpProbeOptions {
    pub fn new(port: u16) -> TcpProbeOptions {
        TcpProbeOptions {
            hostname: default_hostname(),
            port,
            timeout: default_timeout(),
        }
    }

    pub fn with_hostname<T: AsRef<str>>(mut self, hostname: T) -> Self {
        self.hostname = hostname.as_ref().to_string();
        self
    }

    /// Set the timeout for DNS resolution plus connecting
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// TCP probe
///
/// A check succeeds once a connection is established; the connection is closed
/// again before the check returns.
///
/// # Examples
/// ```rust,no_run
/// use healthwatch::tcp::{TcpProbe, TcpProbeOptions};
/// use healthwatch::Probe;
/// use std::time::Duration;
///
/// #[tokio::main]
/// async fn main() {
///     let probe = TcpProbe::with_options(
///         TcpProbeOptions::new(5432)
///             .with_hostname("db.internal")           // optional
///             .with_timeout(Duration::from_secs(2)),  // optional
///     );
///     let _ = probe.check().await;
/// }
/// ```
#[derive(Clone, Debug)]
pub struct TcpProbe {
    options: TcpProbeOptions,
}

impl TcpProbe {
    pub fn new<T: AsRef<str>>(hostname: T, port: u16) -> TcpProbe {
        TcpProbe::with_options(TcpProbeOptions::new(port).with_hostname(hostname))
    }

    pub fn with_options(options: TcpProbeOptions) -> TcpProbe {
        TcpProbe { options }
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.options.hostname, self.options.port)
    }

    pub fn options(&self) -> &TcpProbeOptions {
        &self.options
    }
}

#[async_trait]
impl Probe for TcpProbe {
    async fn check(&self) -> Result<(), ProbeError> {
        let host = self.options.hostname.as_str();
        let port = self.options.port;

        debug!("tcp probe connecting to {}", self.address());

        match tokio::time::timeout(self.options.timeout, TcpStream::connect((host, port))).await {
            Ok(Ok(stream)) => {
                drop(stream);
                debug!("tcp probe to {} succeeded", self.address());
                Ok(())
            }
            Ok(Err(source)) => Err(ProbeError::Connect {
                host: host.to_string(),
                port,
                source,
            }),
            Err(_) => Err(ProbeError::ConnectTimeout {
                host: host.to_string(),
                port,
                timeout: self.options.timeout,
            }),
        }
    }
}
