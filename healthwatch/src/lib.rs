//! # Healthwatch
//! Wait until an HTTP or TCP dependency becomes healthy.
//!
//! # Features
//! * TCP probe (connect and close)
//! * HTTP probe
//!     * any method, default `HEAD`
//!     * expected status code, basic auth, extra headers
//!     * default client with timeout or a custom `reqwest::Client`
//! * Closures as probes
//! * Watcher with fixed recheck interval, failure limit and result listener
//! * Cancellable waits
//! * YAML configuration
//!
//! # Examples
//! ## Wait for a TCP port
//! ```rust,no_run
//! use healthwatch::tcp::TcpProbe;
//! use healthwatch::Watcher;
//!
//! #[tokio::main]
//! async fn main() {
//!     let watcher = Watcher::new();
//!     let probe = TcpProbe::new("localhost", 5432);
//!
//!     if let Err(err) = watcher.wait_until_healthy(&probe).await {
//!         eprintln!("database did not come up: {}", err);
//!     }
//! }
//! ```
//!
//! ## Wait for an HTTP endpoint
//! ```rust,no_run
//! use healthwatch::http::HttpProbe;
//! use healthwatch::Watcher;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() {
//!     let watcher = Watcher::new()
//!         .with_recheck_limit(3)
//!         .with_recheck_interval(Duration::from_millis(10))
//!         .with_result_listener(|counter, err| println!("{} \t ❌\t {}", counter, err));
//!
//!     let probe = HttpProbe::new("http://localhost:8080/health");
//!     let err = watcher.wait_until_healthy(&probe).await.unwrap_err();
//!     assert!(err.is_limit_reached());
//! }
//! ```
//!
//! ## Any closure is a probe
//! ```rust
//! use healthwatch::{probe_fn, ProbeError, Watcher};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() {
//!     let watcher = Watcher::new().with_recheck_interval(Duration::from_millis(1));
//!     let probe = probe_fn(|| async { Ok::<(), ProbeError>(()) });
//!     assert!(watcher.wait_until_healthy(&probe).await.is_ok());
//! }
//! ```
//!

mod state;

pub mod config;
pub mod error;
pub mod http;
pub mod probe;
pub mod tcp;
pub mod watcher;

pub use error::{ProbeError, WatchError};
pub use probe::{probe_fn, FnProbe, Probe};
pub use watcher::{ResultListener, Watcher};
