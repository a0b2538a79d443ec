//! Watcher blocks until a probe becomes healthy or a retry budget is used up.

use super::config::WatcherPolicy;
use super::error::{ProbeError, WatchError};
use super::probe::Probe;
use super::state::WaitState;
use std::fmt;
use tokio::time::{Duration, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

pub(crate) const DEFAULT_RECHECK_LIMIT: usize = 120;
pub(crate) const DEFAULT_RECHECK_INTERVAL: Duration = Duration::from_secs(1);

/// Called after every failed check with the 1-based failure count and the
/// error of that check. Useful to show progress to a user or for logging.
pub type ResultListener = Box<dyn Fn(usize, &ProbeError) + Send + Sync>;

/// Watcher polls a [`Probe`] at a fixed interval until it succeeds.
///
/// A watcher holds only its policy, so it can be reused for any number of
/// waits, also concurrently.
///
/// # Examples
/// ```rust,no_run
/// use healthwatch::tcp::TcpProbe;
/// use healthwatch::Watcher;
/// use std::time::Duration;
///
/// #[tokio::main]
/// async fn main() {
///     let watcher = Watcher::new()
///         .with_recheck_limit(30)                                // optional
///         .with_recheck_interval(Duration::from_millis(500))     // optional
///         .with_result_listener(|counter, err| {                 // optional
///             eprintln!("check {} failed: {}", counter, err);
///         });
///
///     watcher
///         .wait_until_healthy(&TcpProbe::new("localhost", 5432))
///         .await
///         .unwrap();
/// }
/// ```
pub struct Watcher {
    recheck_limit: usize,
    recheck_interval: Duration,
    result_listener: ResultListener,
}

impl Watcher {
    /// Create a watcher with the defaults
    ///
    /// # Default
    /// * recheck limit: 120 failed checks
    /// * recheck interval: 1 second
    /// * result listener: does nothing
    pub fn new() -> Watcher {
        Watcher {
            recheck_limit: DEFAULT_RECHECK_LIMIT,
            recheck_interval: DEFAULT_RECHECK_INTERVAL,
            result_listener: Box::new(|_, _| {}),
        }
    }

    pub fn from_policy(policy: &WatcherPolicy) -> Watcher {
        Watcher::new()
            .with_recheck_limit(policy.recheck_limit)
            .with_recheck_interval(policy.recheck_interval)
    }

    /// Set how many failed checks are tolerated before giving up
    ///
    /// With a limit of 0 the first failure already ends the wait.
    pub fn with_recheck_limit(mut self, limit: usize) -> Self {
        self.recheck_limit = limit;
        self
    }

    /// Set the delay between two checks
    ///
    /// The first check also happens one interval after the wait starts. A zero
    /// interval makes every wait fail with [`WatchError::InvalidInterval`].
    pub fn with_recheck_interval(mut self, interval: Duration) -> Self {
        self.recheck_interval = interval;
        self
    }

    pub fn with_result_listener<F>(mut self, listener: F) -> Self
    where
        F: Fn(usize, &ProbeError) + Send + Sync + 'static,
    {
        self.result_listener = Box::new(listener);
        self
    }

    pub fn recheck_limit(&self) -> usize {
        self.recheck_limit
    }

    pub fn recheck_interval(&self) -> Duration {
        self.recheck_interval
    }

    /// Wait until `probe` returns no error
    ///
    /// The probe is checked once per interval. Returns `Ok(())` on the first
    /// successful check and [`WatchError::LimitReached`] once `recheck_limit`
    /// checks have failed. The result listener sees every failure in order.
    pub async fn wait_until_healthy<P>(&self, probe: &P) -> Result<(), WatchError>
    where
        P: Probe + ?Sized,
    {
        self.watch(probe, None).await
    }

    /// Like [`Watcher::wait_until_healthy`], but gives up with
    /// [`WatchError::Cancelled`] as soon as `token` is cancelled, also while a
    /// check is still running.
    pub async fn wait_until_healthy_or_cancelled<P>(
        &self,
        probe: &P,
        token: &CancellationToken,
    ) -> Result<(), WatchError>
    where
        P: Probe + ?Sized,
    {
        self.watch(probe, Some(token)).await
    }

    async fn watch<P>(&self, probe: &P, token: Option<&CancellationToken>) -> Result<(), WatchError>
    where
        P: Probe + ?Sized,
    {
        if self.recheck_interval.is_zero() {
            return Err(WatchError::InvalidInterval);
        }

        let mut ticker =
            tokio::time::interval_at(Instant::now() + self.recheck_interval, self.recheck_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut state = WaitState::new(self.recheck_limit);

        loop {
            tokio::select! {
                biased;
                _ = cancelled(token) => return Err(state.into_cancelled_error()),
                _ = ticker.tick() => {}
            }

            trace!("check {} starting", state.failures() + 1);

            let result = tokio::select! {
                biased;
                _ = cancelled(token) => return Err(state.into_cancelled_error()),
                result = probe.check() => result,
            };

            match result {
                Ok(()) => {
                    debug!("healthy after {} failed checks", state.failures());
                    return Ok(());
                }
                Err(err) => {
                    let counter = state.report_failure();

                    // call listener on error
                    (self.result_listener)(counter, &err);

                    if state.is_exhausted() {
                        debug!("giving up after {} failed checks: {}", counter, err);
                        return Err(state.into_limit_error(err));
                    }
                }
            }
        }
    }
}

impl Default for Watcher {
    fn default() -> Self {
        Watcher::new()
    }
}

impl fmt::Debug for Watcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Watcher")
            .field("recheck_limit", &self.recheck_limit)
            .field("recheck_interval", &self.recheck_interval)
            .finish_non_exhaustive()
    }
}

async fn cancelled(token: Option<&CancellationToken>) {
    match token {
        Some(token) => token.cancelled().await,
        None => futures::future::pending().await,
    }
}
