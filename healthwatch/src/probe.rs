use std::sync::Arc;

use async_trait::async_trait;
use futures::Future;

use super::error::ProbeError;

/// One health check attempt against a dependency.
///
/// `check` resolves only once the attempt has definitively succeeded, failed or
/// timed out, and holds no connection open afterwards. Implementations are
/// invoked repeatedly and possibly from several watchers at once, so every call
/// is a fresh, independent attempt.
#[async_trait]
pub trait Probe: Send + Sync {
    async fn check(&self) -> Result<(), ProbeError>;
}

#[async_trait]
impl<P: Probe + ?Sized> Probe for &P {
    async fn check(&self) -> Result<(), ProbeError> {
        (**self).check().await
    }
}

#[async_trait]
impl<P: Probe + ?Sized> Probe for Box<P> {
    async fn check(&self) -> Result<(), ProbeError> {
        (**self).check().await
    }
}

#[async_trait]
impl<P: Probe + ?Sized> Probe for Arc<P> {
    async fn check(&self) -> Result<(), ProbeError> {
        (**self).check().await
    }
}

/// Probe backed by a closure, see [`probe_fn`]
#[derive(Clone)]
pub struct FnProbe<F> {
    f: F,
}

/// Turn a closure returning a future into a [`Probe`]
///
/// # Examples
/// ```rust
/// use healthwatch::{probe_fn, Probe, ProbeError};
///
/// #[tokio::main]
/// async fn main() {
///     let probe = probe_fn(|| async { Err::<(), _>(ProbeError::other("not yet")) });
///     assert!(probe.check().await.is_err());
/// }
/// ```
pub fn probe_fn<F, Fut>(f: F) -> FnProbe<F>
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = Result<(), ProbeError>> + Send,
{
    FnProbe { f }
}

#[async_trait]
impl<F, Fut> Probe for FnProbe<F>
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = Result<(), ProbeError>> + Send,
{
    async fn check(&self) -> Result<(), ProbeError> {
        (self.f)().await
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio_test::{assert_err, assert_ok};

    #[tokio::test]
    async fn closure_is_called_every_check() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let probe = probe_fn(move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        });

        for _ in 0..3 {
            assert_ok!(probe.check().await);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn boxed_and_shared() {
        let boxed: Box<dyn Probe> =
            Box::new(probe_fn(|| async { Err(ProbeError::other("down")) }));
        assert_err!(boxed.check().await);

        let shared = Arc::new(probe_fn(|| async { Ok(()) }));
        let other = shared.clone();
        assert_ok!(shared.check().await);
        assert_ok!((&other).check().await);
    }
}
