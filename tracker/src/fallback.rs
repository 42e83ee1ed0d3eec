use futures::future::{BoxFuture, FutureExt};
use providers::ProviderError;
use std::{future::Future, time::Duration};

type Attempt<'a, T> =
    Box<dyn FnOnce() -> BoxFuture<'a, Result<T, ProviderError>> + Send + 'a>;

/// Value produced by the first attempt of a chain that succeeded.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved<T> {
    pub source: &'static str,
    pub value: T,
}

/// Ordered data-source attempts for one logical query. Attempts run one
/// after the other, each bounded by its own timeout; the first success ends
/// the chain and later attempts are never started. Failures are logged and
/// swallowed, a chain where everything failed resolves to `None`.
pub struct FallbackChain<'a, T> {
    label: &'static str,
    default_timeout: Duration,
    attempts: Vec<(&'static str, Duration, Attempt<'a, T>)>,
}

impl<'a, T: Send + 'a> FallbackChain<'a, T> {
    pub fn new(label: &'static str, default_timeout: Duration) -> Self {
        Self {
            label,
            default_timeout,
            attempts: Vec::new(),
        }
    }

    pub fn attempt<F, Fut>(self, name: &'static str, f: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'a,
        Fut: Future<Output = Result<T, ProviderError>> + Send + 'a,
    {
        let timeout = self.default_timeout;
        self.attempt_with_timeout(name, timeout, f)
    }

    pub fn attempt_with_timeout<F, Fut>(
        mut self,
        name: &'static str,
        timeout: Duration,
        f: F,
    ) -> Self
    where
        F: FnOnce() -> Fut + Send + 'a,
        Fut: Future<Output = Result<T, ProviderError>> + Send + 'a,
    {
        self.attempts
            .push((name, timeout, Box::new(move || f().boxed())));
        self
    }

    pub fn len(&self) -> usize {
        self.attempts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attempts.is_empty()
    }

    pub async fn run(self) -> Option<Resolved<T>> {
        for (source, timeout, attempt) in self.attempts {
            let result = match tokio::time::timeout(timeout, attempt()).await {
                Ok(result) => result,
                Err(_) => Err(ProviderError::Timeout(timeout)),
            };

            match result {
                Ok(value) => {
                    log::debug!("{}: resolved by {source}", self.label);
                    return Some(Resolved { source, value });
                }
                Err(e) => log::warn!("{}: {source} failed: {e}", self.label),
            }
        }

        log::warn!("{}: no source succeeded", self.label);
        None
    }
}
