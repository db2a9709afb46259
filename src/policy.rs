use crate::config::ConfigUpdate;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

type Predicate<E> = Arc<dyn Fn(&E) -> bool + Send + Sync>;
type Observer<E> = Arc<dyn Fn(u32, &E, Duration) + Send + Sync>;

/// A per-call override of the engine's default schedule.
///
/// Only the fields set on the policy replace the defaults; the rest are read from the engine
/// at the time of the call. A policy can also classify failures through [`retry_if`] and
/// watch the retry loop through [`on_retry`].
///
/// [`retry_if`]: RetryPolicy::retry_if
/// [`on_retry`]: RetryPolicy::on_retry
pub struct RetryPolicy<E> {
    pub(crate) update: ConfigUpdate,
    pub(crate) predicate: Option<Predicate<E>>,
    pub(crate) observer: Option<Observer<E>>,
}

impl<E> RetryPolicy<E> {
    /// Create an empty policy, which behaves exactly like the engine's defaults.
    pub fn new() -> Self {
        Self {
            update: ConfigUpdate::default(),
            predicate: None,
            observer: None,
        }
    }

    pub fn max_attempts(mut self, max_attempts: u32) -> Self {
        self.update = self.update.max_attempts(max_attempts);
        self
    }

    pub fn initial_delay(mut self, delay: Duration) -> Self {
        self.update = self.update.initial_delay(delay);
        self
    }

    pub fn max_delay(mut self, delay: Duration) -> Self {
        self.update = self.update.max_delay(delay);
        self
    }

    pub fn backoff_factor(mut self, factor: f64) -> Self {
        self.update = self.update.backoff_factor(factor);
        self
    }

    /// Only retry failures for which `predicate` returns `true`. Any other failure ends the
    /// call immediately, whatever attempts remain.
    pub fn retry_if<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&E) -> bool + Send + Sync + 'static,
    {
        self.predicate = Some(Arc::new(predicate));
        self
    }

    /// Called with the failed attempt number, its failure and the upcoming delay, right
    /// before the engine waits.
    pub fn on_retry<F>(mut self, observer: F) -> Self
    where
        F: Fn(u32, &E, Duration) + Send + Sync + 'static,
    {
        self.observer = Some(Arc::new(observer));
        self
    }

    pub(crate) fn is_retryable(&self, failure: &E) -> bool {
        self.predicate.as_ref().map_or(true, |p| p(failure))
    }

    pub(crate) fn notify(&self, attempt: u32, failure: &E, delay: Duration) {
        if let Some(observer) = self.observer.as_ref() {
            observer(attempt, failure, delay);
        }
    }
}

impl<E> Default for RetryPolicy<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> Clone for RetryPolicy<E> {
    fn clone(&self) -> Self {
        Self {
            update: self.update,
            predicate: self.predicate.clone(),
            observer: self.observer.clone(),
        }
    }
}

impl<E> From<ConfigUpdate> for RetryPolicy<E> {
    fn from(update: ConfigUpdate) -> Self {
        Self {
            update,
            ..Self::new()
        }
    }
}

impl<E> fmt::Debug for RetryPolicy<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("update", &self.update)
            .field("predicate", &self.predicate.is_some())
            .field("observer", &self.observer.is_some())
            .finish()
    }
}
