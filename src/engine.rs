use crate::config::{ConfigUpdate, RetryConfig};
use crate::error::Result;
use crate::outcome::RetryOutcome;
use crate::policy::RetryPolicy;
use futures::future::join_all;
use log::{debug, info, warn};
use std::future::Future;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

/// The retry engine.
///
/// `RetryEngine` owns the default [`RetryConfig`] used by every call that does not override
/// it. Clones share the same default, so an engine is usually built once at startup and
/// handed to whatever needs to retry work.
#[derive(Clone, Debug, Default)]
pub struct RetryEngine {
    defaults: Arc<RwLock<RetryConfig>>,
}

impl RetryEngine {
    /// Create a new `RetryEngine` using [`RetryConfig::default`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new `RetryEngine` with a custom default schedule.
    pub fn with_config(config: RetryConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            defaults: Arc::new(RwLock::new(config)),
        })
    }

    /// A snapshot of the current default schedule.
    pub fn config(&self) -> RetryConfig {
        *self.defaults.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replace the supplied fields of the default schedule. Calls already in progress keep
    /// the schedule they started with. An update that would leave the default invalid is
    /// rejected and the default is left as it was.
    pub fn update_default_config(&self, update: ConfigUpdate) -> Result<()> {
        let mut defaults = self
            .defaults
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let merged = update.apply_to(&defaults);
        merged.validate()?;
        info!("Default retry config updated: {:?}", merged);
        *defaults = merged;
        Ok(())
    }

    fn attempts<E>(&self, policy: Option<RetryPolicy<E>>) -> Result<Attempts<E>> {
        let policy = policy.unwrap_or_default();
        let config = policy.update.apply_to(&self.config());
        config.validate()?;
        Ok(Attempts {
            config,
            policy,
            made: 0,
        })
    }

    /// Run `operation` until it succeeds, fails with a failure the policy does not retry, or
    /// runs out of attempts, sleeping between attempts without blocking the executor.
    ///
    /// Failures of the operation never surface as an `Err`; they are reported through the
    /// returned [`RetryOutcome`]. An `Err` is only returned when the resolved policy is
    /// invalid, in which case `operation` is never called.
    pub async fn retry<F, Fut, T, E>(
        &self,
        operation: F,
        policy: Option<RetryPolicy<E>>,
    ) -> Result<RetryOutcome<T, E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = std::result::Result<T, E>>,
    {
        let attempts = self.attempts(policy)?;
        Ok(run(attempts, operation).await)
    }

    /// Blocking counterpart of [`retry`](RetryEngine::retry). The calling thread sleeps
    /// between attempts.
    pub fn retry_sync<F, T, E>(
        &self,
        mut operation: F,
        policy: Option<RetryPolicy<E>>,
    ) -> Result<RetryOutcome<T, E>>
    where
        F: FnMut() -> std::result::Result<T, E>,
    {
        let mut attempts = self.attempts(policy)?;
        loop {
            attempts.start();
            match operation() {
                Ok(value) => return Ok(attempts.succeed(value)),
                Err(failure) => match attempts.fail(&failure) {
                    Some(delay) => std::thread::sleep(delay),
                    None => return Ok(attempts.give_up(failure)),
                },
            }
        }
    }

    /// Retry a batch of operations concurrently. Every operation gets its own attempt
    /// budget and schedule; the outcomes are returned in the order the operations were given.
    pub async fn retry_all<I, F, Fut, T, E>(
        &self,
        operations: I,
        policy: Option<RetryPolicy<E>>,
    ) -> Result<Vec<RetryOutcome<T, E>>>
    where
        I: IntoIterator<Item = F>,
        F: FnMut() -> Fut,
        Fut: Future<Output = std::result::Result<T, E>>,
    {
        let template = self.attempts(policy)?;
        let calls = operations
            .into_iter()
            .map(|operation| run(template.fresh(), operation));
        Ok(join_all(calls).await)
    }
}

async fn run<F, Fut, T, E>(mut attempts: Attempts<E>, mut operation: F) -> RetryOutcome<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = std::result::Result<T, E>>,
{
    loop {
        attempts.start();
        match operation().await {
            Ok(value) => return attempts.succeed(value),
            Err(failure) => match attempts.fail(&failure) {
                Some(delay) => tokio::time::sleep(delay).await,
                None => return attempts.give_up(failure),
            },
        }
    }
}

/// Attempt accounting for a single call, shared by the sync and async loops.
struct Attempts<E> {
    config: RetryConfig,
    policy: RetryPolicy<E>,
    made: u32,
}

impl<E> Attempts<E> {
    fn fresh(&self) -> Self {
        Self {
            config: self.config,
            policy: self.policy.clone(),
            made: 0,
        }
    }

    fn start(&mut self) {
        self.made += 1;
        debug!("Attempt {} of {}", self.made, self.config.max_attempts);
    }

    fn succeed<T>(&self, value: T) -> RetryOutcome<T, E> {
        if self.made > 1 {
            debug!("Succeeded after {} attempts", self.made);
        }
        RetryOutcome::new(Ok(value), self.made)
    }

    /// Decide what follows a failed attempt: `Some(delay)` to wait and try again, `None` to
    /// stop.
    fn fail(&self, failure: &E) -> Option<Duration> {
        if self.made >= self.config.max_attempts {
            warn!("Giving up after {} attempts", self.made);
            return None;
        }
        if !self.policy.is_retryable(failure) {
            warn!(
                "Attempt {} failed with a non-retryable failure, giving up",
                self.made
            );
            return None;
        }
        let delay = self.config.delay_for(self.made);
        warn!(
            "Attempt {} of {} failed, retrying in {:?}",
            self.made, self.config.max_attempts, delay
        );
        self.policy.notify(self.made, failure, delay);
        Some(delay)
    }

    fn give_up<T>(&self, failure: E) -> RetryOutcome<T, E> {
        RetryOutcome::new(Err(failure), self.made)
    }
}
