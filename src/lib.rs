//! reattempt is a small retry engine: it re-runs a fallible operation, synchronous or
//! asynchronous, on an exponential backoff schedule bounded by a maximum delay and a maximum
//! number of attempts, and reports a [`RetryOutcome`] instead of propagating the failure.
//!
//! ```no_run
//! use reattempt::{RetryEngine, RetryPolicy};
//! use std::time::Duration;
//!
//! # async fn run() -> reattempt::Result<()> {
//! let engine = RetryEngine::new();
//! let policy = RetryPolicy::new()
//!     .max_attempts(5)
//!     .initial_delay(Duration::from_millis(200))
//!     .retry_if(|err: &std::io::Error| err.kind() != std::io::ErrorKind::PermissionDenied);
//!
//! let outcome = engine
//!     .retry(|| async { std::fs::read_to_string("favorites.json") }, Some(policy))
//!     .await?;
//! if !outcome.succeeded() {
//!     eprintln!("gave up after {} attempts", outcome.attempts());
//! }
//! # Ok(())
//! # }
//! ```
mod config;
mod engine;
mod error;
#[cfg(feature = "http")]
pub mod http;
mod outcome;
mod policy;

pub use config::{ConfigUpdate, RetryConfig};
pub use engine::RetryEngine;
pub use error::{Error, Result};
pub use outcome::RetryOutcome;
pub use policy::RetryPolicy;
