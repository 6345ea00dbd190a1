//! Retry primitive with exponential backoff and jitter
//!
//! Every remote interaction with the vendor goes through [`with_retry`]. The
//! default predicate retries errors that classify as transient network
//! failures; call sites that know better (login, purchase) pass their own.

pub mod classifier;
pub mod strategy;

pub use classifier::{ErrorClass, PermanentError, RetryClassifiable, RetryableError, classify_message};
pub use strategy::{RetryConfig, RetryPredicate, backoff_delay, with_retry};
