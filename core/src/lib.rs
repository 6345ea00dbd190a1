//! Weekly lottery automation core
//!
//! Domain types for Lotto 6/45 and Pension 720+, the retry primitive, the
//! vendor boundary, the purchase-verification protocol, prize ranking and
//! report notifications.
//!
//! Everything that talks to the vendor site lives behind [`vendor::TicketVendor`];
//! this crate never performs HTTP itself.

#![deny(clippy::print_stdout, clippy::print_stderr)]

pub mod config;
pub mod domain;
pub mod error;
pub mod notify;
pub mod purchase;
pub mod retry;
pub mod vendor;
pub mod winning;

pub use error::{LottoError, Result};
pub use purchase::{PurchaseError, PurchaseGuard, PurchaseOutcome, PurchasePolicy};
pub use retry::{RetryConfig, with_retry};
pub use vendor::{Product, TicketVendor};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
