//! Purchase-verification protocol
//!
//! A real purchase is bracketed by two history reads:
//!
//! 1. Before buying, a ticket sold within the window means a previous run
//!    already bought this week's ticket. The run is skipped.
//! 2. The purchase steps run as one unit under the retry primitive. Before
//!    each retry the history is read again, so a purchase that went through
//!    but reported an error is not repeated.
//! 3. After buying, the newest ticket must fall within the window. If it does
//!    not, the outcome is [`PurchaseError::VerificationFailed`] and a human
//!    has to look at the account. That error is never retried.
//!
//! The pre-purchase check fails open: if history cannot be read the purchase
//! goes ahead. The post-purchase check fails closed.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::domain::SaleRecord;
use crate::domain::date::is_within_window;
use crate::error::LottoError;
use crate::retry::{RetryConfig, with_retry};
use crate::vendor::TicketVendor;

/// Default span, in minutes, within which a history entry proves a purchase.
pub const DEFAULT_WINDOW_MINUTES: u32 = 5;

/// Retry settings for one product's purchase steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PurchasePolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for PurchasePolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_secs(2),
            max_delay: Duration::from_secs(15),
        }
    }
}

impl PurchasePolicy {
    /// Retry settings for the purchase steps: everything except errors that
    /// cannot heal (credentials, session, vendor refusal, bad input).
    pub fn action_retry_config(&self) -> RetryConfig<LottoError> {
        RetryConfig::new(self.max_retries, self.base_delay, self.max_delay)
            .with_should_retry(|err: &LottoError| !err.is_permanent())
    }
}

/// Protocol states, logged on every transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PurchaseState {
    CheckingRecent,
    Skipped,
    Purchasing,
    Verifying,
    Confirmed,
    VerificationFailed,
    Failed,
}

impl PurchaseState {
    pub fn as_str(self) -> &'static str {
        match self {
            PurchaseState::CheckingRecent => "checking_recent",
            PurchaseState::Skipped => "skipped",
            PurchaseState::Purchasing => "purchasing",
            PurchaseState::Verifying => "verifying",
            PurchaseState::Confirmed => "confirmed",
            PurchaseState::VerificationFailed => "verification_failed",
            PurchaseState::Failed => "failed",
        }
    }
}

impl fmt::Display for PurchaseState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a protocol run ended successfully.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PurchaseOutcome<T> {
    /// Numbers were selected but nothing was bought
    DryRun,
    /// A ticket within the window already existed
    Skipped(T),
    /// The new purchase shows up in history
    Confirmed(T),
}

impl<T> PurchaseOutcome<T> {
    pub fn ticket(&self) -> Option<&T> {
        match self {
            PurchaseOutcome::DryRun => None,
            PurchaseOutcome::Skipped(ticket) | PurchaseOutcome::Confirmed(ticket) => Some(ticket),
        }
    }

    /// Empty for a dry run, otherwise the single proving ticket.
    pub fn into_tickets(self) -> Vec<T> {
        match self {
            PurchaseOutcome::DryRun => Vec::new(),
            PurchaseOutcome::Skipped(ticket) | PurchaseOutcome::Confirmed(ticket) => vec![ticket],
        }
    }
}

#[derive(Debug, Error)]
pub enum PurchaseError {
    #[error("Dry run failed: {0}")]
    DryRun(#[source] LottoError),

    #[error("Purchase failed: {0}")]
    Action(#[source] LottoError),

    #[error("Purchase could not be verified within {window_minutes} minutes: {detail}")]
    VerificationFailed { window_minutes: u32, detail: String },
}

impl PurchaseError {
    /// Money may have been spent without proof; someone has to check the
    /// account by hand.
    pub fn requires_review(&self) -> bool {
        matches!(self, PurchaseError::VerificationFailed { .. })
    }
}

/// Source of "now" for window comparisons.
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Runs the protocol against one vendor.
pub struct PurchaseGuard<'a, V> {
    vendor: &'a V,
    policy: PurchasePolicy,
    clock: Clock,
}

impl<'a, V: TicketVendor> PurchaseGuard<'a, V> {
    pub fn new(vendor: &'a V) -> Self {
        Self {
            vendor,
            policy: PurchasePolicy::default(),
            clock: Arc::new(Utc::now),
        }
    }

    pub fn with_policy(mut self, policy: PurchasePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_clock<C>(mut self, clock: C) -> Self
    where
        C: Fn() -> DateTime<Utc> + Send + Sync + 'static,
    {
        self.clock = Arc::new(clock);
        self
    }

    /// Buy one ticket, returning it as a single-element list (empty for a
    /// dry run).
    pub async fn purchase(
        &self,
        dry_run: bool,
        window_minutes: u32,
    ) -> Result<Vec<V::Ticket>, PurchaseError> {
        self.run(dry_run, window_minutes)
            .await
            .map(PurchaseOutcome::into_tickets)
    }

    pub async fn run(
        &self,
        dry_run: bool,
        window_minutes: u32,
    ) -> Result<PurchaseOutcome<V::Ticket>, PurchaseError> {
        if dry_run {
            return self.dry_run().await;
        }

        self.enter(PurchaseState::CheckingRecent);
        if let Some(ticket) = self.find_recent(window_minutes).await {
            info!(
                product = %self.vendor.product(),
                round = ticket.round(),
                window_minutes,
                "ticket already purchased within window, skipping"
            );
            self.enter(PurchaseState::Skipped);
            return Ok(PurchaseOutcome::Skipped(ticket));
        }

        self.enter(PurchaseState::Purchasing);
        if let Err(err) = self.purchase_with_recheck(window_minutes).await {
            self.enter(PurchaseState::Failed);
            return Err(PurchaseError::Action(err));
        }

        self.enter(PurchaseState::Verifying);
        match self.verify(window_minutes).await {
            Ok(ticket) => {
                self.enter(PurchaseState::Confirmed);
                Ok(PurchaseOutcome::Confirmed(ticket))
            }
            Err(err) => {
                self.enter(PurchaseState::VerificationFailed);
                Err(err)
            }
        }
    }

    async fn dry_run(&self) -> Result<PurchaseOutcome<V::Ticket>, PurchaseError> {
        info!(product = %self.vendor.product(), "dry run: selecting numbers without buying");

        let vendor = self.vendor;
        with_retry(
            move || async move {
                vendor.navigate_to_purchase_page().await?;
                vendor.perform_auto_number_selection().await
            },
            &self.policy.action_retry_config(),
        )
        .await
        .map_err(PurchaseError::DryRun)?;

        Ok(PurchaseOutcome::DryRun)
    }

    /// Run the purchase steps under retry. Every attempt after the first
    /// starts with a history read; a recent ticket ends the loop.
    async fn purchase_with_recheck(&self, window_minutes: u32) -> Result<(), LottoError> {
        let attempts = AtomicU32::new(0);
        let attempts = &attempts;
        let guard = self;

        with_retry(
            move || async move {
                let attempt = attempts.fetch_add(1, Ordering::SeqCst);
                if attempt > 0
                    && let Some(ticket) = guard.find_recent(window_minutes).await
                {
                    info!(
                        round = ticket.round(),
                        attempt = attempt + 1,
                        "earlier attempt went through, not purchasing again"
                    );
                    return Ok(());
                }

                guard.vendor.navigate_to_purchase_page().await?;
                guard.vendor.perform_auto_number_selection().await?;
                guard.vendor.confirm_purchase().await
            },
            &self.policy.action_retry_config(),
        )
        .await
    }

    /// Newest ticket if it was sold within the window. Read errors count as
    /// "none found".
    async fn find_recent(&self, window_minutes: u32) -> Option<V::Ticket> {
        let ticket = match self.vendor.query_most_recent_ticket().await {
            Ok(Some(ticket)) => ticket,
            Ok(None) => {
                debug!("purchase history is empty");
                return None;
            }
            Err(err) => {
                warn!(error = %err, "recent purchase check failed, assuming no recent purchase");
                return None;
            }
        };

        match ticket.sale_date() {
            Some(sale) if is_within_window(sale, (self.clock)(), window_minutes) => Some(ticket),
            Some(sale) => {
                debug!(sale_date = %sale, window_minutes, "most recent ticket is outside the window");
                None
            }
            None => {
                debug!(round = ticket.round(), "most recent ticket has no sale date");
                None
            }
        }
    }

    async fn verify(&self, window_minutes: u32) -> Result<V::Ticket, PurchaseError> {
        let failed = |detail: String| PurchaseError::VerificationFailed {
            window_minutes,
            detail,
        };

        let ticket = match self.vendor.query_most_recent_ticket().await {
            Ok(Some(ticket)) => ticket,
            Ok(None) => return Err(failed("purchase history is empty".to_string())),
            Err(err) => return Err(failed(format!("could not read purchase history: {err}"))),
        };

        match ticket.sale_date() {
            None => {
                warn!(
                    round = ticket.round(),
                    "ticket has no sale date, verification skipped"
                );
                Ok(ticket)
            }
            Some(sale) if is_within_window(sale, (self.clock)(), window_minutes) => {
                info!(round = ticket.round(), sale_date = %sale, "purchase verified");
                Ok(ticket)
            }
            Some(sale) => Err(failed(format!(
                "most recent ticket was sold at {sale}, outside the window"
            ))),
        }
    }

    fn enter(&self, state: PurchaseState) {
        info!(product = %self.vendor.product(), state = %state, "purchase state");
    }
}
