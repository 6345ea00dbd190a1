//! Pension 720+ end to end against an in-memory vendor: buy, verify, check
//! the draw, render the reports.

use std::sync::Mutex;
use std::sync::PoisonError;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, NaiveDate, TimeZone, Utc};
use lotto_core::domain::date::kst;
use lotto_core::domain::{PensionMode, PensionTicket, PensionWinningNumbers, Slot};
use lotto_core::notify::templates;
use lotto_core::winning::check_pension_tickets;
use lotto_core::{LottoError, Product, PurchaseGuard, PurchaseOutcome, Result, TicketVendor};
use pretty_assertions::assert_eq;

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 22, 1, 0, 0)
        .single()
        .unwrap_or_default()
}

fn sold_at(minutes_ago: i64) -> DateTime<FixedOffset> {
    (now() - chrono::Duration::minutes(minutes_ago)).with_timezone(&kst())
}

/// Sells one ticket per confirmation; fails the first `flaky` confirmations
/// with a network error after recording the sale.
struct InMemoryPensionVendor {
    history: Mutex<Vec<PensionTicket>>,
    flaky: AtomicU32,
    confirms: AtomicU32,
}

impl InMemoryPensionVendor {
    fn new(history: Vec<PensionTicket>, flaky: u32) -> Self {
        Self {
            history: Mutex::new(history),
            flaky: AtomicU32::new(flaky),
            confirms: AtomicU32::new(0),
        }
    }

    fn history(&self) -> std::sync::MutexGuard<'_, Vec<PensionTicket>> {
        self.history.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl TicketVendor for InMemoryPensionVendor {
    type Ticket = PensionTicket;
    type Winning = PensionWinningNumbers;

    fn product(&self) -> Product {
        Product::Pension720
    }

    async fn navigate_to_purchase_page(&self) -> Result<()> {
        Ok(())
    }

    async fn perform_auto_number_selection(&self) -> Result<()> {
        Ok(())
    }

    async fn confirm_purchase(&self) -> Result<()> {
        self.confirms.fetch_add(1, Ordering::SeqCst);
        self.history().insert(
            0,
            PensionTicket::new(298, Slot::A, 4, "765432", PensionMode::Auto)
                .with_sale_date(Some(sold_at(0))),
        );

        if self.flaky.load(Ordering::SeqCst) > 0 {
            self.flaky.fetch_sub(1, Ordering::SeqCst);
            return Err(LottoError::vendor("connection reset while reading receipt"));
        }
        Ok(())
    }

    async fn query_most_recent_ticket(&self) -> Result<Option<PensionTicket>> {
        Ok(self.history().first().cloned())
    }

    async fn query_tickets_in_window(
        &self,
        round: Option<u32>,
        max_count: usize,
    ) -> Result<Vec<PensionTicket>> {
        Ok(self
            .history()
            .iter()
            .filter(|ticket| round.is_none_or(|r| ticket.round == r))
            .take(max_count)
            .cloned()
            .collect())
    }

    async fn fetch_latest_winning_numbers(&self) -> Result<Option<PensionWinningNumbers>> {
        let date = NaiveDate::from_ymd_opt(2026, 1, 22).unwrap_or_default();
        PensionWinningNumbers::new(298, date, 4, "765432", "111111").map(Some)
    }
}

#[tokio::test(start_paused = true)]
async fn purchase_survives_error_after_sale_without_buying_twice() {
    let vendor = InMemoryPensionVendor::new(Vec::new(), 1);

    let outcome = PurchaseGuard::new(&vendor)
        .with_clock(now)
        .run(false, 5)
        .await
        .unwrap_or_else(|err| panic!("purchase should be confirmed: {err}"));

    assert!(matches!(outcome, PurchaseOutcome::Confirmed(_)));
    assert_eq!(vendor.confirms.load(Ordering::SeqCst), 1);
    assert_eq!(vendor.history().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn second_run_in_the_same_window_is_skipped() {
    let earlier = PensionTicket::new(298, Slot::A, 4, "765432", PensionMode::Auto)
        .with_sale_date(Some(sold_at(2)));
    let vendor = InMemoryPensionVendor::new(vec![earlier.clone()], 0);

    let tickets = PurchaseGuard::new(&vendor)
        .with_clock(now)
        .purchase(false, 5)
        .await
        .unwrap_or_else(|err| panic!("run should succeed: {err}"));

    assert_eq!(tickets, vec![earlier]);
    assert_eq!(vendor.confirms.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn purchased_ticket_is_checked_and_reported() {
    let vendor = InMemoryPensionVendor::new(Vec::new(), 0);
    let tickets = PurchaseGuard::new(&vendor)
        .with_clock(now)
        .purchase(false, 5)
        .await
        .unwrap_or_else(|err| panic!("purchase should succeed: {err}"));

    let purchase_mail = templates::pension_purchase_success(&tickets[0])
        .unwrap_or_else(|err| panic!("render: {err}"));
    assert!(purchase_mail.subject.starts_with("[Pension 720+]"));

    let winning = vendor
        .fetch_latest_winning_numbers()
        .await
        .ok()
        .flatten()
        .unwrap_or_else(|| panic!("draw should be published"));
    let history = vendor
        .query_tickets_in_window(Some(winning.round()), 10)
        .await
        .unwrap_or_default();

    let result = check_pension_tickets(&history, &winning);
    assert_eq!(result.winner_count, 1);
    assert_eq!(result.summary, "Round 298: 1 of 1 tickets won (1st x1)");

    let report =
        templates::pension_winning_result(&result).unwrap_or_else(|err| panic!("render: {err}"));
    assert!(report.text.contains("765432"));
}
