//! Ticket vendor boundary
//!
//! The purchase protocol and the commands only see this trait. The concrete
//! implementation drives the vendor website; tests substitute a scripted one.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::SaleRecord;
use crate::error::Result;

/// Lottery products sold by the vendor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Product {
    Lotto645,
    Pension720,
}

impl Product {
    pub fn display_name(self) -> &'static str {
        match self {
            Product::Lotto645 => "Lotto 6/45",
            Product::Pension720 => "Pension 720+",
        }
    }

    /// Price of one game in KRW.
    pub fn price_per_game(self) -> u32 {
        match self {
            Product::Lotto645 => 1_000,
            Product::Pension720 => 1_000,
        }
    }
}

impl fmt::Display for Product {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// One product's purchase and history operations on the vendor site.
///
/// The three purchase steps are called in order as one unit:
/// [`navigate_to_purchase_page`](Self::navigate_to_purchase_page),
/// [`perform_auto_number_selection`](Self::perform_auto_number_selection),
/// [`confirm_purchase`](Self::confirm_purchase). A dry run stops after the
/// second step. Implementations keep whatever state the steps share.
#[async_trait]
pub trait TicketVendor: Send + Sync {
    type Ticket: SaleRecord + Clone + fmt::Debug + Send + Sync;
    type Winning: Clone + fmt::Debug + Send + Sync;

    fn product(&self) -> Product;

    async fn navigate_to_purchase_page(&self) -> Result<()>;

    async fn perform_auto_number_selection(&self) -> Result<()>;

    /// Spend money. Only ever called once per successful protocol run.
    async fn confirm_purchase(&self) -> Result<()>;

    /// Newest ticket in purchase history, `None` when the history is empty.
    async fn query_most_recent_ticket(&self) -> Result<Option<Self::Ticket>>;

    /// Up to `max_count` tickets, newest first, optionally limited to one
    /// draw round.
    async fn query_tickets_in_window(
        &self,
        round: Option<u32>,
        max_count: usize,
    ) -> Result<Vec<Self::Ticket>>;

    /// Latest published draw, `None` when the page has no result yet.
    async fn fetch_latest_winning_numbers(&self) -> Result<Option<Self::Winning>>;
}
