//! Domain types for both lottery products

pub mod balance;
pub mod date;
pub mod lotto645;
pub mod pension;

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

pub use balance::Balance;
pub use lotto645::{
    PrizeInfo, PurchaseMode, PurchasedTicket, Rank, WinningNumbers, lotto_rank,
    validate_ticket_numbers,
};
pub use pension::{
    PensionMode, PensionRank, PensionTicket, PensionWinningNumbers, group_for_weekday,
    is_valid_group, is_valid_pension_number, pension_rank,
};

/// Anything read back from the vendor's purchase history.
pub trait SaleRecord {
    /// Draw round the ticket belongs to (0 when unknown)
    fn round(&self) -> u32;

    /// When the vendor issued the ticket, if the page said so
    fn sale_date(&self) -> Option<DateTime<FixedOffset>>;
}

/// Position of a game within one transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Slot {
    A,
    B,
    C,
    D,
    E,
}

impl Slot {
    pub const ALL: [Slot; 5] = [Slot::A, Slot::B, Slot::C, Slot::D, Slot::E];

    /// Slot for the 0-based game index within a transaction.
    pub fn from_index(idx: usize) -> Option<Slot> {
        Self::ALL.get(idx).copied()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Slot::A => "A",
            Slot::B => "B",
            Slot::C => "C",
            Slot::D => "D",
            Slot::E => "E",
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Slot {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "A" => Ok(Slot::A),
            "B" => Ok(Slot::B),
            "C" => Ok(Slot::C),
            "D" => Ok(Slot::D),
            "E" => Ok(Slot::E),
            other => Err(format!("unknown slot '{other}'")),
        }
    }
}
