//! Deposit balance of the vendor account, in KRW

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Balance {
    pub total: u64,
    /// What an order may spend right now
    pub available: u64,
    /// Held by scheduled purchases
    pub reserved: u64,
    pub withdraw_pending: u64,
    pub unavailable: u64,
    /// Spent on tickets this calendar month
    pub monthly_total: u64,
}

impl Balance {
    pub fn covers(&self, amount: u64) -> bool {
        self.available >= amount
    }
}
