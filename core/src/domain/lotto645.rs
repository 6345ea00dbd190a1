//! Lotto 6/45 tickets, draws and ranks

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};

use super::{SaleRecord, Slot};
use crate::error::{LottoError, Result};

pub const MIN_NUMBER: u8 = 1;
pub const MAX_NUMBER: u8 = 45;
pub const NUMBERS_PER_GAME: usize = 6;

/// How the numbers of a game were chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PurchaseMode {
    Auto,
    SemiAuto,
    Manual,
}

impl PurchaseMode {
    /// Decode the mode digit the vendor appends to each game line
    /// (1 = manual, 2 = semi-auto, 3 = auto).
    pub fn from_vendor_code(code: char) -> Option<Self> {
        match code {
            '1' => Some(PurchaseMode::Manual),
            '2' => Some(PurchaseMode::SemiAuto),
            '3' => Some(PurchaseMode::Auto),
            _ => None,
        }
    }

    /// Decode the mode label shown on the history detail page.
    pub fn from_label(label: &str) -> Self {
        let label = label.trim();
        if label.contains("반자동") || label.eq_ignore_ascii_case("semi-auto") {
            PurchaseMode::SemiAuto
        } else if label.contains("수동") || label.eq_ignore_ascii_case("manual") {
            PurchaseMode::Manual
        } else {
            PurchaseMode::Auto
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PurchaseMode::Auto => "Auto",
            PurchaseMode::SemiAuto => "Semi-auto",
            PurchaseMode::Manual => "Manual",
        }
    }
}

impl fmt::Display for PurchaseMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A Lotto 6/45 game as read back from purchase history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchasedTicket {
    /// Draw round; 0 when the page did not say
    pub round: u32,
    pub slot: Slot,
    /// Ascending; empty when the numbers could not be read
    pub numbers: Vec<u8>,
    pub mode: PurchaseMode,
    pub sale_date: Option<DateTime<FixedOffset>>,
    pub draw_date: Option<NaiveDate>,
}

impl PurchasedTicket {
    pub fn new(round: u32, slot: Slot, mut numbers: Vec<u8>, mode: PurchaseMode) -> Self {
        numbers.sort_unstable();
        Self {
            round,
            slot,
            numbers,
            mode,
            sale_date: None,
            draw_date: None,
        }
    }

    pub fn with_sale_date(mut self, sale_date: Option<DateTime<FixedOffset>>) -> Self {
        self.sale_date = sale_date;
        self
    }

    pub fn with_draw_date(mut self, draw_date: Option<NaiveDate>) -> Self {
        self.draw_date = draw_date;
        self
    }
}

impl SaleRecord for PurchasedTicket {
    fn round(&self) -> u32 {
        self.round
    }

    fn sale_date(&self) -> Option<DateTime<FixedOffset>> {
        self.sale_date
    }
}

/// Prize tier of a Lotto 6/45 game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Rank {
    First,
    Second,
    Third,
    Fourth,
    Fifth,
    None,
}

impl Rank {
    pub const WINNING: [Rank; 5] = [Rank::First, Rank::Second, Rank::Third, Rank::Fourth, Rank::Fifth];

    pub fn is_winner(self) -> bool {
        self != Rank::None
    }

    /// 1-based prize tier, `None` for a losing game.
    pub fn ordinal(self) -> Option<u8> {
        match self {
            Rank::First => Some(1),
            Rank::Second => Some(2),
            Rank::Third => Some(3),
            Rank::Fourth => Some(4),
            Rank::Fifth => Some(5),
            Rank::None => None,
        }
    }

    pub fn from_ordinal(ordinal: u8) -> Option<Rank> {
        Self::WINNING.get(usize::from(ordinal).checked_sub(1)?).copied()
    }

    pub fn label(self) -> &'static str {
        match self {
            Rank::First => "1st",
            Rank::Second => "2nd",
            Rank::Third => "3rd",
            Rank::Fourth => "4th",
            Rank::Fifth => "5th",
            Rank::None => "No prize",
        }
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Payout for one prize tier, in KRW.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrizeInfo {
    pub total_amount: u64,
    pub winner_count: u64,
    pub amount_per_winner: u64,
}

/// Official result of a Lotto 6/45 draw.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WinningNumbers {
    round: u32,
    draw_date: NaiveDate,
    numbers: Vec<u8>,
    bonus_number: u8,
    prizes: Option<BTreeMap<Rank, PrizeInfo>>,
}

impl WinningNumbers {
    /// Validate and build a draw result; the numbers are stored ascending.
    pub fn new(round: u32, draw_date: NaiveDate, numbers: Vec<u8>, bonus_number: u8) -> Result<Self> {
        if !validate_ticket_numbers(&numbers) {
            return Err(LottoError::invalid_input(
                "numbers",
                format!("expected 6 distinct values in 1..=45, got {numbers:?}"),
            ));
        }
        if !(MIN_NUMBER..=MAX_NUMBER).contains(&bonus_number) {
            return Err(LottoError::invalid_input(
                "bonus_number",
                format!("{bonus_number} is outside 1..=45"),
            ));
        }
        if numbers.contains(&bonus_number) {
            return Err(LottoError::invalid_input(
                "bonus_number",
                format!("{bonus_number} is already one of the drawn numbers"),
            ));
        }

        let mut numbers = numbers;
        numbers.sort_unstable();
        Ok(Self {
            round,
            draw_date,
            numbers,
            bonus_number,
            prizes: None,
        })
    }

    pub fn with_prizes(mut self, prizes: BTreeMap<Rank, PrizeInfo>) -> Self {
        self.prizes = (!prizes.is_empty()).then_some(prizes);
        self
    }

    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn draw_date(&self) -> NaiveDate {
        self.draw_date
    }

    pub fn numbers(&self) -> &[u8] {
        &self.numbers
    }

    pub fn bonus_number(&self) -> u8 {
        self.bonus_number
    }

    pub fn prizes(&self) -> Option<&BTreeMap<Rank, PrizeInfo>> {
        self.prizes.as_ref()
    }

    pub fn prize_for(&self, rank: Rank) -> Option<&PrizeInfo> {
        self.prizes.as_ref()?.get(&rank)
    }

    /// Candidate numbers that were drawn, in candidate order.
    pub fn matching_numbers(&self, candidate: &[u8]) -> Vec<u8> {
        candidate
            .iter()
            .copied()
            .filter(|n| self.numbers.contains(n))
            .collect()
    }
}

/// Exactly six distinct numbers, each within 1..=45.
pub fn validate_ticket_numbers(numbers: &[u8]) -> bool {
    if numbers.len() != NUMBERS_PER_GAME {
        return false;
    }
    if numbers.iter().any(|n| !(MIN_NUMBER..=MAX_NUMBER).contains(n)) {
        return false;
    }
    let mut sorted = numbers.to_vec();
    sorted.sort_unstable();
    sorted.dedup();
    sorted.len() == NUMBERS_PER_GAME
}

/// Prize tier of `candidate` against a draw.
///
/// 6 matches is first; 5 plus the bonus is second; 5, 4 and 3 matches are
/// third, fourth and fifth. Anything else wins nothing.
pub fn lotto_rank(candidate: &[u8], winning: &WinningNumbers) -> Rank {
    let matches = winning.matching_numbers(candidate).len();
    let bonus = candidate.contains(&winning.bonus_number);

    match (matches, bonus) {
        (6, _) => Rank::First,
        (5, true) => Rank::Second,
        (5, false) => Rank::Third,
        (4, _) => Rank::Fourth,
        (3, _) => Rank::Fifth,
        _ => Rank::None,
    }
}
