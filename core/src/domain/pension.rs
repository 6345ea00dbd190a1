//! Pension 720+ tickets, draws and ranks
//!
//! A pension number is a group (1-5) plus six digits. Leading zeros are
//! significant, so the digits are kept as a string.

use std::fmt;

use chrono::{DateTime, FixedOffset, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use super::{SaleRecord, Slot};
use crate::error::{LottoError, Result};

pub const MIN_GROUP: u8 = 1;
pub const MAX_GROUP: u8 = 5;
pub const DIGITS: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PensionMode {
    Auto,
    Manual,
}

impl PensionMode {
    pub fn from_label(label: &str) -> Self {
        let label = label.trim();
        if label.contains("수동") || label.eq_ignore_ascii_case("manual") {
            PensionMode::Manual
        } else {
            PensionMode::Auto
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PensionMode::Auto => "Auto",
            PensionMode::Manual => "Manual",
        }
    }
}

impl fmt::Display for PensionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A Pension 720+ ticket as read back from purchase history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PensionTicket {
    pub round: u32,
    pub slot: Slot,
    pub group: u8,
    /// Six ASCII digits
    pub number: String,
    pub mode: PensionMode,
    pub sale_date: Option<DateTime<FixedOffset>>,
    pub draw_date: Option<NaiveDate>,
}

impl PensionTicket {
    pub fn new(round: u32, slot: Slot, group: u8, number: impl Into<String>, mode: PensionMode) -> Self {
        Self {
            round,
            slot,
            group,
            number: number.into(),
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

impl SaleRecord for PensionTicket {
    fn round(&self) -> u32 {
        self.round
    }

    fn sale_date(&self) -> Option<DateTime<FixedOffset>> {
        self.sale_date
    }
}

/// Official result of a Pension 720+ draw.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PensionWinningNumbers {
    round: u32,
    draw_date: NaiveDate,
    group: u8,
    number: String,
    bonus_number: String,
}

impl PensionWinningNumbers {
    pub fn new(
        round: u32,
        draw_date: NaiveDate,
        group: u8,
        number: impl Into<String>,
        bonus_number: impl Into<String>,
    ) -> Result<Self> {
        let number = number.into();
        let bonus_number = bonus_number.into();

        if !is_valid_group(group) {
            return Err(LottoError::invalid_input("group", format!("{group} is outside 1..=5")));
        }
        if !is_valid_pension_number(&number) {
            return Err(LottoError::invalid_input("number", format!("{number:?} is not six digits")));
        }
        if !is_valid_pension_number(&bonus_number) {
            return Err(LottoError::invalid_input(
                "bonus_number",
                format!("{bonus_number:?} is not six digits"),
            ));
        }

        Ok(Self {
            round,
            draw_date,
            group,
            number,
            bonus_number,
        })
    }

    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn draw_date(&self) -> NaiveDate {
        self.draw_date
    }

    pub fn group(&self) -> u8 {
        self.group
    }

    pub fn number(&self) -> &str {
        &self.number
    }

    pub fn bonus_number(&self) -> &str {
        &self.bonus_number
    }
}

/// Prize tier of a Pension 720+ ticket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PensionRank {
    First,
    Second,
    Bonus,
    Third,
    Fourth,
    Fifth,
    Sixth,
    Seventh,
    None,
}

impl PensionRank {
    pub fn is_winner(self) -> bool {
        self != PensionRank::None
    }

    pub fn label(self) -> &'static str {
        match self {
            PensionRank::First => "1st",
            PensionRank::Second => "2nd",
            PensionRank::Bonus => "Bonus",
            PensionRank::Third => "3rd",
            PensionRank::Fourth => "4th",
            PensionRank::Fifth => "5th",
            PensionRank::Sixth => "6th",
            PensionRank::Seventh => "7th",
            PensionRank::None => "No prize",
        }
    }

    /// Published payout, for reports.
    pub fn prize_description(self) -> &'static str {
        match self {
            PensionRank::First => "KRW 7,000,000 monthly for 20 years",
            PensionRank::Second | PensionRank::Bonus => "KRW 1,000,000 monthly for 10 years",
            PensionRank::Third => "KRW 1,000,000",
            PensionRank::Fourth => "KRW 100,000",
            PensionRank::Fifth => "KRW 50,000",
            PensionRank::Sixth => "KRW 5,000",
            PensionRank::Seventh => "KRW 1,000",
            PensionRank::None => "-",
        }
    }
}

impl fmt::Display for PensionRank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

pub fn is_valid_group(group: u8) -> bool {
    (MIN_GROUP..=MAX_GROUP).contains(&group)
}

pub fn is_valid_pension_number(number: &str) -> bool {
    number.len() == DIGITS && number.bytes().all(|b| b.is_ascii_digit())
}

/// Group bought on a given weekday: Monday is group 1 through Friday group 5.
/// Weekends fall back to group 1.
pub fn group_for_weekday(weekday: Weekday) -> u8 {
    match weekday {
        Weekday::Mon => 1,
        Weekday::Tue => 2,
        Weekday::Wed => 3,
        Weekday::Thu => 4,
        Weekday::Fri => 5,
        Weekday::Sat | Weekday::Sun => 1,
    }
}

/// Tiers decided by leading or trailing digit runs, longest first.
const DIGIT_RUN_TIERS: [(usize, PensionRank); 4] = [
    (5, PensionRank::Third),
    (4, PensionRank::Fourth),
    (3, PensionRank::Fifth),
    (2, PensionRank::Sixth),
];

/// Prize tier of a ticket against a draw.
pub fn pension_rank(group: u8, number: &str, winning: &PensionWinningNumbers) -> PensionRank {
    if !is_valid_pension_number(number) {
        return PensionRank::None;
    }
    let drawn = winning.number();

    if number == drawn {
        return if group == winning.group() {
            PensionRank::First
        } else {
            PensionRank::Second
        };
    }
    if number == winning.bonus_number() {
        return PensionRank::Bonus;
    }
    if let Some((_, rank)) = DIGIT_RUN_TIERS
        .iter()
        .find(|(len, _)| digit_run_match(number, drawn, *len).is_some())
    {
        return *rank;
    }
    if number.as_bytes()[DIGITS - 1] == drawn.as_bytes()[DIGITS - 1] {
        return PensionRank::Seventh;
    }
    PensionRank::None
}

/// Which run of `len` digits matched: leading is checked before trailing.
pub fn digit_run_match(number: &str, drawn: &str, len: usize) -> Option<DigitRun> {
    if len == 0 || len > DIGITS || number.len() != DIGITS || drawn.len() != DIGITS {
        return None;
    }
    if number[..len] == drawn[..len] {
        Some(DigitRun::Leading)
    } else if number[DIGITS - len..] == drawn[DIGITS - len..] {
        Some(DigitRun::Trailing)
    } else {
        None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DigitRun {
    Leading,
    Trailing,
}
