//! Compare purchased tickets with an official draw

use std::collections::BTreeMap;

use serde::Serialize;

use crate::domain::pension::{DIGITS, DigitRun, digit_run_match};
use crate::domain::{
    PensionRank, PensionTicket, PensionWinningNumbers, PurchasedTicket, Rank, WinningNumbers,
    lotto_rank, pension_rank,
};

/// One Lotto 6/45 game checked against a draw.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TicketWinningResult {
    pub ticket: PurchasedTicket,
    pub rank: Rank,
    /// Drawn numbers the game contains, in ticket order
    pub matching_numbers: Vec<u8>,
    pub bonus_match: bool,
}

impl TicketWinningResult {
    pub fn is_winner(&self) -> bool {
        self.rank.is_winner()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WinningCheckResult {
    pub round: u32,
    pub winning_numbers: WinningNumbers,
    pub tickets: Vec<TicketWinningResult>,
    pub winner_count: usize,
    pub total_count: usize,
    pub summary: String,
}

/// One Pension 720+ ticket checked against a draw.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PensionTicketWinningResult {
    pub ticket: PensionTicket,
    pub rank: PensionRank,
    /// Which part of the number matched, for reports
    pub match_info: String,
}

impl PensionTicketWinningResult {
    pub fn is_winner(&self) -> bool {
        self.rank.is_winner()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PensionWinningCheckResult {
    pub round: u32,
    pub winning_numbers: PensionWinningNumbers,
    pub tickets: Vec<PensionTicketWinningResult>,
    pub winner_count: usize,
    pub total_count: usize,
    pub summary: String,
}

pub fn check_tickets_winning(
    tickets: &[PurchasedTicket],
    winning: &WinningNumbers,
) -> WinningCheckResult {
    let results: Vec<TicketWinningResult> = tickets
        .iter()
        .map(|ticket| TicketWinningResult {
            ticket: ticket.clone(),
            rank: lotto_rank(&ticket.numbers, winning),
            matching_numbers: winning.matching_numbers(&ticket.numbers),
            bonus_match: ticket.numbers.contains(&winning.bonus_number()),
        })
        .collect();

    let summary = summarize(
        winning.round(),
        results.len(),
        results.iter().map(|r| r.rank).filter(|rank| rank.is_winner()),
        Rank::label,
    );

    WinningCheckResult {
        round: winning.round(),
        winning_numbers: winning.clone(),
        winner_count: results.iter().filter(|r| r.is_winner()).count(),
        total_count: results.len(),
        tickets: results,
        summary,
    }
}

pub fn check_pension_tickets(
    tickets: &[PensionTicket],
    winning: &PensionWinningNumbers,
) -> PensionWinningCheckResult {
    let results: Vec<PensionTicketWinningResult> = tickets
        .iter()
        .map(|ticket| {
            let rank = pension_rank(ticket.group, &ticket.number, winning);
            PensionTicketWinningResult {
                match_info: pension_match_info(ticket, winning, rank),
                ticket: ticket.clone(),
                rank,
            }
        })
        .collect();

    let summary = summarize(
        winning.round(),
        results.len(),
        results.iter().map(|r| r.rank).filter(|rank| rank.is_winner()),
        PensionRank::label,
    );

    PensionWinningCheckResult {
        round: winning.round(),
        winning_numbers: winning.clone(),
        winner_count: results.iter().filter(|r| r.is_winner()).count(),
        total_count: results.len(),
        tickets: results,
        summary,
    }
}

/// "Round N: all K tickets lost" or "Round N: W of K tickets won (1st x1, 5th x2)".
fn summarize<R: Ord + Copy>(
    round: u32,
    total: usize,
    winners: impl Iterator<Item = R>,
    label: impl Fn(R) -> &'static str,
) -> String {
    let mut by_rank: BTreeMap<R, usize> = BTreeMap::new();
    for rank in winners {
        *by_rank.entry(rank).or_default() += 1;
    }

    if by_rank.is_empty() {
        return format!("Round {round}: all {total} tickets lost");
    }

    let won: usize = by_rank.values().sum();
    let breakdown = by_rank
        .iter()
        .map(|(rank, count)| format!("{} x{count}", label(*rank)))
        .collect::<Vec<_>>()
        .join(", ");
    format!("Round {round}: {won} of {total} tickets won ({breakdown})")
}

fn pension_match_info(
    ticket: &PensionTicket,
    winning: &PensionWinningNumbers,
    rank: PensionRank,
) -> String {
    let number = ticket.number.as_str();
    let run = |len: usize| -> String {
        match digit_run_match(number, winning.number(), len) {
            Some(DigitRun::Leading) => format!("first {len} digits match ({})", &number[..len]),
            Some(DigitRun::Trailing) => {
                format!("last {len} digits match ({})", &number[DIGITS - len..])
            }
            None => "no match".to_string(),
        }
    };

    match rank {
        PensionRank::First => format!("group {} and all 6 digits match", ticket.group),
        PensionRank::Second => "all 6 digits match, different group".to_string(),
        PensionRank::Bonus => "bonus number matches".to_string(),
        PensionRank::Third => run(5),
        PensionRank::Fourth => run(4),
        PensionRank::Fifth => run(3),
        PensionRank::Sixth => run(2),
        PensionRank::Seventh => format!("last digit matches ({})", &number[DIGITS - 1..]),
        PensionRank::None => "no match".to_string(),
    }
}
