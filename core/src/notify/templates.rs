//! Report emails rendered from askama templates
//!
//! Every builder returns an [`EmailMessage`] with an HTML body (auto-escaped)
//! and a plain-text body for clients without HTML support.

use askama::Template;

use super::{EmailMessage, NotifyError};
use crate::domain::date::{format_date_dot, format_sale_date};
use crate::domain::{PensionTicket, PurchasedTicket};
use crate::vendor::Product;
use crate::winning::{PensionWinningCheckResult, WinningCheckResult};

const SUCCESS_HEADER: &str = "linear-gradient(135deg, #667eea 0%, #764ba2 100%)";
const FAILURE_HEADER: &str = "linear-gradient(135deg, #f44336 0%, #e91e63 100%)";
const REVIEW_HEADER: &str = "linear-gradient(135deg, #ff9800 0%, #f57c00 100%)";
const WINNER_HEADER: &str = "linear-gradient(135deg, #ffd700 0%, #ff8c00 100%)";

const FAILURE_ACCENT: &str = "#f44336";
const REVIEW_ACCENT: &str = "#f57c00";

/// A drawn or purchased Lotto number as rendered in HTML.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ball {
    pub number: u8,
    pub color: &'static str,
    pub matched: bool,
    pub bonus: bool,
}

impl Ball {
    fn plain(number: u8) -> Self {
        Self {
            number,
            color: ball_color(number),
            matched: false,
            bonus: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct InfoRow {
    pub label: &'static str,
    pub value: String,
}

impl InfoRow {
    fn new(label: &'static str, value: impl Into<String>) -> Self {
        Self {
            label,
            value: value.into(),
        }
    }
}

/// Colour band of a Lotto ball, as printed on the official slip.
pub fn ball_color(number: u8) -> &'static str {
    match number {
        0..=10 => "#ffc107",
        11..=20 => "#2196f3",
        21..=30 => "#f44336",
        31..=40 => "#9e9e9e",
        _ => "#4caf50",
    }
}

/// `1234567` -> `KRW 1,234,567`
pub fn format_krw(amount: u64) -> String {
    let digits = amount.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    format!("KRW {grouped}")
}

fn join_numbers(numbers: &[u8]) -> String {
    numbers
        .iter()
        .map(u8::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

// -- purchase success ---------------------------------------------------------

#[derive(Template)]
#[template(path = "lotto_purchase.html")]
struct LottoPurchaseHtml<'a> {
    header_color: &'a str,
    title: &'a str,
    subtitle: &'a str,
    footer_note: &'a str,
    round: u32,
    slot: &'a str,
    mode: &'a str,
    ticket_balls: Vec<Ball>,
    rows: &'a [InfoRow],
}

#[derive(Template)]
#[template(path = "lotto_purchase.txt")]
struct LottoPurchaseText<'a> {
    rows: &'a [InfoRow],
}

pub fn lotto_purchase_success(ticket: &PurchasedTicket) -> Result<EmailMessage, NotifyError> {
    let numbers = join_numbers(&ticket.numbers);
    let mut rows = vec![
        InfoRow::new("Round", ticket.round.to_string()),
        InfoRow::new("Slot", ticket.slot.as_str()),
        InfoRow::new("Numbers", numbers.clone()),
        InfoRow::new("Mode", ticket.mode.label()),
        InfoRow::new("Issued", format_sale_date(ticket.sale_date)),
    ];
    if let Some(draw_date) = ticket.draw_date {
        rows.push(InfoRow::new("Draw date", format_date_dot(draw_date)));
    }

    let html = LottoPurchaseHtml {
        header_color: SUCCESS_HEADER,
        title: "Lotto 6/45 purchase complete",
        subtitle: "",
        footer_note: "Good luck!",
        round: ticket.round,
        slot: ticket.slot.as_str(),
        mode: ticket.mode.label(),
        ticket_balls: ticket.numbers.iter().copied().map(Ball::plain).collect(),
        rows: &rows,
    }
    .render()?;
    let text = LottoPurchaseText { rows: &rows }.render()?;

    Ok(EmailMessage {
        subject: format!(
            "[Lotto 6/45] Purchase complete: round {} slot {} - {numbers}",
            ticket.round, ticket.slot
        ),
        html,
        text,
    })
}

#[derive(Template)]
#[template(path = "pension_purchase.html")]
struct PensionPurchaseHtml<'a> {
    header_color: &'a str,
    title: &'a str,
    subtitle: &'a str,
    footer_note: &'a str,
    round: u32,
    slot: &'a str,
    mode: &'a str,
    group: u8,
    number: &'a str,
    rows: &'a [InfoRow],
}

#[derive(Template)]
#[template(path = "pension_purchase.txt")]
struct PensionPurchaseText<'a> {
    rows: &'a [InfoRow],
}

pub fn pension_purchase_success(ticket: &PensionTicket) -> Result<EmailMessage, NotifyError> {
    let mut rows = vec![
        InfoRow::new("Round", ticket.round.to_string()),
        InfoRow::new("Slot", ticket.slot.as_str()),
        InfoRow::new("Number", format!("group {} {}", ticket.group, ticket.number)),
        InfoRow::new("Mode", ticket.mode.label()),
        InfoRow::new("Issued", format_sale_date(ticket.sale_date)),
    ];
    if let Some(draw_date) = ticket.draw_date {
        rows.push(InfoRow::new("Draw date", format_date_dot(draw_date)));
    }

    let html = PensionPurchaseHtml {
        header_color: SUCCESS_HEADER,
        title: "Pension 720+ purchase complete",
        subtitle: "",
        footer_note: "Good luck!",
        round: ticket.round,
        slot: ticket.slot.as_str(),
        mode: ticket.mode.label(),
        group: ticket.group,
        number: &ticket.number,
        rows: &rows,
    }
    .render()?;
    let text = PensionPurchaseText { rows: &rows }.render()?;

    Ok(EmailMessage {
        subject: format!(
            "[Pension 720+] Purchase complete: round {} group {} {}",
            ticket.round, ticket.group, ticket.number
        ),
        html,
        text,
    })
}

// -- alerts -------------------------------------------------------------------

#[derive(Template)]
#[template(path = "alert.html")]
struct AlertHtml<'a> {
    header_color: &'a str,
    title: &'a str,
    subtitle: &'a str,
    footer_note: &'a str,
    accent: &'a str,
    headline: &'a str,
    detail_label: &'a str,
    detail: &'a str,
    advice: &'a str,
}

#[derive(Template)]
#[template(path = "alert.txt")]
struct AlertText<'a> {
    title: &'a str,
    headline: &'a str,
    detail_label: &'a str,
    detail: &'a str,
    advice: &'a str,
}

struct Alert<'a> {
    subject: String,
    title: String,
    header_color: &'a str,
    accent: &'a str,
    headline: &'a str,
    detail_label: &'a str,
    detail: &'a str,
    advice: &'a str,
}

impl Alert<'_> {
    fn render(&self) -> Result<EmailMessage, NotifyError> {
        let html = AlertHtml {
            header_color: self.header_color,
            title: &self.title,
            subtitle: "",
            footer_note: "",
            accent: self.accent,
            headline: self.headline,
            detail_label: self.detail_label,
            detail: self.detail,
            advice: self.advice,
        }
        .render()?;
        let text = AlertText {
            title: &self.title,
            headline: self.headline,
            detail_label: self.detail_label,
            detail: self.detail,
            advice: self.advice,
        }
        .render()?;

        Ok(EmailMessage {
            subject: self.subject.clone(),
            html,
            text,
        })
    }
}

/// The purchase action failed after all retries.
pub fn purchase_failure(product: Product, error: &str) -> Result<EmailMessage, NotifyError> {
    Alert {
        subject: format!("[{product}] Purchase failed"),
        title: format!("{product} purchase failed"),
        header_color: FAILURE_HEADER,
        accent: FAILURE_ACCENT,
        headline: "An error occurred while purchasing.",
        detail_label: "Error:",
        detail: error,
        advice: "Log in to dhlottery.co.kr and check the purchase status.",
    }
    .render()
}

/// The purchase ran but could not be proven from history.
pub fn verification_required(product: Product, detail: &str) -> Result<EmailMessage, NotifyError> {
    Alert {
        subject: format!("[{product}] Purchase needs manual verification"),
        title: format!("{product} purchase unverified"),
        header_color: REVIEW_HEADER,
        accent: REVIEW_ACCENT,
        headline: "The purchase was submitted but does not show up in your history.",
        detail_label: "Details:",
        detail,
        advice: "Do not rerun the purchase. Check your purchase history on dhlottery.co.kr first; money may already have been spent.",
    }
    .render()
}

/// The account cannot pay for the order; nothing was bought.
pub fn insufficient_balance(
    product: Product,
    required: u64,
    available: u64,
) -> Result<EmailMessage, NotifyError> {
    let detail = format!(
        "{} available, {} required",
        format_krw(available),
        format_krw(required)
    );
    Alert {
        subject: format!("[{product}] Deposit too low"),
        title: format!("{product} purchase skipped"),
        header_color: FAILURE_HEADER,
        accent: FAILURE_ACCENT,
        headline: "The deposit balance does not cover this order. Nothing was purchased.",
        detail_label: "Balance:",
        detail: &detail,
        advice: "Top up the deposit on dhlottery.co.kr before the sales deadline and run the purchase again.",
    }
    .render()
}

/// Number selection failed during a dry run.
pub fn dry_run_failure(product: Product, error: &str) -> Result<EmailMessage, NotifyError> {
    Alert {
        subject: format!("[{product}] Dry run failed"),
        title: format!("{product} dry run failed"),
        header_color: FAILURE_HEADER,
        accent: FAILURE_ACCENT,
        headline: "Number selection failed during a dry run. Nothing was purchased.",
        detail_label: "Error:",
        detail: error,
        advice: "The purchase page may have changed. Check the logs before the next scheduled run.",
    }
    .render()
}

/// Any other scheduled operation failed.
pub fn operation_failure(operation: &str, message: &str) -> Result<EmailMessage, NotifyError> {
    Alert {
        subject: format!("[weekly-lotto] {operation} failed"),
        title: format!("{operation} failed"),
        header_color: FAILURE_HEADER,
        accent: FAILURE_ACCENT,
        headline: "A scheduled operation failed.",
        detail_label: "Error:",
        detail: message,
        advice: "Check the workflow logs for details.",
    }
    .render()
}

// -- winning results ----------------------------------------------------------

struct LottoTicketRow {
    slot: &'static str,
    numbers: String,
    rank: &'static str,
    winner: bool,
    balls: Vec<Ball>,
    match_info: String,
}

#[derive(Template)]
#[template(path = "lotto_result.html")]
struct LottoResultHtml<'a> {
    header_color: &'a str,
    title: &'a str,
    subtitle: &'a str,
    footer_note: &'a str,
    winning_balls: Vec<Ball>,
    bonus_number: u8,
    summary: &'a str,
    total_count: usize,
    tickets: &'a [LottoTicketRow],
}

#[derive(Template)]
#[template(path = "lotto_result.txt")]
struct LottoResultText<'a> {
    round: u32,
    winning_line: &'a str,
    summary: &'a str,
    total_count: usize,
    tickets: &'a [LottoTicketRow],
}

pub fn lotto_winning_result(result: &WinningCheckResult) -> Result<EmailMessage, NotifyError> {
    let winning = &result.winning_numbers;
    let has_winner = result.winner_count > 0;

    let rows: Vec<LottoTicketRow> = result
        .tickets
        .iter()
        .map(|t| {
            let mut match_info = String::new();
            if !t.matching_numbers.is_empty() {
                match_info = format!("matched {}", join_numbers(&t.matching_numbers));
                if t.bonus_match {
                    match_info.push_str(" + bonus");
                }
            }
            if let Some(prize) = winning.prize_for(t.rank) {
                match_info.push_str(&format!(" | {}", format_krw(prize.amount_per_winner)));
            }

            LottoTicketRow {
                slot: t.ticket.slot.as_str(),
                numbers: join_numbers(&t.ticket.numbers),
                rank: t.rank.label(),
                winner: t.is_winner(),
                balls: t
                    .ticket
                    .numbers
                    .iter()
                    .map(|&n| Ball {
                        number: n,
                        color: ball_color(n),
                        matched: t.matching_numbers.contains(&n),
                        bonus: t.bonus_match && n == winning.bonus_number(),
                    })
                    .collect(),
                match_info,
            }
        })
        .collect();

    let subtitle = format!(
        "Round {} | drawn {}",
        result.round,
        format_date_dot(winning.draw_date())
    );
    let html = LottoResultHtml {
        header_color: if has_winner { WINNER_HEADER } else { SUCCESS_HEADER },
        title: if has_winner { "Congratulations!" } else { "Lotto 6/45 result" },
        subtitle: &subtitle,
        footer_note: if has_winner {
            "Claim your prize on dhlottery.co.kr."
        } else {
            "Better luck next week!"
        },
        winning_balls: winning.numbers().iter().copied().map(Ball::plain).collect(),
        bonus_number: winning.bonus_number(),
        summary: &result.summary,
        total_count: result.total_count,
        tickets: &rows,
    }
    .render()?;

    let winning_line = format!(
        "{} + bonus {}",
        join_numbers(winning.numbers()),
        winning.bonus_number()
    );
    let text = LottoResultText {
        round: result.round,
        winning_line: &winning_line,
        summary: &result.summary,
        total_count: result.total_count,
        tickets: &rows,
    }
    .render()?;

    let subject = if has_winner {
        format!(
            "[Lotto 6/45] Round {}: {} winning ticket(s)!",
            result.round, result.winner_count
        )
    } else {
        format!(
            "[Lotto 6/45] Round {}: all {} tickets lost",
            result.round, result.total_count
        )
    };

    Ok(EmailMessage {
        subject,
        html,
        text,
    })
}

struct PensionTicketRow {
    slot: &'static str,
    group: u8,
    number: String,
    rank: &'static str,
    winner: bool,
    match_info: String,
    prize: &'static str,
}

#[derive(Template)]
#[template(path = "pension_result.html")]
struct PensionResultHtml<'a> {
    header_color: &'a str,
    title: &'a str,
    subtitle: &'a str,
    footer_note: &'a str,
    winning_group: u8,
    winning_number: &'a str,
    bonus_number: &'a str,
    summary: &'a str,
    total_count: usize,
    tickets: &'a [PensionTicketRow],
}

#[derive(Template)]
#[template(path = "pension_result.txt")]
struct PensionResultText<'a> {
    round: u32,
    winning_group: u8,
    winning_number: &'a str,
    bonus_number: &'a str,
    summary: &'a str,
    total_count: usize,
    tickets: &'a [PensionTicketRow],
}

pub fn pension_winning_result(
    result: &PensionWinningCheckResult,
) -> Result<EmailMessage, NotifyError> {
    let winning = &result.winning_numbers;
    let has_winner = result.winner_count > 0;

    let rows: Vec<PensionTicketRow> = result
        .tickets
        .iter()
        .map(|t| PensionTicketRow {
            slot: t.ticket.slot.as_str(),
            group: t.ticket.group,
            number: t.ticket.number.clone(),
            rank: t.rank.label(),
            winner: t.is_winner(),
            match_info: t.match_info.clone(),
            prize: t.rank.prize_description(),
        })
        .collect();

    let subtitle = format!(
        "Round {} | drawn {}",
        result.round,
        format_date_dot(winning.draw_date())
    );
    let html = PensionResultHtml {
        header_color: if has_winner { WINNER_HEADER } else { SUCCESS_HEADER },
        title: if has_winner { "Congratulations!" } else { "Pension 720+ result" },
        subtitle: &subtitle,
        footer_note: if has_winner {
            "Claim your prize on dhlottery.co.kr."
        } else {
            "Better luck next week!"
        },
        winning_group: winning.group(),
        winning_number: winning.number(),
        bonus_number: winning.bonus_number(),
        summary: &result.summary,
        total_count: result.total_count,
        tickets: &rows,
    }
    .render()?;
    let text = PensionResultText {
        round: result.round,
        winning_group: winning.group(),
        winning_number: winning.number(),
        bonus_number: winning.bonus_number(),
        summary: &result.summary,
        total_count: result.total_count,
        tickets: &rows,
    }
    .render()?;

    let subject = if has_winner {
        format!(
            "[Pension 720+] Round {}: {} winning ticket(s)!",
            result.round, result.winner_count
        )
    } else {
        format!(
            "[Pension 720+] Round {}: all {} tickets lost",
            result.round, result.total_count
        )
    };

    Ok(EmailMessage {
        subject,
        html,
        text,
    })
}
