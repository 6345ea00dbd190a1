//! `weekly-lotto check`

use anyhow::{Context, bail};
use chrono::NaiveDate;
use clap::Parser;
use lotto_core::TicketVendor;
use lotto_core::config::AppConfig;
use lotto_core::domain::date::{format_date_dot, today_kst};
use lotto_core::domain::{PensionWinningNumbers, WinningNumbers};
use lotto_core::notify::templates;
use lotto_core::winning::{
    PensionWinningCheckResult, WinningCheckResult, check_pension_tickets, check_tickets_winning,
};
use lotto_dhlottery::{Lotto645Vendor, Pension720Vendor};
use tracing::info;

use crate::ProductArg;
use crate::report;
use crate::session;

#[derive(Debug, Parser)]
pub struct CheckArgs {
    #[arg(value_enum)]
    pub product: ProductArg,

    /// Winning numbers to use instead of the published ones. Lotto 6/45:
    /// "1,2,3,4,5,6,7" with the bonus last. Pension 720+: "4,765432,111111"
    /// as group, number, bonus.
    #[arg(long, env = "WINNING_NUMBERS", requires = "round")]
    pub numbers: Option<String>,

    /// Round of the given winning numbers
    #[arg(long, env = "WINNING_ROUND")]
    pub round: Option<u32>,

    /// Check the latest draw even when it was not held today
    #[arg(long)]
    pub any_date: bool,

    /// Most tickets to check
    #[arg(long, value_name = "N", default_value_t = 5)]
    pub max: usize,
}

pub(crate) async fn run(args: CheckArgs, config: &AppConfig) -> anyhow::Result<()> {
    match args.product {
        ProductArg::Lotto => check_lotto(&args, config).await,
        ProductArg::Pension => check_pension(&args, config).await,
    }
}

fn manual_round(args: &CheckArgs) -> anyhow::Result<Option<(&str, u32)>> {
    match (args.numbers.as_deref(), args.round) {
        (Some(numbers), Some(round)) if round > 0 => Ok(Some((numbers, round))),
        (Some(_), _) => bail!("--numbers needs a positive --round (WINNING_ROUND)"),
        (None, _) => Ok(None),
    }
}

/// Only a draw held today (KST) is checked, unless told otherwise.
fn is_current_draw(draw_date: NaiveDate, any_date: bool) -> bool {
    any_date || draw_date == today_kst()
}

/// Parse "1,2,3,4,5,6,7" (six numbers, then the bonus).
pub(crate) fn parse_lotto_numbers(text: &str, round: u32) -> anyhow::Result<WinningNumbers> {
    let parts = text
        .split(',')
        .map(|part| part.trim().parse::<u8>())
        .collect::<Result<Vec<_>, _>>()
        .with_context(|| format!("winning numbers {text:?} are not comma-separated numbers"))?;

    let Some((&bonus, numbers)) = parts.split_last() else {
        bail!("winning numbers are empty");
    };
    if numbers.len() != 6 {
        bail!("expected six numbers and a bonus, got {} values", parts.len());
    }
    Ok(WinningNumbers::new(round, today_kst(), numbers.to_vec(), bonus)?)
}

/// Parse "4,765432,111111" (group, number, bonus).
pub(crate) fn parse_pension_numbers(
    text: &str,
    round: u32,
) -> anyhow::Result<PensionWinningNumbers> {
    let parts: Vec<&str> = text.split(',').map(str::trim).collect();
    let [group, number, bonus] = parts.as_slice() else {
        bail!("expected group, number and bonus, got {text:?}");
    };
    let group: u8 = group
        .parse()
        .with_context(|| format!("group {group:?} is not a number"))?;
    Ok(PensionWinningNumbers::new(
        round,
        today_kst(),
        group,
        *number,
        *bonus,
    )?)
}

async fn check_lotto(args: &CheckArgs, config: &AppConfig) -> anyhow::Result<()> {
    let manual = manual_round(args)?
        .map(|(numbers, round)| parse_lotto_numbers(numbers, round))
        .transpose()?;

    let session = session::open(config).await?;
    let vendor = Lotto645Vendor::new(session, 1)?;

    let winning = match manual {
        Some(winning) => winning,
        None => match vendor.fetch_latest_winning_numbers().await? {
            Some(winning) if is_current_draw(winning.draw_date(), args.any_date) => winning,
            Some(winning) => {
                info!(
                    round = winning.round(),
                    draw_date = %format_date_dot(winning.draw_date()),
                    "latest draw was not held today, nothing to check"
                );
                return Ok(());
            }
            None => {
                info!("winning numbers are not published yet");
                return Ok(());
            }
        },
    };

    let tickets = vendor
        .query_tickets_in_window(Some(winning.round()), args.max)
        .await?;
    if tickets.is_empty() {
        info!(round = winning.round(), "no tickets bought for this round");
        return Ok(());
    }

    let result = check_tickets_winning(&tickets, &winning);
    print_lotto_result(&result);
    report::deliver(
        report::notifier(config).as_ref(),
        templates::lotto_winning_result(&result),
    )
    .await;
    Ok(())
}

async fn check_pension(args: &CheckArgs, config: &AppConfig) -> anyhow::Result<()> {
    let manual = manual_round(args)?
        .map(|(numbers, round)| parse_pension_numbers(numbers, round))
        .transpose()?;

    let session = session::open(config).await?;
    let vendor = Pension720Vendor::new(session);

    let winning = match manual {
        Some(winning) => winning,
        None => match vendor.fetch_latest_winning_numbers().await? {
            Some(winning) if is_current_draw(winning.draw_date(), args.any_date) => winning,
            Some(winning) => {
                info!(
                    round = winning.round(),
                    draw_date = %format_date_dot(winning.draw_date()),
                    "latest draw was not held today, nothing to check"
                );
                return Ok(());
            }
            None => {
                info!("winning numbers are not published yet");
                return Ok(());
            }
        },
    };

    let tickets = vendor
        .query_tickets_in_window(Some(winning.round()), args.max)
        .await?;
    if tickets.is_empty() {
        info!(round = winning.round(), "no tickets bought for this round");
        return Ok(());
    }

    let result = check_pension_tickets(&tickets, &winning);
    print_pension_result(&result);
    report::deliver(
        report::notifier(config).as_ref(),
        templates::pension_winning_result(&result),
    )
    .await;
    Ok(())
}

fn print_lotto_result(result: &WinningCheckResult) {
    let winning = &result.winning_numbers;
    println!(
        "Round {} ({}): {} + bonus {}",
        result.round,
        format_date_dot(winning.draw_date()),
        join(winning.numbers()),
        winning.bonus_number()
    );
    for checked in &result.tickets {
        println!(
            "  {}  {}  {}",
            checked.ticket.slot,
            join(&checked.ticket.numbers),
            checked.rank
        );
    }
    println!("{}", result.summary);
}

fn print_pension_result(result: &PensionWinningCheckResult) {
    let winning = &result.winning_numbers;
    println!(
        "Round {} ({}): group {} {}, bonus {}",
        result.round,
        format_date_dot(winning.draw_date()),
        winning.group(),
        winning.number(),
        winning.bonus_number()
    );
    for checked in &result.tickets {
        println!(
            "  {}  group {} {}  {} ({})",
            checked.ticket.slot,
            checked.ticket.group,
            checked.ticket.number,
            checked.rank,
            checked.match_info
        );
    }
    println!("{}", result.summary);
}

fn join(numbers: &[u8]) -> String {
    numbers
        .iter()
        .map(|n| format!("{n:02}"))
        .collect::<Vec<_>>()
        .join(" ")
}
