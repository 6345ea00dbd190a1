//! `weekly-lotto history`

use std::cmp::Reverse;

use clap::Parser;
use lotto_core::TicketVendor;
use lotto_core::config::AppConfig;
use lotto_core::domain::date::format_sale_date;
use lotto_core::domain::{PensionTicket, PurchasedTicket, SaleRecord};
use lotto_dhlottery::{Lotto645Vendor, Pension720Vendor};
use tracing::info;

use crate::ProductArg;
use crate::session;

#[derive(Debug, Parser)]
pub struct HistoryArgs {
    #[arg(value_enum)]
    pub product: ProductArg,

    /// Most tickets to list
    #[arg(long, value_name = "N", default_value_t = 10)]
    pub max: usize,
}

pub(crate) async fn run(args: HistoryArgs, config: &AppConfig) -> anyhow::Result<()> {
    let session = session::open(config).await?;
    let lines = match args.product {
        ProductArg::Lotto => {
            let vendor = Lotto645Vendor::new(session, 1)?;
            let tickets = vendor.query_tickets_in_window(None, args.max).await?;
            render(&tickets, describe_lotto)
        }
        ProductArg::Pension => {
            let vendor = Pension720Vendor::new(session);
            let tickets = vendor.query_tickets_in_window(None, args.max).await?;
            render(&tickets, describe_pension)
        }
    };

    if lines.is_empty() {
        info!("no purchases in the last week");
    }
    for line in lines {
        println!("{line}");
    }
    Ok(())
}

/// Tickets grouped by round, newest round first; order within a round is
/// kept.
fn group_by_round<T: SaleRecord>(tickets: &[T]) -> Vec<(u32, Vec<&T>)> {
    let mut groups: Vec<(u32, Vec<&T>)> = Vec::new();
    for ticket in tickets {
        match groups.iter_mut().find(|(round, _)| *round == ticket.round()) {
            Some((_, group)) => group.push(ticket),
            None => groups.push((ticket.round(), vec![ticket])),
        }
    }
    groups.sort_by_key(|(round, _)| Reverse(*round));
    groups
}

fn render<T: SaleRecord>(tickets: &[T], describe: fn(&T) -> String) -> Vec<String> {
    let mut lines = Vec::new();
    for (round, group) in group_by_round(tickets) {
        lines.push(format!("Round {round}"));
        lines.extend(group.into_iter().map(describe));
    }
    lines
}

fn describe_lotto(ticket: &PurchasedTicket) -> String {
    let numbers = ticket
        .numbers
        .iter()
        .map(|n| format!("{n:02}"))
        .collect::<Vec<_>>()
        .join(" ");
    format!(
        "  {}  {numbers}  {}  {}",
        ticket.slot,
        ticket.mode,
        format_sale_date(ticket.sale_date)
    )
}

fn describe_pension(ticket: &PensionTicket) -> String {
    format!(
        "  {}  group {} {}  {}  {}",
        ticket.slot,
        ticket.group,
        ticket.number,
        ticket.mode,
        format_sale_date(ticket.sale_date)
    )
}
