//! `weekly-lotto buy`

use clap::builder::BoolishValueParser;
use clap::{ArgAction, Parser};
use lotto_core::config::AppConfig;
use lotto_core::domain::{PurchasedTicket, SaleRecord};
use lotto_core::notify::{Notifier, templates};
use lotto_core::{
    LottoError, Product, PurchaseError, PurchaseGuard, PurchaseOutcome, PurchasePolicy,
    TicketVendor,
};
use lotto_dhlottery::{Lotto645Vendor, Pension720Vendor};
use tracing::{error, info, warn};

use crate::ProductArg;
use crate::report;
use crate::session;

#[derive(Debug, Parser)]
pub struct BuyArgs {
    #[arg(value_enum)]
    pub product: ProductArg,

    /// Stop after number selection; pass `false` to spend money
    #[arg(
        long,
        env = "DRY_RUN",
        value_name = "BOOL",
        action = ArgAction::Set,
        num_args = 1,
        default_value_t = true,
        value_parser = BoolishValueParser::new()
    )]
    pub dry_run: bool,

    /// Minutes within which a history entry counts as this run's purchase
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u32).range(1..))]
    pub window_minutes: Option<u32>,

    /// Lotto 6/45 games per order
    #[arg(long, value_name = "N", default_value_t = 1, value_parser = clap::value_parser!(u8).range(1..=5))]
    pub games: u8,

    /// Pension 720+ group to buy instead of the weekday's
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u8).range(1..=5))]
    pub group: Option<u8>,
}

pub(crate) async fn run(args: BuyArgs, config: &AppConfig) -> anyhow::Result<()> {
    let product = Product::from(args.product);
    let purchase = PurchaseSettings {
        window_minutes: args.window_minutes.unwrap_or(config.window_minutes),
        policy: PurchasePolicy {
            max_retries: config.purchase_retries,
            ..PurchasePolicy::default()
        },
    };
    let notifier = report::notifier(config);

    if args.dry_run {
        info!(%product, "dry run, nothing will be purchased");
    } else {
        warn!(%product, "real purchase, the account will be charged");
    }

    let result = match args.product {
        ProductArg::Lotto => buy_lotto(&args, config, purchase, notifier.as_ref()).await,
        ProductArg::Pension => buy_pension(&args, config, purchase, notifier.as_ref()).await,
    };

    let Err(err) = result else {
        return Ok(());
    };
    if err.requires_review() {
        error!(%product, "purchase could not be verified, check the account by hand");
    }
    report::deliver(notifier.as_ref(), report::failure_report(product, &err)).await;
    Err(err.into())
}

/// Error wrapper for failures outside the guard: a dry run reports them as
/// dry-run failures, a real run as purchase failures.
fn stage_error(dry_run: bool) -> fn(LottoError) -> PurchaseError {
    if dry_run {
        PurchaseError::DryRun
    } else {
        PurchaseError::Action
    }
}

/// Guard settings resolved from flags and configuration.
#[derive(Debug, Clone, Copy)]
struct PurchaseSettings {
    window_minutes: u32,
    policy: PurchasePolicy,
}

async fn guarded<V: TicketVendor>(
    vendor: &V,
    dry_run: bool,
    settings: PurchaseSettings,
) -> Result<PurchaseOutcome<V::Ticket>, PurchaseError> {
    PurchaseGuard::new(vendor)
        .with_policy(settings.policy)
        .run(dry_run, settings.window_minutes)
        .await
}

async fn buy_lotto(
    args: &BuyArgs,
    config: &AppConfig,
    settings: PurchaseSettings,
    notifier: &dyn Notifier,
) -> Result<(), PurchaseError> {
    let to_error = stage_error(args.dry_run);
    let session = session::open(config).await.map_err(to_error)?;
    let vendor = Lotto645Vendor::new(session, args.games).map_err(to_error)?;

    let ticket = match guarded(&vendor, args.dry_run, settings).await? {
        PurchaseOutcome::Confirmed(ticket) => ticket,
        outcome => {
            log_without_purchase(Product::Lotto645, &outcome);
            return Ok(());
        }
    };

    let round = ticket.round;
    let history = match vendor
        .query_tickets_in_window(Some(round), usize::from(vendor.games()))
        .await
    {
        Ok(games) => games,
        Err(err) => {
            warn!(round, error = %err, "could not read the order back");
            Vec::new()
        }
    };

    for game in &games_to_report(history, vendor.last_order(), ticket) {
        report::deliver(notifier, templates::lotto_purchase_success(game)).await;
    }
    Ok(())
}

/// One report per game of the order: as history lists it, else as the order
/// response listed it, else the confirming ticket alone.
fn games_to_report(
    history: Vec<PurchasedTicket>,
    order: Vec<PurchasedTicket>,
    confirming: PurchasedTicket,
) -> Vec<PurchasedTicket> {
    if !history.is_empty() {
        history
    } else if !order.is_empty() {
        order
    } else {
        vec![confirming]
    }
}

async fn buy_pension(
    args: &BuyArgs,
    config: &AppConfig,
    settings: PurchaseSettings,
    notifier: &dyn Notifier,
) -> Result<(), PurchaseError> {
    let to_error = stage_error(args.dry_run);
    let session = session::open(config).await.map_err(to_error)?;
    let vendor = Pension720Vendor::new(session)
        .with_group(args.group)
        .map_err(to_error)?;

    match guarded(&vendor, args.dry_run, settings).await? {
        PurchaseOutcome::Confirmed(ticket) => {
            report::deliver(notifier, templates::pension_purchase_success(&ticket)).await;
        }
        outcome => log_without_purchase(Product::Pension720, &outcome),
    }
    Ok(())
}

fn log_without_purchase<T: SaleRecord>(product: Product, outcome: &PurchaseOutcome<T>) {
    match outcome {
        PurchaseOutcome::DryRun => info!(%product, "dry run finished, number selection works"),
        PurchaseOutcome::Skipped(ticket) => info!(
            %product,
            round = ticket.round(),
            "this week's ticket was already bought, nothing to do"
        ),
        PurchaseOutcome::Confirmed(_) => {}
    }
}
