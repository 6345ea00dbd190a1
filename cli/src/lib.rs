//! `weekly-lotto` command line
//!
//! Every subcommand loads the configuration once, logs in when it needs the
//! account, and works against one product. Purchase outcomes and draw
//! results are routed to the report templates in `lotto_core::notify`.
//!
//! ## Commands
//!
//! - `weekly-lotto buy lotto|pension` - guarded weekly purchase (dry run by default)
//! - `weekly-lotto check lotto|pension` - compare this round's tickets with the draw
//! - `weekly-lotto history lotto|pension` - recent purchases grouped by round
//! - `weekly-lotto notify-failure <operation> <message>` - generic failure report

mod buy_cmd;
mod check_cmd;
mod history_cmd;
mod report;
mod session;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use lotto_core::Product;
use lotto_core::config::{AppConfig, ConfigLoader};
use tracing::error;

pub use buy_cmd::BuyArgs;
pub use check_cmd::CheckArgs;
pub use history_cmd::HistoryArgs;
pub use report::NotifyFailureArgs;

/// Weekly Lotto 6/45 and Pension 720+ automation for dhlottery.co.kr
#[derive(Debug, Parser)]
#[command(name = "weekly-lotto", version)]
pub struct Cli {
    /// Config file; `./weekly-lotto.toml` is used when present
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Buy this week's ticket, at most once per window
    Buy(BuyArgs),

    /// Check this round's tickets against the latest draw
    Check(CheckArgs),

    /// List recent purchases grouped by round, newest first
    History(HistoryArgs),

    /// Send the generic failure report for another scheduled job
    NotifyFailure(NotifyFailureArgs),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ProductArg {
    /// Lotto 6/45
    Lotto,
    /// Pension 720+
    Pension,
}

impl From<ProductArg> for Product {
    fn from(arg: ProductArg) -> Self {
        match arg {
            ProductArg::Lotto => Product::Lotto645,
            ProductArg::Pension => Product::Pension720,
        }
    }
}

impl Cli {
    /// Run the command and return the process exit code.
    pub async fn run(self) -> i32 {
        let config = match load_config(self.config.as_deref()) {
            Ok(config) => config,
            Err(err) => {
                error!(error = %err, "configuration is invalid");
                return 1;
            }
        };

        let result = match self.command {
            Command::Buy(args) => buy_cmd::run(args, &config).await,
            Command::Check(args) => check_cmd::run(args, &config).await,
            Command::History(args) => history_cmd::run(args, &config).await,
            Command::NotifyFailure(args) => report::run_notify_failure(args, &config).await,
        };

        match result {
            Ok(()) => 0,
            Err(err) => {
                error!("{err:#}");
                1
            }
        }
    }
}

fn load_config(path: Option<&Path>) -> lotto_core::config::Result<AppConfig> {
    match path {
        Some(path) => ConfigLoader::new().with_file(path).load(),
        None => ConfigLoader::load_default(),
    }
}
