use clap::Parser;
use lotto_cli::Cli;
use tracing_subscriber::EnvFilter;

fn main() {
    // Loaded before parsing so `.env` can supply DRY_RUN and friends.
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    std::process::exit(run(cli));
}

#[tokio::main]
async fn run(cli: Cli) -> i32 {
    cli.run().await
}
