//! Harvest Bot storefront CLI
//!
//! Lists plans, runs a checkout against the payment API and shows the
//! community vouch feed and global stats.

mod commands;
mod config;
mod render;
mod terminal;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::commands::BuyOptions;
use crate::config::Settings;
use crate::render::OutputFormat;

#[derive(Parser)]
#[command(name = "harvest", version, about = "Harvest Bot plans, checkout and community feed")]
struct Cli {
    /// Output format (text or json)
    #[arg(long, global = true, default_value = "text", value_enum)]
    output: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the available plans
    Plans,

    /// Buy a plan and wait for the license key
    Buy {
        /// Plan name (weekly, monthly, bi-weekly)
        plan: String,
        /// Use the simulated payment service
        #[arg(long)]
        mock: bool,
        /// Stop waiting after this many status checks
        #[arg(long)]
        max_polls: Option<u64>,
        /// Copy the license key to the clipboard (OSC 52)
        #[arg(long)]
        copy: bool,
    },

    /// Show global farming stats
    Stats,

    /// Show recent community vouches
    Vouches {
        /// Keep refreshing and print new vouches as they arrive
        #[arg(long)]
        watch: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let runtime = tokio::runtime::Runtime::new()?;
    let result = runtime.block_on(run());
    // An abandoned retry prompt may still be blocked reading stdin
    runtime.shutdown_background();
    result
}

async fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let settings = Settings::from_env()?;
    tracing::debug!(api_url = %settings.api_url, mock = settings.mock, "Settings loaded");

    match cli.command {
        Commands::Plans => commands::plans(cli.output),
        Commands::Buy {
            plan,
            mock,
            max_polls,
            copy,
        } => {
            let options = BuyOptions {
                plan,
                mock,
                max_polls,
                copy,
            };
            commands::buy(&settings, options, cli.output).await
        }
        Commands::Stats => commands::stats(&settings, cli.output).await,
        Commands::Vouches { watch } => commands::vouches(&settings, watch, cli.output).await,
    }
}
