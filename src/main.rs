use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use wallet_credit_scorer::{
    config::Settings,
    models::ScoreResult,
    scoring::{ScoreCalculator, ScoringWeights},
};

#[derive(Parser)]
#[clap(name = "wallet-credit-scorer")]
#[clap(about = "Credit-style scores for blockchain wallets", long_about = None)]
struct Cli {
    /// Settings file loaded on top of the built-in defaults
    #[clap(long, global = true)]
    config: Option<PathBuf>,

    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score a wallet address or ENS name
    Score {
        #[clap(short, long)]
        address: String,

        /// Print the result as JSON
        #[clap(long)]
        json: bool,
    },

    /// Report whether an address is a wallet or a contract
    Classify {
        #[clap(short, long)]
        address: String,
    },
}

fn load_settings(path: Option<&PathBuf>) -> anyhow::Result<Settings> {
    let settings = match path {
        Some(path) => Settings::from_file(path)?,
        None => Settings::new()?,
    };
    settings.validate().map_err(|e| anyhow::anyhow!(e))?;
    Ok(settings)
}

fn init_tracing(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn print_report(result: &ScoreResult, weights: &ScoringWeights) {
    println!("\n=== Wallet Credit Score ===");
    match &result.input {
        Some(input) => println!("Address: {} ({})", result.address, input),
        None => println!("Address: {}", result.address),
    }
    println!("Score: {:.2}/100", result.score);
    println!("Risk Level: {}", result.risk_level.as_str());
    println!("Band: {}", result.band.as_str());

    println!("\nBreakdown:");
    for (factor, value) in result.breakdown.factors() {
        println!(
            "  {:<16} {:>6.2}  (weight {:.0}%)",
            factor.display_name(),
            value,
            weights.fraction(factor) * 100.0
        );
    }

    let tips = result.improvement_tips();
    if !tips.is_empty() {
        println!("\nHow to improve:");
        for (factor, tip) in tips {
            println!("  - {}: {}", factor.display_name(), tip);
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let settings = load_settings(cli.config.as_ref())?;

    init_tracing(&settings.app.log_level);
    info!(app = %settings.app.name, chain_id = settings.provider.chain_id, "settings loaded");

    match cli.command {
        Commands::Score { address, json } => {
            let calculator = ScoreCalculator::from_settings(&settings)?;

            match calculator.compute_score(&address).await {
                Ok(result) if json => {
                    println!("{}", serde_json::to_string_pretty(&result)?);
                }
                Ok(result) => print_report(&result, &settings.scoring.weights),
                Err(e) => {
                    error!(address = %address, error = %e, "scoring failed");
                    return Err(e.into());
                }
            }
        }

        Commands::Classify { address } => {
            let calculator = ScoreCalculator::from_settings(&settings)?;
            let kind = calculator.classify(&address).await?;
            println!("{} {}", address.trim(), kind.as_str());
        }
    }

    Ok(())
}
