use clap::{Parser, Subcommand};

mod commands;

use commands::{AnalyzeArgs, DataStatusArgs, InferTradesArgs};

#[derive(Parser)]
#[command(name = "inst-flow")]
#[command(
    about = "Infer institutional trades from quarterly holdings and test them against forward returns",
    long_about = None
)]
struct Cli {
    /// Optional log file path (logs to file instead of stderr)
    #[arg(long, global = true)]
    log_file: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Infer per-manager trades from successive disclosures
    InferTrades(InferTradesArgs),
    /// Run the full pipeline: trades, exposure, return alignment and statistics
    Analyze(AnalyzeArgs),
    /// Show holdings and price coverage per ticker
    DataStatus(DataStatusArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    match &cli.log_file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)?;
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_writer(std::sync::Mutex::new(file))
                .init();
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }

    match cli.command {
        Commands::InferTrades(args) => commands::run_infer_trades(args).await?,
        Commands::Analyze(args) => commands::run_analyze(args).await?,
        Commands::DataStatus(args) => commands::run_data_status(args).await?,
    }

    Ok(())
}
