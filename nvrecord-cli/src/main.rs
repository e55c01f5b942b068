use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber;

mod commands;

/// nvrecord - GPU utilization recorder
#[derive(Parser)]
#[command(name = "nvrecord")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Verbose mode (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start monitoring GPU utilization
    Start(commands::start::StartArgs),

    /// Plot a recorded GPU utilization CSV file
    Show(commands::show::ShowArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(log_level)
        .with_target(false)
        .with_thread_ids(false)
        .with_line_number(cli.verbose > 1)
        .init();

    // Execute command
    match cli.command {
        Commands::Start(args) => commands::start::execute(args).await?,
        Commands::Show(args) => commands::show::execute(args).await?,
    }

    Ok(())
}
