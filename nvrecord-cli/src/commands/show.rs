use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Args;
use colored::*;

use nvrecord_core::{
    check_overwrite, is_utilization_column, parse_timestamp, read_table, render_time_series,
    TIME_COLUMN,
};

use super::ensure_parent_dir;

/// Plot a recorded CSV file, one PNG chart per utilization column
#[derive(Args)]
pub struct ShowArgs {
    /// Input CSV file produced by `nvrecord start`
    #[arg(short, long)]
    pub input: PathBuf,

    /// Output path prefix; each chart is written to "<output> <column>.png"
    #[arg(short, long)]
    pub output: PathBuf,

    /// Overwrite chart files that already exist
    #[arg(short, long)]
    pub force_overwrite: bool,
}

pub async fn execute(args: ShowArgs) -> Result<()> {
    let table = read_table(&args.input)
        .with_context(|| format!("failed to read \"{}\"", args.input.display()))?;

    let times = table
        .column(TIME_COLUMN)
        .with_context(|| format!("\"{}\" has no \"Time\" column", args.input.display()))?;
    let (Some(first), Some(last)) = (times.first(), times.last()) else {
        bail!("\"{}\" contains no samples", args.input.display());
    };
    let start = parse_timestamp(first).context("failed to parse the first timestamp")?;
    let end = parse_timestamp(last).context("failed to parse the last timestamp")?;

    let mut rendered = 0usize;
    for column in table.headers() {
        if !is_utilization_column(column) {
            continue;
        }

        let path = PathBuf::from(format!("{} {}.png", args.output.display(), column));
        if let Err(e) = check_overwrite(&path, args.force_overwrite) {
            println!("{} {}", "Warning:".yellow().bold(), e);
            continue;
        }

        let values = match table.numeric_column(column) {
            Ok(values) => values,
            Err(e) => {
                println!("{} {}", "Error:".red().bold(), e);
                continue;
            }
        };

        if let Err(e) = ensure_parent_dir(&path) {
            println!(
                "{} cannot create output directory: {}",
                "Error:".red().bold(),
                e
            );
            continue;
        }

        // One chart per column; a bad column does not stop the rest
        match render_time_series(&values, &path, column, "Time", "%", start, end) {
            Ok(()) => {
                println!("Plot '{}' line chart to file \"{}\"", column, path.display());
                rendered += 1;
            }
            Err(e) => println!("{} {}", "Error:".red().bold(), e),
        }
    }

    if rendered == 0 {
        println!(
            "{} no utilization columns were rendered from \"{}\"",
            "Warning:".yellow().bold(),
            args.input.display()
        );
    }
    Ok(())
}
