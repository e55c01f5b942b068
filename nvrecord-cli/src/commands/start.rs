use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Args;
use colored::*;
use tracing::info;

use nvrecord_core::{check_overwrite, write_series, Sampler, SamplerOptions};
use nvrecord_device::NvmlProbe;

use super::ensure_parent_dir;

/// Record GPU utilization at a fixed interval
#[derive(Args)]
pub struct StartArgs {
    /// Sampling interval in seconds
    #[arg(short, long, default_value_t = 0.05)]
    pub interval: f64,

    /// Total duration in seconds; records until Ctrl+C when omitted
    #[arg(short, long)]
    pub duration: Option<f64>,

    /// Output CSV file path; samples are printed to the console when omitted
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Overwrite the output file if it already exists
    #[arg(short, long)]
    pub force_overwrite: bool,
}

pub async fn execute(args: StartArgs) -> Result<()> {
    // Validate timing arguments
    let interval = Duration::try_from_secs_f64(args.interval)
        .ok()
        .filter(|d| !d.is_zero())
        .context("interval must be a positive number of seconds")?;
    let duration = match args.duration {
        Some(seconds) => match Duration::try_from_secs_f64(seconds) {
            Ok(d) => Some(d),
            Err(_) => bail!("duration must be a non-negative number of seconds"),
        },
        None => None,
    };

    // Warn up front rather than after minutes of recording; the guard is
    // checked again when the file is written.
    if let Some(path) = &args.output {
        if let Err(e) = check_overwrite(path, args.force_overwrite) {
            println!("{} {}", "Warning:".yellow().bold(), e);
        }
    }

    // Initialize the device backend
    let probe = Arc::new(NvmlProbe::new().context("failed to initialize GPU monitoring")?);
    println!(
        "Recording {} GPU(s), driver {}",
        probe.device_count(),
        probe
            .driver_version()
            .unwrap_or_else(|_| "unknown".to_string())
    );

    let mut sampler = Sampler::new(probe);
    sampler.start(SamplerOptions {
        interval,
        echo: args.output.is_none(),
    })?;
    println!("{}", "Press Ctrl+C to stop recording.".cyan());

    // Ctrl+C ends the session early in both timed and open-ended runs
    let handle = sampler.shutdown_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            println!();
            info!("interrupt received, stopping");
            handle.trigger();
        }
    });

    match duration {
        Some(limit) => {
            tokio::select! {
                _ = tokio::time::sleep(limit) => {}
                _ = sampler.wait_until_stopped() => {}
            }
        }
        None => sampler.wait_until_stopped().await,
    }
    let session = sampler.stop().await;

    // Export whatever was collected, then surface a session failure
    let series = sampler.samples();
    if let Some(path) = &args.output {
        match check_overwrite(path, args.force_overwrite) {
            Ok(()) => {
                if let Err(e) = ensure_parent_dir(path) {
                    println!(
                        "{} cannot create output directory: {}",
                        "Error:".red().bold(),
                        e
                    );
                } else {
                    match write_series(&series, path) {
                        Ok(()) => println!(
                            "Output data to file \"{}\" ({} samples)",
                            path.display(),
                            series.len()
                        ),
                        Err(e) => println!("{} {}", "Error:".red().bold(), e),
                    }
                }
            }
            Err(e) => println!("{} {}", "Warning:".yellow().bold(), e),
        }
    }

    session.context("recording session failed")?;
    Ok(())
}
