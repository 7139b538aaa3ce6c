//! Command execution, logging setup and summary reporting

use crate::cli::args::{Args, Command};
use crate::constants::LOG_TARGET;
use crate::models::ProcessingStats;
use crate::processor::{BatchProcessor, PayloadKind};
use anyhow::{Context, Result};
use colored::*;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Set up structured logging based on CLI arguments
pub fn setup_logging(args: &Args) {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let log_level = args.get_log_level();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{}={}", LOG_TARGET, log_level)));

    if args.quiet {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_level(true)
                    .with_writer(std::io::stderr)
                    .compact(),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_level(true)
                    .with_timer(fmt::time::uptime())
                    .with_writer(std::io::stderr),
            )
            .init();
    }

    debug!("Logging initialized at level: {}", log_level);
}

/// Run the selected command
pub async fn run(args: Args, cancellation_token: CancellationToken) -> Result<ProcessingStats> {
    let config = args.resolve_config()?;

    let (io, kind, interval) = match &args.command {
        Command::Normalize { io, .. } => (io, PayloadKind::Normalize, None),
        Command::Sample { io, interval } => (io, PayloadKind::Sample, *interval),
        Command::Extract {
            io,
            measurement,
            interval,
        } => (io, PayloadKind::Extract(*measurement), *interval),
    };

    let processor = BatchProcessor::new(io.input.clone(), io.output.clone(), kind)
        .with_context(|| format!("Cannot process {}", io.input.display()))?
        .with_config(config)
        .with_interval_override(interval)
        .with_progress(!args.quiet);

    println!("{}", "Starting sensor payload processing".bright_green().bold());
    println!("  {} {}", "Input:".bright_cyan(), io.input.display());
    println!("  {} {}", "Output:".bright_cyan(), processor.output_dir().display());
    if let PayloadKind::Extract(measurement) = kind {
        println!(
            "  {} {} ({})",
            "Measurement:".bright_cyan(),
            measurement.key(),
            measurement.unit()
        );
    }

    let stats = processor.process(cancellation_token).await?;
    print_summary(&stats);
    Ok(stats)
}

fn print_summary(stats: &ProcessingStats) {
    println!("\n{}", "Processing Summary".bright_green().bold());
    println!(
        "  {} {}ms",
        "Time elapsed:".bright_cyan(),
        stats.processing_time_ms.to_string().bright_white()
    );
    println!(
        "  {} {}",
        "Files processed:".bright_cyan(),
        stats.files_processed.to_string().bright_white()
    );
    if stats.files_failed > 0 {
        println!(
            "  {} {}",
            "Files failed:".bright_red(),
            stats.files_failed.to_string().bright_red().bold()
        );
    }
    println!(
        "  {} {} -> {}",
        "Items:".bright_cyan(),
        stats.items_in.to_string().bright_white(),
        stats.items_out.to_string().bright_white().bold()
    );
    if stats.records_skipped > 0 {
        println!(
            "  {} {}",
            "Records skipped:".bright_yellow(),
            stats.records_skipped.to_string().bright_yellow()
        );
    }
}
