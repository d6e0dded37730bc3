//! # tgharvest CLI
//!
//! Command-line interface for the tgharvest library.

use std::fs::{File, OpenOptions};
use std::io;
use std::path::Path;
use std::process;
use std::sync::Mutex;
use std::time::Instant;

use clap::Parser as ClapParser;
use tracing::error;
use tracing_subscriber::{EnvFilter, prelude::*};

use tgharvest::cli::Args;
use tgharvest::core::{ChannelOutcome, RunReport};
use tgharvest::harvest::Orchestrator;
use tgharvest::platform::ExportSource;
use tgharvest::HarvestError;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    dotenvy::dotenv().ok();
    let args = <Args as ClapParser>::parse();

    if let Err(e) = init_logging(args.log_file.as_deref()) {
        eprintln!("❌ Error: cannot open log file: {}", e);
        process::exit(1);
    }

    if let Err(e) = run(args).await {
        error!(error = %e, "Harvest failed");
        eprintln!("❌ Error: {}", e);
        process::exit(1);
    }
}

/// Logs to stderr, and to `log_file` too when given. `RUST_LOG` overrides
/// the default `info` level.
fn init_logging(log_file: Option<&Path>) -> io::Result<()> {
    let file_layer = match log_file {
        Some(path) => Some(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(open_log_file(path)?)),
        ),
        None => None,
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .with(file_layer)
        .init();
    Ok(())
}

fn open_log_file(path: &Path) -> io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

async fn run(args: Args) -> Result<(), HarvestError> {
    let total_start = Instant::now();
    let config = args.to_config()?;
    let run_ctx = args.run_context()?;

    println!("📡 tgharvest v{}", env!("CARGO_PKG_VERSION"));
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("📂 Exports:  {}", args.export_root.display());
    println!("💾 Output:   {}", config.data_root.display());
    println!("📅 Date:     {}", run_ctx.token());
    println!("📄 Limit:    {} messages/channel", config.message_limit);
    println!("⏱️  Policy:   {}", config.rate_limit_policy);
    println!("📋 Channels: {}", config.channels.join(", "));
    println!();

    let source = ExportSource::new(&args.export_root);
    let mut orchestrator = Orchestrator::new(source, config)?;
    let report = orchestrator.run_for(run_ctx).await?;

    print_summary(&report);

    println!();
    println!(
        "⚡ Total time: {:.2}s",
        total_start.elapsed().as_secs_f64()
    );

    Ok(())
}

fn print_summary(report: &RunReport) {
    println!();
    println!("📊 Summary:");
    for outcome in &report.outcomes {
        match outcome {
            ChannelOutcome::Completed(summary) => println!(
                "   ✅ {}: {} messages, {} images ({} failed) -> {}",
                summary.key,
                summary.records,
                summary.images,
                summary.failed_images,
                summary.messages_file.display()
            ),
            ChannelOutcome::Abandoned { identifier, cause } => {
                println!("   ⏭️  {}: abandoned ({})", identifier, cause);
            }
        }
    }
    println!();
    println!(
        "   Channels:  {} completed, {} abandoned",
        report.completed(),
        report.abandoned()
    );
    println!("   Messages:  {}", report.total_records());
    println!("   Images:    {}", report.total_images());
}
