//! confusion-scan - Dependency confusion scanner for package manifests.
//!
//! CLI entry point.

use clap::Parser;
use colored::Colorize;
use confusion_scan::{Commands, Config, Ecosystem, ScanConfig, Scanner};
use std::fs;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Nothing flagged.
const EXIT_CLEAN: u8 = 0;
/// At least one name flagged.
const EXIT_FLAGGED: u8 = 1;
/// Unreadable manifest, fatal parse error or bad configuration.
const EXIT_ERROR: u8 = 2;

#[tokio::main]
async fn main() -> ExitCode {
    let config = Config::parse();

    // Set up logging
    let filter = if config.verbose {
        EnvFilter::new("confusion_scan=debug,info")
    } else {
        EnvFilter::new("confusion_scan=info,warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match config.command.clone() {
        Commands::Scan(scan_config) => match run_scan(scan_config, config.verbose).await {
            Ok(code) | Err(code) => ExitCode::from(code),
        },
        Commands::Ecosystems => {
            print_ecosystems();
            ExitCode::from(EXIT_CLEAN)
        }
    }
}

async fn run_scan(scan_config: ScanConfig, verbose: bool) -> Result<u8, u8> {
    let raw = scan_config.read_manifest().map_err(|e| {
        error!("Failed to read manifest {}: {}", scan_config.manifest_label(), e);
        EXIT_ERROR
    })?;

    let scanner = Scanner::new(&scan_config, verbose).map_err(|e| {
        error!("Failed to create scanner: {}", e);
        EXIT_ERROR
    })?;

    // Print banner unless JSON mode
    if !scan_config.json && !scan_config.quiet {
        print_banner();
    }

    let report = scanner
        .scan(scan_config.ecosystem, &scan_config.manifest_label(), &raw)
        .await
        .map_err(|e| {
            error!("Scan of {} failed: {}", scan_config.manifest_label(), e);
            EXIT_ERROR
        })?;

    if let Some(ref output_path) = scan_config.output {
        let json = serde_json::to_string_pretty(&report).map_err(|e| {
            error!("Failed to serialize report: {}", e);
            EXIT_ERROR
        })?;
        fs::write(output_path, &json).map_err(|e| {
            error!("Failed to write output file: {}", e);
            EXIT_ERROR
        })?;
        info!("Results written to: {:?}", output_path);
    }

    if report.is_clean() {
        Ok(EXIT_CLEAN)
    } else {
        Ok(EXIT_FLAGGED)
    }
}

fn print_ecosystems() {
    println!("{}", "Supported languages:".bright_cyan());
    for ecosystem in Ecosystem::ALL {
        println!("  {:<10} {}", ecosystem.as_str().bright_white(), ecosystem.manifest_hint().dimmed());
    }
}

fn print_banner() {
    println!();
    println!("\x1b[36m╔══════════════════════════════════════════════════════════════╗\x1b[0m");
    println!("\x1b[36m║                  CONFUSION-SCAN v0.1.0                       ║\x1b[0m");
    println!("\x1b[36m║         Dependency Confusion Manifest Scanner                ║\x1b[0m");
    println!("\x1b[36m╚══════════════════════════════════════════════════════════════╝\x1b[0m");
    println!();
}
