//! Colored console output for scan results.

use crate::types::{AvailabilityStatus, AvailabilityVerdict, Ecosystem, ScanReport};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

/// Console output handler with colors and formatting.
pub struct ConsoleOutput {
    verbose: bool,
    json_mode: bool,
    quiet: bool,
}

impl ConsoleOutput {
    /// Create a new console output handler.
    pub fn new(verbose: bool, json_mode: bool, quiet: bool) -> Self {
        Self { verbose, json_mode, quiet }
    }

    /// Print scan start message.
    pub fn print_scan_start(&self, manifest: &str, ecosystem: Ecosystem) {
        if self.json_mode || self.quiet {
            return;
        }

        println!(
            "{} Scanning {} as {}",
            "[*]".bright_blue(),
            manifest.bright_white(),
            ecosystem.to_string().bright_white()
        );
    }

    /// Print info message.
    pub fn print_info(&self, message: &str) {
        if self.json_mode || self.quiet {
            return;
        }

        println!("{} {}", "[*]".bright_blue(), message);
    }

    /// Print one resolved reference (only in verbose mode), above the progress bar if one is drawing.
    pub fn print_verdict(&self, verdict: &AvailabilityVerdict, pb: Option<&ProgressBar>) {
        let Some(line) = self.verdict_line(verdict) else {
            return;
        };
        match pb {
            Some(pb) => pb.println(line),
            None => println!("{}", line),
        }
    }

    fn verdict_line(&self, verdict: &AvailabilityVerdict) -> Option<String> {
        if self.json_mode || !self.verbose {
            return None;
        }

        let reference = &verdict.reference;
        let mut message = format!("{} {}", reference.display_name(), format_status(verdict.status));
        if !reference.version_spec.is_empty() {
            message.push_str(&format!(" ({})", reference.version_spec));
        }
        if reference.transitive {
            message.push_str(" [transitive]");
        }
        Some(format!("{} {}", "[.]".dimmed(), message.dimmed()))
    }

    /// Print scan summary and the flagged names.
    pub fn print_summary(&self, report: &ScanReport) {
        if self.json_mode {
            if let Ok(json) = serde_json::to_string_pretty(report) {
                println!("{}", json);
            }
            return;
        }

        // In quiet mode, only print if something was flagged
        if self.quiet && report.is_clean() {
            return;
        }

        if self.quiet {
            println!();
            println!(
                "{} Scanning {} as {}",
                "[*]".bright_blue(),
                report.manifest.bright_white(),
                report.ecosystem.to_string().bright_white()
            );
        }

        println!();
        println!("{}", "=== Scan Summary ===".bright_cyan());
        println!("  Manifest:  {}", report.manifest);
        println!("  Language:  {}", report.ecosystem);
        println!("  Duration:  {:.2}s", report.duration_secs);
        println!("  Packages:  {}", report.packages_found);
        println!();

        if report.is_clean() {
            println!(
                "{} {}",
                "[*]".bright_green(),
                "All packages seem to be available in the public repositories.".green()
            );
            println!();
            println!("In case your application uses private repositories please make sure that those namespaces in");
            println!("public repositories are controlled by a trusted party.");
        } else {
            println!(
                "{}",
                "Issues found, the following packages are not available in public package repositories:"
                    .red()
                    .bold()
            );
            for name in &report.flagged {
                println!(" {} {}", "[!]".red().bold(), name.bright_white());
            }
        }

        println!();
    }

    /// Create a progress bar.
    pub fn create_progress_bar(&self, total: u64, message: &str) -> Option<ProgressBar> {
        if self.json_mode || self.quiet || total == 0 {
            return None;
        }

        let pb = ProgressBar::new(total);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.cyan} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        {
            pb.set_style(style.progress_chars("#>-"));
        }
        pb.set_message(message.to_string());
        Some(pb)
    }
}

/// Format an availability status with color.
fn format_status(status: AvailabilityStatus) -> colored::ColoredString {
    match status {
        AvailabilityStatus::Public => "public".green(),
        AvailabilityStatus::External => "external source".dimmed(),
        AvailabilityStatus::NotPublic => "NOT PUBLIC".red().bold(),
        AvailabilityStatus::UnpublishedAll => "ALL VERSIONS UNPUBLISHED".on_red().white().bold(),
        AvailabilityStatus::Unknown => "unknown (lookup failed)".yellow(),
    }
}

impl Default for ConsoleOutput {
    fn default() -> Self {
        Self::new(false, false, false)
    }
}
