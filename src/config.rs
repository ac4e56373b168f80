//! Configuration handling for the scanner.

use crate::types::{Ecosystem, RegistryConfig};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Dependency confusion scanner for package manifests.
#[derive(Parser, Debug, Clone)]
#[command(name = "confusion-scan")]
#[command(author, version, about, long_about = None)]
pub struct Config {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Scan a manifest for dependency confusion exposure
    Scan(ScanConfig),
    /// List supported languages and the manifests they read
    Ecosystems,
}

/// Configuration for the scan command.
#[derive(Parser, Debug, Clone)]
pub struct ScanConfig {
    /// Manifest or lockfile to scan
    pub manifest: PathBuf,

    /// Package manager of the manifest (npm, pip, pipenv, composer, mvn, rubygems)
    #[arg(short = 'l', long = "lang", default_value = "npm")]
    pub ecosystem: Ecosystem,

    /// Comma-separated known-safe name globs, e.g. "@myorg/*,internal-*"
    #[arg(short = 's', long, env = "CONFUSION_SAFE_SPACES", default_value = "")]
    pub safe_spaces: String,

    /// Output results as JSON
    #[arg(long)]
    pub json: bool,

    /// Write the JSON report to this file as well
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Request timeout in seconds
    #[arg(long, default_value = "30")]
    pub timeout: u64,

    /// Rate limit (requests per second)
    #[arg(long, default_value = "10")]
    pub rate_limit: u32,

    /// Number of references resolved in parallel (default: 1)
    #[arg(long, short = 'p', default_value = "1")]
    pub concurrency: usize,

    /// Query the registry for every reference, even repeated ones
    #[arg(long)]
    pub no_cache: bool,

    /// Custom User-Agent string
    #[arg(long)]
    pub user_agent: Option<String>,

    /// Quiet mode: only show output when something is flagged
    #[arg(short = 'q', long)]
    pub quiet: bool,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            manifest: PathBuf::from("package.json"),
            ecosystem: Ecosystem::Npm,
            safe_spaces: String::new(),
            json: false,
            output: None,
            timeout: 30,
            rate_limit: 10,
            concurrency: 1,
            no_cache: false,
            user_agent: None,
            quiet: false,
        }
    }
}

impl ScanConfig {
    /// Get registry configuration from scan config.
    pub fn registry_config(&self) -> RegistryConfig {
        let defaults = RegistryConfig::default();
        RegistryConfig {
            timeout_secs: self.timeout,
            user_agent: self.user_agent.clone().unwrap_or(defaults.user_agent),
            rate_limit: self.rate_limit,
            cache: !self.no_cache,
            ..defaults
        }
    }

    /// Label used for the manifest in output.
    pub fn manifest_label(&self) -> String {
        self.manifest.display().to_string()
    }

    /// Read the manifest bytes.
    pub fn read_manifest(&self) -> crate::types::Result<Vec<u8>> {
        Ok(std::fs::read(&self.manifest)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_defaults() {
        let config = Config::try_parse_from(["confusion-scan", "scan", "package.json"]).unwrap();
        let Commands::Scan(scan) = config.command else {
            panic!("expected scan command");
        };
        assert_eq!(scan.ecosystem, Ecosystem::Npm);
        assert_eq!(scan.concurrency, 1);

        let registry = scan.registry_config();
        assert_eq!(registry.backoff_secs, 10);
        assert_eq!(registry.max_retries, 3);
        assert!(registry.cache);
    }

    #[test]
    fn test_lang_aliases() {
        for (lang, expected) in [
            ("mvn", Ecosystem::Maven),
            ("maven", Ecosystem::Maven),
            ("gem", Ecosystem::RubyGems),
            ("pipenv", Ecosystem::Pipenv),
        ] {
            let config = Config::try_parse_from(["confusion-scan", "scan", "-l", lang, "manifest"]).unwrap();
            let Commands::Scan(scan) = config.command else {
                panic!("expected scan command");
            };
            assert_eq!(scan.ecosystem, expected);
        }
    }

    #[test]
    fn test_unknown_lang_rejected() {
        assert!(Config::try_parse_from(["confusion-scan", "scan", "-l", "cargo", "Cargo.toml"]).is_err());
    }

    #[test]
    fn test_registry_overrides() {
        let config = Config::try_parse_from([
            "confusion-scan",
            "scan",
            "--no-cache",
            "--timeout",
            "5",
            "--user-agent",
            "audit/1.0",
            "requirements.txt",
        ])
        .unwrap();
        let Commands::Scan(scan) = config.command else {
            panic!("expected scan command");
        };
        let registry = scan.registry_config();
        assert!(!registry.cache);
        assert_eq!(registry.timeout_secs, 5);
        assert_eq!(registry.user_agent, "audit/1.0");
    }
}
