//! confusion-scan - Dependency confusion scanner for package manifests.
//!
//! This library detects dependency confusion exposure by:
//! - Extracting package references from npm, pip, pipenv, composer, maven
//!   and rubygems manifests
//! - Skipping references that never resolve through a public registry
//! - Querying each public registry for the remaining names
//! - Flagging names that are missing or fully unpublished, minus known-safe globs
//!
//! # Example
//!
//! ```no_run
//! use confusion_scan::{Ecosystem, ScanConfig, Scanner};
//!
//! #[tokio::main]
//! async fn main() {
//!     let scanner = Scanner::new(&ScanConfig::default(), false).unwrap();
//!     let raw = std::fs::read("package.json").unwrap();
//!     let report = scanner.scan(Ecosystem::Npm, "package.json", &raw).await.unwrap();
//!     println!("{} names flagged", report.flagged.len());
//! }
//! ```

pub mod classify;
pub mod config;
pub mod ecosystem;
pub mod exempt;
pub mod notify;
pub mod registry;
pub mod scanner;
pub mod types;

pub use config::{Commands, Config, ScanConfig};
pub use ecosystem::{resolver_for, PackageResolver};
pub use exempt::ExemptionFilter;
pub use scanner::Scanner;
pub use types::{
    AvailabilityStatus, AvailabilityVerdict, Ecosystem, PackageReference, RegistryConfig, Result,
    ScanError, ScanReport,
};
