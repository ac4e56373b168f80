//! Main scanner orchestrating parsing, resolution and exemptions.

use crate::config::ScanConfig;
use crate::ecosystem::{resolver_for, PackageResolver};
use crate::exempt::ExemptionFilter;
use crate::notify::ConsoleOutput;
use crate::registry::RegistryChecker;
use crate::types::{AvailabilityVerdict, Ecosystem, PackageReference, Result, ScanReport};
use futures::stream::{self, StreamExt};
use std::time::Instant;
use tracing::debug;

/// Scans one manifest at a time against the public registries.
pub struct Scanner {
    registry: RegistryChecker,
    exemptions: ExemptionFilter,
    concurrency: usize,
    console: ConsoleOutput,
}

impl Scanner {
    /// Create a scanner from CLI configuration.
    pub fn new(config: &ScanConfig, verbose: bool) -> Result<Self> {
        let registry = RegistryChecker::new(&config.registry_config())?;

        Ok(Self::with_registry(registry)
            .with_exemptions(&config.safe_spaces)
            .with_concurrency(config.concurrency)
            .with_console(ConsoleOutput::new(verbose, config.json, config.quiet)))
    }

    /// Create a scanner over an existing registry checker, sequential and silent.
    pub fn with_registry(registry: RegistryChecker) -> Self {
        Self {
            registry,
            exemptions: ExemptionFilter::default(),
            concurrency: 1,
            console: ConsoleOutput::new(false, false, true),
        }
    }

    /// Comma-separated known-safe globs.
    pub fn with_exemptions(mut self, safe_spaces: &str) -> Self {
        self.exemptions = ExemptionFilter::parse(safe_spaces);
        self
    }

    /// Number of references resolved at once. Order of results is unaffected.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn with_console(mut self, console: ConsoleOutput) -> Self {
        self.console = console;
        self
    }

    /// Scan raw manifest bytes.
    ///
    /// # Errors
    ///
    /// Only fatal parse errors abort the scan; registry failures are
    /// folded into the verdicts.
    pub async fn scan(&self, ecosystem: Ecosystem, manifest: &str, raw: &[u8]) -> Result<ScanReport> {
        let start_time = Instant::now();
        self.console.print_scan_start(manifest, ecosystem);

        let resolver = resolver_for(ecosystem);
        let references = resolver.parse(raw)?;
        self.console
            .print_info(&format!("Extracted {} package references", references.len()));

        let packages_found = references.len();
        let verdicts = self.resolve_all(resolver.as_ref(), references).await;

        let flagged_names: Vec<String> = verdicts
            .iter()
            .filter(|v| v.status.is_flagged())
            .map(|v| v.reference.display_name())
            .collect();
        let flagged_count = flagged_names.len();
        let flagged = self.exemptions.filter(flagged_names);
        if flagged.len() != flagged_count {
            debug!("{} flagged names exempted as known-safe", flagged_count - flagged.len());
        }

        let report = ScanReport {
            ecosystem,
            manifest: manifest.to_string(),
            packages_found,
            verdicts,
            flagged,
            duration_secs: start_time.elapsed().as_secs_f64(),
        };

        self.console.print_summary(&report);

        Ok(report)
    }

    async fn resolve_all(
        &self,
        resolver: &dyn PackageResolver,
        references: Vec<PackageReference>,
    ) -> Vec<AvailabilityVerdict> {
        let pb = self
            .console
            .create_progress_bar(references.len() as u64, "Checking registry");
        let progress = pb.as_ref();
        let registry = &self.registry;
        let console = &self.console;

        let verdicts: Vec<AvailabilityVerdict> = stream::iter(references)
            .map(|reference| async move {
                let status = resolver.resolve(&reference, registry).await;
                if let Some(pb) = progress {
                    pb.inc(1);
                }
                let verdict = AvailabilityVerdict { reference, status };
                console.print_verdict(&verdict, progress);
                verdict
            })
            .buffered(self.concurrency)
            .collect()
            .await;

        if let Some(pb) = pb {
            pb.finish_and_clear();
        }

        verdicts
    }
}
