//! Core types and errors for the dependency confusion scanner.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors that can occur during scanning.
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("XML parse error: {0}")]
    XmlError(#[from] quick_xml::Error),

    #[error("Malformed POM: {0}")]
    PomError(String),

    #[error("Pipfile parse error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

pub type Result<T> = std::result::Result<T, ScanError>;

/// Package ecosystem selected for a scan.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Ecosystem {
    Npm,
    Pip,
    Pipenv,
    Composer,
    Maven,
    RubyGems,
}

impl Ecosystem {
    pub const ALL: [Ecosystem; 6] = [
        Ecosystem::Npm,
        Ecosystem::Pip,
        Ecosystem::Pipenv,
        Ecosystem::Composer,
        Ecosystem::Maven,
        Ecosystem::RubyGems,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Ecosystem::Npm => "npm",
            Ecosystem::Pip => "pip",
            Ecosystem::Pipenv => "pipenv",
            Ecosystem::Composer => "composer",
            Ecosystem::Maven => "mvn",
            Ecosystem::RubyGems => "rubygems",
        }
    }

    /// Manifest file this ecosystem's parser reads.
    pub fn manifest_hint(&self) -> &'static str {
        match self {
            Ecosystem::Npm => "package.json",
            Ecosystem::Pip => "requirements.txt",
            Ecosystem::Pipenv => "Pipfile",
            Ecosystem::Composer => "composer.json, composer.lock, installed.json",
            Ecosystem::Maven => "pom.xml",
            Ecosystem::RubyGems => "Gemfile.lock",
        }
    }
}

impl fmt::Display for Ecosystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Ecosystem {
    type Err = ScanError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "npm" => Ok(Ecosystem::Npm),
            "pip" => Ok(Ecosystem::Pip),
            "pipenv" => Ok(Ecosystem::Pipenv),
            "composer" => Ok(Ecosystem::Composer),
            "mvn" | "maven" => Ok(Ecosystem::Maven),
            "rubygems" | "gem" | "gems" => Ok(Ecosystem::RubyGems),
            other => Err(ScanError::ConfigError(format!(
                "Unknown package repository system: {}. Use: npm, pip, pipenv, composer, mvn, rubygems",
                other
            ))),
        }
    }
}

/// A package name declared (or locked) by a manifest.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PackageReference {
    /// Registry name (artifactId for Maven).
    pub name: String,
    /// Version or location exactly as written in the manifest.
    pub version_spec: String,
    pub ecosystem: Ecosystem,
    /// Resolved as a dependency of a dependency (RubyGems lockfiles only).
    pub transitive: bool,
    /// Maven groupId.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    /// Source the lockfile resolved this entry from (RubyGems `remote:`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote: Option<String>,
}

impl PackageReference {
    pub fn new(name: impl Into<String>, version_spec: impl Into<String>, ecosystem: Ecosystem) -> Self {
        Self {
            name: name.into(),
            version_spec: version_spec.into(),
            ecosystem,
            transitive: false,
            group: None,
            remote: None,
        }
    }

    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    pub fn with_remote(mut self, remote: impl Into<String>) -> Self {
        self.remote = Some(remote.into());
        self
    }

    pub fn with_transitive(mut self, transitive: bool) -> Self {
        self.transitive = transitive;
        self
    }

    /// Key used against the public registry.
    pub fn lookup_key(&self) -> &str {
        match self.ecosystem {
            Ecosystem::Maven => self.group.as_deref().unwrap_or(""),
            _ => &self.name,
        }
    }

    /// Name shown in reports and matched by exemption patterns.
    pub fn display_name(&self) -> String {
        match (&self.ecosystem, self.group.as_deref()) {
            (Ecosystem::Maven, Some(group)) if !group.is_empty() => format!("{}/{}", group, self.name),
            _ => self.name.clone(),
        }
    }

    /// The lockfile remote is not an HTTP(S) source.
    pub fn is_local(&self) -> bool {
        !self.remote.as_deref().unwrap_or("").starts_with("http")
    }

    /// The lockfile remote is the public rubygems.org index.
    pub fn is_rubygems(&self) -> bool {
        self.remote
            .as_deref()
            .unwrap_or("")
            .starts_with("https://rubygems.org")
    }
}

/// Claim state of a package name in its public registry.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AvailabilityStatus {
    /// Name is claimed in the public registry.
    Public,
    /// Name is free in the public registry.
    NotPublic,
    /// Name exists but every version was unpublished, so it can be re-registered.
    UnpublishedAll,
    /// No answer could be obtained (transport failure or retries exhausted).
    Unknown,
    /// Reference points at a non-registry source and was not queried.
    External,
}

impl AvailabilityStatus {
    /// Whether a verdict with this status ends up in the flagged list.
    pub fn is_flagged(&self) -> bool {
        matches!(
            self,
            AvailabilityStatus::NotPublic | AvailabilityStatus::UnpublishedAll | AvailabilityStatus::Unknown
        )
    }
}

/// Outcome for one package reference occurrence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailabilityVerdict {
    pub reference: PackageReference,
    pub status: AvailabilityStatus,
}

/// Complete result of scanning one manifest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanReport {
    pub ecosystem: Ecosystem,
    /// Label of the scanned manifest (usually its path).
    pub manifest: String,
    pub packages_found: usize,
    pub verdicts: Vec<AvailabilityVerdict>,
    /// Flagged names after exemptions, in manifest order.
    pub flagged: Vec<String>,
    pub duration_secs: f64,
}

impl ScanReport {
    pub fn is_clean(&self) -> bool {
        self.flagged.is_empty()
    }
}

/// Configuration for registry requests.
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    pub timeout_secs: u64,
    pub user_agent: String,
    /// Outbound requests per second.
    pub rate_limit: u32,
    pub backoff_secs: u64,
    pub max_retries: u32,
    pub cache: bool,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            user_agent: "confusion-scan/0.1".to_string(),
            rate_limit: 10,
            backoff_secs: 10,
            max_retries: 3,
            cache: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ecosystem_aliases() {
        assert_eq!("mvn".parse::<Ecosystem>().unwrap(), Ecosystem::Maven);
        assert_eq!("Maven".parse::<Ecosystem>().unwrap(), Ecosystem::Maven);
        assert_eq!("gem".parse::<Ecosystem>().unwrap(), Ecosystem::RubyGems);
        assert!("cargo".parse::<Ecosystem>().is_err());
    }

    #[test]
    fn test_maven_lookup_key_is_group() {
        let reference = PackageReference::new("junit", "4.13", Ecosystem::Maven).with_group("org.junit");
        assert_eq!(reference.lookup_key(), "org.junit");
        assert_eq!(reference.display_name(), "org.junit/junit");
    }

    #[test]
    fn test_rubygems_remote_flags() {
        let gem = PackageReference::new("rack", "(2.2.3)", Ecosystem::RubyGems)
            .with_remote("https://rubygems.org/");
        assert!(!gem.is_local());
        assert!(gem.is_rubygems());

        let local = PackageReference::new("mygem", "(0.1.0)", Ecosystem::RubyGems).with_remote("vendor/mygem");
        assert!(local.is_local());
        assert!(!local.is_rubygems());
    }

    #[test]
    fn test_flagged_statuses() {
        assert!(!AvailabilityStatus::Public.is_flagged());
        assert!(!AvailabilityStatus::External.is_flagged());
        assert!(AvailabilityStatus::NotPublic.is_flagged());
        assert!(AvailabilityStatus::UnpublishedAll.is_flagged());
        assert!(AvailabilityStatus::Unknown.is_flagged());
    }
}
