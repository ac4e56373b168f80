//! pip `requirements.txt` resolver.

use crate::types::{Ecosystem, PackageReference, Result};
use async_trait::async_trait;
use tracing::trace;

pub(crate) const PYPI_URL: &str = "https://pypi.org/project";

/// Characters that end the project name in a requirement line.
const NAME_DELIMITERS: &[char] = &['=', '<', '>', '!', '~', '#', ' ', '[', ';', '@'];

pub struct PipResolver;

/// Splits text into logical requirement lines, joining backslash continuations.
fn logical_lines(text: &str) -> Vec<String> {
    let mut lines = Vec::new();
    let mut pending = String::new();

    for physical in text.lines() {
        let line = physical.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if let Some(head) = line.strip_suffix('\\') {
            pending.push_str(head);
            continue;
        }

        pending.push_str(line);
        lines.push(std::mem::take(&mut pending));
    }

    if !pending.trim().is_empty() {
        lines.push(pending);
    }

    lines
}

/// Project name of a requirement line, if it has one.
fn requirement_name(line: &str) -> Option<&str> {
    line.split(NAME_DELIMITERS)
        .next()
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

#[async_trait]
impl super::PackageResolver for PipResolver {
    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Pip
    }

    fn parse(&self, raw: &[u8]) -> Result<Vec<PackageReference>> {
        let text = String::from_utf8_lossy(raw);
        let mut packages = Vec::new();

        for line in logical_lines(&text) {
            // -r, -e, --index-url and friends are pip options, not requirements
            if line.starts_with('-') {
                trace!("Skipping pip option line: {}", line);
                continue;
            }

            if let Some(name) = requirement_name(&line) {
                let version_spec = line[line.find(name).unwrap_or(0) + name.len()..].trim();
                packages.push(PackageReference::new(name, version_spec, Ecosystem::Pip));
            }
        }

        Ok(packages)
    }

    fn registry_url(&self, reference: &PackageReference) -> Option<String> {
        Some(format!("{}/{}/", PYPI_URL, super::encode_name(&reference.name)))
    }
}
