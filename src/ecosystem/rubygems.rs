//! Bundler `Gemfile.lock` resolver.

use crate::registry::{BodyCheck, RegistryChecker};
use crate::types::{AvailabilityStatus, Ecosystem, PackageReference, Result};
use async_trait::async_trait;
use tracing::{debug, trace};

const RUBYGEMS_API_URL: &str = "https://rubygems.org/api/v1/gems";

/// Lockfile indentation of a gem resolved under another gem.
const TRANSITIVE_INDENT: usize = 6;

/// Section headers and source attributes that carry no gem.
const STRUCTURAL_MARKERS: &[&str] = &["GIT", "GEM", "PATH", "specs:"];
const SOURCE_ATTRIBUTES: &[&str] = &["revision:", "branch:", "tag:", "ref:", "glob:", "submodules:"];

/// Everything after this header is platform and bundler metadata.
const END_MARKER: &str = "PLATFORMS";

pub struct RubyGemsResolver;

fn leading_spaces(line: &str) -> usize {
    line.len() - line.trim_start_matches(' ').len()
}

#[async_trait]
impl super::PackageResolver for RubyGemsResolver {
    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::RubyGems
    }

    fn parse(&self, raw: &[u8]) -> Result<Vec<PackageReference>> {
        let text = String::from_utf8_lossy(raw);
        let mut packages = Vec::new();
        let mut remote = String::new();

        for line in text.lines() {
            let trimmed = line.trim();

            if trimmed.is_empty() {
                continue;
            }
            if trimmed == END_MARKER {
                break;
            }
            if let Some(value) = trimmed.strip_prefix("remote:") {
                remote = value.trim().to_string();
                continue;
            }
            if STRUCTURAL_MARKERS.contains(&trimmed)
                || SOURCE_ATTRIBUTES.iter().any(|attr| trimmed.starts_with(attr))
            {
                trace!("Skipping lockfile marker: {}", trimmed);
                continue;
            }

            let (name, version) = match trimmed.split_once(' ') {
                Some((name, version)) => (name.trim(), version.trim()),
                None => (trimmed, ""),
            };

            packages.push(
                PackageReference::new(name, version, Ecosystem::RubyGems)
                    .with_remote(remote.as_str())
                    .with_transitive(leading_spaces(line) == TRANSITIVE_INDENT),
            );
        }

        Ok(packages)
    }

    fn registry_url(&self, reference: &PackageReference) -> Option<String> {
        Some(format!("{}/{}.json", RUBYGEMS_API_URL, super::encode_name(&reference.name)))
    }

    fn body_check(&self) -> BodyCheck {
        BodyCheck::GemMetadata
    }

    async fn resolve(&self, reference: &PackageReference, registry: &RegistryChecker) -> AvailabilityStatus {
        if reference.is_local() || !reference.is_rubygems() {
            debug!(
                "Skipping {}: resolved from {}",
                reference.name,
                reference.remote.as_deref().unwrap_or("an unknown source")
            );
            return AvailabilityStatus::External;
        }

        match self.registry_url(reference) {
            Some(url) => registry.check(&url, self.body_check()).await,
            None => AvailabilityStatus::Public,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecosystem::PackageResolver;
    use crate::registry::testing::{FakeTransport, RecordingSleeper};
    use std::sync::Arc;

    const LOCKFILE: &str = "\
GIT
  remote: https://github.com/acme/private-gem.git
  revision: 0123456789abcdef
  branch: main
  specs:
    private-gem (0.3.0)

PATH
  remote: vendor/local-gem
  specs:
    local-gem (0.1.0)

GEM
  remote: https://rubygems.org/
  specs:
    rack (2.2.8)
    rails (7.1.0)
      actionpack (= 7.1.0)

PLATFORMS
  ruby

DEPENDENCIES
  rails
";

    #[test]
    fn test_direct_and_transitive_entries() {
        let lockfile = "GEM\n  remote: https://rubygems.org/\n  specs:\n    rack (2.2.8)\n      rack-test (2.1.0)\n";
        let refs = RubyGemsResolver.parse(lockfile.as_bytes()).unwrap();

        assert_eq!(refs.len(), 2);
        assert_eq!(refs[0].name, "rack");
        assert!(!refs[0].transitive);
        assert_eq!(refs[1].name, "rack-test");
        assert!(refs[1].transitive);
        assert!(refs.iter().all(|r| r.is_rubygems() && !r.is_local()));
        assert_eq!(refs[0].version_spec, "(2.2.8)");
    }

    #[test]
    fn test_sections_and_remotes() {
        let refs = RubyGemsResolver.parse(LOCKFILE.as_bytes()).unwrap();
        let names: Vec<&str> = refs.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["private-gem", "local-gem", "rack", "rails", "actionpack"]);

        assert_eq!(refs[0].remote.as_deref(), Some("https://github.com/acme/private-gem.git"));
        assert!(!refs[0].is_rubygems());
        assert!(refs[1].is_local());
        assert_eq!(refs[4].version_spec, "(= 7.1.0)");
        assert!(refs[4].transitive);
    }

    #[test]
    fn test_stops_at_platforms() {
        let refs = RubyGemsResolver.parse(LOCKFILE.as_bytes()).unwrap();
        assert!(refs.iter().all(|r| r.name != "ruby"));
    }

    #[tokio::test]
    async fn test_non_rubygems_sources_not_queried() {
        let transport = Arc::new(
            FakeTransport::new().respond(
                "https://rubygems.org/api/v1/gems/rack.json",
                200,
                r#"{"name":"rack","downloads":100,"version":"2.2.8"}"#,
            ),
        );
        let registry = RegistryChecker::with_transport(transport.clone(), Arc::new(RecordingSleeper::default()));
        let refs = RubyGemsResolver.parse(LOCKFILE.as_bytes()).unwrap();

        assert_eq!(RubyGemsResolver.resolve(&refs[0], &registry).await, AvailabilityStatus::External);
        assert_eq!(RubyGemsResolver.resolve(&refs[1], &registry).await, AvailabilityStatus::External);
        assert_eq!(RubyGemsResolver.resolve(&refs[2], &registry).await, AvailabilityStatus::Public);
        assert_eq!(RubyGemsResolver.resolve(&refs[3], &registry).await, AvailabilityStatus::NotPublic);
        assert_eq!(
            transport.requests(),
            vec![
                "https://rubygems.org/api/v1/gems/rack.json".to_string(),
                "https://rubygems.org/api/v1/gems/rails.json".to_string(),
            ]
        );
    }
}
