//! npm `package.json` resolver.

use crate::classify::{classify, ReferenceKind};
use crate::registry::{BodyCheck, RegistryChecker};
use crate::types::{AvailabilityStatus, Ecosystem, PackageReference, Result};
use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, trace, warn};

const REGISTRY_URL: &str = "https://registry.npmjs.org";
const GITHUB_URL: &str = "https://github.com";

/// name -> version maps.
const DEPENDENCY_MAPS: [&str; 4] = [
    "dependencies",
    "devDependencies",
    "peerDependencies",
    "optionalDependencies",
];

/// name-only lists; both spellings are accepted by npm.
const BUNDLED_LISTS: [&str; 2] = ["bundledDependencies", "bundleDependencies"];

pub struct NpmResolver;

impl NpmResolver {
    /// Ask GitHub whether the org behind an `org/repo` shorthand exists.
    async fn github_org_exists(org: &str, registry: &RegistryChecker) -> bool {
        if org.is_empty() {
            return false;
        }
        registry.exists(&format!("{}/{}", GITHUB_URL, super::encode_name(org))).await
    }
}

#[async_trait]
impl super::PackageResolver for NpmResolver {
    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Npm
    }

    fn parse(&self, raw: &[u8]) -> Result<Vec<PackageReference>> {
        let manifest: Value = match serde_json::from_slice(raw) {
            Ok(value) => value,
            Err(e) => {
                warn!("Non-fatal issue encountered while reading package.json: {}", e);
                return Ok(Vec::new());
            }
        };

        let mut packages = Vec::new();
        let mut push = |name: &str, version: &str| {
            if name.is_empty() {
                trace!("Skipping dependency with an empty name");
                return;
            }
            packages.push(PackageReference::new(name, version, Ecosystem::Npm));
        };

        for key in DEPENDENCY_MAPS {
            match manifest.get(key) {
                None => {}
                Some(Value::Object(deps)) => {
                    for (name, version) in deps {
                        push(name, version.as_str().unwrap_or_default());
                    }
                }
                Some(_) => warn!("Non-fatal issue encountered while reading package.json: `{}` is not an object", key),
            }
        }

        for key in BUNDLED_LISTS {
            match manifest.get(key) {
                None | Some(Value::Bool(_)) => {}
                Some(Value::Array(names)) => {
                    for name in names.iter().filter_map(Value::as_str) {
                        push(name, "");
                    }
                }
                Some(_) => warn!("Non-fatal issue encountered while reading package.json: `{}` is not an array", key),
            }
        }

        Ok(packages)
    }

    fn registry_url(&self, reference: &PackageReference) -> Option<String> {
        Some(format!("{}/{}/", REGISTRY_URL, super::encode_name(&reference.name)))
    }

    fn body_check(&self) -> BodyCheck {
        BodyCheck::Unpublished
    }

    async fn resolve(&self, reference: &PackageReference, registry: &RegistryChecker) -> AvailabilityStatus {
        match classify(&reference.version_spec) {
            kind if kind.is_pinned() => {
                debug!("Skipping {}: {:?} reference {}", reference.name, kind, reference.version_spec);
                AvailabilityStatus::External
            }
            ReferenceKind::GitHub { org } => {
                if Self::github_org_exists(&org, registry).await {
                    AvailabilityStatus::External
                } else {
                    AvailabilityStatus::NotPublic
                }
            }
            _ => match self.registry_url(reference) {
                Some(url) => registry.check(&url, self.body_check()).await,
                None => AvailabilityStatus::Public,
            },
        }
    }
}
