//! Composer resolver for `composer.json` and installed-package snapshots.

use crate::types::{Ecosystem, PackageReference, Result};
use async_trait::async_trait;
use serde_json::{Map, Value};
use tracing::{trace, warn};

const PACKAGIST_URL: &str = "https://packagist.org/packages";

const REQUIRE_MAPS: [&str; 2] = ["require", "require-dev"];

/// Platform packages provided by the PHP runtime or Composer itself.
const PLATFORM_PACKAGES: [&str; 5] = ["php", "hhvm", "composer", "composer-plugin-api", "composer-runtime-api"];
/// Vendor-less prefixes; `php-http/...` is a real vendor, `php-64bit` is not.
const PLATFORM_PREFIXES: [&str; 2] = ["lib-", "php-"];

pub struct ComposerResolver;

/// Whether a requirement names an interpreter capability rather than an installable package.
pub fn is_platform_package(name: &str) -> bool {
    if PLATFORM_PACKAGES.contains(&name) || name.starts_with("ext-") {
        return true;
    }
    !name.contains('/') && PLATFORM_PREFIXES.iter().any(|prefix| name.starts_with(prefix))
}

fn push_requirements(record: &Map<String, Value>, packages: &mut Vec<PackageReference>) {
    for key in REQUIRE_MAPS {
        match record.get(key) {
            None => {}
            Some(Value::Object(requirements)) => {
                for (name, constraint) in requirements {
                    if name.is_empty() {
                        trace!("Skipping `{}` entry with an empty name", key);
                        continue;
                    }
                    packages.push(PackageReference::new(
                        name,
                        constraint.as_str().unwrap_or_default(),
                        Ecosystem::Composer,
                    ));
                }
            }
            Some(_) => warn!("Non-fatal issue encountered while reading composer manifest: `{}` is not an object", key),
        }
    }
}

/// Installed records: the package itself followed by its requirements.
fn push_installed(records: &[Value], packages: &mut Vec<PackageReference>) {
    for record in records {
        let Some(record) = record.as_object() else {
            warn!("Non-fatal issue encountered while reading composer manifest: installed record is not an object");
            continue;
        };

        match record.get("name").and_then(Value::as_str) {
            Some(name) if !name.is_empty() => {
                let version = record.get("version").and_then(Value::as_str).unwrap_or_default();
                packages.push(PackageReference::new(name, version, Ecosystem::Composer));
            }
            _ => trace!("Installed record without a name"),
        }

        push_requirements(record, packages);
    }
}

#[async_trait]
impl super::PackageResolver for ComposerResolver {
    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Composer
    }

    fn parse(&self, raw: &[u8]) -> Result<Vec<PackageReference>> {
        let manifest: Value = match serde_json::from_slice(raw) {
            Ok(value) => value,
            Err(e) => {
                warn!("Non-fatal issue encountered while reading composer manifest: {}", e);
                return Ok(Vec::new());
            }
        };

        let mut packages = Vec::new();
        match &manifest {
            // Composer 1 installed.json
            Value::Array(records) => push_installed(records, &mut packages),
            // composer.lock and Composer 2 installed.json
            Value::Object(object) if object.get("packages").is_some_and(Value::is_array) => {
                for key in ["packages", "packages-dev"] {
                    if let Some(Value::Array(records)) = object.get(key) {
                        push_installed(records, &mut packages);
                    }
                }
            }
            Value::Object(object) => push_requirements(object, &mut packages),
            _ => warn!("Non-fatal issue encountered while reading composer manifest: unexpected top-level value"),
        }

        Ok(packages)
    }

    fn registry_url(&self, reference: &PackageReference) -> Option<String> {
        if is_platform_package(&reference.name) {
            return None;
        }
        Some(format!("{}/{}", PACKAGIST_URL, super::encode_name(&reference.name)))
    }
}
