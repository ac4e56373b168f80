//! Pipenv `Pipfile` resolver.

use super::pip::PYPI_URL;
use crate::types::{Ecosystem, PackageReference, Result};
use async_trait::async_trait;
use toml::{Table, Value};
use tracing::{trace, warn};

const PACKAGE_TABLES: [&str; 2] = ["packages", "dev-packages"];

pub struct PipenvResolver;

/// Version constraint of a Pipfile entry, as written.
fn version_spec(value: &Value) -> String {
    match value {
        Value::String(version) => version.clone(),
        Value::Table(table) => table
            .get("version")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        _ => String::new(),
    }
}

#[async_trait]
impl super::PackageResolver for PipenvResolver {
    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Pipenv
    }

    fn parse(&self, raw: &[u8]) -> Result<Vec<PackageReference>> {
        let text = String::from_utf8_lossy(raw);
        let pipfile: Table = text.parse()?;

        let mut packages = Vec::new();
        for key in PACKAGE_TABLES {
            match pipfile.get(key) {
                None => {}
                Some(Value::Table(entries)) => {
                    for (name, value) in entries {
                        if name.is_empty() {
                            trace!("Skipping [{}] entry with an empty name", key);
                            continue;
                        }
                        packages.push(PackageReference::new(name, version_spec(value), Ecosystem::Pipenv));
                    }
                }
                Some(_) => warn!("Ignoring [{}]: expected a table", key),
            }
        }

        Ok(packages)
    }

    fn registry_url(&self, reference: &PackageReference) -> Option<String> {
        Some(format!("{}/{}/", PYPI_URL, super::encode_name(&reference.name)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecosystem::PackageResolver;
    use crate::types::ScanError;

    const PIPFILE: &str = r#"
[[source]]
url = "https://pypi.org/simple"
verify_ssl = true
name = "pypi"

[packages]
requests = "*"
django = ">=4.2"
internal-sdk = {version = "==1.2.0", index = "private"}

[dev-packages]
pytest = "*"

[requires]
python_version = "3.11"
"#;

    #[test]
    fn test_parse_package_tables() {
        let refs = PipenvResolver.parse(PIPFILE.as_bytes()).unwrap();
        let names: Vec<&str> = refs.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["requests", "django", "internal-sdk", "pytest"]);
        assert_eq!(refs[1].version_spec, ">=4.2");
        assert_eq!(refs[2].version_spec, "==1.2.0");
        assert!(refs.iter().all(|r| r.ecosystem == Ecosystem::Pipenv));
    }

    #[test]
    fn test_missing_tables() {
        let refs = PipenvResolver.parse(b"[requires]\npython_version = \"3.11\"\n").unwrap();
        assert!(refs.is_empty());
    }

    #[test]
    fn test_empty_keys_skipped() {
        let refs = PipenvResolver.parse(b"[packages]\n\"\" = \"*\"\nrequests = \"*\"\n").unwrap();
        let names: Vec<&str> = refs.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["requests"]);
    }

    #[test]
    fn test_malformed_pipfile_is_fatal() {
        let result = PipenvResolver.parse(b"[packages\nrequests = ");
        assert!(matches!(result, Err(ScanError::TomlError(_))));
    }

    #[test]
    fn test_queries_pypi() {
        let reference = PackageReference::new("requests", "*", Ecosystem::Pipenv);
        assert_eq!(
            PipenvResolver.registry_url(&reference).unwrap(),
            "https://pypi.org/project/requests/"
        );
    }
}
