//! Maven `pom.xml` resolver.

use super::pom::{parse_pom, Coordinate, PomProject};
use crate::registry::BodyCheck;
use crate::types::{Ecosystem, PackageReference, Result};
use async_trait::async_trait;
use tracing::{debug, trace};

const CENTRAL_URL: &str = "https://repo1.maven.org/maven2";

/// Bound on nested `${...}` expansion.
const MAX_INTERPOLATION_PASSES: usize = 8;

pub struct MavenResolver;

/// Substitute `${key}` placeholders; unknown keys stay verbatim.
fn interpolate(value: &str, project: &PomProject) -> String {
    let mut current = value.to_string();

    for _ in 0..MAX_INTERPOLATION_PASSES {
        if !current.contains("${") {
            break;
        }

        let mut expanded = String::with_capacity(current.len());
        let mut rest = current.as_str();
        while let Some(start) = rest.find("${") {
            expanded.push_str(&rest[..start]);
            let after = &rest[start + 2..];
            match after.find('}') {
                Some(end) => {
                    let key = &after[..end];
                    match project.property(key) {
                        Some(replacement) => expanded.push_str(replacement),
                        None => expanded.push_str(&rest[start..start + end + 3]),
                    }
                    rest = &after[end + 1..];
                }
                None => {
                    expanded.push_str(&rest[start..]);
                    rest = "";
                }
            }
        }
        expanded.push_str(rest);

        if expanded == current {
            break;
        }
        current = expanded;
    }

    current
}

fn to_reference(coordinate: &Coordinate, project: &PomProject) -> Option<PackageReference> {
    if coordinate.artifact_id.is_empty() {
        trace!("Skipping coordinate without an artifactId (groupId {:?})", coordinate.group_id);
        return None;
    }
    let group = interpolate(&coordinate.group_id, project);
    if group != coordinate.group_id {
        trace!("Interpolated groupId {} -> {}", coordinate.group_id, group);
    }
    Some(PackageReference::new(&coordinate.artifact_id, &coordinate.version, Ecosystem::Maven).with_group(group))
}

#[async_trait]
impl super::PackageResolver for MavenResolver {
    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Maven
    }

    fn parse(&self, raw: &[u8]) -> Result<Vec<PackageReference>> {
        let xml = String::from_utf8_lossy(raw);
        let project = parse_pom(&xml)?;

        let mut coordinates: Vec<&Coordinate> = Vec::new();
        coordinates.extend(&project.dependencies);
        coordinates.extend(&project.managed_dependencies);
        coordinates.extend(&project.plugins);
        for profile in &project.profiles {
            coordinates.extend(&profile.dependencies);
            coordinates.extend(&profile.plugins);
        }

        debug!(
            "Decoded POM {}: {} coordinates across {} profiles",
            project.artifact_id,
            coordinates.len(),
            project.profiles.len()
        );

        Ok(coordinates
            .into_iter()
            .filter_map(|coordinate| to_reference(coordinate, &project))
            .collect())
    }

    fn registry_url(&self, reference: &PackageReference) -> Option<String> {
        let group = reference.lookup_key();
        // Empty groupId is inherited from the parent POM
        if group.is_empty() {
            return None;
        }
        Some(format!("{}/{}/", CENTRAL_URL, super::encode_name(&group.replace('.', "/"))))
    }

    fn body_check(&self) -> BodyCheck {
        BodyCheck::Unpublished
    }
}
