//! Per-ecosystem manifest parsing and availability resolution.
//!
//! Every supported package ecosystem has one [`PackageResolver`]
//! implementation that turns raw manifest bytes into
//! [`PackageReference`]s and knows which public registry endpoint answers
//! whether a name is claimed.
//!
//! | Resolver | Manifest | Registry endpoint |
//! |----------|----------|-------------------|
//! | [`NpmResolver`] | `package.json` | `https://registry.npmjs.org/{name}/` |
//! | [`PipResolver`] | `requirements.txt` | `https://pypi.org/project/{name}/` |
//! | [`PipenvResolver`] | `Pipfile` | `https://pypi.org/project/{name}/` |
//! | [`ComposerResolver`] | `composer.json`, `composer.lock`, `installed.json` | `https://packagist.org/packages/{name}` |
//! | [`MavenResolver`] | `pom.xml` | `https://repo1.maven.org/maven2/{group/as/path}/` |
//! | [`RubyGemsResolver`] | `Gemfile.lock` | `https://rubygems.org/api/v1/gems/{name}.json` |

mod composer;
mod maven;
mod npm;
mod pip;
mod pipenv;
mod pom;
mod rubygems;

pub use composer::ComposerResolver;
pub use maven::MavenResolver;
pub use npm::NpmResolver;
pub use pip::PipResolver;
pub use pipenv::PipenvResolver;
pub use rubygems::RubyGemsResolver;

use crate::registry::{BodyCheck, RegistryChecker};
use crate::types::{AvailabilityStatus, Ecosystem, PackageReference, Result};
use async_trait::async_trait;

/// Parsing and registry lookup for one package ecosystem.
#[async_trait]
pub trait PackageResolver: Send + Sync {
    /// The ecosystem this resolver handles.
    fn ecosystem(&self) -> Ecosystem;

    /// Extracts every package reference from raw manifest bytes, in manifest order.
    ///
    /// # Errors
    ///
    /// Returns an error only for formats that cannot be trusted once
    /// structurally invalid. Loosely typed formats degrade with a warning.
    fn parse(&self, raw: &[u8]) -> Result<Vec<PackageReference>>;

    /// Registry URL that proves the reference's name is claimed.
    ///
    /// `None` means the reference is always public and is never queried.
    fn registry_url(&self, reference: &PackageReference) -> Option<String>;

    /// How to read the body of a `200 OK` answer.
    fn body_check(&self) -> BodyCheck {
        BodyCheck::None
    }

    /// Decides the availability of one reference.
    async fn resolve(&self, reference: &PackageReference, registry: &RegistryChecker) -> AvailabilityStatus {
        match self.registry_url(reference) {
            Some(url) => registry.check(&url, self.body_check()).await,
            None => AvailabilityStatus::Public,
        }
    }
}

/// Percent-encode a package name for a registry URL path, keeping `/` and `@`.
pub(crate) fn encode_name(name: &str) -> String {
    name.split('/')
        .map(|segment| {
            segment
                .split('@')
                .map(|part| urlencoding::encode(part).into_owned())
                .collect::<Vec<_>>()
                .join("@")
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Returns the resolver for an ecosystem.
pub fn resolver_for(ecosystem: Ecosystem) -> Box<dyn PackageResolver> {
    match ecosystem {
        Ecosystem::Npm => Box::new(NpmResolver),
        Ecosystem::Pip => Box::new(PipResolver),
        Ecosystem::Pipenv => Box::new(PipenvResolver),
        Ecosystem::Composer => Box::new(ComposerResolver),
        Ecosystem::Maven => Box::new(MavenResolver),
        Ecosystem::RubyGems => Box::new(RubyGemsResolver),
    }
}
