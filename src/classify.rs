//! Classification of manifest version strings that point outside the registry.
//!
//! npm lets a dependency's "version" be a path, a tarball URL, a git remote
//! or a GitHub `org/repo` shorthand. None of those are resolved from the
//! public registry, so they must not be queried there by name.

/// Git remote prefixes accepted by npm.
const GIT_PREFIXES: &[&str] = &["git:", "git+ssh:", "git+http:", "git+https:"];

/// Where a declared version string says the package comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReferenceKind {
    /// `file:` path on the developer's machine.
    Local,
    /// Direct `http:`/`https:` tarball.
    Url,
    /// Git remote.
    Git,
    /// GitHub `org/repo` shorthand. `org` may be empty for malformed input.
    GitHub { org: String },
    /// Plain version range resolved from the registry.
    Registry,
}

impl ReferenceKind {
    /// Whether the reference needs no lookup at all.
    pub fn is_pinned(&self) -> bool {
        matches!(self, ReferenceKind::Local | ReferenceKind::Url | ReferenceKind::Git)
    }
}

/// Classify a raw version string, first match wins.
pub fn classify(version_spec: &str) -> ReferenceKind {
    if is_local_reference(version_spec) {
        ReferenceKind::Local
    } else if is_url_reference(version_spec) {
        ReferenceKind::Url
    } else if is_git_reference(version_spec) {
        ReferenceKind::Git
    } else if is_github_reference(version_spec) {
        ReferenceKind::GitHub {
            org: github_org(version_spec).to_string(),
        }
    } else {
        ReferenceKind::Registry
    }
}

pub fn is_local_reference(version_spec: &str) -> bool {
    has_prefix_ignore_case(version_spec, "file:")
}

pub fn is_url_reference(version_spec: &str) -> bool {
    has_prefix_ignore_case(version_spec, "http:") || has_prefix_ignore_case(version_spec, "https:")
}

pub fn is_git_reference(version_spec: &str) -> bool {
    GIT_PREFIXES
        .iter()
        .any(|prefix| has_prefix_ignore_case(version_spec, prefix))
}

/// `org/repo` that is not an npm `@scope/name`.
pub fn is_github_reference(version_spec: &str) -> bool {
    !version_spec.starts_with('@') && version_spec.contains('/')
}

/// Organization or user part of a GitHub shorthand.
pub fn github_org(version_spec: &str) -> &str {
    version_spec.split('/').next().unwrap_or("")
}

fn has_prefix_ignore_case(value: &str, prefix: &str) -> bool {
    value
        .get(..prefix.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_reference() {
        assert_eq!(classify("file:../shared"), ReferenceKind::Local);
        assert_eq!(classify("FILE:./vendor/pkg.tgz"), ReferenceKind::Local);
    }

    #[test]
    fn test_url_reference() {
        assert_eq!(classify("https://example.com/pkg.tgz"), ReferenceKind::Url);
        assert_eq!(classify("HTTP://example.com/pkg.tgz"), ReferenceKind::Url);
    }

    #[test]
    fn test_git_reference() {
        for spec in [
            "git://github.com/acme/pkg.git",
            "git+ssh://git@github.com:acme/pkg.git",
            "git+http://example.com/pkg.git",
            "GIT+HTTPS://example.com/pkg.git#v1.0.0",
        ] {
            assert_eq!(classify(spec), ReferenceKind::Git, "{}", spec);
        }
    }

    #[test]
    fn test_pinned_kinds() {
        assert!(classify("file:x").is_pinned());
        assert!(classify("https://x").is_pinned());
        assert!(classify("git+ssh://x").is_pinned());
        assert!(!classify("^1.0.0").is_pinned());
        assert!(!classify("acme/pkg").is_pinned());
    }

    #[test]
    fn test_github_shorthand() {
        assert_eq!(
            classify("acme/internal-lib#main"),
            ReferenceKind::GitHub { org: "acme".to_string() }
        );
        assert_eq!(classify("/repo"), ReferenceKind::GitHub { org: String::new() });
    }

    #[test]
    fn test_scoped_is_not_github() {
        assert_eq!(classify("@acme/pkg"), ReferenceKind::Registry);
    }

    #[test]
    fn test_registry_ranges() {
        for spec in ["^1.2.3", "~0.4", "latest", "", ">=1.0.0 <2.0.0", "*"] {
            assert_eq!(classify(spec), ReferenceKind::Registry, "{}", spec);
        }
    }

    #[test]
    fn test_url_wins_over_github() {
        // Contains '/', but the URL rule comes first
        assert_eq!(classify("https://github.com/acme/pkg"), ReferenceKind::Url);
    }

    #[test]
    fn test_multibyte_prefix_does_not_panic() {
        assert_eq!(classify("ü"), ReferenceKind::Registry);
        assert_eq!(classify("fü:x"), ReferenceKind::Registry);
    }
}
