//! Known-safe namespace exemptions.

use glob::Pattern;
use tracing::warn;

/// Glob patterns for names the operator vouches for.
#[derive(Debug, Clone, Default)]
pub struct ExemptionFilter {
    patterns: Vec<Pattern>,
}

/// Collapse runs of `*`; `glob` reads `**` as a path wildcard and rejects it mid-segment.
fn collapse_stars(pattern: &str) -> String {
    let mut collapsed = String::with_capacity(pattern.len());
    for c in pattern.chars() {
        if c == '*' && collapsed.ends_with('*') {
            continue;
        }
        collapsed.push(c);
    }
    collapsed
}

impl ExemptionFilter {
    /// Build from a comma-separated pattern list. Malformed patterns are skipped.
    pub fn parse(safe_spaces: &str) -> Self {
        let patterns = safe_spaces
            .split(',')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .filter_map(|p| match Pattern::new(&collapse_stars(p)) {
                Ok(pattern) => Some(pattern),
                Err(e) => {
                    warn!(
                        "Encountered an error while trying to parse known-safe namespace {}: {}",
                        p, e
                    );
                    None
                }
            })
            .collect();

        Self { patterns }
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Whether `name` matches any pattern.
    pub fn is_exempt(&self, name: &str) -> bool {
        self.patterns.iter().any(|pattern| pattern.matches(name))
    }

    /// Drop exempt names, keeping order.
    pub fn filter(&self, names: Vec<String>) -> Vec<String> {
        names.into_iter().filter(|name| !self.is_exempt(name)).collect()
    }
}
