//! In-memory memo of registry answers for the duration of one scan.

use crate::types::AvailabilityStatus;
use dashmap::DashMap;
use std::sync::Arc;

/// Thread-safe map from request URL to the status it produced.
#[derive(Debug, Clone, Default)]
pub struct RegistryCache {
    cache: Arc<DashMap<String, AvailabilityStatus>>,
}

impl RegistryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a previously recorded status for this URL.
    pub fn get(&self, url: &str) -> Option<AvailabilityStatus> {
        self.cache.get(url).map(|entry| *entry)
    }

    /// Record a status. `Unknown` is never stored so the next occurrence asks again.
    pub fn set(&self, url: &str, status: AvailabilityStatus) {
        if status == AvailabilityStatus::Unknown {
            return;
        }
        self.cache.insert(url.to_string(), status);
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}
