//! Registry presence checks with rate-limit backoff.

use crate::registry::cache::RegistryCache;
use crate::registry::transport::{HttpTransport, Sleeper, TokioSleeper, Transport};
use crate::types::{AvailabilityStatus, RegistryConfig, Result};
use governor::{Quota, RateLimiter};
use serde::Deserialize;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, trace, warn};

/// HTTP status a registry uses to ask us to slow down.
const TOO_MANY_REQUESTS: u16 = 429;

/// How the body of a `200 OK` response is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyCheck {
    /// Status alone decides.
    None,
    /// npm-style metadata; a non-empty `time.unpublished.name` means every version was withdrawn.
    Unpublished,
    /// RubyGems API; the body must decode as gem metadata.
    GemMetadata,
}

/// npm registry document, reduced to the unpublished marker.
#[derive(Debug, Default, Deserialize)]
struct NpmDocument {
    #[serde(default)]
    time: NpmTime,
}

#[derive(Debug, Default, Deserialize)]
struct NpmTime {
    #[serde(default)]
    unpublished: NpmUnpublished,
}

#[derive(Debug, Default, Deserialize)]
struct NpmUnpublished {
    #[serde(default)]
    name: String,
}

impl NpmDocument {
    fn all_versions_unpublished(&self) -> bool {
        !self.time.unpublished.name.is_empty()
    }
}

/// RubyGems `/api/v1/gems/{name}.json` response.
#[derive(Debug, Deserialize)]
struct GemInfo {
    #[allow(dead_code)]
    name: String,
}

/// Checker for name presence in public registries.
pub struct RegistryChecker {
    transport: Arc<dyn Transport>,
    sleeper: Arc<dyn Sleeper>,
    rate_limiter: Option<Arc<RateLimiter<governor::state::NotKeyed, governor::state::InMemoryState, governor::clock::DefaultClock>>>,
    cache: Option<RegistryCache>,
    backoff: Duration,
    max_retries: u32,
}

impl RegistryChecker {
    /// Create a checker that talks to the real registries.
    pub fn new(config: &RegistryConfig) -> Result<Self> {
        let transport = HttpTransport::new(config)?;

        let quota = Quota::per_second(NonZeroU32::new(config.rate_limit).unwrap_or(NonZeroU32::MIN));
        let rate_limiter = Arc::new(RateLimiter::direct(quota));

        Ok(Self {
            transport: Arc::new(transport),
            sleeper: Arc::new(TokioSleeper),
            rate_limiter: Some(rate_limiter),
            cache: config.cache.then(RegistryCache::new),
            backoff: Duration::from_secs(config.backoff_secs),
            max_retries: config.max_retries,
        })
    }

    /// Create a checker over an arbitrary transport and clock, without pacing or memoisation.
    pub fn with_transport(transport: Arc<dyn Transport>, sleeper: Arc<dyn Sleeper>) -> Self {
        let defaults = RegistryConfig::default();
        Self {
            transport,
            sleeper,
            rate_limiter: None,
            cache: None,
            backoff: Duration::from_secs(defaults.backoff_secs),
            max_retries: defaults.max_retries,
        }
    }

    /// Enable or disable per-scan memoisation.
    pub fn with_cache(mut self, enabled: bool) -> Self {
        self.cache = enabled.then(RegistryCache::new);
        self
    }

    /// Check whether the resource at `url` is claimed in its registry.
    pub async fn check(&self, url: &str, body_check: BodyCheck) -> AvailabilityStatus {
        if let Some(ref cache) = self.cache {
            if let Some(status) = cache.get(url) {
                trace!("Cache hit for {}", url);
                return status;
            }
        }

        let status = self.query(url, body_check).await;

        if let Some(ref cache) = self.cache {
            cache.set(url, status);
        }

        status
    }

    /// Single request, no retry: does `url` answer `200 OK`?
    pub async fn exists(&self, url: &str) -> bool {
        self.throttle().await;

        match self.transport.get(url).await {
            Ok(response) => {
                debug!("Checking {}: HTTP {}", url, response.status);
                response.status == 200
            }
            Err(e) => {
                warn!("Error while trying to request {}: {}", url, e);
                false
            }
        }
    }

    async fn query(&self, url: &str, body_check: BodyCheck) -> AvailabilityStatus {
        let mut retries = 0;

        loop {
            if retries > self.max_retries {
                warn!("Maximum number of retries exhausted for {}", url);
                return AvailabilityStatus::Unknown;
            }

            self.throttle().await;

            let response = match self.transport.get(url).await {
                Ok(response) => response,
                Err(e) => {
                    warn!("Error when trying to request {}: {}", url, e);
                    return AvailabilityStatus::Unknown;
                }
            };

            debug!("Checking {}: HTTP {}", url, response.status);

            match response.status {
                200 => return interpret_body(url, body_check, response.body.as_deref()),
                TOO_MANY_REQUESTS => {
                    warn!(
                        "{} responded with 429 (Too many requests), throttling and retrying...",
                        url
                    );
                    self.sleeper.sleep(self.backoff).await;
                    retries += 1;
                }
                _ => return AvailabilityStatus::NotPublic,
            }
        }
    }

    async fn throttle(&self) {
        if let Some(ref limiter) = self.rate_limiter {
            limiter.until_ready().await;
        }
    }
}

/// Classify a `200 OK` answer.
fn interpret_body(url: &str, body_check: BodyCheck, body: Option<&str>) -> AvailabilityStatus {
    match body_check {
        BodyCheck::None => AvailabilityStatus::Public,
        BodyCheck::Unpublished => {
            // Undecodable metadata still proves the name is taken
            let document: NpmDocument = body
                .and_then(|b| serde_json::from_str(b).ok())
                .unwrap_or_default();
            if document.all_versions_unpublished() {
                warn!(
                    "{} was found, but all its versions are unpublished, making anyone able to take over the name",
                    url
                );
                AvailabilityStatus::UnpublishedAll
            } else {
                AvailabilityStatus::Public
            }
        }
        BodyCheck::GemMetadata => match serde_json::from_str::<GemInfo>(body.unwrap_or("")) {
            Ok(_) => AvailabilityStatus::Public,
            Err(e) => {
                warn!("Error when trying to decode response from {}: {}", url, e);
                AvailabilityStatus::NotPublic
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::testing::{FakeTransport, RecordingSleeper};

    const URL: &str = "https://registry.npmjs.org/leftpad/";

    fn checker(transport: &Arc<FakeTransport>, sleeper: &Arc<RecordingSleeper>) -> RegistryChecker {
        RegistryChecker::with_transport(transport.clone(), sleeper.clone())
    }

    #[tokio::test]
    async fn test_ok_is_public() {
        let transport = Arc::new(FakeTransport::new().respond(URL, 200, r#"{"name":"leftpad"}"#));
        let sleeper = Arc::new(RecordingSleeper::default());

        let status = checker(&transport, &sleeper).check(URL, BodyCheck::Unpublished).await;
        assert_eq!(status, AvailabilityStatus::Public);
    }

    #[tokio::test]
    async fn test_not_found_is_not_public() {
        let transport = Arc::new(FakeTransport::new().respond(URL, 404, ""));
        let sleeper = Arc::new(RecordingSleeper::default());

        let status = checker(&transport, &sleeper).check(URL, BodyCheck::None).await;
        assert_eq!(status, AvailabilityStatus::NotPublic);
    }

    #[tokio::test]
    async fn test_redirect_status_is_classified() {
        let transport = Arc::new(FakeTransport::new().respond(URL, 301, ""));
        let sleeper = Arc::new(RecordingSleeper::default());

        let status = checker(&transport, &sleeper).check(URL, BodyCheck::None).await;
        assert_eq!(status, AvailabilityStatus::NotPublic);
    }

    #[tokio::test]
    async fn test_unpublished_all_detected() {
        let body = r#"{
            "_id": "leftpad",
            "name": "leftpad",
            "time": {
                "created": "2016-03-22T00:00:00.000Z",
                "unpublished": {
                    "name": "leftpad",
                    "maintainers": [{"name": "someone", "email": "someone@example.com"}],
                    "tags": {"latest": "1.0.0"},
                    "versions": ["1.0.0"]
                }
            }
        }"#;
        let transport = Arc::new(FakeTransport::new().respond(URL, 200, body));
        let sleeper = Arc::new(RecordingSleeper::default());

        let status = checker(&transport, &sleeper).check(URL, BodyCheck::Unpublished).await;
        assert_eq!(status, AvailabilityStatus::UnpublishedAll);
    }

    #[tokio::test]
    async fn test_undecodable_metadata_stays_public() {
        let transport = Arc::new(FakeTransport::new().respond(URL, 200, "<html>"));
        let sleeper = Arc::new(RecordingSleeper::default());

        let status = checker(&transport, &sleeper).check(URL, BodyCheck::Unpublished).await;
        assert_eq!(status, AvailabilityStatus::Public);
    }

    #[tokio::test]
    async fn test_rate_limit_retries_then_succeeds() {
        let transport = Arc::new(
            FakeTransport::new()
                .respond(URL, 429, "")
                .respond(URL, 429, "")
                .respond(URL, 200, "{}"),
        );
        let sleeper = Arc::new(RecordingSleeper::default());

        let status = checker(&transport, &sleeper).check(URL, BodyCheck::Unpublished).await;
        assert_eq!(status, AvailabilityStatus::Public);
        assert_eq!(transport.requests().len(), 3);
        assert_eq!(sleeper.total(), Duration::from_secs(20));
    }

    #[tokio::test]
    async fn test_rate_limit_exhaustion_fails_closed() {
        let mut fake = FakeTransport::new();
        for _ in 0..4 {
            fake = fake.respond(URL, 429, "");
        }
        // Never reached: the fifth attempt is abandoned
        fake = fake.respond(URL, 200, "{}");
        let transport = Arc::new(fake);
        let sleeper = Arc::new(RecordingSleeper::default());

        let status = checker(&transport, &sleeper).check(URL, BodyCheck::Unpublished).await;
        assert_eq!(status, AvailabilityStatus::Unknown);
        assert!(status.is_flagged());
        assert_eq!(transport.requests().len(), 4);
        assert!(sleeper.total() >= Duration::from_secs(30));
        assert!(sleeper.calls().iter().all(|d| *d == Duration::from_secs(10)));
    }

    #[tokio::test]
    async fn test_transport_error_not_retried() {
        let transport = Arc::new(FakeTransport::new().fail(URL).respond(URL, 200, "{}"));
        let sleeper = Arc::new(RecordingSleeper::default());

        let status = checker(&transport, &sleeper).check(URL, BodyCheck::None).await;
        assert_eq!(status, AvailabilityStatus::Unknown);
        assert_eq!(transport.requests().len(), 1);
        assert!(sleeper.calls().is_empty());
    }

    #[tokio::test]
    async fn test_gem_metadata_must_decode() {
        let url = "https://rubygems.org/api/v1/gems/rack.json";
        let transport = Arc::new(
            FakeTransport::new()
                .respond(url, 200, "This rubygem could not be found.")
                .respond(url, 200, r#"{"name":"rack","downloads":1,"version":"3.0.0"}"#),
        );
        let sleeper = Arc::new(RecordingSleeper::default());
        let checker = checker(&transport, &sleeper);

        assert_eq!(checker.check(url, BodyCheck::GemMetadata).await, AvailabilityStatus::NotPublic);
        assert_eq!(checker.check(url, BodyCheck::GemMetadata).await, AvailabilityStatus::Public);
    }

    #[tokio::test]
    async fn test_cache_reuses_answer() {
        let transport = Arc::new(FakeTransport::new().respond(URL, 200, "{}"));
        let sleeper = Arc::new(RecordingSleeper::default());
        let checker = checker(&transport, &sleeper).with_cache(true);

        assert_eq!(checker.check(URL, BodyCheck::None).await, AvailabilityStatus::Public);
        assert_eq!(checker.check(URL, BodyCheck::None).await, AvailabilityStatus::Public);
        assert_eq!(transport.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_without_cache_queries_every_time() {
        let transport = Arc::new(FakeTransport::new().respond(URL, 200, "{}").respond(URL, 200, "{}"));
        let sleeper = Arc::new(RecordingSleeper::default());
        let checker = checker(&transport, &sleeper);

        checker.check(URL, BodyCheck::None).await;
        checker.check(URL, BodyCheck::None).await;
        assert_eq!(transport.requests().len(), 2);
    }

    #[tokio::test]
    async fn test_exists_single_attempt() {
        let url = "https://github.com/acme";
        let transport = Arc::new(FakeTransport::new().respond(url, 429, "").respond(url, 200, ""));
        let sleeper = Arc::new(RecordingSleeper::default());

        assert!(!checker(&transport, &sleeper).exists(url).await);
        assert_eq!(transport.requests().len(), 1);
    }
}
