//! Public registry checking module.
//!
//! Issues presence queries against package registries, backs off on
//! rate limiting, and memoises answers within a scan.

mod cache;
pub mod checker;
pub mod transport;

pub use cache::RegistryCache;
pub use checker::{BodyCheck, RegistryChecker};
pub use transport::{HttpTransport, RegistryResponse, Sleeper, TokioSleeper, Transport};
