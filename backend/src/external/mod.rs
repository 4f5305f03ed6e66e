//! External API integrations

pub mod sentinel_hub;

pub use sentinel_hub::{Collection, IndexQuery, ProviderError, Scene, SentinelHubClient};
