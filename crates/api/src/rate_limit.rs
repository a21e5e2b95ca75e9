//! Rate Limiting Middleware using GCRA Algorithm
//!
//! Provides rate limiting based on IP addresses using tower_governor.
//! Applied to the account and SOS endpoints.

use governor::middleware::StateInformationMiddleware;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_governor::governor::GovernorConfigBuilder;
use tower_governor::key_extractor::PeerIpKeyExtractor;

/// Type alias for the governor config with default settings
/// StateInformationMiddleware is used when use_headers() is called to add X-RateLimit-* headers
pub type DefaultGovernorConfig =
    tower_governor::governor::GovernorConfig<PeerIpKeyExtractor, StateInformationMiddleware>;

/// Rate limiting configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Seconds to replenish one request
    pub per_second: u64,
    /// Burst size (max requests that can be made immediately)
    pub burst_size: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            per_second: 2,
            burst_size: 5,
        }
    }
}

impl RateLimitConfig {
    /// Strict config for login, signup and SOS
    pub fn strict() -> Self {
        Self {
            per_second: 4,
            burst_size: 2,
        }
    }
}

/// Create a rate limiting governor config
///
/// Uses PeerIpKeyExtractor, so the service must be served with
/// `into_make_service_with_connect_info::<SocketAddr>()`. Returns `None`
/// when the period or burst size is zero.
pub fn create_governor_config(config: &RateLimitConfig) -> Option<Arc<DefaultGovernorConfig>> {
    GovernorConfigBuilder::default()
        .per_second(config.per_second)
        .burst_size(config.burst_size)
        .use_headers()
        .finish()
        .map(Arc::new)
}
