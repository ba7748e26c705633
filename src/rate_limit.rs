//! Rate limiting configuration for public endpoints.
//!
//! Rate limits are applied per-IP address. The funnel is unauthenticated,
//! so this is the only brake on spamming the order pipeline with uploads.
//!
//! Tiers:
//! - Strict: upload delivery - large bodies and an outbound hook call
//! - Standard: step pages and payment actions
//! - Relaxed: /health
//!
//! Configure via environment variables:
//! - RATE_LIMIT_STRICT_RPM (default: 10)
//! - RATE_LIMIT_STANDARD_RPM (default: 30)
//! - RATE_LIMIT_RELAXED_RPM (default: 60)

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use tower_governor::governor::GovernorConfigBuilder;
use tower_governor::GovernorLayer;

/// Wraps a router with a per-IP limiter at the given requests per minute.
fn limit<S>(router: Router<S>, requests_per_minute: u32) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    assert!(requests_per_minute > 0, "Rate limit must be greater than 0");

    let period_secs = 60 / requests_per_minute as u64;
    let config = GovernorConfigBuilder::default()
        .period(Duration::from_secs(period_secs.max(1)))
        .burst_size(requests_per_minute)
        .finish()
        .expect("Failed to build rate limiter config");

    router.layer(GovernorLayer::new(Arc::new(config)))
}

/// Strict tier: endpoints that forward work to the order pipeline.
pub fn strict<S>(router: Router<S>, requests_per_minute: u32) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    limit(router, requests_per_minute)
}

/// Standard tier: step pages and payment actions.
pub fn standard<S>(router: Router<S>, requests_per_minute: u32) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    limit(router, requests_per_minute)
}

/// Relaxed tier: lightweight endpoints like health checks.
pub fn relaxed<S>(router: Router<S>, requests_per_minute: u32) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    limit(router, requests_per_minute)
}
