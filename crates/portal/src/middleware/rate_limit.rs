//! Rate limiting for the authentication endpoints.

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use axum::extract::ConnectInfo;
use axum::http::Request;
use governor::clock::QuantaInstant;
use governor::middleware::NoOpMiddleware;
use tower_governor::{GovernorError, GovernorLayer, governor::GovernorConfigBuilder};

// =============================================================================
// Client IP Key Extractor
// =============================================================================

/// Proxy headers carrying the client address, most trusted first.
const CLIENT_IP_HEADERS: &[&str] = &["cf-connecting-ip", "x-real-ip", "fly-client-ip"];

/// Key extractor that reads the client IP from proxy headers and falls back
/// to the socket peer address.
#[derive(Clone, Copy)]
pub struct ClientIpKeyExtractor;

impl tower_governor::key_extractor::KeyExtractor for ClientIpKeyExtractor {
    type Key = IpAddr;

    fn extract<T>(&self, req: &Request<T>) -> Result<Self::Key, GovernorError> {
        let headers = req.headers();

        let single = CLIENT_IP_HEADERS.iter().find_map(|name| {
            headers
                .get(*name)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.trim().parse::<IpAddr>().ok())
        });
        if let Some(ip) = single {
            return Ok(ip);
        }

        // First hop of X-Forwarded-For
        if let Some(ip) = headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.split(',').next())
            .and_then(|s| s.trim().parse::<IpAddr>().ok())
        {
            return Ok(ip);
        }

        req.extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip())
            .ok_or(GovernorError::UnableToExtractKey)
    }
}

// =============================================================================
// Rate Limiter Configuration
// =============================================================================

/// Rate limiter layer type for Axum.
pub type RateLimiterLayer =
    GovernorLayer<ClientIpKeyExtractor, NoOpMiddleware<QuantaInstant>, axum::body::Body>;

/// The governor rejected the quota settings.
#[derive(Debug, thiserror::Error)]
#[error("invalid rate limiter quota: one token per {period_secs}s, burst {burst}")]
pub struct RateLimitConfigError {
    pub period_secs: u64,
    pub burst: u32,
}

/// Seconds to replenish one auth request token.
const AUTH_PERIOD_SECS: u64 = 6;
/// Auth requests allowed back to back.
const AUTH_BURST: u32 = 5;

/// Create the rate limiter for auth endpoints: about 10 requests per minute
/// per IP with a burst of 5.
///
/// # Errors
///
/// Returns `RateLimitConfigError` if the governor refuses the quota.
pub fn auth_rate_limiter() -> Result<RateLimiterLayer, RateLimitConfigError> {
    let config = GovernorConfigBuilder::default()
        .key_extractor(ClientIpKeyExtractor)
        .per_second(AUTH_PERIOD_SECS)
        .burst_size(AUTH_BURST)
        .finish()
        .ok_or(RateLimitConfigError {
            period_secs: AUTH_PERIOD_SECS,
            burst: AUTH_BURST,
        })?;
    Ok(GovernorLayer::new(Arc::new(config)))
}
