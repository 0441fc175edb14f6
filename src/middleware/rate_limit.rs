//! Per-client rate limiting with `governor` token buckets.
//!
//! Clients are keyed by IP: the first `x-forwarded-for` hop, then
//! `x-real-ip`, then the socket peer address. Requests without any of these
//! share the unspecified address bucket.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;

use axum::{
    extract::{ConnectInfo, Request, State},
    http::HeaderMap,
    middleware::Next,
    response::{IntoResponse, Response},
};
use governor::{DefaultKeyedRateLimiter, RateLimiter};
use schoolyard_config::RateLimitConfig;
use schoolyard_core::AppError;
use tracing::warn;

use crate::metrics::track_rate_limited;
use crate::state::AppState;

pub type IpRateLimiter = DefaultKeyedRateLimiter<IpAddr>;

/// The general and authentication buckets.
#[derive(Clone)]
pub struct RateLimiters {
    pub general: Arc<IpRateLimiter>,
    pub auth: Arc<IpRateLimiter>,
}

impl RateLimiters {
    pub fn new(config: &RateLimitConfig) -> Self {
        Self {
            general: Arc::new(RateLimiter::keyed(config.general_quota())),
            auth: Arc::new(RateLimiter::keyed(config.auth_quota())),
        }
    }

    /// Drops state for clients whose buckets are full again.
    pub fn retain_recent(&self) {
        self.general.retain_recent();
        self.auth.retain_recent();
    }
}

impl std::fmt::Debug for RateLimiters {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiters")
            .field("general_keys", &self.general.len())
            .field("auth_keys", &self.auth.len())
            .finish()
    }
}

pub fn client_ip(headers: &HeaderMap, peer: Option<SocketAddr>) -> IpAddr {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .and_then(|v| v.trim().parse::<IpAddr>().ok());

    let real_ip = || {
        headers
            .get("x-real-ip")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<IpAddr>().ok())
    };

    forwarded
        .or_else(real_ip)
        .or_else(|| peer.map(|addr| addr.ip()))
        .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED))
}

fn request_ip(req: &Request) -> IpAddr {
    let peer = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    client_ip(req.headers(), peer)
}

fn check(limiter: &IpRateLimiter, bucket: &'static str, ip: IpAddr) -> Result<(), AppError> {
    limiter.check_key(&ip).map_err(|_| {
        warn!(client_ip = %ip, bucket, "Rate limit exceeded");
        track_rate_limited(bucket);
        AppError::too_many_requests()
    })
}

pub async fn rate_limit_general(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Response {
    match check(&state.rate_limiters.general, "general", request_ip(&req)) {
        Ok(()) => next.run(req).await,
        Err(err) => err.into_response(),
    }
}

pub async fn rate_limit_auth(State(state): State<AppState>, req: Request, next: Next) -> Response {
    match check(&state.rate_limiters.auth, "auth", request_ip(&req)) {
        Ok(()) => next.run(req).await,
        Err(err) => err.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_forwarded_for_first_hop_wins() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("203.0.113.7, 10.0.0.1"),
        );
        headers.insert("x-real-ip", HeaderValue::from_static("198.51.100.2"));
        let peer: SocketAddr = "127.0.0.1:4000".parse().unwrap();

        assert_eq!(
            client_ip(&headers, Some(peer)),
            "203.0.113.7".parse::<IpAddr>().unwrap()
        );
    }

    #[test]
    fn test_real_ip_then_peer() {
        let mut headers = HeaderMap::new();
        headers.insert("x-real-ip", HeaderValue::from_static("198.51.100.2"));
        assert_eq!(
            client_ip(&headers, None),
            "198.51.100.2".parse::<IpAddr>().unwrap()
        );

        let peer: SocketAddr = "192.0.2.9:5555".parse().unwrap();
        assert_eq!(
            client_ip(&HeaderMap::new(), Some(peer)),
            "192.0.2.9".parse::<IpAddr>().unwrap()
        );
    }

    #[test]
    fn test_garbage_headers_fall_through() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("unknown"));
        assert_eq!(
            client_ip(&headers, None),
            IpAddr::V4(Ipv4Addr::UNSPECIFIED)
        );
    }

    #[test]
    fn test_buckets_are_per_ip() {
        let config = RateLimitConfig {
            general_per_second: 1,
            general_burst_size: 2,
            auth_per_second: 1,
            auth_burst_size: 1,
        };
        let limiters = RateLimiters::new(&config);
        let a: IpAddr = "203.0.113.1".parse().unwrap();
        let b: IpAddr = "203.0.113.2".parse().unwrap();

        assert!(check(&limiters.general, "general", a).is_ok());
        assert!(check(&limiters.general, "general", a).is_ok());
        assert!(check(&limiters.general, "general", a).is_err());
        assert!(check(&limiters.general, "general", b).is_ok());

        assert!(check(&limiters.auth, "auth", a).is_ok());
        let err = check(&limiters.auth, "auth", a).unwrap_err();
        assert_eq!(err.status.as_u16(), 429);
    }
}
