//! Rate limiting configuration.
//!
//! Rate limits are token buckets keyed by client IP:
//!
//! - Tokens are replenished at `*_per_second`
//! - Each request consumes one token
//! - At most `*_burst_size` tokens accumulate
//!
//! The general bucket covers every `/api` route; authentication routes get a
//! second, stricter bucket to slow down password guessing.
//!
//! # Environment Variables
//!
//! - `RATE_LIMIT_GENERAL_PER_SECOND` (default 20)
//! - `RATE_LIMIT_GENERAL_BURST_SIZE` (default 60)
//! - `RATE_LIMIT_AUTH_PER_SECOND` (default 1)
//! - `RATE_LIMIT_AUTH_BURST_SIZE` (default 5)

use std::num::NonZeroU32;

use governor::Quota;

use crate::env::parse_or;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RateLimitConfig {
    pub general_per_second: u32,
    pub general_burst_size: u32,
    pub auth_per_second: u32,
    pub auth_burst_size: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            general_per_second: 20,
            general_burst_size: 60,
            auth_per_second: 1,
            auth_burst_size: 5,
        }
    }
}

impl RateLimitConfig {
    /// Falls back to the defaults for unset or unparsable variables.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            general_per_second: parse_or(
                "RATE_LIMIT_GENERAL_PER_SECOND",
                defaults.general_per_second,
            ),
            general_burst_size: parse_or(
                "RATE_LIMIT_GENERAL_BURST_SIZE",
                defaults.general_burst_size,
            ),
            auth_per_second: parse_or("RATE_LIMIT_AUTH_PER_SECOND", defaults.auth_per_second),
            auth_burst_size: parse_or("RATE_LIMIT_AUTH_BURST_SIZE", defaults.auth_burst_size),
        }
    }

    /// Quota for general API endpoints. Zero values are raised to one.
    #[must_use]
    pub fn general_quota(&self) -> Quota {
        quota(self.general_per_second, self.general_burst_size)
    }

    /// Quota for authentication endpoints.
    #[must_use]
    pub fn auth_quota(&self) -> Quota {
        quota(self.auth_per_second, self.auth_burst_size)
    }
}

fn quota(per_second: u32, burst_size: u32) -> Quota {
    Quota::per_second(NonZeroU32::new(per_second).unwrap_or(NonZeroU32::MIN))
        .allow_burst(NonZeroU32::new(burst_size).unwrap_or(NonZeroU32::MIN))
}
