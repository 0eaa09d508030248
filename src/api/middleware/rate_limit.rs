//! Rate limiting middleware using the token bucket algorithm.
//!
//! Buckets are keyed by client IP. Directly exposed deployments key on the
//! socket peer address; behind a trusted proxy the forwarding headers are
//! used instead (see [`Limits::apply`]).

use axum::Router;
use governor::clock::QuantaInstant;
use governor::middleware::NoOpMiddleware;
use std::sync::Arc;
use tower_governor::{
    GovernorLayer,
    governor::GovernorConfigBuilder,
    key_extractor::{KeyExtractor, PeerIpKeyExtractor, SmartIpKeyExtractor},
};

use crate::state::AppState;

/// Token bucket parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    pub per_second: u64,
    pub burst_size: u32,
}

/// Public tracking endpoint: 2 requests per second, bursts of 100.
pub const PUBLIC: Limits = Limits {
    per_second: 2,
    burst_size: 100,
};

/// Authenticated API: 1 request per second, bursts of 10.
pub const SECURE: Limits = Limits {
    per_second: 1,
    burst_size: 10,
};

impl Limits {
    /// Wraps `router` in a rate limiter with these limits.
    ///
    /// With `behind_proxy` the key comes from `X-Forwarded-For` /
    /// `X-Real-IP` / `Forwarded` before falling back to the peer address.
    /// Requests exceeding the limit receive `429 Too Many Requests`.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let track = Router::new()
    ///     .route("/track/{token}", get(track_handler));
    /// let track = rate_limit::PUBLIC.apply(track, config.behind_proxy);
    /// ```
    pub fn apply(self, router: Router<AppState>, behind_proxy: bool) -> Router<AppState> {
        if behind_proxy {
            router.layer(self.layer_with(SmartIpKeyExtractor))
        } else {
            router.layer(self.layer_with(PeerIpKeyExtractor))
        }
    }

    fn layer_with<K>(self, extractor: K) -> GovernorLayer<K, NoOpMiddleware<QuantaInstant>, axum::body::Body>
    where
        K: KeyExtractor,
    {
        let governor_conf = Arc::new(
            GovernorConfigBuilder::default()
                .key_extractor(extractor)
                .per_second(self.per_second)
                .burst_size(self.burst_size)
                .finish()
                .expect("rate limit constants are non-zero"),
        );

        GovernorLayer::new(governor_conf)
    }
}
