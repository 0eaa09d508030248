//! Source address extraction from HTTP requests.

use axum::http::HeaderMap;
use std::net::{IpAddr, SocketAddr};

const X_FORWARDED_FOR: &str = "x-forwarded-for";
const X_REAL_IP: &str = "x-real-ip";

/// Returns the client address for a request.
///
/// When `behind_proxy` is set, the first entry of `X-Forwarded-For` wins,
/// then `X-Real-IP`. Header values that do not parse as an IP are skipped.
/// The socket peer address is the fallback (and the only source when the
/// service is reachable directly).
///
/// # Examples
///
/// ```ignore
/// let mut headers = HeaderMap::new();
/// headers.insert("x-forwarded-for", "203.0.113.7, 10.0.0.1".parse().unwrap());
///
/// let ip = client_ip(&headers, Some(peer), true);
/// assert_eq!(ip.as_deref(), Some("203.0.113.7"));
/// ```
pub fn client_ip(headers: &HeaderMap, peer: Option<SocketAddr>, behind_proxy: bool) -> Option<String> {
    if behind_proxy
        && let Some(ip) = forwarded_ip(headers)
    {
        return Some(ip.to_string());
    }

    peer.map(|addr| addr.ip().to_string())
}

fn forwarded_ip(headers: &HeaderMap) -> Option<IpAddr> {
    let from_forwarded = headers
        .get(X_FORWARDED_FOR)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .and_then(|v| v.trim().parse::<IpAddr>().ok());

    from_forwarded.or_else(|| {
        headers
            .get(X_REAL_IP)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<IpAddr>().ok())
    })
}
