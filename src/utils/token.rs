//! Random token generation for tracking links and session credentials.

use base64::Engine as _;
use hmac::{Hmac, Mac};
use sha2::Sha256;

/// Random bytes behind a tracking token (11 base64 characters).
const TRACKING_TOKEN_BYTES: usize = 8;

/// Random bytes behind a session credential (43 base64 characters).
const SESSION_TOKEN_BYTES: usize = 32;

type HmacSha256 = Hmac<Sha256>;

fn random_url_safe(len: usize) -> String {
    let mut buffer = vec![0u8; len];

    getrandom::fill(&mut buffer).expect("Failed to generate random bytes");

    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(buffer)
}

/// Generates an opaque, URL-safe tracking token.
pub fn generate_tracking_token() -> String {
    random_url_safe(TRACKING_TOKEN_BYTES)
}

/// Generates a bearer credential for an API session.
pub fn generate_session_token() -> String {
    random_url_safe(SESSION_TOKEN_BYTES)
}

/// Hashes a session credential with HMAC-SHA256.
///
/// Returns a 64-character lowercase hex-encoded MAC. Only this value is
/// stored, so a read-only database leak does not expose usable credentials.
pub fn hash_session_token(signing_secret: &str, token: &str) -> String {
    let mut mac =
        HmacSha256::new_from_slice(signing_secret.as_bytes()).expect("HMAC accepts any key length");
    mac.update(token.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Returns true if the value looks like a generated tracking token.
pub fn is_well_formed_tracking_token(token: &str) -> bool {
    !token.is_empty()
        && token.len() <= 64
        && token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}
