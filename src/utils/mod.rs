//! Helpers shared by handlers, services and the admin CLI.
//!
//! - [`client_ip`] - Source address extraction (peer socket or proxy headers)
//! - [`password`] - Argon2 hashing for link access passwords
//! - [`token`] - Tracking and session token generation

pub mod client_ip;
pub mod password;
pub mod token;
