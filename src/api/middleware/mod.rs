//! HTTP middleware: bearer authentication, rate limiting and request tracing.

pub mod auth;
pub mod rate_limit;
pub mod tracing;
