//! HTTP layer: translates requests into service calls and results into
//! responses.
//!
//! # Modules
//!
//! - [`dto`] - Request/response bodies
//! - [`handlers`] - HTTP request handlers
//! - [`middleware`] - Authentication, rate limiting and tracing
//! - [`routes`] - Authenticated API route table

pub mod dto;
pub mod handlers;
pub mod middleware;
pub mod routes;
