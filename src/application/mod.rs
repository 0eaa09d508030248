//! Application layer services.
//!
//! Services orchestrate domain logic over the repository traits and give the
//! HTTP handlers a small API.
//!
//! - [`services::ClickResolver`] - click resolution pipeline
//! - [`services::LinkService`] - tracking link management
//! - [`services::AuthService`] - bearer session authentication

pub mod services;
