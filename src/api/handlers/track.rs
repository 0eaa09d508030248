//! Handlers for the public tracking endpoint.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{ConnectInfo, Path, State},
    http::{HeaderMap, HeaderName, StatusCode, header},
    response::{IntoResponse, Redirect, Response},
};
use chrono::Utc;
use serde::Deserialize;
use std::net::SocketAddr;
use tracing::debug;

use crate::application::services::{RequestContext, Resolution};
use crate::domain::policy::DenyReason;
use crate::error::AppError;
use crate::state::AppState;
use crate::utils::client_ip::client_ip;
use crate::utils::token::is_well_formed_tracking_token;

const REFRESH: HeaderName = HeaderName::from_static("refresh");

/// Password prompt for protected links.
#[derive(Template, WebTemplate)]
#[template(path = "challenge.html")]
struct ChallengeTemplate {
    token: String,
    incorrect: bool,
}

/// Waiting page for links with a redirect delay.
#[derive(Template, WebTemplate)]
#[template(path = "interstitial.html")]
struct InterstitialTemplate {
    url: String,
    delay: u32,
    message: Option<String>,
}

/// Form body of `POST /track/{token}`.
#[derive(Debug, Deserialize)]
pub struct PasswordForm {
    #[serde(default)]
    pub password: String,
}

/// Which HTTP method the visitor used; selects the redirect status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Via {
    Get,
    Form,
}

/// Resolves a tracking token without a credential.
///
/// # Endpoint
///
/// `GET /track/{token}`
///
/// # Responses
///
/// - **307**: redirect to the destination (no delay)
/// - **200**: interstitial page with a `Refresh` header (delay configured)
/// - **401**: password form (protected link)
/// - **403**: plain-text denial reason
/// - **404**: `Link not found`
/// - **500**: the click could not be recorded
pub async fn track_handler(
    State(state): State<AppState>,
    Path(token): Path<String>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    resolve(&state, &token, peer, &headers, None, Via::Get).await
}

/// Resolves a tracking token with the submitted access password.
///
/// # Endpoint
///
/// `POST /track/{token}` (form field `password`)
///
/// Same responses as [`track_handler`], except that a direct redirect uses
/// **303 See Other** so the browser follows it with a GET.
pub async fn track_password_handler(
    State(state): State<AppState>,
    Path(token): Path<String>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Form(form): Form<PasswordForm>,
) -> Result<Response, AppError> {
    resolve(&state, &token, peer, &headers, Some(form.password), Via::Form).await
}

async fn resolve(
    state: &AppState,
    token: &str,
    peer: SocketAddr,
    headers: &HeaderMap,
    credential: Option<String>,
    via: Via,
) -> Result<Response, AppError> {
    if !is_well_formed_tracking_token(token) {
        debug!("Rejecting malformed tracking token");
        return Ok(render(Resolution::NotFound, token, via));
    }

    let ctx = RequestContext {
        now: Utc::now(),
        source_address: client_ip(headers, Some(peer), state.behind_proxy),
        client_signature: header_text(headers, header::USER_AGENT),
        referrer: header_text(headers, header::REFERER),
        credential,
    };

    let resolution = state.click_resolver.resolve(token, ctx).await?;

    Ok(render(resolution, token, via))
}

fn render(resolution: Resolution, token: &str, via: Via) -> Response {
    match resolution {
        Resolution::Redirect {
            url, delay_seconds, ..
        } if delay_seconds == 0 => match via {
            Via::Get => Redirect::temporary(&url).into_response(),
            Via::Form => Redirect::to(&url).into_response(),
        },
        Resolution::Redirect {
            url,
            delay_seconds,
            message,
        } => {
            let refresh = format!("{delay_seconds}; url={url}");
            let page = InterstitialTemplate {
                url,
                delay: delay_seconds,
                message,
            };
            (StatusCode::OK, [(REFRESH, refresh)], page).into_response()
        }
        Resolution::Denied(reason) => (StatusCode::FORBIDDEN, deny_message(reason)).into_response(),
        Resolution::NotFound => (StatusCode::NOT_FOUND, "Link not found").into_response(),
        Resolution::Challenge { attempted } => {
            let page = ChallengeTemplate {
                token: token.to_string(),
                incorrect: attempted,
            };
            (StatusCode::UNAUTHORIZED, page).into_response()
        }
    }
}

/// Visitor-facing text for a denial.
pub fn deny_message(reason: DenyReason) -> &'static str {
    match reason {
        DenyReason::Inactive => "Link is not active",
        DenyReason::Expired => "Link has expired",
        DenyReason::LimitReached => "Link click limit reached",
        DenyReason::TimeRestricted => "Link is not available at this time",
        DenyReason::GeoRestricted | DenyReason::GeoUnknown => "Link is not available in your region",
        DenyReason::DeviceRestricted => "Link is not available on this device",
    }
}

fn header_text(headers: &HeaderMap, name: HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
