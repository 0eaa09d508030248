//! Handlers for tracking link management.
//!
//! All endpoints sit behind [`crate::api::middleware::auth`], which puts the
//! caller's [`CallerIdentity`] into request extensions.

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use validator::Validate;

use crate::api::dto::events::{EventResponse, EventsQuery};
use crate::api::dto::links::{CreateLinkRequest, LinkListResponse, LinkResponse, UpdateLinkRequest};
use crate::api::dto::pagination::PaginationParams;
use crate::domain::entities::CallerIdentity;
use crate::error::AppError;
use crate::state::AppState;

/// Creates a tracking link owned by the caller.
///
/// # Endpoint
///
/// `POST /api/tracking_links`
///
/// # Request Body
///
/// ```json
/// {
///   "original_url": "https://example.com/offer",
///   "click_limit": 100,
///   "redirect_delay": 3,
///   "custom_message": "Taking you to the offer",
///   "access_password": "s3cret",
///   "geo_restrictions": { "mode": "allow", "values": ["US", "CA"] }
/// }
/// ```
///
/// # Errors
///
/// Returns 400 Bad Request if validation fails.
pub async fn create_link_handler(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerIdentity>,
    Json(payload): Json<CreateLinkRequest>,
) -> Result<(StatusCode, Json<LinkResponse>), AppError> {
    payload.validate()?;

    let link = state.link_service.create(&caller, payload.into()).await?;

    Ok((
        StatusCode::CREATED,
        Json(LinkResponse::from_link(link, &state.public_base_url)),
    ))
}

/// Lists links visible to the caller, newest first.
///
/// # Endpoint
///
/// `GET /api/tracking_links?page=1&page_size=25`
pub async fn list_links_handler(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerIdentity>,
    Query(params): Query<PaginationParams>,
) -> Result<Json<LinkListResponse>, AppError> {
    let (page, page_size) = params.resolve()?;

    let (links, total) = state.link_service.list(&caller, page, page_size).await?;

    let items = links
        .into_iter()
        .map(|l| LinkResponse::from_link(l, &state.public_base_url))
        .collect();

    Ok(Json(LinkListResponse {
        items,
        page,
        page_size,
        total,
    }))
}

/// `GET /api/tracking_links/{id}`
pub async fn get_link_handler(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerIdentity>,
    Path(id): Path<i64>,
) -> Result<Json<LinkResponse>, AppError> {
    let link = state.link_service.get(&caller, id).await?;
    Ok(Json(LinkResponse::from_link(link, &state.public_base_url)))
}

/// Partially updates a link.
///
/// # Endpoint
///
/// `PATCH /api/tracking_links/{id}`
///
/// Absent fields stay unchanged; `null` clears nullable fields.
pub async fn update_link_handler(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerIdentity>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateLinkRequest>,
) -> Result<Json<LinkResponse>, AppError> {
    payload.validate()?;

    let link = state.link_service.update(&caller, id, payload.into()).await?;

    Ok(Json(LinkResponse::from_link(link, &state.public_base_url)))
}

/// `DELETE /api/tracking_links/{id}`; answers 204 No Content.
pub async fn delete_link_handler(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerIdentity>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    state.link_service.delete(&caller, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Most recent events of a link.
///
/// # Endpoint
///
/// `GET /api/tracking_links/{id}/events?limit=100`
pub async fn link_events_handler(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerIdentity>,
    Path(id): Path<i64>,
    Query(query): Query<EventsQuery>,
) -> Result<Json<Vec<EventResponse>>, AppError> {
    let events = state.link_service.events(&caller, id, query.limit()).await?;
    Ok(Json(events.into_iter().map(Into::into).collect()))
}
