//! Handlers for campaign management.

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use validator::Validate;

use crate::api::dto::campaigns::{
    CampaignListResponse, CampaignResponse, CreateCampaignRequest, UpdateCampaignRequest,
};
use crate::api::dto::pagination::PaginationParams;
use crate::domain::entities::CallerIdentity;
use crate::error::AppError;
use crate::state::AppState;

/// Creates a campaign owned by the caller.
///
/// # Endpoint
///
/// `POST /api/campaigns`
///
/// # Request Body
///
/// ```json
/// { "name": "Spring launch", "description": "Q2 mailing" }
/// ```
///
/// # Errors
///
/// Returns 400 if the name is missing or blank.
pub async fn create_campaign_handler(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerIdentity>,
    Json(payload): Json<CreateCampaignRequest>,
) -> Result<(StatusCode, Json<CampaignResponse>), AppError> {
    payload.validate()?;

    let campaign = state
        .campaign_service
        .create(&caller, payload.name, payload.description)
        .await?;

    Ok((StatusCode::CREATED, Json(campaign.into())))
}

/// `GET /api/campaigns?page=1&page_size=25`
pub async fn list_campaigns_handler(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerIdentity>,
    Query(params): Query<PaginationParams>,
) -> Result<Json<CampaignListResponse>, AppError> {
    let (page, page_size) = params.resolve()?;

    let (campaigns, total) = state
        .campaign_service
        .list(&caller, page, page_size)
        .await?;

    Ok(Json(CampaignListResponse {
        items: campaigns.into_iter().map(Into::into).collect(),
        page,
        page_size,
        total,
    }))
}

/// `GET /api/campaigns/{id}`
pub async fn get_campaign_handler(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerIdentity>,
    Path(id): Path<i64>,
) -> Result<Json<CampaignResponse>, AppError> {
    let campaign = state.campaign_service.get(&caller, id).await?;
    Ok(Json(campaign.into()))
}

/// Partially updates a campaign.
///
/// # Endpoint
///
/// `PATCH /api/campaigns/{id}` (also accepted as `PUT`)
pub async fn update_campaign_handler(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerIdentity>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateCampaignRequest>,
) -> Result<Json<CampaignResponse>, AppError> {
    payload.validate()?;

    let campaign = state
        .campaign_service
        .update(&caller, id, payload.into())
        .await?;

    Ok(Json(campaign.into()))
}

/// `DELETE /api/campaigns/{id}`; answers 204 No Content. Links of the
/// campaign are kept.
pub async fn delete_campaign_handler(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerIdentity>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    state.campaign_service.delete(&caller, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
