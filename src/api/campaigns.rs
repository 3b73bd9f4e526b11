//! Campaigns: authored by brands (or admins on their behalf), browsed and
//! accepted by influencers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use axum_extra::extract::WithRejection;
use serde_json::json;
use std::sync::Arc;

use crate::backend::{decode_first, decode_rows, Credential, Order, Query};
use crate::db::{
    self, id_value, Brand, Campaign, CampaignParticipant, CampaignStatus, CreateCampaignRequest,
    Role,
};
use crate::AppState;

use super::auth::CurrentUser;
use super::error::{ApiError, ValidationErrorBuilder};
use super::influencers::own_influencer;
use super::validation::{validate_amount, validate_required, validate_selected};

const CAMPAIGN_SELECT: &str = "*,brands(name)";

fn validate_create_request(req: &CreateCampaignRequest) -> Result<(), ApiError> {
    let mut errors = ValidationErrorBuilder::new();

    if let Err(e) = validate_required(&req.title, "Title", 200) {
        errors.add("title", e);
    }
    if let Err(e) = validate_amount(req.budget, "Budget") {
        errors.add("budget", e);
    }
    if let Some(status) = req.status.as_ref().filter(|s| !s.is_known()) {
        errors.add("status", format!("Unknown campaign status '{}'", status));
    }
    if let (Some(start), Some(end)) = (&req.start_date, &req.end_date) {
        // ISO dates compare lexicographically
        if !start.is_empty() && !end.is_empty() && end < start {
            errors.add("end_date", "End date cannot be before the start date");
        }
    }

    errors.finish()
}

async fn list_with(
    state: &AppState,
    query: Query,
    credential: &Credential,
) -> Result<Vec<Campaign>, ApiError> {
    let rows = state
        .backend
        .select(db::CAMPAIGNS, &query, credential)
        .await
        .map_err(|e| ApiError::from_backend("Failed to load campaigns", e))?;
    decode_rows(rows).map_err(|e| ApiError::from_backend("Failed to load campaigns", e))
}

async fn insert_campaign(
    state: &AppState,
    user: &CurrentUser,
    brand_id: &str,
    req: &CreateCampaignRequest,
) -> Result<Campaign, ApiError> {
    let payload = json!({
        "brand_id": id_value(brand_id),
        "title": req.title.trim(),
        "description": req.description,
        "budget": req.budget,
        "status": req.status.clone().unwrap_or(CampaignStatus::Active),
        "start_date": req.start_date,
        "end_date": req.end_date,
        "created_at": chrono::Utc::now().to_rfc3339(),
    });

    let rows = state
        .backend
        .insert(db::CAMPAIGNS, payload, &user.credential())
        .await
        .map_err(|e| ApiError::from_backend("Failed to create campaign", e))?;

    let campaign: Campaign = decode_first(rows)
        .map_err(|e| ApiError::from_backend("Failed to create campaign", e))?
        .ok_or_else(|| ApiError::backend("Failed to create campaign: no row returned"))?;

    tracing::info!(campaign_id = %campaign.id, brand_id = %brand_id, "Campaign created");
    Ok(campaign)
}

/// Load the caller's own brand row.
async fn own_brand(state: &AppState, user: &CurrentUser) -> Result<Brand, ApiError> {
    let rows = state
        .backend
        .select(
            db::BRANDS,
            &Query::new().eq("user_id", &user.user.id).limit(1),
            &user.credential(),
        )
        .await
        .map_err(|e| ApiError::from_backend("Failed to load brand", e))?;

    decode_first(rows)
        .map_err(|e| ApiError::from_backend("Failed to load brand", e))?
        .ok_or_else(|| ApiError::not_found("No brand is linked to this account"))
}

/// All campaigns
///
/// GET /api/admin/campaigns
pub async fn list_all_campaigns(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
) -> Result<Json<Vec<Campaign>>, ApiError> {
    user.require(Role::Admin)?;
    let query = Query::new()
        .select(CAMPAIGN_SELECT)
        .order("created_at", Order::Desc);
    Ok(Json(list_with(&state, query, &user.credential()).await?))
}

/// Create a campaign for any brand
///
/// POST /api/admin/campaigns
pub async fn admin_create_campaign(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    WithRejection(Json(req), _): WithRejection<Json<CreateCampaignRequest>, ApiError>,
) -> Result<(StatusCode, Json<Campaign>), ApiError> {
    user.require(Role::Admin)?;
    validate_create_request(&req)?;
    let brand_id = validate_selected(&req.brand_id, "a brand")
        .map_err(|e| ApiError::validation_field("brand_id", e))?;

    let campaign = insert_campaign(&state, &user, &brand_id, &req).await?;
    Ok((StatusCode::CREATED, Json(campaign)))
}

/// The caller's brand's campaigns
///
/// GET /api/brand/campaigns
pub async fn list_brand_campaigns(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
) -> Result<Json<Vec<Campaign>>, ApiError> {
    user.require(Role::Marketing)?;
    let brand = own_brand(&state, &user).await?;

    let query = Query::new()
        .select(CAMPAIGN_SELECT)
        .eq("brand_id", &brand.id)
        .order("created_at", Order::Desc);
    Ok(Json(list_with(&state, query, &user.credential()).await?))
}

/// Create a campaign under the caller's brand
///
/// POST /api/brand/campaigns
pub async fn brand_create_campaign(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    WithRejection(Json(req), _): WithRejection<Json<CreateCampaignRequest>, ApiError>,
) -> Result<(StatusCode, Json<Campaign>), ApiError> {
    user.require(Role::Marketing)?;
    validate_create_request(&req)?;
    let brand = own_brand(&state, &user).await?;

    let campaign = insert_campaign(&state, &user, &brand.id, &req).await?;
    Ok((StatusCode::CREATED, Json(campaign)))
}

/// Active campaigns open to influencers
///
/// GET /api/influencer/campaigns
pub async fn list_active_campaigns(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
) -> Result<Json<Vec<Campaign>>, ApiError> {
    user.require(Role::Influencer)?;
    let query = Query::new()
        .select(CAMPAIGN_SELECT)
        .eq("status", CampaignStatus::Active)
        .order("created_at", Order::Desc);
    Ok(Json(list_with(&state, query, &user.credential()).await?))
}

/// Join an active campaign
///
/// POST /api/influencer/campaigns/:id/accept
pub async fn accept_campaign(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(campaign_id): Path<String>,
) -> Result<(StatusCode, Json<CampaignParticipant>), ApiError> {
    user.require(Role::Influencer)?;
    let influencer = own_influencer(&state, &user).await?;

    if !influencer.is_assignable() {
        return Err(ApiError::forbidden(
            "Your profile must be approved before accepting campaigns",
        ));
    }

    let campaign = list_with(
        &state,
        Query::new().eq("id", &campaign_id).limit(1),
        &user.credential(),
    )
    .await?
    .into_iter()
    .next()
    .ok_or_else(|| ApiError::not_found("Campaign not found"))?;

    if campaign.status != CampaignStatus::Active {
        return Err(ApiError::conflict(format!(
            "Campaign is {} and no longer accepting influencers",
            campaign.status
        )));
    }

    let rows = state
        .backend
        .insert(
            db::CAMPAIGN_PARTICIPANTS,
            json!({
                "campaign_id": id_value(&campaign.id),
                "influencer_id": id_value(&influencer.id),
                "status": "accepted",
                "joined_at": chrono::Utc::now().to_rfc3339(),
            }),
            &user.credential(),
        )
        .await
        .map_err(|e| ApiError::from_backend("Failed to accept campaign", e))?;

    let participant: CampaignParticipant = decode_first(rows)
        .map_err(|e| ApiError::from_backend("Failed to accept campaign", e))?
        .ok_or_else(|| ApiError::backend("Failed to accept campaign: no row returned"))?;

    tracing::info!(
        campaign_id = %campaign.id,
        influencer_id = %influencer.id,
        "Campaign accepted"
    );

    Ok((StatusCode::CREATED, Json(participant)))
}
