//! Admin view of influencers and their approval state.

use axum::{
    extract::{Path, Query as QueryParams, State},
    Json,
};
use axum_extra::extract::WithRejection;
use serde_json::json;
use std::sync::Arc;

use crate::backend::{decode_first, decode_rows, Order, Query};
use crate::db::{
    self, Influencer, InfluencerListQuery, InfluencerStatus, Role, UpdateInfluencerStatusRequest,
};
use crate::AppState;

use super::auth::CurrentUser;
use super::error::ApiError;

/// List influencers by status (approved unless asked otherwise)
///
/// GET /api/admin/influencers?status=approved
pub async fn list_influencers(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    WithRejection(QueryParams(params), _): WithRejection<QueryParams<InfluencerListQuery>, ApiError>,
) -> Result<Json<Vec<Influencer>>, ApiError> {
    user.require(Role::Admin)?;

    let status = params.status.unwrap_or(InfluencerStatus::Approved);
    let query = Query::new()
        .eq("status", status)
        .order("full_name", Order::Asc);

    let rows = state
        .backend
        .select(db::INFLUENCERS, &query, &user.credential())
        .await
        .map_err(|e| ApiError::from_backend("Failed to load influencers", e))?;

    let influencers =
        decode_rows(rows).map_err(|e| ApiError::from_backend("Failed to load influencers", e))?;
    Ok(Json(influencers))
}

/// Approve or reject an influencer
///
/// PUT /api/admin/influencers/:id/status
pub async fn update_influencer_status(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<String>,
    WithRejection(Json(req), _): WithRejection<Json<UpdateInfluencerStatusRequest>, ApiError>,
) -> Result<Json<Influencer>, ApiError> {
    user.require(Role::Admin)?;

    if !req.status.is_known() {
        return Err(ApiError::validation_field(
            "status",
            format!("Unknown influencer status '{}'", req.status),
        ));
    }

    let rows = state
        .backend
        .update(
            db::INFLUENCERS,
            &Query::new().eq("id", &id),
            json!({ "status": req.status }),
            &user.credential(),
        )
        .await
        .map_err(|e| ApiError::from_backend("Failed to update influencer", e))?;

    let influencer: Influencer = decode_first(rows)
        .map_err(|e| ApiError::from_backend("Failed to update influencer", e))?
        .ok_or_else(|| ApiError::not_found("Influencer not found"))?;

    tracing::info!(influencer_id = %id, status = %req.status, "Influencer status updated");

    Ok(Json(influencer))
}

/// Load the caller's own influencer row.
pub async fn own_influencer(state: &AppState, user: &CurrentUser) -> Result<Influencer, ApiError> {
    let rows = state
        .backend
        .select(
            db::INFLUENCERS,
            &Query::new().eq("user_id", &user.user.id).limit(1),
            &user.credential(),
        )
        .await
        .map_err(|e| ApiError::from_backend("Failed to load influencer profile", e))?;

    decode_first(rows)
        .map_err(|e| ApiError::from_backend("Failed to load influencer profile", e))?
        .ok_or_else(|| ApiError::not_found("No influencer profile for this account"))
}
