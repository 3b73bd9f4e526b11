//! Video submissions and their review.

use axum::{
    extract::{Path, Query as QueryParams, State},
    http::StatusCode,
    Json,
};
use axum_extra::extract::WithRejection;
use serde_json::json;
use std::sync::Arc;

use crate::backend::{decode_first, decode_rows, Order, Query};
use crate::db::{
    self, id_value, AssignmentStatus, CreateSubmissionRequest, ReviewSubmissionRequest, Role,
    SubmissionListQuery, SubmissionStatus, TaskAssignment, VideoSubmission,
};
use crate::AppState;

use super::auth::CurrentUser;
use super::error::{ApiError, ValidationErrorBuilder};
use super::influencers::own_influencer;
use super::validation::{validate_media_url, validate_selected};

fn validate_create_request(req: &CreateSubmissionRequest) -> Result<String, ApiError> {
    let mut errors = ValidationErrorBuilder::new();

    let assignment_id = validate_selected(&req.assignment_id, "an assignment")
        .map_err(|e| {
            errors.add("assignment_id", e);
        })
        .ok();
    if let Err(e) = validate_media_url(&req.video_url) {
        errors.add("video_url", e);
    }

    errors.finish()?;
    assignment_id.ok_or_else(|| ApiError::bad_request("Please select an assignment"))
}

async fn set_assignment_status(
    state: &AppState,
    user: &CurrentUser,
    assignment_id: &str,
    status: AssignmentStatus,
) {
    let result = state
        .backend
        .update(
            db::TASK_ASSIGNMENTS,
            &Query::new().eq("id", assignment_id),
            json!({ "status": status }),
            &user.credential(),
        )
        .await;

    // The submission row is the record of truth; a stale assignment status
    // is only logged.
    if let Err(e) = result {
        tracing::warn!(
            assignment_id = %assignment_id,
            "Failed to mark assignment {}: {}",
            status,
            e
        );
    }
}

/// Submit a video for one of the caller's assignments
///
/// POST /api/influencer/submissions
pub async fn create_submission(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    WithRejection(Json(req), _): WithRejection<Json<CreateSubmissionRequest>, ApiError>,
) -> Result<(StatusCode, Json<VideoSubmission>), ApiError> {
    user.require(Role::Influencer)?;
    let assignment_id = validate_create_request(&req)?;
    let influencer = own_influencer(&state, &user).await?;

    let rows = state
        .backend
        .select(
            db::TASK_ASSIGNMENTS,
            &Query::new()
                .eq("id", &assignment_id)
                .eq("influencer_id", &influencer.id)
                .limit(1),
            &user.credential(),
        )
        .await
        .map_err(|e| ApiError::from_backend("Failed to load assignment", e))?;
    let assignment: TaskAssignment = decode_first(rows)
        .map_err(|e| ApiError::from_backend("Failed to load assignment", e))?
        .ok_or_else(|| ApiError::not_found("Assignment not found"))?;

    if assignment.status == AssignmentStatus::Completed {
        return Err(ApiError::conflict("This assignment is already completed"));
    }

    let rows = state
        .backend
        .insert(
            db::VIDEO_SUBMISSIONS,
            json!({
                "assignment_id": id_value(&assignment.id),
                "influencer_id": id_value(&influencer.id),
                "video_url": req.video_url.trim(),
                "caption": req.caption,
                "status": SubmissionStatus::Pending,
                "submitted_at": chrono::Utc::now().to_rfc3339(),
            }),
            &user.credential(),
        )
        .await
        .map_err(|e| ApiError::from_backend("Failed to submit video", e))?;

    let submission: VideoSubmission = decode_first(rows)
        .map_err(|e| ApiError::from_backend("Failed to submit video", e))?
        .ok_or_else(|| ApiError::backend("Failed to submit video: no row returned"))?;

    set_assignment_status(&state, &user, &assignment.id, AssignmentStatus::Submitted).await;

    tracing::info!(
        submission_id = %submission.id,
        assignment_id = %assignment.id,
        "Video submitted"
    );

    Ok((StatusCode::CREATED, Json(submission)))
}

/// List submissions for review, newest first
///
/// GET /api/admin/submissions?status=pending
pub async fn list_submissions(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    WithRejection(QueryParams(params), _): WithRejection<QueryParams<SubmissionListQuery>, ApiError>,
) -> Result<Json<Vec<VideoSubmission>>, ApiError> {
    user.require(Role::Admin)?;

    let query = Query::new()
        .eq_opt("status", params.status)
        .order("submitted_at", Order::Desc);

    let rows = state
        .backend
        .select(db::VIDEO_SUBMISSIONS, &query, &user.credential())
        .await
        .map_err(|e| ApiError::from_backend("Failed to load submissions", e))?;

    let submissions =
        decode_rows(rows).map_err(|e| ApiError::from_backend("Failed to load submissions", e))?;
    Ok(Json(submissions))
}

/// Approve or reject a submission
///
/// PUT /api/admin/submissions/:id/status
pub async fn review_submission(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<String>,
    WithRejection(Json(req), _): WithRejection<Json<ReviewSubmissionRequest>, ApiError>,
) -> Result<Json<VideoSubmission>, ApiError> {
    user.require(Role::Admin)?;

    if !matches!(req.status, SubmissionStatus::Approved | SubmissionStatus::Rejected) {
        return Err(ApiError::validation_field(
            "status",
            "A review must approve or reject the submission",
        ));
    }

    let rows = state
        .backend
        .update(
            db::VIDEO_SUBMISSIONS,
            &Query::new().eq("id", &id),
            json!({ "status": req.status, "feedback": req.feedback }),
            &user.credential(),
        )
        .await
        .map_err(|e| ApiError::from_backend("Failed to update submission", e))?;

    let submission: VideoSubmission = decode_first(rows)
        .map_err(|e| ApiError::from_backend("Failed to update submission", e))?
        .ok_or_else(|| ApiError::not_found("Submission not found"))?;

    let assignment_status = match &req.status {
        SubmissionStatus::Approved => AssignmentStatus::Completed,
        _ => AssignmentStatus::InProgress,
    };
    set_assignment_status(&state, &user, &submission.assignment_id, assignment_status).await;

    tracing::info!(submission_id = %id, status = %req.status, "Submission reviewed");

    Ok(Json(submission))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(assignment: Option<&str>, url: &str) -> CreateSubmissionRequest {
        CreateSubmissionRequest {
            assignment_id: assignment.map(str::to_string),
            video_url: url.to_string(),
            caption: None,
        }
    }

    #[test]
    fn test_validate_create_request() {
        let id = validate_create_request(&request(Some("12"), "https://cdn.example.com/v.mp4"))
            .unwrap();
        assert_eq!(id, "12");

        assert!(validate_create_request(&request(None, "https://cdn.example.com/v.mp4")).is_err());
        assert!(validate_create_request(&request(Some("12"), "not a url")).is_err());
        assert!(validate_create_request(&request(Some("12"), "")).is_err());
    }
}
