//! Monthly task assignments.
//!
//! An assignment links one approved influencer to one task for a
//! month/year. Duplicate assignments are not checked here; uniqueness, if
//! any, is the backend schema's concern.

use axum::{
    extract::{Query as QueryParams, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use axum_extra::extract::WithRejection;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::backend::{decode_first, decode_rows, Order, Query};
use crate::db::{
    self, current_period, id_value, AssignDefaultsRequest, AssignmentListQuery, AssignmentStatus,
    CreateAssignmentRequest, Influencer, Role, Task, TaskAssignment,
};
use crate::AppState;

use super::auth::CurrentUser;
use super::error::{ApiError, ValidationErrorBuilder};
use super::influencers::own_influencer;
use super::validation::{validate_month, validate_selected, validate_year};

const ASSIGNMENT_SELECT: &str = "*,tasks(*),influencers(full_name,email)";

/// Validated `(influencer_id, task_id, month, year)`
type AssignmentInput = (String, String, u32, i32);

fn validate_period(
    errors: &mut ValidationErrorBuilder,
    month: Option<u32>,
    year: Option<i32>,
) -> (u32, i32) {
    let (current_month, current_year) = current_period();
    let month = month.unwrap_or(current_month);
    let year = year.unwrap_or(current_year);

    if let Err(e) = validate_month(month) {
        errors.add("month", e);
    }
    if let Err(e) = validate_year(year) {
        errors.add("year", e);
    }

    (month, year)
}

fn validate_create_request(req: &CreateAssignmentRequest) -> Result<AssignmentInput, ApiError> {
    let mut errors = ValidationErrorBuilder::new();

    let influencer_id = validate_selected(&req.influencer_id, "an influencer")
        .map_err(|e| {
            errors.add("influencer_id", e);
        })
        .ok();
    let task_id = validate_selected(&req.task_id, "a task")
        .map_err(|e| {
            errors.add("task_id", e);
        })
        .ok();
    let (month, year) = validate_period(&mut errors, req.month, req.year);

    errors.finish()?;

    match (influencer_id, task_id) {
        (Some(influencer_id), Some(task_id)) => Ok((influencer_id, task_id, month, year)),
        _ => Err(ApiError::bad_request("Please select both an influencer and a task")),
    }
}

/// Insert payload for one assignment. Ids keep the column's native type.
fn assignment_row(influencer_id: &str, task_id: &str, month: u32, year: i32) -> Value {
    json!({
        "influencer_id": id_value(influencer_id),
        "task_id": id_value(task_id),
        "month": month,
        "year": year,
        "status": AssignmentStatus::Assigned,
        "assigned_at": chrono::Utc::now().to_rfc3339(),
    })
}

/// Fail unless the influencer exists and is approved.
async fn ensure_assignable(
    state: &AppState,
    user: &CurrentUser,
    influencer_id: &str,
) -> Result<(), ApiError> {
    let rows = state
        .backend
        .select(
            db::INFLUENCERS,
            &Query::new().eq("id", influencer_id).limit(1),
            &user.credential(),
        )
        .await
        .map_err(|e| ApiError::from_backend("Failed to load influencer", e))?;

    let influencer: Influencer = decode_first(rows)
        .map_err(|e| ApiError::from_backend("Failed to load influencer", e))?
        .ok_or_else(|| ApiError::not_found("Influencer not found"))?;

    if !influencer.is_assignable() {
        return Err(ApiError::validation_field(
            "influencer_id",
            format!("Influencer is {}, only approved influencers can be assigned", influencer.status),
        ));
    }

    Ok(())
}

/// List assignments with their task and influencer
///
/// GET /api/admin/assignments?month=&year=&influencer_id=
pub async fn list_assignments(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    WithRejection(QueryParams(params), _): WithRejection<QueryParams<AssignmentListQuery>, ApiError>,
) -> Result<Json<Vec<TaskAssignment>>, ApiError> {
    user.require(Role::Admin)?;

    let query = Query::new()
        .select(ASSIGNMENT_SELECT)
        .eq_opt("month", params.month)
        .eq_opt("year", params.year)
        .eq_opt("influencer_id", params.influencer_id)
        .order("assigned_at", Order::Desc);

    let rows = state
        .backend
        .select(db::TASK_ASSIGNMENTS, &query, &user.credential())
        .await
        .map_err(|e| ApiError::from_backend("Failed to load task assignments", e))?;

    let assignments = decode_rows(rows)
        .map_err(|e| ApiError::from_backend("Failed to load task assignments", e))?;
    Ok(Json(assignments))
}

/// Assign one task to one influencer
///
/// POST /api/admin/assignments
///
/// Both selections are checked before any backend call is made.
pub async fn create_assignment(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    WithRejection(Json(req), _): WithRejection<Json<CreateAssignmentRequest>, ApiError>,
) -> Result<(StatusCode, Json<TaskAssignment>), ApiError> {
    let (influencer_id, task_id, month, year) = validate_create_request(&req)?;

    let user = CurrentUser::authenticate(&state, &headers).await?;
    user.require(Role::Admin)?;
    ensure_assignable(&state, &user, &influencer_id).await?;

    let rows = state
        .backend
        .insert(
            db::TASK_ASSIGNMENTS,
            assignment_row(&influencer_id, &task_id, month, year),
            &user.credential(),
        )
        .await
        .map_err(|e| ApiError::from_backend("Failed to create task assignment", e))?;

    let assignment: TaskAssignment = decode_first(rows)
        .map_err(|e| ApiError::from_backend("Failed to create task assignment", e))?
        .ok_or_else(|| ApiError::backend("Failed to create task assignment: no row returned"))?;

    tracing::info!(
        influencer_id = %influencer_id,
        task_id = %task_id,
        month,
        year,
        "Task assigned"
    );

    Ok((StatusCode::CREATED, Json(assignment)))
}

/// Assign every default task to an influencer for a period
///
/// POST /api/admin/assignments/defaults
pub async fn assign_default_tasks(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    WithRejection(Json(req), _): WithRejection<Json<AssignDefaultsRequest>, ApiError>,
) -> Result<(StatusCode, Json<Vec<TaskAssignment>>), ApiError> {
    user.require(Role::Admin)?;

    let mut errors = ValidationErrorBuilder::new();
    let influencer_id = validate_selected(&req.influencer_id, "an influencer")
        .map_err(|e| {
            errors.add("influencer_id", e);
        })
        .ok();
    let (month, year) = validate_period(&mut errors, req.month, req.year);
    errors.finish()?;
    let influencer_id =
        influencer_id.ok_or_else(|| ApiError::bad_request("Please select an influencer"))?;

    ensure_assignable(&state, &user, &influencer_id).await?;

    let rows = state
        .backend
        .select(
            db::TASKS,
            &Query::new().eq("is_default", true),
            &user.credential(),
        )
        .await
        .map_err(|e| ApiError::from_backend("Failed to load default tasks", e))?;
    let tasks: Vec<Task> =
        decode_rows(rows).map_err(|e| ApiError::from_backend("Failed to load default tasks", e))?;

    if tasks.is_empty() {
        return Err(ApiError::not_found("There are no default tasks to assign"));
    }

    let payload: Vec<Value> = tasks
        .iter()
        .map(|task| assignment_row(&influencer_id, &task.id, month, year))
        .collect();

    let rows = state
        .backend
        .insert(db::TASK_ASSIGNMENTS, Value::Array(payload), &user.credential())
        .await
        .map_err(|e| ApiError::from_backend("Failed to assign default tasks", e))?;
    let assignments: Vec<TaskAssignment> = decode_rows(rows)
        .map_err(|e| ApiError::from_backend("Failed to assign default tasks", e))?;

    tracing::info!(
        influencer_id = %influencer_id,
        count = assignments.len(),
        month,
        year,
        "Default tasks assigned"
    );

    Ok((StatusCode::CREATED, Json(assignments)))
}

/// The caller's own assignments
///
/// GET /api/influencer/assignments
pub async fn my_assignments(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    WithRejection(QueryParams(params), _): WithRejection<QueryParams<AssignmentListQuery>, ApiError>,
) -> Result<Json<Vec<TaskAssignment>>, ApiError> {
    user.require(Role::Influencer)?;
    let influencer = own_influencer(&state, &user).await?;

    let query = Query::new()
        .select("*,tasks(*)")
        .eq("influencer_id", &influencer.id)
        .eq_opt("month", params.month)
        .eq_opt("year", params.year)
        .order("assigned_at", Order::Desc);

    let rows = state
        .backend
        .select(db::TASK_ASSIGNMENTS, &query, &user.credential())
        .await
        .map_err(|e| ApiError::from_backend("Failed to load your tasks", e))?;

    let assignments =
        decode_rows(rows).map_err(|e| ApiError::from_backend("Failed to load your tasks", e))?;
    Ok(Json(assignments))
}
