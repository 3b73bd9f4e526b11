//! Admin task management.

use axum::{
    extract::{Query as QueryParams, State},
    http::StatusCode,
    Json,
};
use axum_extra::extract::WithRejection;
use serde_json::json;
use std::sync::Arc;

use crate::backend::{decode_first, decode_rows, Order, Query};
use crate::db::{self, current_period, CreateTaskRequest, Role, Task, TaskListQuery};
use crate::AppState;

use super::auth::CurrentUser;
use super::error::{ApiError, ValidationErrorBuilder};
use super::validation::{validate_amount, validate_month, validate_required, validate_year};

fn validate_create_request(req: &CreateTaskRequest) -> Result<(), ApiError> {
    let mut errors = ValidationErrorBuilder::new();

    if let Err(e) = validate_required(&req.title, "Title", 200) {
        errors.add("title", e);
    }
    if let Err(e) = validate_amount(req.reward_amount, "Reward amount") {
        errors.add("reward_amount", e);
    }
    if let Some(month) = req.month {
        if let Err(e) = validate_month(month) {
            errors.add("month", e);
        }
    }
    if let Some(year) = req.year {
        if let Err(e) = validate_year(year) {
            errors.add("year", e);
        }
    }

    errors.finish()
}

/// List tasks, newest first
///
/// GET /api/admin/tasks?month=&year=&default=
pub async fn list_tasks(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    WithRejection(QueryParams(params), _): WithRejection<QueryParams<TaskListQuery>, ApiError>,
) -> Result<Json<Vec<Task>>, ApiError> {
    user.require(Role::Admin)?;

    let query = Query::new()
        .eq_opt("month", params.month)
        .eq_opt("year", params.year)
        .eq_opt("is_default", params.is_default)
        .order("created_at", Order::Desc);

    let rows = state
        .backend
        .select(db::TASKS, &query, &user.credential())
        .await
        .map_err(|e| ApiError::from_backend("Failed to load tasks", e))?;

    let tasks = decode_rows(rows).map_err(|e| ApiError::from_backend("Failed to load tasks", e))?;
    Ok(Json(tasks))
}

/// Create a task
///
/// POST /api/admin/tasks
pub async fn create_task(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    WithRejection(Json(req), _): WithRejection<Json<CreateTaskRequest>, ApiError>,
) -> Result<(StatusCode, Json<Task>), ApiError> {
    user.require(Role::Admin)?;
    validate_create_request(&req)?;

    let (current_month, current_year) = current_period();

    let payload = json!({
        "title": req.title.trim(),
        "description": req.description,
        "topic": req.topic,
        "guidelines": req.guidelines,
        "reward_amount": req.reward_amount,
        "month": req.month.unwrap_or(current_month),
        "year": req.year.unwrap_or(current_year),
        "is_default": req.is_default,
        "created_at": chrono::Utc::now().to_rfc3339(),
    });

    let rows = state
        .backend
        .insert(db::TASKS, payload, &user.credential())
        .await
        .map_err(|e| ApiError::from_backend("Failed to create task", e))?;

    let task: Task = decode_first(rows)
        .map_err(|e| ApiError::from_backend("Failed to create task", e))?
        .ok_or_else(|| ApiError::backend("Failed to create task: no row returned"))?;

    tracing::info!(task_id = %task.id, title = %task.title, "Task created");

    Ok((StatusCode::CREATED, Json(task)))
}
