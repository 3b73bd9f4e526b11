//! Health check and backend schema probe.

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use std::sync::Arc;

use crate::backend::Query;
use crate::db::{self, Role};
use crate::AppState;

use super::auth::CurrentUser;
use super::error::ApiError;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub message: String,
}

impl HealthResponse {
    fn ok(message: impl Into<String>) -> (StatusCode, Json<Self>) {
        (
            StatusCode::OK,
            Json(Self {
                status: "ok",
                message: message.into(),
            }),
        )
    }

    fn error(message: impl Into<String>) -> (StatusCode, Json<Self>) {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(Self {
                status: "error",
                message: message.into(),
            }),
        )
    }
}

/// Backend connectivity check
///
/// GET /api/health-check
pub async fn health_check(State(state): State<Arc<AppState>>) -> (StatusCode, Json<HealthResponse>) {
    if !state.backend.is_configured() {
        return HealthResponse::error("Backend URL or anon key is not configured");
    }

    match state.backend.health().await {
        Ok(()) => HealthResponse::ok("Backend connection is healthy"),
        Err(e) => {
            tracing::warn!("Health check failed: {}", e);
            HealthResponse::error(format!("Backend health check failed: {}", e))
        }
    }
}

/// Result of probing one table
#[derive(Debug, Serialize)]
pub struct TableProbe {
    pub table: &'static str,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Select one row from every known table and report which are reachable
///
/// GET /api/admin/debug/schema
pub async fn schema_probe(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
) -> Result<Json<Vec<TableProbe>>, ApiError> {
    user.require(Role::Admin)?;

    let query = Query::new().limit(1);
    let credential = user.credential();
    let mut probes = Vec::with_capacity(db::ALL_TABLES.len());

    for &table in db::ALL_TABLES {
        let probe = match state.backend.select(table, &query, &credential).await {
            Ok(_) => TableProbe {
                table,
                ok: true,
                error: None,
            },
            Err(e) => TableProbe {
                table,
                ok: false,
                error: Some(e.to_string()),
            },
        };
        probes.push(probe);
    }

    let failed = probes.iter().filter(|p| !p.ok).count();
    tracing::info!(tables = probes.len(), failed, "Schema probe finished");

    Ok(Json(probes))
}
