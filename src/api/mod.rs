mod assignments;
pub mod auth;
mod campaigns;
pub mod error;
mod influencers;
mod password_reset;
mod submissions;
mod system;
mod tasks;
mod upload;
mod validation;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    // Auth routes (public apart from session)
    let auth_routes = Router::new()
        .route("/login", post(auth::login))
        .route("/signup", post(auth::signup))
        .route("/session", get(auth::session))
        .route("/logout", post(auth::logout));

    // Admin console; every handler checks the admin role
    let admin_routes = Router::new()
        // Influencers
        .route("/influencers", get(influencers::list_influencers))
        .route(
            "/influencers/:id/status",
            put(influencers::update_influencer_status),
        )
        // Tasks and assignments
        .route("/tasks", get(tasks::list_tasks).post(tasks::create_task))
        .route(
            "/assignments",
            get(assignments::list_assignments).post(assignments::create_assignment),
        )
        .route("/assignments/defaults", post(assignments::assign_default_tasks))
        // Campaigns
        .route(
            "/campaigns",
            get(campaigns::list_all_campaigns).post(campaigns::admin_create_campaign),
        )
        // Submissions
        .route("/submissions", get(submissions::list_submissions))
        .route(
            "/submissions/:id/status",
            put(submissions::review_submission),
        )
        .route("/debug/schema", get(system::schema_probe));

    let brand_routes = Router::new().route(
        "/campaigns",
        get(campaigns::list_brand_campaigns).post(campaigns::brand_create_campaign),
    );

    let influencer_routes = Router::new()
        .route("/campaigns", get(campaigns::list_active_campaigns))
        .route("/campaigns/:id/accept", post(campaigns::accept_campaign))
        .route("/assignments", get(assignments::my_assignments))
        .route("/submissions", post(submissions::create_submission));

    let upload_limit = state.config.media.max_upload_bytes;

    Router::new()
        .route("/api/health-check", get(system::health_check))
        .route(
            "/api/request-password-reset",
            post(password_reset::request_password_reset),
        )
        .route(
            "/api/upload",
            post(upload::upload)
                .fallback(upload::upload_method_not_allowed)
                .layer(DefaultBodyLimit::max(upload_limit)),
        )
        .nest("/api/auth", auth_routes)
        .nest("/api/admin", admin_routes)
        .nest("/api/brand", brand_routes)
        .nest("/api/influencer", influencer_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
