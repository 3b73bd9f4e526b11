//! Session resolution and the login/sign-up endpoints.
//!
//! Identity lives on the platform: a request is authenticated by handing its
//! access token back to the auth API, and the role comes from the caller's
//! `profiles` row.

use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequestParts, State},
    http::{request::Parts, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::extract::{
    cookie::{Cookie, CookieJar, SameSite},
    WithRejection,
};
use serde_json::json;
use std::sync::Arc;

use crate::backend::{decode_first, AuthUser, Backend, BackendError, Credential, Query};
use crate::db::{
    self, LoginRequest, LoginResponse, MessageResponse, Profile, Role, SessionResponse,
    SignupRequest, UserResponse,
};
use crate::AppState;

use super::error::{ApiError, ValidationErrorBuilder};
use super::validation::{validate_email, validate_password, validate_required};

/// Cookie carrying the access token for browser sessions
pub const SESSION_COOKIE: &str = "access_token";

/// The authenticated caller of a request.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub user: AuthUser,
    pub role: Role,
    pub access_token: String,
}

impl CurrentUser {
    /// Reject callers whose role differs from `role`.
    pub fn require(&self, role: Role) -> Result<(), ApiError> {
        if self.role == role {
            Ok(())
        } else {
            Err(ApiError::forbidden(format!(
                "This action requires the {} role",
                role
            )))
        }
    }

    /// Credential for table calls made on this user's behalf.
    pub fn credential(&self) -> Credential {
        Credential::user(&self.access_token)
    }
}

/// Extract the token from the Authorization header or the session cookie
fn extract_token(headers: &HeaderMap) -> Option<String> {
    if let Some(auth_header) = headers.get("Authorization").and_then(|h| h.to_str().ok()) {
        if let Some(token) = auth_header.strip_prefix("Bearer ") {
            return Some(token.trim().to_string());
        }
    }

    CookieJar::from_headers(headers)
        .get(SESSION_COOKIE)
        .map(|c| c.value().to_string())
        .filter(|v| !v.is_empty())
}

/// Look up the role for `user`: the `profiles` row first, then the role
/// stored in user metadata at sign-up.
pub async fn resolve_role(
    backend: &dyn Backend,
    user: &AuthUser,
    access_token: &str,
) -> Result<Role, ApiError> {
    let rows = backend
        .select(
            db::PROFILES,
            &Query::new().select("id,email,full_name,role").eq("id", &user.id).limit(1),
            &Credential::user(access_token),
        )
        .await
        .map_err(|e| ApiError::from_backend("Failed to load profile", e))?;

    let profile: Option<Profile> =
        decode_first(rows).map_err(|e| ApiError::from_backend("Failed to load profile", e))?;

    let role = profile
        .map(|p| p.role)
        .or_else(|| user.metadata_role().map(str::to_string))
        .ok_or_else(|| ApiError::forbidden("No role is assigned to this account"))?;

    role.parse::<Role>().map_err(ApiError::forbidden)
}

/// Get the current user from a token
pub async fn get_current_user(
    backend: &dyn Backend,
    token: &str,
) -> Result<CurrentUser, ApiError> {
    let user = backend.get_user(token).await.map_err(|e| match e {
        BackendError::Api { status: 401 | 403, .. } => {
            ApiError::unauthorized("Session is invalid or has expired")
        }
        other => ApiError::from_backend("Failed to verify session", other),
    })?;

    let role = resolve_role(backend, &user, token).await?;

    Ok(CurrentUser {
        user,
        role,
        access_token: token.to_string(),
    })
}

/// Extractor for getting the current authenticated user from a request
#[async_trait]
impl FromRequestParts<Arc<AppState>> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        CurrentUser::authenticate(state, &parts.headers).await
    }
}

impl CurrentUser {
    /// Resolve the caller from request headers. Handlers that must check
    /// their input before touching the backend call this directly instead of
    /// using the extractor.
    pub async fn authenticate(state: &AppState, headers: &HeaderMap) -> Result<Self, ApiError> {
        let token = extract_token(headers)
            .ok_or_else(|| ApiError::unauthorized("Authentication required"))?;
        get_current_user(state.backend.as_ref(), &token).await
    }
}

fn session_cookie(token: String, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .build()
}

fn login_failed(status: StatusCode, error: impl Into<String>) -> Response {
    (status, Json(LoginResponse::failed(error))).into_response()
}

/// Login endpoint
///
/// POST /api/auth/login
///
/// Every failure, including an unreadable body, comes back as
/// `success: false` with a single error string.
pub async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Response {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => return login_failed(StatusCode::BAD_REQUEST, rejection.body_text()),
    };

    if request.email.trim().is_empty() || request.password.is_empty() {
        return login_failed(StatusCode::BAD_REQUEST, "Email and password are required");
    }

    let session = match state
        .backend
        .sign_in(request.email.trim(), &request.password)
        .await
    {
        Ok(session) => session,
        Err(e) => {
            tracing::info!(email = %request.email, error = %e, "Login failed");
            return login_failed(StatusCode::UNAUTHORIZED, e.to_string());
        }
    };

    let role = match resolve_role(state.backend.as_ref(), &session.user, &session.access_token).await
    {
        Ok(role) => role,
        Err(e) => return login_failed(StatusCode::UNAUTHORIZED, e.to_string()),
    };

    if let Some(expected) = request.expected_role {
        if expected != role {
            if let Err(e) = state.backend.sign_out(&session.access_token).await {
                tracing::warn!("Failed to revoke session after role mismatch: {}", e);
            }
            return login_failed(
                StatusCode::UNAUTHORIZED,
                format!("This account is not registered as {}", expected),
            );
        }
    }

    tracing::info!(user_id = %session.user.id, role = %role, "User logged in");

    let jar = jar.add(session_cookie(
        session.access_token.clone(),
        state.config.server.secure_cookies,
    ));

    (
        jar,
        Json(LoginResponse {
            success: true,
            role: Some(role),
            error: None,
            redirect: Some(role.home_path().to_string()),
            access_token: Some(session.access_token),
        }),
    )
        .into_response()
}

/// Current session
///
/// GET /api/auth/session
pub async fn session(user: CurrentUser) -> Json<SessionResponse> {
    Json(SessionResponse {
        role: user.role,
        user: UserResponse::from(user.user),
    })
}

/// Revoke the token and clear the cookie. Always succeeds for the client.
///
/// POST /api/auth/logout
pub async fn logout(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    jar: CookieJar,
) -> (CookieJar, Json<MessageResponse>) {
    if let Some(token) = extract_token(&headers) {
        if let Err(e) = state.backend.sign_out(&token).await {
            tracing::warn!("Failed to revoke session: {}", e);
        }
    }

    let jar = jar.remove(Cookie::build(SESSION_COOKIE).path("/").build());
    (
        jar,
        Json(MessageResponse {
            message: "Logged out".to_string(),
        }),
    )
}

fn validate_signup(req: &SignupRequest) -> Result<(), ApiError> {
    let mut errors = ValidationErrorBuilder::new();

    if let Err(e) = validate_email(&req.email) {
        errors.add("email", e);
    }
    if let Err(e) = validate_password(&req.password) {
        errors.add("password", e);
    }
    if let Err(e) = validate_required(&req.full_name, "Full name", 120) {
        errors.add("full_name", e);
    }

    errors.finish()
}

/// The auth user already exists when a row insert fails, so record its id
/// for cleanup.
fn orphaned_account(user_id: &str, context: &str, err: BackendError) -> ApiError {
    tracing::warn!(user_id = %user_id, "Sign-up left an auth user without its rows");
    ApiError::from_backend(context, err)
}

/// Register an influencer or brand account
///
/// POST /api/auth/signup
pub async fn signup(
    State(state): State<Arc<AppState>>,
    WithRejection(Json(req), _): WithRejection<Json<SignupRequest>, ApiError>,
) -> Result<(StatusCode, Json<SessionResponse>), ApiError> {
    validate_signup(&req)?;

    if req.role == Role::Admin {
        return Err(ApiError::forbidden("Admin accounts cannot be self-registered"));
    }

    let email = req.email.trim();
    let full_name = req.full_name.trim();

    let user = state
        .backend
        .sign_up(
            email,
            &req.password,
            json!({ "role": req.role.as_str(), "full_name": full_name }),
        )
        .await
        .map_err(|e| ApiError::from_backend("Failed to create account", e))?;

    // The new user has no session yet, so row inserts go through the
    // service role when it is available
    let credential = if state.backend.has_service_role() {
        Credential::Service
    } else {
        Credential::Anon
    };

    state
        .backend
        .insert(
            db::PROFILES,
            json!({
                "id": user.id,
                "email": email,
                "full_name": full_name,
                "role": req.role.as_str(),
            }),
            &credential,
        )
        .await
        .map_err(|e| orphaned_account(&user.id, "Failed to create profile", e))?;

    match req.role {
        Role::Influencer => {
            state
                .backend
                .insert(
                    db::INFLUENCERS,
                    json!({
                        "user_id": user.id,
                        "full_name": full_name,
                        "email": email,
                        "platform": req.platform,
                        "status": "pending",
                    }),
                    &credential,
                )
                .await
                .map_err(|e| {
                    orphaned_account(&user.id, "Failed to create influencer profile", e)
                })?;
        }
        Role::Marketing => {
            let name = req
                .company_name
                .as_deref()
                .map(str::trim)
                .filter(|n| !n.is_empty())
                .unwrap_or(full_name);
            state
                .backend
                .insert(
                    db::BRANDS,
                    json!({ "user_id": user.id, "name": name }),
                    &credential,
                )
                .await
                .map_err(|e| orphaned_account(&user.id, "Failed to create brand", e))?;
        }
        Role::Admin => {}
    }

    tracing::info!(user_id = %user.id, role = %req.role, "Account registered");

    Ok((
        StatusCode::CREATED,
        Json(SessionResponse {
            role: req.role,
            user: UserResponse::from(user),
        }),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_extract_token_prefers_bearer() {
        let mut headers = HeaderMap::new();
        headers.insert("Authorization", HeaderValue::from_static("Bearer abc"));
        headers.insert("Cookie", HeaderValue::from_static("access_token=cookie-token"));
        assert_eq!(extract_token(&headers).as_deref(), Some("abc"));
    }

    #[test]
    fn test_extract_token_from_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert("Cookie", HeaderValue::from_static("theme=dark; access_token=xyz"));
        assert_eq!(extract_token(&headers).as_deref(), Some("xyz"));

        let empty = HeaderMap::new();
        assert!(extract_token(&empty).is_none());
    }

    #[test]
    fn test_require_role() {
        let user = CurrentUser {
            user: AuthUser {
                id: "u1".to_string(),
                email: None,
                user_metadata: serde_json::Value::Null,
                created_at: None,
                last_sign_in_at: None,
            },
            role: Role::Influencer,
            access_token: "t".to_string(),
        };
        assert!(user.require(Role::Influencer).is_ok());
        assert!(user.require(Role::Admin).is_err());
    }
}
