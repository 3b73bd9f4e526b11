//! Admin-side password reset.
//!
//! The platform's user admin API has no lookup by email, so users are paged
//! through and matched client-side. The generated password is delivered by
//! writing it to the server log.

use axum::{extract::State, Json};
use axum_extra::extract::WithRejection;
use rand::Rng;
use std::sync::Arc;

use crate::backend::{AuthUser, Backend};
use crate::db::{MessageResponse, PasswordResetRequest};
use crate::AppState;

use super::error::ApiError;
use super::validation::validate_email;

const USERS_PER_PAGE: u32 = 1000;
const GENERATED_PASSWORD_LEN: usize = 8;

fn generate_password() -> String {
    const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
    let mut rng = rand::rng();
    (0..GENERATED_PASSWORD_LEN)
        .map(|_| CHARSET[rng.random_range(0..CHARSET.len())] as char)
        .collect()
}

/// Page through every user until one matches `email` or a short page ends
/// the listing.
async fn find_user_by_email(
    backend: &dyn Backend,
    email: &str,
    per_page: u32,
) -> Result<Option<AuthUser>, ApiError> {
    let mut page = 1;
    loop {
        let users = backend
            .list_users(page, per_page)
            .await
            .map_err(|e| ApiError::from_backend("Failed to list users", e))?;
        let last_page = (users.len() as u32) < per_page;

        if let Some(user) = users.into_iter().find(|u| u.email_matches(email)) {
            return Ok(Some(user));
        }
        if last_page {
            return Ok(None);
        }
        page += 1;
    }
}

/// Reset a user's password to a generated one
///
/// POST /api/request-password-reset
pub async fn request_password_reset(
    State(state): State<Arc<AppState>>,
    WithRejection(Json(req), _): WithRejection<Json<PasswordResetRequest>, ApiError>,
) -> Result<Json<MessageResponse>, ApiError> {
    let email = req.email.trim();
    validate_email(email).map_err(ApiError::bad_request)?;

    if !state.backend.has_service_role() {
        return Err(ApiError::internal(
            "Password reset is unavailable: the service role key is not configured",
        ));
    }

    let user = find_user_by_email(state.backend.as_ref(), email, USERS_PER_PAGE)
        .await?
        .ok_or_else(|| ApiError::not_found("No account found with that email"))?;

    let password = generate_password();
    state
        .backend
        .update_user_password(&user.id, &password)
        .await
        .map_err(|e| ApiError::from_backend("Failed to reset password", e))?;

    // There is no mail transport; the log is the delivery channel.
    tracing::info!(user_id = %user.id, email = %email, password = %password, "Password reset");

    Ok(Json(MessageResponse {
        message: "A new password has been generated and sent".to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::memory::MemoryBackend;

    #[test]
    fn test_generate_password() {
        let password = generate_password();
        assert_eq!(password.len(), GENERATED_PASSWORD_LEN);
        assert!(password.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(generate_password(), generate_password());
    }

    #[tokio::test]
    async fn test_find_user_on_later_page() {
        let backend = MemoryBackend::new();
        for n in 1..=5 {
            backend.add_user(&format!("user{}@example.com", n), "secret1", "influencer");
        }

        let user = find_user_by_email(&backend, "USER5@example.com", 2)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(user.email.as_deref(), Some("user5@example.com"));
        assert_eq!(backend.calls(), 3);

        // An exact multiple of the page size needs one more, empty page
        let backend = MemoryBackend::new();
        for n in 1..=4 {
            backend.add_user(&format!("user{}@example.com", n), "secret1", "influencer");
        }
        let missing = find_user_by_email(&backend, "nobody@example.com", 2)
            .await
            .unwrap();
        assert!(missing.is_none());
        assert_eq!(backend.calls(), 3);
    }
}
