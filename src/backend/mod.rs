//! Client for the hosted database/auth platform.
//!
//! Every handler talks to the platform through the [`Backend`] trait. The
//! production implementation, [`RestBackend`], speaks the PostgREST table API
//! (`/rest/v1`) and the GoTrue auth API (`/auth/v1`). One instance is built at
//! startup and shared through `AppState`.

mod error;
#[cfg(test)]
pub mod memory;
mod query;
mod rest;

pub use error::BackendError;
pub use query::{Filter, Order, Query};
pub use rest::RestBackend;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;

/// Which key a table request is made with.
///
/// `User` forwards the caller's access token so row-level security applies
/// to them; `Service` bypasses it and is reserved for admin operations.
#[derive(Debug, Clone)]
pub enum Credential {
    Anon,
    User(String),
    Service,
}

impl Credential {
    pub fn user(token: &str) -> Self {
        Credential::User(token.to_string())
    }
}

/// An identity as reported by the auth API.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuthUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub user_metadata: Value,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub last_sign_in_at: Option<String>,
}

impl AuthUser {
    /// Role recorded in the user's metadata at sign-up, if any.
    pub fn metadata_role(&self) -> Option<&str> {
        self.user_metadata.get("role").and_then(|r| r.as_str())
    }

    pub fn email_matches(&self, email: &str) -> bool {
        self.email
            .as_deref()
            .is_some_and(|e| e.eq_ignore_ascii_case(email.trim()))
    }
}

/// Tokens returned by a successful password sign-in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthSession {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<i64>,
    pub user: AuthUser,
}

#[async_trait]
pub trait Backend: Send + Sync {
    /// Whether URL and anon key were provided.
    fn is_configured(&self) -> bool;

    /// Whether the service-role key was provided.
    fn has_service_role(&self) -> bool;

    /// Ping the auth API.
    async fn health(&self) -> Result<(), BackendError>;

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, BackendError>;

    /// Register a user; `data` is stored as the user's metadata.
    async fn sign_up(&self, email: &str, password: &str, data: Value)
        -> Result<AuthUser, BackendError>;

    /// Resolve an access token to its user.
    async fn get_user(&self, access_token: &str) -> Result<AuthUser, BackendError>;

    async fn sign_out(&self, access_token: &str) -> Result<(), BackendError>;

    /// One page (1-based) of every registered user. Service role only.
    async fn list_users(&self, page: u32, per_page: u32) -> Result<Vec<AuthUser>, BackendError>;

    /// Overwrite a user's password. Service role only.
    async fn update_user_password(&self, user_id: &str, password: &str)
        -> Result<(), BackendError>;

    async fn select(
        &self,
        table: &str,
        query: &Query,
        credential: &Credential,
    ) -> Result<Vec<Value>, BackendError>;

    /// Insert one row or an array of rows, returning the stored representation.
    async fn insert(
        &self,
        table: &str,
        rows: Value,
        credential: &Credential,
    ) -> Result<Vec<Value>, BackendError>;

    /// Patch every row matching `query`, returning the updated rows.
    async fn update(
        &self,
        table: &str,
        query: &Query,
        patch: Value,
        credential: &Credential,
    ) -> Result<Vec<Value>, BackendError>;
}

/// Decode raw rows into typed models.
pub fn decode_rows<T: DeserializeOwned>(rows: Vec<Value>) -> Result<Vec<T>, BackendError> {
    rows.into_iter()
        .map(|row| serde_json::from_value(row).map_err(|e| BackendError::Decode(e.to_string())))
        .collect()
}

/// Decode the first row, if any.
pub fn decode_first<T: DeserializeOwned>(rows: Vec<Value>) -> Result<Option<T>, BackendError> {
    match rows.into_iter().next() {
        Some(row) => serde_json::from_value(row)
            .map(Some)
            .map_err(|e| BackendError::Decode(e.to_string())),
        None => Ok(None),
    }
}
