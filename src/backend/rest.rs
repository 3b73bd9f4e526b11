use async_trait::async_trait;
use reqwest::{header, Method, RequestBuilder, Response};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use super::{AuthSession, AuthUser, Backend, BackendError, Credential, Query};
use crate::config::BackendConfig;

/// HTTP client for a Supabase-style project.
pub struct RestBackend {
    client: reqwest::Client,
    url: String,
    anon_key: String,
    service_role_key: Option<String>,
}

impl RestBackend {
    /// Build the shared client. Missing parameters are logged, not fatal;
    /// calls then fail with [`BackendError::NotConfigured`].
    pub fn new(config: &BackendConfig) -> Self {
        if !config.is_configured() {
            warn!("Backend URL or anon key missing; the backend client is unconfigured");
        }

        let url = config
            .url
            .as_deref()
            .unwrap_or_default()
            .trim()
            .trim_end_matches('/')
            .to_string();

        Self {
            client: reqwest::Client::builder()
                .user_agent(concat!("creatorhub/", env!("CARGO_PKG_VERSION")))
                .build()
                .unwrap_or_default(),
            url,
            anon_key: config.anon_key.clone().unwrap_or_default(),
            service_role_key: config
                .service_role_key
                .clone()
                .filter(|k| !k.trim().is_empty()),
        }
    }

    fn ensure_configured(&self) -> Result<(), BackendError> {
        if self.url.is_empty() || self.anon_key.is_empty() {
            return Err(BackendError::NotConfigured);
        }
        Ok(())
    }

    fn service_key(&self) -> Result<&str, BackendError> {
        self.service_role_key
            .as_deref()
            .ok_or(BackendError::MissingServiceKey)
    }

    /// Start a request with `apikey` and bearer headers for `credential`.
    fn request(
        &self,
        method: Method,
        path: &str,
        credential: &Credential,
    ) -> Result<RequestBuilder, BackendError> {
        self.ensure_configured()?;

        let (apikey, bearer) = match credential {
            Credential::Anon => (self.anon_key.as_str(), self.anon_key.as_str()),
            Credential::User(token) => (self.anon_key.as_str(), token.as_str()),
            Credential::Service => {
                let key = self.service_key()?;
                (key, key)
            }
        };

        Ok(self
            .client
            .request(method, format!("{}{}", self.url, path))
            .header("apikey", apikey)
            .header(header::AUTHORIZATION, format!("Bearer {}", bearer)))
    }

    async fn send(builder: RequestBuilder) -> Result<Response, BackendError> {
        let response = builder.send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            debug!(status = status.as_u16(), body = %body, "Backend request failed");
            return Err(BackendError::from_body(status.as_u16(), &body));
        }

        Ok(response)
    }

    async fn send_json(builder: RequestBuilder) -> Result<Value, BackendError> {
        let response = Self::send(builder).await?;
        let text = response.text().await?;
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&text).map_err(|e| BackendError::Decode(e.to_string()))
    }

    fn into_rows(value: Value) -> Vec<Value> {
        match value {
            Value::Array(rows) => rows,
            Value::Null => Vec::new(),
            other => vec![other],
        }
    }
}

#[derive(Deserialize)]
struct ListUsersResponse {
    #[serde(default)]
    users: Vec<AuthUser>,
}

#[async_trait]
impl Backend for RestBackend {
    fn is_configured(&self) -> bool {
        self.ensure_configured().is_ok()
    }

    fn has_service_role(&self) -> bool {
        self.service_role_key.is_some()
    }

    async fn health(&self) -> Result<(), BackendError> {
        let builder = self.request(Method::GET, "/auth/v1/health", &Credential::Anon)?;
        Self::send(builder).await?;
        Ok(())
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, BackendError> {
        let builder = self
            .request(
                Method::POST,
                "/auth/v1/token?grant_type=password",
                &Credential::Anon,
            )?
            .json(&json!({ "email": email, "password": password }));

        let value = Self::send_json(builder).await?;
        serde_json::from_value(value).map_err(|e| BackendError::Decode(e.to_string()))
    }

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        data: Value,
    ) -> Result<AuthUser, BackendError> {
        let builder = self
            .request(Method::POST, "/auth/v1/signup", &Credential::Anon)?
            .json(&json!({ "email": email, "password": password, "data": data }));

        let mut value = Self::send_json(builder).await?;

        // With auto-confirm on, the user comes wrapped in a session
        let wrapped = value.get_mut("user").map(Value::take);
        if let Some(user) = wrapped.filter(|u| !u.is_null()) {
            value = user;
        }

        serde_json::from_value(value).map_err(|e| BackendError::Decode(e.to_string()))
    }

    async fn get_user(&self, access_token: &str) -> Result<AuthUser, BackendError> {
        let builder = self.request(
            Method::GET,
            "/auth/v1/user",
            &Credential::user(access_token),
        )?;
        let value = Self::send_json(builder).await?;
        serde_json::from_value(value).map_err(|e| BackendError::Decode(e.to_string()))
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), BackendError> {
        let builder = self.request(
            Method::POST,
            "/auth/v1/logout",
            &Credential::user(access_token),
        )?;
        Self::send(builder).await?;
        Ok(())
    }

    async fn list_users(&self, page: u32, per_page: u32) -> Result<Vec<AuthUser>, BackendError> {
        let builder = self
            .request(Method::GET, "/auth/v1/admin/users", &Credential::Service)?
            .query(&[("page", page), ("per_page", per_page)]);

        let value = Self::send_json(builder).await?;
        let response: ListUsersResponse =
            serde_json::from_value(value).map_err(|e| BackendError::Decode(e.to_string()))?;
        Ok(response.users)
    }

    async fn update_user_password(
        &self,
        user_id: &str,
        password: &str,
    ) -> Result<(), BackendError> {
        let builder = self
            .request(
                Method::PUT,
                &format!("/auth/v1/admin/users/{}", user_id),
                &Credential::Service,
            )?
            .json(&json!({ "password": password }));

        Self::send(builder).await?;
        Ok(())
    }

    async fn select(
        &self,
        table: &str,
        query: &Query,
        credential: &Credential,
    ) -> Result<Vec<Value>, BackendError> {
        let builder = self
            .request(Method::GET, &format!("/rest/v1/{}", table), credential)?
            .query(&query.to_pairs());

        Self::send_json(builder).await.map(Self::into_rows)
    }

    async fn insert(
        &self,
        table: &str,
        rows: Value,
        credential: &Credential,
    ) -> Result<Vec<Value>, BackendError> {
        let builder = self
            .request(Method::POST, &format!("/rest/v1/{}", table), credential)?
            .header("Prefer", "return=representation")
            .json(&rows);

        Self::send_json(builder).await.map(Self::into_rows)
    }

    async fn update(
        &self,
        table: &str,
        query: &Query,
        patch: Value,
        credential: &Credential,
    ) -> Result<Vec<Value>, BackendError> {
        // PATCH takes filters only; `select` shapes the returned representation
        let builder = self
            .request(Method::PATCH, &format!("/rest/v1/{}", table), credential)?
            .query(&query.to_pairs())
            .header("Prefer", "return=representation")
            .json(&patch);

        Self::send_json(builder).await.map(Self::into_rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(url: Option<&str>, anon: Option<&str>, service: Option<&str>) -> BackendConfig {
        BackendConfig {
            url: url.map(str::to_string),
            anon_key: anon.map(str::to_string),
            service_role_key: service.map(str::to_string),
        }
    }

    #[test]
    fn test_unconfigured_client_is_built() {
        let backend = RestBackend::new(&config(None, None, None));
        assert!(!backend.is_configured());
        assert!(!backend.has_service_role());
    }

    #[test]
    fn test_url_is_normalized() {
        let backend = RestBackend::new(&config(
            Some(" https://demo.supabase.co/ "),
            Some("anon"),
            Some("  "),
        ));
        assert_eq!(backend.url, "https://demo.supabase.co");
        assert!(backend.is_configured());
        assert!(!backend.has_service_role());
    }

    #[tokio::test]
    async fn test_calls_fail_when_unconfigured() {
        let backend = RestBackend::new(&config(None, Some("anon"), None));
        let err = backend
            .select("tasks", &Query::new(), &Credential::Anon)
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::NotConfigured));
    }

    #[tokio::test]
    async fn test_service_calls_need_service_key() {
        let backend = RestBackend::new(&config(Some("https://demo.supabase.co"), Some("anon"), None));
        let err = backend.list_users(1, 50).await.unwrap_err();
        assert!(matches!(err, BackendError::MissingServiceKey));
    }

    #[test]
    fn test_into_rows() {
        assert!(RestBackend::into_rows(Value::Null).is_empty());
        assert_eq!(RestBackend::into_rows(json!({"id": 1})).len(), 1);
        assert_eq!(RestBackend::into_rows(json!([{"id": 1}, {"id": 2}])).len(), 2);
    }
}
