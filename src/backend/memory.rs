//! In-process [`Backend`] used by handler tests.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use super::{AuthSession, AuthUser, Backend, BackendError, Credential, Filter, Query};

#[derive(Clone)]
struct StoredUser {
    user: AuthUser,
    password: String,
}

pub struct MemoryBackend {
    configured: bool,
    service_role: bool,
    healthy: bool,
    users: Mutex<Vec<StoredUser>>,
    tables: Mutex<HashMap<String, Vec<Value>>>,
    /// `(table, message)` pairs that make inserts into `table` fail
    insert_failures: Mutex<HashMap<String, String>>,
    calls: AtomicUsize,
    next_id: AtomicUsize,
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self {
            configured: true,
            service_role: true,
            healthy: true,
            users: Mutex::new(Vec::new()),
            tables: Mutex::new(HashMap::new()),
            insert_failures: Mutex::new(HashMap::new()),
            calls: AtomicUsize::new(0),
            next_id: AtomicUsize::new(1),
        }
    }
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn unconfigured() -> Self {
        Self {
            configured: false,
            ..Self::default()
        }
    }

    pub fn without_service_role(mut self) -> Self {
        self.service_role = false;
        self
    }

    pub fn unhealthy(mut self) -> Self {
        self.healthy = false;
        self
    }

    /// Register a user plus its `profiles` row; returns the user id.
    pub fn add_user(&self, email: &str, password: &str, role: &str) -> String {
        let id = uuid::Uuid::new_v4().to_string();
        self.users.lock().unwrap().push(StoredUser {
            user: AuthUser {
                id: id.clone(),
                email: Some(email.to_string()),
                user_metadata: json!({ "role": role }),
                created_at: None,
                last_sign_in_at: None,
            },
            password: password.to_string(),
        });
        self.seed("profiles", json!({ "id": id, "email": email, "role": role }));
        id
    }

    pub fn password_of(&self, email: &str) -> Option<String> {
        self.users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.user.email_matches(email))
            .map(|u| u.password.clone())
    }

    pub fn seed(&self, table: &str, row: Value) {
        self.tables
            .lock()
            .unwrap()
            .entry(table.to_string())
            .or_default()
            .push(row);
    }

    pub fn rows(&self, table: &str) -> Vec<Value> {
        self.tables
            .lock()
            .unwrap()
            .get(table)
            .cloned()
            .unwrap_or_default()
    }

    pub fn fail_inserts(&self, table: &str, message: &str) {
        self.insert_failures
            .lock()
            .unwrap()
            .insert(table.to_string(), message.to_string());
    }

    /// Number of backend calls made so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn begin(&self) -> Result<(), BackendError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.configured {
            Ok(())
        } else {
            Err(BackendError::NotConfigured)
        }
    }

    fn require_service(&self) -> Result<(), BackendError> {
        if self.service_role {
            Ok(())
        } else {
            Err(BackendError::MissingServiceKey)
        }
    }

    fn token_for(id: &str) -> String {
        format!("token-{}", id)
    }

    fn matches(row: &Value, query: &Query) -> bool {
        query.filters().iter().all(|(column, filter)| {
            let cell = match row.get(column) {
                Some(Value::String(s)) => Some(s.clone()),
                Some(Value::Null) | None => None,
                Some(other) => Some(other.to_string()),
            };
            match filter {
                Filter::Eq(v) => cell.as_deref() == Some(v.as_str()),
            }
        })
    }
}

#[async_trait]
impl Backend for MemoryBackend {
    fn is_configured(&self) -> bool {
        self.configured
    }

    fn has_service_role(&self) -> bool {
        self.service_role
    }

    async fn health(&self) -> Result<(), BackendError> {
        self.begin()?;
        if self.healthy {
            Ok(())
        } else {
            Err(BackendError::api(503, "upstream unavailable"))
        }
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, BackendError> {
        self.begin()?;
        let users = self.users.lock().unwrap();
        let stored = users
            .iter()
            .find(|u| u.user.email_matches(email) && u.password == password)
            .ok_or_else(|| BackendError::api(400, "Invalid login credentials"))?;

        Ok(AuthSession {
            access_token: Self::token_for(&stored.user.id),
            refresh_token: None,
            expires_in: Some(3600),
            user: stored.user.clone(),
        })
    }

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        data: Value,
    ) -> Result<AuthUser, BackendError> {
        self.begin()?;
        if self.users.lock().unwrap().iter().any(|u| u.user.email_matches(email)) {
            return Err(BackendError::api(422, "User already registered"));
        }
        let id = uuid::Uuid::new_v4().to_string();
        let user = AuthUser {
            id,
            email: Some(email.to_string()),
            user_metadata: data,
            created_at: None,
            last_sign_in_at: None,
        };
        self.users.lock().unwrap().push(StoredUser {
            user: user.clone(),
            password: password.to_string(),
        });
        Ok(user)
    }

    async fn get_user(&self, access_token: &str) -> Result<AuthUser, BackendError> {
        self.begin()?;
        self.users
            .lock()
            .unwrap()
            .iter()
            .find(|u| Self::token_for(&u.user.id) == access_token)
            .map(|u| u.user.clone())
            .ok_or_else(|| BackendError::api(401, "invalid JWT"))
    }

    async fn sign_out(&self, _access_token: &str) -> Result<(), BackendError> {
        self.begin()
    }

    async fn list_users(&self, page: u32, per_page: u32) -> Result<Vec<AuthUser>, BackendError> {
        self.begin()?;
        self.require_service()?;
        let skip = (page.saturating_sub(1) * per_page) as usize;
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .skip(skip)
            .take(per_page as usize)
            .map(|u| u.user.clone())
            .collect())
    }

    async fn update_user_password(
        &self,
        user_id: &str,
        password: &str,
    ) -> Result<(), BackendError> {
        self.begin()?;
        self.require_service()?;
        let mut users = self.users.lock().unwrap();
        let stored = users
            .iter_mut()
            .find(|u| u.user.id == user_id)
            .ok_or_else(|| BackendError::api(404, "User not found"))?;
        stored.password = password.to_string();
        Ok(())
    }

    async fn select(
        &self,
        table: &str,
        query: &Query,
        _credential: &Credential,
    ) -> Result<Vec<Value>, BackendError> {
        self.begin()?;
        let rows = self.rows(table);
        let limit = query.limit_value().map(|l| l as usize).unwrap_or(usize::MAX);
        Ok(rows
            .into_iter()
            .filter(|row| Self::matches(row, query))
            .take(limit)
            .collect())
    }

    async fn insert(
        &self,
        table: &str,
        rows: Value,
        _credential: &Credential,
    ) -> Result<Vec<Value>, BackendError> {
        self.begin()?;
        if let Some(message) = self.insert_failures.lock().unwrap().get(table) {
            return Err(BackendError::api(400, message.clone()));
        }

        let rows = match rows {
            Value::Array(rows) => rows,
            other => vec![other],
        };

        let mut stored = Vec::with_capacity(rows.len());
        for mut row in rows {
            if let Value::Object(map) = &mut row {
                map.entry("id").or_insert_with(|| {
                    json!(format!("{}-{}", table, self.next_id.fetch_add(1, Ordering::SeqCst)))
                });
            }
            self.seed(table, row.clone());
            stored.push(row);
        }
        Ok(stored)
    }

    async fn update(
        &self,
        table: &str,
        query: &Query,
        patch: Value,
        _credential: &Credential,
    ) -> Result<Vec<Value>, BackendError> {
        self.begin()?;
        let mut tables = self.tables.lock().unwrap();
        let rows = tables.entry(table.to_string()).or_default();

        let mut updated = Vec::new();
        for row in rows.iter_mut().filter(|row| Self::matches(row, query)) {
            if let (Value::Object(target), Value::Object(changes)) = (&mut *row, &patch) {
                for (key, value) in changes {
                    target.insert(key.clone(), value.clone());
                }
            }
            updated.push(row.clone());
        }
        Ok(updated)
    }
}
