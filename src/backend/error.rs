use thiserror::Error;

/// Failure talking to the hosted platform.
///
/// `Api` keeps the platform's own message verbatim; handlers surface it to
/// the caller as-is.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("Backend is not configured (set SUPABASE_URL and SUPABASE_ANON_KEY)")]
    NotConfigured,

    #[error("Service role key is not configured")]
    MissingServiceKey,

    #[error("Backend request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{message}")]
    Api { status: u16, message: String },

    #[error("Unexpected backend response: {0}")]
    Decode(String),
}

impl BackendError {
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        BackendError::Api {
            status,
            message: message.into(),
        }
    }

    /// Build an error from a non-2xx response body.
    ///
    /// PostgREST answers `{message, code, details, hint}`, GoTrue uses
    /// `msg` or `error_description`. Falls back to the raw body.
    pub fn from_body(status: u16, body: &str) -> Self {
        let message = serde_json::from_str::<serde_json::Value>(body)
            .ok()
            .and_then(|value| {
                ["message", "msg", "error_description", "error"]
                    .iter()
                    .find_map(|key| value.get(*key).and_then(|m| m.as_str()).map(str::to_string))
            })
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| {
                if body.trim().is_empty() {
                    format!("HTTP {}", status)
                } else {
                    body.trim().to_string()
                }
            });

        BackendError::Api { status, message }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_body_postgrest() {
        let err = BackendError::from_body(
            409,
            r#"{"code":"23505","message":"duplicate key value violates unique constraint","details":null}"#,
        );
        assert!(matches!(err, BackendError::Api { status: 409, .. }));
        assert_eq!(err.to_string(), "duplicate key value violates unique constraint");
    }

    #[test]
    fn test_from_body_gotrue() {
        let err = BackendError::from_body(400, r#"{"error":"invalid_grant","error_description":"Invalid login credentials"}"#);
        assert_eq!(err.to_string(), "Invalid login credentials");

        let err = BackendError::from_body(422, r#"{"code":422,"msg":"Password should be at least 6 characters"}"#);
        assert_eq!(err.to_string(), "Password should be at least 6 characters");
    }

    #[test]
    fn test_from_body_plain_text() {
        let err = BackendError::from_body(502, "Bad Gateway");
        assert_eq!(err.to_string(), "Bad Gateway");

        let err = BackendError::from_body(500, "");
        assert_eq!(err.to_string(), "HTTP 500");
    }
}
