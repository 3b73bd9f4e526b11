//! User roles, profiles and auth DTOs.

use serde::{Deserialize, Serialize};

use crate::backend::AuthUser;

/// Application role, stored on the `profiles` row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Creates tasks and campaigns, manages influencers
    Admin,
    /// Brand account; owns campaigns
    #[serde(alias = "brand")]
    Marketing,
    /// Accepts campaigns, completes assigned tasks
    Influencer,
}

impl Role {
    /// Front-end route a user of this role lands on after login.
    pub fn home_path(&self) -> &'static str {
        match self {
            Role::Admin => "/admin",
            Role::Marketing => "/brand",
            Role::Influencer => "/influencer",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Marketing => "marketing",
            Role::Influencer => "influencer",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "marketing" | "brand" => Ok(Role::Marketing),
            "influencer" => Ok(Role::Influencer),
            _ => Err(format!("Unknown role: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
    pub role: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: String,
    pub email: Option<String>,
    pub created_at: Option<String>,
    pub last_sign_in_at: Option<String>,
}

impl From<AuthUser> for UserResponse {
    fn from(user: AuthUser) -> Self {
        Self {
            id: user.id,
            email: user.email,
            created_at: user.created_at,
            last_sign_in_at: user.last_sign_in_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    /// Portal the user logged in from; a different stored role is rejected
    #[serde(default)]
    pub expected_role: Option<Role>,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
}

impl LoginResponse {
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            role: None,
            error: Some(error.into()),
            redirect: None,
            access_token: None,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub role: Role,
    /// Brand display name; defaults to `full_name`
    #[serde(default)]
    pub company_name: Option<String>,
    #[serde(default)]
    pub platform: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub user: UserResponse,
    pub role: Role,
}

#[derive(Debug, Deserialize)]
pub struct PasswordResetRequest {
    #[serde(default)]
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parse() {
        assert_eq!("admin".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!("Brand".parse::<Role>().unwrap(), Role::Marketing);
        assert_eq!("marketing".parse::<Role>().unwrap(), Role::Marketing);
        assert_eq!(" influencer ".parse::<Role>().unwrap(), Role::Influencer);
        assert!("owner".parse::<Role>().is_err());
    }

    #[test]
    fn test_role_serde_accepts_brand_alias() {
        let role: Role = serde_json::from_str("\"brand\"").unwrap();
        assert_eq!(role, Role::Marketing);
        assert_eq!(serde_json::to_string(&role).unwrap(), "\"marketing\"");
    }

    #[test]
    fn test_home_paths() {
        assert_eq!(Role::Admin.home_path(), "/admin");
        assert_eq!(Role::Marketing.home_path(), "/brand");
        assert_eq!(Role::Influencer.home_path(), "/influencer");
    }

    #[test]
    fn test_failed_login_response_shape() {
        let body = serde_json::to_value(LoginResponse::failed("Invalid login credentials")).unwrap();
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "Invalid login credentials");
        assert!(body.get("role").is_none());
    }
}
