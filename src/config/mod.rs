use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub media: MediaConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Compiled front-end bundle, served with `index.html` fallback
    #[serde(default = "default_static_dir")]
    pub static_dir: PathBuf,
    /// Mark the session cookie `Secure` (disable for plain-HTTP local dev)
    #[serde(default = "default_secure_cookies")]
    pub secure_cookies: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            static_dir: default_static_dir(),
            secure_cookies: default_secure_cookies(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_static_dir() -> PathBuf {
    PathBuf::from("static/dist")
}

fn default_secure_cookies() -> bool {
    true
}

/// Connection parameters for the hosted database/auth platform.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BackendConfig {
    /// Project URL, e.g. `https://abcd.supabase.co`
    #[serde(default)]
    pub url: Option<String>,
    /// Public (anonymous) API key
    #[serde(default)]
    pub anon_key: Option<String>,
    /// Service-role key; only the password-reset flow needs it
    #[serde(default)]
    pub service_role_key: Option<String>,
}

impl BackendConfig {
    pub fn is_configured(&self) -> bool {
        non_empty(&self.url) && non_empty(&self.anon_key)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MediaConfig {
    #[serde(default)]
    pub cloud_name: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub api_secret: Option<String>,
    /// Folder every upload lands in on the media host
    #[serde(default = "default_media_folder")]
    pub folder: String,
    /// Where incoming files are staged before forwarding
    #[serde(default = "default_temp_dir")]
    pub temp_dir: PathBuf,
    /// Request body limit for `/api/upload` in bytes (default: 100 MiB)
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            cloud_name: None,
            api_key: None,
            api_secret: None,
            folder: default_media_folder(),
            temp_dir: default_temp_dir(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

impl MediaConfig {
    pub fn is_configured(&self) -> bool {
        non_empty(&self.cloud_name) && non_empty(&self.api_key) && non_empty(&self.api_secret)
    }
}

fn default_media_folder() -> String {
    "influencer-uploads".to_string()
}

fn default_temp_dir() -> PathBuf {
    std::env::temp_dir()
}

fn default_max_upload_bytes() -> usize {
    100 * 1024 * 1024
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn non_empty(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.trim().is_empty())
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            info!("Loading configuration from {}", path.display());
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            toml::from_str(&content).with_context(|| "Failed to parse configuration file")?
        } else {
            info!("No config file found, using defaults");
            Config::default()
        };

        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Overlay environment-style values on top of the file configuration.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let set = |target: &mut Option<String>, key: &str| {
            if let Some(value) = lookup(key).filter(|v| !v.is_empty()) {
                *target = Some(value);
            }
        };

        set(&mut self.backend.url, "SUPABASE_URL");
        set(&mut self.backend.anon_key, "SUPABASE_ANON_KEY");
        set(&mut self.backend.service_role_key, "SUPABASE_SERVICE_ROLE_KEY");
        set(&mut self.media.cloud_name, "CLOUDINARY_CLOUD_NAME");
        set(&mut self.media.api_key, "CLOUDINARY_API_KEY");
        set(&mut self.media.api_secret, "CLOUDINARY_API_SECRET");

        if let Some(port) = lookup("PORT").and_then(|p| p.parse().ok()) {
            self.server.port = port;
        }
    }

    /// Log which optional integrations are disabled by missing settings.
    pub fn warn_if_incomplete(&self) {
        if !self.backend.is_configured() {
            warn!("SUPABASE_URL or SUPABASE_ANON_KEY is not set; backend calls will fail");
        }
        if !non_empty(&self.backend.service_role_key) {
            warn!("SUPABASE_SERVICE_ROLE_KEY is not set; password reset is disabled");
        }
        if !self.media.is_configured() {
            warn!("Cloudinary credentials are not set; uploads are disabled");
        }
    }

    pub fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            backend: BackendConfig::default(),
            media: MediaConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.media.folder, "influencer-uploads");
        assert_eq!(config.logging.level, "info");
        assert!(!config.backend.is_configured());
        assert!(!config.media.is_configured());
    }

    #[test]
    fn test_parse_toml() {
        let config: Config = toml::from_str(
            r#"
            [server]
            port = 8081

            [backend]
            url = "https://example.supabase.co"
            anon_key = "anon"

            [media]
            folder = "videos"
            "#,
        )
        .unwrap();

        assert_eq!(config.server.port, 8081);
        assert_eq!(config.server.host, "0.0.0.0");
        assert!(config.backend.is_configured());
        assert!(config.backend.service_role_key.is_none());
        assert_eq!(config.media.folder, "videos");
    }

    #[test]
    fn test_overrides_win_over_file() {
        let mut config: Config = toml::from_str(
            r#"
            [backend]
            url = "https://file.supabase.co"
            anon_key = "file-key"
            "#,
        )
        .unwrap();

        let env: HashMap<&str, &str> = [
            ("SUPABASE_URL", "https://env.supabase.co"),
            ("SUPABASE_SERVICE_ROLE_KEY", "service"),
            ("CLOUDINARY_CLOUD_NAME", "demo"),
            ("CLOUDINARY_API_KEY", "key"),
            ("CLOUDINARY_API_SECRET", "secret"),
            ("PORT", "9000"),
        ]
        .into_iter()
        .collect();

        config.apply_overrides(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.backend.url.as_deref(), Some("https://env.supabase.co"));
        assert_eq!(config.backend.anon_key.as_deref(), Some("file-key"));
        assert_eq!(config.backend.service_role_key.as_deref(), Some("service"));
        assert!(config.media.is_configured());
        assert_eq!(config.server.port, 9000);
    }

    #[test]
    fn test_blank_values_are_not_configured() {
        let mut config = Config::default();
        config.apply_overrides(|key| match key {
            "SUPABASE_URL" => Some("https://x.supabase.co".to_string()),
            "SUPABASE_ANON_KEY" => Some(String::new()),
            _ => None,
        });
        assert!(!config.backend.is_configured());
    }
}
