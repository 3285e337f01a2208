use anyhow::{Context, Result};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable holding the token signing secret.
pub const JWT_SECRET_ENV: &str = "JWT_SECRET";

/// Environment variable holding the provisioning password for the reserved admin account.
pub const ADMIN_PASSWORD_ENV: &str = "ADMIN_PASSWORD";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,

    pub server: ServerConfig,

    pub auth: AuthConfig,

    pub site: SiteConfig,

    pub observability: ObservabilityConfig,

    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Argon2 memory cost in KiB (default: 8192 = 8MB)
    pub argon2_memory_cost_kib: u32,

    /// Argon2 time cost (iterations) - higher = more CPU work
    pub argon2_time_cost: u32,

    /// Argon2 parallelism (default: 1)
    pub argon2_parallelism: u32,

    /// Login endpoint throttling and lockout policy.
    pub auth_throttle: AuthThrottleConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthThrottleConfig {
    pub enabled: bool,

    /// Max failed attempts in the window before lockout.
    pub max_attempts: u32,

    /// Fixed window for counting failures.
    pub window_seconds: u64,

    /// Temporary lockout duration once max attempts is reached.
    pub lockout_seconds: u64,

    /// Trusted proxy IP addresses allowed to provide forwarded client IP headers.
    ///
    /// When empty, forwarded headers are ignored for rate-limiting identity and
    /// the socket peer address is used.
    pub trusted_proxy_ips: Vec<String>,
}

impl Default for AuthThrottleConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_attempts: 5,
            window_seconds: 15 * 60,
            lockout_seconds: 15 * 60,
            trusted_proxy_ips: Vec::new(),
        }
    }
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            argon2_memory_cost_kib: 8192,
            argon2_time_cost: 3,
            argon2_parallelism: 1,
            auth_throttle: AuthThrottleConfig::default(),
        }
    }
}

/// Route layout of the admin area and session lifetime.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Real admin area. Everything below it requires a session except the login page.
    pub protected_prefix: String,

    /// Login entry point, reachable without a session.
    pub login_path: String,

    /// Legacy prefix that always answers 404, authenticated or not.
    pub decoy_prefix: String,

    /// Where the login flow lands when no return destination was captured.
    pub landing_path: String,

    pub token_ttl_seconds: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            protected_prefix: "/adminpanelR".to_string(),
            login_path: "/adminpanelR/login".to_string(),
            decoy_prefix: "/admin".to_string(),
            landing_path: "/adminpanelR".to_string(),
            token_ttl_seconds: crate::constants::auth::TOKEN_TTL_SECONDS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Public origin used for absolute URLs in the sitemap.
    pub base_url: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    pub metrics_enabled: bool,

    pub loki_enabled: bool,

    pub loki_url: String,

    pub loki_labels: std::collections::HashMap<String, String>,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        let mut labels = std::collections::HashMap::new();
        labels.insert("app".to_string(), "vitrine".to_string());

        Self {
            metrics_enabled: true,
            loki_enabled: false,
            loki_url: "http://localhost:3100".to_string(),
            loki_labels: labels,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,

    pub cors_allowed_origins: Vec<String>,

    /// Whether to set the Secure flag on the session cookie.
    /// Default: true for production safety. Set to false for local development without HTTPS.
    pub secure_cookies: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            cors_allowed_origins: vec![
                "http://localhost:3000".to_string(),
                "http://127.0.0.1:3000".to_string(),
            ],
            secure_cookies: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub database_path: String,

    pub log_level: String,

    /// Number of tokio worker threads (default: 2)
    /// Set to 0 to use the number of CPU cores
    pub worker_threads: usize,

    /// Maximum database connections (default: 5)
    pub max_db_connections: u32,

    /// Minimum database connections (default: 1)
    pub min_db_connections: u32,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            database_path: "sqlite:data/vitrine.db".to_string(),
            log_level: "info".to_string(),
            worker_threads: 2,
            max_db_connections: 5,
            min_db_connections: 1,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            general: GeneralConfig::default(),
            server: ServerConfig::default(),
            auth: AuthConfig::default(),
            site: SiteConfig::default(),
            observability: ObservabilityConfig::default(),
            security: SecurityConfig::default(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let paths = Self::config_paths();

        for path in &paths {
            if path.exists() {
                info!("Loading config from: {}", path.display());
                return Self::load_from_path(path);
            }
        }

        info!("No config file found, using defaults");
        Ok(Self::default())
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Config saved to: {}", path.display());
        Ok(())
    }

    fn config_paths() -> Vec<PathBuf> {
        let mut paths = vec![];

        paths.push(PathBuf::from("config.toml"));

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("vitrine").join("config.toml"));
        }

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".vitrine").join("config.toml"));
        }

        paths
    }

    fn default_config_path() -> PathBuf {
        PathBuf::from("config.toml")
    }

    pub fn create_default_if_missing() -> Result<bool> {
        let path = Self::default_config_path();
        if path.exists() {
            Ok(false)
        } else {
            let config = Self::default();
            config.save_to_path(&path)?;
            info!("Created default config file: {}", path.display());
            Ok(true)
        }
    }

    pub fn validate(&self) -> Result<()> {
        let auth = &self.auth;

        for (name, value) in [
            ("protected_prefix", &auth.protected_prefix),
            ("login_path", &auth.login_path),
            ("decoy_prefix", &auth.decoy_prefix),
            ("landing_path", &auth.landing_path),
        ] {
            if !value.starts_with('/') {
                anyhow::bail!("auth.{name} must start with '/': {value:?}");
            }
        }

        if auth.protected_prefix.len() < 2 {
            anyhow::bail!("auth.protected_prefix cannot be the site root");
        }

        let login_inside = auth
            .login_path
            .strip_prefix(auth.protected_prefix.as_str())
            .is_some_and(|rest| rest.starts_with('/') && rest.len() > 1);
        if !login_inside {
            anyhow::bail!(
                "auth.login_path ({}) must live below auth.protected_prefix ({})",
                auth.login_path,
                auth.protected_prefix
            );
        }

        if auth.token_ttl_seconds == 0 {
            anyhow::bail!("auth.token_ttl_seconds must be > 0");
        }

        let throttle = &self.security.auth_throttle;
        if throttle.enabled && (throttle.max_attempts == 0 || throttle.window_seconds == 0) {
            anyhow::bail!("auth_throttle needs max_attempts > 0 and window_seconds > 0");
        }

        url::Url::parse(&self.site.base_url)
            .with_context(|| format!("Invalid site.base_url: {}", self.site.base_url))?;

        Ok(())
    }
}

/// Process secrets read from the environment. Never serialized, never defaulted.
#[derive(Debug, Clone)]
pub struct Secrets {
    pub jwt_secret: SecretString,
}

impl Secrets {
    /// Reads `JWT_SECRET`. A missing or blank value is a startup error.
    pub fn from_env() -> Result<Self> {
        let jwt_secret = required_env(JWT_SECRET_ENV)?;

        if jwt_secret.expose_secret().len() < 32 {
            warn!("{JWT_SECRET_ENV} is shorter than 32 bytes; use a longer random value");
        }

        Ok(Self { jwt_secret })
    }
}

/// Reads the provisioning password used by `seed-admin` and `set-admin-password`.
pub fn admin_password_from_env() -> Result<SecretString> {
    required_env(ADMIN_PASSWORD_ENV)
}

fn required_env(name: &str) -> Result<SecretString> {
    match std::env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(SecretString::from(value)),
        Ok(_) => anyhow::bail!("{name} is set but empty"),
        Err(_) => anyhow::bail!("{name} is not set; refusing to start without it"),
    }
}
