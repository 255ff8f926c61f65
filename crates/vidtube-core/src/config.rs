use chrono::{TimeDelta, Utc};
use serde::Deserialize;

/// Application configuration loaded from environment variables.
///
/// Loaded once at startup, wrapped in an `Arc` and never mutated afterwards.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Database connection URL (e.g. sqlite://vidtube.db, postgres://...)
    pub database_url: String,

    /// Server host (default: 127.0.0.1)
    pub server_host: String,

    /// Server port (default: 8000)
    pub server_port: u16,

    /// Environment: development, production, test
    pub environment: String,

    /// Allowed CORS origin. `None` means permissive CORS.
    pub cors_origin: Option<String>,

    /// Upload directory for local media storage (default: ./uploads)
    pub upload_dir: String,

    /// Max upload file size in bytes (default: 100MB)
    pub max_upload_size: u64,

    /// S3 bucket name (optional, enables S3 storage with the `s3` feature)
    pub s3_bucket: Option<String>,

    /// S3 region (default: us-east-1)
    pub s3_region: Option<String>,

    /// S3-compatible endpoint URL (for Cloudflare R2, MinIO, etc.)
    pub s3_endpoint: Option<String>,

    /// S3 access key ID (optional, falls back to AWS credential chain)
    pub s3_access_key_id: Option<String>,

    /// S3 secret access key (optional, falls back to AWS credential chain)
    pub s3_secret_access_key: Option<String>,

    /// Public base URL for S3 objects (e.g. CDN URL or R2 public domain)
    pub s3_public_url: Option<String>,

    /// S3 key prefix / folder (default: "media/")
    pub s3_prefix: Option<String>,

    /// Credential signing keys and lifetimes.
    pub session: SessionConfig,
}

/// Signing keys and expiry windows for access and refresh credentials.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// HMAC key for access credentials.
    pub access_token_secret: String,

    /// Access credential lifetime in minutes (default: 15)
    pub access_token_expiry_minutes: u64,

    /// HMAC key for refresh credentials. Must differ from the access key.
    pub refresh_token_secret: String,

    /// Refresh credential lifetime in days (default: 10)
    pub refresh_token_expiry_days: u64,

    /// Clear the stored refresh credential when a superseded one is replayed.
    pub revoke_on_reuse: bool,

    /// Minimum password length at registration / password change (default: 8)
    pub min_password_length: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            access_token_secret: "vidtube-dev-access-secret-change-me".to_string(),
            access_token_expiry_minutes: 15,
            refresh_token_secret: "vidtube-dev-refresh-secret-change-me".to_string(),
            refresh_token_expiry_days: 10,
            revoke_on_reuse: false,
            min_password_length: 8,
        }
    }
}

impl SessionConfig {
    /// Load session settings from environment variables.
    pub fn from_env() -> Self {
        let defaults = SessionConfig::default();

        SessionConfig {
            access_token_secret: std::env::var("ACCESS_TOKEN_SECRET")
                .unwrap_or(defaults.access_token_secret),
            access_token_expiry_minutes: parse_env(
                "ACCESS_TOKEN_EXPIRY_MINUTES",
                defaults.access_token_expiry_minutes,
            ),
            refresh_token_secret: std::env::var("REFRESH_TOKEN_SECRET")
                .unwrap_or(defaults.refresh_token_secret),
            refresh_token_expiry_days: parse_env(
                "REFRESH_TOKEN_EXPIRY_DAYS",
                defaults.refresh_token_expiry_days,
            ),
            revoke_on_reuse: env_flag("REVOKE_SESSION_ON_REUSE"),
            min_password_length: parse_env("MIN_PASSWORD_LENGTH", defaults.min_password_length),
        }
    }

    /// Access credential lifetime, saturating at [`TimeDelta::MAX`].
    pub fn access_ttl(&self) -> TimeDelta {
        try_ttl(self.access_token_expiry_minutes, TimeDelta::try_minutes).unwrap_or(TimeDelta::MAX)
    }

    /// Refresh credential lifetime, saturating at [`TimeDelta::MAX`].
    pub fn refresh_ttl(&self) -> TimeDelta {
        try_ttl(self.refresh_token_expiry_days, TimeDelta::try_days).unwrap_or(TimeDelta::MAX)
    }

    /// Reject settings that would only fail once a credential is minted.
    pub fn validate(&self) -> Result<(), String> {
        if self.access_token_secret == self.refresh_token_secret {
            return Err("ACCESS_TOKEN_SECRET and REFRESH_TOKEN_SECRET must differ".to_string());
        }

        let lifetimes = [
            (
                "ACCESS_TOKEN_EXPIRY_MINUTES",
                try_ttl(self.access_token_expiry_minutes, TimeDelta::try_minutes),
            ),
            (
                "REFRESH_TOKEN_EXPIRY_DAYS",
                try_ttl(self.refresh_token_expiry_days, TimeDelta::try_days),
            ),
        ];
        for (key, ttl) in lifetimes {
            // The expiry timestamp has to fit a DateTime, not just the delta.
            let fits = ttl.is_some_and(|ttl| Utc::now().checked_add_signed(ttl).is_some());
            if !fits {
                return Err(format!("{} is out of range", key));
            }
        }
        Ok(())
    }
}

fn try_ttl(value: u64, unit: fn(i64) -> Option<TimeDelta>) -> Option<TimeDelta> {
    i64::try_from(value).ok().and_then(unit)
}

impl Config {
    /// Load configuration from environment variables (with .env support).
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        // Load .env file if present (ignore errors if missing)
        let _ = dotenvy::dotenv();

        let session = SessionConfig::from_env();
        session.validate()?;

        Ok(Config {
            database_url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://vidtube.db?mode=rwc".to_string()),
            server_host: std::env::var("SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            server_port: parse_env("SERVER_PORT", 8000),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
            cors_origin: std::env::var("CORS_ORIGIN").ok(),
            upload_dir: std::env::var("UPLOAD_DIR").unwrap_or_else(|_| "./uploads".to_string()),
            max_upload_size: parse_env("MAX_UPLOAD_SIZE", 104_857_600), // 100MB
            s3_bucket: std::env::var("S3_BUCKET").ok(),
            s3_region: std::env::var("S3_REGION").ok(),
            s3_endpoint: std::env::var("S3_ENDPOINT").ok(),
            s3_access_key_id: std::env::var("S3_ACCESS_KEY_ID").ok(),
            s3_secret_access_key: std::env::var("S3_SECRET_ACCESS_KEY").ok(),
            s3_public_url: std::env::var("S3_PUBLIC_URL").ok(),
            s3_prefix: std::env::var("S3_PREFIX").ok(),
            session,
        })
    }

    /// Check if running in development mode.
    pub fn is_dev(&self) -> bool {
        self.environment == "development"
    }

    /// Check if S3 storage is configured.
    pub fn has_s3(&self) -> bool {
        self.s3_bucket.is_some()
    }

    /// Get the full server address.
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_flag(key: &str) -> bool {
    matches!(
        std::env::var(key).unwrap_or_default().to_lowercase().as_str(),
        "true" | "1" | "yes"
    )
}
