use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;
use tracing::{error, info, warn};
use validator::{Validate, ValidationError, ValidationErrors};

const PROFILE_DIR: &str = "config";
const FALLBACK_PROFILE: &str = "development";
const DEV_DEFAULT_JWT_SECRET: &str = "farmsense_development_secret_do_not_ship_q8v2m4x7k1z9";
const PLACEHOLDER_SECRETS: [&str; 4] = [
    "changeme",
    "change-me-in-production",
    "your-secret-key",
    "jwt-secret",
];

/// Runtime settings, layered from `config/*.toml` and `APP__*` variables.
///
/// Every field except `jwt_secret` has a default (see [`Default`]).
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(default)]
pub struct AppConfig {
    pub database_url: String,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_connect_timeout_secs: u64,
    pub db_idle_timeout_secs: u64,
    pub db_acquire_timeout_secs: u64,
    /// Apply pending migrations before serving
    pub auto_migrate: bool,

    /// HS256 key shared with whatever issues tokens
    #[validate(custom = "strong_jwt_secret")]
    pub jwt_secret: String,
    /// Required `iss` claim
    pub jwt_issuer: String,

    pub host: String,
    pub port: u16,
    /// Profile name; `development` relaxes CORS and secret checks
    pub environment: String,
    #[validate(range(min = 1, max = 600))]
    pub request_timeout_secs: u64,

    #[validate(custom = "known_log_level")]
    pub log_level: String,
    pub log_json: bool,

    /// Comma separated origins
    pub cors_allowed_origins: Option<String>,
    pub cors_allow_any_origin: bool,

    /// Falls back to `GEMINI_API_KEY` when unset
    pub ai_api_key: Option<String>,
    #[validate(url)]
    pub ai_base_url: String,
    pub ai_model: String,
    #[validate(range(min = 1, max = 300))]
    pub ai_timeout_secs: u64,
    /// Attempts per upstream call, first one included
    #[validate(range(min = 1, max = 10))]
    pub ai_max_attempts: u32,
    /// Base of the linear backoff between attempts
    pub ai_retry_backoff_ms: u64,

    #[validate(email)]
    pub notification_from: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: "sqlite://farmsense.db?mode=rwc".to_string(),
            db_max_connections: 10,
            db_min_connections: 1,
            db_connect_timeout_secs: 30,
            db_idle_timeout_secs: 600,
            db_acquire_timeout_secs: 8,
            auto_migrate: true,
            jwt_secret: String::new(),
            jwt_issuer: "farmsense".to_string(),
            host: "0.0.0.0".to_string(),
            port: 8000,
            environment: FALLBACK_PROFILE.to_string(),
            request_timeout_secs: 30,
            log_level: "info".to_string(),
            log_json: false,
            cors_allowed_origins: None,
            cors_allow_any_origin: false,
            ai_api_key: None,
            ai_base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            ai_model: "gemini-2.0-flash".to_string(),
            ai_timeout_secs: 30,
            ai_max_attempts: 3,
            ai_retry_backoff_ms: 250,
            notification_from: "noreply@farm.com".to_string(),
        }
    }
}

impl AppConfig {
    pub fn new(
        database_url: String,
        jwt_secret: String,
        host: String,
        port: u16,
        environment: String,
    ) -> Self {
        Self {
            database_url,
            jwt_secret,
            host,
            port,
            environment,
            ..Self::default()
        }
    }

    pub fn log_level(&self) -> &str {
        &self.log_level
    }

    pub fn is_development(&self) -> bool {
        self.environment.eq_ignore_ascii_case(FALLBACK_PROFILE)
    }

    /// Explicit origins, blanks dropped.
    pub fn cors_origins(&self) -> Vec<&str> {
        self.cors_allowed_origins
            .as_deref()
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|origin| !origin.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn should_allow_permissive_cors(&self) -> bool {
        self.cors_allow_any_origin || self.is_development()
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn resolved_ai_api_key(&self) -> String {
        let configured = self
            .ai_api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty());
        match configured {
            Some(key) => key.to_string(),
            None => env::var("GEMINI_API_KEY")
                .map(|key| key.trim().to_string())
                .unwrap_or_default(),
        }
    }

    /// Checks that only make sense across fields or per profile.
    fn check_deployment(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let mut fail = |field: &'static str, code: &'static str, message: &'static str| {
            let mut err = ValidationError::new(code);
            err.message = Some(message.into());
            errors.add(field, err);
        };

        if self.cors_origins().is_empty() && !self.should_allow_permissive_cors() {
            fail(
                "cors_allowed_origins",
                "cors_origins_missing",
                "List allowed origins in APP__CORS_ALLOWED_ORIGINS or set APP__CORS_ALLOW_ANY_ORIGIN=true",
            );
        }
        if self.jwt_secret.trim() == DEV_DEFAULT_JWT_SECRET && !self.is_development() {
            fail(
                "jwt_secret",
                "jwt_secret_dev_only",
                "The development JWT secret is only accepted in the development profile",
            );
        }
        if self.db_min_connections > self.db_max_connections {
            fail(
                "db_min_connections",
                "db_pool_bounds",
                "db_min_connections must not exceed db_max_connections",
            );
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[derive(Debug, Error)]
pub enum AppConfigError {
    #[error("could not read configuration: {0}")]
    Load(#[from] ConfigError),

    #[error("invalid configuration: {0}")]
    Validation(#[from] ValidationErrors),
}

fn known_log_level(level: &str) -> Result<(), ValidationError> {
    tracing::Level::from_str(level).map(|_| ()).map_err(|_| {
        let mut err = ValidationError::new("log_level");
        err.message = Some("expected trace, debug, info, warn or error".into());
        err
    })
}

fn strong_jwt_secret(secret: &str) -> Result<(), ValidationError> {
    let secret = secret.trim();
    let problem = if secret.len() < 32 {
        Some("JWT secret needs at least 32 characters")
    } else if PLACEHOLDER_SECRETS
        .iter()
        .any(|placeholder| secret.eq_ignore_ascii_case(placeholder))
    {
        Some("JWT secret is a placeholder value")
    } else if secret.chars().collect::<std::collections::HashSet<_>>().len() < 4 {
        Some("JWT secret has too few distinct characters")
    } else {
        None
    };

    match problem {
        None => Ok(()),
        Some(message) => {
            let mut err = ValidationError::new("jwt_secret");
            err.message = Some(message.into());
            Err(err)
        }
    }
}

/// Installs the global subscriber. `RUST_LOG`, when set, replaces the
/// `farmsense_api=<level>` default.
pub fn init_tracing(level: &str, json: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = env::var("RUST_LOG")
        .ok()
        .filter(|directive| !directive.trim().is_empty())
        .map(EnvFilter::new)
        .unwrap_or_else(|| EnvFilter::new(format!("farmsense_api={level},tower_http=info")));

    let installed = if json {
        fmt().with_env_filter(filter).json().try_init()
    } else {
        fmt().with_env_filter(filter).try_init()
    };
    if installed.is_err() {
        warn!("tracing subscriber already installed");
    }
}

/// Reads the active profile (`RUN_ENV`, else `APP_ENV`, else `development`).
///
/// Sources, later ones winning: struct defaults, `config/default.toml`,
/// `config/<profile>.toml`, `APP__*` environment variables.
pub fn load_config() -> Result<AppConfig, AppConfigError> {
    let profile = ["RUN_ENV", "APP_ENV"]
        .iter()
        .find_map(|key| env::var(key).ok().filter(|value| !value.is_empty()))
        .unwrap_or_else(|| FALLBACK_PROFILE.to_string());

    if !Path::new(PROFILE_DIR).is_dir() {
        info!(profile = %profile, "no {PROFILE_DIR}/ directory; using defaults and environment");
    }

    let layered = Config::builder()
        .set_default("environment", profile.as_str())?
        .add_source(File::with_name(&format!("{PROFILE_DIR}/default")).required(false))
        .add_source(File::with_name(&format!("{PROFILE_DIR}/{profile}")).required(false))
        .add_source(Environment::with_prefix("APP").separator("__"))
        .build()?;

    if layered.get_string("jwt_secret").is_err() {
        error!("APP__JWT_SECRET is not set");
        return Err(AppConfigError::Load(ConfigError::NotFound(
            "jwt_secret (set APP__JWT_SECRET)".into(),
        )));
    }

    let cfg: AppConfig = layered.try_deserialize()?;
    for outcome in [cfg.validate(), cfg.check_deployment()] {
        outcome.map_err(|e| {
            error!(profile = %profile, "configuration rejected: {}", e);
            AppConfigError::Validation(e)
        })?;
    }

    info!(profile = %profile, "configuration loaded");
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn production() -> AppConfig {
        AppConfig::new(
            "sqlite::memory:".into(),
            "k3v9-farm-ledger-signing-secret-0192837465".into(),
            "127.0.0.1".into(),
            8000,
            "production".into(),
        )
    }

    #[test]
    fn production_needs_cors_origins() {
        let mut cfg = production();
        assert!(cfg.check_deployment().is_err());

        cfg.cors_allowed_origins = Some(" https://farmsense.example , ".into());
        assert_eq!(cfg.cors_origins(), vec!["https://farmsense.example"]);
        assert!(cfg.check_deployment().is_ok());
    }

    #[test]
    fn development_allows_any_origin() {
        let mut cfg = production();
        cfg.environment = "Development".into();
        assert!(cfg.check_deployment().is_ok());
    }

    #[test]
    fn bundled_dev_secret_rejected_outside_development() {
        let mut cfg = production();
        cfg.cors_allow_any_origin = true;
        cfg.jwt_secret = DEV_DEFAULT_JWT_SECRET.into();
        assert!(cfg.check_deployment().is_err());
    }

    #[test]
    fn weak_secrets_fail_validation() {
        assert!(strong_jwt_secret("short").is_err());
        assert!(strong_jwt_secret(&"ab".repeat(20)).is_err());
        assert!(strong_jwt_secret("k3v9-farm-ledger-signing-secret-0192837465").is_ok());
    }

    #[test]
    fn derived_validation_checks_ai_and_log_settings() {
        let mut cfg = production();
        assert!(cfg.validate().is_ok());

        cfg.ai_max_attempts = 0;
        assert!(cfg.validate().is_err());

        cfg.ai_max_attempts = 3;
        cfg.log_level = "verbose".into();
        assert!(cfg.validate().is_err());

        cfg.log_level = "WARN".into();
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn configured_ai_key_wins_over_environment() {
        let mut cfg = production();
        cfg.ai_api_key = Some("  configured-key ".into());
        assert_eq!(cfg.resolved_ai_api_key(), "configured-key");
    }
}
