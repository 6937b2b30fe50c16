//! Layered application configuration: bundled defaults, per-environment
//! TOML files under `config/` and `APP__*` environment variables, validated
//! before the server starts serving traffic.

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;
use std::path::Path;
use thiserror::Error;
use tracing::{error, info};
use validator::{Validate, ValidationError, ValidationErrors};

const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_ENV: &str = "development";
const DEFAULT_PORT: u16 = 8080;
const CONFIG_DIR: &str = "config";

/// Shipped in `config/development.toml`; rejected everywhere else.
const DEV_DEFAULT_JWT_SECRET: &str =
    "farmconnect_local_development_signing_secret_do_not_use_outside_dev_environments";

#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Postgres or SQLite connection string.
    pub database_url: String,

    /// HS256 signing secret. Field validation insists on length and entropy.
    #[validate(length(min = 64), custom = "validate_jwt_secret")]
    pub jwt_secret: String,

    /// Token lifetime in seconds.
    pub jwt_expiration: usize,

    /// Bind address.
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// `development`, `test` or `production`; gates CORS and secret checks.
    pub environment: String,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Emit structured JSON logs instead of the human-readable format.
    #[serde(default)]
    pub log_json: bool,

    /// Apply pending migrations before accepting connections.
    #[serde(default)]
    pub auto_migrate: bool,

    /// Comma-separated origin allowlist. Leaving it unset outside
    /// development fails startup unless `cors_allow_any_origin` is set.
    #[serde(default)]
    pub cors_allowed_origins: Option<String>,

    /// Deliberate opt-in to permissive CORS outside development.
    #[serde(default = "default_false_bool")]
    pub cors_allow_any_origin: bool,

    #[serde(default)]
    pub cors_allow_credentials: bool,

    /// Connection pool sizing and timeouts, tuned per environment.
    #[serde(default = "default_db_max_connections")]
    pub db_max_connections: u32,

    #[serde(default = "default_db_min_connections")]
    pub db_min_connections: u32,

    #[serde(default = "default_db_connect_timeout_secs")]
    pub db_connect_timeout_secs: u64,
    #[serde(default = "default_db_idle_timeout_secs")]
    pub db_idle_timeout_secs: u64,
    #[serde(default = "default_db_acquire_timeout_secs")]
    pub db_acquire_timeout_secs: u64,

    /// Flat delivery fee added to every order, in GHS.
    #[serde(default = "default_delivery_fee")]
    #[validate(custom = "validate_delivery_fee")]
    pub delivery_fee: f64,

    /// Currency code stamped onto orders and payments.
    #[serde(default = "default_currency")]
    pub currency: String,

    /// Consecutive failed logins before an account locks.
    #[serde(default = "default_login_max_attempts")]
    pub login_max_attempts: u32,

    /// How long a locked account stays locked, in seconds.
    #[serde(default = "default_login_lockout_secs")]
    pub login_lockout_secs: u64,

    /// Phone verification codes: time to live in seconds.
    #[serde(default = "default_otp_ttl_secs")]
    pub otp_ttl_secs: u64,

    /// Phone verification codes: wrong guesses allowed per code.
    #[serde(default = "default_otp_max_attempts")]
    pub otp_max_attempts: i32,

    /// Phone verification codes: sends allowed per user per window.
    #[serde(default = "default_otp_send_max")]
    pub otp_send_max: u32,

    #[serde(default = "default_otp_send_window_secs")]
    pub otp_send_window_secs: u64,

    /// Capacity of the in-process domain event channel.
    #[serde(default = "default_event_channel_capacity")]
    #[validate(custom = "validate_event_channel_capacity")]
    pub event_channel_capacity: usize,

    /// Shared secret for mobile-money gateway callback signatures.
    #[serde(default)]
    pub payment_webhook_secret: Option<String>,

    /// Accepted clock skew on callback timestamps, in seconds.
    #[serde(default)]
    pub payment_webhook_tolerance_secs: Option<u64>,

    #[serde(default = "default_api_page_size")]
    pub api_default_page_size: u32,

    #[serde(default = "default_api_max_page_size")]
    pub api_max_page_size: u32,

    #[serde(default = "default_auth_issuer")]
    pub auth_issuer: String,

    #[serde(default = "default_auth_audience")]
    pub auth_audience: String,
}

impl AppConfig {
    /// Builds a config from the required fields, everything else defaulted.
    /// Mainly a convenience for tests.
    pub fn new(
        database_url: String,
        jwt_secret: String,
        jwt_expiration: usize,
        host: String,
        port: u16,
        environment: String,
    ) -> Self {
        Self {
            database_url,
            jwt_secret,
            jwt_expiration,
            host,
            port,
            environment,
            log_level: default_log_level(),
            log_json: false,
            auto_migrate: false,
            cors_allowed_origins: None,
            cors_allow_any_origin: false,
            cors_allow_credentials: false,
            db_max_connections: default_db_max_connections(),
            db_min_connections: default_db_min_connections(),
            db_connect_timeout_secs: default_db_connect_timeout_secs(),
            db_idle_timeout_secs: default_db_idle_timeout_secs(),
            db_acquire_timeout_secs: default_db_acquire_timeout_secs(),
            delivery_fee: default_delivery_fee(),
            currency: default_currency(),
            login_max_attempts: default_login_max_attempts(),
            login_lockout_secs: default_login_lockout_secs(),
            otp_ttl_secs: default_otp_ttl_secs(),
            otp_max_attempts: default_otp_max_attempts(),
            otp_send_max: default_otp_send_max(),
            otp_send_window_secs: default_otp_send_window_secs(),
            event_channel_capacity: default_event_channel_capacity(),
            payment_webhook_secret: None,
            payment_webhook_tolerance_secs: None,
            api_default_page_size: default_api_page_size(),
            api_max_page_size: default_api_max_page_size(),
            auth_issuer: default_auth_issuer(),
            auth_audience: default_auth_audience(),
        }
    }

    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }

    pub fn is_development(&self) -> bool {
        self.environment.eq_ignore_ascii_case("development")
    }

    /// At least one non-blank entry in the origin allowlist.
    pub fn has_cors_allowed_origins(&self) -> bool {
        match &self.cors_allowed_origins {
            Some(raw) => raw.split(',').any(|origin| !origin.trim().is_empty()),
            None => false,
        }
    }

    pub fn should_allow_permissive_cors(&self) -> bool {
        self.is_development() || self.cors_allow_any_origin
    }

    pub fn log_level(&self) -> &str {
        &self.log_level
    }

    /// Cross-field checks that derive macros cannot express.
    fn validate_additional_constraints(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let mut reject = |field: &'static str, code: &'static str, message: &'static str| {
            let mut err = ValidationError::new(code);
            err.message = Some(message.into());
            errors.add(field, err);
        };

        if !self.should_allow_permissive_cors() && !self.has_cors_allowed_origins() {
            reject(
                "cors_allowed_origins",
                "cors_origins_missing",
                "Outside development set APP__CORS_ALLOWED_ORIGINS, or opt in with APP__CORS_ALLOW_ANY_ORIGIN=true",
            );
        }

        if !self.is_development() && self.jwt_secret.trim() == DEV_DEFAULT_JWT_SECRET {
            reject(
                "jwt_secret",
                "jwt_secret_is_dev_sentinel",
                "The bundled development signing secret cannot be used here; set APP__JWT_SECRET",
            );
        }

        if errors.errors().is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[derive(Debug, Error)]
pub enum AppConfigError {
    #[error("could not read configuration sources: {0}")]
    Load(#[from] ConfigError),

    #[error("configuration failed validation: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("configuration io error: {0}")]
    Io(#[from] std::io::Error),
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_db_max_connections() -> u32 {
    16
}

fn default_db_min_connections() -> u32 {
    2
}

fn default_db_connect_timeout_secs() -> u64 {
    30
}

fn default_db_idle_timeout_secs() -> u64 {
    600
}

fn default_db_acquire_timeout_secs() -> u64 {
    8
}

fn default_false_bool() -> bool {
    false
}

fn default_delivery_fee() -> f64 {
    5.0
}

fn default_currency() -> String {
    "GHS".to_string()
}

fn default_login_max_attempts() -> u32 {
    5
}

fn default_login_lockout_secs() -> u64 {
    15 * 60
}

fn default_otp_ttl_secs() -> u64 {
    10 * 60
}

fn default_otp_max_attempts() -> i32 {
    3
}

fn default_otp_send_max() -> u32 {
    3
}

fn default_otp_send_window_secs() -> u64 {
    10 * 60
}

fn default_event_channel_capacity() -> usize {
    1024
}

fn default_api_page_size() -> u32 {
    20
}

fn default_api_max_page_size() -> u32 {
    100
}

fn default_auth_issuer() -> String {
    "farmconnect-api".to_string()
}

fn default_auth_audience() -> String {
    "farmconnect".to_string()
}

fn validate_jwt_secret(secret: &str) -> Result<(), ValidationError> {
    let trimmed = secret.trim();
    let fail = |message: &'static str| {
        let mut err = ValidationError::new("jwt_secret");
        err.message = Some(message.into());
        Err(err)
    };

    if trimmed.len() < 64 {
        return fail("jwt_secret must be at least 64 characters");
    }

    // Placeholder fragments that show up in copied configs
    let lowered = trimmed.to_ascii_lowercase();
    const PLACEHOLDER_FRAGMENTS: [&str; 7] = [
        "change_this",
        "changeme",
        "password",
        "default",
        "secret-key",
        "12345",
        "abcdef",
    ];
    if PLACEHOLDER_FRAGMENTS.iter().any(|f| lowered.contains(f)) {
        return fail("jwt_secret looks like a placeholder; generate a random value");
    }

    let distinct: std::collections::HashSet<char> = trimmed.chars().collect();
    if distinct.len() < 10 {
        return fail("jwt_secret has too little character variety to be a real secret");
    }

    Ok(())
}

fn validate_delivery_fee(fee: f64) -> Result<(), ValidationError> {
    if fee.is_finite() && fee >= 0.0 {
        return Ok(());
    }
    let mut err = ValidationError::new("delivery_fee");
    err.message = Some("delivery_fee must be a finite, non-negative amount".into());
    Err(err)
}

fn validate_event_channel_capacity(capacity: usize) -> Result<(), ValidationError> {
    if capacity == 0 {
        let mut err = ValidationError::new("event_channel_capacity");
        err.message = Some("event_channel_capacity must be at least 1".into());
        return Err(err);
    }
    Ok(())
}

/// Installs the global tracing subscriber. `RUST_LOG` wins over the
/// configured level when set; repeated initialization is ignored.
pub fn init_tracing(level: &str, json: bool) {
    use tracing_subscriber::fmt;

    let directives = env::var("RUST_LOG")
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| format!("farmconnect_api={},tower_http=debug", level));

    if json {
        let _ = fmt().with_env_filter(directives).json().try_init();
    } else {
        let _ = fmt().with_env_filter(directives).try_init();
    }
}

/// Reads and validates configuration, layered in increasing precedence:
/// built-in defaults, `config/default.toml`, `config/{RUN_ENV}.toml`,
/// `config/docker.toml` when `DOCKER` is set, then `APP__*` variables.
pub fn load_config() -> Result<AppConfig, AppConfigError> {
    let run_env = env::var("RUN_ENV")
        .or_else(|_| env::var("APP_ENV"))
        .unwrap_or_else(|_| DEFAULT_ENV.to_string());
    info!("Loading {} configuration", run_env);

    if !Path::new(CONFIG_DIR).exists() {
        info!(
            "No {}/ directory found; using built-in defaults plus APP__* variables",
            CONFIG_DIR
        );
    }

    // jwt_secret deliberately has no default anywhere in the chain.
    let mut builder = Config::builder()
        .set_default("database_url", "sqlite://farmconnect.db?mode=rwc")?
        .set_default("jwt_expiration", 3600)?
        .set_default("host", "0.0.0.0")?
        .set_default("port", 8080)?
        .set_default("environment", DEFAULT_ENV)?
        .set_default("log_level", DEFAULT_LOG_LEVEL)?
        .set_default("log_json", false)?
        .add_source(File::with_name(&format!("{}/default", CONFIG_DIR)).required(false))
        .add_source(File::with_name(&format!("{}/{}", CONFIG_DIR, run_env)).required(false));

    if env::var("DOCKER").is_ok() {
        builder =
            builder.add_source(File::with_name(&format!("{}/docker", CONFIG_DIR)).required(false));
    }

    let merged = builder
        .add_source(Environment::with_prefix("APP").separator("__"))
        .build()?;

    // Checked up front so the operator gets one clear message instead of a
    // deserialization error.
    if merged.get_string("jwt_secret").is_err() {
        error!("jwt_secret is not configured; set APP__JWT_SECRET (try: openssl rand -base64 64)");
        return Err(AppConfigError::Load(ConfigError::NotFound(
            "jwt_secret is required; set the APP__JWT_SECRET environment variable".into(),
        )));
    }

    let cfg: AppConfig = merged.try_deserialize()?;

    cfg.validate().map_err(|e| {
        error!("Configuration rejected: {:?}", e);
        AppConfigError::Validation(e)
    })?;
    cfg.validate_additional_constraints().map_err(|e| {
        error!("Configuration rejected: {:?}", e);
        AppConfigError::Validation(e)
    })?;

    info!("Configuration loaded for {}", run_env);
    Ok(cfg)
}
