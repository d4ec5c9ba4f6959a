//! # Application Configuration
//!
//! This module manages application configuration loaded from environment variables.
//! All configuration is validated on startup to fail fast if misconfigured.
//!
//! ## Global Config Access
//!
//! Use [`core_config()`] to access the global configuration instance:
//!
//! ```rust,no_run
//! use lib_core::config::core_config;
//!
//! let config = core_config();
//! let db_url = &config.database_url;
//! ```
//!
//! The config must be initialized once at application startup using [`init_config()`].
//!
//! ## Testing
//!
//! [`Config::from_lookup`] takes any key lookup, so tests can build a config
//! from a map without touching the process environment.

use chrono::Duration;
use lib_utils::{b64_decode, Environment};
use std::env;
use std::fmt;
use std::sync::OnceLock;

/// Body limit applied to uploads when `MAX_UPLOAD_BYTES` is unset (50 MB).
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

/// Settings for the chat-completions service used by extraction.
#[derive(Clone)]
pub struct LlmSettings {
    /// Bearer key. Extraction endpoints refuse to run without it.
    pub api_key: Option<String>,
    /// Base URL of an OpenAI-compatible API, without trailing slash
    pub base_url: String,
    pub receipt_model: String,
    pub statement_model: String,
}

/// External programs used for PDF statements.
#[derive(Clone, Debug)]
pub struct PdfSettings {
    /// Interpreter for the extractor script (e.g. `python3`)
    pub extractor_program: String,
    /// Script printing `{success, text, error}` for `<pdf> <page>`
    pub extractor_script: String,
    /// Program printing a `Pages:` line for a PDF (poppler's `pdfinfo`)
    pub info_program: String,
}

/// Application configuration loaded from environment variables.
#[derive(Clone)]
pub struct Config {
    /// Deployment environment from `ENV`
    pub environment: Environment,

    /// SQLite database connection URL
    pub database_url: String,

    /// Decoded HMAC key for session tokens
    ///
    /// **Must be at least 32 bytes** after base64 decoding.
    pub session_secret: Vec<u8>,

    /// JWT token validity period in hours
    ///
    /// Also used as the session cookie `Max-Age`.
    /// Valid range: 1-720 hours (1 hour to 30 days)
    pub jwt_expiration_hours: i64,

    /// Public domain of the app, used for cookies and CORS origins
    pub app_domain: String,

    /// Local frontend dev server port (CORS origin in development/test)
    pub frontend_port: u16,

    /// Local backend port (CORS origin in development/test)
    pub backend_port: u16,

    pub llm: LlmSettings,

    pub pdf: PdfSettings,

    /// Maximum accepted request body for uploads
    pub max_upload_bytes: usize,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through `lookup`, treating blank values as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let environment: Environment = get("ENV")
            .ok_or("ENV must be set to production, staging, development or test")?
            .parse()
            .map_err(|_| "ENV must be one of production, staging, development, test")?;

        let database_url = get("DATABASE_URL").unwrap_or_else(|| {
            let file = match environment {
                Environment::Production => "prod",
                Environment::Staging => "staging",
                Environment::Development => "dev",
                Environment::Test => "test",
            };
            format!("sqlite:data/{file}.db")
        });

        // Test runs may carry their own key so they never sign with a real one
        let encoded_secret = match environment {
            Environment::Test => get("TEST_SESSION_SECRET_KEY").or_else(|| get("SESSION_SECRET_KEY")),
            _ => get("SESSION_SECRET_KEY"),
        }
        .ok_or("SESSION_SECRET_KEY must be set in environment")?;

        let session_secret = b64_decode(&encoded_secret)
            .map_err(|_| "SESSION_SECRET_KEY must be valid base64".to_string())?;

        let jwt_expiration_hours = get("JWT_EXPIRATION_HOURS")
            .unwrap_or_else(|| "24".to_string())
            .parse()
            .map_err(|e| format!("JWT_EXPIRATION_HOURS must be a valid number: {}", e))?;

        let app_domain = get("APP_DOMAIN").unwrap_or_else(|| "localhost".to_string());

        let frontend_port = parse_or(get("FRONTEND_PORT"), 3000, "FRONTEND_PORT")?;
        let backend_port = parse_or(get("BACKEND_PORT"), 8080, "BACKEND_PORT")?;
        let max_upload_bytes =
            parse_or(get("MAX_UPLOAD_BYTES"), DEFAULT_MAX_UPLOAD_BYTES, "MAX_UPLOAD_BYTES")?;

        let llm = LlmSettings {
            api_key: get("OPENAI_API_KEY"),
            base_url: get("OPENAI_BASE_URL")
                .unwrap_or_else(|| "https://api.openai.com/v1".to_string())
                .trim_end_matches('/')
                .to_string(),
            receipt_model: get("RECEIPT_MODEL").unwrap_or_else(|| "gpt-4o-mini".to_string()),
            statement_model: get("STATEMENT_MODEL").unwrap_or_else(|| "gpt-4o".to_string()),
        };

        let pdf = PdfSettings {
            extractor_program: get("PDF_EXTRACTOR_PROGRAM").unwrap_or_else(|| "python3".to_string()),
            extractor_script: get("PDF_EXTRACTOR_SCRIPT")
                .unwrap_or_else(|| "scripts/pdf_extractor.py".to_string()),
            info_program: get("PDF_INFO_PROGRAM").unwrap_or_else(|| "pdfinfo".to_string()),
        };

        Ok(Self {
            environment,
            database_url,
            session_secret,
            jwt_expiration_hours,
            app_domain,
            frontend_port,
            backend_port,
            llm,
            pdf,
            max_upload_bytes,
        })
    }

    /// Validate configuration values against security and business rules.
    pub fn validate(&self) -> Result<(), String> {
        if self.session_secret.len() < 32 {
            return Err("SESSION_SECRET_KEY must decode to at least 32 bytes".to_string());
        }

        if self.jwt_expiration_hours < 1 || self.jwt_expiration_hours > 720 {
            return Err("JWT_EXPIRATION_HOURS must be between 1 and 720 (30 days)".to_string());
        }

        if self.environment.is_deployed() && self.app_domain == "localhost" {
            return Err(format!(
                "APP_DOMAIN must be set to the public domain when ENV={}",
                self.environment
            ));
        }

        if self.max_upload_bytes == 0 {
            return Err("MAX_UPLOAD_BYTES must be greater than zero".to_string());
        }

        Ok(())
    }

    /// Lifetime of a session token and its cookie.
    pub fn session_ttl(&self) -> Duration {
        Duration::hours(self.jwt_expiration_hours)
    }

    /// Browser origins allowed to make credentialed requests.
    pub fn allowed_origins(&self) -> Vec<String> {
        if self.environment.is_deployed() {
            vec![format!("https://{}", self.app_domain)]
        } else {
            vec![
                format!("http://{}:{}", self.app_domain, self.frontend_port),
                format!("http://{}:{}", self.app_domain, self.backend_port),
            ]
        }
    }
}

fn parse_or<T: std::str::FromStr>(value: Option<String>, default: T, key: &str) -> Result<T, String> {
    match value {
        Some(v) => v
            .trim()
            .parse()
            .map_err(|_| format!("{key} has an invalid value: {v}")),
        None => Ok(default),
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("environment", &self.environment)
            .field("database_url", &self.database_url)
            .field("session_secret", &"***REDACTED***")
            .field("jwt_expiration_hours", &self.jwt_expiration_hours)
            .field("app_domain", &self.app_domain)
            .field("frontend_port", &self.frontend_port)
            .field("backend_port", &self.backend_port)
            .field("llm", &self.llm)
            .field("pdf", &self.pdf)
            .field("max_upload_bytes", &self.max_upload_bytes)
            .finish()
    }
}

impl fmt::Debug for LlmSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LlmSettings")
            .field("api_key", &self.api_key.as_ref().map(|_| "***REDACTED***"))
            .field("base_url", &self.base_url)
            .field("receipt_model", &self.receipt_model)
            .field("statement_model", &self.statement_model)
            .finish()
    }
}

/// Global configuration instance (initialized once at startup).
static CONFIG: OnceLock<Config> = OnceLock::new();

/// Initialize the global configuration.
///
/// This should be called once at application startup, before any handlers
/// or services that need configuration are used.
///
/// # Errors
///
/// Returns an error if:
/// - Environment variables are missing or invalid
/// - Configuration validation fails
/// - Config has already been initialized
pub fn init_config() -> Result<&'static Config, String> {
    let config = Config::from_env()?;
    config.validate()?;

    CONFIG
        .set(config)
        .map_err(|_| "Config has already been initialized".to_string())?;

    Ok(core_config())
}

/// Get a reference to the global configuration.
///
/// # Panics
///
/// Panics if [`init_config()`] has not been called yet. This ensures
/// configuration is always available when accessed.
pub fn core_config() -> &'static Config {
    CONFIG.get().expect("Config must be initialized with init_config() before use")
}
