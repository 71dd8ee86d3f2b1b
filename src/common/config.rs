//! Environment-based Configuration for the Mess Ledger Backend
//!
//! The signing secret MUST come from the environment, never from
//! hardcoded values. A `.env` file in the working directory is honoured
//! (loaded by the binary before `AppConfig::from_env` runs).
//!
//! # Required Environment Variables
//!
//! - `MESS_DATABASE_URL` - `memory`, or a SQLite file path (`sqlite://` prefix optional)
//! - `MESS_JWT_SECRET` - Secret used to sign session tokens (min 16 bytes)
//!
//! # Optional Settings
//!
//! - `MESS_API_PORT` - REST API port (default: 3001)
//! - `MESS_BIND_ADDR` - Bind address (default: 0.0.0.0)
//! - `MESS_LOG_LEVEL` - Logging level (trace, debug, info, warn, error)
//! - `MESS_LOG_FORMAT` - "json" or "pretty" (default: pretty)
//! - `MESS_BCRYPT_COST` - bcrypt cost factor (default: 10)
//! - `MESS_STATIC_DIR` - Frontend bundle served for non-API paths
//! - `MESS_LOGIN_LOG` - JSON file recording the last login per vendor email

use std::env;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

/// Shortest signing secret accepted at startup.
pub const MIN_SECRET_LEN: usize = 16;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

/// Where records are persisted
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseTarget {
    /// In-process maps, lost on restart
    Memory,
    /// SQLite database file
    Sqlite(PathBuf),
}

impl FromStr for DatabaseTarget {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ConfigError::InvalidValue(
                "MESS_DATABASE_URL".to_string(),
                "must not be empty".to_string(),
            ));
        }

        if s.eq_ignore_ascii_case("memory") {
            return Ok(DatabaseTarget::Memory);
        }

        let path = s.strip_prefix("sqlite://").unwrap_or(s);
        Ok(DatabaseTarget::Sqlite(PathBuf::from(path)))
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
}

impl FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(LogFormat::Json),
            "pretty" | "text" => Ok(LogFormat::Pretty),
            _ => Err(ConfigError::InvalidValue(
                "MESS_LOG_FORMAT".to_string(),
                format!("unknown format: {} (use 'json' or 'pretty')", s),
            )),
        }
    }
}

/// Main configuration struct
#[derive(Clone)]
pub struct AppConfig {
    /// Record store
    pub database: DatabaseTarget,

    /// Token signing secret
    pub jwt_secret: String,

    /// Listen address
    pub bind_addr: IpAddr,

    /// Listen port
    pub port: u16,

    /// Log level
    pub log_level: String,

    /// Log output format
    pub log_format: LogFormat,

    /// bcrypt cost factor
    pub bcrypt_cost: u32,

    /// SPA bundle directory
    pub static_dir: Option<PathBuf>,

    /// Login timestamp file
    pub login_log: Option<PathBuf>,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("database", &self.database)
            .field("jwt_secret", &"<redacted>")
            .field("bind_addr", &self.bind_addr)
            .field("port", &self.port)
            .field("log_level", &self.log_level)
            .field("log_format", &self.log_format)
            .field("bcrypt_cost", &self.bcrypt_cost)
            .field("static_dir", &self.static_dir)
            .field("login_log", &self.login_log)
            .finish()
    }
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(|name| env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_vars<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database: DatabaseTarget = required(&lookup, "MESS_DATABASE_URL")?.parse()?;

        let jwt_secret = required(&lookup, "MESS_JWT_SECRET")?;
        if jwt_secret.len() < MIN_SECRET_LEN {
            return Err(ConfigError::InvalidValue(
                "MESS_JWT_SECRET".to_string(),
                format!("must be at least {} bytes", MIN_SECRET_LEN),
            ));
        }

        let bind_addr = parsed(&lookup, "MESS_BIND_ADDR", IpAddr::from([0, 0, 0, 0]))?;
        let port = parsed(&lookup, "MESS_API_PORT", 3001u16)?;

        let log_level = lookup("MESS_LOG_LEVEL").unwrap_or_else(|| "info".to_string());
        let log_format = lookup("MESS_LOG_FORMAT")
            .map(|v| v.parse::<LogFormat>())
            .transpose()?
            .unwrap_or(LogFormat::Pretty);

        let bcrypt_cost = parsed(&lookup, "MESS_BCRYPT_COST", crate::auth::DEFAULT_HASH_COST)?;
        if !(4..=31).contains(&bcrypt_cost) {
            return Err(ConfigError::InvalidValue(
                "MESS_BCRYPT_COST".to_string(),
                "must be between 4 and 31".to_string(),
            ));
        }

        let static_dir = lookup("MESS_STATIC_DIR")
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from);
        let login_log = lookup("MESS_LOGIN_LOG")
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from);

        Ok(Self {
            database,
            jwt_secret,
            bind_addr,
            port,
            log_level,
            log_format,
            bcrypt_cost,
            static_dir,
            login_log,
        })
    }

    /// Socket address the API server binds to
    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_addr, self.port)
    }

    /// Print configuration summary (hiding sensitive values)
    pub fn print_summary(&self) {
        println!("=== Mess Ledger Configuration ===");
        println!(
            "Database: {}",
            match &self.database {
                DatabaseTarget::Memory => "in-memory".to_string(),
                DatabaseTarget::Sqlite(path) => format!("sqlite ({})", path.display()),
            }
        );
        println!("Listen: {}", self.listen_addr());
        println!("JWT Secret: <{} bytes>", self.jwt_secret.len());
        println!("bcrypt Cost: {}", self.bcrypt_cost);
        println!(
            "Static Dir: {}",
            self.static_dir
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "-".to_string())
        );
        println!(
            "Login Log: {}",
            self.login_log
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "-".to_string())
        );
        println!("Log Level: {} ({:?})", self.log_level, self.log_format);
        println!("=================================");
    }
}

/// Get a required variable
fn required<F>(lookup: &F, name: &str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name)
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| ConfigError::MissingEnvVar(name.to_string()))
}

/// Get an optional variable, parsing it when present
fn parsed<F, T>(lookup: &F, name: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(name) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e: T::Err| ConfigError::InvalidValue(name.to_string(), e.to_string())),
        None => Ok(default),
    }
}
