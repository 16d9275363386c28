/// Configuration management for the API server
///
/// This module loads configuration from environment variables and provides
/// a type-safe configuration struct.
///
/// # Environment Variables
///
/// - `API_HOST`: Host to bind to (default: 0.0.0.0)
/// - `API_PORT`: Port to bind to (default: 8080)
/// - `PRODUCTION`: Enables HSTS and `Secure` cookies (default: false)
/// - `CORS_ORIGINS`: Comma-separated allowed origins, `*` for any (default: *)
/// - `REDIS_URL`: Redis connection string (required)
/// - `SESSION_TTL_DAYS`: Session lifetime (default: 7)
/// - `TASK_RETENTION_DAYS`: Soft-delete recovery window (default: 7)
/// - `RATE_LIMIT_PER_MINUTE`: Requests per client IP per minute (default: 100)
/// - `RUST_LOG`: Log filter, `LOG_FORMAT=json` for JSON logs
///
/// # Example
///
/// ```no_run
/// use taskhub_api::config::Config;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// println!("Server will listen on {}:{}", config.api.host, config.api.port);
/// # Ok(())
/// # }
/// ```

use serde::{Deserialize, Serialize};
use std::env;
use taskhub_shared::redis::RedisConfig;

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// API server configuration
    pub api: ApiConfig,

    /// Redis configuration
    pub redis: RedisConfig,

    /// Session and task lifetimes
    pub lifetimes: LifetimeConfig,

    /// Per-IP request budget
    pub rate_limit: RateLimitConfig,
}

/// API server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Host to bind to
    pub host: String,

    /// Port to bind to
    pub port: u16,

    /// Production mode (HSTS, `Secure` cookies)
    pub production: bool,

    /// Allowed CORS origins; `*` means any
    pub cors_origins: Vec<String>,
}

/// Session and soft-delete lifetimes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LifetimeConfig {
    /// Session lifetime in days
    pub session_ttl_days: i64,

    /// Soft-delete recovery window in days
    pub task_retention_days: i64,
}

/// Rate limiting configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Requests allowed per client IP per window
    pub requests_per_minute: u64,
}

impl Default for LifetimeConfig {
    fn default() -> Self {
        Self {
            session_ttl_days: 7,
            task_retention_days: 7,
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests_per_minute: 100,
        }
    }
}

impl Config {
    /// Loads configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `REDIS_URL` is missing
    /// - A numeric variable cannot be parsed
    /// - A lifetime or the rate limit is zero
    /// - `PRODUCTION` is set with a `*` CORS origin
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env file if present (for development)
        dotenvy::dotenv().ok();

        let api_host = env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let api_port = env::var("API_PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse::<u16>()?;

        let production = env::var("PRODUCTION")
            .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        let cors_origins = parse_origins(&env::var("CORS_ORIGINS").unwrap_or_else(|_| "*".to_string()));

        let redis = RedisConfig::from_env()?;

        let session_ttl_days = env::var("SESSION_TTL_DAYS")
            .unwrap_or_else(|_| "7".to_string())
            .parse::<i64>()?;
        let task_retention_days = env::var("TASK_RETENTION_DAYS")
            .unwrap_or_else(|_| "7".to_string())
            .parse::<i64>()?;
        let requests_per_minute = env::var("RATE_LIMIT_PER_MINUTE")
            .unwrap_or_else(|_| "100".to_string())
            .parse::<u64>()?;

        let config = Self {
            api: ApiConfig {
                host: api_host,
                port: api_port,
                production,
                cors_origins,
            },
            redis,
            lifetimes: LifetimeConfig {
                session_ttl_days,
                task_retention_days,
            },
            rate_limit: RateLimitConfig {
                requests_per_minute,
            },
        };

        config.validate()?;
        Ok(config)
    }

    /// Rejects settings the server must not start with
    ///
    /// A wildcard origin is refused in production: session cookies would
    /// otherwise be usable from any site the browser considers same-site.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.lifetimes.session_ttl_days <= 0 {
            anyhow::bail!("SESSION_TTL_DAYS must be positive");
        }
        if self.lifetimes.task_retention_days <= 0 {
            anyhow::bail!("TASK_RETENTION_DAYS must be positive");
        }
        if self.rate_limit.requests_per_minute == 0 {
            anyhow::bail!("RATE_LIMIT_PER_MINUTE must be positive");
        }
        if self.api.production && self.allows_any_origin() {
            anyhow::bail!("CORS_ORIGINS must list explicit origins when PRODUCTION is set");
        }
        Ok(())
    }

    /// True when `CORS_ORIGINS` contains the `*` wildcard
    pub fn allows_any_origin(&self) -> bool {
        self.api.cors_origins.iter().any(|o| o == "*")
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
