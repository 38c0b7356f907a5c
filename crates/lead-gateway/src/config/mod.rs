use std::env;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use url::Url;

const DEFAULT_UPSTREAM_TIMEOUT_SECS: u64 = 10;

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration, loaded once at process start and immutable afterwards.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub gateway: GatewayConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
        let log_format = LogFormat::parse(
            &env::var("APP_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string()),
        )?;

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig {
                log_level,
                log_format,
            },
            gateway: GatewayConfig::from_env()?,
        })
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
    pub log_format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Compact,
    Json,
}

impl LogFormat {
    fn parse(value: &str) -> Result<Self, ConfigError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "" | "compact" | "text" => Ok(Self::Compact),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::InvalidLogFormat(other.to_string())),
        }
    }
}

/// Which value a response carries in `Access-Control-Allow-Origin`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AllowedOrigins {
    /// Literal `*`.
    Any,
    /// Echo the request `Origin` header.
    Reflect,
    /// Echo the request origin when listed, otherwise answer with the first entry.
    List(Vec<String>),
}

impl AllowedOrigins {
    pub fn parse(value: &str) -> Result<Self, ConfigError> {
        let trimmed = value.trim();
        if trimmed.is_empty() || trimmed == "*" {
            return Ok(Self::Any);
        }
        if trimmed.eq_ignore_ascii_case("reflect") {
            return Ok(Self::Reflect);
        }

        let origins: Vec<String> = trimmed
            .split(',')
            .map(|origin| origin.trim().trim_end_matches('/').to_string())
            .filter(|origin| !origin.is_empty())
            .collect();

        if origins.iter().any(|origin| origin == "*") {
            return Err(ConfigError::InvalidAllowedOrigins(
                "`*` cannot be combined with explicit origins".to_string(),
            ));
        }

        Ok(Self::List(origins))
    }

    pub fn mode_label(&self) -> &'static str {
        match self {
            Self::Any => "any",
            Self::Reflect => "reflect",
            Self::List(_) => "allow-list",
        }
    }
}

/// Lead forwarding settings.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Downstream notification endpoint. `None` keeps the service up but every
    /// submission is answered with a configuration error.
    pub lead_endpoint: Option<Url>,
    pub allowed_origins: AllowedOrigins,
    pub fallback_origin: Option<String>,
    pub upstream_timeout: Duration,
}

impl GatewayConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let lead_endpoint = non_empty_var("LEAD_ENDPOINT_URL")
            .or_else(|| non_empty_var("WORKER_LEAD_URL"))
            .map(|raw| {
                Url::parse(&raw).map_err(|source| ConfigError::InvalidLeadEndpoint { raw, source })
            })
            .transpose()?;

        let allowed_origins =
            AllowedOrigins::parse(&env::var("LEAD_ALLOWED_ORIGINS").unwrap_or_default())?;

        let timeout_secs = match non_empty_var("LEAD_UPSTREAM_TIMEOUT_SECS") {
            Some(raw) => raw
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .ok_or(ConfigError::InvalidTimeout)?,
            None => DEFAULT_UPSTREAM_TIMEOUT_SECS,
        };

        Ok(Self {
            lead_endpoint,
            allowed_origins,
            fallback_origin: non_empty_var("LEAD_FALLBACK_ORIGIN"),
            upstream_timeout: Duration::from_secs(timeout_secs),
        })
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            lead_endpoint: None,
            allowed_origins: AllowedOrigins::Any,
            fallback_origin: None,
            upstream_timeout: Duration::from_secs(DEFAULT_UPSTREAM_TIMEOUT_SECS),
        }
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("APP_PORT must be a valid u16")]
    InvalidPort,
    #[error("APP_HOST must parse to an IPv4 or IPv6 address")]
    InvalidHost { source: std::net::AddrParseError },
    #[error("APP_LOG_FORMAT must be `compact` or `json`, got `{0}`")]
    InvalidLogFormat(String),
    #[error("LEAD_ENDPOINT_URL `{raw}` is not a valid URL")]
    InvalidLeadEndpoint {
        raw: String,
        source: url::ParseError,
    },
    #[error("LEAD_ALLOWED_ORIGINS is invalid: {0}")]
    InvalidAllowedOrigins(String),
    #[error("LEAD_UPSTREAM_TIMEOUT_SECS must be a positive number of seconds")]
    InvalidTimeout,
    #[error("lead endpoint not configured; set LEAD_ENDPOINT_URL")]
    MissingLeadEndpoint,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::{Mutex, OnceLock};

    fn env_guard() -> &'static Mutex<()> {
        static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
        GUARD.get_or_init(|| Mutex::new(()))
    }

    fn reset_env() {
        for key in [
            "APP_ENV",
            "APP_HOST",
            "APP_PORT",
            "APP_LOG_LEVEL",
            "APP_LOG_FORMAT",
            "LEAD_ENDPOINT_URL",
            "WORKER_LEAD_URL",
            "LEAD_ALLOWED_ORIGINS",
            "LEAD_FALLBACK_ORIGIN",
            "LEAD_UPSTREAM_TIMEOUT_SECS",
        ] {
            env::remove_var(key);
        }
    }

    #[test]
    fn load_uses_defaults_when_env_missing() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        let config = AppConfig::load().expect("config loads with defaults");
        assert_eq!(config.environment, AppEnvironment::Development);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.telemetry.log_level, "info");
        assert_eq!(config.telemetry.log_format, LogFormat::Compact);
        assert!(config.gateway.lead_endpoint.is_none());
        assert_eq!(config.gateway.allowed_origins, AllowedOrigins::Any);
        assert_eq!(config.gateway.upstream_timeout, Duration::from_secs(10));
    }

    #[test]
    fn accepts_localhost_host() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_HOST", "localhost");
        let config = AppConfig::load().expect("config loads");
        let addr = config.server.socket_addr().expect("localhost resolves");
        assert_eq!(addr, SocketAddr::new(IpAddr::from([127, 0, 0, 1]), 3000));
    }

    #[test]
    fn legacy_worker_variable_supplies_endpoint() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("WORKER_LEAD_URL", "https://mail.example.workers.dev/lead");
        let config = AppConfig::load().expect("config loads");
        let endpoint = config.gateway.lead_endpoint.expect("endpoint configured");
        assert_eq!(endpoint.as_str(), "https://mail.example.workers.dev/lead");
    }

    #[test]
    fn rejects_unparsable_endpoint() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("LEAD_ENDPOINT_URL", "not a url");
        let err = AppConfig::load().expect_err("invalid url rejected");
        assert!(matches!(err, ConfigError::InvalidLeadEndpoint { .. }));
    }

    #[test]
    fn rejects_zero_timeout() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("LEAD_UPSTREAM_TIMEOUT_SECS", "0");
        let err = AppConfig::load().expect_err("zero timeout rejected");
        assert!(matches!(err, ConfigError::InvalidTimeout));
    }

    #[test]
    fn parses_origin_modes() {
        assert_eq!(AllowedOrigins::parse("*").expect("any"), AllowedOrigins::Any);
        assert_eq!(
            AllowedOrigins::parse("Reflect").expect("reflect"),
            AllowedOrigins::Reflect
        );
        assert_eq!(
            AllowedOrigins::parse("https://a.example/, https://b.example").expect("list"),
            AllowedOrigins::List(vec![
                "https://a.example".to_string(),
                "https://b.example".to_string()
            ])
        );
        assert!(AllowedOrigins::parse("*, https://a.example").is_err());
    }
}
