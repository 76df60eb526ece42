use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use chrono::FixedOffset;

use crate::timefmt::parse_utc_offset;

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

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub mail: MailConfig,
    pub display_offset: FixedOffset,
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

        let raw_offset = env::var("APP_DISPLAY_UTC_OFFSET").unwrap_or_else(|_| "+01:00".to_string());
        let display_offset =
            parse_utc_offset(&raw_offset).ok_or(ConfigError::InvalidOffset { value: raw_offset })?;

        let mail = MailConfig::from_env(&host, port)?;

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            mail,
            display_offset,
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
}

/// Outbound mail identities and pacing for credential dispatch.
#[derive(Clone)]
pub struct MailConfig {
    pub api_keys: Vec<String>,
    pub quota_per_key: u32,
    pub send_interval: Duration,
    pub sender_email: String,
    pub sender_name: String,
    pub login_url: String,
}

// Keys stay out of debug output.
impl fmt::Debug for MailConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MailConfig")
            .field("api_keys", &format_args!("[{} configured]", self.api_keys.len()))
            .field("quota_per_key", &self.quota_per_key)
            .field("send_interval", &self.send_interval)
            .field("sender_email", &self.sender_email)
            .field("sender_name", &self.sender_name)
            .field("login_url", &self.login_url)
            .finish()
    }
}

impl MailConfig {
    fn from_env(host: &str, port: u16) -> Result<Self, ConfigError> {
        let api_keys = env::var("MAIL_API_KEYS")
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .map(str::to_string)
            .collect();

        let quota_per_key = env::var("MAIL_QUOTA_PER_KEY")
            .unwrap_or_else(|_| "300".to_string())
            .parse::<u32>()
            .ok()
            .filter(|quota| *quota > 0)
            .ok_or(ConfigError::InvalidQuota)?;

        let send_interval = env::var("MAIL_SEND_INTERVAL_MS")
            .unwrap_or_else(|_| "100".to_string())
            .parse::<u64>()
            .map(Duration::from_millis)
            .map_err(|_| ConfigError::InvalidInterval)?;

        let sender_email = env::var("MAIL_SENDER_EMAIL")
            .unwrap_or_else(|_| "noreply@election-poll.local".to_string());
        let sender_name = env::var("MAIL_SENDER_NAME").unwrap_or_else(|_| "Election Poll".to_string());
        let login_url = env::var("APP_LOGIN_URL")
            .unwrap_or_else(|_| format!("http://{host}:{port}/voter/login"));

        Ok(Self {
            api_keys,
            quota_per_key,
            send_interval,
            sender_email,
            sender_name,
            login_url,
        })
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidQuota,
    InvalidInterval,
    InvalidOffset { value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidQuota => {
                write!(f, "MAIL_QUOTA_PER_KEY must be a positive integer")
            }
            ConfigError::InvalidInterval => {
                write!(f, "MAIL_SEND_INTERVAL_MS must be a whole number of milliseconds")
            }
            ConfigError::InvalidOffset { value } => write!(
                f,
                "APP_DISPLAY_UTC_OFFSET '{}' must look like +01:00 or -05:30",
                value
            ),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidQuota
            | ConfigError::InvalidInterval
            | ConfigError::InvalidOffset { .. } => None,
        }
    }
}
