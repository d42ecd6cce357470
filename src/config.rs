/*
 * Responsibility
 * - 環境変数や設定の読み込み (REGISTRY_URL, refresh 間隔, upstream timeout など)
 * - 設定値のバリデーション (不足なら起動失敗)
 */
use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    pub fn from_env() -> Self {
        match std::env::var("APP_ENV")
            .unwrap_or_else(|_| "development".to_string())
            .to_ascii_lowercase()
            .as_str()
        {
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "missing configuration: {}", key),
            ConfigError::Invalid(key) => write!(f, "invalid configuration: {}", key),
        }
    }
}

impl std::error::Error for ConfigError {}

pub struct Config {
    pub addr: SocketAddr,
    pub app_env: AppEnv,

    pub registry_url: String,
    pub registry_refresh_interval: Duration,
    pub registry_timeout: Duration,

    pub greetings_service_id: String,
    pub upstream_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let port: u16 = std::env::var("PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(3000);

        let addr: SocketAddr = SocketAddr::from_str(&format!("0.0.0.0:{}", port))
            .map_err(|_| ConfigError::Invalid("PORT"))?;

        let app_env = AppEnv::from_env();

        let registry_url =
            std::env::var("REGISTRY_URL").map_err(|_| ConfigError::Missing("REGISTRY_URL"))?;

        // Refresh cadence / deadlines are all in whole seconds. 0 は不正。
        let registry_refresh_interval = seconds_var("REGISTRY_REFRESH_SECONDS", 30)?;
        let registry_timeout = seconds_var("REGISTRY_TIMEOUT_SECONDS", 5)?;
        let upstream_timeout = seconds_var("UPSTREAM_TIMEOUT_SECONDS", 10)?;

        let greetings_service_id = std::env::var("GREETINGS_SERVICE_ID")
            .unwrap_or_else(|_| "greetings-service".to_string());

        Ok(Self {
            addr,
            app_env,
            registry_url,
            registry_refresh_interval,
            registry_timeout,
            greetings_service_id,
            upstream_timeout,
        })
    }
}

fn seconds_var(key: &'static str, default_seconds: u64) -> Result<Duration, ConfigError> {
    match std::env::var(key) {
        Err(_) => Ok(Duration::from_secs(default_seconds)),
        Ok(raw) => {
            let seconds: u64 = raw.parse().map_err(|_| ConfigError::Invalid(key))?;
            if seconds == 0 {
                return Err(ConfigError::Invalid(key));
            }
            Ok(Duration::from_secs(seconds))
        }
    }
}
