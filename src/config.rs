use crate::errors::ConfigError;
use std::{
    env,
    fmt::Display,
    net::{IpAddr, SocketAddr},
    path::PathBuf,
    str::FromStr,
    time::Duration,
};
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct Config {
    pub host: IpAddr,
    pub port: u16,
    pub api_base_url: String,
    pub session_path: PathBuf,
    pub request_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_base_url: String = try_load("HABIT_API_URL", "http://127.0.0.1:8000/api")?;
        let timeout_secs: u64 = try_load("HABIT_API_TIMEOUT_SECS", "10")?;

        Ok(Self {
            host: try_load("HOST", "127.0.0.1")?,
            port: try_load("PORT", "8080")?,
            api_base_url: api_base_url.trim_end_matches('/').to_string(),
            session_path: try_load("HABIT_SESSION_PATH", "data/session.json")?,
            request_timeout: Duration::from_secs(timeout_secs),
        })
    }

    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    pub fn google_redirect_url(&self) -> String {
        format!("{}/auth/google/redirect", self.api_base_url)
    }
}

fn try_load<T: FromStr>(key: &'static str, default: &str) -> Result<T, ConfigError>
where
    T::Err: Display,
{
    let raw = env::var(key).unwrap_or_else(|_| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });

    raw.parse().map_err(|e: T::Err| {
        warn!("Invalid {key} value: {e}");
        ConfigError::Invalid {
            key,
            message: e.to_string(),
        }
    })
}
