//! Service configuration, read from the environment (and `.env` via dotenvy).

use thiserror::Error;

pub const DEFAULT_PORT: u16 = 8083;
pub const DEFAULT_MAX_CONNECTIONS: u32 = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub port: u16,
    /// Postgres connection string. Absent means the in-memory store.
    pub database_url: Option<String>,
    pub max_connections: u32,
    pub nats_url: Option<String>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}

impl Default for Config {
    fn default() -> Self {
        Self { port: DEFAULT_PORT, database_url: None, max_connections: DEFAULT_MAX_CONNECTIONS, nats_url: None }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let defaults = Self::default();

        Ok(Self {
            port: parse(get("PORT"), "PORT")?.unwrap_or(defaults.port),
            database_url: get("DATABASE_URL"),
            max_connections: parse(get("DATABASE_MAX_CONNECTIONS"), "DATABASE_MAX_CONNECTIONS")?
                .unwrap_or(defaults.max_connections),
            nats_url: get("NATS_URL"),
        })
    }

    pub fn bind_addr(&self) -> String { format!("0.0.0.0:{}", self.port) }
}

fn parse<T: std::str::FromStr>(value: Option<String>, key: &'static str) -> Result<Option<T>, ConfigError> {
    value
        .map(|v| v.parse::<T>().map_err(|_| ConfigError::Invalid { key, value: v }))
        .transpose()
}
