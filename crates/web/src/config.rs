use anyhow::{Context, Result};

const DEFAULT_LOCK_TIMEOUT_MS: u64 = 5_000;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub api_keys: String,
    /// How long a request waits for a busy ladder before giving up.
    pub lock_timeout_ms: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            host: std::env::var("HOST").context("Cannot load HOST env variable")?,
            port: std::env::var("PORT")
                .context("PORT must be a number")?
                .parse()?,
            database_url: std::env::var("DATABASE_URL")
                .context("Cannot load DATABASE_URL env variable")?,
            api_keys: std::env::var("API_KEYS").unwrap_or_default(),
            lock_timeout_ms: match std::env::var("LADDER_LOCK_TIMEOUT_MS") {
                Ok(value) => value
                    .parse()
                    .context("LADDER_LOCK_TIMEOUT_MS must be a number of milliseconds")?,
                Err(_) => DEFAULT_LOCK_TIMEOUT_MS,
            },
        })
    }
}
