use std::time::Duration;

use anyhow::Result;

use crate::util::env::{env_opt, env_parse, env_req, init_env};

/// Process configuration, sourced from the environment (.env honored).
#[derive(Debug, Clone)]
pub struct Config {
    pub app_host: String,
    pub app_port: u16,
    /// Timeout for the outbound CSV feed request.
    pub http_timeout: Duration,
    pub database_url: String,
    pub db_max_conns: u32,
    /// Per-statement deadline for store calls.
    pub query_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        init_env();
        Ok(Self {
            app_host: env_opt("APP_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            app_port: env_parse("APP_PORT", 8080u16),
            http_timeout: Duration::from_secs(env_parse("HTTP_TIMEOUT_SECS", 30u64)),
            database_url: env_req("DATABASE_URL")?,
            db_max_conns: env_parse("DB_MAX_CONNS", 10u32),
            query_timeout: Duration::from_secs(env_parse("DB_QUERY_TIMEOUT_SECS", 10u64)),
        })
    }
}
