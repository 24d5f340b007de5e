use std::env;

use crate::error::AppError;

#[derive(Debug, Clone)]
pub struct Config {
    pub http_port: u16,
    pub log_level: String,
    pub match_interval_ms: u64,
    pub event_buffer_size: usize,
    pub session_cache_capacity: usize,
    pub session_ttl_seconds: i64,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        let _ = dotenvy::dotenv();

        Ok(Self {
            http_port: parse_or_default("HTTP_PORT", 8080)?,
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            match_interval_ms: parse_or_default("MATCH_INTERVAL_MS", 500)?,
            event_buffer_size: parse_or_default("EVENT_BUFFER_SIZE", 1024)?,
            session_cache_capacity: parse_or_default("SESSION_CACHE_CAPACITY", 1024)?,
            session_ttl_seconds: parse_or_default("SESSION_TTL_SECONDS", 60)?,
        })
    }
}

fn parse_or_default<T>(key: &str, default: T) -> Result<T, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .map_err(|err| AppError::Internal(format!("invalid {key}: {err}"))),
        Err(_) => Ok(default),
    }
}
