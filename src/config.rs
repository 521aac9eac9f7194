use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;
use std::str::FromStr;

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub server_addr: String,
    pub api_prefix: String,

    // Rate limiting
    pub rate_protected_per_min: u32,

    // Batch recalculation
    pub recalc_concurrency: usize,
    pub max_recalc_days: usize,

    pub run_migrations: bool,
    pub log_dir: String,
}

fn required(key: &str) -> Result<String> {
    env::var(key).with_context(|| format!("{key} must be set"))
}

fn or_default<T: FromStr>(key: &str, default: T) -> Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => raw
            .parse()
            .with_context(|| format!("{key} has an invalid value: {raw}")),
        Err(_) => Ok(default),
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        Ok(Self {
            server_addr: required("SERVER_ADDR")?,
            database_url: required("DATABASE_URL")?,
            jwt_secret: required("JWT_SECRET")?,
            api_prefix: env::var("API_PREFIX").unwrap_or_else(|_| "/api/v1".to_string()),

            rate_protected_per_min: or_default("RATE_PROTECTED_PER_MIN", 1000)?,

            recalc_concurrency: or_default("RECALC_CONCURRENCY", 8)?,
            max_recalc_days: or_default("MAX_RECALC_DAYS", 62)?, // two months

            run_migrations: or_default("RUN_MIGRATIONS", false)?,
            log_dir: env::var("LOG_DIR").unwrap_or_else(|_| "logs".to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_keys_fall_back_to_defaults() {
        let concurrency: usize = or_default("HRM_TEST_UNSET_CONCURRENCY", 8).unwrap();
        assert_eq!(concurrency, 8);
        assert!(required("HRM_TEST_UNSET_REQUIRED").is_err());
    }
}
