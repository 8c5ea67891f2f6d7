use std::time::Duration;

use anyhow::Context;

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub listen_addr: String,
    pub cors_origins: Vec<String>,
    /// Keys accepted in `X-API-Key` on the v2 surface. Empty disables the check.
    pub api_keys: Vec<String>,
    pub idempotency: IdempotencySettings,
    pub rate_limit_per_second: u64,
    pub rate_limit_burst: u32,
    pub seed_demo_data: bool,
    pub log_json: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IdempotencySettings {
    /// How long a stored response stays replayable.
    pub ttl: Duration,
    /// How long a request waits on a concurrent holder of the same key.
    pub wait: Duration,
    pub purge_interval: Duration,
}

impl Default for IdempotencySettings {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(3600),
            wait: Duration::from_millis(5000),
            purge_interval: Duration::from_secs(300),
        }
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let defaults = IdempotencySettings::default();

        let idempotency = IdempotencySettings {
            ttl: Duration::from_secs(env_number(
                "IDEMPOTENCY_TTL_SECS",
                defaults.ttl.as_secs(),
            )?),
            wait: Duration::from_millis(env_number(
                "IDEMPOTENCY_WAIT_MS",
                defaults.wait.as_millis() as u64,
            )?),
            purge_interval: Duration::from_secs(env_number(
                "IDEMPOTENCY_PURGE_INTERVAL_SECS",
                defaults.purge_interval.as_secs(),
            )?),
        };
        if idempotency.ttl.is_zero() {
            anyhow::bail!("IDEMPOTENCY_TTL_SECS must be greater than zero");
        }
        if idempotency.purge_interval.is_zero() {
            anyhow::bail!("IDEMPOTENCY_PURGE_INTERVAL_SECS must be greater than zero");
        }

        Ok(Self {
            database_url: std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            listen_addr: std::env::var("LISTEN_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".into()),
            cors_origins: split_list(
                &std::env::var("CORS_ORIGINS").unwrap_or_else(|_| "http://localhost:5173".into()),
            ),
            api_keys: split_list(&std::env::var("API_KEYS").unwrap_or_default()),
            idempotency,
            rate_limit_per_second: env_number("RATE_LIMIT_PER_SECOND", 5)?,
            rate_limit_burst: env_number("RATE_LIMIT_BURST", 20)?,
            seed_demo_data: std::env::var("SEED_DEMO_DATA")
                .map(|v| matches!(v.trim(), "1" | "true" | "yes"))
                .unwrap_or(false),
            log_json: std::env::var("LOG_FORMAT")
                .map(|v| v.eq_ignore_ascii_case("json"))
                .unwrap_or(false),
        })
    }
}

fn env_number<T>(name: &str, default: T) -> anyhow::Result<T>
where
    T: std::str::FromStr,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .ok()
            .with_context(|| format!("{} must be a number", name)),
        Err(_) => Ok(default),
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_list_drops_blank_entries() {
        assert_eq!(
            split_list(" key-a, ,key-b,"),
            vec!["key-a".to_string(), "key-b".to_string()]
        );
        assert!(split_list("").is_empty());
    }
}
