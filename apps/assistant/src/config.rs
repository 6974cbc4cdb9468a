use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_TYPING_DELAY_MS: u64 = 1000;
const DEFAULT_SESSION_IDLE_TTL_SECS: u64 = 30 * 60;
const DEFAULT_SESSION_SWEEP_INTERVAL_SECS: u64 = 60;

/// Application configuration loaded from environment variables.
/// Every variable is optional; malformed values fail startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    /// Cosmetic pause before each session reply.
    pub typing_delay_ms: u64,
    /// Fixes the response picker's seed for reproducible replies.
    pub response_seed: Option<u64>,
    /// JSON file replacing the embedded knowledge base.
    pub knowledge_base_path: Option<PathBuf>,
    /// Sessions idle this long are closed. Zero keeps sessions until deleted.
    pub session_idle_ttl_secs: u64,
    pub session_sweep_interval_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        Ok(Config {
            port: parse_or(&lookup, "PORT", DEFAULT_PORT)?,
            rust_log: lookup("RUST_LOG").unwrap_or_else(|| "info".to_string()),
            typing_delay_ms: parse_or(&lookup, "TYPING_DELAY_MS", DEFAULT_TYPING_DELAY_MS)?,
            response_seed: parse_optional(&lookup, "RESPONSE_SEED")?,
            knowledge_base_path: lookup("KNOWLEDGE_BASE_PATH")
                .filter(|p| !p.trim().is_empty())
                .map(PathBuf::from),
            session_idle_ttl_secs: parse_or(
                &lookup,
                "SESSION_IDLE_TTL_SECS",
                DEFAULT_SESSION_IDLE_TTL_SECS,
            )?,
            session_sweep_interval_secs: parse_or(
                &lookup,
                "SESSION_SWEEP_INTERVAL_SECS",
                DEFAULT_SESSION_SWEEP_INTERVAL_SECS,
            )?,
        })
    }

    pub fn typing_delay(&self) -> Duration {
        Duration::from_millis(self.typing_delay_ms)
    }

    /// Idle TTL and sweep period, or `None` when reaping is disabled.
    pub fn session_reaping(&self) -> Option<(Duration, Duration)> {
        if self.session_idle_ttl_secs == 0 || self.session_sweep_interval_secs == 0 {
            return None;
        }
        Some((
            Duration::from_secs(self.session_idle_ttl_secs),
            Duration::from_secs(self.session_sweep_interval_secs),
        ))
    }
}

fn parse_optional<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    lookup(key)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .with_context(|| format!("{key} must be a valid number, got '{raw}'"))
        })
        .transpose()
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    Ok(parse_optional(lookup, key)?.unwrap_or(default))
}
