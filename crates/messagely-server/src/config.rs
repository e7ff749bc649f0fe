use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};

/// Placeholder JWT secrets that MUST NOT be used.
const PLACEHOLDER_SECRETS: &[&str] = &[
    "change-me-to-a-random-string",
    "dev-secret-change-me",
    "secret",
];

const DEFAULT_HASH_COST: u32 = 3;
const DEFAULT_HASH_MEMORY_KIB: u32 = 19 * 1024;
const DEFAULT_TOKEN_TTL_HOURS: i64 = 720; // 30 days

/// Process configuration, read once at start-up.
#[derive(Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
    pub jwt_secret: String,
    pub hash_cost: u32,
    pub hash_memory_kib: u32,
    /// `None` disables the expiry claim.
    pub token_ttl: Option<chrono::Duration>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let jwt_secret = lookup("MESSAGELY_JWT_SECRET").unwrap_or_default();
        if jwt_secret.is_empty() || PLACEHOLDER_SECRETS.contains(&jwt_secret.as_str()) {
            bail!("MESSAGELY_JWT_SECRET is unset or still a placeholder");
        }

        let hash_cost = parse_or(&lookup, "MESSAGELY_HASH_COST", DEFAULT_HASH_COST)?;
        let hash_memory_kib = parse_or(&lookup, "MESSAGELY_HASH_MEMORY_KIB", DEFAULT_HASH_MEMORY_KIB)?;
        let ttl_hours: i64 = parse_or(&lookup, "MESSAGELY_TOKEN_TTL_HOURS", DEFAULT_TOKEN_TTL_HOURS)?;
        if ttl_hours < 0 {
            bail!("MESSAGELY_TOKEN_TTL_HOURS must not be negative");
        }

        Ok(Self {
            host: lookup("MESSAGELY_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port: parse_or(&lookup, "MESSAGELY_PORT", 3000)?,
            db_path: lookup("MESSAGELY_DB_PATH")
                .unwrap_or_else(|| "messagely.db".into())
                .into(),
            jwt_secret,
            hash_cost,
            hash_memory_kib,
            token_ttl: (ttl_hours > 0).then(|| chrono::Duration::hours(ttl_hours)),
        })
    }

    pub fn listen_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("invalid listen address {}:{}", self.host, self.port))
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{key} has invalid value {raw:?}")),
        None => Ok(default),
    }
}
