use anyhow::Context;
use ipnet::IpNet;

use crate::ratelimit::{ClientKeyPolicy, RateLimitConfig};
use crate::registry::codegen::{MAX_CODE_LENGTH, MIN_CODE_LENGTH};

/// Upper bound for every duration read from the environment, in seconds
pub const MAX_DURATION_SECS: u64 = 365 * 24 * 60 * 60;

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    /// Public origin used to build `short_url` values
    pub base_url: String,
    pub short_code_length: usize,
    pub rate_limit: RateLimitConfig,
    pub client_key: ClientKeyPolicy,
    pub expiration: ExpirationConfig,
    pub cache: CacheConfig,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone)]
pub struct ExpirationConfig {
    /// How often the background sweeper runs
    pub sweep_interval_secs: u64,
}

#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Lifetime of cached link previews
    pub preview_ttl_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
            },
            base_url: "http://localhost:8080".to_string(),
            short_code_length: 8,
            rate_limit: RateLimitConfig::default(),
            client_key: ClientKeyPolicy::default(),
            expiration: ExpirationConfig {
                sweep_interval_secs: 3600,
            },
            cache: CacheConfig {
                preview_ttl_secs: 300,
            },
        }
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let defaults = Self::default();

        let host = std::env::var("HOST").unwrap_or(defaults.server.host);
        let port = parse_env("PORT", defaults.server.port)?;

        let base_url = std::env::var("BASE_URL")
            .map(|v| v.trim_end_matches('/').to_string())
            .unwrap_or(defaults.base_url);

        let short_code_length = parse_env("SHORT_CODE_LENGTH", defaults.short_code_length)?;

        let rate_limit = RateLimitConfig {
            limit: parse_env("RATE_LIMIT_REQUESTS", defaults.rate_limit.limit)?,
            window_secs: parse_env("RATE_LIMIT_WINDOW_SECS", defaults.rate_limit.window_secs)?,
        };

        let client_key = client_key_policy_from_env()?;

        let sweep_interval_secs = parse_env(
            "SWEEP_INTERVAL_SECS",
            defaults.expiration.sweep_interval_secs,
        )?;

        let preview_ttl_secs = parse_env("PREVIEW_CACHE_TTL_SECS", defaults.cache.preview_ttl_secs)?;

        let config = Config {
            server: ServerConfig { host, port },
            base_url,
            short_code_length,
            rate_limit,
            client_key,
            expiration: ExpirationConfig {
                sweep_interval_secs,
            },
            cache: CacheConfig { preview_ttl_secs },
        };
        config.validate()?;

        Ok(config)
    }

    /// Reject values the services cannot run with
    pub fn validate(&self) -> anyhow::Result<()> {
        if !(MIN_CODE_LENGTH..=MAX_CODE_LENGTH).contains(&self.short_code_length) {
            anyhow::bail!(
                "SHORT_CODE_LENGTH must be between {MIN_CODE_LENGTH} and {MAX_CODE_LENGTH}, got {}",
                self.short_code_length
            );
        }

        check_duration("RATE_LIMIT_WINDOW_SECS", self.rate_limit.window_secs, 1)?;
        check_duration("SWEEP_INTERVAL_SECS", self.expiration.sweep_interval_secs, 1)?;
        check_duration("PREVIEW_CACHE_TTL_SECS", self.cache.preview_ttl_secs, 0)?;

        Ok(())
    }
}

fn check_duration(name: &str, secs: u64, min: u64) -> anyhow::Result<()> {
    if !(min..=MAX_DURATION_SECS).contains(&secs) {
        anyhow::bail!("{name} must be between {min} and {MAX_DURATION_SECS} seconds, got {secs}");
    }
    Ok(())
}

fn parse_env<T>(name: &str, default: T) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{name} has an invalid value: {raw}")),
        Err(_) => Ok(default),
    }
}

fn client_key_policy_from_env() -> anyhow::Result<ClientKeyPolicy> {
    let mode = std::env::var("CLIENT_KEY_MODE")
        .unwrap_or_else(|_| "remote".to_string())
        .to_lowercase();

    let policy = match mode.as_str() {
        "remote" => ClientKeyPolicy::Remote,
        "forwarded" => {
            let trusted_proxies = std::env::var("TRUSTED_PROXIES")
                .ok()
                .map(|raw| {
                    raw.split(',')
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .map(|s| {
                            s.parse::<IpNet>()
                                .with_context(|| format!("TRUSTED_PROXIES has an invalid CIDR: {s}"))
                        })
                        .collect::<anyhow::Result<Vec<_>>>()
                })
                .transpose()?
                .unwrap_or_default();
            let num_trusted_proxies = std::env::var("NUM_TRUSTED_PROXIES")
                .ok()
                .and_then(|v| v.parse::<usize>().ok());

            ClientKeyPolicy::Forwarded {
                trusted_proxies,
                num_trusted_proxies,
            }
        }
        "header" => ClientKeyPolicy::Header {
            name: std::env::var("CLIENT_KEY_HEADER")
                .unwrap_or_else(|_| "x-api-key".to_string())
                .to_lowercase(),
        },
        other => {
            tracing::warn!(
                "Unknown CLIENT_KEY_MODE '{other}', falling back to 'remote'. Supported values: remote, forwarded, header"
            );
            ClientKeyPolicy::Remote
        }
    };

    Ok(policy)
}
