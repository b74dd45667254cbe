use anyhow::{Context, Result};
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 5;
pub const DEFAULT_RATE_LIMIT_PER_MINUTE: u32 = 10;
pub const DEFAULT_QUERY_CACHE_CAPACITY: usize = 1;

pub const LASTFM_API_URL: &str = "https://ws.audioscrobbler.com/2.0/";
pub const SPOTIFY_API_URL: &str = "https://api.spotify.com/v1";
pub const SPOTIFY_ACCOUNTS_URL: &str = "https://accounts.spotify.com/api/token";

#[derive(Debug, Clone)]
pub struct SpotifyCredentials {
    pub client_id: String,
    pub client_secret: String,
}

/// Process configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub lastfm_api_key: String,
    pub lastfm_api_url: String,
    pub spotify: Option<SpotifyCredentials>,
    pub spotify_api_url: String,
    pub spotify_accounts_url: String,
    pub http_timeout: Duration,
    pub rate_limit_per_minute: u32,
    pub query_cache_capacity: usize,
    pub query_cache_ttl: Option<Duration>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from any key lookup, so tests don't touch the real environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lastfm_api_key = lookup("LASTFM_API_KEY")
            .filter(|key| !key.trim().is_empty())
            .context("LASTFM_API_KEY must be set")?;

        let spotify = match (lookup("SPOTIFY_CLIENT_ID"), lookup("SPOTIFY_CLIENT_SECRET")) {
            (Some(client_id), Some(client_secret))
                if !client_id.is_empty() && !client_secret.is_empty() =>
            {
                Some(SpotifyCredentials {
                    client_id,
                    client_secret,
                })
            }
            _ => {
                tracing::warn!("Spotify credentials not set, catalog lookups are disabled");
                None
            }
        };

        let rate_limit_per_minute =
            parse_or(&lookup, "RATE_LIMIT_PER_MINUTE", DEFAULT_RATE_LIMIT_PER_MINUTE).max(1);
        let query_cache_capacity =
            parse_or(&lookup, "QUERY_CACHE_CAPACITY", DEFAULT_QUERY_CACHE_CAPACITY).max(1);

        Ok(Self {
            port: parse_or(&lookup, "PORT", DEFAULT_PORT),
            lastfm_api_key,
            lastfm_api_url: lookup("LASTFM_API_URL").unwrap_or_else(|| LASTFM_API_URL.to_string()),
            spotify,
            spotify_api_url: lookup("SPOTIFY_API_URL")
                .unwrap_or_else(|| SPOTIFY_API_URL.to_string()),
            spotify_accounts_url: lookup("SPOTIFY_ACCOUNTS_URL")
                .unwrap_or_else(|| SPOTIFY_ACCOUNTS_URL.to_string()),
            http_timeout: Duration::from_secs(parse_or(
                &lookup,
                "HTTP_TIMEOUT_SECS",
                DEFAULT_HTTP_TIMEOUT_SECS,
            )),
            rate_limit_per_minute,
            query_cache_capacity,
            query_cache_ttl: lookup("QUERY_CACHE_TTL_SECS")
                .and_then(|secs| secs.parse::<u64>().ok())
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs),
        })
    }

    /// Shared HTTP client for every upstream call, with the configured timeout.
    pub fn http_client(&self) -> Result<reqwest::Client> {
        reqwest::Client::builder()
            .user_agent(concat!("huematch/", env!("CARGO_PKG_VERSION")))
            .timeout(self.http_timeout)
            .build()
            .context("Failed to build HTTP client")
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr + Copy + std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!("Invalid {}={:?}, using default {}", key, raw, default);
            default
        }),
        None => default,
    }
}
