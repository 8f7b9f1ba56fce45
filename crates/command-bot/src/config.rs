//! Application configuration loaded from environment variables.

use anyhow::{Context, Result};
use secrecy::SecretString;
use serde::Deserialize;
use std::time::Duration;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Discord application configuration
    pub discord: DiscordConfig,

    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Cache lifetimes and sweeping
    #[serde(default)]
    pub cache: CacheConfig,

    /// Upstream API configuration
    #[serde(default)]
    pub upstream: UpstreamConfig,

    /// Bot configuration
    #[serde(default)]
    pub bot: BotConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DiscordConfig {
    /// Application ID
    pub application_id: String,

    /// Hex-encoded Ed25519 public key used to verify interactions
    pub public_key: String,

    /// Bot token, only needed for authenticated API calls
    #[serde(default)]
    pub token: Option<SecretString>,

    /// REST API base URL
    #[serde(default = "default_discord_api")]
    pub api_base: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    /// How long a resolved record stays cached
    #[serde(default = "default_cache_ttl", with = "humantime_serde")]
    pub ttl: Duration,

    /// Alias entries live this many times longer than records
    #[serde(default = "default_alias_ttl_factor")]
    pub alias_ttl_factor: u32,

    /// Period of the cache sweep
    #[serde(default = "default_sweep_interval", with = "humantime_serde")]
    pub sweep_interval: Duration,

    /// How long the controls of an interactive message stay live
    #[serde(default = "default_component_ttl", with = "humantime_serde")]
    pub component_ttl: Duration,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpstreamConfig {
    /// Request timeout for every upstream API
    #[serde(default = "default_timeout", with = "humantime_serde")]
    pub timeout: Duration,

    #[serde(default = "default_snaz_url")]
    pub snaz_url: String,

    #[serde(default = "default_steam_community_url")]
    pub steam_community_url: String,

    #[serde(default = "default_mcsrvstat_url")]
    pub mcsrvstat_url: String,

    #[serde(default = "default_duckduckgo_url")]
    pub duckduckgo_url: String,

    #[serde(default = "default_duckduckgo_links_url")]
    pub duckduckgo_links_url: String,

    #[serde(default = "default_xkcd_url")]
    pub xkcd_url: String,

    #[serde(default = "default_opentdb_url")]
    pub opentdb_url: String,

    #[serde(default = "default_wynncraft_url")]
    pub wynncraft_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BotConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Global limit on incoming interaction requests
    #[serde(default = "default_rate_limit")]
    pub rate_limit_per_minute: u32,
}

// Default implementations
impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            port: default_port(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: default_cache_ttl(),
            alias_ttl_factor: default_alias_ttl_factor(),
            sweep_interval: default_sweep_interval(),
            component_ttl: default_component_ttl(),
        }
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            timeout: default_timeout(),
            snaz_url: default_snaz_url(),
            steam_community_url: default_steam_community_url(),
            mcsrvstat_url: default_mcsrvstat_url(),
            duckduckgo_url: default_duckduckgo_url(),
            duckduckgo_links_url: default_duckduckgo_links_url(),
            xkcd_url: default_xkcd_url(),
            opentdb_url: default_opentdb_url(),
            wynncraft_url: default_wynncraft_url(),
        }
    }
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            rate_limit_per_minute: default_rate_limit(),
        }
    }
}

// Default value functions
fn default_discord_api() -> String {
    discord_client::DEFAULT_API_BASE.into()
}

fn default_listen_addr() -> String {
    "0.0.0.0".into()
}

fn default_port() -> u16 {
    8020
}

fn default_cache_ttl() -> Duration {
    Duration::from_secs(60 * 60) // 1 hour
}

fn default_alias_ttl_factor() -> u32 {
    2
}

fn default_sweep_interval() -> Duration {
    Duration::from_secs(60 * 60)
}

fn default_component_ttl() -> Duration {
    Duration::from_secs(15 * 60)
}

fn default_timeout() -> Duration {
    Duration::from_secs(5)
}

fn default_snaz_url() -> String {
    "https://api.snaz.in".into()
}

fn default_steam_community_url() -> String {
    "https://steamcommunity.com".into()
}

fn default_mcsrvstat_url() -> String {
    "https://api.mcsrvstat.us".into()
}

fn default_duckduckgo_url() -> String {
    "https://duckduckgo.com".into()
}

fn default_duckduckgo_links_url() -> String {
    "https://links.duckduckgo.com".into()
}

fn default_xkcd_url() -> String {
    "https://xkcd.com".into()
}

fn default_opentdb_url() -> String {
    "https://opentdb.com".into()
}

fn default_wynncraft_url() -> String {
    "https://api.wynncraft.com".into()
}

fn default_log_level() -> String {
    "info".into()
}

fn default_rate_limit() -> u32 {
    600
}

impl Config {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self> {
        // Load .env file if present
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .separator("__")
                    // Snowflake IDs must stay strings.
                    .try_parsing(false),
            )
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }
}
