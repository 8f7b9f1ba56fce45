//! Minecraft server status lookups.

use crate::error::FetchError;
use crate::http::{build_client, check_status};
use crate::resolver::{CachePolicy, EntityResolver, EntitySource, Resolved};
use api_cache::CacheSweeper;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Deserializer};
use std::fmt;
use std::time::Duration;
use tracing::instrument;
use urlencoding::encode;

/// Address the status API reports for hosts it could not resolve.
const UNRESOLVED_IP: &str = "127.0.0.1";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edition {
    Java,
    Bedrock,
}

impl Edition {
    fn path_prefix(self) -> &'static str {
        match self {
            Edition::Java => "",
            Edition::Bedrock => "bedrock/",
        }
    }
}

impl fmt::Display for Edition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Edition::Java => write!(f, "java"),
            Edition::Bedrock => write!(f, "bedrock"),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Motd {
    #[serde(default)]
    pub raw: Vec<String>,
    #[serde(default)]
    pub clean: Vec<String>,
}

/// Bedrock servers report player counts as strings.
fn count<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Count {
        Number(u64),
        Text(String),
    }

    match Count::deserialize(deserializer)? {
        Count::Number(n) => Ok(n),
        Count::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Players {
    #[serde(deserialize_with = "count")]
    pub online: u64,
    #[serde(deserialize_with = "count")]
    pub max: u64,
    #[serde(default)]
    pub list: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NameList {
    #[serde(default)]
    pub names: Vec<String>,
    #[serde(default)]
    pub raw: Vec<String>,
}

/// Status of a Minecraft server. Offline servers only carry the address fields.
#[derive(Debug, Clone, Deserialize)]
pub struct MinecraftServer {
    pub ip: String,
    #[serde(default)]
    pub port: u16,
    pub online: bool,
    #[serde(default)]
    pub hostname: Option<String>,
    #[serde(default)]
    pub motd: Option<Motd>,
    #[serde(default)]
    pub players: Option<Players>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub software: Option<String>,
    #[serde(default)]
    pub map: Option<String>,
    #[serde(default)]
    pub plugins: Option<NameList>,
    #[serde(default)]
    pub mods: Option<NameList>,
}

impl MinecraftServer {
    /// Address shown to users: the hostname when known.
    pub fn public_address(&self) -> &str {
        self.hostname.as_deref().unwrap_or(&self.ip)
    }

    pub fn motd_text(&self) -> String {
        self.motd
            .as_ref()
            .map(|motd| motd.clean.join("\n"))
            .unwrap_or_default()
    }
}

/// Status lookups against mcsrvstat for one edition.
pub struct ServerSource {
    client: Client,
    base_url: String,
    edition: Edition,
}

impl ServerSource {
    pub fn new(client: Client, base_url: impl Into<String>, edition: Edition) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            edition,
        }
    }
}

#[async_trait]
impl EntitySource for ServerSource {
    type Record = MinecraftServer;

    fn domain(&self) -> &'static str {
        match self.edition {
            Edition::Java => "minecraft-servers",
            Edition::Bedrock => "minecraft-bedrock-servers",
        }
    }

    fn normalize(&self, lookup: &str) -> String {
        lookup.trim().to_lowercase()
    }

    async fn fetch(&self, key: &str) -> Result<Resolved<MinecraftServer>, FetchError> {
        let url = format!(
            "{}/{}2/{}",
            self.base_url,
            self.edition.path_prefix(),
            encode(key)
        );
        let response = self.client.get(url).send().await?;
        let server: MinecraftServer = check_status(response, "server").await?.json().await?;

        // Unresolvable hosts all report loopback, so key them by name instead.
        if server.ip == UNRESOLVED_IP {
            let canonical = server
                .hostname
                .as_deref()
                .map(str::to_lowercase)
                .unwrap_or_else(|| key.to_string());
            return Ok(Resolved::new(canonical, server));
        }

        let mut resolved = Resolved::new(server.ip.clone(), server.clone());
        if let Some(hostname) = &server.hostname {
            resolved = resolved.with_alias(hostname.clone());
        }
        Ok(resolved)
    }
}

/// Java and Bedrock status resolvers. Each edition has its own key space.
pub struct MinecraftClient {
    java: EntityResolver<ServerSource>,
    bedrock: EntityResolver<ServerSource>,
}

impl MinecraftClient {
    pub fn new(
        base_url: impl Into<String>,
        timeout: Duration,
        policy: CachePolicy,
    ) -> Result<Self, FetchError> {
        let client = build_client(timeout)?;
        let base_url = base_url.into();

        Ok(Self {
            java: EntityResolver::new(
                ServerSource::new(client.clone(), base_url.clone(), Edition::Java),
                policy,
            ),
            bedrock: EntityResolver::new(
                ServerSource::new(client, base_url, Edition::Bedrock),
                policy,
            ),
        })
    }

    #[instrument(skip(self))]
    pub async fn server(&self, host: &str, edition: Edition) -> Result<MinecraftServer, FetchError> {
        self.resolver(edition).resolve(host).await
    }

    pub fn resolver(&self, edition: Edition) -> &EntityResolver<ServerSource> {
        match edition {
            Edition::Java => &self.java,
            Edition::Bedrock => &self.bedrock,
        }
    }

    pub fn register_sweeps(&self, sweeper: &mut CacheSweeper) {
        self.java.register_sweeps(sweeper);
        self.bedrock.register_sweeps(sweeper);
    }
}
