//! Wynncraft player statistics.
//!
//! Players are cached under their UUID; usernames are aliases, so a lookup by
//! either form hits the same record.

use crate::error::FetchError;
use crate::http::{build_client, check_status};
use crate::resolver::{CachePolicy, EntityResolver, EntitySource, Resolved};
use api_cache::CacheSweeper;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::instrument;
use urlencoding::encode;

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PvpStats {
    #[serde(default)]
    pub kills: u64,
    #[serde(default)]
    pub deaths: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Completions {
    #[serde(default)]
    pub completed: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct Gamemode {
    #[serde(default)]
    pub craftsman: bool,
    #[serde(default)]
    pub hardcore: bool,
    #[serde(default)]
    pub ironman: bool,
}

impl Gamemode {
    /// Names of the enabled challenge modes, in display order.
    pub fn names(&self) -> Vec<&'static str> {
        [
            (self.craftsman, "Craftsman"),
            (self.hardcore, "Hardcore"),
            (self.ironman, "Ironman"),
        ]
        .into_iter()
        .filter_map(|(on, name)| on.then_some(name))
        .collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Skills {
    #[serde(default)]
    pub strength: i64,
    #[serde(default)]
    pub dexterity: i64,
    #[serde(default)]
    pub intelligence: i64,
    #[serde(default)]
    pub defense: i64,
    #[serde(default)]
    pub agility: i64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Profession {
    #[serde(default)]
    pub level: u32,
    /// Progress towards the next level, in percent.
    #[serde(default)]
    pub xp: f64,
}

/// One character of a player.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WynnClass {
    /// Internal name, e.g. `darkwizard` or `archer2`.
    pub name: String,
    #[serde(default)]
    pub level: u32,
    #[serde(default)]
    pub gamemode: Gamemode,
    /// Minutes, in the API's own unit.
    #[serde(default)]
    pub playtime: f64,
    #[serde(default)]
    pub chests_found: u64,
    #[serde(default)]
    pub blocks_walked: u64,
    #[serde(default)]
    pub items_identified: u64,
    #[serde(default)]
    pub mobs_killed: u64,
    #[serde(default)]
    pub discoveries: u64,
    #[serde(default)]
    pub events_won: u64,
    #[serde(default)]
    pub logins: u64,
    #[serde(default)]
    pub deaths: u64,
    #[serde(default)]
    pub pvp: PvpStats,
    #[serde(default)]
    pub dungeons: Completions,
    #[serde(default)]
    pub quests: Completions,
    #[serde(default)]
    pub skills: Skills,
    #[serde(default)]
    pub professions: BTreeMap<String, Profession>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TotalLevel {
    #[serde(default)]
    pub combined: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalStats {
    #[serde(default)]
    pub chests_found: u64,
    #[serde(default)]
    pub blocks_walked: u64,
    #[serde(default)]
    pub items_identified: u64,
    #[serde(default)]
    pub mobs_killed: u64,
    #[serde(default)]
    pub discoveries: u64,
    #[serde(default)]
    pub events_won: u64,
    #[serde(default)]
    pub logins: u64,
    #[serde(default)]
    pub deaths: u64,
    #[serde(default)]
    pub pvp: PvpStats,
    #[serde(default)]
    pub total_level: TotalLevel,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Location {
    #[serde(default)]
    pub online: bool,
    #[serde(default)]
    pub server: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Tag {
    #[serde(default)]
    pub value: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerMeta {
    pub first_join: DateTime<Utc>,
    pub last_join: DateTime<Utc>,
    #[serde(default)]
    pub location: Location,
    #[serde(default)]
    pub playtime: f64,
    #[serde(default)]
    pub tag: Tag,
    #[serde(default)]
    pub veteran: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct GuildMembership {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub rank: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WynnPlayer {
    pub username: String,
    pub uuid: String,
    pub meta: PlayerMeta,
    #[serde(default)]
    pub classes: Vec<WynnClass>,
    #[serde(default)]
    pub guild: GuildMembership,
    #[serde(default)]
    pub global: GlobalStats,
}

impl WynnPlayer {
    pub fn stats_url(&self) -> String {
        format!("https://wynncraft.com/stats/player/{}", self.username)
    }

    /// The rank tag, when the player has one.
    pub fn tag(&self) -> Option<&str> {
        self.meta.tag.value.as_deref().filter(|tag| !tag.is_empty())
    }
}

#[derive(Debug, Deserialize)]
struct StatsResponse {
    #[serde(default)]
    data: Vec<WynnPlayer>,
}

/// Player lookups by username or UUID.
pub struct PlayerSource {
    client: Client,
    base_url: String,
}

impl PlayerSource {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl EntitySource for PlayerSource {
    type Record = WynnPlayer;

    fn domain(&self) -> &'static str {
        "wynncraft-players"
    }

    /// Minecraft usernames are case-insensitive.
    fn normalize(&self, lookup: &str) -> String {
        lookup.trim().to_lowercase()
    }

    async fn fetch(&self, key: &str) -> Result<Resolved<WynnPlayer>, FetchError> {
        let response = self
            .client
            .get(format!("{}/v2/player/{}/stats", self.base_url, encode(key)))
            .send()
            .await?;
        let body: StatsResponse = check_status(response, "user").await?.json().await?;
        let player = body
            .data
            .into_iter()
            .next()
            .ok_or(FetchError::NotFound { what: "user" })?;

        Ok(Resolved::new(player.uuid.to_lowercase(), player.clone()).with_alias(player.username))
    }
}

pub struct WynncraftClient {
    players: EntityResolver<PlayerSource>,
}

impl WynncraftClient {
    pub fn new(
        base_url: impl Into<String>,
        timeout: Duration,
        policy: CachePolicy,
    ) -> Result<Self, FetchError> {
        let client = build_client(timeout)?;
        Ok(Self {
            players: EntityResolver::new(PlayerSource::new(client, base_url), policy),
        })
    }

    #[instrument(skip(self))]
    pub async fn player(&self, name: &str) -> Result<WynnPlayer, FetchError> {
        self.players.resolve(name).await
    }

    pub fn players(&self) -> &EntityResolver<PlayerSource> {
        &self.players
    }

    pub fn register_sweeps(&self, sweeper: &mut CacheSweeper) {
        self.players.register_sweeps(sweeper);
    }
}
