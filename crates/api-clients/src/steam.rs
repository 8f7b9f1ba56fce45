//! Steam community profiles and name history.

use crate::error::FetchError;
use crate::http::{build_client, check_status};
use crate::resolver::{CachePolicy, EntityResolver, EntitySource, Resolved};
use api_cache::{AliasIndex, CacheSweeper};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::instrument;
use urlencoding::encode;

const PROFILE_NOT_FOUND_MARKER: &str = "The specified profile could not be found.";

/// Number as formatted by the profile API.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct IntegerFormat {
    pub estimate: String,
    pub formatted: String,
    pub value: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BanCount {
    None,
    One,
    Multiple,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SteamBans {
    pub community: bool,
    pub days_since_last: Option<IntegerFormat>,
    pub game: BanCount,
    pub trade: bool,
    pub vac: BanCount,
}

impl SteamBans {
    pub fn any(&self) -> bool {
        self.vac != BanCount::None || self.game != BanCount::None || self.community || self.trade
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SteamIds {
    #[serde(rename = "2")]
    pub id2: String,
    #[serde(rename = "3")]
    pub id3: String,
    #[serde(rename = "32")]
    pub id32: u64,
    #[serde(rename = "64")]
    pub id64: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StatusState {
    Offline,
    Online,
    InGame,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SteamStatus {
    pub state: StatusState,
    pub game: Option<String>,
    pub server_ip: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SteamBadge {
    pub image: String,
    pub meta: String,
    pub name: String,
    pub url: String,
    pub xp: IntegerFormat,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PrimaryGroup {
    pub member_count: IntegerFormat,
    pub name: String,
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RecentGame {
    pub name: String,
    pub url: String,
    pub hours: IntegerFormat,
    pub last_played: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RecentActivity {
    pub games: Vec<RecentGame>,
    pub playtime: IntegerFormat,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SteamSummary {
    pub raw: String,
    pub text: String,
}

/// A Steam profile. Private profiles only carry the identity and ban fields.
#[derive(Debug, Clone, Deserialize)]
pub struct SteamProfile {
    pub username: String,
    pub avatar: String,
    pub private: bool,
    pub bans: SteamBans,
    pub steamid: SteamIds,
    #[serde(default)]
    pub custom_url: Option<String>,

    #[serde(default)]
    pub background_url: Option<String>,
    #[serde(default)]
    pub animated_background_url: Option<String>,
    #[serde(default)]
    pub badge: Option<SteamBadge>,
    #[serde(default)]
    pub counts: BTreeMap<String, Option<IntegerFormat>>,
    /// Account creation time in milliseconds since the epoch.
    #[serde(default)]
    pub created: Option<i64>,
    #[serde(default)]
    pub flag: Option<String>,
    #[serde(default)]
    pub level: Option<IntegerFormat>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub primary_group: Option<PrimaryGroup>,
    #[serde(default)]
    pub real_name: Option<String>,
    #[serde(default)]
    pub recent_activity: Option<RecentActivity>,
    #[serde(default)]
    pub status: Option<SteamStatus>,
    #[serde(default)]
    pub summary: Option<SteamSummary>,
}

impl SteamProfile {
    /// Public community URL, preferring the custom URL.
    pub fn profile_url(&self) -> String {
        match &self.custom_url {
            Some(custom) => format!("https://steamcommunity.com/id/{}", custom),
            None => format!("https://steamcommunity.com/profiles/{}", self.steamid.id64),
        }
    }

    /// Plain-text summary, if the profile has a non-empty one.
    pub fn summary_text(&self) -> Option<&str> {
        self.summary
            .as_ref()
            .map(|s| s.text.trim())
            .filter(|text| !text.is_empty())
    }
}

/// One entry in a profile's name history.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NameChange {
    pub newname: String,
    pub timechanged: String,
}

/// Profile lookups by SteamID64 or custom URL.
pub struct ProfileSource {
    client: Client,
    base_url: String,
}

impl ProfileSource {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl EntitySource for ProfileSource {
    type Record = SteamProfile;

    fn domain(&self) -> &'static str {
        "steam-profiles"
    }

    /// Custom URLs are case-insensitive.
    fn normalize(&self, lookup: &str) -> String {
        lookup.trim().to_lowercase()
    }

    async fn fetch(&self, key: &str) -> Result<Resolved<SteamProfile>, FetchError> {
        let response = self
            .client
            .get(format!("{}/v2/steam/user-profile/{}", self.base_url, encode(key)))
            .send()
            .await?;
        let profile: SteamProfile = check_status(response, "profile").await?.json().await?;

        let mut resolved = Resolved::new(profile.steamid.id64.clone(), profile.clone());
        if let Some(custom) = &profile.custom_url {
            resolved = resolved.with_alias(custom.clone());
        }
        Ok(resolved)
    }
}

/// Name history lookups keyed by SteamID64.
pub struct NameHistorySource {
    client: Client,
    community_url: String,
}

impl NameHistorySource {
    pub fn new(client: Client, community_url: impl Into<String>) -> Self {
        Self {
            client,
            community_url: community_url.into(),
        }
    }
}

#[async_trait]
impl EntitySource for NameHistorySource {
    type Record = Vec<NameChange>;

    fn domain(&self) -> &'static str {
        "steam-name-history"
    }

    fn normalize(&self, lookup: &str) -> String {
        lookup.trim().to_lowercase()
    }

    async fn fetch(&self, key: &str) -> Result<Resolved<Vec<NameChange>>, FetchError> {
        let response = self
            .client
            .get(format!("{}/profiles/{}/ajaxaliases/", self.community_url, encode(key)))
            .send()
            .await?;
        let body = check_status(response, "profile").await?.text().await?;

        if body.contains(PROFILE_NOT_FOUND_MARKER) {
            return Err(FetchError::NotFound { what: "profile" });
        }
        let names: Vec<NameChange> = serde_json::from_str(&body)?;
        Ok(Resolved::new(key, names))
    }
}

/// Steam profile and name-history resolvers over one shared custom-URL index.
pub struct SteamClient {
    profiles: EntityResolver<ProfileSource>,
    name_history: EntityResolver<NameHistorySource>,
}

impl SteamClient {
    pub fn new(
        api_url: impl Into<String>,
        community_url: impl Into<String>,
        timeout: Duration,
        policy: CachePolicy,
    ) -> Result<Self, FetchError> {
        let client = build_client(timeout)?;
        let custom_urls = Arc::new(AliasIndex::new("steam-custom-urls"));

        Ok(Self {
            profiles: EntityResolver::with_aliases(
                ProfileSource::new(client.clone(), api_url),
                custom_urls.clone(),
                policy,
            ),
            name_history: EntityResolver::with_aliases(
                NameHistorySource::new(client, community_url),
                custom_urls,
                policy,
            ),
        })
    }

    /// Look up a profile by SteamID64 or custom URL.
    #[instrument(skip(self))]
    pub async fn profile(&self, query: &str) -> Result<SteamProfile, FetchError> {
        self.profiles.resolve(query).await
    }

    /// Previous display names, newest first.
    #[instrument(skip(self))]
    pub async fn name_history(&self, id: &str) -> Result<Vec<NameChange>, FetchError> {
        self.name_history.resolve(id).await
    }

    pub fn profiles(&self) -> &EntityResolver<ProfileSource> {
        &self.profiles
    }

    pub fn register_sweeps(&self, sweeper: &mut CacheSweeper) {
        self.profiles.register_sweeps(sweeper);
        self.name_history.register_cache_sweep(sweeper);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use api_cache::Sweep;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn public_profile() -> serde_json::Value {
        serde_json::json!({
            "ok": true,
            "private": false,
            "username": "Gaben",
            "avatar": "https://avatars.example/gaben.jpg",
            "bans": {
                "community": false,
                "days_since_last": null,
                "game": "none",
                "trade": false,
                "vac": "none"
            },
            "steamid": {
                "2": "STEAM_0:0:19869136",
                "3": "[U:1:39738272]",
                "32": 39738272,
                "64": "76561198000000000"
            },
            "custom_url": "MyName",
            "background_url": null,
            "badge": null,
            "counts": { "games": { "estimate": "1K", "formatted": "1,024", "value": 1024 } },
            "created": 1063497600000i64,
            "flag": "us",
            "level": { "estimate": "10", "formatted": "10", "value": 10 },
            "primary_group": null,
            "real_name": "Gabe",
            "recent_activity": null,
            "status": { "state": "in-game", "game": "Dota 2" },
            "summary": { "raw": "<b>Hi</b>", "text": "Hi" }
        })
    }

    async fn client(server: &MockServer) -> SteamClient {
        SteamClient::new(
            server.uri(),
            server.uri(),
            Duration::from_secs(5),
            CachePolicy::new(Duration::from_secs(3600)),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_profile_resolves_custom_url_alias() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v2/steam/user-profile/myname"))
            .respond_with(ResponseTemplate::new(200).set_body_json(public_profile()))
            .expect(1)
            .mount(&server)
            .await;

        let steam = client(&server).await;
        let profile = steam.profile("MyName").await.unwrap();
        assert_eq!(profile.steamid.id64, "76561198000000000");
        assert_eq!(profile.status.as_ref().unwrap().state, StatusState::InGame);
        assert_eq!(profile.summary_text(), Some("Hi"));
        assert_eq!(profile.profile_url(), "https://steamcommunity.com/id/MyName");

        // Any casing of the custom URL, and the numeric id, hit the cache.
        steam.profile("MYNAME").await.unwrap();
        steam.profile("76561198000000000").await.unwrap();
        assert_eq!(steam.profiles().canonical_key("myName"), "76561198000000000");
    }

    #[tokio::test]
    async fn test_private_profile_parses() {
        let server = MockServer::start().await;
        let body = serde_json::json!({
            "ok": true,
            "private": true,
            "username": "Hidden",
            "avatar": "https://avatars.example/hidden.jpg",
            "bans": {
                "community": false,
                "days_since_last": { "estimate": "12", "formatted": "12", "value": 12 },
                "game": "none",
                "trade": false,
                "vac": "one"
            },
            "steamid": { "2": "a", "3": "b", "32": 1, "64": "76561197960265729" },
            "custom_url": null
        });

        Mock::given(method("GET"))
            .and(path("/v2/steam/user-profile/76561197960265729"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&server)
            .await;

        let steam = client(&server).await;
        let profile = steam.profile("76561197960265729").await.unwrap();
        assert!(profile.private);
        assert!(profile.bans.any());
        assert!(profile.level.is_none());
        assert_eq!(
            profile.profile_url(),
            "https://steamcommunity.com/profiles/76561197960265729"
        );
    }

    #[tokio::test]
    async fn test_profile_error_message_passthrough() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v2/steam/user-profile/nobody"))
            .respond_with(
                ResponseTemplate::new(400)
                    .set_body_json(serde_json::json!({ "error": "Invalid ID or URL", "ok": false })),
            )
            .mount(&server)
            .await;

        let steam = client(&server).await;
        let err = steam.profile("nobody").await.unwrap_err();
        assert_eq!(err, FetchError::Upstream("Invalid ID or URL".into()));
        assert_eq!(err.user_message(), "Invalid ID or URL");
        assert!(steam.profiles().cache().is_empty());
    }

    #[tokio::test]
    async fn test_profile_bare_status_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(502))
            .mount(&server)
            .await;

        let steam = client(&server).await;
        let err = steam.profile("someone").await.unwrap_err();
        assert_eq!(err.user_message(), "The service gave us a 502! Try again later!");
    }

    #[tokio::test]
    async fn test_name_history() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/profiles/76561198000000000/ajaxaliases/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                { "newname": "Gaben", "timechanged": "1 Jan, 2020 @ 1:00am" },
                { "newname": "gabe", "timechanged": "1 Jan, 2019 @ 1:00am" }
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let steam = client(&server).await;
        let names = steam.name_history("76561198000000000").await.unwrap();
        assert_eq!(names.len(), 2);
        assert_eq!(names[0].newname, "Gaben");

        steam.name_history("76561198000000000").await.unwrap();
    }

    #[tokio::test]
    async fn test_name_history_not_found_marker() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/profiles/1/ajaxaliases/"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("<html>The specified profile could not be found.</html>"),
            )
            .mount(&server)
            .await;

        let steam = client(&server).await;
        let err = steam.name_history("1").await.unwrap_err();
        assert_eq!(err, FetchError::NotFound { what: "profile" });
    }

    #[tokio::test]
    async fn test_register_sweeps_shares_alias_index() {
        let server = MockServer::start().await;
        let steam = client(&server).await;

        let mut sweeper = CacheSweeper::new();
        steam.register_sweeps(&mut sweeper);
        assert_eq!(sweeper.target_count(), 3);
    }
}
