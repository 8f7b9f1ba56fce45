//! Common test utilities for integration tests.

#![allow(dead_code)]

use api_clients::{
    CachePolicy, DictionaryClient, MinecraftClient, SearchClient, SteamClient, TriviaClient,
    WynncraftClient, XkcdClient,
};
use axum::{body::Body, http::Request};
use command_bot::api::AppState;
use command_bot::commands::*;
use discord_client::{CommandArgs, DiscordClient, Interaction, SignatureVerifier};
use ed25519_dalek::{Signer, SigningKey};
use interactive::ComponentRegistry;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use wiremock::MockServer;

pub const APPLICATION_ID: &str = "42";
pub const TIMESTAMP: &str = "1700000000";

pub fn signing_key() -> SigningKey {
    SigningKey::from_bytes(&[7u8; 32])
}

fn policy() -> CachePolicy {
    CachePolicy::new(Duration::from_secs(3600))
}

/// Every upstream and the Discord API on one base URL.
pub struct TestBot {
    pub steam: Arc<SteamClient>,
    pub minecraft: Arc<MinecraftClient>,
    pub search: Arc<SearchClient>,
    pub wynncraft: Arc<WynncraftClient>,
    pub dictionary: Arc<DictionaryClient>,
    pub xkcd: Arc<XkcdClient>,
    pub trivia: Arc<TriviaClient>,
    pub discord: Arc<DiscordClient>,
    pub components: Arc<ComponentRegistry>,
    base_url: String,
}

impl TestBot {
    pub fn new(base_url: &str) -> Self {
        let timeout = Duration::from_secs(5);
        Self {
            steam: Arc::new(SteamClient::new(base_url, base_url, timeout, policy()).unwrap()),
            minecraft: Arc::new(MinecraftClient::new(base_url, timeout, policy()).unwrap()),
            search: Arc::new(SearchClient::new(base_url, base_url, timeout, policy()).unwrap()),
            wynncraft: Arc::new(WynncraftClient::new(base_url, timeout, policy()).unwrap()),
            dictionary: Arc::new(DictionaryClient::new(base_url, timeout).unwrap()),
            xkcd: Arc::new(XkcdClient::new(base_url, timeout).unwrap()),
            trivia: Arc::new(TriviaClient::new(base_url, timeout).unwrap()),
            discord: Arc::new(DiscordClient::new(base_url, APPLICATION_ID, None).unwrap()),
            components: Arc::new(ComponentRegistry::new(Duration::from_secs(900))),
            base_url: base_url.to_string(),
        }
    }

    pub fn for_mock(server: &MockServer) -> Self {
        Self::new(&server.uri())
    }

    pub fn handlers(&self) -> Vec<Arc<dyn CommandHandler>> {
        let mut handlers: Vec<Arc<dyn CommandHandler>> = vec![
            Arc::new(SteamHandler::new(self.steam.clone())),
            Arc::new(MinecraftHandler::new(self.minecraft.clone(), &self.base_url)),
            Arc::new(SearchHandler::new(self.search.clone())),
            Arc::new(WynncraftHandler::new(self.wynncraft.clone())),
            Arc::new(DictionaryHandler::new(self.dictionary.clone())),
            Arc::new(XkcdHandler::new(self.xkcd.clone())),
            Arc::new(TriviaHandler::new(self.trivia.clone())),
        ];
        let help = HelpHandler::new(&handlers);
        handlers.push(Arc::new(help));
        handlers
    }

    pub fn state(&self) -> AppState {
        let verifier = SignatureVerifier::from_key(signing_key().verifying_key());
        AppState::new(
            verifier,
            (*self.discord).clone(),
            self.components.clone(),
            self.handlers(),
        )
    }

    pub fn context(&self, interaction_id: &str, user_id: &str) -> CommandContext {
        CommandContext {
            interaction_id: interaction_id.to_string(),
            user_id: user_id.to_string(),
            components: self.components.clone(),
        }
    }
}

fn user(user_id: &str) -> Value {
    json!({ "user": { "id": user_id, "username": format!("user-{}", user_id) } })
}

/// A guild slash command. `options` are the top-level command options.
pub fn command_interaction(id: &str, user_id: &str, name: &str, options: Value) -> Value {
    json!({
        "id": id,
        "application_id": APPLICATION_ID,
        "type": 2,
        "token": format!("token-{}", id),
        "guild_id": "9",
        "member": user(user_id),
        "data": { "id": "100", "name": name, "options": options }
    })
}

/// A `/{name} {subcommand}` invocation with string, integer or boolean options.
pub fn subcommand_interaction(
    id: &str,
    user_id: &str,
    name: &str,
    subcommand: &str,
    values: &[(&str, Value)],
) -> Value {
    let options: Vec<Value> = values
        .iter()
        .map(|(name, value)| {
            let kind = match value {
                Value::Bool(_) => 5,
                Value::Number(_) => 4,
                _ => 3,
            };
            json!({ "name": name, "type": kind, "value": value })
        })
        .collect();
    command_interaction(
        id,
        user_id,
        name,
        json!([{ "name": subcommand, "type": 1, "options": options }]),
    )
}

/// A select menu pick of `values` on `custom_id`.
pub fn select_interaction(id: &str, user_id: &str, custom_id: &str, values: &[&str]) -> Value {
    let mut interaction = component_interaction(id, user_id, custom_id);
    interaction["data"] = json!({
        "custom_id": custom_id,
        "component_type": 3,
        "values": values,
    });
    interaction
}

pub fn component_interaction(id: &str, user_id: &str, custom_id: &str) -> Value {
    json!({
        "id": id,
        "application_id": APPLICATION_ID,
        "type": 3,
        "token": format!("token-{}", id),
        "guild_id": "9",
        "member": user(user_id),
        "data": { "custom_id": custom_id, "component_type": 2 }
    })
}

pub fn args_of(interaction: &Value) -> CommandArgs {
    let interaction: Interaction = serde_json::from_value(interaction.clone()).unwrap();
    interaction.command_args().unwrap()
}

/// A webhook request signed like Discord signs it.
pub fn signed_request(body: &Value) -> Request<Body> {
    let body = serde_json::to_vec(body).unwrap();
    let mut message = TIMESTAMP.as_bytes().to_vec();
    message.extend_from_slice(&body);
    let signature = hex::encode(signing_key().sign(&message).to_bytes());

    Request::builder()
        .method("POST")
        .uri("/interactions")
        .header("content-type", "application/json")
        .header("X-Signature-Ed25519", signature)
        .header("X-Signature-Timestamp", TIMESTAMP)
        .body(Body::from(body))
        .unwrap()
}

pub async fn body_json(response: axum::response::Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

/// JSON bodies the mock server received for `method` on `path`, oldest first.
pub async fn received_json(server: &MockServer, method: &str, path: &str) -> Vec<Value> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .into_iter()
        .filter(|request| request.method.to_string() == method && request.url.path() == path)
        .map(|request| serde_json::from_slice(&request.body).unwrap())
        .collect()
}

pub fn original_path(token: &str) -> String {
    format!("/webhooks/{}/{}/messages/@original", APPLICATION_ID, token)
}

pub fn followup_path(token: &str) -> String {
    format!("/webhooks/{}/{}", APPLICATION_ID, token)
}

/// Every button in a message payload.
pub fn buttons(payload: &Value) -> Vec<Value> {
    payload["components"]
        .as_array()
        .into_iter()
        .flatten()
        .flat_map(|row| row["components"].as_array().cloned().unwrap_or_default())
        .collect()
}

pub fn button_labelled<'a>(buttons: &'a [Value], label: &str) -> Option<&'a Value> {
    buttons.iter().find(|button| button["label"] == label)
}
