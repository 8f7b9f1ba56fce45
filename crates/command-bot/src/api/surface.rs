//! Interactive message surface backed by the interaction webhooks.

use crate::render::to_payload;
use async_trait::async_trait;
use discord_client::{DiscordClient, MessagePayload};
use interactive::{RenderError, Reply, Surface};
use std::sync::Arc;

/// The message a component press came from.
///
/// Updates edit that message through the press's own token; notices are
/// ephemeral follow-ups to the presser.
pub struct DiscordSurface {
    discord: Arc<DiscordClient>,
    token: String,
    scope: String,
}

impl DiscordSurface {
    pub fn new(discord: Arc<DiscordClient>, token: impl Into<String>, scope: impl Into<String>) -> Self {
        Self {
            discord,
            token: token.into(),
            scope: scope.into(),
        }
    }
}

#[async_trait]
impl Surface for DiscordSurface {
    async fn update(&self, reply: Reply) -> Result<(), RenderError> {
        let payload = to_payload(&reply.scoped(&self.scope));
        self.discord
            .edit_original(&self.token, &payload)
            .await
            .map_err(|e| RenderError(e.to_string()))
    }

    async fn notice(&self, text: &str) -> Result<(), RenderError> {
        let payload = MessagePayload::text(text).ephemeral();
        self.discord
            .create_followup(&self.token, &payload)
            .await
            .map_err(|e| RenderError(e.to_string()))
    }
}
