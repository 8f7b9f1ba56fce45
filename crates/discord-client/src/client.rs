//! Discord webhook client for finishing deferred interactions.

use crate::error::DiscordError;
use crate::types::MessagePayload;
use reqwest::{Client, RequestBuilder, Response};
use secrecy::{ExposeSecret, SecretString};
use std::time::Duration;
use tracing::{debug, instrument, warn};

pub const DEFAULT_API_BASE: &str = "https://discord.com/api/v10";

/// Client for the interaction webhook endpoints.
#[derive(Clone)]
pub struct DiscordClient {
    client: Client,
    api_base: String,
    application_id: String,
    bot_token: Option<SecretString>,
}

impl DiscordClient {
    pub fn new(
        api_base: impl Into<String>,
        application_id: impl Into<String>,
        bot_token: Option<SecretString>,
    ) -> Result<Self, DiscordError> {
        let client = Client::builder().timeout(Duration::from_secs(10)).build()?;

        Ok(Self {
            client,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            application_id: application_id.into(),
            bot_token,
        })
    }

    pub fn application_id(&self) -> &str {
        &self.application_id
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.bot_token {
            Some(token) => request.header("Authorization", format!("Bot {}", token.expose_secret())),
            None => request,
        }
    }

    async fn handle_response(response: Response) -> Result<Response, DiscordError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = response.text().await.unwrap_or_default();
        warn!(status = status.as_u16(), "Discord API error: {}", message);
        Err(DiscordError::Api {
            status: status.as_u16(),
            message,
        })
    }

    /// Replace the original response of an interaction.
    #[instrument(skip(self, interaction_token, payload))]
    pub async fn edit_original(
        &self,
        interaction_token: &str,
        payload: &MessagePayload,
    ) -> Result<(), DiscordError> {
        let url = format!(
            "{}/webhooks/{}/{}/messages/@original",
            self.api_base, self.application_id, interaction_token
        );
        let response = self
            .authorize(self.client.patch(url))
            .json(payload)
            .send()
            .await?;
        Self::handle_response(response).await?;

        debug!("Edited original interaction response");
        Ok(())
    }

    /// Send an extra message for an interaction.
    #[instrument(skip(self, interaction_token, payload))]
    pub async fn create_followup(
        &self,
        interaction_token: &str,
        payload: &MessagePayload,
    ) -> Result<(), DiscordError> {
        let url = format!(
            "{}/webhooks/{}/{}",
            self.api_base, self.application_id, interaction_token
        );
        let response = self
            .authorize(self.client.post(url))
            .json(payload)
            .send()
            .await?;
        Self::handle_response(response).await?;

        debug!(ephemeral = payload.is_ephemeral(), "Sent follow-up message");
        Ok(())
    }
}
