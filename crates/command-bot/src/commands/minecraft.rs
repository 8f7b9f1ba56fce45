//! Minecraft server status.

use super::{format_list, unknown_subcommand, CommandContext, CommandHandler};
use crate::error::{AppError, AppResult};
use api_clients::{Edition, MinecraftClient, MinecraftServer};
use async_trait::async_trait;
use discord_client::CommandArgs;
use interactive::{Field, Reply, View};
use std::sync::Arc;

const ONLINE_COLOR: u32 = 0x2ecc71;
const OFFLINE_COLOR: u32 = 0xe74c3c;
const LIST_LIMIT: usize = 10;

pub struct MinecraftHandler {
    minecraft: Arc<MinecraftClient>,
    icon_base: String,
}

impl MinecraftHandler {
    pub fn new(minecraft: Arc<MinecraftClient>, icon_base: impl Into<String>) -> Self {
        Self {
            minecraft,
            icon_base: icon_base.into(),
        }
    }

    fn server_view(&self, server: &MinecraftServer) -> View {
        let address = server.public_address();
        let mut view = View::titled(address);
        view.thumbnail = Some(format!("{}/icon/{}", self.icon_base, address));

        if !server.online {
            view.color = Some(OFFLINE_COLOR);
            view.description = Some("**Status:** Offline".into());
            return view;
        }

        view.color = Some(ONLINE_COLOR);
        let mut lines = vec!["**Status:** Online".to_string()];
        if let Some(players) = &server.players {
            lines.push(format!(
                "**Players:** {}/{} online",
                players.online, players.max
            ));
        }
        if let Some(version) = &server.version {
            lines.push(format!("**Version:** {}", version));
        }
        if let Some(software) = &server.software {
            lines.push(format!("**Software:** {}", software));
        }
        if let Some(map) = &server.map {
            lines.push(format!("**Map:** {}", map));
        }
        view.description = Some(lines.join("\n"));

        if let Some(plugins) = server.plugins.as_ref().filter(|p| !p.raw.is_empty()) {
            view.fields
                .push(Field::inline("Plugins", format_list(&plugins.raw, LIST_LIMIT)));
        }
        if let Some(mods) = server.mods.as_ref().filter(|m| !m.raw.is_empty()) {
            view.fields
                .push(Field::inline("Mods", format_list(&mods.raw, LIST_LIMIT)));
        }
        view.fields.push(Field::new(
            "Server MOTD",
            format!("```\n{}\n```", server.motd_text()),
        ));
        view
    }
}

#[async_trait]
impl CommandHandler for MinecraftHandler {
    fn name(&self) -> &str {
        "minecraft"
    }

    fn usage(&self) -> &str {
        "`/minecraft server <ip> [bedrock]` - Check the status of a Minecraft server"
    }

    async fn execute(&self, _ctx: &CommandContext, args: &CommandArgs) -> AppResult<Reply> {
        if args.subcommand() != Some("server") {
            return Ok(unknown_subcommand());
        }
        let host = args
            .str("ip")
            .ok_or_else(|| AppError::BadRequest("A server address is required!".into()))?;
        let edition = if args.bool("bedrock").unwrap_or(false) {
            Edition::Bedrock
        } else {
            Edition::Java
        };

        let server = self.minecraft.server(host, edition).await?;
        Ok(Reply::view(self.server_view(&server)))
    }
}
