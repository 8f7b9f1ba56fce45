//! Steam profile lookup with an interactive profile card.

use super::{format_list, unknown_subcommand, CommandContext, CommandHandler};
use crate::error::{AppError, AppResult};
use api_clients::steam::{BanCount, StatusState};
use api_clients::{FetchError, NameChange, SteamClient, SteamProfile};
use async_trait::async_trait;
use discord_client::CommandArgs;
use interactive::{
    cutoff_text, split_message, ControlDescriptor, Field, LazyLoader, LoadError, PartialView,
    Reply, Session, SessionController, SplitOptions, ToggleControl, View,
};
use std::sync::Arc;
use tracing::debug;

const ONLINE_COLOR: u32 = 0x57cbde;
const IN_GAME_COLOR: u32 = 0x90ba3c;
const ALIAS_LIMIT: usize = 10;
const FIELD_LIMIT: usize = 1024;

pub const BACKGROUND_PAGE: &str = "background";
pub const SUMMARY_PAGE: &str = "summary";
pub const ALIASES_PAGE: &str = "aliases";

fn ban_text(count: BanCount) -> &'static str {
    match count {
        BanCount::None => "none",
        BanCount::One => "one",
        BanCount::Multiple => "multiple",
    }
}

fn status_text(state: StatusState) -> &'static str {
    match state {
        StatusState::Offline => "offline",
        StatusState::Online => "online",
        StatusState::InGame => "in-game",
    }
}

fn steam_id_field(profile: &SteamProfile) -> Field {
    let ids = &profile.steamid;
    let mut lines = vec![
        format!("**SteamID2:** `{}`", ids.id2),
        format!("**SteamID3:** `{}`", ids.id3),
        format!("**Account ID (SteamID32):** `{}`", ids.id32),
        format!("**SteamID64:** `{}`", ids.id64),
    ];
    if let Some(custom) = &profile.custom_url {
        lines.push(format!("**Custom URL:** {}", custom));
    }
    Field::inline("Steam ID", lines.join("\n"))
}

fn standing_field(profile: &SteamProfile) -> Option<Field> {
    let bans = &profile.bans;
    if !bans.any() {
        return None;
    }
    let mut lines = Vec::new();
    if bans.vac != BanCount::None {
        lines.push(format!("⚠️ VAC bans: {}", ban_text(bans.vac)));
    }
    if bans.game != BanCount::None {
        lines.push(format!("⚠️ Game bans: {}", ban_text(bans.game)));
    }
    if bans.community {
        lines.push("⛔ Community banned".to_string());
    }
    if bans.trade {
        lines.push("🚫 Trade banned".to_string());
    }
    if let Some(days) = &bans.days_since_last {
        lines.push(format!("\n{} days since last ban", days.formatted));
    }
    Some(Field::inline("Account Standing", lines.join("\n")))
}

fn open_profile(profile: &SteamProfile) -> ControlDescriptor {
    ControlDescriptor::link("Open Profile", profile.profile_url())
}

fn private_reply(profile: &SteamProfile) -> Reply {
    let mut view = View::titled(&profile.username);
    view.thumbnail = Some(profile.avatar.clone());
    view.description = Some("*This profile is private.*".into());
    view.fields.push(steam_id_field(profile));
    view.fields.extend(standing_field(profile));
    Reply::view(view).with_row(vec![open_profile(profile)])
}

fn main_page(profile: &SteamProfile) -> PartialView {
    let mut lines = Vec::new();
    if let Some(status) = &profile.status {
        let game = status
            .game
            .as_ref()
            .map(|game| format!(" `{}`", game))
            .unwrap_or_default();
        lines.push(format!("Status: **{}{}**", status_text(status.state), game));
        lines.push(String::new());
    }
    let flag = profile
        .flag
        .as_ref()
        .map(|flag| format!(":flag_{}:    ", flag))
        .unwrap_or_default();
    match &profile.level {
        Some(level) => lines.push(format!("{}**Level `{}`**", flag, level.formatted)),
        None if !flag.is_empty() => lines.push(flag),
        None => {}
    }
    if let Some(created) = profile.created {
        let secs = created / 1000;
        lines.push(format!("Created <t:{}:f> (<t:{}:R>)", secs, secs));
    }

    let mut page = PartialView::described(lines.join("\n")).with_field(steam_id_field(profile));
    if let Some(standing) = standing_field(profile) {
        page = page.with_field(standing);
    }
    if let Some(badge) = &profile.badge {
        page = page.with_field(Field::inline(
            "Badge",
            format!("[{}]({})\n{} XP", badge.name, badge.url, badge.xp.formatted),
        ));
    }
    if let Some(group) = &profile.primary_group {
        page = page.with_field(Field::inline(
            "Primary Group",
            format!(
                "[{}]({})\n{} members",
                group.name, group.url, group.member_count.formatted
            ),
        ));
    }
    page
}

fn summary_pages(text: &str) -> Vec<String> {
    let options = SplitOptions::default();
    split_message(text, &options).unwrap_or_else(|e| {
        debug!("Summary does not split on lines, truncating: {}", e);
        vec![cutoff_text(text, options.max_length)]
    })
}

/// Build the interactive card for a public profile.
pub fn profile_session(invoker: &str, profile: &SteamProfile) -> Session {
    let mut base = View::titled(&profile.username);
    base.url = Some(profile.profile_url());
    base.thumbnail = Some(profile.avatar.clone());
    base.color = match profile.status.as_ref().map(|s| s.state) {
        Some(StatusState::Online) => Some(ONLINE_COLOR),
        Some(StatusState::InGame) => Some(IN_GAME_COLOR),
        _ => None,
    };

    let mut session = Session::new(invoker, base, main_page(profile));

    if let Some(background) = &profile.background_url {
        session = session
            .with_page(
                BACKGROUND_PAGE,
                PartialView {
                    image: Some(background.clone()),
                    ..PartialView::default()
                },
            )
            .with_control(ToggleControl::new(BACKGROUND_PAGE, BACKGROUND_PAGE, "Background"));
    }
    if let Some(summary) = profile.summary_text() {
        session = session
            .with_page(SUMMARY_PAGE, PartialView::default())
            .with_paged_text(SUMMARY_PAGE, summary_pages(summary))
            .with_control(ToggleControl::new(SUMMARY_PAGE, SUMMARY_PAGE, "Summary"));
    }

    session
        .with_lazy_page(ALIASES_PAGE)
        .with_control(ToggleControl::new(ALIASES_PAGE, ALIASES_PAGE, "Aliases"))
        .with_row(vec![open_profile(profile)])
}

fn aliases_page(names: &[NameChange]) -> PartialView {
    let lines: Vec<String> = names
        .iter()
        .map(|change| format!("**{}** - {}", change.newname, change.timechanged))
        .collect();
    PartialView::default().with_field(Field::new(
        "Aliases",
        cutoff_text(&format_list(&lines, ALIAS_LIMIT), FIELD_LIMIT),
    ))
}

/// Loads a profile's name history on first use of the aliases page.
pub struct NameHistoryLoader {
    steam: Arc<SteamClient>,
    steam_id: String,
}

impl NameHistoryLoader {
    pub fn new(steam: Arc<SteamClient>, steam_id: impl Into<String>) -> Self {
        Self {
            steam,
            steam_id: steam_id.into(),
        }
    }
}

#[async_trait]
impl LazyLoader for NameHistoryLoader {
    async fn load(&self) -> Result<PartialView, LoadError> {
        let names = self
            .steam
            .name_history(&self.steam_id)
            .await
            .map_err(|e| match e {
                FetchError::NotFound { .. } => LoadError::Empty,
                other => LoadError::Failed(other.to_string()),
            })?;
        if names.is_empty() {
            return Err(LoadError::Empty);
        }
        Ok(aliases_page(&names))
    }
}

pub struct SteamHandler {
    steam: Arc<SteamClient>,
}

impl SteamHandler {
    pub fn new(steam: Arc<SteamClient>) -> Self {
        Self { steam }
    }
}

#[async_trait]
impl CommandHandler for SteamHandler {
    fn name(&self) -> &str {
        "steam"
    }

    fn usage(&self) -> &str {
        "`/steam user <query>` - Find a Steam user by SteamID64 or custom URL"
    }

    async fn execute(&self, ctx: &CommandContext, args: &CommandArgs) -> AppResult<Reply> {
        if args.subcommand() != Some("user") {
            return Ok(unknown_subcommand());
        }
        let query = args
            .str("query")
            .ok_or_else(|| AppError::BadRequest("A query is required!".into()))?;

        let profile = self.steam.profile(query).await?;
        if profile.private {
            return Ok(private_reply(&profile));
        }

        let loader = NameHistoryLoader::new(self.steam.clone(), &profile.steamid.id64);
        let controller = SessionController::new(profile_session(&ctx.user_id, &profile))
            .with_loader(ALIASES_PAGE, Arc::new(loader));
        let reply = controller.render().await;
        ctx.components
            .register(&ctx.interaction_id, Arc::new(controller));
        Ok(reply)
    }
}
