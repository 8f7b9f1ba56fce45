//! Wynncraft player statistics with a class picker.

use super::{unknown_subcommand, CommandContext, CommandHandler};
use crate::error::{AppError, AppResult};
use api_clients::{WynnClass, WynnPlayer, WynncraftClient};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use discord_client::CommandArgs;
use interactive::{
    ComponentEvent, ComponentHandler, ControlDescriptor, Field, Outcome, Reply, SelectChoice,
    Surface, View, UNAUTHORIZED_NOTICE,
};
use std::sync::Arc;
use tracing::warn;

pub const CLASS_SELECT: &str = "class";
const OVERVIEW: &str = "overview";
const QUEST_COUNT: u64 = 157;

/// Thousands-separated integer.
fn grouped(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

fn timestamp(at: &DateTime<Utc>) -> String {
    let secs = at.timestamp();
    format!("<t:{}:f> (<t:{}:R>)", secs, secs)
}

/// Hours played. The API counts in units of 4.7 minutes.
fn hours_played(playtime: f64) -> u64 {
    (playtime / 60.0 * 4.7).floor() as u64
}

fn base_class(name: &str) -> &str {
    name.trim_end_matches(|c: char| c.is_ascii_digit())
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Display name of a class, e.g. `archer2` is "Archer".
pub fn class_name(name: &str) -> String {
    if name.starts_with("dark") {
        return "Dark Wizard".into();
    }
    capitalize(base_class(name))
}

/// Picture id for a class. Legacy class names use their modern picture.
fn class_picture(name: &str) -> &str {
    match base_class(name) {
        "darkwizard" => "mage",
        "knight" => "warrior",
        "ninja" => "assassin",
        "hunter" => "archer",
        other => other,
    }
}

fn tag_prefix(player: &WynnPlayer) -> String {
    player
        .tag()
        .map(|tag| format!("`{}` ", tag))
        .unwrap_or_default()
}

/// The player's card, switchable between the overview and each class by the
/// invoking user.
pub struct WynnProfile {
    invoker: String,
    player: WynnPlayer,
}

impl WynnProfile {
    pub fn new(invoker: impl Into<String>, player: WynnPlayer) -> Self {
        Self {
            invoker: invoker.into(),
            player,
        }
    }

    pub fn has_classes(&self) -> bool {
        !self.player.classes.is_empty()
    }

    fn controls(&self, reply: Reply) -> Reply {
        let player = &self.player;
        let reply = reply.with_row(vec![
            ControlDescriptor::link("View on Wynncraft", player.stats_url()),
            ControlDescriptor::link(
                "View on NameMC",
                format!("https://namemc.com/profile/{}", player.username),
            ),
        ]);
        if !self.has_classes() {
            return reply;
        }

        let mut choices = vec![SelectChoice::new("Overview", OVERVIEW)
            .described("Statistics across every class")];
        choices.extend(player.classes.iter().enumerate().map(|(i, class)| {
            SelectChoice::new(
                format!("Lv{} {}", class.level, class_name(&class.name)),
                i.to_string(),
            )
            .described(class.gamemode.names().join(", "))
        }));
        reply.with_row(vec![ControlDescriptor::select(
            CLASS_SELECT,
            format!("View a class... ({})", grouped(player.classes.len() as u64)),
            choices,
        )])
    }

    pub fn overview(&self) -> Reply {
        let player = &self.player;
        let meta = &player.meta;
        let global = &player.global;

        let mut view = View::titled(format!(
            "{}{} Lv{}",
            tag_prefix(player),
            player.username,
            global.total_level.combined
        ));
        view.url = Some(player.stats_url());
        view.thumbnail = Some(format!(
            "https://visage.surgeplay.com/bust/500/{}",
            player.uuid.replace('-', "")
        ));

        let mut lines = vec![match (meta.location.online, meta.location.server.as_deref()) {
            (true, Some(server)) => format!("Online on server {}", server),
            (true, None) => "Online".to_string(),
            (false, _) => "Offline".to_string(),
        }];
        if meta.veteran {
            lines.push("Veteran Player".into());
        }
        lines.push(String::new());
        lines.push(format!("**First Joined:** {}", timestamp(&meta.first_join)));
        lines.push(format!("**Last Online:** {}", timestamp(&meta.last_join)));
        lines.push(format!("**Playtime:** {} hours", hours_played(meta.playtime)));
        view.description = Some(lines.join("\n"));

        let stats = [
            ("Chests Found", global.chests_found),
            ("Blocks Walked", global.blocks_walked),
            ("Items Found", global.items_identified),
            ("Mobs Killed", global.mobs_killed),
            ("Discoveries", global.discoveries),
            ("Events Won", global.events_won),
            ("Logins", global.logins),
            ("Deaths", global.deaths),
            ("PvP Kills", global.pvp.kills),
            ("PvP Deaths", global.pvp.deaths),
        ];
        view.fields.push(Field::inline("Stats", stat_lines(&stats)));

        let guild = match &player.guild.name {
            Some(name) => format!(
                "**[{}](https://wynncraft.com/stats/guild/{})**\nRank: {}",
                name,
                urlencoding::encode(name),
                player.guild.rank.as_deref().unwrap_or("Unknown")
            ),
            None => "*None*".to_string(),
        };
        view.fields.push(Field::new("Guild", guild));

        self.controls(Reply::view(view))
    }

    pub fn class_card(&self, class: &WynnClass) -> Reply {
        let player = &self.player;
        let mut view = View::titled(format!(
            "{}{}'s Lv{} {}",
            tag_prefix(player),
            player.username,
            class.level,
            class_name(&class.name)
        ));
        view.url = Some(player.stats_url());
        view.thumbnail = Some(format!(
            "https://cdn.wynncraft.com/img/stats/classes/{}.png",
            class_picture(&class.name)
        ));

        let mut description = String::new();
        let modes = &class.gamemode;
        for (on, line) in [
            (modes.craftsman, ":hammer: Craftsman Mode\n"),
            (modes.hardcore, ":skull: Hardcore Mode\n"),
            (modes.ironman, ":shield: Ironman Mode\n"),
        ] {
            if on {
                description.push_str(line);
            }
        }
        description.push_str(&format!(
            "\n**Playtime:** {} hours",
            hours_played(class.playtime)
        ));
        view.description = Some(description);

        let stats = [
            ("Chests Found", class.chests_found),
            ("Blocks Walked", class.blocks_walked),
            ("Items Found", class.items_identified),
            ("Mobs Killed", class.mobs_killed),
            ("Discoveries", class.discoveries),
            ("Events Won", class.events_won),
            ("Logins", class.logins),
            ("Deaths", class.deaths),
            ("PvP Kills", class.pvp.kills),
            ("PvP Deaths", class.pvp.deaths),
            ("Dungeons Completed", class.dungeons.completed),
        ];
        let quests = class.quests.completed;
        let mut stat_text = stat_lines(&stats);
        stat_text.push_str(&format!(
            "\n**Quests Completed:** {}/{} ({:.2}%)",
            quests,
            QUEST_COUNT,
            quests as f64 / QUEST_COUNT as f64 * 100.0
        ));
        view.fields.push(Field::inline("Stats", stat_text));

        if !class.professions.is_empty() {
            let professions: Vec<String> = class
                .professions
                .iter()
                .map(|(name, p)| format!("**{}:** {} ({}%)", capitalize(name), p.level, p.xp))
                .collect();
            view.fields
                .push(Field::inline("Professions", professions.join("\n")));
        }

        let skills = &class.skills;
        view.fields.push(Field::inline(
            "Skills",
            [
                format!("**✤ Strength:** {}", skills.strength),
                format!("**✦ Dexterity:** {}", skills.dexterity),
                format!("**❉ Intelligence:** {}", skills.intelligence),
                format!("**✹ Defense:** {}", skills.defense),
                format!("**❋ Agility:** {}", skills.agility),
            ]
            .join("\n"),
        ));

        self.controls(Reply::view(view))
    }
}

fn stat_lines(stats: &[(&str, u64)]) -> String {
    stats
        .iter()
        .map(|(name, value)| format!("**{}:** {}", name, grouped(*value)))
        .collect::<Vec<_>>()
        .join("\n")
}

#[async_trait]
impl ComponentHandler for WynnProfile {
    async fn handle(&self, event: &ComponentEvent, surface: &dyn Surface) -> Outcome {
        if event.actor_id != self.invoker {
            if let Err(e) = surface.notice(UNAUTHORIZED_NOTICE).await {
                warn!("Failed to send notice: {}", e);
            }
            return Outcome::Unauthorized;
        }
        if event.control_id != CLASS_SELECT {
            return Outcome::Acknowledged;
        }

        let reply = match event.values.first().map(String::as_str) {
            Some(OVERVIEW) => self.overview(),
            Some(value) => match value
                .parse::<usize>()
                .ok()
                .and_then(|i| self.player.classes.get(i))
            {
                Some(class) => self.class_card(class),
                None => return Outcome::Acknowledged,
            },
            None => return Outcome::Acknowledged,
        };

        if let Err(e) = surface.update(reply).await {
            warn!("Failed to show Wynncraft class: {}", e);
            return Outcome::Acknowledged;
        }
        Outcome::Rendered
    }
}

pub struct WynncraftHandler {
    wynn: Arc<WynncraftClient>,
}

impl WynncraftHandler {
    pub fn new(wynn: Arc<WynncraftClient>) -> Self {
        Self { wynn }
    }
}

#[async_trait]
impl CommandHandler for WynncraftHandler {
    fn name(&self) -> &str {
        "wynncraft"
    }

    fn usage(&self) -> &str {
        "`/wynncraft user <name>` - Find a Wynncraft player"
    }

    async fn execute(&self, ctx: &CommandContext, args: &CommandArgs) -> AppResult<Reply> {
        if args.subcommand() != Some("user") {
            return Ok(unknown_subcommand());
        }
        let name = args
            .str("name")
            .ok_or_else(|| AppError::BadRequest("A username is required!".into()))?;

        let player = self.wynn.player(name).await?;
        let profile = Arc::new(WynnProfile::new(&ctx.user_id, player));
        let reply = profile.overview();
        if profile.has_classes() {
            ctx.components.register(&ctx.interaction_id, profile);
        }
        Ok(reply)
    }
}
