//! Slash command handlers.

mod dictionary;
mod help;
mod minecraft;
mod search;
mod steam;
mod trivia;
mod wynncraft;
mod xkcd;

pub use dictionary::DictionaryHandler;
pub use help::HelpHandler;
pub use minecraft::MinecraftHandler;
pub use search::SearchHandler;
pub use steam::SteamHandler;
pub use trivia::{TriviaHandler, TriviaPrompt, NOT_YOUR_QUESTION};
pub use wynncraft::{WynnProfile, WynncraftHandler, CLASS_SELECT};
pub use xkcd::XkcdHandler;

use crate::error::AppResult;
use crate::throttle::Throttle;
use async_trait::async_trait;
use discord_client::CommandArgs;
use interactive::{ComponentRegistry, Reply};
use std::sync::Arc;

/// Everything a command knows about its invocation besides the options.
#[derive(Clone)]
pub struct CommandContext {
    /// Interaction ID. Scopes the controls of the reply.
    pub interaction_id: String,
    /// ID of the invoking user.
    pub user_id: String,
    pub components: Arc<ComponentRegistry>,
}

/// Command handler trait.
#[async_trait]
pub trait CommandHandler: Send + Sync {
    /// Command name (e.g., "steam", "help").
    fn name(&self) -> &str;

    /// One-line usage shown by `help`.
    fn usage(&self) -> &str;

    /// Per-user rate limit, if any.
    fn throttle(&self) -> Option<Throttle> {
        None
    }

    /// Whether the reply is only shown to the invoking user.
    fn ephemeral(&self, _args: &CommandArgs) -> bool {
        false
    }

    /// Execute the command.
    async fn execute(&self, ctx: &CommandContext, args: &CommandArgs) -> AppResult<Reply>;
}

/// At most `limit` items, one per line, with a count of the rest.
pub(crate) fn format_list(items: &[String], limit: usize) -> String {
    let mut lines: Vec<String> = items.iter().take(limit).cloned().collect();
    if items.len() > limit {
        lines.push(format!("*({} more)*", items.len() - limit));
    }
    lines.join("\n")
}

/// Reply for a sub-command this bot does not know.
pub(crate) fn unknown_subcommand() -> Reply {
    Reply::text("Unknown subcommand.").ephemeral()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_list() {
        let items: Vec<String> = (1..=12).map(|i| format!("mod{}", i)).collect();
        let text = format_list(&items, 10);
        assert!(text.starts_with("mod1\nmod2"));
        assert!(text.ends_with("mod10\n*(2 more)*"));

        assert_eq!(format_list(&items[..2], 10), "mod1\nmod2");
        assert_eq!(format_list(&[], 10), "");
    }
}
