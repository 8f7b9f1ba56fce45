//! Help command - lists available commands.

use super::{CommandContext, CommandHandler};
use crate::error::AppResult;
use async_trait::async_trait;
use discord_client::CommandArgs;
use interactive::Reply;
use std::sync::Arc;

const HELP_USAGE: &str = "`/help` - Show this message";

pub struct HelpHandler {
    usages: Vec<String>,
}

impl HelpHandler {
    /// Help listing `commands` followed by itself.
    pub fn new(commands: &[Arc<dyn CommandHandler>]) -> Self {
        Self {
            usages: commands.iter().map(|c| c.usage().to_string()).collect(),
        }
    }

    fn text(&self) -> String {
        let mut text = String::from("**Commands:**\n");
        for usage in self.usages.iter().map(String::as_str).chain([HELP_USAGE]) {
            text.push_str("- ");
            text.push_str(usage);
            text.push('\n');
        }
        text.push_str(
            "\nInteractive replies can only be controlled by the user who ran the command.",
        );
        text
    }
}

#[async_trait]
impl CommandHandler for HelpHandler {
    fn name(&self) -> &str {
        "help"
    }

    fn usage(&self) -> &str {
        HELP_USAGE
    }

    fn ephemeral(&self, _args: &CommandArgs) -> bool {
        true
    }

    async fn execute(&self, _ctx: &CommandContext, _args: &CommandArgs) -> AppResult<Reply> {
        Ok(Reply::text(self.text()).ephemeral())
    }
}
