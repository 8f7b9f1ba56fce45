//! Interaction payloads received from and sent to Discord.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Message flag hiding a response from everyone but the invoking user.
pub const EPHEMERAL_FLAG: u64 = 1 << 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum InteractionType {
    Ping,
    ApplicationCommand,
    MessageComponent,
    Autocomplete,
    ModalSubmit,
}

impl TryFrom<u8> for InteractionType {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(InteractionType::Ping),
            2 => Ok(InteractionType::ApplicationCommand),
            3 => Ok(InteractionType::MessageComponent),
            4 => Ok(InteractionType::Autocomplete),
            5 => Ok(InteractionType::ModalSubmit),
            other => Err(format!("unknown interaction type {}", other)),
        }
    }
}

impl From<InteractionType> for u8 {
    fn from(kind: InteractionType) -> Self {
        match kind {
            InteractionType::Ping => 1,
            InteractionType::ApplicationCommand => 2,
            InteractionType::MessageComponent => 3,
            InteractionType::Autocomplete => 4,
            InteractionType::ModalSubmit => 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct User {
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub global_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Member {
    #[serde(default)]
    pub user: Option<User>,
    #[serde(default)]
    pub nick: Option<String>,
}

/// Option types that nest further options.
const SUB_COMMAND: u8 = 1;
const SUB_COMMAND_GROUP: u8 = 2;

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct CommandOption {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: u8,
    #[serde(default)]
    pub value: Option<Value>,
    #[serde(default)]
    pub options: Vec<CommandOption>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct InteractionData {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub options: Vec<CommandOption>,
    #[serde(default)]
    pub custom_id: Option<String>,
    #[serde(default)]
    pub component_type: Option<u8>,
    /// Picked values of a select menu.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Interaction {
    pub id: String,
    pub application_id: String,
    #[serde(rename = "type")]
    pub kind: InteractionType,
    pub token: String,
    #[serde(default)]
    pub data: Option<InteractionData>,
    #[serde(default)]
    pub guild_id: Option<String>,
    #[serde(default)]
    pub channel_id: Option<String>,
    #[serde(default)]
    pub member: Option<Member>,
    #[serde(default)]
    pub user: Option<User>,
}

impl Interaction {
    /// The acting user: the member's user in guilds, `user` in DMs.
    pub fn actor(&self) -> Option<&User> {
        self.member
            .as_ref()
            .and_then(|m| m.user.as_ref())
            .or(self.user.as_ref())
    }

    pub fn custom_id(&self) -> Option<&str> {
        self.data.as_ref()?.custom_id.as_deref()
    }

    /// Select menu values; empty for everything else.
    pub fn values(&self) -> &[String] {
        self.data
            .as_ref()
            .map(|data| data.values.as_slice())
            .unwrap_or_default()
    }

    /// Command name, sub-command path and leaf option values.
    pub fn command_args(&self) -> Option<CommandArgs> {
        let data = self.data.as_ref()?;
        let mut args = CommandArgs {
            path: vec![data.name.clone()?],
            values: HashMap::new(),
        };

        let mut options = &data.options;
        loop {
            match options
                .iter()
                .find(|o| o.kind == SUB_COMMAND || o.kind == SUB_COMMAND_GROUP)
            {
                Some(sub) => {
                    args.path.push(sub.name.clone());
                    options = &sub.options;
                }
                None => break,
            }
        }
        for option in options {
            if let Some(value) = &option.value {
                args.values.insert(option.name.clone(), value.clone());
            }
        }
        Some(args)
    }
}

/// Flattened command invocation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommandArgs {
    /// Command name followed by any sub-command names.
    pub path: Vec<String>,
    pub values: HashMap<String, Value>,
}

impl CommandArgs {
    pub fn name(&self) -> &str {
        self.path.first().map(String::as_str).unwrap_or_default()
    }

    pub fn subcommand(&self) -> Option<&str> {
        self.path.get(1).map(String::as_str)
    }

    pub fn str(&self, name: &str) -> Option<&str> {
        self.values.get(name)?.as_str()
    }

    pub fn int(&self, name: &str) -> Option<i64> {
        self.values.get(name)?.as_i64()
    }

    pub fn bool(&self, name: &str) -> Option<bool> {
        self.values.get(name)?.as_bool()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EmbedAuthor {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmbedMedia {
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmbedFooter {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Embed {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<EmbedAuthor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<EmbedMedia>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<EmbedMedia>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<EmbedField>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub footer: Option<EmbedFooter>,
    /// ISO 8601 timestamp.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

pub mod button_style {
    pub const PRIMARY: u8 = 1;
    pub const SECONDARY: u8 = 2;
    pub const SUCCESS: u8 = 3;
    pub const DANGER: u8 = 4;
    pub const LINK: u8 = 5;
}

const ACTION_ROW: u8 = 1;
const BUTTON: u8 = 2;
const STRING_SELECT: u8 = 3;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Button {
    #[serde(rename = "type")]
    pub kind: u8,
    pub style: u8,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub disabled: bool,
}

impl Button {
    pub fn new(style: u8, label: impl Into<String>) -> Self {
        Self {
            kind: BUTTON,
            style,
            label: label.into(),
            custom_id: None,
            url: None,
            disabled: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectOption {
    pub label: String,
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectMenu {
    #[serde(rename = "type")]
    pub kind: u8,
    pub custom_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    pub options: Vec<SelectOption>,
    pub disabled: bool,
}

impl SelectMenu {
    pub fn new(custom_id: impl Into<String>, options: Vec<SelectOption>) -> Self {
        Self {
            kind: STRING_SELECT,
            custom_id: custom_id.into(),
            placeholder: None,
            options,
            disabled: false,
        }
    }
}

/// Anything that sits in an action row. Serialises as the inner component,
/// whose `type` tells Discord which one it is.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Component {
    Button(Button),
    SelectMenu(SelectMenu),
}

impl From<Button> for Component {
    fn from(button: Button) -> Self {
        Component::Button(button)
    }
}

impl From<SelectMenu> for Component {
    fn from(menu: SelectMenu) -> Self {
        Component::SelectMenu(menu)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionRow {
    #[serde(rename = "type")]
    pub kind: u8,
    pub components: Vec<Component>,
}

impl ActionRow {
    pub fn new(components: Vec<Component>) -> Self {
        Self {
            kind: ACTION_ROW,
            components,
        }
    }
}

/// Message body for responses, edits and follow-ups.
///
/// `embeds` and `components` are always sent so an edit replaces them.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MessagePayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    pub embeds: Vec<Embed>,
    pub components: Vec<ActionRow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flags: Option<u64>,
}

impl MessagePayload {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Self::default()
        }
    }

    pub fn ephemeral(mut self) -> Self {
        self.flags = Some(EPHEMERAL_FLAG);
        self
    }

    pub fn is_ephemeral(&self) -> bool {
        self.flags.is_some_and(|flags| flags & EPHEMERAL_FLAG != 0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseType {
    Pong,
    ChannelMessage,
    DeferredChannelMessage,
    DeferredUpdateMessage,
    UpdateMessage,
}

impl ResponseType {
    fn code(self) -> u8 {
        match self {
            ResponseType::Pong => 1,
            ResponseType::ChannelMessage => 4,
            ResponseType::DeferredChannelMessage => 5,
            ResponseType::DeferredUpdateMessage => 6,
            ResponseType::UpdateMessage => 7,
        }
    }
}

/// Synchronous reply to an interaction request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InteractionResponse {
    #[serde(rename = "type")]
    pub kind: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<MessagePayload>,
}

impl InteractionResponse {
    fn of(kind: ResponseType, data: Option<MessagePayload>) -> Self {
        Self {
            kind: kind.code(),
            data,
        }
    }

    pub fn pong() -> Self {
        Self::of(ResponseType::Pong, None)
    }

    pub fn message(payload: MessagePayload) -> Self {
        Self::of(ResponseType::ChannelMessage, Some(payload))
    }

    /// "Thinking..." placeholder, edited later with the real reply.
    pub fn deferred(ephemeral: bool) -> Self {
        let data = ephemeral.then(|| MessagePayload::default().ephemeral());
        Self::of(ResponseType::DeferredChannelMessage, data)
    }

    /// Acknowledge a component press, editing the message later if at all.
    pub fn deferred_update() -> Self {
        Self::of(ResponseType::DeferredUpdateMessage, None)
    }

    pub fn update(payload: MessagePayload) -> Self {
        Self::of(ResponseType::UpdateMessage, Some(payload))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_command_with_subcommand() {
        let raw = serde_json::json!({
            "id": "1001",
            "application_id": "42",
            "type": 2,
            "token": "tok",
            "guild_id": "9",
            "member": { "user": { "id": "7", "username": "gabe" }, "nick": null },
            "data": {
                "id": "55",
                "name": "steam",
                "options": [{
                    "name": "user",
                    "type": 1,
                    "options": [{ "name": "query", "type": 3, "value": "MyName" }]
                }]
            }
        });

        let interaction: Interaction = serde_json::from_value(raw).unwrap();
        assert_eq!(interaction.kind, InteractionType::ApplicationCommand);
        assert_eq!(interaction.actor().unwrap().id, "7");

        let args = interaction.command_args().unwrap();
        assert_eq!(args.path, vec!["steam", "user"]);
        assert_eq!(args.name(), "steam");
        assert_eq!(args.subcommand(), Some("user"));
        assert_eq!(args.str("query"), Some("MyName"));
        assert_eq!(args.int("query"), None);
    }

    #[test]
    fn test_parse_component_in_dm() {
        let raw = serde_json::json!({
            "id": "1002",
            "application_id": "42",
            "type": 3,
            "token": "tok",
            "user": { "id": "8", "username": "dm-user" },
            "data": { "custom_id": "1001:aliases", "component_type": 2 }
        });

        let interaction: Interaction = serde_json::from_value(raw).unwrap();
        assert_eq!(interaction.kind, InteractionType::MessageComponent);
        assert_eq!(interaction.actor().unwrap().id, "8");
        assert_eq!(interaction.custom_id(), Some("1001:aliases"));
    }

    #[test]
    fn test_unknown_interaction_type_rejected() {
        let raw = serde_json::json!({
            "id": "1", "application_id": "42", "type": 99, "token": "tok"
        });
        assert!(serde_json::from_value::<Interaction>(raw).is_err());
    }

    #[test]
    fn test_response_serialization() {
        assert_eq!(
            serde_json::to_value(InteractionResponse::pong()).unwrap(),
            serde_json::json!({ "type": 1 })
        );
        assert_eq!(
            serde_json::to_value(InteractionResponse::deferred(true)).unwrap(),
            serde_json::json!({ "type": 5, "data": { "embeds": [], "components": [], "flags": 64 } })
        );
        assert_eq!(
            serde_json::to_value(InteractionResponse::deferred(false)).unwrap(),
            serde_json::json!({ "type": 5 })
        );
        assert_eq!(
            serde_json::to_value(InteractionResponse::deferred_update()).unwrap(),
            serde_json::json!({ "type": 6 })
        );
    }

    #[test]
    fn test_button_serialization() {
        let mut button = Button::new(button_style::SECONDARY, "Show Aliases");
        button.custom_id = Some("1001:aliases".into());
        let row = ActionRow::new(vec![button.into()]);

        assert_eq!(
            serde_json::to_value(&row).unwrap(),
            serde_json::json!({
                "type": 1,
                "components": [{
                    "type": 2, "style": 2, "label": "Show Aliases",
                    "custom_id": "1001:aliases", "disabled": false
                }]
            })
        );
    }

    #[test]
    fn test_select_menu_serialization() {
        let mut menu = SelectMenu::new(
            "1001:class",
            vec![SelectOption {
                label: "Lv106 Dark Wizard".into(),
                value: "0".into(),
                description: None,
            }],
        );
        menu.placeholder = Some("View a class... (1)".into());
        let row = ActionRow::new(vec![menu.into()]);

        assert_eq!(
            serde_json::to_value(&row).unwrap(),
            serde_json::json!({
                "type": 1,
                "components": [{
                    "type": 3, "custom_id": "1001:class",
                    "placeholder": "View a class... (1)",
                    "options": [{ "label": "Lv106 Dark Wizard", "value": "0" }],
                    "disabled": false
                }]
            })
        );
    }

    #[test]
    fn test_parse_select_values() {
        let raw = serde_json::json!({
            "id": "1003",
            "application_id": "42",
            "type": 3,
            "token": "tok",
            "user": { "id": "8", "username": "dm-user" },
            "data": { "custom_id": "1001:class", "component_type": 3, "values": ["1"] }
        });

        let interaction: Interaction = serde_json::from_value(raw).unwrap();
        assert_eq!(interaction.values(), ["1".to_string()]);

        let button_press = Interaction {
            data: Some(InteractionData::default()),
            ..interaction
        };
        assert!(button_press.values().is_empty());
    }
}
