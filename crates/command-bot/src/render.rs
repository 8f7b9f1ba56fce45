//! Conversion of view models into Discord message payloads.

use discord_client::{
    button_style, ActionRow, Button, Component, Embed, EmbedAuthor, EmbedField, EmbedFooter,
    EmbedMedia, MessagePayload, SelectMenu, SelectOption,
};
use interactive::{ControlDescriptor, ControlKind, ControlStyle, Reply, View};

fn style_code(style: ControlStyle) -> u8 {
    match style {
        ControlStyle::Primary => button_style::PRIMARY,
        ControlStyle::Secondary => button_style::SECONDARY,
        ControlStyle::Success => button_style::SUCCESS,
        ControlStyle::Danger => button_style::DANGER,
        ControlStyle::Link => button_style::LINK,
    }
}

fn component(control: &ControlDescriptor) -> Component {
    match control.kind {
        ControlKind::Button => Button {
            custom_id: control.id.clone(),
            url: control.url.clone(),
            disabled: control.disabled,
            ..Button::new(style_code(control.style), &control.label)
        }
        .into(),
        ControlKind::Select => {
            let options = control
                .choices
                .iter()
                .map(|choice| SelectOption {
                    label: choice.label.clone(),
                    value: choice.value.clone(),
                    description: choice.description.clone(),
                })
                .collect();
            SelectMenu {
                placeholder: Some(control.label.clone()).filter(|p| !p.is_empty()),
                disabled: control.disabled,
                ..SelectMenu::new(control.id.clone().unwrap_or_default(), options)
            }
            .into()
        }
    }
}

fn embed(view: &View) -> Embed {
    Embed {
        author: view.author.as_ref().map(|author| EmbedAuthor {
            name: author.name.clone(),
            url: author.url.clone(),
            icon_url: author.icon_url.clone(),
        }),
        title: view.title.clone(),
        url: view.url.clone(),
        description: view.description.clone(),
        color: view.color,
        thumbnail: view.thumbnail.clone().map(|url| EmbedMedia { url }),
        image: view.image.clone().map(|url| EmbedMedia { url }),
        fields: view
            .fields
            .iter()
            .map(|field| EmbedField {
                name: field.name.clone(),
                value: field.value.clone(),
                inline: field.inline,
            })
            .collect(),
        footer: view.footer.clone().map(|text| EmbedFooter { text }),
        timestamp: view.timestamp.map(|ts| ts.to_rfc3339()),
    }
}

/// Build the payload for `reply`. Action ids must already be scoped.
pub fn to_payload(reply: &Reply) -> MessagePayload {
    let payload = MessagePayload {
        content: reply.content.clone(),
        embeds: reply.views.iter().map(embed).collect(),
        components: reply
            .rows
            .iter()
            .map(|row| ActionRow::new(row.iter().map(component).collect()))
            .collect(),
        flags: None,
    };
    if reply.ephemeral {
        payload.ephemeral()
    } else {
        payload
    }
}
