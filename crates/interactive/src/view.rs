//! Transport-neutral view model handed to the render collaborator.

use chrono::{DateTime, Utc};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

impl Field {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            inline: false,
        }
    }

    pub fn inline(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            inline: true,
            ..Self::new(name, value)
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Author {
    pub name: String,
    pub url: Option<String>,
    pub icon_url: Option<String>,
}

/// One rich message card.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct View {
    pub author: Option<Author>,
    pub title: Option<String>,
    pub url: Option<String>,
    pub description: Option<String>,
    pub color: Option<u32>,
    pub thumbnail: Option<String>,
    pub image: Option<String>,
    pub fields: Vec<Field>,
    pub footer: Option<String>,
    pub timestamp: Option<DateTime<Utc>>,
}

impl View {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Self::default()
        }
    }

    /// Overlay page content on this view. Set parts of the page win; page
    /// fields follow the view's own fields.
    pub fn merge(&self, page: &PartialView) -> View {
        let mut merged = self.clone();
        if page.description.is_some() {
            merged.description = page.description.clone();
        }
        if page.image.is_some() {
            merged.image = page.image.clone();
        }
        if page.thumbnail.is_some() {
            merged.thumbnail = page.thumbnail.clone();
        }
        if page.color.is_some() {
            merged.color = page.color;
        }
        merged.fields.extend(page.fields.iter().cloned());
        merged
    }
}

/// Content of one session page, layered over the session's base view.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartialView {
    pub description: Option<String>,
    pub fields: Vec<Field>,
    pub image: Option<String>,
    pub thumbnail: Option<String>,
    pub color: Option<u32>,
}

impl PartialView {
    pub fn described(description: impl Into<String>) -> Self {
        Self {
            description: Some(description.into()),
            ..Self::default()
        }
    }

    pub fn with_field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlStyle {
    Primary,
    Secondary,
    Success,
    Danger,
    Link,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ControlKind {
    #[default]
    Button,
    /// Drop-down menu; presses carry the picked choice values.
    Select,
}

/// One entry of a select control.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectChoice {
    pub label: String,
    pub value: String,
    pub description: Option<String>,
}

impl SelectChoice {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
            description: None,
        }
    }

    /// Attach a description. Empty descriptions are dropped.
    pub fn described(mut self, description: impl Into<String>) -> Self {
        let description = description.into();
        self.description = Some(description).filter(|d| !d.is_empty());
        self
    }
}

/// A button or select menu. Action buttons and selects carry an id, link
/// buttons a url. For selects `label` is the placeholder text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlDescriptor {
    pub kind: ControlKind,
    pub id: Option<String>,
    pub label: String,
    pub style: ControlStyle,
    pub disabled: bool,
    pub url: Option<String>,
    pub choices: Vec<SelectChoice>,
}

impl ControlDescriptor {
    pub fn button(id: impl Into<String>, label: impl Into<String>, style: ControlStyle) -> Self {
        Self {
            kind: ControlKind::Button,
            id: Some(id.into()),
            label: label.into(),
            style,
            disabled: false,
            url: None,
            choices: Vec::new(),
        }
    }

    pub fn link(label: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            kind: ControlKind::Button,
            id: None,
            label: label.into(),
            style: ControlStyle::Link,
            disabled: false,
            url: Some(url.into()),
            choices: Vec::new(),
        }
    }

    /// A single-choice select menu. It must be alone in its row.
    pub fn select(
        id: impl Into<String>,
        placeholder: impl Into<String>,
        choices: Vec<SelectChoice>,
    ) -> Self {
        Self {
            kind: ControlKind::Select,
            choices,
            ..Self::button(id, placeholder, ControlStyle::Secondary)
        }
    }

    pub fn disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }
}

/// A complete message: text, cards and rows of controls.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reply {
    pub content: Option<String>,
    pub views: Vec<View>,
    pub rows: Vec<Vec<ControlDescriptor>>,
    pub ephemeral: bool,
}

impl Reply {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Self::default()
        }
    }

    pub fn view(view: View) -> Self {
        Self {
            views: vec![view],
            ..Self::default()
        }
    }

    /// Ephemeral `❌` reply for a failed command.
    pub fn error(message: impl AsRef<str>) -> Self {
        Self::text(format!("❌ {}", message.as_ref())).ephemeral()
    }

    pub fn ephemeral(mut self) -> Self {
        self.ephemeral = true;
        self
    }

    pub fn with_row(mut self, row: Vec<ControlDescriptor>) -> Self {
        if !row.is_empty() {
            self.rows.push(row);
        }
        self
    }

    /// Prefix every action id with `scope`, so ids are unique per message.
    pub fn scoped(mut self, scope: &str) -> Self {
        for control in self.rows.iter_mut().flatten() {
            if let Some(id) = control.id.take() {
                control.id = Some(scoped_id(scope, &id));
            }
        }
        self
    }
}

/// Build a `"{scope}:{control}"` identifier.
pub fn scoped_id(scope: &str, control: &str) -> String {
    format!("{}:{}", scope, control)
}

/// Split a scoped identifier back into scope and control id.
pub fn parse_scoped_id(id: &str) -> Option<(&str, &str)> {
    id.split_once(':')
        .filter(|(scope, control)| !scope.is_empty() && !control.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_overlays_page_content() {
        let mut base = View::titled("Gaben");
        base.description = Some("main".into());
        base.fields.push(Field::inline("Steam ID", "1"));

        let page = PartialView::described("background").with_field(Field::new("Extra", "x"));
        let merged = base.merge(&page);

        assert_eq!(merged.title.as_deref(), Some("Gaben"));
        assert_eq!(merged.description.as_deref(), Some("background"));
        assert_eq!(merged.fields.len(), 2);
        // The base is untouched.
        assert_eq!(base.description.as_deref(), Some("main"));
    }

    #[test]
    fn test_scoped_ids() {
        let reply = Reply::text("hi")
            .with_row(vec![
                ControlDescriptor::button("aliases", "Show Aliases", ControlStyle::Secondary),
                ControlDescriptor::link("Open", "https://example.com"),
            ])
            .with_row(Vec::new())
            .scoped("123");

        assert_eq!(reply.rows.len(), 1);
        assert_eq!(reply.rows[0][0].id.as_deref(), Some("123:aliases"));
        assert_eq!(reply.rows[0][1].id, None);

        let reply = Reply::text("pick").with_row(vec![ControlDescriptor::select(
            "class",
            "View a class... (2)",
            vec![
                SelectChoice::new("Lv106 Dark Wizard", "0").described("Craftsman"),
                SelectChoice::new("Lv30 Archer", "1").described(""),
            ],
        )]);
        let select = &reply.scoped("124").rows[0][0];
        assert_eq!(select.kind, ControlKind::Select);
        assert_eq!(select.id.as_deref(), Some("124:class"));
        assert_eq!(select.choices[0].description.as_deref(), Some("Craftsman"));
        assert_eq!(select.choices[1].description, None);

        assert_eq!(parse_scoped_id("123:pager:next"), Some(("123", "pager:next")));
        assert_eq!(parse_scoped_id("nocolon"), None);
        assert_eq!(parse_scoped_id(":x"), None);
    }

    #[test]
    fn test_error_reply_is_ephemeral() {
        let reply = Reply::error("That profile could not be found!");
        assert!(reply.ephemeral);
        assert_eq!(
            reply.content.as_deref(),
            Some("❌ That profile could not be found!")
        );
    }
}
