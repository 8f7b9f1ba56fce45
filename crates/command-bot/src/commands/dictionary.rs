//! Word definitions.

use super::{unknown_subcommand, CommandContext, CommandHandler};
use crate::error::{AppError, AppResult};
use api_clients::{DictionaryClient, WordEntry};
use async_trait::async_trait;
use discord_client::CommandArgs;
use interactive::{cutoff_text, ControlDescriptor, Field, Reply, View};
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;

static BOLD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"</?(b|strong)>").expect("valid bold regex"));
static ITALIC: Lazy<Regex> = Lazy::new(|| Regex::new(r"</?(em|i)>").expect("valid italic regex"));
static XREF: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<xref>([^<>]+)</xref>").expect("valid xref regex"));

const TITLE_LIMIT: usize = 256;
const DESCRIPTION_LIMIT: usize = 4096;

/// Turn definition markup into Discord markdown.
fn markdown(text: &str) -> String {
    let text = BOLD.replace_all(text, "**");
    let text = ITALIC.replace_all(&text, "*");
    let text = XREF.replace_all(&text, "[$1](https://www.wordnik.com/words/$1)");
    html_escape::decode_html_entities(&text).into_owned()
}

fn word_url(word: &str) -> String {
    format!("https://www.wordnik.com/words/{}", urlencoding::encode(word))
}

pub struct DictionaryHandler {
    dictionary: Arc<DictionaryClient>,
}

impl DictionaryHandler {
    pub fn new(dictionary: Arc<DictionaryClient>) -> Self {
        Self { dictionary }
    }

    fn entry_view(entry: &WordEntry) -> View {
        let spelling = entry.hyphenated().unwrap_or_else(|| entry.word.clone());
        let title = match entry.pronunciation(|kind| kind.starts_with("ahd")) {
            Some(ahd) => format!("**{}** *({})*", spelling, ahd),
            None => format!("**{}**", spelling),
        };

        let mut view = View::titled(cutoff_text(&title, TITLE_LIMIT));
        view.url = Some(word_url(&entry.word));
        let description = entry
            .definitions
            .iter()
            .filter_map(|d| {
                let text = d.text.as_deref()?;
                Some(format!("*{}* {}", d.part_of_speech_label(), markdown(text)))
            })
            .collect::<Vec<_>>()
            .join("\n");
        view.description = Some(cutoff_text(&description, DESCRIPTION_LIMIT));

        if let Some(arpabet) = entry.pronunciation(|kind| kind == "arpabet") {
            view.fields.push(Field::inline("Arpabet", arpabet));
        }
        if let Some(ipa) = entry.pronunciation(|kind| kind == "IPA") {
            view.fields.push(Field::inline("IPA", ipa));
        }
        view
    }
}

#[async_trait]
impl CommandHandler for DictionaryHandler {
    fn name(&self) -> &str {
        "dictionary"
    }

    fn usage(&self) -> &str {
        "`/dictionary define <word>` - Define a word"
    }

    async fn execute(&self, _ctx: &CommandContext, args: &CommandArgs) -> AppResult<Reply> {
        if args.subcommand() != Some("define") {
            return Ok(unknown_subcommand());
        }
        let word = args
            .str("word")
            .ok_or_else(|| AppError::BadRequest("A word is required!".into()))?;

        let Some(entry) = self.dictionary.define(word).await? else {
            return Ok(Reply::error("That word cannot be found!"));
        };

        Ok(Reply::view(Self::entry_view(&entry)).with_row(vec![ControlDescriptor::link(
            "More on Wordnik",
            word_url(&entry.word),
        )]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_markdown() {
        assert_eq!(
            markdown("A <i>large</i> <strong>book</strong>; see <xref>lexicon</xref> &amp; more."),
            "A *large* **book**; see [lexicon](https://www.wordnik.com/words/lexicon) & more."
        );
    }
}
