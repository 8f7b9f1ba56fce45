//! Word definitions from the DuckDuckGo dictionary spice endpoints.

use crate::error::FetchError;
use crate::http::{build_client, check_status, strip_jsonp};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tracing::instrument;
use urlencoding::encode;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Definition {
    pub word: String,
    /// Definition markup; entries without text are headings only.
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub part_of_speech: Option<String>,
}

impl Definition {
    /// Short label for the part of speech, `-` when unknown.
    pub fn part_of_speech_label(&self) -> &'static str {
        match self.part_of_speech.as_deref() {
            Some("interjection") => "interj.",
            Some("noun" | "noun-plural" | "proper-noun") => "n.",
            Some("verb" | "intransitive verb" | "transitive verb" | "auxiliary-verb") => "v.",
            Some("adjective") => "adj.",
            Some("adverb") => "adv.",
            Some("pronoun") => "pro.",
            Some("conjunction") => "conj.",
            Some("preposition") => "prep.",
            Some("abbreviation") => "abbr.",
            _ => "-",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pronunciation {
    pub raw: String,
    pub raw_type: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Syllable {
    pub text: String,
}

/// Everything known about one word.
#[derive(Debug, Clone, PartialEq)]
pub struct WordEntry {
    pub word: String,
    pub definitions: Vec<Definition>,
    pub pronunciations: Vec<Pronunciation>,
    pub syllables: Vec<Syllable>,
}

impl WordEntry {
    /// Hyphenated spelling, e.g. `dic•tion•ar•y`.
    pub fn hyphenated(&self) -> Option<String> {
        (!self.syllables.is_empty()).then(|| {
            self.syllables
                .iter()
                .map(|s| s.text.as_str())
                .collect::<Vec<_>>()
                .join("•")
        })
    }

    pub fn pronunciation(&self, matches: impl Fn(&str) -> bool) -> Option<&str> {
        self.pronunciations
            .iter()
            .find(|p| matches(&p.raw_type))
            .map(|p| p.raw.as_str())
    }
}

pub struct DictionaryClient {
    client: Client,
    base_url: String,
}

impl DictionaryClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, FetchError> {
        Ok(Self {
            client: build_client(timeout)?,
            base_url: base_url.into(),
        })
    }

    async fn spice<T: DeserializeOwned>(&self, kind: &str, word: &str) -> Result<Vec<T>, FetchError> {
        let url = format!(
            "{}/js/spice/dictionary/{}/{}",
            self.base_url,
            kind,
            encode(word)
        );
        let response = self.client.get(url).send().await?;
        let body = check_status(response, "word").await?.text().await?;

        // Unknown words come back without a callback payload.
        match strip_jsonp(&body) {
            Some(payload) if !payload.is_empty() => Ok(serde_json::from_str(payload)?),
            _ => Ok(Vec::new()),
        }
    }

    #[instrument(skip(self))]
    pub async fn definitions(&self, word: &str) -> Result<Vec<Definition>, FetchError> {
        self.spice("definition", word).await
    }

    #[instrument(skip(self))]
    pub async fn pronunciations(&self, word: &str) -> Result<Vec<Pronunciation>, FetchError> {
        self.spice("pronunciation", word).await
    }

    #[instrument(skip(self))]
    pub async fn hyphenation(&self, word: &str) -> Result<Vec<Syllable>, FetchError> {
        self.spice("hyphenation", word).await
    }

    /// Look up a word. Returns `None` when it has no definitions.
    #[instrument(skip(self))]
    pub async fn define(&self, word: &str) -> Result<Option<WordEntry>, FetchError> {
        let definitions = self.definitions(word).await?;
        let Some(first) = definitions.first() else {
            return Ok(None);
        };
        let word = first.word.clone();

        let (pronunciations, syllables) =
            tokio::try_join!(self.pronunciations(&word), self.hyphenation(&word))?;

        Ok(Some(WordEntry {
            word,
            definitions,
            pronunciations,
            syllables,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn jsonp(callback: &str, payload: serde_json::Value) -> String {
        format!("{}(\n{}\n);", callback, payload)
    }

    #[tokio::test]
    async fn test_define_combines_endpoints() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/js/spice/dictionary/definition/Rust"))
            .respond_with(ResponseTemplate::new(200).set_body_string(jsonp(
                "ddg_spice_dictionary_definition",
                serde_json::json!([
                    { "word": "rust", "text": "A reddish <xref>oxide</xref>.", "partOfSpeech": "noun" },
                    { "word": "rust", "partOfSpeech": "verb" }
                ]),
            )))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/js/spice/dictionary/pronunciation/rust"))
            .respond_with(ResponseTemplate::new(200).set_body_string(jsonp(
                "ddg_spice_dictionary_pronunciation",
                serde_json::json!([
                    { "raw": "(rŭst)", "rawType": "ahd-5" },
                    { "raw": "R AH1 S T", "rawType": "arpabet" }
                ]),
            )))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/js/spice/dictionary/hyphenation/rust"))
            .respond_with(ResponseTemplate::new(200).set_body_string(jsonp(
                "ddg_spice_dictionary_hyphenation",
                serde_json::json!([{ "text": "rust" }]),
            )))
            .mount(&server)
            .await;

        let dictionary = DictionaryClient::new(server.uri(), Duration::from_secs(5)).unwrap();
        let entry = dictionary.define("Rust").await.unwrap().unwrap();
        assert_eq!(entry.word, "rust");
        assert_eq!(entry.definitions.len(), 2);
        assert_eq!(entry.definitions[0].part_of_speech_label(), "n.");
        assert_eq!(entry.hyphenated().as_deref(), Some("rust"));
        assert_eq!(entry.pronunciation(|t| t.starts_with("ahd")), Some("(rŭst)"));
        assert_eq!(entry.pronunciation(|t| t == "IPA"), None);
    }

    #[tokio::test]
    async fn test_unknown_word_is_none() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/js/spice/dictionary/definition/qwzx"))
            .respond_with(ResponseTemplate::new(200).set_body_string(""))
            .mount(&server)
            .await;

        let dictionary = DictionaryClient::new(server.uri(), Duration::from_secs(5)).unwrap();
        assert!(dictionary.define("qwzx").await.unwrap().is_none());
    }

    #[test]
    fn test_part_of_speech_label_fallback() {
        let definition = Definition {
            word: "hmm".into(),
            text: None,
            part_of_speech: Some("idiom".into()),
        };
        assert_eq!(definition.part_of_speech_label(), "-");
    }
}
