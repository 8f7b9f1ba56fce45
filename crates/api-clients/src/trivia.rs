//! Trivia questions from the Open Trivia Database.

use crate::error::FetchError;
use crate::http::{build_client, check_status};
use rand::seq::SliceRandom;
use reqwest::Client;
use serde::Deserialize;
use std::fmt;
use std::time::Duration;
use tracing::instrument;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "easy" => Some(Difficulty::Easy),
            "medium" => Some(Difficulty::Medium),
            "hard" => Some(Difficulty::Hard),
            _ => None,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Deserialize)]
struct TriviaResponse {
    response_code: u8,
    #[serde(default)]
    results: Vec<RawQuestion>,
}

#[derive(Debug, Deserialize)]
struct RawQuestion {
    category: String,
    difficulty: String,
    question: String,
    correct_answer: String,
    incorrect_answers: Vec<String>,
}

/// A multiple-choice question with entities already decoded.
#[derive(Debug, Clone, PartialEq)]
pub struct TriviaQuestion {
    pub category: String,
    pub difficulty: String,
    pub question: String,
    pub correct_answer: String,
    pub incorrect_answers: Vec<String>,
}

impl TriviaQuestion {
    /// All answers in random order.
    pub fn shuffled_choices(&self) -> Vec<String> {
        let mut choices: Vec<String> = std::iter::once(self.correct_answer.clone())
            .chain(self.incorrect_answers.iter().cloned())
            .collect();
        choices.shuffle(&mut rand::thread_rng());
        choices
    }
}

impl From<RawQuestion> for TriviaQuestion {
    fn from(raw: RawQuestion) -> Self {
        let decode = |s: &str| html_escape::decode_html_entities(s).into_owned();
        Self {
            category: decode(&raw.category),
            difficulty: raw.difficulty,
            question: decode(&raw.question),
            correct_answer: decode(&raw.correct_answer),
            incorrect_answers: raw.incorrect_answers.iter().map(|a| decode(a)).collect(),
        }
    }
}

pub struct TriviaClient {
    client: Client,
    base_url: String,
}

impl TriviaClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, FetchError> {
        Ok(Self {
            client: build_client(timeout)?,
            base_url: base_url.into(),
        })
    }

    #[instrument(skip(self))]
    pub async fn question(
        &self,
        difficulty: Option<Difficulty>,
        category: Option<u32>,
    ) -> Result<TriviaQuestion, FetchError> {
        let mut params = vec![("amount", "1".to_string())];
        if let Some(difficulty) = difficulty {
            params.push(("difficulty", difficulty.to_string()));
        }
        if let Some(category) = category {
            params.push(("category", category.to_string()));
        }

        let response = self
            .client
            .get(format!("{}/api.php", self.base_url))
            .query(&params)
            .send()
            .await?;
        let body: TriviaResponse = check_status(response, "question").await?.json().await?;

        match body.response_code {
            0 => {}
            1 => return Err(FetchError::NotFound { what: "question" }),
            5 => return Err(FetchError::UpstreamStatus(429)),
            code => {
                return Err(FetchError::Upstream(format!(
                    "The trivia service rejected the request (code {})!",
                    code
                )))
            }
        }

        body.results
            .into_iter()
            .next()
            .map(TriviaQuestion::from)
            .ok_or(FetchError::NotFound { what: "question" })
    }
}
