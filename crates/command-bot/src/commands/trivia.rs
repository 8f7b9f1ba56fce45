//! Multiple-choice trivia with answer buttons.

use super::{CommandContext, CommandHandler};
use crate::error::AppResult;
use crate::throttle::Throttle;
use api_clients::{Difficulty, TriviaClient, TriviaQuestion};
use async_trait::async_trait;
use discord_client::CommandArgs;
use interactive::{
    Author, ComponentEvent, ComponentHandler, ControlDescriptor, ControlStyle, Outcome, Reply,
    Surface, View,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

pub const NOT_YOUR_QUESTION: &str = "Someone else is answering this!";

const LABELS: [&str; 4] = ["A", "B", "C", "D"];
const STYLES: [ControlStyle; 4] = [
    ControlStyle::Success,
    ControlStyle::Danger,
    ControlStyle::Primary,
    ControlStyle::Secondary,
];
const CORRECT_COLOR: u32 = 0x2ecc71;
const WRONG_COLOR: u32 = 0xe74c3c;

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn answer_id(index: usize) -> String {
    format!("answer:{}", index)
}

/// A posted question, answerable once by the user who asked for it.
pub struct TriviaPrompt {
    invoker: String,
    question: TriviaQuestion,
    choices: Vec<String>,
    answered: AtomicBool,
}

impl TriviaPrompt {
    pub fn new(invoker: impl Into<String>, question: TriviaQuestion, choices: Vec<String>) -> Self {
        let choices = choices.into_iter().take(LABELS.len()).collect();
        Self {
            invoker: invoker.into(),
            question,
            choices,
            answered: AtomicBool::new(false),
        }
    }

    fn base_view(&self) -> View {
        View {
            author: Some(Author {
                name: format!(
                    "{}\nDifficulty: {}",
                    self.question.category,
                    capitalize(&self.question.difficulty)
                ),
                ..Author::default()
            }),
            ..View::default()
        }
    }

    fn describe(&self, line: impl Fn(usize, &str) -> String) -> String {
        let lines: Vec<String> = self
            .choices
            .iter()
            .enumerate()
            .map(|(i, choice)| line(i, choice))
            .collect();
        format!("{}\n\n{}", self.question.question, lines.join("\n"))
    }

    /// The question with one button per choice.
    pub fn prompt(&self) -> Reply {
        let mut view = self.base_view();
        view.description =
            Some(self.describe(|i, choice| format!("**`{}.`** {}", LABELS[i], choice)));

        let buttons = (0..self.choices.len())
            .map(|i| ControlDescriptor::button(answer_id(i), LABELS[i], STYLES[i]))
            .collect();
        Reply::view(view).with_row(buttons)
    }

    /// The result after `selected` was picked. Buttons are removed.
    pub fn result(&self, selected: usize) -> Reply {
        let correct = &self.question.correct_answer;
        let picked_correct = self.choices.get(selected) == Some(correct);

        let mut view = self.base_view();
        let body = self.describe(|i, choice| {
            if choice == correct.as_str() {
                format!("**`{}.` {}**", LABELS[i], choice)
            } else if i == selected {
                format!("~~**`{}.`** {}~~", LABELS[i], choice)
            } else {
                format!("**`{}.`** {}", LABELS[i], choice)
            }
        });
        if picked_correct {
            view.description = Some(format!("{}\n\n**Correct!**", body));
            view.color = Some(CORRECT_COLOR);
        } else {
            view.description = Some(format!("{}\n\n**Nope, try again next time!**", body));
            view.color = Some(WRONG_COLOR);
        }
        Reply::view(view)
    }
}

#[async_trait]
impl ComponentHandler for TriviaPrompt {
    async fn handle(&self, event: &ComponentEvent, surface: &dyn Surface) -> Outcome {
        if event.actor_id != self.invoker {
            if let Err(e) = surface.notice(NOT_YOUR_QUESTION).await {
                warn!("Failed to send notice: {}", e);
            }
            return Outcome::Unauthorized;
        }

        let Some(selected) = event
            .control_id
            .strip_prefix("answer:")
            .and_then(|i| i.parse::<usize>().ok())
            .filter(|i| *i < self.choices.len())
        else {
            return Outcome::Acknowledged;
        };
        if self
            .answered
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            debug!(session = %event.session_id, "Question already answered");
            return Outcome::Acknowledged;
        }

        // The answer only counts once the result is on screen.
        if let Err(e) = surface.update(self.result(selected)).await {
            warn!("Failed to show trivia result: {}", e);
            self.answered.store(false, Ordering::SeqCst);
            return Outcome::Acknowledged;
        }
        Outcome::Rendered
    }
}

pub struct TriviaHandler {
    trivia: Arc<TriviaClient>,
}

impl TriviaHandler {
    pub fn new(trivia: Arc<TriviaClient>) -> Self {
        Self { trivia }
    }
}

#[async_trait]
impl CommandHandler for TriviaHandler {
    fn name(&self) -> &str {
        "trivia"
    }

    fn usage(&self) -> &str {
        "`/trivia [difficulty] [category]` - Answer a trivia question"
    }

    fn throttle(&self) -> Option<Throttle> {
        Some(Throttle::new(1, Duration::from_secs(20)))
    }

    async fn execute(&self, ctx: &CommandContext, args: &CommandArgs) -> AppResult<Reply> {
        let difficulty = args.str("difficulty").and_then(Difficulty::parse);
        let category = args.int("category").and_then(|c| u32::try_from(c).ok());

        let question = self.trivia.question(difficulty, category).await?;
        let choices = question.shuffled_choices();
        let prompt = Arc::new(TriviaPrompt::new(&ctx.user_id, question, choices));

        let reply = prompt.prompt();
        ctx.components.register(&ctx.interaction_id, prompt);
        Ok(reply)
    }
}
