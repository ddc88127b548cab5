use rand::{
    seq::SliceRandom,
    Rng,
};
use reqwest::blocking::Client;
use serde::Deserialize;

use crate::{
    anki::{
        require_model,
        Collection,
        Flag,
        NewNote,
        NoteId,
    },
    core::{
        http::{
            ensure_success,
            http_client,
        },
        CardForgeError,
    },
    prompter::Prompter,
};

const TRIVIA_URL: &str = "https://opentdb.com/api.php?amount=1&type=multiple";

pub const TRIVIA_DECK: &str = "Trivia";
pub const TRIVIA_MODEL: &str = "Basic";
const TRIVIA_FLAG: Flag = Flag::Blue;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TriviaQuestion {
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub difficulty: String,
    pub question: String,
    pub correct_answer: String,
    pub incorrect_answers: Vec<String>,
}

impl TriviaQuestion {
    /// Correct and incorrect answers in a uniformly random order.
    pub fn shuffled_options(&self, rng: &mut impl Rng) -> Vec<String> {
        let mut options = Vec::with_capacity(self.incorrect_answers.len() + 1);
        options.push(self.correct_answer.clone());
        options.extend(self.incorrect_answers.iter().cloned());
        options.shuffle(rng);
        options
    }

    pub fn tags(&self) -> Vec<String> {
        let mut tags = vec!["trivia".to_string()];
        for label in [&self.category, &self.difficulty] {
            let slug = tag_slug(label);
            if !slug.is_empty() {
                tags.push(format!("trivia::{slug}"));
            }
        }
        tags
    }
}

// Anki tags cannot contain spaces, and `::` would nest them.
fn tag_slug(label: &str) -> String {
    label
        .split(|c: char| !c.is_alphanumeric())
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>()
        .join("_")
}

#[derive(Debug, Deserialize)]
struct TriviaResponse {
    #[serde(default)]
    response_code: u32,
    results: Vec<TriviaQuestion>,
}

pub fn parse_trivia_body(body: &str) -> Result<TriviaQuestion, CardForgeError> {
    let response: TriviaResponse = serde_json::from_str(body)?;
    if response.response_code != 0 {
        return Err(CardForgeError::Custom(format!(
            "Open Trivia DB returned response code {}",
            response.response_code
        )));
    }
    response.results.into_iter().next().ok_or_else(|| CardForgeError::MissingField("results".to_string()))
}

pub fn format_back(correct_answer: &str, options: &[String]) -> String {
    let mut back = format!("Correct Answer: {}\nOptions:", correct_answer);
    for (number, option) in options.iter().enumerate() {
        back.push_str(&format!("\n{}. {}", number + 1, option));
    }
    back
}

pub trait TriviaSource {
    fn fetch(&self) -> Result<TriviaQuestion, CardForgeError>;
}

pub struct OpenTdbClient {
    client: Client,
}

impl OpenTdbClient {
    pub fn new() -> Result<Self, CardForgeError> {
        Ok(Self { client: http_client()? })
    }
}

impl TriviaSource for OpenTdbClient {
    fn fetch(&self) -> Result<TriviaQuestion, CardForgeError> {
        let response = ensure_success(self.client.get(TRIVIA_URL).send()?)?;
        let body = response.text()?;
        tracing::debug!("Trivia response: {}", body);
        parse_trivia_body(&body)
    }
}

/// Fetches one question and files it in [`TRIVIA_DECK`].
///
/// Every failure ends in exactly one message and no note.
pub fn generate_trivia_card(
    source: &dyn TriviaSource,
    collection: &dyn Collection,
    prompter: &dyn Prompter,
    rng: &mut impl Rng,
) {
    let question = match source.fetch() {
        Ok(question) => question,
        Err(e) => {
            tracing::error!("Failed to fetch trivia question: {}", e);
            prompter.error("Failed to fetch trivia question.");
            return;
        }
    };

    match add_trivia_card(collection, &question, rng) {
        Ok(note_id) => {
            tracing::info!("Added trivia note {}: {}", note_id, question.question);
            prompter.info("Added a new trivia card!");
        }
        Err(e @ CardForgeError::MissingModel(_)) => {
            tracing::error!("Trivia card failed: {}", e);
            prompter.error(&format!("{}.", e));
        }
        Err(e) => {
            tracing::error!("Trivia card failed: {}", e);
            prompter.error(&format!("Failed to add trivia card: {}", e));
        }
    }
}

fn add_trivia_card(
    collection: &dyn Collection,
    question: &TriviaQuestion,
    rng: &mut impl Rng,
) -> Result<NoteId, CardForgeError> {
    let field_names = require_model(collection, TRIVIA_MODEL)?;
    let [front, back, ..] = field_names.as_slice() else {
        return Err(CardForgeError::Custom(format!("Note type '{}' needs two fields", TRIVIA_MODEL)));
    };

    let options = question.shuffled_options(rng);
    // Fields hold HTML; Open Trivia DB text is already entity-encoded.
    let back_html = format_back(&question.correct_answer, &options).replace('\n', "<br>");

    collection.ensure_deck(TRIVIA_DECK)?;
    let note_id = collection.add_note(&NewNote {
        deck_name: TRIVIA_DECK.to_string(),
        model_name: TRIVIA_MODEL.to_string(),
        fields: vec![(front.clone(), question.question.clone()), (back.clone(), back_html)],
        tags: question.tags(),
    })?;

    if let Err(e) = collection.set_flag(note_id, TRIVIA_FLAG) {
        tracing::warn!("Could not flag trivia note {}: {}", note_id, e);
    }
    if let Err(e) = collection.refresh() {
        tracing::warn!("Anki refresh failed: {}", e);
    }

    Ok(note_id)
}
