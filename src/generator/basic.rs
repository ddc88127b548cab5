use super::{
    openai::{
        ChatCompletion,
        ChatRequest,
    },
    prompt::{
        basic_prompt,
        SYSTEM_PROMPT,
    },
    AI_TAG,
};
use crate::{
    anki::{
        require_model,
        Collection,
        NewNote,
    },
    config::Config,
    core::CardForgeError,
    prompter::Prompter,
};

pub const BASIC_DECK: &str = "OpenAI Generated Cards";
pub const BASIC_MODEL: &str = "Basic";

/// One question/answer card about a topic, written to [`BASIC_DECK`].
///
/// Every failure ends in exactly one message; nothing is returned to the caller.
pub fn generate_basic_card(
    collection: &dyn Collection,
    chat: &dyn ChatCompletion,
    prompter: &dyn Prompter,
    config: &Config,
) {
    if !config.has_api_key() {
        prompter.error("OpenAI API key is not set. Cannot generate card.");
        return;
    }

    let Some(topic) = prompter
        .text_input("Enter Topic", "Enter the topic for the flashcard:")
        .map(|topic| topic.trim().to_string())
        .filter(|topic| !topic.is_empty())
    else {
        return;
    };

    match add_basic_card(collection, chat, config, &topic) {
        Ok(question) => {
            tracing::info!("Added basic card '{}'", question);
            prompter.info("Added a new card from OpenAI!");
        }
        Err(CardForgeError::Json(e)) => {
            tracing::error!("Basic card reply was not valid JSON: {}", e);
            prompter.error("The response was not valid JSON.");
        }
        Err(e @ (CardForgeError::Reqwest(_) | CardForgeError::HttpStatus { .. })) => {
            tracing::error!("Basic card request failed: {}", e);
            prompter.error(&format!("OpenAI API error: {}", e));
        }
        Err(e @ CardForgeError::MissingModel(_)) => {
            tracing::error!("Basic card failed: {}", e);
            prompter.error(&format!("{}.", e));
        }
        Err(CardForgeError::MissingField(field)) => {
            tracing::error!("Basic card reply is missing '{}'", field);
            prompter.error("Failed to get valid flashcard data.");
        }
        Err(e) => {
            tracing::error!("Basic card failed: {}", e);
            prompter.error(&format!("An unexpected error occurred: {}", e));
        }
    }
}

fn add_basic_card(
    collection: &dyn Collection,
    chat: &dyn ChatCompletion,
    config: &Config,
    topic: &str,
) -> Result<String, CardForgeError> {
    let request =
        ChatRequest::new(config.model.clone(), SYSTEM_PROMPT, &basic_prompt(topic)).with_max_tokens(500);
    let reply = chat.complete(&request)?;

    let card: serde_json::Map<String, serde_json::Value> = serde_json::from_str(reply.text().trim())?;

    let text = |key: &str| {
        card.get(key)
            .and_then(|value| value.as_str())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string)
            .ok_or_else(|| CardForgeError::MissingField(key.to_string()))
    };
    let question = text("question")?;
    let answer = text("answer")?;

    let field_names = require_model(collection, BASIC_MODEL)?;
    let [front, back, ..] = field_names.as_slice() else {
        return Err(CardForgeError::Custom(format!("Note type '{}' needs two fields", BASIC_MODEL)));
    };

    collection.ensure_deck(BASIC_DECK)?;
    collection.add_note(&NewNote {
        deck_name: BASIC_DECK.to_string(),
        model_name: BASIC_MODEL.to_string(),
        fields: vec![(front.clone(), question.clone()), (back.clone(), answer)],
        tags: vec![AI_TAG.to_string()],
    })?;
    collection.refresh()?;

    Ok(question)
}
