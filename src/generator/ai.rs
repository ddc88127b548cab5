use std::collections::BTreeSet;

use rand::{
    seq::SliceRandom,
    Rng,
};

use super::{
    draft::{
        parse_json_object,
        CardDraft,
    },
    openai::{
        ChatCompletion,
        ChatRequest,
    },
    prompt::{
        card_function,
        style_prompt,
        SYSTEM_PROMPT,
    },
    AI_TAG,
};
use crate::{
    anki::{
        Collection,
        Flag,
        NewNote,
        NoteId,
        NoteQuery,
    },
    config::Config,
    core::CardForgeError,
    prompter::{
        CardPreview,
        Prompter,
    },
};

pub const EXAMPLE_COUNT: usize = 5;
pub const MAX_CARDS: u32 = 50;
const AI_FLAG: Flag = Flag::Purple;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct GenerationTally {
    pub generated: u32,
    pub duplicates_skipped: u32,
}

impl GenerationTally {
    /// Only `Added` and `Duplicate` are counted; the other outcomes leave the tally alone.
    pub fn record(&mut self, outcome: &CardOutcome) {
        match outcome {
            CardOutcome::Added(_) => self.generated += 1,
            CardOutcome::Duplicate(_) => self.duplicates_skipped += 1,
            _ => {}
        }
    }

    pub fn summary(&self) -> String {
        format!(
            "Generated {} new card(s). Skipped {} duplicate(s).",
            self.generated, self.duplicates_skipped
        )
    }
}

/// What happened to one requested card.
#[derive(Debug)]
pub enum CardOutcome {
    Added(NoteId),
    Duplicate(String),
    Declined,
    Unparseable,
    MissingFront,
    Failed(CardForgeError),
}

/// Deck, note type and field layout every generated card is written to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub deck: String,
    pub model: String,
    pub field_names: Vec<String>,
}

impl Target {
    pub fn front_field(&self) -> &str {
        self.field_names.first().map(String::as_str).unwrap_or_default()
    }
}

fn count_label() -> String {
    format!("How many cards to generate? (1-{})", MAX_CARDS)
}

/// Reads a card count typed by the user.
pub fn parse_card_count(input: &str) -> Result<u32, String> {
    let invalid = || format!("Please enter a whole number between 1 and {}.", MAX_CARDS);
    match input.trim().parse::<i64>() {
        Ok(count) if (1..=MAX_CARDS as i64).contains(&count) => Ok(count as u32),
        _ => Err(invalid()),
    }
}

/// Generates cards in the style of an existing deck.
pub struct AiCardGenerator<'a> {
    collection: &'a dyn Collection,
    chat: &'a dyn ChatCompletion,
    prompter: &'a dyn Prompter,
    config: &'a Config,
}

impl<'a> AiCardGenerator<'a> {
    pub fn new(
        collection: &'a dyn Collection,
        chat: &'a dyn ChatCompletion,
        prompter: &'a dyn Prompter,
        config: &'a Config,
    ) -> Self {
        Self { collection, chat, prompter, config }
    }

    /// Runs the whole command. `Ok(None)` means it stopped before generating,
    /// either cancelled or rejected with a message already shown.
    pub fn run(&self, rng: &mut impl Rng) -> Result<Option<GenerationTally>, CardForgeError> {
        if !self.config.has_api_key() {
            self.prompter.error("OpenAI API key is not set. Cannot generate cards.");
            return Ok(None);
        }

        let Some(deck) = self.choose_deck()? else {
            return Ok(None);
        };
        let Some(model) = self.resolve_model(&deck)? else {
            return Ok(None);
        };

        let field_names = self.collection.model_field_names(&model)?;
        if field_names.is_empty() {
            self.prompter.error(&format!("Note type '{}' has no fields.", model));
            return Ok(None);
        }
        let target = Target { deck, model, field_names };

        let examples = self.sample_examples(&target, rng)?;
        if examples.is_empty() {
            self.prompter.error(&format!(
                "Deck '{}' has no '{}' notes to use as examples.",
                target.deck, target.model
            ));
            return Ok(None);
        }

        let Some(topic) = self.ask_topic() else {
            return Ok(None);
        };
        let Some(count) = self.ask_count() else {
            return Ok(None);
        };

        let request = ChatRequest::new(
            self.config.model.clone(),
            SYSTEM_PROMPT,
            &style_prompt(&topic, &target.deck, &target.field_names, &examples),
        )
        .with_forced_function(card_function(&target.field_names));

        tracing::info!(
            "Generating {} card(s) about '{}' into '{}' ({})",
            count,
            topic,
            target.deck,
            target.model
        );

        let mut tally = GenerationTally::default();
        for index in 1..=count {
            let outcome = self.generate_one(&target, &request, index, count);
            tracing::debug!("Card {}/{}: {:?}", index, count, outcome);
            tally.record(&outcome);
        }

        if let Err(e) = self.collection.refresh() {
            tracing::warn!("Anki refresh failed: {}", e);
        }
        tracing::info!("{}", tally.summary());
        self.prompter.info(&tally.summary());

        Ok(Some(tally))
    }

    fn choose_deck(&self) -> Result<Option<String>, CardForgeError> {
        let decks = self.collection.deck_names()?;
        if decks.is_empty() {
            self.prompter.error("No decks found. Create a deck with a few notes first.");
            return Ok(None);
        }

        Ok(self
            .prompter
            .select("Select Deck", "Generate cards for which deck?", &decks)
            .and_then(|index| decks.get(index).cloned()))
    }

    fn resolve_model(&self, deck: &str) -> Result<Option<String>, CardForgeError> {
        let note_ids = self.collection.find_notes(&NoteQuery::in_deck(deck))?;
        let models: Vec<String> = self
            .collection
            .notes_info(&note_ids)?
            .into_iter()
            .map(|note| note.model_name)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        match models.as_slice() {
            [] => {
                self.prompter.error(&format!(
                    "Deck '{}' has no notes. Add at least one note to use as a template.",
                    deck
                ));
                Ok(None)
            }
            [only] => Ok(Some(only.clone())),
            _ => Ok(self
                .prompter
                .select("Select Note Type", "The deck uses several note types. Pick one:", &models)
                .and_then(|index| models.get(index).cloned())),
        }
    }

    fn sample_examples(
        &self,
        target: &Target,
        rng: &mut impl Rng,
    ) -> Result<Vec<CardDraft>, CardForgeError> {
        let mut sample = self
            .collection
            .find_notes(&NoteQuery::in_deck(&target.deck).with_model(&target.model))?;
        sample.shuffle(rng);
        sample.truncate(EXAMPLE_COUNT);

        Ok(self
            .collection
            .notes_info(&sample)?
            .iter()
            .map(|note| CardDraft::from_note(note, &target.field_names))
            .collect())
    }

    fn ask_topic(&self) -> Option<String> {
        self.prompter
            .text_input("Enter Topic", "Enter the topic for the flashcards:")
            .map(|topic| topic.trim().to_string())
            .filter(|topic| !topic.is_empty())
    }

    fn ask_count(&self) -> Option<u32> {
        let input = self.prompter.text_input("Number of Cards", &count_label())?;
        match parse_card_count(&input) {
            Ok(count) => Some(count),
            Err(message) => {
                self.prompter.error(&message);
                None
            }
        }
    }

    fn generate_one(
        &self,
        target: &Target,
        request: &ChatRequest,
        index: u32,
        count: u32,
    ) -> CardOutcome {
        let reply = match self.chat.complete(request) {
            Ok(reply) => reply,
            Err(e) => {
                tracing::error!("Card {}/{}: request failed: {}", index, count, e);
                self.prompter.error(&format!("Card {}/{}: OpenAI API error: {}", index, count, e));
                return CardOutcome::Failed(e);
            }
        };

        let Some(object) = parse_json_object(reply.text()) else {
            tracing::error!(
                "Card {}/{}: reply was not valid JSON\nprompt: {}\nresponse: {}",
                index,
                count,
                request.user_prompt(),
                reply.text()
            );
            self.prompter.info(&format!(
                "Card {}/{}: the response was not valid JSON, skipping it.",
                index, count
            ));
            return CardOutcome::Unparseable;
        };

        let mut draft = CardDraft::from_json(&object, &target.field_names);
        let front_field = target.front_field();
        let front = draft.get(front_field).unwrap_or_default().trim().to_string();
        if front.is_empty() {
            tracing::warn!("Card {}/{}: empty '{}' in {:?}", index, count, front_field, object);
            self.prompter.info(&format!(
                "Card {}/{}: the generated card has no '{}', skipping it.",
                index, count, front_field
            ));
            return CardOutcome::MissingFront;
        }
        draft.set(front_field, front.clone());

        let duplicate_query = NoteQuery::in_deck(&target.deck).with_field(front_field, &front);
        match self.collection.find_notes(&duplicate_query) {
            Ok(existing) if !existing.is_empty() => {
                tracing::info!("Card {}/{}: '{}' already exists", index, count, front);
                self.prompter.info(&format!(
                    "Card {}/{}: '{}' already exists in '{}', skipping it.",
                    index, count, front, target.deck
                ));
                return CardOutcome::Duplicate(front);
            }
            Ok(_) => {}
            Err(e) => return self.host_failure(index, count, e),
        }

        let tags = vec![AI_TAG.to_string()];
        if self.config.preview_enabled {
            let preview = CardPreview {
                deck: target.deck.clone(),
                fields: draft.fields().to_vec(),
                tags: tags.clone(),
            };
            if !self.prompter.preview(&preview) {
                tracing::info!("Card {}/{}: declined in preview", index, count);
                return CardOutcome::Declined;
            }
        }

        let note = NewNote {
            deck_name: target.deck.clone(),
            model_name: target.model.clone(),
            fields: draft.into_fields(),
            tags,
        };
        let note_id = match self.collection.add_note(&note) {
            Ok(id) => id,
            Err(e) => return self.host_failure(index, count, e),
        };
        if let Err(e) = self.collection.set_flag(note_id, AI_FLAG) {
            tracing::warn!("Card {}/{}: could not flag note {}: {}", index, count, note_id, e);
        }

        tracing::info!("Card {}/{}: added note {} '{}'", index, count, note_id, front);
        CardOutcome::Added(note_id)
    }

    fn host_failure(&self, index: u32, count: u32, error: CardForgeError) -> CardOutcome {
        tracing::error!("Card {}/{}: Anki error: {}", index, count, error);
        self.prompter.error(&format!("Card {}/{}: Anki error: {}", index, count, error));
        CardOutcome::Failed(error)
    }
}

#[cfg(test)]
mod tests {
    use rand::{
        rngs::StdRng,
        SeedableRng,
    };

    use super::*;
    use crate::{
        prompter::MessageKind,
        testing::{
            Answer,
            FakeCollection,
            ScriptedChat,
            ScriptedPrompter,
        },
    };

    fn config() -> Config {
        Config { api_key: "sk-test".to_string(), ..Config::default() }
    }

    fn rng() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    fn geography() -> FakeCollection {
        FakeCollection::new()
            .with_model("Basic", &["Front", "Back"])
            .with_deck("Geography")
            .with_note("Geography", "Basic", &["Capital of France?", "Paris"])
            .with_note("Geography", "Basic", &["Capital of Peru?", "Lima"])
    }

    fn answers(count: &str) -> Vec<Answer> {
        vec![
            Answer::Select(Some(0)),
            Answer::Text(Some("capitals".to_string())),
            Answer::Text(Some(count.to_string())),
        ]
    }

    #[test]
    fn test_parse_card_count() {
        assert_eq!(parse_card_count(" 3 "), Ok(3));
        assert_eq!(parse_card_count("50"), Ok(50));
        assert!(parse_card_count("0").is_err());
        assert!(parse_card_count("-2").is_err());
        assert!(parse_card_count("three").is_err());
        assert!(parse_card_count("2.5").is_err());
        assert!(parse_card_count("51").is_err());
    }

    #[test]
    fn test_count_prompt_shows_the_limit() {
        assert!(count_label().ends_with("(1-50)"));
    }

    #[test]
    fn test_generates_and_tags_cards() {
        let collection = geography();
        let chat = ScriptedChat::new(vec![ScriptedChat::arguments(
            r#"{"Front": "Capital of Japan?", "Back": "Tokyo"}"#,
        )]);
        let prompter = ScriptedPrompter::new(answers("1"));
        let config = config();

        let tally = AiCardGenerator::new(&collection, &chat, &prompter, &config)
            .run(&mut rng())
            .unwrap()
            .unwrap();

        assert_eq!(tally, GenerationTally { generated: 1, duplicates_skipped: 0 });
        let notes = collection.notes_in("Geography");
        let added = notes.iter().find(|n| n.field("Front") == Some("Capital of Japan?")).unwrap();
        assert_eq!(added.field("Back"), Some("Tokyo"));
        assert_eq!(added.tags, vec![AI_TAG.to_string()]);
        assert_eq!(collection.flags.borrow().as_slice(), &[(added.note_id, Flag::Purple)]);
        assert_eq!(collection.refreshes.get(), 1);
        assert_eq!(
            prompter.messages().last().unwrap().1,
            "Generated 1 new card(s). Skipped 0 duplicate(s)."
        );
    }

    #[test]
    fn test_request_carries_schema_and_examples() {
        let collection = geography();
        let chat = ScriptedChat::new(vec![ScriptedChat::content(
            r#"{"Front": "Capital of Chile?", "Back": "Santiago"}"#,
        )]);
        let prompter = ScriptedPrompter::new(answers("1"));
        let config = config();

        AiCardGenerator::new(&collection, &chat, &prompter, &config).run(&mut rng()).unwrap();

        let requests = chat.requests.borrow();
        let request = &requests[0];
        assert_eq!(request.model, config.model);
        assert_eq!(request.messages[0].content, SYSTEM_PROMPT);
        assert!(request.user_prompt().contains("Capital of France?"));
        assert!(request.user_prompt().contains("Capital of Peru?"));
        assert_eq!(request.tools[0].function.parameters["required"], serde_json::json!(["Front", "Back"]));
    }

    #[test]
    fn test_empty_deck_aborts_before_any_request() {
        let collection = FakeCollection::new().with_model("Basic", &["Front", "Back"]).with_deck("Empty");
        let chat = ScriptedChat::new(vec![]);
        let prompter = ScriptedPrompter::new(vec![Answer::Select(Some(0))]);
        let config = config();

        let result = AiCardGenerator::new(&collection, &chat, &prompter, &config).run(&mut rng());

        assert!(result.unwrap().is_none());
        assert_eq!(chat.request_count(), 0);
        assert_eq!(collection.note_count(), 0);
        assert_eq!(prompter.messages().len(), 1);
        assert_eq!(prompter.messages()[0].0, MessageKind::Error);
    }

    #[test]
    fn test_no_decks_aborts_with_message() {
        let collection = FakeCollection::new();
        let chat = ScriptedChat::new(vec![]);
        let prompter = ScriptedPrompter::new(vec![]);
        let config = config();

        let result = AiCardGenerator::new(&collection, &chat, &prompter, &config).run(&mut rng());

        assert!(result.unwrap().is_none());
        assert_eq!(prompter.messages().len(), 1);
        assert_eq!(chat.request_count(), 0);
    }

    #[test]
    fn test_missing_api_key_aborts_before_prompting() {
        let collection = geography();
        let chat = ScriptedChat::new(vec![]);
        let prompter = ScriptedPrompter::new(vec![]);
        let config = Config::default();

        let result = AiCardGenerator::new(&collection, &chat, &prompter, &config).run(&mut rng());

        assert!(result.unwrap().is_none());
        assert_eq!(prompter.messages().len(), 1);
        assert_eq!(chat.request_count(), 0);
    }

    #[test]
    fn test_cancelled_deck_selection_is_silent() {
        let collection = geography();
        let chat = ScriptedChat::new(vec![]);
        let prompter = ScriptedPrompter::new(vec![Answer::Select(None)]);
        let config = config();

        let result = AiCardGenerator::new(&collection, &chat, &prompter, &config).run(&mut rng());

        assert!(result.unwrap().is_none());
        assert!(prompter.messages().is_empty());
    }

    #[test]
    fn test_invalid_count_aborts_before_any_request() {
        let collection = geography();
        let chat = ScriptedChat::new(vec![]);
        let prompter = ScriptedPrompter::new(answers("-1"));
        let config = config();

        let result = AiCardGenerator::new(&collection, &chat, &prompter, &config).run(&mut rng());

        assert!(result.unwrap().is_none());
        assert_eq!(chat.request_count(), 0);
        assert_eq!(
            prompter.messages(),
            vec![(MessageKind::Error, "Please enter a whole number between 1 and 50.".to_string())]
        );
    }

    #[test]
    fn test_several_note_types_ask_which_one() {
        let collection = geography()
            .with_model("Vocab", &["Word", "Meaning", "Example"])
            .with_note("Geography", "Vocab", &["montaña", "mountain", "La montaña es alta."]);
        let chat = ScriptedChat::new(vec![ScriptedChat::arguments(
            r#"{"Word": "río", "Meaning": "river", "Example": "El río es largo."}"#,
        )]);
        // Note types are offered sorted: Basic, Vocab.
        let prompter = ScriptedPrompter::new(vec![
            Answer::Select(Some(0)),
            Answer::Select(Some(1)),
            Answer::Text(Some("nature".to_string())),
            Answer::Text(Some("1".to_string())),
        ]);
        let config = config();

        let tally = AiCardGenerator::new(&collection, &chat, &prompter, &config)
            .run(&mut rng())
            .unwrap()
            .unwrap();

        assert_eq!(tally.generated, 1);
        let prompt = chat.requests.borrow()[0].user_prompt().to_string();
        assert!(prompt.contains("montaña"));
        assert!(!prompt.contains("Capital of France?"));
        assert!(collection
            .notes_in("Geography")
            .iter()
            .any(|n| n.model_name == "Vocab" && n.field("Word") == Some("río")));
    }

    #[test]
    fn test_samples_at_most_five_examples() {
        let mut collection = FakeCollection::new().with_model("Basic", &["Front", "Back"]).with_deck("Big");
        for i in 0..12 {
            let front = format!("Question {i}");
            collection = collection.with_note("Big", "Basic", &[front.as_str(), "answer"]);
        }
        let chat = ScriptedChat::new(vec![ScriptedChat::content(r#"{"Front": "New", "Back": "x"}"#)]);
        let prompter = ScriptedPrompter::new(answers("1"));
        let config = config();

        AiCardGenerator::new(&collection, &chat, &prompter, &config).run(&mut rng()).unwrap();

        let prompt = chat.requests.borrow()[0].user_prompt().to_string();
        let shown = (0..12).filter(|i| prompt.contains(&format!("\"Question {i}\""))).count();
        assert_eq!(shown, EXAMPLE_COUNT);
    }

    #[test]
    fn test_duplicate_front_is_skipped_and_counted() {
        let collection = geography();
        let chat = ScriptedChat::new(vec![ScriptedChat::content(
            r#"{"Front": "Capital of France?", "Back": "Paris, again"}"#,
        )]);
        let prompter = ScriptedPrompter::new(answers("1"));
        let config = config();

        let tally = AiCardGenerator::new(&collection, &chat, &prompter, &config)
            .run(&mut rng())
            .unwrap()
            .unwrap();

        assert_eq!(tally, GenerationTally { generated: 0, duplicates_skipped: 1 });
        assert_eq!(collection.note_count(), 2);
        assert!(collection.flags.borrow().is_empty());
    }

    #[test]
    fn test_malformed_reply_is_skipped_and_loop_continues() {
        let collection = geography();
        let chat = ScriptedChat::new(vec![
            ScriptedChat::content("Sorry, I can only answer in prose today."),
            ScriptedChat::content(r#"{"Front": "Capital of Kenya?", "Back": "Nairobi"}"#),
        ]);
        let prompter = ScriptedPrompter::new(answers("2"));
        let config = config();

        let tally = AiCardGenerator::new(&collection, &chat, &prompter, &config)
            .run(&mut rng())
            .unwrap()
            .unwrap();

        assert_eq!(chat.request_count(), 2);
        assert_eq!(tally.generated, 1);
        assert_eq!(collection.note_count(), 3);
    }

    #[test]
    fn test_mixed_batch_summary_leaves_parse_failures_uncounted() {
        let collection = geography();
        let chat = ScriptedChat::new(vec![
            ScriptedChat::content(r#"{"Front": "Capital of Peru?", "Back": "Lima"}"#),
            ScriptedChat::content("no json here"),
            ScriptedChat::arguments(r#"{"Front": "Capital of Egypt?", "Back": "Cairo"}"#),
        ]);
        let prompter = ScriptedPrompter::new(answers("3"));
        let config = config();

        let tally = AiCardGenerator::new(&collection, &chat, &prompter, &config)
            .run(&mut rng())
            .unwrap()
            .unwrap();

        assert_eq!(tally, GenerationTally { generated: 1, duplicates_skipped: 1 });
        assert_eq!(
            prompter.messages().last().unwrap().1,
            "Generated 1 new card(s). Skipped 1 duplicate(s)."
        );
        assert_eq!(collection.refreshes.get(), 1);
    }

    #[test]
    fn test_request_errors_do_not_stop_the_loop() {
        let collection = geography();
        let chat = ScriptedChat::new(vec![
            Err(CardForgeError::HttpStatus { status: 429, body: "rate limited".to_string() }),
            ScriptedChat::content(r#"{"Front": "Capital of Chad?", "Back": "N'Djamena"}"#),
        ]);
        let prompter = ScriptedPrompter::new(answers("2"));
        let config = config();

        let tally = AiCardGenerator::new(&collection, &chat, &prompter, &config)
            .run(&mut rng())
            .unwrap()
            .unwrap();

        assert_eq!(tally.generated, 1);
        assert!(prompter
            .messages()
            .iter()
            .any(|(kind, text)| *kind == MessageKind::Error && text.contains("429")));
    }

    #[test]
    fn test_blank_front_is_skipped() {
        let collection = geography();
        let chat = ScriptedChat::new(vec![ScriptedChat::content(r#"{"Front": "   ", "Back": "?"}"#)]);
        let prompter = ScriptedPrompter::new(answers("1"));
        let config = config();

        let tally = AiCardGenerator::new(&collection, &chat, &prompter, &config)
            .run(&mut rng())
            .unwrap()
            .unwrap();

        assert_eq!(tally, GenerationTally::default());
        assert_eq!(collection.note_count(), 2);
    }

    #[test]
    fn test_preview_decline_skips_without_counting() {
        let collection = geography();
        let chat = ScriptedChat::new(vec![
            ScriptedChat::content(r#"{"Front": "Capital of Italy?", "Back": "Rome"}"#),
            ScriptedChat::content(r#"{"Front": "Capital of Spain?", "Back": "Madrid"}"#),
        ]);
        let mut script = answers("2");
        script.push(Answer::Preview(false));
        script.push(Answer::Preview(true));
        let prompter = ScriptedPrompter::new(script);
        let config = Config { preview_enabled: true, ..config() };

        let tally = AiCardGenerator::new(&collection, &chat, &prompter, &config)
            .run(&mut rng())
            .unwrap()
            .unwrap();

        assert_eq!(tally, GenerationTally { generated: 1, duplicates_skipped: 0 });
        let previews = prompter.previews();
        assert_eq!(previews.len(), 2);
        assert_eq!(previews[0].deck, "Geography");
        assert_eq!(
            previews[0].fields,
            vec![
                ("Front".to_string(), "Capital of Italy?".to_string()),
                ("Back".to_string(), "Rome".to_string()),
            ]
        );
        assert_eq!(previews[0].tags, vec![AI_TAG.to_string()]);
        assert!(collection.notes_in("Geography").iter().all(|n| n.field("Front") != Some("Capital of Italy?")));
        assert_eq!(prompter.remaining_answers(), 0);
    }
}
