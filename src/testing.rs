//! In-memory stand-ins for Anki, the chat API and the dialogs.

use std::{
    cell::{
        Cell,
        RefCell,
    },
    collections::{
        HashMap,
        VecDeque,
    },
};

use crate::{
    anki::{
        types::Field,
        Collection,
        Flag,
        NewNote,
        NoteId,
        NoteInfo,
        NoteQuery,
    },
    core::CardForgeError,
    generator::openai::{
        ChatCompletion,
        ChatReply,
        ChatRequest,
    },
    prompter::{
        CardPreview,
        MessageKind,
        Prompter,
    },
};

#[derive(Debug, Clone)]
pub enum Answer {
    Text(Option<String>),
    Select(Option<usize>),
    Preview(bool),
}

/// Answers prompts from a queue and records every message.
pub struct ScriptedPrompter {
    answers: RefCell<VecDeque<Answer>>,
    messages: RefCell<Vec<(MessageKind, String)>>,
    previews: RefCell<Vec<CardPreview>>,
}

impl ScriptedPrompter {
    pub fn new(answers: Vec<Answer>) -> Self {
        Self {
            answers: RefCell::new(answers.into()),
            messages: RefCell::new(Vec::new()),
            previews: RefCell::new(Vec::new()),
        }
    }

    pub fn messages(&self) -> Vec<(MessageKind, String)> {
        self.messages.borrow().clone()
    }

    pub fn previews(&self) -> Vec<CardPreview> {
        self.previews.borrow().clone()
    }

    pub fn remaining_answers(&self) -> usize {
        self.answers.borrow().len()
    }

    fn next(&self, asked: &str) -> Answer {
        self.answers
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| panic!("No scripted answer left for {asked}"))
    }
}

impl Prompter for ScriptedPrompter {
    fn text_input(&self, title: &str, _label: &str) -> Option<String> {
        match self.next(title) {
            Answer::Text(text) => text,
            other => panic!("Expected a text answer for '{title}', got {other:?}"),
        }
    }

    fn select(&self, title: &str, _label: &str, options: &[String]) -> Option<usize> {
        match self.next(title) {
            Answer::Select(choice) => {
                if let Some(index) = choice {
                    assert!(index < options.len(), "Scripted choice {index} out of range");
                }
                choice
            }
            other => panic!("Expected a selection for '{title}', got {other:?}"),
        }
    }

    fn preview(&self, card: &CardPreview) -> bool {
        self.previews.borrow_mut().push(card.clone());
        match self.next("preview") {
            Answer::Preview(accept) => accept,
            other => panic!("Expected a preview answer, got {other:?}"),
        }
    }

    fn message(&self, kind: MessageKind, message: &str) {
        self.messages.borrow_mut().push((kind, message.to_string()));
    }
}

struct StoredNote {
    deck: String,
    info: NoteInfo,
}

/// A tiny Anki collection. Decks hold notes; note types are declared up front.
pub struct FakeCollection {
    decks: RefCell<Vec<String>>,
    models: HashMap<String, Vec<String>>,
    notes: RefCell<Vec<StoredNote>>,
    next_id: Cell<NoteId>,
    pub flags: RefCell<Vec<(NoteId, Flag)>>,
    pub refreshes: Cell<usize>,
}

impl FakeCollection {
    pub fn new() -> Self {
        Self {
            decks: RefCell::new(Vec::new()),
            models: HashMap::new(),
            notes: RefCell::new(Vec::new()),
            next_id: Cell::new(1000),
            flags: RefCell::new(Vec::new()),
            refreshes: Cell::new(0),
        }
    }

    pub fn with_model(mut self, name: &str, fields: &[&str]) -> Self {
        self.models.insert(name.to_string(), fields.iter().map(|f| f.to_string()).collect());
        self
    }

    pub fn with_deck(self, name: &str) -> Self {
        self.decks.borrow_mut().push(name.to_string());
        self
    }

    /// Adds an existing note; `values` line up with the model's fields.
    pub fn with_note(self, deck: &str, model: &str, values: &[&str]) -> Self {
        let fields: Vec<(String, String)> = self.models[model]
            .iter()
            .zip(values)
            .map(|(name, value)| (name.clone(), value.to_string()))
            .collect();
        let note = NewNote {
            deck_name: deck.to_string(),
            model_name: model.to_string(),
            fields,
            tags: Vec::new(),
        };
        self.add_note(&note).unwrap();
        self
    }

    pub fn notes_in(&self, deck: &str) -> Vec<NoteInfo> {
        self.notes.borrow().iter().filter(|n| n.deck == deck).map(|n| n.info.clone()).collect()
    }

    pub fn note_count(&self) -> usize {
        self.notes.borrow().len()
    }
}

impl Collection for FakeCollection {
    fn version(&self) -> Result<u32, CardForgeError> {
        Ok(6)
    }

    fn deck_names(&self) -> Result<Vec<String>, CardForgeError> {
        let mut names = self.decks.borrow().clone();
        names.sort();
        Ok(names)
    }

    fn ensure_deck(&self, name: &str) -> Result<u64, CardForgeError> {
        let mut decks = self.decks.borrow_mut();
        if let Some(index) = decks.iter().position(|d| d == name) {
            return Ok(index as u64 + 1);
        }
        decks.push(name.to_string());
        Ok(decks.len() as u64)
    }

    fn find_notes(&self, query: &NoteQuery) -> Result<Vec<NoteId>, CardForgeError> {
        Ok(self
            .notes
            .borrow()
            .iter()
            .filter(|n| n.deck == query.deck)
            .filter(|n| query.model.as_ref().map_or(true, |m| &n.info.model_name == m))
            .filter(|n| {
                query
                    .field_equals
                    .as_ref()
                    .map_or(true, |(field, value)| n.info.field(field) == Some(value.as_str()))
            })
            .map(|n| n.info.note_id)
            .collect())
    }

    fn notes_info(&self, note_ids: &[NoteId]) -> Result<Vec<NoteInfo>, CardForgeError> {
        let notes = self.notes.borrow();
        Ok(note_ids
            .iter()
            .filter_map(|id| notes.iter().find(|n| n.info.note_id == *id))
            .map(|n| n.info.clone())
            .collect())
    }

    fn model_names(&self) -> Result<Vec<String>, CardForgeError> {
        Ok(self.models.keys().cloned().collect())
    }

    fn model_field_names(&self, model_name: &str) -> Result<Vec<String>, CardForgeError> {
        self.models
            .get(model_name)
            .cloned()
            .ok_or_else(|| CardForgeError::AnkiConnect(format!("model was not found: {model_name}")))
    }

    fn add_note(&self, note: &NewNote) -> Result<NoteId, CardForgeError> {
        if !self.decks.borrow().contains(&note.deck_name) {
            return Err(CardForgeError::AnkiConnect(format!(
                "deck was not found: {}",
                note.deck_name
            )));
        }
        let id = self.next_id.get();
        self.next_id.set(id + 1);

        let fields = note
            .fields
            .iter()
            .enumerate()
            .map(|(order, (name, value))| {
                (name.clone(), Field { value: value.clone(), order: order as u32 })
            })
            .collect();

        self.notes.borrow_mut().push(StoredNote {
            deck: note.deck_name.clone(),
            info: NoteInfo {
                note_id: id,
                model_name: note.model_name.clone(),
                tags: note.tags.clone(),
                fields,
                cards: vec![id * 10],
            },
        });
        Ok(id)
    }

    fn set_flag(&self, note_id: NoteId, flag: Flag) -> Result<(), CardForgeError> {
        self.flags.borrow_mut().push((note_id, flag));
        Ok(())
    }

    fn refresh(&self) -> Result<(), CardForgeError> {
        self.refreshes.set(self.refreshes.get() + 1);
        Ok(())
    }
}

/// Replays canned replies and records every request.
pub struct ScriptedChat {
    replies: RefCell<VecDeque<Result<ChatReply, CardForgeError>>>,
    pub requests: RefCell<Vec<ChatRequest>>,
}

impl ScriptedChat {
    pub fn new(replies: Vec<Result<ChatReply, CardForgeError>>) -> Self {
        Self { replies: RefCell::new(replies.into()), requests: RefCell::new(Vec::new()) }
    }

    pub fn content(text: &str) -> Result<ChatReply, CardForgeError> {
        Ok(ChatReply::Content(text.to_string()))
    }

    pub fn arguments(text: &str) -> Result<ChatReply, CardForgeError> {
        Ok(ChatReply::FunctionArguments(text.to_string()))
    }

    pub fn request_count(&self) -> usize {
        self.requests.borrow().len()
    }
}

impl ChatCompletion for ScriptedChat {
    fn complete(&self, request: &ChatRequest) -> Result<ChatReply, CardForgeError> {
        self.requests.borrow_mut().push(request.clone());
        self.replies.borrow_mut().pop_front().unwrap_or_else(|| {
            Err(CardForgeError::Custom("No scripted chat reply left".to_string()))
        })
    }
}
