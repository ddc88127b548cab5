use std::collections::HashMap;

use serde::{
    Deserialize,
    Serialize,
};

pub type NoteId = u64;
pub type CardId = u64;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Field {
    pub value: String,
    pub order: u32,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NoteInfo {
    pub note_id: NoteId,
    pub model_name: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub fields: HashMap<String, Field>,
    #[serde(default)]
    pub cards: Vec<CardId>,
}

impl NoteInfo {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(|f| f.value.as_str())
    }
}

/// A note that does not exist in the collection yet. Fields are keyed by name.
#[derive(Debug, Clone, PartialEq)]
pub struct NewNote {
    pub deck_name: String,
    pub model_name: String,
    pub fields: Vec<(String, String)>,
    pub tags: Vec<String>,
}

/// Anki's coloured card flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flag {
    Red = 1,
    Orange = 2,
    Green = 3,
    Blue = 4,
    Pink = 5,
    Turquoise = 6,
    Purple = 7,
}

impl Flag {
    pub fn number(self) -> u8 {
        self as u8
    }
}
