use std::time::Duration;

use reqwest::blocking::Client;
use serde::{
    Deserialize,
    Serialize,
};

use super::{
    query::NoteQuery,
    types::{
        CardId,
        Flag,
        NewNote,
        NoteId,
        NoteInfo,
    },
    Collection,
};
use crate::core::{
    http::{
        ensure_success,
        http_client,
        http_client_with_timeout,
    },
    CardForgeError,
};

pub const DEFAULT_URL: &str = "http://localhost:8765";
const API_VERSION: u32 = 6;

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub result: Option<T>,
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    /// A non-null `error` wins over any result.
    pub fn into_result(self) -> Result<Option<T>, CardForgeError> {
        match self.error {
            Some(error) => Err(CardForgeError::AnkiConnect(error)),
            None => Ok(self.result),
        }
    }
}

/// Client for the AnkiConnect add-on.
pub struct AnkiConnect {
    client: Client,
    url: String,
}

impl AnkiConnect {
    pub fn new(url: impl Into<String>) -> Result<Self, CardForgeError> {
        Ok(Self { client: http_client()?, url: url.into() })
    }

    /// For quick checks that must give up before the default request timeout.
    pub fn with_timeout(url: impl Into<String>, timeout: Duration) -> Result<Self, CardForgeError> {
        Ok(Self { client: http_client_with_timeout(timeout)?, url: url.into() })
    }

    fn make_request<T: for<'de> Deserialize<'de>>(
        &self,
        action: &str,
        params: Option<serde_json::Value>,
    ) -> Result<Option<T>, CardForgeError> {
        let mut body = serde_json::Map::new();
        body.insert("action".to_string(), serde_json::Value::String(action.to_string()));
        body.insert("version".to_string(), serde_json::Value::Number(API_VERSION.into()));

        if let Some(params) = params {
            body.insert("params".to_string(), params);
        }

        tracing::debug!("AnkiConnect request: {}", action);
        let response = ensure_success(self.client.post(&self.url).json(&body).send()?)?;
        let response: ApiResponse<T> = response.json()?;

        response.into_result()
    }

    fn card_ids(&self, note_id: NoteId) -> Result<Vec<CardId>, CardForgeError> {
        let params = serde_json::json!({ "query": format!("nid:{}", note_id) });
        Ok(self.make_request("findCards", Some(params))?.unwrap_or_default())
    }
}

impl Collection for AnkiConnect {
    fn version(&self) -> Result<u32, CardForgeError> {
        Ok(self.make_request("version", None)?.unwrap_or_default())
    }

    fn deck_names(&self) -> Result<Vec<String>, CardForgeError> {
        let mut names: Vec<String> = self.make_request("deckNames", None)?.unwrap_or_default();
        names.sort();
        Ok(names)
    }

    fn ensure_deck(&self, name: &str) -> Result<u64, CardForgeError> {
        let params = serde_json::json!({ "deck": name });
        self.make_request("createDeck", Some(params))?
            .ok_or_else(|| CardForgeError::AnkiConnect(format!("createDeck '{}' returned no id", name)))
    }

    fn find_notes(&self, query: &NoteQuery) -> Result<Vec<NoteId>, CardForgeError> {
        let params = serde_json::json!({ "query": query.to_search() });
        Ok(self.make_request("findNotes", Some(params))?.unwrap_or_default())
    }

    fn notes_info(&self, note_ids: &[NoteId]) -> Result<Vec<NoteInfo>, CardForgeError> {
        if note_ids.is_empty() {
            return Ok(Vec::new());
        }
        let params = serde_json::json!({ "notes": note_ids });
        Ok(self.make_request("notesInfo", Some(params))?.unwrap_or_default())
    }

    fn model_names(&self) -> Result<Vec<String>, CardForgeError> {
        Ok(self.make_request("modelNames", None)?.unwrap_or_default())
    }

    fn model_field_names(&self, model_name: &str) -> Result<Vec<String>, CardForgeError> {
        let params = serde_json::json!({ "modelName": model_name });
        Ok(self.make_request("modelFieldNames", Some(params))?.unwrap_or_default())
    }

    fn add_note(&self, note: &NewNote) -> Result<NoteId, CardForgeError> {
        let fields: serde_json::Map<String, serde_json::Value> = note
            .fields
            .iter()
            .map(|(name, value)| (name.clone(), serde_json::Value::String(value.clone())))
            .collect();

        // Duplicates are the generator's call, not AnkiConnect's.
        let params = serde_json::json!({
            "note": {
                "deckName": note.deck_name,
                "modelName": note.model_name,
                "fields": fields,
                "tags": note.tags,
                "options": { "allowDuplicate": true },
            }
        });

        self.make_request("addNote", Some(params))?
            .ok_or_else(|| CardForgeError::AnkiConnect("addNote returned no note id".to_string()))
    }

    fn set_flag(&self, note_id: NoteId, flag: Flag) -> Result<(), CardForgeError> {
        for card_id in self.card_ids(note_id)? {
            let params = serde_json::json!({
                "card": card_id,
                "keys": ["flags"],
                "newValues": [flag.number().to_string()],
                "warning_check": true,
            });
            let _: Option<serde_json::Value> =
                self.make_request("setSpecificValueOfCard", Some(params))?;
        }
        Ok(())
    }

    fn refresh(&self) -> Result<(), CardForgeError> {
        let _: Option<serde_json::Value> = self.make_request("reloadCollection", None)?;
        Ok(())
    }
}
