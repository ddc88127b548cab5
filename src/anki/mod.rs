pub mod api;
pub mod query;
pub mod types;

pub use api::AnkiConnect;
pub use query::NoteQuery;
pub use types::{
    Flag,
    NewNote,
    NoteId,
    NoteInfo,
};

use crate::core::CardForgeError;

/// The parts of the Anki collection the generators read and write.
pub trait Collection {
    fn version(&self) -> Result<u32, CardForgeError>;

    /// Sorted by name.
    fn deck_names(&self) -> Result<Vec<String>, CardForgeError>;

    /// Creates the deck when it does not exist yet.
    fn ensure_deck(&self, name: &str) -> Result<u64, CardForgeError>;

    fn find_notes(&self, query: &NoteQuery) -> Result<Vec<NoteId>, CardForgeError>;

    fn notes_info(&self, note_ids: &[NoteId]) -> Result<Vec<NoteInfo>, CardForgeError>;

    fn model_names(&self) -> Result<Vec<String>, CardForgeError>;

    fn model_field_names(&self, model_name: &str) -> Result<Vec<String>, CardForgeError>;

    fn add_note(&self, note: &NewNote) -> Result<NoteId, CardForgeError>;

    /// Flags every card of the note.
    fn set_flag(&self, note_id: NoteId, flag: Flag) -> Result<(), CardForgeError>;

    /// Makes Anki pick up notes added since the last refresh.
    fn refresh(&self) -> Result<(), CardForgeError>;
}

/// Field names of `model_name`, or `MissingModel` when Anki has no such note type.
pub fn require_model(
    collection: &dyn Collection,
    model_name: &str,
) -> Result<Vec<String>, CardForgeError> {
    if !collection.model_names()?.iter().any(|name| name == model_name) {
        return Err(CardForgeError::MissingModel(model_name.to_string()));
    }
    collection.model_field_names(model_name)
}

pub fn is_online(collection: &dyn Collection) -> bool {
    match collection.version() {
        Ok(version) => {
            tracing::debug!("AnkiConnect is online. Version: {}", version);
            true
        }
        Err(err) => {
            tracing::debug!("AnkiConnect is offline: {}", err);
            false
        }
    }
}
