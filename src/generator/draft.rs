use serde::{
    ser::SerializeMap,
    Serialize,
    Serializer,
};
use serde_json::{
    Map,
    Value,
};

use crate::anki::NoteInfo;

/// Field values of one card, keyed by field name in note-type order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CardDraft {
    fields: Vec<(String, String)>,
}

impl CardDraft {
    pub fn from_pairs(fields: Vec<(String, String)>) -> Self {
        Self { fields }
    }

    /// Keeps exactly `field_names`: missing keys become empty, extra keys are dropped.
    pub fn from_json(object: &Map<String, Value>, field_names: &[String]) -> Self {
        let fields = field_names
            .iter()
            .map(|name| {
                let value = match object.get(name) {
                    None | Some(Value::Null) => String::new(),
                    Some(Value::String(text)) => text.clone(),
                    Some(other) => other.to_string(),
                };
                (name.clone(), value)
            })
            .collect();
        Self { fields }
    }

    pub fn from_note(note: &NoteInfo, field_names: &[String]) -> Self {
        let fields = field_names
            .iter()
            .map(|name| (name.clone(), note.field(name).unwrap_or_default().to_string()))
            .collect();
        Self { fields }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields.iter().find(|(key, _)| key == name).map(|(_, value)| value.as_str())
    }

    pub fn set(&mut self, name: &str, value: String) {
        match self.fields.iter_mut().find(|(key, _)| key == name) {
            Some((_, slot)) => *slot = value,
            None => self.fields.push((name.to_string(), value)),
        }
    }

    pub fn fields(&self) -> &[(String, String)] {
        &self.fields
    }

    pub fn into_fields(self) -> Vec<(String, String)> {
        self.fields
    }
}

// Serialized as an object so examples keep the note type's field order in the prompt.
impl Serialize for CardDraft {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// Parses a model reply into a JSON object.
///
/// Tries the whole text first, then the span from the first `{` to the last `}`.
pub fn parse_json_object(text: &str) -> Option<Map<String, Value>> {
    if let Ok(Value::Object(object)) = serde_json::from_str::<Value>(text.trim()) {
        return Some(object);
    }

    let braced = extract_braced(text)?;
    match serde_json::from_str::<Value>(braced) {
        Ok(Value::Object(object)) => Some(object),
        _ => None,
    }
}

fn extract_braced(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}
