/// A note search scoped to one deck.
///
/// Kept structured so field identity stays by name; only the AnkiConnect client
/// turns it into Anki's search syntax.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteQuery {
    pub deck: String,
    pub model: Option<String>,
    pub field_equals: Option<(String, String)>,
}

impl NoteQuery {
    pub fn in_deck(deck: impl Into<String>) -> Self {
        Self { deck: deck.into(), model: None, field_equals: None }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_field(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.field_equals = Some((field.into(), value.into()));
        self
    }

    pub fn to_search(&self) -> String {
        let mut terms = vec![format!("\"deck:{}\"", escape(&self.deck))];

        if let Some(model) = &self.model {
            terms.push(format!("\"note:{}\"", escape(model)));
        }

        if let Some((field, value)) = &self.field_equals {
            terms.push(format!("\"{}:{}\"", escape(field), escape(value)));
        }

        terms.join(" ")
    }
}

// Quotes and backslashes break out of the quoted term; `*` `_` are wildcards and
// `:` would start a field search.
fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '\\' | '"' | '*' | '_' | ':') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
