use serde_json::json;

use super::{
    draft::CardDraft,
    openai::FunctionDef,
};

pub const SYSTEM_PROMPT: &str = "You are an expert teacher.";
pub const CARD_FUNCTION: &str = "create_flashcard";

/// Instruction for one card in the style of `examples`.
///
/// `field_names[0]` is the front field and must not repeat an existing front.
pub fn style_prompt(
    topic: &str,
    deck: &str,
    field_names: &[String],
    examples: &[CardDraft],
) -> String {
    let front = field_names.first().map(String::as_str).unwrap_or_default();
    let keys = field_names.iter().map(|n| format!("\"{n}\"")).collect::<Vec<_>>().join(", ");
    let examples_json =
        serde_json::to_string_pretty(examples).unwrap_or_else(|_| "[]".to_string());
    let taken = examples
        .iter()
        .filter_map(|example| example.get(front))
        .filter(|value| !value.trim().is_empty())
        .map(|value| format!("- {value}"))
        .collect::<Vec<_>>()
        .join("\n");

    let mut prompt = format!(
        "Create one new flashcard about \"{topic}\" for the Anki deck \"{deck}\".\n\n\
         Match the style, length and formatting of these existing cards from the deck:\n\
         {examples_json}\n\n\
         Respond with exactly one JSON object with the keys {keys}. Every value must be a \
         string. Do not add any text before or after the JSON."
    );

    if !front.is_empty() {
        prompt.push_str(&format!(
            "\n\nThe \"{front}\" value must be different from every existing \"{front}\" in the \
             deck."
        ));
        if !taken.is_empty() {
            prompt.push_str(&format!(" These are already taken:\n{taken}"));
        }
    }

    prompt
}

/// JSON Schema with one required string property per field.
pub fn card_schema(field_names: &[String]) -> serde_json::Value {
    let properties: serde_json::Map<String, serde_json::Value> = field_names
        .iter()
        .map(|name| {
            (name.clone(), json!({ "type": "string", "description": format!("The {name} field") }))
        })
        .collect();

    json!({
        "type": "object",
        "properties": properties,
        "required": field_names,
    })
}

pub fn card_function(field_names: &[String]) -> FunctionDef {
    FunctionDef {
        name: CARD_FUNCTION.to_string(),
        description: "Create one flashcard whose fields match the note type.".to_string(),
        parameters: card_schema(field_names),
    }
}

/// Prompt for the fixed question/answer shape.
pub fn basic_prompt(topic: &str) -> String {
    format!(
        "Generate a flashcard on the topic of {topic}. Provide the output strictly in JSON \
         format with the keys 'question' and 'answer'. Do not include any additional text."
    )
}
