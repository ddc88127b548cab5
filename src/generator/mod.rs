pub mod ai;
pub mod basic;
pub mod draft;
pub mod openai;
pub mod prompt;
pub mod trivia;

/// Tag put on every note written from a chat completion.
pub const AI_TAG: &str = "AI-generated";
