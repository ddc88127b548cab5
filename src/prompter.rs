//! The dialogs a command may open.
//!
//! Generators talk to the user only through [`Prompter`], which the desktop front
//! end implements with egui modals and tests implement with scripted answers.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Info,
    Error,
}

/// Everything shown before a generated card is committed.
#[derive(Debug, Clone, PartialEq)]
pub struct CardPreview {
    pub deck: String,
    pub fields: Vec<(String, String)>,
    pub tags: Vec<String>,
}

pub trait Prompter {
    /// Single line of text. `None` when the user cancels.
    fn text_input(&self, title: &str, label: &str) -> Option<String>;

    /// Index into `options`. `None` when the user cancels.
    fn select(&self, title: &str, label: &str, options: &[String]) -> Option<usize>;

    /// Yes/no confirmation of one card.
    fn preview(&self, card: &CardPreview) -> bool;

    /// Blocks until acknowledged.
    fn message(&self, kind: MessageKind, message: &str);

    fn info(&self, message: &str) {
        self.message(MessageKind::Info, message);
    }

    fn error(&self, message: &str) {
        self.message(MessageKind::Error, message);
    }
}
