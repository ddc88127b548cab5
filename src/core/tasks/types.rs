use std::sync::mpsc;

use crate::{
    commands::Command,
    prompter::{
        CardPreview,
        MessageKind,
    },
};

/// What the worker wants the user to see.
#[derive(Debug, Clone, PartialEq)]
pub enum DialogKind {
    TextInput { title: String, label: String },
    Select { title: String, label: String, options: Vec<String> },
    Preview(CardPreview),
    Message { kind: MessageKind, text: String },
}

#[derive(Debug, Clone, PartialEq)]
pub enum DialogAnswer {
    Text(Option<String>),
    Choice(Option<usize>),
    Confirm(bool),
    Acknowledged,
}

/// A dialog the worker is blocked on until [`DialogRequest::answer`] is called.
#[derive(Debug)]
pub struct DialogRequest {
    pub kind: DialogKind,
    reply: mpsc::Sender<DialogAnswer>,
}

impl DialogRequest {
    pub fn new(kind: DialogKind, reply: mpsc::Sender<DialogAnswer>) -> Self {
        Self { kind, reply }
    }

    /// The answer that closing the dialog without choosing stands for.
    pub fn dismissed(&self) -> DialogAnswer {
        match self.kind {
            DialogKind::TextInput { .. } => DialogAnswer::Text(None),
            DialogKind::Select { .. } => DialogAnswer::Choice(None),
            DialogKind::Preview(_) => DialogAnswer::Confirm(false),
            DialogKind::Message { .. } => DialogAnswer::Acknowledged,
        }
    }

    pub fn answer(self, answer: DialogAnswer) {
        if self.reply.send(answer).is_err() {
            tracing::warn!("Dialog answered after the worker stopped waiting");
        }
    }
}

#[derive(Debug)]
pub enum TaskResult {
    AnkiConnection(bool),
    ConfigLoaded { api_key_set: bool, preview_enabled: bool, anki_url: String },
    Dialog(DialogRequest),
    Started(Command),
    Finished { command: Command, preview_enabled: bool },
    WorkerFailed(String),
}

impl TaskResult {
    pub fn task_type(&self) -> &'static str {
        match self {
            TaskResult::AnkiConnection(_) => "anki_connection",
            TaskResult::ConfigLoaded { .. } => "config_loaded",
            TaskResult::Dialog(_) => "dialog",
            TaskResult::Started(_) => "command_started",
            TaskResult::Finished { .. } => "command_finished",
            TaskResult::WorkerFailed(_) => "worker_failed",
        }
    }
}
