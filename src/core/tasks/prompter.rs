use std::sync::{
    mpsc,
    Arc,
};

use super::types::{
    DialogAnswer,
    DialogKind,
    DialogRequest,
    TaskResult,
};
use crate::prompter::{
    CardPreview,
    MessageKind,
    Prompter,
};

/// Wakes the GUI so a queued result is drawn without waiting for input.
pub type Waker = Arc<dyn Fn() + Send + Sync>;

/// [`Prompter`] for the worker thread: each call is queued for the GUI and
/// blocks until the user answers. With the GUI gone every prompt is cancelled.
pub struct ChannelPrompter {
    sender: mpsc::Sender<TaskResult>,
    waker: Waker,
}

impl ChannelPrompter {
    pub fn new(sender: mpsc::Sender<TaskResult>, waker: Waker) -> Self {
        Self { sender, waker }
    }

    fn ask(&self, kind: DialogKind) -> Option<DialogAnswer> {
        let (reply, answer) = mpsc::channel();
        if self.sender.send(TaskResult::Dialog(DialogRequest::new(kind, reply))).is_err() {
            tracing::warn!("Dialog dropped, the GUI is gone");
            return None;
        }
        (self.waker)();
        answer.recv().ok()
    }
}

impl Prompter for ChannelPrompter {
    fn text_input(&self, title: &str, label: &str) -> Option<String> {
        match self.ask(DialogKind::TextInput { title: title.to_string(), label: label.to_string() }) {
            Some(DialogAnswer::Text(text)) => text,
            _ => None,
        }
    }

    fn select(&self, title: &str, label: &str, options: &[String]) -> Option<usize> {
        let kind = DialogKind::Select {
            title: title.to_string(),
            label: label.to_string(),
            options: options.to_vec(),
        };
        match self.ask(kind) {
            Some(DialogAnswer::Choice(choice)) => choice.filter(|index| *index < options.len()),
            _ => None,
        }
    }

    fn preview(&self, card: &CardPreview) -> bool {
        matches!(self.ask(DialogKind::Preview(card.clone())), Some(DialogAnswer::Confirm(true)))
    }

    fn message(&self, kind: MessageKind, message: &str) {
        self.ask(DialogKind::Message { kind, text: message.to_string() });
    }
}
