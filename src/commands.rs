use std::{
    any::Any,
    panic::{
        self,
        AssertUnwindSafe,
    },
};

use rand::Rng;

use crate::{
    anki::Collection,
    config::{
        Config,
        ConfigStore,
    },
    core::CardForgeError,
    generator::{
        ai::AiCardGenerator,
        basic::generate_basic_card,
        openai::ChatCompletion,
        trivia::{
            generate_trivia_card,
            TriviaSource,
        },
    },
    prompter::Prompter,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    TriviaCard,
    BasicAiCard,
    AiCards,
    TogglePreview,
}

impl Command {
    /// Menu order.
    pub const ALL: [Command; 4] =
        [Command::TriviaCard, Command::BasicAiCard, Command::AiCards, Command::TogglePreview];

    pub fn label(self) -> &'static str {
        match self {
            Command::TriviaCard => "Generate Trivia Card",
            Command::BasicAiCard => "Generate Card with OpenAI",
            Command::AiCards => "Generate AI Cards from Deck",
            Command::TogglePreview => "Toggle Preview Mode",
        }
    }
}

/// Everything a command reads or writes.
pub struct CommandContext<'a> {
    pub collection: &'a dyn Collection,
    pub chat: &'a dyn ChatCompletion,
    pub trivia: &'a dyn TriviaSource,
    pub prompter: &'a dyn Prompter,
    pub store: &'a ConfigStore,
    pub config: &'a mut Config,
}

/// Runs one command to completion.
///
/// Errors and panics stop here: they are logged and shown as a single message,
/// so the caller's loop keeps going.
pub fn run(command: Command, ctx: &mut CommandContext<'_>, rng: &mut impl Rng) {
    tracing::info!("Running '{}'", command.label());

    let outcome = panic::catch_unwind(AssertUnwindSafe(|| execute(command, ctx, rng)));

    match outcome {
        Ok(Ok(())) => tracing::debug!("'{}' finished", command.label()),
        Ok(Err(e)) => {
            tracing::error!("'{}' failed: {:?}", command.label(), e);
            ctx.prompter.error(&format!("An unexpected error occurred: {}", e));
        }
        Err(payload) => {
            tracing::error!("'{}' panicked: {}", command.label(), panic_message(payload.as_ref()));
            ctx.prompter.error("An unexpected error occurred. See the log file for details.");
        }
    }
}

fn execute(
    command: Command,
    ctx: &mut CommandContext<'_>,
    rng: &mut impl Rng,
) -> Result<(), CardForgeError> {
    match command {
        Command::TriviaCard => {
            generate_trivia_card(ctx.trivia, ctx.collection, ctx.prompter, rng);
        }
        Command::BasicAiCard => {
            generate_basic_card(ctx.collection, ctx.chat, ctx.prompter, ctx.config);
        }
        Command::AiCards => {
            let generator = AiCardGenerator::new(ctx.collection, ctx.chat, ctx.prompter, ctx.config);
            if let Some(tally) = generator.run(rng)? {
                tracing::info!("{}", tally.summary());
            }
        }
        Command::TogglePreview => {
            ctx.store.toggle_preview(ctx.config, ctx.prompter);
        }
    }
    Ok(())
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.as_str()
    } else {
        "unknown panic"
    }
}
