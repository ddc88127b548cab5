use std::{
    sync::{
        atomic::{
            AtomicBool,
            Ordering,
        },
        mpsc,
        Arc,
    },
    thread::{
        self,
        JoinHandle,
    },
    time::Duration,
};

use super::{
    prompter::{
        ChannelPrompter,
        Waker,
    },
    TaskResult,
};
use crate::{
    anki::{
        is_online,
        AnkiConnect,
    },
    commands::{
        self,
        Command,
        CommandContext,
    },
    config::ConfigStore,
    core::CardForgeError,
    generator::{
        openai::OpenAiClient,
        trivia::OpenTdbClient,
    },
    prompter::Prompter,
};

const PROBE_TIMEOUT: Duration = Duration::from_secs(3);

/// Owns the worker thread that runs commands one at a time, off the GUI thread.
pub struct TaskManager {
    commands: mpsc::Sender<Command>,
    receiver: mpsc::Receiver<TaskResult>,
    sender: mpsc::Sender<TaskResult>,
    worker: Option<JoinHandle<()>>,
    busy: bool,
    probing: Arc<AtomicBool>,
    waker: Waker,
}

impl TaskManager {
    pub fn new(waker: Waker) -> Self {
        Self::with_store(ConfigStore::default_location(), waker)
    }

    /// Starts the worker, which loads the configuration from `store` first.
    pub fn with_store(store: ConfigStore, waker: Waker) -> Self {
        let (sender, receiver) = mpsc::channel();
        let (commands, command_receiver) = mpsc::channel();

        let worker_sender = sender.clone();
        let worker_waker = waker.clone();
        let worker = thread::Builder::new()
            .name("cardforge-worker".to_string())
            .spawn(move || worker_loop(store, command_receiver, worker_sender, worker_waker));

        let worker = match worker {
            Ok(handle) => Some(handle),
            Err(e) => {
                tracing::error!("Failed to start worker thread: {}", e);
                let _ = sender.send(TaskResult::WorkerFailed(e.to_string()));
                None
            }
        };

        // Busy until the configuration has been loaded.
        Self {
            commands,
            receiver,
            sender,
            worker,
            busy: true,
            probing: Arc::new(AtomicBool::new(false)),
            waker,
        }
    }

    pub fn poll_results(&mut self) -> Vec<TaskResult> {
        let mut results = Vec::new();

        while let Ok(result) = self.receiver.try_recv() {
            match &result {
                TaskResult::ConfigLoaded { .. } | TaskResult::Finished { .. } => self.busy = false,
                TaskResult::WorkerFailed(_) => self.busy = true,
                _ => {}
            }
            results.push(result);
        }

        results
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn worker_alive(&self) -> bool {
        self.worker.as_ref().is_some_and(|handle| !handle.is_finished())
    }

    /// Queues a command. Ignored while another one is running.
    pub fn run_command(&mut self, command: Command) {
        if self.busy {
            tracing::debug!("Ignoring '{}' while busy", command.label());
            return;
        }
        if self.commands.send(command).is_err() {
            tracing::error!("Worker thread is gone, cannot run '{}'", command.label());
            let _ = self.sender.send(TaskResult::WorkerFailed("The worker thread stopped.".to_string()));
            return;
        }
        self.busy = true;
    }

    /// Probes AnkiConnect on its own thread. Skipped while a probe is still out.
    pub fn check_anki_connection(&self, url: &str) {
        if self.probing.swap(true, Ordering::AcqRel) {
            tracing::trace!("Anki probe still in flight, skipping");
            return;
        }

        let probing = self.probing.clone();
        let sender = self.sender.clone();
        let waker = self.waker.clone();
        let url = url.to_string();

        thread::spawn(move || {
            let connected =
                AnkiConnect::with_timeout(url, PROBE_TIMEOUT).map(|anki| is_online(&anki)).unwrap_or(false);
            probing.store(false, Ordering::Release);
            let _ = sender.send(TaskResult::AnkiConnection(connected));
            waker();
        });
    }
}

fn worker_loop(
    store: ConfigStore,
    inbox: mpsc::Receiver<Command>,
    sender: mpsc::Sender<TaskResult>,
    waker: Waker,
) {
    let prompter = ChannelPrompter::new(sender.clone(), waker.clone());
    let mut config = store.load(&prompter);

    let send = |result: TaskResult| {
        let _ = sender.send(result);
        waker();
    };

    send(TaskResult::ConfigLoaded {
        api_key_set: config.has_api_key(),
        preview_enabled: config.preview_enabled,
        anki_url: config.anki_connect_url.clone(),
    });

    let clients = AnkiConnect::new(config.anki_connect_url.clone()).and_then(|anki| {
        Ok::<_, CardForgeError>((anki, OpenAiClient::new(config.api_key.clone())?, OpenTdbClient::new()?))
    });
    let (anki, chat, trivia) = match clients {
        Ok(clients) => clients,
        Err(e) => {
            tracing::error!("Failed to create HTTP clients: {}", e);
            prompter.error(&format!("Failed to start: {}", e));
            send(TaskResult::WorkerFailed(e.to_string()));
            return;
        }
    };

    let mut rng = rand::rng();

    while let Ok(command) = inbox.recv() {
        send(TaskResult::Started(command));

        let mut ctx = CommandContext {
            collection: &anki,
            chat: &chat,
            trivia: &trivia,
            prompter: &prompter,
            store: &store,
            config: &mut config,
        };
        commands::run(command, &mut ctx, &mut rng);

        send(TaskResult::Finished { command, preview_enabled: config.preview_enabled });
    }

    tracing::info!("Command channel closed, worker exiting");
}
