use std::{
    collections::VecDeque,
    path::PathBuf,
    sync::Arc,
    time::{
        Duration,
        Instant,
    },
};

use eframe::egui;

use super::{
    dialogs::PendingDialog,
    message_overlay::MessageOverlay,
    top_bar::TopBar,
};
use crate::{
    commands::Command,
    core::tasks::{
        TaskManager,
        TaskResult,
    },
};

const ANKI_CHECK_INTERVAL: Duration = Duration::from_secs(5);

pub struct CardForgeApp {
    // Worker
    task_manager: TaskManager,
    dialogs: VecDeque<PendingDialog>,

    // UI State
    message_overlay: MessageOverlay,
    last_command: Option<Command>,
    worker_error: Option<String>,
    log_path: Option<PathBuf>,

    // Configuration, as last reported by the worker
    api_key_set: bool,
    preview_enabled: bool,
    anki_url: Option<String>,

    // External Services
    anki_connected: bool,
    last_anki_check: Option<Instant>,
}

impl CardForgeApp {
    pub fn new(cc: &eframe::CreationContext<'_>, log_path: Option<PathBuf>) -> Self {
        let repaint_ctx = cc.egui_ctx.clone();
        let task_manager = TaskManager::new(Arc::new(move || repaint_ctx.request_repaint()));

        //Make sure it opens above other windows so the first-run prompt is seen.
        cc.egui_ctx
            .send_viewport_cmd(egui::ViewportCommand::WindowLevel(egui::WindowLevel::AlwaysOnTop));
        cc.egui_ctx
            .send_viewport_cmd(egui::ViewportCommand::WindowLevel(egui::WindowLevel::Normal));

        Self {
            task_manager,
            dialogs: VecDeque::new(),

            message_overlay: MessageOverlay::new(),
            last_command: None,
            worker_error: None,
            log_path,

            api_key_set: false,
            preview_enabled: false,
            anki_url: None,

            anki_connected: false,
            last_anki_check: None,
        }
    }

    fn handle_task_result(&mut self, result: TaskResult) {
        tracing::trace!("Task result: {}", result.task_type());

        match result {
            TaskResult::AnkiConnection(connected) => {
                if connected != self.anki_connected {
                    tracing::info!("Anki connection changed: {}", connected);
                }
                self.anki_connected = connected;
            }
            TaskResult::ConfigLoaded { api_key_set, preview_enabled, anki_url } => {
                self.api_key_set = api_key_set;
                self.preview_enabled = preview_enabled;
                self.anki_url = Some(anki_url);
                self.last_anki_check = None;
                self.message_overlay.clear_message();
            }
            TaskResult::Dialog(request) => self.dialogs.push_back(PendingDialog::new(request)),
            TaskResult::Started(command) => {
                self.message_overlay.set_message(format!("{}...", command.label()));
            }
            TaskResult::Finished { command, preview_enabled } => {
                self.preview_enabled = preview_enabled;
                self.last_command = Some(command);
                self.message_overlay.clear_message();
            }
            TaskResult::WorkerFailed(message) => {
                self.worker_error = Some(message);
                self.message_overlay.clear_message();
            }
        }
    }

    fn update_anki_status(&mut self) {
        let Some(url) = &self.anki_url else {
            return;
        };

        let now = Instant::now();
        let should_check = match self.last_anki_check {
            None => true,
            Some(last_check) => now.duration_since(last_check) >= ANKI_CHECK_INTERVAL,
        };

        if should_check {
            self.task_manager.check_anki_connection(url);
            self.last_anki_check = Some(now);
        }
    }

    fn show_status(&self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading("CardForge");
            ui.label("Pick a command from the Tools menu to add cards to Anki.");
            ui.add_space(10.0);

            egui::Grid::new("status_grid").num_columns(2).spacing([12.0, 6.0]).show(ui, |ui| {
                ui.label("OpenAI API key");
                ui.label(if self.api_key_set { "set" } else { "not set" });
                ui.end_row();

                ui.label("Preview mode");
                ui.label(if self.preview_enabled { "on" } else { "off" });
                ui.end_row();

                ui.label("AnkiConnect");
                ui.label(match &self.anki_url {
                    Some(url) if self.anki_connected => format!("connected ({url})"),
                    Some(url) => format!("not reachable ({url})"),
                    None => "unknown".to_string(),
                });
                ui.end_row();

                if let Some(command) = self.last_command {
                    ui.label("Last command");
                    ui.label(command.label());
                    ui.end_row();
                }

                if let Some(path) = &self.log_path {
                    ui.label("Log file");
                    ui.label(path.display().to_string());
                    ui.end_row();
                }
            });

            if let Some(error) = &self.worker_error {
                ui.add_space(10.0);
                ui.colored_label(egui::Color32::RED, format!("Commands are unavailable: {error}"));
            }
        });
    }
}

impl eframe::App for CardForgeApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        for result in self.task_manager.poll_results() {
            self.handle_task_result(result);
        }

        self.update_anki_status();

        let busy = self.task_manager.is_busy() || !self.dialogs.is_empty();
        if let Some(command) =
            TopBar::show(ctx, busy, self.preview_enabled, self.anki_connected)
        {
            self.task_manager.run_command(command);
        }

        self.show_status(ctx);

        if let Some(dialog) = self.dialogs.front_mut() {
            if let Some(answer) = dialog.show(ctx) {
                if let Some(dialog) = self.dialogs.pop_front() {
                    dialog.finish(answer);
                }
            }
        } else if self.task_manager.is_busy() && self.message_overlay.is_active() {
            self.message_overlay.show(ctx);
        }

        if !self.task_manager.worker_alive() && self.worker_error.is_none() {
            self.worker_error = Some("The worker thread stopped.".to_string());
        }

        ctx.request_repaint_after(ANKI_CHECK_INTERVAL);
    }
}
