use eframe::egui::{
    self,
    containers,
};

use crate::commands::Command;

pub struct TopBar;

impl TopBar {
    /// Draws the menu bar. Returns the command picked this frame, if any.
    pub fn show(
        ctx: &egui::Context,
        busy: bool,
        preview_enabled: bool,
        anki_connected: bool,
    ) -> Option<Command> {
        let mut picked = None;

        egui::TopBottomPanel::top("top_panel").show(ctx, |ui| {
            containers::menu::Bar::new().ui(ui, |ui| {
                egui::widgets::global_theme_preference_switch(ui);
                ui.menu_button("File", |ui| {
                    if ui.button("Quit").clicked() {
                        ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                    }
                });

                ui.add_enabled_ui(!busy, |ui| {
                    ui.menu_button("Tools", |ui| {
                        for command in Command::ALL {
                            let label = match command {
                                Command::TogglePreview if preview_enabled => {
                                    format!("{} (on)", command.label())
                                }
                                _ => command.label().to_string(),
                            };
                            if command == Command::TogglePreview {
                                ui.separator();
                            }
                            if ui.button(label).clicked() {
                                picked = Some(command);
                                ui.close();
                            }
                        }
                    });
                });

                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    Self::show_status_indicators(ui, anki_connected);
                });
            });
        });

        picked
    }

    fn show_status_indicators(ui: &mut egui::Ui, anki_connected: bool) {
        let anki_color = if anki_connected {
            egui::Color32::from_rgb(0, 200, 0)
        } else {
            egui::Color32::from_rgb(200, 80, 80)
        };

        let anki_tooltip =
            if anki_connected { "Connected to Anki" } else { "Not Connected to Anki" };
        ui.horizontal(|ui| {
            ui.spacing_mut().item_spacing.x = 2.0;
            ui.small("Anki").on_hover_text(anki_tooltip);
            ui.small(egui::RichText::new("●").color(anki_color)).on_hover_text(anki_tooltip);
        });
    }
}
