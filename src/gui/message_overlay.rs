use eframe::egui;

/// Spinner shown while the worker runs a command and no dialog is open.
pub struct MessageOverlay {
    message: Option<String>,
}

impl MessageOverlay {
    pub fn new() -> Self {
        Self { message: Some("Loading configuration...".to_string()) }
    }

    pub fn set_message(&mut self, message: impl Into<String>) {
        self.message = Some(message.into());
    }

    pub fn clear_message(&mut self) {
        self.message = None;
    }

    pub fn is_active(&self) -> bool {
        self.message.is_some()
    }

    pub fn show(&self, ctx: &egui::Context) {
        let Some(message) = &self.message else {
            return;
        };

        egui::Area::new(egui::Id::new("message_overlay"))
            .order(egui::Order::Background)
            .anchor(egui::Align2::CENTER_BOTTOM, egui::Vec2::new(0.0, -30.0))
            .show(ctx, |ui| {
                egui::Frame::popup(ui.style()).show(ui, |ui| {
                    ui.horizontal(|ui| {
                        ui.add(egui::Spinner::new());
                        ui.label(message);
                    });
                });
            });
    }
}
