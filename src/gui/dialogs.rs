use eframe::egui;
use egui_extras::{
    Column,
    TableBuilder,
};

use crate::{
    core::tasks::{
        DialogAnswer,
        DialogKind,
        DialogRequest,
    },
    prompter::{
        CardPreview,
        MessageKind,
    },
};

const DIALOG_WIDTH: f32 = 450.0;
const LIST_HEIGHT: f32 = 240.0;
const PREVIEW_HEIGHT: f32 = 320.0;

/// The dialog the worker is currently waiting on, with its editable state.
pub struct PendingDialog {
    request: DialogRequest,
    text: String,
    choice: usize,
}

impl PendingDialog {
    pub fn new(request: DialogRequest) -> Self {
        Self { request, text: String::new(), choice: 0 }
    }

    /// Draws the modal. Returns the answer once the user gives one.
    pub fn show(&mut self, ctx: &egui::Context) -> Option<DialogAnswer> {
        let mut answer = None;

        let modal = egui::Modal::new(egui::Id::new("worker_dialog")).show(ctx, |ui| {
            ui.set_width(DIALOG_WIDTH);
            answer = match &self.request.kind {
                DialogKind::TextInput { title, label } => text_input(ui, title, label, &mut self.text),
                DialogKind::Select { title, label, options } => {
                    select(ui, title, label, options, &mut self.choice)
                }
                DialogKind::Preview(card) => preview(ui, card),
                DialogKind::Message { kind, text } => message(ui, *kind, text),
            };
        });

        if answer.is_none() && modal.should_close() {
            answer = Some(self.request.dismissed());
        }

        answer
    }

    /// Hands the answer to the blocked worker.
    pub fn finish(self, answer: DialogAnswer) {
        self.request.answer(answer);
    }
}

fn title_row(ui: &mut egui::Ui, icon: Option<(&str, egui::Color32)>, title: &str) {
    ui.horizontal(|ui| {
        if let Some((icon, color)) = icon {
            ui.label(egui::RichText::new(icon).size(24.0).color(color));
        }
        ui.label(egui::RichText::new(title).size(18.0).strong());
    });
    ui.add_space(10.0);
}

/// OK/Cancel on the right. `Some(true)` for OK.
fn buttons(ui: &mut egui::Ui, ok: &str, cancel: Option<&str>) -> Option<bool> {
    let mut clicked = None;
    ui.add_space(15.0);
    ui.horizontal(|ui| {
        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            if let Some(cancel) = cancel {
                if ui.button(cancel).clicked() {
                    clicked = Some(false);
                }
            }
            if ui.button(ok).clicked() {
                clicked = Some(true);
            }
        });
    });
    clicked
}

fn text_input(ui: &mut egui::Ui, title: &str, label: &str, text: &mut String) -> Option<DialogAnswer> {
    title_row(ui, None, title);
    ui.label(label);

    let response = ui.add(egui::TextEdit::singleline(text).desired_width(f32::INFINITY));
    if !response.has_focus() && text.is_empty() {
        response.request_focus();
    }
    let submitted = response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));

    match buttons(ui, "OK", Some("Cancel")) {
        Some(true) => Some(DialogAnswer::Text(Some(text.clone()))),
        Some(false) => Some(DialogAnswer::Text(None)),
        None if submitted => Some(DialogAnswer::Text(Some(text.clone()))),
        None => None,
    }
}

fn select(
    ui: &mut egui::Ui,
    title: &str,
    label: &str,
    options: &[String],
    choice: &mut usize,
) -> Option<DialogAnswer> {
    title_row(ui, None, title);
    ui.label(label);
    ui.add_space(5.0);

    let mut double_clicked = false;
    egui::ScrollArea::vertical().max_height(LIST_HEIGHT).id_salt("dialog_options").show(ui, |ui| {
        for (index, option) in options.iter().enumerate() {
            let response = ui.selectable_value(choice, index, option);
            if response.double_clicked() {
                double_clicked = true;
            }
        }
    });

    match buttons(ui, "OK", Some("Cancel")) {
        Some(false) => Some(DialogAnswer::Choice(None)),
        Some(true) => Some(DialogAnswer::Choice(Some(*choice))),
        None if double_clicked => Some(DialogAnswer::Choice(Some(*choice))),
        None => None,
    }
}

fn preview(ui: &mut egui::Ui, card: &CardPreview) -> Option<DialogAnswer> {
    title_row(ui, None, "Preview Card");
    ui.label(format!("Add this card to '{}'?", card.deck));
    ui.add_space(5.0);

    egui::ScrollArea::vertical().max_height(PREVIEW_HEIGHT).id_salt("preview_fields").show(ui, |ui| {
        TableBuilder::new(ui)
            .striped(true)
            .column(Column::auto().at_least(90.0))
            .column(Column::remainder().at_least(220.0))
            .header(24.0, |mut header| {
                header.col(|ui| {
                    ui.strong("Field");
                });
                header.col(|ui| {
                    ui.strong("Value");
                });
            })
            .body(|mut body| {
                for (name, value) in &card.fields {
                    body.row(24.0, |mut row| {
                        row.col(|ui| {
                            ui.label(name);
                        });
                        row.col(|ui| {
                            ui.add(egui::Label::new(value).truncate()).on_hover_text(value);
                        });
                    });
                }
            });
    });

    if !card.tags.is_empty() {
        ui.add_space(5.0);
        ui.label(format!("Tags: {}", card.tags.join(", ")));
    }

    buttons(ui, "Add", Some("Skip")).map(DialogAnswer::Confirm)
}

fn message(ui: &mut egui::Ui, kind: MessageKind, text: &str) -> Option<DialogAnswer> {
    let (icon, title) = match kind {
        MessageKind::Info => (("ℹ", egui::Color32::LIGHT_BLUE), "Information"),
        MessageKind::Error => (("⚠", egui::Color32::RED), "Error"),
    };
    title_row(ui, Some(icon), title);
    ui.label(egui::RichText::new(text).size(14.0));

    buttons(ui, "OK", None).map(|_| DialogAnswer::Acknowledged)
}
