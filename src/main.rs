use cardforge::{
    core::logging,
    gui::CardForgeApp,
};
use eframe::egui;

fn main() -> eframe::Result<()> {
    let log_path = logging::init();
    tracing::info!("Starting CardForge {}", env!("CARGO_PKG_VERSION"));

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("CardForge")
            .with_inner_size([640.0, 420.0]),
        ..Default::default()
    };

    eframe::run_native(
        "CardForge",
        options,
        Box::new(move |cc| Ok(Box::new(CardForgeApp::new(cc, log_path)))),
    )
}
