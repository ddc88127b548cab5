pub mod app;
pub mod dialogs;
pub mod message_overlay;
pub mod top_bar;

pub use app::CardForgeApp;
