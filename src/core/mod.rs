pub mod errors;
pub mod http;
pub mod logging;
pub mod tasks;

pub use errors::CardForgeError;
