pub mod manager;
pub mod prompter;
pub mod types;

pub use manager::TaskManager;
pub use prompter::{
    ChannelPrompter,
    Waker,
};
pub use types::{
    DialogAnswer,
    DialogKind,
    DialogRequest,
    TaskResult,
};
