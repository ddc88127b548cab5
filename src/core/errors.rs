use thiserror::Error;

#[derive(Error, Debug)]
pub enum CardForgeError {
    #[error("I/O error: {0}")]
    Io(Box<std::io::Error>),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Reqwest error: {0}")]
    Reqwest(Box<reqwest::Error>),

    #[error("HTTP error {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("AnkiConnect error: {0}")]
    AnkiConnect(String),

    #[error("Note type '{0}' not found")]
    MissingModel(String),

    #[error("Response is missing '{0}'")]
    MissingField(String),

    #[error("CardForgeError: {0}")]
    Custom(String),
}

impl From<std::io::Error> for CardForgeError {
    fn from(error: std::io::Error) -> Self {
        CardForgeError::Io(Box::new(error))
    }
}

impl From<reqwest::Error> for CardForgeError {
    fn from(error: reqwest::Error) -> Self {
        CardForgeError::Reqwest(Box::new(error))
    }
}
