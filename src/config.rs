use std::path::{
    Path,
    PathBuf,
};

use serde::{
    Deserialize,
    Serialize,
};

use crate::{
    anki::api::DEFAULT_URL,
    generator::openai::DEFAULT_MODEL,
    persistence::{
        get_data_file_path,
        load_json,
        save_json,
    },
    prompter::Prompter,
};

const CONFIG_FILE: &str = "config.json";

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_anki_url() -> String {
    DEFAULT_URL.to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(rename = "OPENAI_API_KEY", default)]
    pub api_key: String,
    #[serde(rename = "PREVIEW_ENABLED", default)]
    pub preview_enabled: bool,
    #[serde(rename = "OPENAI_MODEL", default = "default_model")]
    pub model: String,
    #[serde(rename = "ANKI_CONNECT_URL", default = "default_anki_url")]
    pub anki_connect_url: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            preview_enabled: false,
            model: default_model(),
            anki_connect_url: default_anki_url(),
        }
    }
}

impl Config {
    pub fn has_api_key(&self) -> bool {
        !self.api_key.trim().is_empty()
    }
}

/// Reads and writes the configuration file. Every failure is shown to the user
/// and logged, never returned.
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn default_location() -> Self {
        Self::new(get_data_file_path(CONFIG_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the file, asking for an API key when none is stored yet.
    ///
    /// Declining the prompt keeps the other settings. A corrupt file yields an
    /// empty configuration.
    pub fn load(&self, prompter: &dyn Prompter) -> Config {
        match load_json::<Config>(&self.path) {
            Ok(Some(config)) if config.has_api_key() => {
                tracing::info!("Configuration loaded from {}", self.path.display());
                config
            }
            Ok(Some(config)) => {
                tracing::info!("Configuration at {} has no API key", self.path.display());
                self.ask_for_key(config, prompter)
            }
            Ok(None) => self.ask_for_key(Config::default(), prompter),
            Err(e) => {
                tracing::error!("Failed to read {}: {}", self.path.display(), e);
                prompter.error(&format!(
                    "The configuration file at {} could not be read: {}",
                    self.path.display(),
                    e
                ));
                Config::default()
            }
        }
    }

    fn ask_for_key(&self, config: Config, prompter: &dyn Prompter) -> Config {
        let api_key = prompter
            .text_input("OpenAI API Key", "Enter your OpenAI API key:")
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty());

        let Some(api_key) = api_key else {
            tracing::warn!("No API key entered, AI card generation is disabled");
            prompter.info("No API key entered. AI card generation stays disabled until one is set.");
            return config;
        };

        let config = Config { api_key, ..config };
        self.save(&config, prompter);
        config
    }

    /// Returns whether the file was written.
    pub fn save(&self, config: &Config, prompter: &dyn Prompter) -> bool {
        match save_json(config, &self.path) {
            Ok(()) => true,
            Err(e) => {
                tracing::error!("Failed to save configuration to {}: {}", self.path.display(), e);
                prompter.error(&format!("Failed to save configuration: {}", e));
                false
            }
        }
    }

    /// Flips preview mode, persists it and reports the new state.
    pub fn toggle_preview(&self, config: &mut Config, prompter: &dyn Prompter) -> bool {
        config.preview_enabled = !config.preview_enabled;
        self.save(config, prompter);

        let state = if config.preview_enabled { "enabled" } else { "disabled" };
        tracing::info!("Preview mode {}", state);
        prompter.info(&format!("Preview mode {}.", state));
        config.preview_enabled
    }
}
