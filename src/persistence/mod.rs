use std::{
    fs,
    path::{
        Path,
        PathBuf,
    },
};

use serde::{
    Deserialize,
    Serialize,
};

use crate::core::CardForgeError;

const APP_NAME: &str = "cardforge";

pub fn get_app_data_dir() -> PathBuf {
    if let Some(data_dir) = dirs::data_local_dir() {
        let app_dir = data_dir.join(APP_NAME);
        let _ = fs::create_dir_all(&app_dir);
        app_dir
    } else {
        PathBuf::from(".")
    }
}

pub fn get_data_file_path(filename: &str) -> PathBuf {
    get_app_data_dir().join(filename)
}

pub fn save_json<T: Serialize>(data: &T, file_path: &Path) -> Result<(), CardForgeError> {
    if let Some(parent) = file_path.parent() {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(data)?;
    fs::write(file_path, json)?;
    tracing::debug!("Data saved to: {}", file_path.display());
    Ok(())
}

/// `Ok(None)` when the file does not exist.
pub fn load_json<T: for<'de> Deserialize<'de>>(
    file_path: &Path,
) -> Result<Option<T>, CardForgeError> {
    if !file_path.exists() {
        return Ok(None);
    }

    let json = fs::read_to_string(file_path)?;
    let data: T = serde_json::from_str(&json)?;
    tracing::debug!("Data loaded from: {}", file_path.display());
    Ok(Some(data))
}
