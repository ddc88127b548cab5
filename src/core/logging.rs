use std::{
    fs::{
        self,
        File,
    },
    path::{
        Path,
        PathBuf,
    },
    sync::Mutex,
};

use chrono::Local;
use tracing_subscriber::EnvFilter;

use crate::persistence::get_app_data_dir;

const LOG_DIR: &str = "logs";

/// `logs/cardforge_YYYYMMDD_HHMMSS.log` under `base`.
pub fn log_file_path(base: &Path) -> PathBuf {
    let stamp = Local::now().format("%Y%m%d_%H%M%S");
    base.join(LOG_DIR).join(format!("cardforge_{stamp}.log"))
}

/// Installs the process-wide subscriber. Call once, before anything logs.
///
/// Returns the path of the log file, or `None` when it could not be created and
/// events go to stderr instead.
pub fn init() -> Option<PathBuf> {
    let path = log_file_path(&get_app_data_dir());
    let file = path
        .parent()
        .map(fs::create_dir_all)
        .transpose()
        .and_then(|_| File::create(&path));

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,cardforge=debug"));

    match file {
        Ok(file) => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_target(false)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
            tracing::info!("Logging to {}", path.display());
            Some(path)
        }
        Err(e) => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
            tracing::warn!("Could not create log file {}: {}", path.display(), e);
            None
        }
    }
}
