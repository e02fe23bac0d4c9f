/// Application configuration
///
/// Fixed constants live here alongside the handful of values that are
/// resolved once at startup (currently only the storage location).
/// The publish endpoint is user configuration and is persisted in
/// local storage instead (see `state::settings`).

use std::path::PathBuf;
use std::time::Duration;

use crate::error::StoreError;

/// Storage key holding the JSON array of drafts
pub const STORAGE_KEY_DRAFTS: &str = "writer_drafts_v2";
/// Storage key holding the bare endpoint URL
pub const STORAGE_KEY_CONFIG: &str = "writer_config";

/// Environment variable overriding the storage database location
pub const DB_PATH_ENV: &str = "DRAFT_WRITER_DB";

/// Uploaded images wider than this are scaled down proportionally
pub const MAX_IMAGE_WIDTH: u32 = 1200;
/// JPEG quality used when re-encoding uploaded images (0-100)
pub const JPEG_QUALITY: u8 = 70;
/// Files larger than this trigger a size warning (ingestion still proceeds)
pub const IMAGE_SIZE_ADVISORY_BYTES: u64 = 5 * 1024 * 1024;

/// How long the save button shows its acknowledgment
pub const SAVE_ACK_DURATION: Duration = Duration::from_secs(1);
/// How long a successful publish status stays visible
pub const PUBLISH_SUCCESS_DURATION: Duration = Duration::from_secs(3);

/// Window widths at or below this collapse the draft list into an overlay
pub const NARROW_WINDOW_WIDTH: f32 = 768.0;

/// Values resolved once at process startup
#[derive(Debug, Clone)]
pub struct AppConfig {
    db_path: PathBuf,
}

impl AppConfig {
    /// Resolve configuration from the environment.
    ///
    /// The database lives in the user's data directory unless
    /// `DRAFT_WRITER_DB` points somewhere else:
    /// - Linux: ~/.local/share/draft-writer/draft_writer.db
    /// - macOS: ~/Library/Application Support/draft-writer/draft_writer.db
    /// - Windows: %APPDATA%\draft-writer\draft_writer.db
    pub fn from_env() -> Result<Self, StoreError> {
        let override_path = std::env::var(DB_PATH_ENV)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());

        let db_path = match override_path {
            Some(path) => PathBuf::from(path),
            None => default_db_path()?,
        };

        Ok(Self { db_path })
    }

    pub fn db_path(&self) -> &PathBuf {
        &self.db_path
    }
}

fn default_db_path() -> Result<PathBuf, StoreError> {
    let mut path = dirs::data_dir()
        .or_else(dirs::home_dir)
        .ok_or(StoreError::DataDirUnavailable)?;

    path.push("draft-writer");
    path.push("draft_writer.db");
    Ok(path)
}
