//! Filesystem locations for persisted client state
//!
//! Everything lives under ~/.sohbet

use std::path::PathBuf;

use crate::constants;

/// Root config directory (~/.sohbet)
///
/// Falls back to a relative directory when no home directory exists
/// (containerized or stripped-down environments).
pub fn config_dir() -> PathBuf {
    dirs::home_dir()
        .map(|home| home.join(constants::ui::CONFIG_DIR_NAME))
        .unwrap_or_else(|| PathBuf::from(constants::ui::CONFIG_DIR_NAME))
}

/// Log directory (~/.sohbet/logs)
pub fn logs_dir() -> PathBuf {
    config_dir().join("logs")
}

/// Persisted session identity file (~/.sohbet/session.json)
pub fn identity_file() -> PathBuf {
    config_dir().join(constants::session::IDENTITY_FILE)
}
