// Configuration loading and local persistence

pub mod ai;
pub mod settings;
pub mod store;

use std::path::PathBuf;

/// Application config directory (`<config_dir>/typecalc`)
pub fn config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("typecalc")
}
