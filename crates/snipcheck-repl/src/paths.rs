//! XDG Base Directory paths for snipcheck.
//!
//! | Purpose | XDG Variable | Default | snipcheck Path |
//! |---------|--------------|---------|----------------|
//! | Config | `$XDG_CONFIG_HOME` | `~/.config` | `$XDG_CONFIG_HOME/snipcheck/config.toml` |
//! | History | `$XDG_DATA_HOME` | `~/.local/share` | `$XDG_DATA_HOME/snipcheck/history.txt` |

use std::path::PathBuf;

use directories::BaseDirs;

/// Get the config directory.
///
/// Uses `$XDG_CONFIG_HOME/snipcheck` or falls back to `~/.config/snipcheck`.
pub fn config_dir() -> PathBuf {
    BaseDirs::new()
        .map(|d| d.config_dir().to_path_buf())
        .unwrap_or_else(|| home_fallback().join(".config"))
        .join("snipcheck")
}

/// Get the data directory.
///
/// Uses `$XDG_DATA_HOME/snipcheck` or falls back to `~/.local/share/snipcheck`.
pub fn data_dir() -> PathBuf {
    BaseDirs::new()
        .map(|d| d.data_dir().to_path_buf())
        .unwrap_or_else(|| home_fallback().join(".local").join("share"))
        .join("snipcheck")
}

/// The default config file.
pub fn config_file() -> PathBuf {
    config_dir().join("config.toml")
}

/// REPL line history.
pub fn history_file() -> PathBuf {
    data_dir().join("history.txt")
}

/// Fallback home directory when BaseDirs fails.
fn home_fallback() -> PathBuf {
    std::env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| std::env::temp_dir())
}
