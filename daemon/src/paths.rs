/// Canonical locations for edwatch's own files and the game's journal.
///
/// The config lives under the platform app-data directory:
///   Windows  %APPDATA%\edwatch\config.toml
///   other    $XDG_CONFIG_HOME/edwatch/config.toml (or ~/.config/edwatch/)
use std::path::PathBuf;

const APP_DIR_NAME: &str = "edwatch";
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Returns the edwatch application data directory.
#[cfg(windows)]
pub fn app_data_dir() -> PathBuf {
    let appdata = std::env::var("APPDATA").expect("APPDATA environment variable not set");
    PathBuf::from(appdata).join(APP_DIR_NAME)
}

/// Returns the edwatch application data directory.
#[cfg(not(windows))]
pub fn app_data_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(xdg).join(APP_DIR_NAME);
    }
    let home = std::env::var("HOME").expect("HOME environment variable not set");
    PathBuf::from(home).join(".config").join(APP_DIR_NAME)
}

/// Returns the full path to the config file.
pub fn config_file_path() -> PathBuf {
    app_data_dir().join(CONFIG_FILE_NAME)
}

/// Default game journal directory.
///
/// The game writes journals under the user's Saved Games folder on Windows.
/// Elsewhere (Proton prefixes, test rigs) there is no fixed location; the
/// `[journal] dir` config key is expected to point at the right place.
#[cfg(windows)]
pub fn default_journal_dir() -> PathBuf {
    let profile = std::env::var("USERPROFILE").expect("USERPROFILE environment variable not set");
    PathBuf::from(profile)
        .join("Saved Games")
        .join("Frontier Developments")
        .join("Elite Dangerous")
}

/// Default game journal directory.
#[cfg(not(windows))]
pub fn default_journal_dir() -> PathBuf {
    app_data_dir().join("journal")
}
