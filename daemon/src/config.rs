use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const PLACEHOLDER_TOKEN: &str = "add_your_token_here";
pub const PLACEHOLDER_USER_KEY: &str = "add_your_user_key_here";

/// Root configuration structure. Deserialized from config.toml in the app
/// data directory (see [`crate::paths`]).
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub pushover: PushoverConfig,
    #[serde(default)]
    pub journal: JournalConfig,
}

/// Pushover credentials and delivery target.
#[derive(Debug, Serialize, Deserialize)]
pub struct PushoverConfig {
    /// Application API token.
    #[serde(default = "placeholder_token")]
    pub token: String,
    /// User key identifying the receiving account.
    #[serde(default = "placeholder_user_key")]
    pub user_key: String,
    /// Device name to deliver to; empty sends to every device on the account.
    #[serde(default)]
    pub device: String,
}

impl Default for PushoverConfig {
    fn default() -> Self {
        Self {
            token: PLACEHOLDER_TOKEN.to_string(),
            user_key: PLACEHOLDER_USER_KEY.to_string(),
            device: String::new(),
        }
    }
}

impl PushoverConfig {
    /// True while the template placeholders have not been filled in.
    pub fn is_placeholder(&self) -> bool {
        self.token == PLACEHOLDER_TOKEN || self.user_key == PLACEHOLDER_USER_KEY
    }
}

/// Journal discovery overrides.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct JournalConfig {
    /// Journal directory; when unset the platform default location is used.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
}

/// Loads the config file at `path`, returning `Config::default()` if the file does not exist.
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_or_default(path: &Path) -> Result<Config> {
    if !path.exists() {
        return Ok(Config::default());
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Writes a placeholder config for the user to fill in, creating the parent
/// directory if needed.
pub fn write_template(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    let content = toml::to_string_pretty(&Config::default())
        .context("Failed to serialize template config")?;
    std::fs::write(path, content)
        .with_context(|| format!("Failed to write config template: {}", path.display()))
}

fn placeholder_token() -> String {
    PLACEHOLDER_TOKEN.to_string()
}

fn placeholder_user_key() -> String {
    PLACEHOLDER_USER_KEY.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── defaults ──────────────────────────────────────────────────────────────

    #[test]
    fn default_config_is_all_placeholders() {
        let c = Config::default();
        assert_eq!(c.pushover.token, PLACEHOLDER_TOKEN);
        assert_eq!(c.pushover.user_key, PLACEHOLDER_USER_KEY);
        assert!(c.pushover.device.is_empty());
        assert!(c.journal.dir.is_none());
    }

    #[test]
    fn placeholder_detection() {
        let mut p = PushoverConfig::default();
        assert!(p.is_placeholder());

        p.token = "azGDORePK8gMaC0QOYAMyEEuzJnyUi".to_string();
        assert!(p.is_placeholder());

        p.user_key = "uQiRzpo4DXghDmr9QzzfQu27cmVRsG".to_string();
        assert!(!p.is_placeholder());
    }

    // ── load_or_default ───────────────────────────────────────────────────────

    #[test]
    fn load_or_default_missing_file_returns_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nonexistent.toml");
        let config = load_or_default(&path).unwrap();
        assert!(config.pushover.is_placeholder());
    }

    #[test]
    fn load_or_default_parses_valid_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[pushover]
token = "app-token"
user_key = "user-key"
device = "phone"

[journal]
dir = "/tmp/journal"
"#,
        )
        .unwrap();

        let config = load_or_default(&path).unwrap();
        assert_eq!(config.pushover.token, "app-token");
        assert_eq!(config.pushover.user_key, "user-key");
        assert_eq!(config.pushover.device, "phone");
        assert_eq!(config.journal.dir.as_deref(), Some(Path::new("/tmp/journal")));
        assert!(!config.pushover.is_placeholder());
    }

    #[test]
    fn load_or_default_partial_toml_uses_field_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[pushover]\ntoken = \"app-token\"\n").unwrap();

        let config = load_or_default(&path).unwrap();
        assert_eq!(config.pushover.token, "app-token");
        assert_eq!(config.pushover.user_key, PLACEHOLDER_USER_KEY);
        assert!(config.pushover.is_placeholder());
        assert!(config.journal.dir.is_none());
    }

    #[test]
    fn load_or_default_invalid_toml_returns_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "this is not valid toml ][[[").unwrap();
        assert!(load_or_default(&path).is_err());
    }

    // ── write_template ────────────────────────────────────────────────────────

    #[test]
    fn write_template_round_trips_as_placeholders() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        write_template(&path).unwrap();
        let config = load_or_default(&path).unwrap();

        assert!(config.pushover.is_placeholder());
        assert!(config.journal.dir.is_none());
    }
}
