use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::storage::Storage;

/// Expiry behaviour options, edited via the CLI and read once when the panel
/// starts.
#[derive(Serialize, Deserialize, Debug, Clone, Copy)]
pub struct Options {
    /// Skip the attention popup when the expiring alarm has a command.
    #[serde(default)]
    pub suppress_popup_when_command_set: bool,
    /// Re-run the command after expiry.
    #[serde(default)]
    pub repeat_enabled: bool,
    /// Total number of launches when repeating, the first at expiry time.
    #[serde(default = "default_repeat_count")]
    pub repeat_count: u32,
    /// Seconds between repeated launches.
    #[serde(default = "default_repeat_interval")]
    pub repeat_interval_secs: u32,
}

fn default_repeat_count() -> u32 {
    1
}

fn default_repeat_interval() -> u32 {
    10
}

impl Default for Options {
    fn default() -> Self {
        Self {
            suppress_popup_when_command_set: false,
            repeat_enabled: false,
            repeat_count: default_repeat_count(),
            repeat_interval_secs: default_repeat_interval(),
        }
    }
}

impl Options {
    /// Clamp values a hand-edited config file could have broken. Repeat
    /// count and interval must both be at least 1.
    pub fn sanitized(mut self) -> Self {
        self.repeat_count = self.repeat_count.max(1);
        self.repeat_interval_secs = self.repeat_interval_secs.max(1);
        self
    }
}

pub fn load_options() -> Result<Options> {
    let path = Storage::get_base_dir()?.join("config.json");
    load_from(&path)
}

pub fn save_options(options: &Options) -> Result<()> {
    let path = Storage::get_base_dir()?.join("config.json");
    save_to(&path, options)
}

fn load_from(path: &Path) -> Result<Options> {
    if !path.exists() {
        let options = Options::default();
        save_to(path, &options)?;
        return Ok(options);
    }
    let data = fs::read_to_string(path)?;
    let options: Options = serde_json::from_str(&data)?;
    Ok(options.sanitized())
}

fn save_to(path: &Path, options: &Options) -> Result<()> {
    let data = serde_json::to_string_pretty(options)?;
    fs::write(path, data)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let options = Options::default();
        assert!(!options.suppress_popup_when_command_set);
        assert!(!options.repeat_enabled);
        assert_eq!(options.repeat_count, 1);
        assert_eq!(options.repeat_interval_secs, 10);
    }

    #[test]
    fn test_sanitized_clamps_to_one() {
        let options = Options {
            repeat_count: 0,
            repeat_interval_secs: 0,
            ..Options::default()
        };
        let options = options.sanitized();
        assert_eq!(options.repeat_count, 1);
        assert_eq!(options.repeat_interval_secs, 1);
    }

    #[test]
    fn test_load_missing_writes_defaults() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("config.json");
        let options = load_from(&path)?;
        assert_eq!(options.repeat_count, 1);
        assert!(path.exists());
        Ok(())
    }

    #[test]
    fn test_save_load_roundtrip() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("config.json");
        let options = Options {
            suppress_popup_when_command_set: true,
            repeat_enabled: true,
            repeat_count: 3,
            repeat_interval_secs: 10,
        };
        save_to(&path, &options)?;
        let loaded = load_from(&path)?;
        assert!(loaded.suppress_popup_when_command_set);
        assert!(loaded.repeat_enabled);
        assert_eq!(loaded.repeat_count, 3);
        Ok(())
    }

    #[test]
    fn test_load_sanitizes_bad_values() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{"suppress_popup_when_command_set":false,"repeat_enabled":true,"repeat_count":0,"repeat_interval_secs":0}"#,
        )?;
        let loaded = load_from(&path)?;
        assert_eq!(loaded.repeat_count, 1);
        assert_eq!(loaded.repeat_interval_secs, 1);
        Ok(())
    }
}
