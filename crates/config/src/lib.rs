//! Configuration storage for Bazaar applications
//!
//! File-level helpers for the shared Bazaar config directory
//! (~/.config/bazaar/): resolve it, create it, and read/write JSON records
//! inside it. The session layer builds its persistence on these.

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};

/// Get the Bazaar config directory (~/.config/bazaar/)
pub fn config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("bazaar"))
}

/// Ensure the Bazaar config directory exists, returning its path
pub fn ensure_config_dir() -> Result<PathBuf> {
    let dir = config_dir().context("Could not determine config directory")?;
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create config directory: {}", dir.display()))?;
    Ok(dir)
}

/// Load and parse a JSON file
pub fn load_json_file<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Save a value as pretty-printed JSON
pub fn save_json_file<T: serde::Serialize>(path: &Path, value: &T) -> Result<()> {
    let content =
        serde_json::to_string_pretty(value).context("Failed to serialize config value")?;
    std::fs::write(path, content)
        .with_context(|| format!("Failed to write config file: {}", path.display()))?;
    Ok(())
}

/// Remove a config file, ignoring the case where it does not exist
pub fn remove_file(path: &Path) -> Result<()> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => {
            Err(e).with_context(|| format!("Failed to remove config file: {}", path.display()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};
    use tempfile::TempDir;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Sample {
        name: String,
        count: u32,
    }

    #[test]
    fn test_save_and_load_json_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("sample.json");

        let value = Sample {
            name: "test".to_string(),
            count: 3,
        };
        save_json_file(&path, &value).unwrap();

        let loaded: Sample = load_json_file(&path).unwrap();
        assert_eq!(loaded, value);
    }

    #[test]
    fn test_load_missing_file_fails() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing.json");
        assert!(load_json_file::<Sample>(&path).is_err());
    }

    #[test]
    fn test_load_malformed_file_fails() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "not json").unwrap();
        assert!(load_json_file::<Sample>(&path).is_err());
    }

    #[test]
    fn test_remove_file_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("gone.json");

        std::fs::write(&path, "{}").unwrap();
        remove_file(&path).unwrap();
        assert!(!path.exists());

        // Removing again is not an error
        remove_file(&path).unwrap();
    }
}
