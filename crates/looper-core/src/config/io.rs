//! YAML persistence for looper settings
//!
//! Settings files are optional: a missing or unreadable file leaves the
//! looper on its defaults instead of failing the host.

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;

/// Load looper settings from a YAML file
///
/// A missing file means defaults. A file that can't be read or parsed is
/// reported with `log::warn!` and also falls back to defaults.
///
/// # Example
///
/// ```ignore
/// let config: LooperConfig = load_config(Path::new("looper.yaml"));
/// ```
pub fn load_config<T>(path: &Path) -> T
where
    T: DeserializeOwned + Default,
{
    if !path.exists() {
        log::info!("Looper settings {:?} not found, starting from defaults", path);
        return T::default();
    }

    match read_yaml(path) {
        Ok(config) => {
            log::info!("Looper settings loaded from {:?}", path);
            config
        }
        Err(e) => {
            log::warn!("Ignoring looper settings {:?}: {:#}", path, e);
            T::default()
        }
    }
}

fn read_yaml<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let contents = std::fs::read_to_string(path).context("unreadable settings file")?;
    serde_yaml::from_str(&contents).context("malformed looper settings")
}

/// Save looper settings as YAML, creating missing parent directories
pub fn save_config<T>(config: &T, path: &Path) -> Result<()>
where
    T: Serialize,
{
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create settings directory {:?}", parent))?;
    }

    let yaml = serde_yaml::to_string(config).context("Failed to encode looper settings")?;
    std::fs::write(path, yaml)
        .with_context(|| format!("Failed to write looper settings to {:?}", path))?;

    log::info!("Looper settings saved to {:?}", path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LooperConfig;
    use crate::engine::{Movement, TriggerMode};

    #[test]
    fn test_load_nonexistent_returns_default() {
        let config: LooperConfig = load_config(Path::new("/nonexistent/path/looper.yaml"));
        assert_eq!(config, LooperConfig::default());
    }

    #[test]
    fn test_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("looper.yaml");

        let config = LooperConfig {
            feedback: 0.7,
            movement: Movement::Pendulum,
            trigger_mode: TriggerMode::Gate,
            auto_start: false,
            ..LooperConfig::default()
        };

        save_config(&config, &path).unwrap();
        let loaded: LooperConfig = load_config(&path);
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("looper.yaml");
        std::fs::write(&path, "mix: 0.25\nmovement: drunk\n").unwrap();

        let loaded: LooperConfig = load_config(&path);
        assert_eq!(loaded.mix, 0.25);
        assert_eq!(loaded.movement, Movement::Drunk);
        assert_eq!(loaded.fade_samples, LooperConfig::default().fade_samples);
    }

    #[test]
    fn test_save_reports_unwritable_path() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("taken");
        std::fs::write(&blocker, "").unwrap();

        let err = save_config(&LooperConfig::default(), &blocker.join("looper.yaml")).unwrap_err();
        assert!(format!("{:#}", err).contains("settings directory"));
    }

    #[test]
    fn test_invalid_file_returns_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("looper.yaml");
        std::fs::write(&path, "mix: [not, a, number\n").unwrap();

        let loaded: LooperConfig = load_config(&path);
        assert_eq!(loaded, LooperConfig::default());
    }
}
