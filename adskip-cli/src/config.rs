use std::path::{Path, PathBuf};

use adskip_engine::AdSkipConfig;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{AppError, Result};

const APP_DIR: &str = "adskip";
const CONFIG_FILE: &str = "config.toml";
const STATE_FILE: &str = "state.json";
const PAC_FILE: &str = "adskip.pac";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Where the activation state and the PAC file live
    pub state_dir: Option<PathBuf>,

    /// Engine settings
    pub engine: AdSkipConfig,
}

impl AppConfig {
    /// Load from `explicit`, else from the default location if it exists,
    /// else fall back to defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) if !path.is_file() => Err(AppError::ConfigNotFound(path.to_path_buf())),
            Some(path) => Self::from_file(path),
            None => match Self::default_path().filter(|p| p.is_file()) {
                Some(path) => Self::from_file(&path),
                None => {
                    debug!("No config file found, using defaults");
                    Ok(Self::default())
                }
            },
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&raw).map_err(|source| AppError::Config {
            path: path.to_path_buf(),
            source,
        })?;
        config
            .engine
            .validate()
            .map_err(|source| AppError::InvalidConfig {
                path: path.to_path_buf(),
                source,
            })?;
        debug!(path = %path.display(), "Loaded config");
        Ok(config)
    }

    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
    }

    pub fn state_dir(&self) -> PathBuf {
        self.state_dir
            .clone()
            .or_else(|| dirs::data_local_dir().map(|dir| dir.join(APP_DIR)))
            .unwrap_or_else(|| PathBuf::from(".").join(APP_DIR))
    }

    pub fn state_file(&self) -> PathBuf {
        self.state_dir().join(STATE_FILE)
    }

    pub fn pac_file(&self) -> PathBuf {
        self.state_dir().join(PAC_FILE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn reads_partial_toml() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
state_dir = "/var/lib/adskip"

[engine]
fetch_timeout_ms = 1500
ad_keywords = ["sponsor"]

[engine.skip]
max_secs = 20.0

[engine.pac]
host_patterns = ["*.example.net"]
"#,
        )
        .unwrap();

        let config = AppConfig::load(Some(&path)).unwrap();
        assert_eq!(config.state_file(), PathBuf::from("/var/lib/adskip/state.json"));
        assert_eq!(config.engine.fetch_timeout_ms, 1500);
        assert_eq!(config.engine.ad_keywords, vec!["sponsor".to_string()]);
        assert_eq!(config.engine.skip.max_secs, 20.0);
        assert_eq!(config.engine.skip.min_secs, 5.0);
        assert_eq!(config.engine.pac.host_patterns, vec!["*.example.net".to_string()]);
        assert_eq!(config.engine.swap_debounce_ms, 500);
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let dir = tempdir().unwrap();
        let err = AppConfig::load(Some(&dir.path().join("nope.toml"))).unwrap_err();
        assert!(matches!(err, AppError::ConfigNotFound(_)));
    }

    #[test]
    fn malformed_file_reports_its_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "engine = 3").unwrap();
        let err = AppConfig::load(Some(&path)).unwrap_err();
        assert!(err.to_string().contains("config.toml"));
    }

    #[test]
    fn crossed_skip_bounds_are_rejected_at_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[engine.skip]\nmax_secs = 3.0\n").unwrap();
        let err = AppConfig::load(Some(&path)).unwrap_err();
        assert!(matches!(err, AppError::InvalidConfig { .. }));
        let message = err.to_string();
        assert!(message.contains("config.toml"), "{message}");
        assert!(message.contains("max_secs"), "{message}");
    }

    #[test]
    fn zero_poll_interval_is_rejected_at_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[engine]\nvideo_poll_interval_ms = 0\n").unwrap();
        assert!(matches!(
            AppConfig::load(Some(&path)).unwrap_err(),
            AppError::InvalidConfig { .. }
        ));
    }
}
