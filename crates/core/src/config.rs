//! User settings persisted between runs.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

/// Directory under the user's config dir holding romlink files.
pub const APP_DIR: &str = "romlink";
/// Settings file name inside [`APP_DIR`].
pub const CONFIG_FILE: &str = "config.json";
/// Prefix for environment overrides (e.g. `ROMLINK_HOST`).
pub const ENV_PREFIX: &str = "ROMLINK";

/// Settings problems that make the remote library unusable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// No remote host configured.
    #[error("remote host is not configured")]
    MissingHost,
    /// No local library directory configured.
    #[error("local library path is not configured")]
    MissingLibraryPath,
}

/// Application settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Remote library host, with or without scheme.
    pub host: String,
    /// Remote library user name.
    pub username: String,
    /// Remote library password.
    pub password: String,
    /// Local folder mirrored from the server.
    pub library_path: PathBuf,
    /// Emulator install directory (holds `saves/` and `states/`).
    pub emulator_path: PathBuf,
    /// Emulator executable, relative to `emulator_path` unless absolute.
    pub emulator_executable: String,
    /// Achievements service user name.
    pub achievements_username: String,
    /// Achievements service password.
    pub achievements_password: String,
}

impl AppConfig {
    /// Load settings from the default location.
    pub fn load() -> Result<Self> {
        Self::load_from(default_config_path())
    }

    /// Load settings from `path`, layering `ROMLINK_*` variables on top.
    ///
    /// A missing file is not an error; defaults apply.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        Self::load_layered(path.as_ref(), environment())
    }

    fn load_layered(path: &Path, env: Environment) -> Result<Self> {
        let settings = Config::builder()
            .add_source(
                File::from(path)
                    .format(FileFormat::Json)
                    .required(false),
            )
            .add_source(env)
            .build()
            .with_context(|| format!("failed to read config {}", path.display()))?;

        settings
            .try_deserialize()
            .with_context(|| format!("failed to parse config {}", path.display()))
    }

    /// Persist settings to the default location.
    pub fn save(&self) -> Result<()> {
        self.save_to(default_config_path())
    }

    /// Persist settings to `path`, creating parent directories if needed.
    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let serialized =
            serde_json::to_string_pretty(self).context("failed to serialize settings")?;
        fs::write(path, serialized).with_context(|| format!("failed to write {}", path.display()))
    }

    /// Check the settings needed to talk to the server and mirror files.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.host.trim().is_empty() {
            return Err(ConfigError::MissingHost);
        }
        if self.library_path.as_os_str().is_empty() {
            return Err(ConfigError::MissingLibraryPath);
        }
        Ok(())
    }

    /// Base URL of the remote API, without a trailing slash.
    pub fn api_base(&self) -> String {
        let host = self.host.trim().trim_end_matches('/');
        if host.contains("://") {
            host.to_string()
        } else {
            format!("http://{host}")
        }
    }

    /// Local ROM folder.
    pub fn roms_dir(&self) -> PathBuf {
        self.library_path.join("roms")
    }

    /// Emulator save folder.
    pub fn saves_dir(&self) -> PathBuf {
        self.emulator_path.join("saves")
    }

    /// Emulator state folder.
    pub fn states_dir(&self) -> PathBuf {
        self.emulator_path.join("states")
    }

    /// Full path of the emulator executable.
    pub fn emulator_executable_path(&self) -> PathBuf {
        let executable = Path::new(&self.emulator_executable);
        if executable.is_absolute() {
            executable.to_path_buf()
        } else {
            self.emulator_path.join(executable)
        }
    }
}

fn environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX).try_parsing(false)
}

/// Location of the romlink config directory.
pub fn config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
}

/// Default settings file path.
pub fn default_config_path() -> PathBuf {
    config_dir().join(CONFIG_FILE)
}

/// Write a default settings file if none exists yet.
pub fn ensure_default_config() -> Result<PathBuf> {
    let path = default_config_path();
    ensure_config_at(&path)?;
    Ok(path)
}

/// Write a default settings file at `path` if none exists yet.
pub fn ensure_config_at(path: &Path) -> Result<bool> {
    if path.exists() {
        return Ok(false);
    }
    info!("writing default settings to {}", path.display());
    AppConfig::default().save_to(path)?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::Map;
    use tempfile::tempdir;

    fn load_isolated(path: &Path) -> Result<AppConfig> {
        load_with_vars(path, &[])
    }

    fn load_with_vars(path: &Path, vars: &[(&str, &str)]) -> Result<AppConfig> {
        let vars: Map<String, String> = vars
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        AppConfig::load_layered(path, environment().source(Some(vars)))
    }

    fn sample() -> AppConfig {
        AppConfig {
            host: "romm.local:8080/".to_string(),
            username: "player".to_string(),
            password: "hunter2".to_string(),
            library_path: PathBuf::from("/games"),
            emulator_path: PathBuf::from("/opt/retroarch"),
            emulator_executable: "retroarch".to_string(),
            achievements_username: String::new(),
            achievements_password: String::new(),
        }
    }

    #[test]
    fn save_then_load_preserves_settings() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("nested").join(CONFIG_FILE);

        let config = sample();
        config.save_to(&path)?;
        let loaded = load_isolated(&path)?;
        assert_eq!(loaded, config);
        Ok(())
    }

    #[test]
    fn missing_file_yields_defaults() -> Result<()> {
        let dir = tempdir()?;
        let loaded = load_isolated(&dir.path().join("absent.json"))?;
        assert_eq!(loaded.library_path, PathBuf::new());
        assert_eq!(loaded.validate(), Err(ConfigError::MissingHost));
        Ok(())
    }

    #[test]
    fn partial_file_fills_remaining_defaults() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join(CONFIG_FILE);
        fs::write(&path, r#"{ "host": "https://romm.example.com" }"#)?;

        let loaded = load_isolated(&path)?;
        assert_eq!(loaded.host, "https://romm.example.com");
        assert_eq!(loaded.validate(), Err(ConfigError::MissingLibraryPath));
        Ok(())
    }

    #[test]
    fn environment_overrides_file_values() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join(CONFIG_FILE);
        sample().save_to(&path)?;

        let loaded = load_with_vars(
            &path,
            &[
                ("ROMLINK_HOST", "https://override.example.com"),
                ("ROMLINK_LIBRARY_PATH", "/override"),
                ("OTHERAPP_USERNAME", "ignored"),
            ],
        )?;
        assert_eq!(loaded.host, "https://override.example.com");
        assert_eq!(loaded.library_path, PathBuf::from("/override"));
        assert_eq!(loaded.username, "player");
        assert_eq!(loaded.emulator_path, PathBuf::from("/opt/retroarch"));
        Ok(())
    }

    #[test]
    fn environment_alone_configures_a_missing_file() -> Result<()> {
        let dir = tempdir()?;
        let loaded = load_with_vars(
            &dir.path().join("absent.json"),
            &[
                ("ROMLINK_HOST", "romm.lan"),
                ("ROMLINK_LIBRARY_PATH", "/games"),
            ],
        )?;
        assert_eq!(loaded.api_base(), "http://romm.lan");
        assert!(loaded.validate().is_ok());
        Ok(())
    }

    #[test]
    fn ensure_config_writes_once() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join(CONFIG_FILE);
        assert!(ensure_config_at(&path)?);
        assert!(path.exists());
        assert!(!ensure_config_at(&path)?);
        Ok(())
    }

    #[test]
    fn derived_paths() {
        let config = sample();
        assert_eq!(config.api_base(), "http://romm.local:8080");
        assert_eq!(config.roms_dir(), PathBuf::from("/games/roms"));
        assert_eq!(config.saves_dir(), PathBuf::from("/opt/retroarch/saves"));
        assert_eq!(config.states_dir(), PathBuf::from("/opt/retroarch/states"));
        assert_eq!(
            config.emulator_executable_path(),
            PathBuf::from("/opt/retroarch/retroarch")
        );
        assert!(config.validate().is_ok());
    }
}
