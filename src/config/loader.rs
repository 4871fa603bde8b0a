//! Configuration loading and persistence

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use super::schema::{Config, RepoConfig};
use crate::color::{self, ColorMode};

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        Ok(config)
    }

    /// Write configuration as TOML, creating parent directories
    ///
    /// # Errors
    /// Returns an error if serialization or the write fails
    pub fn write_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))
    }

    /// Get the global config path
    /// Respects `XDG_CONFIG_HOME` when it is absolute.
    /// Fallback: `$HOME/.config/gwt/config.toml`
    #[must_use]
    pub fn global_config_path() -> Option<PathBuf> {
        let config_home = std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .filter(|p| p.is_absolute())
            .or_else(|| dirs::home_dir().map(|home| home.join(".config")))?;

        Some(config_home.join("gwt").join("config.toml"))
    }
}

/// Loaded configuration plus where (and whether) to persist changes
#[derive(Debug)]
pub struct ConfigStore {
    config: Config,
    path: Option<PathBuf>,
    writable: bool,
    color_mode: ColorMode,
}

impl ConfigStore {
    /// Load from the global config path
    #[must_use]
    pub fn load(color_mode: ColorMode) -> Self {
        Self::load_from(Config::global_config_path(), color_mode)
    }

    /// Load from `path`; None gives a store that never persists
    ///
    /// A missing file is created with defaults. An unparseable file is
    /// reported and left untouched for the rest of the invocation.
    #[must_use]
    pub fn load_from(path: Option<PathBuf>, color_mode: ColorMode) -> Self {
        let Some(path) = path else {
            log::debug!("no config directory, using in-memory config");
            return Self::in_memory(color_mode);
        };

        if !path.exists() {
            let config = Config::default();
            if let Err(err) = config.write_to(&path) {
                eprintln!(
                    "{}",
                    color::warn(color_mode, format!("Could not create config file: {err:#}"))
                );
            }
            return Self {
                config,
                path: Some(path),
                writable: true,
                color_mode,
            };
        }

        match Config::from_file(&path) {
            Ok(config) => Self {
                config,
                path: Some(path),
                writable: true,
                color_mode,
            },
            Err(err) => {
                eprintln!(
                    "{}",
                    color::warn(color_mode, format!("{err:#}; using defaults"))
                );
                Self {
                    config: Config::default(),
                    path: Some(path),
                    writable: false,
                    color_mode,
                }
            }
        }
    }

    /// Store that keeps changes in memory only
    #[must_use]
    pub fn in_memory(color_mode: ColorMode) -> Self {
        Self {
            config: Config::default(),
            path: None,
            writable: false,
            color_mode,
        }
    }

    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// File backing this store, if any
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    #[must_use]
    pub fn default_repo(&self) -> Option<&str> {
        self.config.default_repo.as_deref()
    }

    /// Record `location` as the default repository
    ///
    /// # Errors
    /// Returns an error if the store cannot be persisted
    pub fn set_default_repo(&mut self, location: &str) -> Result<()> {
        self.config.default_repo = Some(location.to_string());
        self.save()
    }

    /// Settings for `location`, created empty and persisted on first access
    pub fn repo_config(&mut self, location: &str) -> RepoConfig {
        if let Some(existing) = self.config.repos.get(location) {
            return existing.clone();
        }

        self.config
            .repos
            .insert(location.to_string(), RepoConfig::default());
        if let Err(err) = self.save() {
            eprintln!("{}", color::warn(self.color_mode, format!("{err:#}")));
        }
        RepoConfig::default()
    }

    fn save(&self) -> Result<()> {
        match (&self.path, self.writable) {
            (Some(path), true) => self.config.write_to(path),
            (Some(path), false) => anyhow::bail!(
                "Config file {} was not loaded cleanly; not overwriting it",
                path.display()
            ),
            (None, _) => {
                log::debug!("config change kept in memory only");
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_is_created_with_defaults() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("gwt").join("config.toml");
        let store = ConfigStore::load_from(Some(path.clone()), ColorMode::Never);
        assert!(path.is_file());
        assert_eq!(store.config(), &Config::default());
        assert_eq!(Config::from_file(&path).unwrap(), Config::default());
    }

    #[test]
    fn test_repo_config_is_created_and_persisted() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        let mut store = ConfigStore::load_from(Some(path.clone()), ColorMode::Never);

        let repo = store.repo_config("/src/project/.git");
        assert!(repo.post_create_commands.is_empty());

        let on_disk = Config::from_file(&path).unwrap();
        assert!(on_disk.repos.contains_key("/src/project/.git"));
    }

    #[test]
    fn test_existing_repo_config_is_read() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
default_repo = "/srv/project.git"

[repos."/srv/project.git"]
post_create_commands = ["npm install", "cp ../.env ."]
"#,
        )
        .unwrap();

        let mut store = ConfigStore::load_from(Some(path), ColorMode::Never);
        assert_eq!(store.default_repo(), Some("/srv/project.git"));
        assert_eq!(
            store.repo_config("/srv/project.git").post_create_commands,
            vec!["npm install", "cp ../.env ."]
        );
    }

    #[test]
    fn test_unparseable_file_is_never_overwritten() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        std::fs::write(&path, "default_repo = [unterminated").unwrap();

        let mut store = ConfigStore::load_from(Some(path.clone()), ColorMode::Never);
        assert_eq!(store.config(), &Config::default());
        assert!(store.set_default_repo("/x/.git").is_err());
        let _ = store.repo_config("/x/.git");
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "default_repo = [unterminated"
        );
    }

    #[test]
    fn test_set_default_repo_round_trips() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        let mut store = ConfigStore::load_from(Some(path.clone()), ColorMode::Never);
        store.set_default_repo("/srv/project.git").unwrap();

        let reloaded = ConfigStore::load_from(Some(path), ColorMode::Never);
        assert_eq!(reloaded.default_repo(), Some("/srv/project.git"));
    }

    #[test]
    fn test_in_memory_store_accepts_changes() {
        let mut store = ConfigStore::in_memory(ColorMode::Never);
        assert!(store.path().is_none());
        store.set_default_repo("/a/.git").unwrap();
        assert_eq!(store.default_repo(), Some("/a/.git"));
    }

    #[test]
    #[serial_test::serial]
    fn test_global_config_path_with_xdg_env() {
        let xdg_path = std::env::temp_dir().join("xdg_config");
        temp_env::with_var("XDG_CONFIG_HOME", Some(&xdg_path), || {
            assert_eq!(
                Config::global_config_path(),
                Some(xdg_path.join("gwt").join("config.toml"))
            );
        });
    }

    #[test]
    #[serial_test::serial]
    fn test_global_config_path_relative_xdg_ignored() {
        temp_env::with_var("XDG_CONFIG_HOME", Some("relative/path"), || {
            if let Some(path) = Config::global_config_path() {
                assert!(path.ends_with(".config/gwt/config.toml"));
            }
        });
    }
}
