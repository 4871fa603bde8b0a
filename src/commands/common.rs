//! Helpers shared by command handlers

use anyhow::Result;
use std::path::{Path, PathBuf};

use crate::config::ConfigStore;
use crate::domain::locate::{resolve, LocatorContext};

/// Locate the repository for this invocation
///
/// The config store is the only source of `default_repo`; the locator reads
/// the environment and working directory itself.
///
/// # Errors
/// Returns a [`crate::domain::locate::ResolutionError`] (wrapped in anyhow) when
/// no usable location exists
pub fn resolve_repository(explicit: Option<&Path>, store: &ConfigStore) -> Result<PathBuf> {
    let ctx = LocatorContext::from_environment(store.default_repo().map(str::to_string));
    let resolved = resolve(explicit, &ctx);
    Ok(resolved.into_location(store.path())?)
}

/// Ask the shell wrapper to change directory
///
/// The wrapper takes everything after `cd ` literally, so paths are not quoted.
pub fn request_cd(path: &Path) {
    println!("cd {}", path.display());
}

/// Working directory of the process, if it still exists
pub fn current_dir() -> Option<PathBuf> {
    std::env::current_dir().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::ColorMode;
    use crate::domain::locate::{ResolutionError, GIT_DIR_ENV};
    use serial_test::serial;
    use tempfile::TempDir;

    #[test]
    #[serial]
    fn test_explicit_location_wins() {
        let temp = TempDir::new().unwrap();
        let repo = temp.path().join("project");
        std::fs::create_dir_all(repo.join(".git")).unwrap();

        let store = ConfigStore::in_memory(ColorMode::Never);
        let location = resolve_repository(Some(&repo), &store).unwrap();
        assert_eq!(location, repo.join(".git"));
    }

    #[test]
    #[serial]
    fn test_invalid_env_is_typed_error() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("missing");
        temp_env::with_var(GIT_DIR_ENV, Some(missing.as_os_str()), || {
            let original = std::env::current_dir().unwrap();
            std::env::set_current_dir(temp.path()).unwrap();
            let store = ConfigStore::in_memory(ColorMode::Never);
            let result = resolve_repository(None, &store);
            std::env::set_current_dir(original).unwrap();

            let err = result.unwrap_err();
            assert!(matches!(
                err.downcast_ref::<ResolutionError>(),
                Some(ResolutionError::EnvInvalid { .. })
            ));
        });
    }
}
