//! Repo commands - Show or persist the default repository

use anyhow::Result;
use std::path::Path;

use crate::color::{self, ColorMode};
use crate::config::ConfigStore;
use crate::domain::locate::{resolve, LocatorContext, GIT_DIR_ENV};
use crate::domain::paths::{canonicalize_allow_missing, normalize_repo_path};

/// With a path: export and remember it. Without: show what would be used.
///
/// The explicit path is made absolute and normalized (`repo/` becomes
/// `repo/.git`) but not validated, so a repository can be registered before
/// it is cloned.
///
/// # Errors
/// Returns an error if the config file cannot be written
pub fn cmd_repo(git_dir: Option<&Path>, color_mode: ColorMode) -> Result<()> {
    let mut store = ConfigStore::load(color_mode);

    let Some(path) = git_dir else {
        let ctx = LocatorContext::from_environment(store.default_repo().map(str::to_string));
        match resolve(None, &ctx).location {
            Some(location) => println!("Current repo: {}", location.display()),
            None => println!("No repo currently configured"),
        }
        return Ok(());
    };

    let location = normalize_repo_path(&canonicalize_allow_missing(path));
    let location_text = location.to_string_lossy().into_owned();
    println!("{GIT_DIR_ENV}={location_text}");
    store.set_default_repo(&location_text)?;
    eprintln!(
        "{}",
        color::success(color_mode, format!("Default repo set to {location_text}"))
    );
    Ok(())
}

/// Print `default_repo` when it names an existing directory
///
/// Prints nothing otherwise; used by shell helpers.
pub fn cmd_get_repo(color_mode: ColorMode) {
    let store = ConfigStore::load(color_mode);
    if let Some(repo) = store.default_repo() {
        if Path::new(repo).is_dir() {
            println!("{repo}");
        }
    }
}
