//! Repository location resolution
//!
//! Sources are consulted in a fixed order and the first applicable one
//! wins:
//!
//! 1. an explicit location passed for this invocation
//! 2. the repository containing the working directory
//! 3. the `GWT_GIT_DIR` environment variable
//! 4. `default_repo` from the config file
//!
//! A set-but-broken environment variable or config default stops resolution
//! with an error instead of falling through to the next source.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::domain::paths::normalize_repo_path;
use crate::integrations::git::detect_common_dir;

/// Environment variable carrying an explicit repository location
pub const GIT_DIR_ENV: &str = "GWT_GIT_DIR";

/// Which source produced (or failed to produce) the repository location
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepoSource {
    Arg,
    Auto,
    Env,
    EnvInvalid,
    Config,
    ConfigInvalid,
    None,
}

impl fmt::Display for RepoSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Arg => "argument",
            Self::Auto => "working directory",
            Self::Env => GIT_DIR_ENV,
            Self::EnvInvalid => "invalid GWT_GIT_DIR",
            Self::Config => "config default",
            Self::ConfigInvalid => "invalid config default",
            Self::None => "none",
        };
        f.write_str(name)
    }
}

/// Raw values seen during resolution, kept for error messages
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diagnostics {
    pub env_value: Option<String>,
    pub config_value: Option<String>,
}

/// Outcome of locating the repository
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRepository {
    /// Set exactly when `source` is `Arg`, `Auto`, `Env` or `Config`
    pub location: Option<PathBuf>,
    pub source: RepoSource,
    pub diagnostics: Diagnostics,
}

/// Ambient inputs to resolution, gathered once by the caller
#[derive(Debug, Clone, Default)]
pub struct LocatorContext {
    /// Directory used for auto-detection; None skips auto-detection
    pub cwd: Option<PathBuf>,
    pub env_value: Option<String>,
    pub config_value: Option<String>,
}

impl LocatorContext {
    /// Capture the working directory and `GWT_GIT_DIR`
    ///
    /// An empty `GWT_GIT_DIR` counts as unset.
    #[must_use]
    pub fn from_environment(config_value: Option<String>) -> Self {
        Self {
            cwd: std::env::current_dir().ok(),
            env_value: std::env::var(GIT_DIR_ENV).ok().filter(|v| !v.is_empty()),
            config_value: config_value.filter(|v| !v.is_empty()),
        }
    }
}

/// Resolve with git-based auto-detection
#[must_use]
pub fn resolve(explicit: Option<&Path>, ctx: &LocatorContext) -> ResolvedRepository {
    resolve_with(explicit, ctx, detect_common_dir)
}

/// Resolve with a caller-supplied auto-detector
pub fn resolve_with<F>(explicit: Option<&Path>, ctx: &LocatorContext, detect: F) -> ResolvedRepository
where
    F: Fn(&Path) -> Option<PathBuf>,
{
    let diagnostics = Diagnostics {
        env_value: ctx.env_value.clone(),
        config_value: ctx.config_value.clone(),
    };
    let found = |location: Option<PathBuf>, source: RepoSource| {
        log::debug!("repository source: {source}");
        ResolvedRepository {
            location,
            source,
            diagnostics: diagnostics.clone(),
        }
    };

    if let Some(path) = explicit {
        return found(Some(normalize_repo_path(path)), RepoSource::Arg);
    }

    if let Some(detected) = ctx.cwd.as_deref().and_then(&detect) {
        return found(Some(detected), RepoSource::Auto);
    }

    if let Some(value) = &ctx.env_value {
        let candidate = normalize_repo_path(Path::new(value));
        return if candidate.is_dir() {
            found(Some(candidate), RepoSource::Env)
        } else {
            found(None, RepoSource::EnvInvalid)
        };
    }

    if let Some(value) = &ctx.config_value {
        let candidate = normalize_repo_path(Path::new(value));
        return if candidate.is_dir() {
            found(Some(candidate), RepoSource::Config)
        } else {
            found(None, RepoSource::ConfigInvalid)
        };
    }

    found(None, RepoSource::None)
}

/// No usable repository location
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolutionError {
    #[error("[E001] No git repository detected here and no valid GWT_GIT_DIR or default_repo configured")]
    NotFound,
    #[error("[E002] GWT_GIT_DIR points to an invalid git directory: {value}")]
    EnvInvalid { value: String },
    #[error("[E003] default_repo in config is invalid: {value}")]
    ConfigInvalid {
        value: String,
        config_path: Option<PathBuf>,
    },
}

impl ResolutionError {
    /// Short diagnostic code
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::NotFound => "E001",
            Self::EnvInvalid { .. } => "E002",
            Self::ConfigInvalid { .. } => "E003",
        }
    }

    /// Remediation lines shown after the error
    #[must_use]
    pub fn hints(&self) -> Vec<String> {
        match self {
            Self::NotFound => vec![
                "cd into any git repo; or".to_string(),
                format!("set {GIT_DIR_ENV}=/path/to/repo/.git; or"),
                "run: gwt repo /path/to/repo.git".to_string(),
            ],
            Self::EnvInvalid { .. } => vec![
                "Ensure it points to a valid bare repo or to /path/to/repo/.git".to_string(),
                format!(
                    "Set with: export {GIT_DIR_ENV}=/path/to/repo/.git or run: gwt repo /path/to/repo.git"
                ),
            ],
            Self::ConfigInvalid { config_path, .. } => {
                let mut hints = vec!["Update it by running: gwt repo /path/to/repo.git".to_string()];
                if let Some(path) = config_path {
                    hints.push(format!("Or edit config: {}", path.display()));
                }
                hints
            }
        }
    }
}

impl ResolvedRepository {
    /// The location, or the error explaining its absence
    ///
    /// # Errors
    /// Returns the [`ResolutionError`] matching the failed source
    pub fn into_location(self, config_path: Option<&Path>) -> Result<PathBuf, ResolutionError> {
        if let Some(location) = self.location {
            return Ok(location);
        }
        let Diagnostics {
            env_value,
            config_value,
        } = self.diagnostics;
        Err(match self.source {
            RepoSource::EnvInvalid => ResolutionError::EnvInvalid {
                value: env_value.unwrap_or_default(),
            },
            RepoSource::ConfigInvalid => ResolutionError::ConfigInvalid {
                value: config_value.unwrap_or_default(),
                config_path: config_path.map(Path::to_path_buf),
            },
            _ => ResolutionError::NotFound,
        })
    }
}
