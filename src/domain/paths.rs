//! Path derivation for repository locations and worktree directories
//!
//! Everything here is a pure function of its inputs plus read-only
//! filesystem probes, except [`ensure_worktree_base`] which creates the
//! base directory on first use.

use anyhow::{Context, Result};
use std::path::{Component, Path, PathBuf};

const BASE_SUFFIX: &str = ".gwt";

const BASE_README: &str = "# Git Worktree Directory

This directory contains git worktrees managed by the gwt tool.
Each subdirectory is a separate worktree for a branch.

Remove worktrees with `gwt remove <branch>` rather than deleting them by hand,
so git's own bookkeeping stays in sync.
";

/// Compute the directory under which per-branch worktrees live
///
/// - Embedded repository (`/src/project/.git`): `/src/project.gwt`
/// - Bare repository named `*.git` (`/srv/project.git`): `/srv/project.gwt`
/// - Anything else: the location with `.gwt` appended
#[must_use]
pub fn worktree_base_path(git_dir: &Path) -> PathBuf {
    let resolved = canonicalize_allow_missing(git_dir);

    if let Some(root) = embedded_root(&resolved) {
        return append_suffix(root);
    }

    let name = resolved
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();

    match name.strip_suffix(".git") {
        Some(stem) if !stem.is_empty() => resolved.with_file_name(format!("{stem}{BASE_SUFFIX}")),
        _ => append_suffix(&resolved),
    }
}

/// Compute the worktree base and create it (with a README marker) when missing
///
/// # Errors
/// Returns an error if the directory or its marker file cannot be created
pub fn ensure_worktree_base(git_dir: &Path) -> Result<PathBuf> {
    let base = worktree_base_path(git_dir);
    if !base.exists() {
        std::fs::create_dir_all(&base).with_context(|| {
            format!("Failed to create worktree directory: {}", base.display())
        })?;
        let readme = base.join("README.md");
        std::fs::write(&readme, BASE_README)
            .with_context(|| format!("Failed to write {}", readme.display()))?;
        log::debug!("created worktree base {}", base.display());
    }
    Ok(base)
}

/// Primary checkout of an embedded repository; None for bare repositories
#[must_use]
pub fn main_worktree_path(git_dir: &Path) -> Option<PathBuf> {
    let resolved = canonicalize_allow_missing(git_dir);
    embedded_root(&resolved).map(Path::to_path_buf)
}

/// Map a repository root that holds a `.git` directory to that `.git` directory
///
/// Any other input is returned unchanged.
#[must_use]
pub fn normalize_repo_path(path: &Path) -> PathBuf {
    let dot_git = path.join(".git");
    if path.is_dir() && dot_git.is_dir() {
        dot_git
    } else {
        path.to_path_buf()
    }
}

/// Whether `cwd` is the worktree at `path` or somewhere beneath it
#[must_use]
pub fn is_inside(path: &Path, cwd: &Path) -> bool {
    let path = canonicalize_allow_missing(path);
    let cwd = canonicalize_allow_missing(cwd);
    cwd.starts_with(path)
}

/// Where the shell should go after the worktree it sits in is removed
///
/// The main checkout for embedded repositories, otherwise the directory
/// that holds the worktree base.
#[must_use]
pub fn safe_dir_after_removal(git_dir: &Path) -> PathBuf {
    if let Some(main) = main_worktree_path(git_dir) {
        return main;
    }
    let base = worktree_base_path(git_dir);
    base.parent().map_or_else(|| base.clone(), Path::to_path_buf)
}

/// Path as shown in the worktree table
///
/// Worktrees under the base are shown relative to the base's parent
/// (`project.gwt/feature`). The main checkout and anything outside the base
/// are shown absolute, as is everything when `absolute` is set.
#[must_use]
pub fn rel_display_path(path: &Path, git_dir: &Path, absolute: bool) -> String {
    let full = canonicalize_allow_missing(path);
    if absolute {
        return full.display().to_string();
    }

    if main_worktree_path(git_dir).is_some_and(|main| main == full) {
        return full.display().to_string();
    }

    let base = worktree_base_path(git_dir);
    if full != base && full.starts_with(&base) {
        if let Some(rel) = base.parent().and_then(|parent| full.strip_prefix(parent).ok()) {
            return rel.display().to_string();
        }
    }

    full.display().to_string()
}

/// Convert a path to home-relative display format (`~/...`)
#[must_use]
pub fn display_path(path: &Path) -> String {
    let normalized = normalize_lexically(path);

    if let Some(home) = dirs::home_dir() {
        if let Ok(rel) = normalized.strip_prefix(&home) {
            let rel_str = rel.display().to_string();
            if rel_str.is_empty() {
                return "~".to_string();
            }
            return format!("~/{rel_str}");
        }
    }
    normalized.display().to_string()
}

/// Resolve `.` and `..` components without touching the filesystem
#[must_use]
pub fn normalize_lexically(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            _ => normalized.push(component),
        }
    }
    normalized
}

/// Canonicalize a path, even if it doesn't exist on the filesystem
///
/// For missing paths, canonicalize the deepest existing ancestor and append the tail.
/// Relative paths are resolved from the current working directory.
#[must_use]
pub fn canonicalize_allow_missing(path: &Path) -> PathBuf {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir().map_or_else(|_| path.to_path_buf(), |cwd| cwd.join(path))
    };
    let normalized = normalize_lexically(&absolute);

    if let Ok(canonical) = normalized.canonicalize() {
        return canonical;
    }

    let mut tail = Vec::new();
    let mut current = normalized.as_path();
    while let Some(parent) = current.parent() {
        if let Some(name) = current.file_name() {
            tail.push(name);
        }
        if let Ok(canonical_parent) = parent.canonicalize() {
            return tail
                .iter()
                .rev()
                .fold(canonical_parent, |acc, part| acc.join(part));
        }
        current = parent;
    }

    normalized
}

fn embedded_root(resolved: &Path) -> Option<&Path> {
    if resolved.file_name().is_some_and(|n| n == ".git") && resolved.is_dir() {
        resolved.parent()
    } else {
        None
    }
}

fn append_suffix(path: &Path) -> PathBuf {
    let mut raw = path.as_os_str().to_os_string();
    raw.push(BASE_SUFFIX);
    PathBuf::from(raw)
}
