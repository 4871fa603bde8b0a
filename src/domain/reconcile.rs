//! Cross-check git's worktree list against the worktree directory
//!
//! Git is the source of truth. The directory scan exists to notice drift:
//! worktrees that moved, vanished, or directories that look like worktrees
//! but are no longer registered.

use anyhow::Result;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::color::{self, ColorMode};
use crate::domain::paths::{canonicalize_allow_missing, ensure_worktree_base};
use crate::domain::worktree::{list_records, WorktreeRecord};
use crate::integrations::git::GitRunner;

/// A worktree confirmed by git, keyed by its branch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackedWorktree {
    pub branch: String,
    pub path: PathBuf,
}

/// Drift between git's records and the worktree directory
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum IntegrityWarning {
    /// Both sources know the branch but disagree on where it lives
    Mismatch {
        branch: String,
        git_path: PathBuf,
        dir_path: PathBuf,
    },
    /// Git places the worktree under the base directory but the scan did not find it
    MissingFromDirectory { branch: String },
    /// A checkout-looking directory git does not know about
    Untracked { branch: String },
}

impl fmt::Display for IntegrityWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mismatch {
                branch,
                git_path,
                dir_path,
            } => write!(
                f,
                "Mismatch for branch '{branch}':\n  Git reports: {}\n  Directory shows: {}",
                git_path.display(),
                dir_path.display()
            ),
            Self::MissingFromDirectory { branch } => write!(
                f,
                "Branch '{branch}' found by git but not in worktree directory"
            ),
            Self::Untracked { branch } => write!(
                f,
                "Directory '{branch}' exists in worktree path but not recognized by git"
            ),
        }
    }
}

/// Where integrity warnings go
pub enum WarningSink<'a> {
    /// Print each warning to stderr as it is found
    Immediate(ColorMode),
    /// Keep warnings for the caller to summarize or ignore
    Collect(&'a mut Vec<IntegrityWarning>),
}

impl WarningSink<'_> {
    fn report(&mut self, warning: IntegrityWarning) {
        match self {
            Self::Immediate(mode) => eprintln!("{}", color::warn(*mode, &warning)),
            Self::Collect(warnings) => warnings.push(warning),
        }
    }
}

/// Branch-to-path mapping from git's own records
///
/// Detached and unknown checkouts cannot be matched by branch and are left out.
#[must_use]
pub fn authoritative_map(records: &[WorktreeRecord]) -> BTreeMap<String, PathBuf> {
    records
        .iter()
        .filter_map(|r| r.branch.name().map(|b| (b.to_string(), r.path.clone())))
        .collect()
}

/// Subdirectories of the base that contain a `.git` file or directory
#[must_use]
pub fn scan_worktree_dir(base: &Path) -> BTreeMap<String, PathBuf> {
    let mut found = BTreeMap::new();

    let entries = match std::fs::read_dir(base) {
        Ok(entries) => entries,
        Err(err) => {
            log::debug!("cannot scan {}: {err}", base.display());
            return found;
        }
    };

    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() && path.join(".git").exists() {
            found.insert(entry.file_name().to_string_lossy().to_string(), path);
        }
    }

    found
}

/// Merge git's mapping with the directory scan
///
/// Every branch git reports is returned, with git's path. Directory-only
/// entries are never returned. Output is ordered by branch name.
pub fn reconcile(
    authoritative: &BTreeMap<String, PathBuf>,
    scanned: &BTreeMap<String, PathBuf>,
    base: &Path,
    sink: &mut WarningSink<'_>,
) -> Vec<TrackedWorktree> {
    let base = canonicalize_allow_missing(base);
    let branches: BTreeSet<&String> = authoritative.keys().chain(scanned.keys()).collect();
    let mut worktrees = Vec::new();

    for branch in branches {
        match (authoritative.get(branch), scanned.get(branch)) {
            (Some(git_path), Some(dir_path)) => {
                if canonicalize_allow_missing(git_path) != canonicalize_allow_missing(dir_path) {
                    sink.report(IntegrityWarning::Mismatch {
                        branch: branch.clone(),
                        git_path: git_path.clone(),
                        dir_path: dir_path.clone(),
                    });
                }
                worktrees.push(TrackedWorktree {
                    branch: branch.clone(),
                    path: git_path.clone(),
                });
            }
            (Some(git_path), None) => {
                if canonicalize_allow_missing(git_path).starts_with(&base) {
                    sink.report(IntegrityWarning::MissingFromDirectory {
                        branch: branch.clone(),
                    });
                }
                worktrees.push(TrackedWorktree {
                    branch: branch.clone(),
                    path: git_path.clone(),
                });
            }
            (None, Some(_)) => sink.report(IntegrityWarning::Untracked {
                branch: branch.clone(),
            }),
            (None, None) => {}
        }
    }

    worktrees
}

/// Worktrees of the repository, cross-checked against its worktree directory
///
/// # Errors
/// Returns an error if the worktree directory cannot be created
pub fn list_worktrees<G: GitRunner>(
    git: &G,
    include_main: bool,
    sink: &mut WarningSink<'_>,
) -> Result<Vec<TrackedWorktree>> {
    let base = ensure_worktree_base(git.git_dir())?;
    let authoritative = authoritative_map(&list_records(git, include_main));
    let scanned = scan_worktree_dir(&base);
    Ok(reconcile(&authoritative, &scanned, &base, sink))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    struct Layout {
        _temp: TempDir,
        base: PathBuf,
    }

    impl Layout {
        fn new() -> Self {
            let temp = TempDir::new().unwrap();
            let base = temp.path().canonicalize().unwrap().join("project.gwt");
            std::fs::create_dir_all(&base).unwrap();
            Self { _temp: temp, base }
        }

        /// Create `<base>/<name>` with a `.git` file, like `git worktree add` does
        fn checkout(&self, name: &str) -> PathBuf {
            let dir = self.base.join(name);
            std::fs::create_dir_all(&dir).unwrap();
            std::fs::write(dir.join(".git"), "gitdir: /elsewhere\n").unwrap();
            dir
        }
    }

    fn map(entries: &[(&str, &Path)]) -> BTreeMap<String, PathBuf> {
        entries
            .iter()
            .map(|(b, p)| ((*b).to_string(), p.to_path_buf()))
            .collect()
    }

    fn run(
        git: &BTreeMap<String, PathBuf>,
        base: &Path,
    ) -> (Vec<TrackedWorktree>, Vec<IntegrityWarning>) {
        let mut warnings = Vec::new();
        let scanned = scan_worktree_dir(base);
        let result = reconcile(git, &scanned, base, &mut WarningSink::Collect(&mut warnings));
        (result, warnings)
    }

    #[test]
    fn test_scan_only_counts_checkouts() {
        let layout = Layout::new();
        layout.checkout("feature");
        std::fs::create_dir_all(layout.base.join("notes")).unwrap();
        std::fs::create_dir_all(layout.base.join("embedded/.git")).unwrap();

        let scanned = scan_worktree_dir(&layout.base);
        assert_eq!(
            scanned.keys().cloned().collect::<Vec<_>>(),
            vec!["embedded".to_string(), "feature".to_string()]
        );
    }

    #[test]
    fn test_scan_missing_base_is_empty() {
        assert!(scan_worktree_dir(Path::new("/definitely/not/here.gwt")).is_empty());
    }

    #[test]
    fn test_agreeing_sources_produce_no_warnings() {
        let layout = Layout::new();
        let feature = layout.checkout("feature");
        let (result, warnings) = run(&map(&[("feature", &feature)]), &layout.base);
        assert_eq!(
            result,
            vec![TrackedWorktree {
                branch: "feature".to_string(),
                path: feature
            }]
        );
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_mismatch_warns_once_and_git_path_wins() {
        let layout = Layout::new();
        layout.checkout("feature");
        let moved = layout.checkout("feature-moved");
        let git = map(&[("feature", &moved), ("feature-moved", &moved)]);

        let (result, warnings) = run(&git, &layout.base);
        let feature = result.iter().find(|w| w.branch == "feature").unwrap();
        assert_eq!(feature.path, moved);
        let mismatches: Vec<_> = warnings
            .iter()
            .filter(|w| matches!(w, IntegrityWarning::Mismatch { .. }))
            .collect();
        assert_eq!(mismatches.len(), 1);
        assert!(mismatches[0].to_string().contains("Git reports:"));
    }

    #[test]
    fn test_orphan_directory_is_warned_but_not_listed() {
        let layout = Layout::new();
        layout.checkout("orphan");
        let (result, warnings) = run(&BTreeMap::new(), &layout.base);
        assert!(result.is_empty());
        assert_eq!(
            warnings,
            vec![IntegrityWarning::Untracked {
                branch: "orphan".to_string()
            }]
        );
    }

    #[test]
    fn test_git_only_warns_only_inside_base() {
        let layout = Layout::new();
        let inside = layout.base.join("ghost");
        let outside = PathBuf::from("/somewhere/else/topic");
        let git = map(&[("ghost", &inside), ("topic", &outside)]);

        let (result, warnings) = run(&git, &layout.base);
        assert_eq!(result.len(), 2);
        assert_eq!(
            warnings,
            vec![IntegrityWarning::MissingFromDirectory {
                branch: "ghost".to_string()
            }]
        );
    }

    #[test]
    fn test_reconcile_is_idempotent() {
        let layout = Layout::new();
        let feature = layout.checkout("feature");
        layout.checkout("orphan");
        let git = map(&[("feature", &feature), ("main", Path::new("/src/project"))]);

        assert_eq!(run(&git, &layout.base), run(&git, &layout.base));
    }

    #[test]
    fn test_warning_text() {
        let warning = IntegrityWarning::Untracked {
            branch: "x".to_string(),
        };
        assert_eq!(
            warning.to_string(),
            "Directory 'x' exists in worktree path but not recognized by git"
        );
    }
}
