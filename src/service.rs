#![allow(clippy::missing_errors_doc)]
use std::path::{Path, PathBuf};

use crate::color::{self, ColorMode};
use crate::domain::branch::{branch_exists_locally, find_remote_branch, main_branch_name};
use crate::domain::paths::{display_path, ensure_worktree_base, main_worktree_path};
use crate::domain::reconcile::{list_worktrees, WarningSink};
use crate::hooks::{HookExecutor, HookReport};
use crate::integrations::git::{GitError, GitRunner};

/// Flags accepted by `switch`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwitchOptions {
    /// Create the branch first; fail if it exists
    pub create: bool,
    /// Create the branch first, resetting it if it exists
    pub force_create: bool,
    /// Fall back to a same-named remote-tracking branch
    pub guess: bool,
}

impl Default for SwitchOptions {
    fn default() -> Self {
        Self {
            create: false,
            force_create: false,
            guess: true,
        }
    }
}

/// Where `switch` sent the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SwitchOutcome {
    /// Branch is checked out in the primary checkout
    Main(PathBuf),
    /// A worktree for the branch already existed
    Existing(PathBuf),
    /// A worktree was created
    Created {
        path: PathBuf,
        /// Remote ref the new local branch tracks
        tracking: Option<String>,
        hooks: HookReport,
    },
}

impl SwitchOutcome {
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::Main(path) | Self::Existing(path) | Self::Created { path, .. } => path,
        }
    }
}

/// Why `switch` could not produce a worktree
#[derive(Debug, thiserror::Error)]
pub enum SwitchError {
    #[error("invalid reference: {branch}")]
    InvalidReference { branch: String, guess: bool },
    #[error("Branch '{branch}' already exists")]
    BranchExists { branch: String },
    #[error("{}", .0.message())]
    Git(#[from] GitError),
    #[error(transparent)]
    Setup(#[from] anyhow::Error),
}

impl SwitchError {
    /// Follow-up suggestions printed after the error
    #[must_use]
    pub fn hints(&self) -> Vec<String> {
        match self {
            Self::InvalidReference {
                branch,
                guess: true,
            } => vec![
                format!("No local branch and no remote-tracking branch named '{branch}' was found"),
                format!("If you meant to create a new branch, use: gwt switch -c {branch}"),
            ],
            Self::InvalidReference {
                branch,
                guess: false,
            } => vec![format!(
                "If you meant to create a new branch, use: gwt switch -c {branch}"
            )],
            Self::BranchExists { branch } => {
                vec![format!("Use -C to force create: gwt switch -C {branch}")]
            }
            Self::Git(_) | Self::Setup(_) => Vec::new(),
        }
    }
}

/// Worktree service that coordinates git operations and post-create commands
pub struct WorktreeService<G, H>
where
    G: GitRunner,
    H: HookExecutor,
{
    git: G,
    hook_executor: H,
    post_create_commands: Vec<String>,
    color_mode: ColorMode,
}

impl<G, H> WorktreeService<G, H>
where
    G: GitRunner,
    H: HookExecutor,
{
    /// Create a new worktree service
    pub const fn new(
        git: G,
        hook_executor: H,
        post_create_commands: Vec<String>,
        color_mode: ColorMode,
    ) -> Self {
        Self {
            git,
            hook_executor,
            post_create_commands,
            color_mode,
        }
    }

    pub const fn git(&self) -> &G {
        &self.git
    }

    /// Go to the worktree for `branch`, creating it when needed
    ///
    /// Checked in order: the primary checkout's branch, an existing worktree,
    /// `force_create`, `create`, an existing local branch, a remote-tracking
    /// branch (when `guess` is on). Anything else is an invalid reference.
    pub fn switch(&self, branch: &str, options: SwitchOptions) -> Result<SwitchOutcome, SwitchError> {
        let git_dir = self.git.git_dir();

        if main_branch_name(&self.git).as_deref() == Some(branch) {
            if let Some(main) = main_worktree_path(git_dir) {
                return Ok(SwitchOutcome::Main(main));
            }
        }

        let existing = list_worktrees(&self.git, true, &mut WarningSink::Immediate(self.color_mode))?;
        if let Some(found) = existing.into_iter().find(|w| w.branch == branch) {
            return Ok(SwitchOutcome::Existing(found.path));
        }

        let worktree_path = ensure_worktree_base(git_dir)?.join(branch);

        if options.force_create {
            if let Err(err) = self.git.quiet(&["branch", "-f", branch]) {
                log::debug!("forced branch update failed, creating instead: {err}");
                self.git.echo(&["branch", branch])?;
            }
            return self.add_worktree(branch, &worktree_path, None);
        }

        if options.create {
            if let Err(err) = self.git.echo(&["branch", branch]) {
                if branch_exists_locally(&self.git, branch) {
                    return Err(SwitchError::BranchExists {
                        branch: branch.to_string(),
                    });
                }
                return Err(err.into());
            }
            return self.add_worktree(branch, &worktree_path, None);
        }

        if branch_exists_locally(&self.git, branch) {
            return self.add_worktree(branch, &worktree_path, None);
        }

        if options.guess {
            if let Some(remote_ref) = find_remote_branch(&self.git, branch) {
                return self.add_worktree(branch, &worktree_path, Some(remote_ref));
            }
        }

        Err(SwitchError::InvalidReference {
            branch: branch.to_string(),
            guess: options.guess,
        })
    }

    fn add_worktree(
        &self,
        branch: &str,
        path: &Path,
        tracking: Option<String>,
    ) -> Result<SwitchOutcome, SwitchError> {
        let path_arg = path.to_string_lossy();
        match &tracking {
            Some(remote_ref) => {
                self.git
                    .echo(&["worktree", "add", "-b", branch, &path_arg, remote_ref])?;
                eprintln!(
                    "{}",
                    color::info(
                        self.color_mode,
                        format!("Branch '{branch}' set up to track '{remote_ref}'")
                    )
                );
            }
            None => {
                self.git.echo(&["worktree", "add", &path_arg, branch])?;
            }
        }

        eprintln!(
            "{}",
            color::success(
                self.color_mode,
                format!("Created worktree at {}", display_path(path))
            )
        );

        let hooks = self
            .hook_executor
            .run_post_create(&self.post_create_commands, path, branch);

        Ok(SwitchOutcome::Created {
            path: path.to_path_buf(),
            tracking,
            hooks,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hooks::testing::MockHookExecutor;
    use crate::integrations::git::testing::MockGit;
    use tempfile::TempDir;

    struct Repo {
        _temp: TempDir,
        root: PathBuf,
        base: PathBuf,
    }

    impl Repo {
        fn new() -> Self {
            let temp = TempDir::new().unwrap();
            let root = temp.path().canonicalize().unwrap().join("project");
            std::fs::create_dir_all(root.join(".git")).unwrap();
            let base = root.with_file_name("project.gwt");
            Self {
                _temp: temp,
                root,
                base,
            }
        }

        fn git_dir(&self) -> PathBuf {
            self.root.join(".git")
        }

        /// Porcelain listing with the primary checkout on `main` plus extra worktrees
        fn listing(&self, extra: &[(&str, &Path)]) -> String {
            let mut out = format!(
                "worktree {}\nHEAD 0123456789abcdef\nbranch refs/heads/main\n",
                self.root.display()
            );
            for (branch, path) in extra {
                out.push_str(&format!(
                    "\nworktree {}\nHEAD fedcba9876543210\nbranch refs/heads/{branch}\n",
                    path.display()
                ));
            }
            out
        }

        fn add_args(&self, branch: &str) -> String {
            format!("worktree add {} {branch}", self.base.join(branch).display())
        }
    }

    fn service(git: MockGit, commands: &[&str]) -> WorktreeService<MockGit, MockHookExecutor> {
        WorktreeService::new(
            git,
            MockHookExecutor::default(),
            commands.iter().map(|c| (*c).to_string()).collect(),
            ColorMode::Never,
        )
    }

    fn no_guess() -> SwitchOptions {
        SwitchOptions {
            guess: false,
            ..SwitchOptions::default()
        }
    }

    #[test]
    fn test_switch_to_main_branch_creates_nothing() {
        let repo = Repo::new();
        let git = MockGit::new(repo.git_dir()).ok("worktree list --porcelain", &repo.listing(&[]));
        let svc = service(git, &[]);

        let outcome = svc.switch("main", SwitchOptions::default()).unwrap();
        assert_eq!(outcome, SwitchOutcome::Main(repo.root.clone()));
        assert!(!svc.git().called("branch"));
        assert!(!svc.git().called("worktree add"));
    }

    #[test]
    fn test_switch_to_existing_worktree() {
        let repo = Repo::new();
        let feature = repo.base.join("feature");
        let git = MockGit::new(repo.git_dir())
            .ok("worktree list --porcelain", &repo.listing(&[("feature", &feature)]));
        let svc = service(git, &["npm install"]);

        let outcome = svc.switch("feature", SwitchOptions::default()).unwrap();
        assert_eq!(outcome, SwitchOutcome::Existing(feature));
        assert!(!svc.git().called("worktree add"));
        assert!(svc.hook_executor.invocations.borrow().is_empty());
    }

    #[test]
    fn test_switch_missing_branch_without_guess() {
        let repo = Repo::new();
        let git = MockGit::new(repo.git_dir()).ok("worktree list --porcelain", &repo.listing(&[]));
        let svc = service(git, &[]);

        let err = svc.switch("nope", no_guess()).unwrap_err();
        assert!(err.to_string().contains("invalid reference: nope"));
        let hints = err.hints().join("\n");
        assert!(!hints.contains("remote"));
        assert!(!hints.contains("guess"));
        assert!(hints.contains("gwt switch -c nope"));
        assert!(!svc.git().called("remote update"));
    }

    #[test]
    fn test_switch_missing_branch_with_guess_searches_remotes() {
        let repo = Repo::new();
        let git = MockGit::new(repo.git_dir())
            .ok("worktree list --porcelain", &repo.listing(&[]))
            .ok("remote update", "")
            .ok("for-each-ref --format=%(refname:short) refs/remotes/*/nope", "");
        let svc = service(git, &[]);

        let err = svc.switch("nope", SwitchOptions::default()).unwrap_err();
        assert!(matches!(
            err,
            SwitchError::InvalidReference { guess: true, .. }
        ));
        assert!(svc.git().called("remote update"));
    }

    #[test]
    fn test_create_existing_branch_fails() {
        let repo = Repo::new();
        let git = MockGit::new(repo.git_dir())
            .ok("worktree list --porcelain", &repo.listing(&[]))
            .fail("branch topic", "fatal: a branch named 'topic' already exists")
            .ok("rev-parse --verify --quiet refs/heads/topic", "abc\n");
        let svc = service(git, &[]);

        let options = SwitchOptions {
            create: true,
            ..SwitchOptions::default()
        };
        let err = svc.switch("topic", options).unwrap_err();
        assert!(err.to_string().contains("already exists"));
        assert!(err.hints()[0].contains("-C"));
        assert!(!svc.git().called("worktree add"));
    }

    #[test]
    fn test_create_new_branch_runs_post_create_commands() {
        let repo = Repo::new();
        let git = MockGit::new(repo.git_dir())
            .ok("worktree list --porcelain", &repo.listing(&[]))
            .ok("branch topic", "")
            .ok(&repo.add_args("topic"), "");
        let svc = service(git, &["npm install"]);

        let options = SwitchOptions {
            create: true,
            ..SwitchOptions::default()
        };
        let outcome = svc.switch("topic", options).unwrap();
        assert_eq!(outcome.path(), repo.base.join("topic"));

        let invocations = svc.hook_executor.invocations.borrow();
        assert_eq!(invocations.len(), 1);
        assert_eq!(invocations[0].0, vec!["npm install".to_string()]);
        assert_eq!(invocations[0].1, repo.base.join("topic"));
    }

    #[test]
    fn test_force_create_falls_back_to_plain_branch() {
        let repo = Repo::new();
        let git = MockGit::new(repo.git_dir())
            .ok("worktree list --porcelain", &repo.listing(&[]))
            .fail("branch -f topic", "fatal: not supported")
            .ok("branch topic", "")
            .ok(&repo.add_args("topic"), "");
        let svc = service(git, &[]);

        let options = SwitchOptions {
            force_create: true,
            create: true,
            ..SwitchOptions::default()
        };
        let outcome = svc.switch("topic", options).unwrap();
        assert!(matches!(outcome, SwitchOutcome::Created { tracking: None, .. }));
        assert!(svc.git().called("branch topic"));
    }

    #[test]
    fn test_existing_local_branch_gets_worktree() {
        let repo = Repo::new();
        let git = MockGit::new(repo.git_dir())
            .ok("worktree list --porcelain", &repo.listing(&[]))
            .ok("rev-parse --verify --quiet refs/heads/topic", "abc\n")
            .ok(&repo.add_args("topic"), "");
        let svc = service(git, &[]);

        let outcome = svc.switch("topic", no_guess()).unwrap();
        assert_eq!(outcome.path(), repo.base.join("topic"));
        assert!(!svc.git().called("branch "));
    }

    #[test]
    fn test_remote_branch_is_tracked() {
        let repo = Repo::new();
        let path = repo.base.join("topic");
        let git = MockGit::new(repo.git_dir())
            .ok("worktree list --porcelain", &repo.listing(&[]))
            .ok("remote update", "")
            .ok(
                "for-each-ref --format=%(refname:short) refs/remotes/*/topic",
                "origin/topic\n",
            )
            .ok(
                &format!("worktree add -b topic {} origin/topic", path.display()),
                "",
            );
        let svc = service(git, &[]);

        let outcome = svc.switch("topic", SwitchOptions::default()).unwrap();
        assert_eq!(
            outcome,
            SwitchOutcome::Created {
                path,
                tracking: Some("origin/topic".to_string()),
                hooks: HookReport::default(),
            }
        );
    }

    #[test]
    fn test_worktree_add_failure_surfaces_git_message() {
        let repo = Repo::new();
        let git = MockGit::new(repo.git_dir())
            .ok("worktree list --porcelain", &repo.listing(&[]))
            .ok("rev-parse --verify --quiet refs/heads/topic", "abc\n")
            .fail(&repo.add_args("topic"), "fatal: 'topic' is already checked out");
        let svc = service(git, &[]);

        let err = svc.switch("topic", no_guess()).unwrap_err();
        assert_eq!(err.to_string(), "fatal: 'topic' is already checked out");
    }
}
