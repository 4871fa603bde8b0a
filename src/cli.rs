// CommandFactory is used by tests via Cli::command()
#[allow(unused_imports)]
use clap::CommandFactory;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::engine::{ArgValueCompleter, CompletionCandidate};
use std::collections::BTreeSet;
use std::ffi::OsStr;
use std::path::PathBuf;

use crate::config::Config;
use crate::domain::branch::{local_branches, remote_branch_names};
use crate::domain::locate::{resolve, LocatorContext};
use crate::domain::reconcile::{list_worktrees, WarningSink};
use crate::integrations::git::RealGit;

/// Git worktree helper: one directory per branch, next to the repository
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// When to use colored output
    #[arg(long, value_name = "WHEN", global = true, ignore_case = true)]
    pub color: Option<crate::color::ColorMode>,

    /// Defaults to `list` when omitted
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show or set the default repository
    Repo {
        /// Repository (or its .git directory) to use by default
        git_dir: Option<PathBuf>,
    },
    /// Go to the worktree for a branch, creating it when needed
    #[command(visible_alias = "s")]
    Switch(SwitchArgs),
    /// Remove the worktree for a branch
    #[command(visible_alias = "rm")]
    Remove {
        /// Branch whose worktree should be removed
        #[arg(add = ArgValueCompleter::new(complete_worktree_branches))]
        branch: String,
    },
    /// List worktrees
    #[command(visible_aliases = ["ls", "l"])]
    List(ListArgs),
    /// Print the configured default repository
    #[command(hide = true)]
    GetRepo,
    /// Generate shell completion setup instructions
    Completion {
        /// Shell type (bash, zsh, fish)
        shell: String,
    },
    /// Print the shell wrapper that follows `cd` requests
    ShellInit {
        /// Shell type (bash, zsh, fish)
        shell: String,
    },
}

#[derive(Args, Debug, Clone, Default)]
pub struct SwitchArgs {
    /// Branch to switch to
    #[arg(add = ArgValueCompleter::new(complete_all_branches))]
    pub branch: String,
    /// Create the branch before switching
    #[arg(short = 'c', long)]
    pub create: bool,
    /// Create the branch, resetting it if it already exists
    #[arg(short = 'C', long)]
    pub force_create: bool,
    /// Track a same-named remote branch when no local branch exists (default)
    #[arg(long, overrides_with = "no_guess")]
    pub guess: bool,
    /// Never fall back to a remote branch
    #[arg(long, overrides_with = "guess")]
    pub no_guess: bool,
}

impl SwitchArgs {
    /// Remote guessing is on unless `--no-guess` was the last word
    #[must_use]
    pub const fn guess_enabled(&self) -> bool {
        !self.no_guess
    }
}

/// Which branches `list --branches` prints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum BranchScope {
    /// Worktree, local-only and remote-only branches
    #[default]
    All,
    /// Worktree and local-only branches
    Local,
    /// Branches with a worktree (primary checkout excluded)
    Worktrees,
}

/// Decoration for `list --branches` entries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Annotate {
    #[default]
    None,
    Bash,
    Fish,
}

#[derive(Args, Debug, Clone, Default)]
pub struct ListArgs {
    /// Print branch names for completion instead of the table
    #[arg(long, value_name = "SCOPE", num_args = 0..=1, default_missing_value = "all")]
    pub branches: Option<BranchScope>,
    /// Decorate `--branches` output for a shell
    #[arg(long, value_name = "STYLE", default_value = "none")]
    pub annotate: Annotate,
    /// Repository to list instead of the detected one
    #[arg(long, value_name = "PATH")]
    pub git_dir: Option<PathBuf>,
    /// Print git's own listing
    #[arg(long)]
    pub raw: bool,
    /// Print every integrity note
    #[arg(short, long)]
    pub verbose: bool,
    /// Hide integrity notes
    #[arg(long)]
    pub no_warn: bool,
    /// Mark worktrees with uncommitted changes
    #[arg(long)]
    pub status: bool,
    /// Show absolute paths
    #[arg(long)]
    pub absolute: bool,
}

/// Repository for completion, located without touching the config file
fn completion_git() -> Option<RealGit> {
    let config_value = Config::global_config_path()
        .filter(|path| path.exists())
        .and_then(|path| Config::from_file(&path).ok())
        .and_then(|config| config.default_repo);
    let ctx = LocatorContext::from_environment(config_value);
    resolve(None, &ctx).location.map(RealGit::new)
}

fn worktree_branch_names(git: &RealGit) -> Vec<String> {
    let mut warnings = Vec::new();
    list_worktrees(git, false, &mut WarningSink::Collect(&mut warnings))
        .map(|worktrees| worktrees.into_iter().map(|w| w.branch).collect())
        .unwrap_or_default()
}

fn candidates(names: impl IntoIterator<Item = String>, current: &OsStr) -> Vec<CompletionCandidate> {
    let prefix = current.to_string_lossy();
    names
        .into_iter()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .filter(|name| name.starts_with(&*prefix))
        .map(CompletionCandidate::new)
        .collect()
}

/// Branches that have a worktree
///
/// Returns an empty Vec when no repository can be located
pub fn complete_worktree_branches(current: &OsStr) -> Vec<CompletionCandidate> {
    let Some(git) = completion_git() else {
        return Vec::new();
    };
    candidates(worktree_branch_names(&git), current)
}

/// Worktree, local and remote branch names
pub fn complete_all_branches(current: &OsStr) -> Vec<CompletionCandidate> {
    let Some(git) = completion_git() else {
        return Vec::new();
    };
    let names = worktree_branch_names(&git)
        .into_iter()
        .chain(local_branches(&git))
        .chain(remote_branch_names(&git));
    candidates(names, current)
}
