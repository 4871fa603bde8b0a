//! List command - Display worktrees, or branch names for completion

use anyhow::Result;
use std::collections::BTreeSet;

use crate::cli::{Annotate, BranchScope, ListArgs};
use crate::color::ColorMode;
use crate::commands::common::{current_dir, resolve_repository};
use crate::config::ConfigStore;
use crate::domain::branch::{local_branches, remote_branch_names};
use crate::domain::display::{format_worktree_rows, RowOptions, DEFAULT_WIDTH};
use crate::domain::reconcile::{list_worktrees, IntegrityWarning, WarningSink};
use crate::domain::worktree::{list_records, WorktreeRecord};
use crate::integrations::git::{GitRunner, RealGit};

/// List worktrees (or branches) of the located repository
///
/// Everything except `--branches` output goes to stderr.
///
/// # Errors
/// Returns an error if:
/// - No repository can be located
/// - The worktree directory cannot be created
/// - `--raw` and `git worktree list` fails
pub fn cmd_list(args: &ListArgs, color_mode: ColorMode) -> Result<()> {
    let store = ConfigStore::load(color_mode);
    let git_dir = resolve_repository(args.git_dir.as_deref(), &store)?;
    let git = RealGit::new(&git_dir);

    if let Some(scope) = args.branches {
        for line in branch_lines(&git, scope, args.annotate) {
            println!("{line}");
        }
        return Ok(());
    }

    if args.raw {
        let output = git
            .quiet(&["worktree", "list"])
            .map_err(|err| anyhow::anyhow!("Error listing worktrees: {}", err.message()))?;
        eprint!("{output}");
        return Ok(());
    }

    print_table(&git, args, color_mode)
}

fn print_table<G: GitRunner>(git: &G, args: &ListArgs, color_mode: ColorMode) -> Result<()> {
    let mut warnings = Vec::new();
    list_worktrees(git, false, &mut WarningSink::Collect(&mut warnings))?;
    if args.no_warn {
        warnings.clear();
    }

    let records = list_records(git, true);
    if records.is_empty() {
        eprintln!("No worktrees found");
        print_notes(&warnings, args.verbose);
        return Ok(());
    }

    let cwd = current_dir();
    let options = RowOptions {
        git_dir: git.git_dir(),
        cwd: cwd.as_deref(),
        absolute: args.absolute,
        width: terminal_width(),
        color_mode,
    };
    let rows = format_worktree_rows(
        &records,
        |record| args.status && is_dirty(git, record),
        &options,
    );
    for row in rows {
        eprintln!("{row}");
    }

    print_notes(&warnings, args.verbose);
    Ok(())
}

fn print_notes(warnings: &[IntegrityWarning], verbose: bool) {
    if warnings.is_empty() {
        return;
    }
    eprintln!();
    if verbose {
        eprintln!("Notes:");
        for warning in warnings {
            eprintln!("{warning}");
        }
    } else {
        eprintln!("{}", notes_summary(warnings.len()));
    }
}

fn notes_summary(count: usize) -> String {
    let plural = if count == 1 { "" } else { "s" };
    format!("Notes: {count} integrity issue{plural}. Use -v for details.")
}

/// Uncommitted changes to tracked files; any git failure counts as clean
fn is_dirty<G: GitRunner>(git: &G, record: &WorktreeRecord) -> bool {
    git.in_worktree(&record.path, &["status", "--porcelain", "-uno"])
        .is_ok_and(|output| !output.trim().is_empty())
}

/// `COLUMNS` first, then the terminal behind stderr or stdout
fn terminal_width() -> usize {
    if let Some(columns) = std::env::var("COLUMNS")
        .ok()
        .and_then(|value| value.trim().parse::<usize>().ok())
        .filter(|&columns| columns > 0)
    {
        return columns;
    }
    terminal_size::terminal_size_of(std::io::stderr())
        .or_else(terminal_size::terminal_size)
        .map_or(DEFAULT_WIDTH, |(terminal_size::Width(w), _)| usize::from(w))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BranchKind {
    Worktree,
    Local,
    Remote,
}

/// Completion entries, grouped worktree / local-only / remote-only
///
/// Integrity warnings are never printed here; stdout must stay clean.
fn branch_lines<G: GitRunner>(git: &G, scope: BranchScope, annotate: Annotate) -> Vec<String> {
    let include_main = scope != BranchScope::Worktrees;
    let mut ignored = Vec::new();
    let worktree: Vec<String> =
        list_worktrees(git, include_main, &mut WarningSink::Collect(&mut ignored))
            .map(|worktrees| worktrees.into_iter().map(|w| w.branch).collect())
            .unwrap_or_default();

    let (local, remote) = match scope {
        BranchScope::Worktrees => (Vec::new(), Vec::new()),
        BranchScope::Local => (local_branches(git), Vec::new()),
        BranchScope::All => (local_branches(git), remote_branch_names(git)),
    };

    categorize(scope, &worktree, &local, &remote)
        .into_iter()
        .map(|(name, kind)| annotate_entry(&name, kind, annotate))
        .collect()
}

fn categorize(
    scope: BranchScope,
    worktree: &[String],
    local: &[String],
    remote: &[String],
) -> Vec<(String, BranchKind)> {
    let worktree_set: BTreeSet<&str> = worktree.iter().map(String::as_str).collect();
    let local_set: BTreeSet<&str> = local.iter().map(String::as_str).collect();

    // Local scope only lists worktree branches that are also local branches
    let worktree_group: BTreeSet<&str> = match scope {
        BranchScope::Local => worktree_set.intersection(&local_set).copied().collect(),
        BranchScope::All | BranchScope::Worktrees => worktree_set.clone(),
    };
    let local_group: BTreeSet<&str> = local_set.difference(&worktree_set).copied().collect();
    let remote_group: BTreeSet<&str> = remote
        .iter()
        .map(String::as_str)
        .filter(|name| !worktree_set.contains(name) && !local_set.contains(name))
        .collect();

    worktree_group
        .into_iter()
        .map(|name| (name.to_string(), BranchKind::Worktree))
        .chain(
            local_group
                .into_iter()
                .map(|name| (name.to_string(), BranchKind::Local)),
        )
        .chain(
            remote_group
                .into_iter()
                .map(|name| (name.to_string(), BranchKind::Remote)),
        )
        .collect()
}

fn annotate_entry(name: &str, kind: BranchKind, annotate: Annotate) -> String {
    let (symbol, label) = match kind {
        BranchKind::Worktree => ("●", "worktree"),
        BranchKind::Local => ("○", "local"),
        BranchKind::Remote => ("⊙", "remote"),
    };
    match annotate {
        Annotate::None => name.to_string(),
        Annotate::Bash => format!("{symbol} {name}"),
        Annotate::Fish => format!("{name}\t{symbol} {label}"),
    }
}
