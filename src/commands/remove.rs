//! Remove command - Remove a branch's worktree and optionally the branch

use anyhow::{Context, Result};
use std::io::{BufRead, Write};
use std::path::Path;

use crate::color::{self, ColorMode};
use crate::commands::common::{current_dir, request_cd, resolve_repository};
use crate::config::ConfigStore;
use crate::domain::paths::{display_path, is_inside, safe_dir_after_removal};
use crate::domain::reconcile::{list_worktrees, WarningSink};
use crate::integrations::git::{GitRunner, RealGit};

/// Remove the worktree checked out for `branch`
///
/// The primary checkout is never a candidate. When the shell sits inside
/// the worktree, git runs from a safe directory and the wrapper is told to
/// go there afterwards.
///
/// # Errors
/// Returns an error if:
/// - No repository can be located
/// - No worktree exists for `branch`
/// - `git worktree remove` or `git branch -D` fails
pub fn cmd_remove(branch: &str, color_mode: ColorMode) -> Result<()> {
    let store = ConfigStore::load(color_mode);
    let git_dir = resolve_repository(None, &store)?;
    let git = RealGit::new(&git_dir);

    let worktrees = list_worktrees(&git, false, &mut WarningSink::Immediate(color_mode))?;
    let Some(target) = worktrees.into_iter().find(|w| w.branch == branch) else {
        anyhow::bail!("Worktree for branch '{branch}' not found");
    };

    let safe_dir = safe_dir_after_removal(&git_dir);
    let inside = current_dir().is_some_and(|cwd| is_inside(&target.path, &cwd));
    if inside {
        eprintln!(
            "{}",
            color::info(
                color_mode,
                format!(
                    "Current directory is inside this worktree; moving to {}",
                    display_path(&safe_dir)
                )
            )
        );
    }
    let run_from = inside.then_some(safe_dir.as_path());

    let path_arg = target.path.to_string_lossy();
    git.interactive(&["worktree", "remove", &path_arg], run_from)
        .map_err(|err| anyhow::anyhow!(err.message()))
        .with_context(|| format!("Failed to remove worktree for '{branch}'"))?;

    let stdin = std::io::stdin();
    if ask_delete_branch(branch, &mut stdin.lock()) {
        delete_branch(&git, branch, run_from, color_mode)?;
    } else {
        eprintln!(
            "{}",
            color::info(color_mode, format!("Branch '{branch}' kept"))
        );
    }

    eprintln!(
        "{}",
        color::success(
            color_mode,
            format!("Worktree for '{branch}' has been removed")
        )
    );

    if inside {
        request_cd(&safe_dir);
    }
    Ok(())
}

fn delete_branch<G: GitRunner>(
    git: &G,
    branch: &str,
    run_from: Option<&Path>,
    color_mode: ColorMode,
) -> Result<()> {
    git.interactive(&["branch", "-D", branch], run_from)
        .map_err(|err| anyhow::anyhow!(err.message()))
        .with_context(|| format!("Failed to delete branch '{branch}'"))?;
    eprintln!(
        "{}",
        color::success(color_mode, format!("Deleted branch: {branch}"))
    );
    Ok(())
}

/// Prompt on stderr and read one answer line
///
/// End of input or a read error counts as "no".
fn ask_delete_branch<R: BufRead>(branch: &str, input: &mut R) -> bool {
    eprint!("Do you also want to delete the branch '{branch}'? (y/N): ");
    let _ = std::io::stderr().flush();

    let mut answer = String::new();
    match input.read_line(&mut answer) {
        Ok(0) | Err(_) => {
            eprintln!();
            false
        }
        Ok(_) => is_yes(&answer),
    }
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim(), "y" | "Y")
}
