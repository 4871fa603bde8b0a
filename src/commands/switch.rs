//! Switch command - Go to a branch's worktree, creating it when needed

use anyhow::Result;

use crate::cli::SwitchArgs;
use crate::color::{self, ColorMode};
use crate::commands::common::{request_cd, resolve_repository};
use crate::config::ConfigStore;
use crate::domain::paths::display_path;
use crate::hooks::RealHookExecutor;
use crate::integrations::git::RealGit;
use crate::service::{SwitchOptions, SwitchOutcome, WorktreeService};

/// Switch to the worktree for `args.branch`
///
/// # Errors
/// Returns an error if:
/// - No repository can be located
/// - The branch cannot be resolved or created ([`crate::service::SwitchError`])
pub fn cmd_switch(args: &SwitchArgs, color_mode: ColorMode) -> Result<()> {
    let mut store = ConfigStore::load(color_mode);
    let git_dir = resolve_repository(None, &store)?;
    let post_create_commands = store
        .repo_config(&git_dir.to_string_lossy())
        .post_create_commands;

    let service = WorktreeService::new(
        RealGit::new(&git_dir),
        RealHookExecutor::new(color_mode),
        post_create_commands,
        color_mode,
    );
    let options = SwitchOptions {
        create: args.create,
        force_create: args.force_create,
        guess: args.guess_enabled(),
    };

    let outcome = service.switch(&args.branch, options)?;
    match &outcome {
        SwitchOutcome::Main(path) | SwitchOutcome::Existing(path) => {
            eprintln!(
                "{}",
                color::info(
                    color_mode,
                    format!("Switching to {}", color::dim(color_mode, display_path(path)))
                )
            );
        }
        SwitchOutcome::Created { hooks, .. } if !hooks.succeeded() => {
            eprintln!(
                "{}",
                color::warn(
                    color_mode,
                    format!(
                        "{} of {} post-create command(s) failed",
                        hooks.failed.len(),
                        hooks.ran
                    )
                )
            );
        }
        SwitchOutcome::Created { .. } => {}
    }

    request_cd(outcome.path());
    Ok(())
}
