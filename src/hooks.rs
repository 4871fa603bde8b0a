#![allow(clippy::missing_errors_doc)]
use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::process::{Command, Output};
use std::time::{Duration, Instant};

use crate::color::{self, ColorMode};

/// Outcome of running a list of post-create commands
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HookReport {
    /// Commands that were started
    pub ran: usize,
    /// Commands that could not start or exited nonzero
    pub failed: Vec<String>,
}

impl HookReport {
    #[must_use]
    pub fn succeeded(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Hook executor interface for post-create commands
pub trait HookExecutor {
    /// Run every command inside `worktree_path`
    ///
    /// A failing command is reported and the rest still run.
    ///
    /// # Arguments
    /// * `commands` - Shell commands, run in order
    /// * `worktree_path` - Working directory for each command
    /// * `branch` - Branch the worktree was created for (for messages)
    fn run_post_create(&self, commands: &[String], worktree_path: &Path, branch: &str)
        -> HookReport;
}

/// Real hook executor implementation
#[derive(Debug, Clone, Copy)]
pub struct RealHookExecutor {
    color_mode: ColorMode,
}

impl RealHookExecutor {
    #[must_use]
    pub const fn new(color_mode: ColorMode) -> Self {
        Self { color_mode }
    }
}

impl HookExecutor for RealHookExecutor {
    fn run_post_create(
        &self,
        commands: &[String],
        worktree_path: &Path,
        branch: &str,
    ) -> HookReport {
        let mut report = HookReport::default();
        if commands.is_empty() {
            return report;
        }

        let mode = self.color_mode;
        eprintln!(
            "{}",
            color::info(mode, format!("Running post-create commands for {branch}"))
        );

        for (index, cmd) in commands.iter().enumerate() {
            let is_last = index + 1 == commands.len();
            report.ran += 1;
            if let Err(err) = execute_command(cmd, worktree_path, mode, is_last) {
                eprintln!(
                    "{}",
                    color::tree_item(mode, color::error(mode, format!("{err:#}")), is_last, 2)
                );
                report.failed.push(cmd.clone());
            }
        }

        report
    }
}

fn execute_command(cmd: &str, working_dir: &Path, color_mode: ColorMode, is_last: bool) -> Result<()> {
    let spinner = color_mode.should_colorize().then(|| {
        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
            pb.set_style(style);
        }
        pb.set_message(format!("Running: {cmd}"));
        pb.enable_steady_tick(Duration::from_millis(100));
        pb
    });

    log::debug!("$ sh -c {cmd:?} (in {})", working_dir.display());
    let start = Instant::now();
    let result = Command::new("sh")
        .arg("-c")
        .arg(cmd)
        .current_dir(working_dir)
        .output();
    let elapsed = start.elapsed();

    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }

    let output = result.with_context(|| format!("Failed to execute command: {cmd}"))?;

    eprintln!(
        "{}",
        color::tree_item(
            color_mode,
            color::info(
                color_mode,
                format!(
                    "Running: {cmd} {}",
                    color::dim(color_mode, format_duration(elapsed))
                )
            ),
            is_last,
            1
        )
    );
    forward_output(&output);

    if !output.status.success() {
        let status = output
            .status
            .code()
            .map_or_else(|| "signal".to_string(), |c| c.to_string());
        anyhow::bail!("Command failed ({status}): {cmd}");
    }

    Ok(())
}

/// stdout belongs to the shell wrapper, so both streams go to stderr
fn forward_output(output: &Output) {
    for stream in [&output.stdout, &output.stderr] {
        let text = String::from_utf8_lossy(stream);
        if !text.is_empty() {
            eprint!("{text}");
            if !text.ends_with('\n') {
                eprintln!();
            }
        }
    }
}

/// Format duration for display (only if >= 100ms)
fn format_duration(duration: Duration) -> String {
    let millis = duration.as_millis();
    if millis < 100 {
        String::new()
    } else if millis < 1000 {
        format!("({millis}ms)")
    } else {
        let secs = duration.as_secs_f64();
        format!("({secs:.1}s)")
    }
}

#[cfg(test)]
pub mod testing {
    //! Recording hook executor shared by unit tests

    use super::{HookExecutor, HookReport};
    use std::cell::RefCell;
    use std::path::{Path, PathBuf};

    /// Records each invocation instead of running anything
    #[derive(Default)]
    pub struct MockHookExecutor {
        pub invocations: RefCell<Vec<(Vec<String>, PathBuf, String)>>,
    }

    impl HookExecutor for MockHookExecutor {
        fn run_post_create(
            &self,
            commands: &[String],
            worktree_path: &Path,
            branch: &str,
        ) -> HookReport {
            self.invocations.borrow_mut().push((
                commands.to_vec(),
                worktree_path.to_path_buf(),
                branch.to_string(),
            ));
            HookReport {
                ran: commands.len(),
                failed: Vec::new(),
            }
        }
    }
}
