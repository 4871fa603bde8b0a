use std::io::Write;
use std::process::ExitCode;

use clap::{CommandFactory, Parser};
use clap_complete::env::CompleteEnv;

use gwt::cli::{Cli, Commands, ListArgs};
use gwt::color::{self, ColorMode};
use gwt::commands;
use gwt::domain::locate::ResolutionError;
use gwt::service::SwitchError;

fn main() -> ExitCode {
    // Handle dynamic completion via COMPLETE environment variable
    CompleteEnv::with_factory(Cli::command).complete();

    init_logging();

    let cli = Cli::parse();

    // Resolve color mode from CLI flag and environment variables
    let color_mode = ColorMode::resolve(cli.color);

    let result = match cli.command {
        None => commands::list::cmd_list(&ListArgs::default(), color_mode),
        Some(Commands::List(args)) => commands::list::cmd_list(&args, color_mode),
        Some(Commands::Switch(args)) => commands::switch::cmd_switch(&args, color_mode),
        Some(Commands::Remove { branch }) => commands::remove::cmd_remove(&branch, color_mode),
        Some(Commands::Repo { git_dir }) => commands::repo::cmd_repo(git_dir.as_deref(), color_mode),
        Some(Commands::GetRepo) => {
            commands::repo::cmd_get_repo(color_mode);
            Ok(())
        }
        Some(Commands::Completion { shell }) => commands::completion::cmd_completion(&shell),
        Some(Commands::ShellInit { shell }) => commands::shell_init::cmd_shell_init(&shell),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report_error(&err, color_mode);
            ExitCode::FAILURE
        }
    }
}

/// Debug tracing, off unless `GWT_LOG` asks for it
fn init_logging() {
    env_logger::Builder::from_env(env_logger::Env::new().filter_or("GWT_LOG", "off"))
        .format(|buf, record| writeln!(buf, "[{}] {}", record.level(), record.args()))
        .init();
}

fn report_error(err: &anyhow::Error, color_mode: ColorMode) {
    eprintln!("{}", color::error(color_mode, format!("{err:#}")));

    let hints = if let Some(resolution) = err.downcast_ref::<ResolutionError>() {
        resolution.hints()
    } else if let Some(switch) = err.downcast_ref::<SwitchError>() {
        switch.hints()
    } else {
        Vec::new()
    };
    for hint in hints {
        eprintln!("{}", color::dim(color_mode, format!("hint: {hint}")));
    }
}
