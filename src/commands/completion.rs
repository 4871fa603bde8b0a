//! Completion command - Generate shell completion setup instructions

use anyhow::Result;
use clap_complete::Shell;

/// Generate shell completion setup instructions
///
/// # Errors
/// Returns an error if:
/// - Invalid shell specified
pub fn cmd_completion(shell: &str) -> Result<()> {
    print!("{}", completion_instructions(shell)?);
    Ok(())
}

fn completion_instructions(shell: &str) -> Result<&'static str> {
    // Validate shell type
    let _ = shell.parse::<Shell>().map_err(|_| {
        anyhow::anyhow!("Invalid shell: {shell}. Supported shells: bash, zsh, fish")
    })?;

    let instructions = match shell {
        "bash" => {
            r"# gwt shell completion setup for Bash
# Add this to your ~/.bashrc:
source <(COMPLETE=bash gwt)
"
        }
        "zsh" => {
            r"# gwt shell completion setup for Zsh
# Add this to your ~/.zshrc:
source <(COMPLETE=zsh gwt)
"
        }
        "fish" => {
            r"# gwt shell completion setup for Fish
# Add this to your ~/.config/fish/config.fish:
source (COMPLETE=fish gwt | psub)
"
        }
        _ => {
            anyhow::bail!("Unsupported shell: {shell}");
        }
    };

    Ok(instructions)
}
