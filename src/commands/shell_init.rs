//! Shell init command - Generate shell integration scripts

use anyhow::Result;

/// Generate shell integration script
///
/// The wrapper runs `gwt`, then acts on `cd <path>` and
/// `GWT_GIT_DIR=<location>` lines printed to stdout.
///
/// # Errors
/// Returns an error if invalid shell is specified
pub fn cmd_shell_init(shell: &str) -> Result<()> {
    print!("{}", script_for(shell)?);
    Ok(())
}

fn script_for(shell: &str) -> Result<&'static str> {
    let script = match shell {
        "bash" => include_str!("../../templates/bash.sh"),
        "zsh" => include_str!("../../templates/zsh.sh"),
        "fish" => include_str!("../../templates/fish.fish"),
        _ => {
            anyhow::bail!("Invalid shell: {shell}. Supported shells: bash, zsh, fish");
        }
    };
    Ok(script)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scripts_follow_cd_and_repo_lines() {
        for shell in ["bash", "zsh", "fish"] {
            let script = script_for(shell).unwrap();
            assert!(script.contains("function gwt") || script.contains("gwt()"));
            assert!(script.contains("cd "));
            assert!(script.contains("GWT_GIT_DIR"));
        }
    }

    #[test]
    fn test_invalid_shell() {
        assert!(script_for("nu").is_err());
    }
}
