use std::io::{self, Write};
use std::path::Path;

use clap::CommandFactory;
use clap_complete::aot::{generate, Shell};

use crate::cli::{Cli, CompletionShell};
use crate::error::CliError;

pub fn run_completions(shell: CompletionShell, output_path: Option<&Path>) -> Result<(), CliError> {
    let shell = Shell::from(shell);
    let script = render(shell);
    match output_path {
        Some(path) => {
            std::fs::write(path, &script)?;
            println!("Saved {shell} completions to {}", path.display());
        }
        None => io::stdout().write_all(&script)?,
    }
    Ok(())
}

/// The completion script keys on the invoked binary name, which the command
/// definition carries.
fn render(shell: Shell) -> Vec<u8> {
    let mut command = Cli::command();
    let name = command.get_name().to_string();
    let mut script = Vec::new();
    generate(shell, &mut command, name, &mut script);
    script
}

impl From<CompletionShell> for Shell {
    fn from(shell: CompletionShell) -> Self {
        match shell {
            CompletionShell::Bash => Self::Bash,
            CompletionShell::Zsh => Self::Zsh,
            CompletionShell::Fish => Self::Fish,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scripts_target_the_installed_binary_name() {
        for shell in [Shell::Bash, Shell::Zsh, Shell::Fish] {
            let script = String::from_utf8(render(shell)).expect("script is not UTF-8");
            assert!(
                script.contains("earthmover"),
                "{shell} script never names the binary"
            );
        }
    }
}
