use clap::CommandFactory;
use clap_complete::Shell;

use crate::cli::Cli;

/// Run the `crosscheck completions` command.
pub fn run_completions(shell: Shell) -> bool {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    clap_complete::generate(shell, &mut cmd, name, &mut std::io::stdout());
    true
}
