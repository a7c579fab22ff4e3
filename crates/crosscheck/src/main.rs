mod cli;
mod commands;
mod output;
mod server;

use clap::Parser;
use cli::{AuthAction, Cli, ColorMode, Commands};
use crosscheck_core::config::Config;
use output::{OutputMode, Reporter};
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();

    let mode = if cli.json {
        OutputMode::Json
    } else if cli.quiet {
        OutputMode::Quiet
    } else {
        OutputMode::Human
    };

    match cli.color {
        ColorMode::Never => colored::control::set_override(false),
        ColorMode::Always => colored::control::set_override(true),
        ColorMode::Auto => {}
    }

    init_logging(cli.verbose);

    let mut reporter = Reporter::new(mode);

    let success = match cli.command {
        Commands::Completions { shell } => commands::completions::run_completions(shell),
        command => match load_config(&cli.config, &cli.secrets_dir, &mut reporter) {
            Some(config) => run_command(command, &config, &mut reporter),
            None => false,
        },
    };

    reporter.finish();

    if !success {
        std::process::exit(1);
    }
}

fn run_command(command: Commands, config: &Config, reporter: &mut Reporter) -> bool {
    match command {
        Commands::Serve => commands::serve::run_serve(config, reporter),
        Commands::Tools => commands::tools::run_tools(config, reporter),
        Commands::Call { tool, args } => commands::call::run_call(&tool, &args, config, reporter),
        Commands::Auth { action } => match action {
            AuthAction::SetKey { key } => {
                commands::auth::run_set_key(key.as_deref(), config, reporter)
            }
            AuthAction::SetToken {
                access_token,
                refresh_token,
                expires_in,
                scope,
            } => commands::auth::run_set_token(
                &access_token,
                refresh_token.as_deref(),
                expires_in,
                scope.as_deref(),
                config,
                reporter,
            ),
            AuthAction::Status => commands::auth::run_status(config, reporter),
        },
        Commands::Completions { shell } => commands::completions::run_completions(shell),
    }
}

/// Logs go to stderr; stdout carries MCP frames under `serve`.
fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Loads configuration, then applies the `--secrets-dir` override.
fn load_config(
    path: &Option<std::path::PathBuf>,
    secrets_dir: &Option<std::path::PathBuf>,
    reporter: &mut Reporter,
) -> Option<Config> {
    match Config::load(path.as_deref()) {
        Ok(mut config) => {
            if let Some(dir) = secrets_dir {
                config.secrets_dir = Some(dir.clone());
            }
            Some(config)
        }
        Err(e) => {
            reporter.error(&format!("Failed to load configuration: {e}"));
            None
        }
    }
}
