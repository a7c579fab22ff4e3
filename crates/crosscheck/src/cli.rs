use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(
    name = "crosscheck",
    version,
    about = "Second-opinion code review and plan critique from Gemini and GPT, served over MCP"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output machine-readable JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress non-error output
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Color mode
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorMode,

    /// Path to crosscheck.toml (defaults to ~/.omc/crosscheck.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory holding credential files (overrides config and environment)
    #[arg(long, global = true)]
    pub secrets_dir: Option<PathBuf>,

    /// Log debug output to stderr
    #[arg(long, short, global = true)]
    pub verbose: bool,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ColorMode {
    Auto,
    Always,
    Never,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the MCP server on stdin/stdout
    Serve,

    /// List the available tools
    Tools,

    /// Run one tool call locally and print the result
    Call {
        /// Tool name, e.g. gemini_review
        tool: String,

        /// Tool arguments as a JSON object
        #[arg(long, default_value = "{}")]
        args: String,
    },

    /// Manage provider credentials
    Auth {
        #[command(subcommand)]
        action: AuthAction,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand, Debug)]
pub enum AuthAction {
    /// Save the Gemini API key (prompts when omitted)
    SetKey {
        /// The API key
        key: Option<String>,
    },
    /// Save an OpenAI OAuth token
    SetToken {
        #[arg(long)]
        access_token: String,

        #[arg(long)]
        refresh_token: Option<String>,

        /// Seconds until the access token expires
        #[arg(long, default_value_t = 3600)]
        expires_in: i64,

        #[arg(long)]
        scope: Option<String>,
    },
    /// Show where credentials come from and whether they are usable
    Status,
}
