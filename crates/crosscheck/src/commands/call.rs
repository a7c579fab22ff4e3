use std::time::Duration;

use crosscheck_core::config::Config;
use crosscheck_core::tools::ToolRegistry;
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::Value;

use crate::output::{OutputMode, Reporter};

/// Run the `crosscheck call` command.
///
/// Dispatches exactly as the MCP server would, so the outcome text matches
/// what a client sees. Fails when the outcome is error-flagged.
pub fn run_call(tool: &str, raw_args: &str, config: &Config, reporter: &mut Reporter) -> bool {
    let args: Value = match serde_json::from_str(raw_args) {
        Ok(v) => v,
        Err(e) => {
            reporter.error(&format!("--args is not valid JSON: {e}"));
            return false;
        }
    };

    let registry = match ToolRegistry::standard(config) {
        Ok(r) => r,
        Err(e) => {
            reporter.error(&format!("{e}"));
            return false;
        }
    };

    let Some(rt) = super::runtime(reporter) else {
        return false;
    };

    let progress = (reporter.mode() == OutputMode::Human).then(|| spinner(tool));
    let outcome = rt.block_on(registry.dispatch(tool, args));
    if let Some(pb) = progress {
        pb.finish_and_clear();
    }

    reporter.report_outcome(tool, &outcome);
    !outcome.is_error
}

fn spinner(tool: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.blue} {msg}") {
        pb.set_style(style.tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈"));
    }
    pb.set_message(format!("Waiting for {tool}..."));
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}
