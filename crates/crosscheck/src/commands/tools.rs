use crosscheck_core::config::Config;
use crosscheck_core::tools::ToolRegistry;

use crate::output::Reporter;

/// Run the `crosscheck tools` command.
pub fn run_tools(config: &Config, reporter: &mut Reporter) -> bool {
    match ToolRegistry::standard(config) {
        Ok(registry) => {
            reporter.report_tools(&registry.definitions());
            true
        }
        Err(e) => {
            reporter.error(&format!("{e}"));
            false
        }
    }
}
