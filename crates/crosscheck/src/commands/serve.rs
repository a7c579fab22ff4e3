use std::sync::Arc;

use crosscheck_core::config::Config;
use crosscheck_core::tools::ToolRegistry;

use crate::output::Reporter;
use crate::server::CrossCheckServer;

/// Run the `crosscheck serve` command.
///
/// Blocks until the MCP client closes stdin. Nothing may be printed to
/// stdout here except protocol frames.
pub fn run_serve(config: &Config, reporter: &mut Reporter) -> bool {
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

    let server = CrossCheckServer::new(Arc::new(registry));
    match rt.block_on(server.run()) {
        Ok(()) => true,
        Err(e) => {
            reporter.error(&e);
            false
        }
    }
}
