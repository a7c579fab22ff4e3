pub mod auth;
pub mod call;
pub mod completions;
pub mod serve;
pub mod tools;

use crate::output::Reporter;

/// Builds the tokio runtime for commands that talk to the network.
fn runtime(reporter: &mut Reporter) -> Option<tokio::runtime::Runtime> {
    match tokio::runtime::Runtime::new() {
        Ok(rt) => Some(rt),
        Err(e) => {
            reporter.error(&format!("Cannot start async runtime: {e}"));
            None
        }
    }
}
