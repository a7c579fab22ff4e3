pub mod config;
pub mod credentials;
pub mod error;
pub mod prompts;
pub mod provider;
pub mod tools;
pub mod types;

pub use config::Config;
pub use error::CrossCheckError;
pub use tools::{ToolOutcome, ToolRegistry};
pub use types::*;
