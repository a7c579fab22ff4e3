//! Structured outputs returned by the review and critique tools.

pub mod critique;
pub mod review;

use serde::de::DeserializeOwned;

pub use critique::{CritiqueOutput, CritiqueVerdict, RiskAssessment, RiskLevel};
pub use review::{IssueSeverity, ReviewIssue, ReviewOutput, ReviewVerdict};

/// Text placed in degraded outputs when the provider's answer could not be
/// parsed.
pub const PARSE_FAILURE_MARKER: &str = "Failed to parse provider response";

/// Maximum number of characters of raw provider text kept as the summary of
/// a degraded output.
pub const DEGRADED_SUMMARY_CHARS: usize = 200;

/// Range and consistency checks that serde alone cannot express.
pub trait Validate {
    fn validate(&self) -> Result<(), String>;
}

/// Parses `text` as JSON into `T` and validates it.
pub fn parse_output<T: DeserializeOwned + Validate>(text: &str) -> Result<T, String> {
    let value: T = serde_json::from_str(text.trim()).map_err(|e| e.to_string())?;
    value.validate()?;
    Ok(value)
}

pub(crate) fn truncate_summary(raw: &str) -> String {
    raw.chars().take(DEGRADED_SUMMARY_CHARS).collect()
}
