use serde::{Deserialize, Serialize};

use super::{truncate_summary, Validate, PARSE_FAILURE_MARKER};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReviewVerdict {
    Approve,
    RequestChanges,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueSeverity {
    Critical,
    Major,
    Minor,
    Suggestion,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewIssue {
    pub severity: IssueSeverity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

/// Result of a code review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewOutput {
    pub verdict: ReviewVerdict,
    /// 1 (poor) to 10 (excellent).
    pub overall_score: u8,
    pub summary: String,
    /// Ordered by severity, as reported by the model.
    pub issues: Vec<ReviewIssue>,
    pub highlights: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub security_concerns: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub performance_notes: Option<Vec<String>>,
}

impl ReviewOutput {
    /// Fallback used when the provider's answer cannot be parsed. Always
    /// requests changes so a broken response never reads as an approval.
    pub fn degraded(raw: &str) -> Self {
        Self {
            verdict: ReviewVerdict::RequestChanges,
            overall_score: 5,
            summary: truncate_summary(raw),
            issues: vec![ReviewIssue {
                severity: IssueSeverity::Minor,
                line: None,
                message: PARSE_FAILURE_MARKER.to_string(),
                suggestion: None,
            }],
            highlights: Vec::new(),
            security_concerns: None,
            performance_notes: None,
        }
    }
}

impl Validate for ReviewOutput {
    fn validate(&self) -> Result<(), String> {
        if !(1..=10).contains(&self.overall_score) {
            return Err(format!(
                "overall_score must be between 1 and 10, got {}",
                self.overall_score
            ));
        }
        Ok(())
    }
}
