use serde::{Deserialize, Serialize};

use super::{truncate_summary, Validate, PARSE_FAILURE_MARKER};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CritiqueVerdict {
    Okay,
    Reject,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub level: RiskLevel,
    pub factors: Vec<String>,
}

/// Result of a plan critique.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CritiqueOutput {
    pub verdict: CritiqueVerdict,
    /// Confidence in the verdict, 0.0 to 1.0.
    pub confidence: f64,
    pub summary: String,
    pub strengths: Vec<String>,
    pub concerns: Vec<String>,
    pub suggestions: Vec<String>,
    pub risk_assessment: RiskAssessment,
}

impl CritiqueOutput {
    /// Fallback used when the provider's answer cannot be parsed.
    pub fn degraded(raw: &str) -> Self {
        Self {
            verdict: CritiqueVerdict::Reject,
            confidence: 0.5,
            summary: truncate_summary(raw),
            strengths: Vec::new(),
            concerns: vec![PARSE_FAILURE_MARKER.to_string()],
            suggestions: vec!["Retry the request".to_string()],
            risk_assessment: RiskAssessment {
                level: RiskLevel::Medium,
                factors: vec!["Parse error".to_string()],
            },
        }
    }
}

impl Validate for CritiqueOutput {
    fn validate(&self) -> Result<(), String> {
        if !(0.0..=1.0).contains(&self.confidence) {
            return Err(format!(
                "confidence must be between 0 and 1, got {}",
                self.confidence
            ));
        }
        Ok(())
    }
}
