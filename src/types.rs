//! Core data model shared across the gate pipeline.

use serde::{Deserialize, Serialize};

/// A single detected threat. Identity is `name`; within one classification
/// pass names are unique (the detector deduplicates).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThreatMatch {
    pub name: String,
    /// Category the threat belongs to, e.g. `prompt_injection_direct`.
    pub tier: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

impl ThreatMatch {
    pub fn new(name: impl Into<String>, tier: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tier: tier.into(),
            severity: None,
            confidence: None,
        }
    }
}

/// Aggregate severity label summarizing detected threats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    #[default]
    None,
    Low,
    Medium,
    High,
    Critical,
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            RiskLevel::None => "none",
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
            RiskLevel::Critical => "critical",
        };
        f.write_str(s)
    }
}

/// Merged outcome of local detection plus the remote scan.
#[derive(Debug, Clone)]
pub struct DetectionResult {
    /// Ordered threat list after the merge policy has been applied.
    pub threats: Vec<ThreatMatch>,
    /// PII category labels reported by the remote scanner.
    pub pii_labels: Vec<String>,
    /// Remote-sanitized replacement text. Defaults to the original prompt
    /// when no remote substitution is available.
    pub sanitized_text: String,
    pub risk_level: RiskLevel,
    /// Raw remote payload, kept for display purposes.
    pub raw_remote: Option<RemoteResponse>,
}

impl DetectionResult {
    /// A prompt is safe when nothing was flagged on either axis.
    pub fn is_safe(&self) -> bool {
        self.threats.is_empty() && self.pii_labels.is_empty()
    }

    /// Total attack count for display: the remote report's count when
    /// present, otherwise the merged list length.
    pub fn attack_count(&self) -> usize {
        self.raw_remote
            .as_ref()
            .and_then(|r| r.security.as_ref())
            .map(|s| s.attack_count as usize)
            .filter(|&n| n > 0)
            .unwrap_or(self.threats.len())
    }
}

/// Wire payload from the remote scoring endpoint. Every field is optional;
/// absence means "no signal", not an error.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RemoteResponse {
    #[serde(default)]
    pub pii_flags: Vec<String>,
    #[serde(default)]
    pub materialized_prompt: Option<String>,
    #[serde(default)]
    pub security: Option<SecurityReport>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SecurityReport {
    #[serde(default)]
    pub attack_count: u32,
    #[serde(default)]
    pub overall_risk: RiskLevel,
    #[serde(default)]
    pub attacks: Vec<ThreatMatch>,
    #[serde(default)]
    pub prompt_injection: Option<DetectedFlag>,
    #[serde(default)]
    pub jailbreak: Option<DetectedFlag>,
}

/// Legacy boolean detection flag kept for older scorer deployments.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DetectedFlag {
    #[serde(default)]
    pub detected: bool,
}
