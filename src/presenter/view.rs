//! Display model handed to the rendering surface.

use crate::types::{DetectionResult, RiskLevel, ThreatMatch};

/// At most this many ranked threats are listed; the rest collapse into a
/// "+N more" indicator.
pub const MAX_DISPLAYED_THREATS: usize = 5;

/// Which of the two mutually exclusive layouts to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecisionLayout {
    /// Threat list non-empty, regardless of PII. Offers Edit / Block.
    Threat,
    /// No threats, PII present. Offers Cancel / Protect & Send.
    PiiOnly,
}

/// Terminal choice of a decision session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Block,
    Edit,
    ProtectAndSend,
    Cancel,
}

impl DecisionLayout {
    /// Action bound to Enter and given initial focus. The conservative
    /// path for threats, the protective path for PII.
    pub fn default_decision(self) -> Decision {
        match self {
            DecisionLayout::Threat => Decision::Block,
            DecisionLayout::PiiOnly => Decision::ProtectAndSend,
        }
    }

    /// Action equivalent to Escape, backdrop click, or closing the surface.
    pub fn negative_decision(self) -> Decision {
        match self {
            DecisionLayout::Threat => Decision::Edit,
            DecisionLayout::PiiOnly => Decision::Cancel,
        }
    }
}

/// Everything a surface needs to render one decision. Informational only;
/// the safety decision was already made from the full result.
#[derive(Debug, Clone)]
pub struct DecisionView {
    pub layout: DecisionLayout,
    /// The original prompt, for display.
    pub prompt: String,
    /// Up to [`MAX_DISPLAYED_THREATS`] ranked threats.
    pub threats: Vec<ThreatMatch>,
    /// Count behind the "+N more" indicator.
    pub more_threats: usize,
    pub attack_count: usize,
    pub risk: RiskLevel,
    /// Full set of PII category labels.
    pub pii_labels: Vec<String>,
}

impl DecisionView {
    /// Build the view for an unsafe result. Callers must not invoke this
    /// for safe results; those auto-forward without a decision surface.
    pub fn build(prompt: &str, result: &DetectionResult) -> Self {
        let layout = if result.threats.is_empty() {
            DecisionLayout::PiiOnly
        } else {
            DecisionLayout::Threat
        };

        let attack_count = result.attack_count();
        let threats: Vec<ThreatMatch> = result
            .threats
            .iter()
            .take(MAX_DISPLAYED_THREATS)
            .cloned()
            .collect();
        let more_threats = attack_count.saturating_sub(threats.len());

        let risk = if result.risk_level == RiskLevel::None && !result.threats.is_empty() {
            RiskLevel::High
        } else {
            result.risk_level
        };

        Self {
            layout,
            prompt: prompt.to_string(),
            threats,
            more_threats,
            attack_count,
            risk,
            pii_labels: result.pii_labels.clone(),
        }
    }

    pub fn default_decision(&self) -> Decision {
        self.layout.default_decision()
    }
}
