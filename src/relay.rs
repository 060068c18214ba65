//! Cross-context relay messages.
//!
//! The interception path never goes through the relay; these shapes exist
//! for non-interception call sites (manual scans, status surfaces) and for
//! the inbound "protection toggled" policy hook.

use serde::{Deserialize, Serialize};

use crate::intercept::Interceptor;
use crate::scanner::{RemoteScanner, ScanOutcome};
use crate::types::RemoteResponse;

/// Outbound request from an external surface.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum RelayRequest {
    #[serde(rename = "SANITIZE_PROMPT")]
    SanitizePrompt { prompt: String },
}

/// Inbound notification consumed by the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum RelayNotice {
    #[serde(rename = "TOGGLE_PROTECTION")]
    ToggleProtection { enabled: bool },
}

/// Reply to a sanitize request. This is the one place a hard failure is
/// surfaced, and only as a generic retryable message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SanitizeReply {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<RemoteResponse>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Run a sanitize request for a non-interception call site.
pub async fn handle_sanitize(scanner: &dyn RemoteScanner, prompt: &str) -> SanitizeReply {
    match scanner.scan(prompt).await {
        ScanOutcome::Scored(data) => SanitizeReply {
            success: true,
            data: Some(data),
            error: None,
        },
        ScanOutcome::Unavailable => SanitizeReply {
            success: false,
            data: None,
            error: Some("failed to sanitize prompt, please try again".to_string()),
        },
    }
}

/// Apply an inbound notice to the running engine.
pub fn handle_notice(interceptor: &Interceptor, notice: &RelayNotice) {
    match notice {
        RelayNotice::ToggleProtection { enabled } => interceptor.set_enabled(*enabled),
    }
}
