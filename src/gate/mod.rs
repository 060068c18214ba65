//! Gate controller: orchestrates local detection, the remote scan, the
//! merge policy, and the decision flow.
//!
//! State machine: Idle -> Scanning -> {AutoApproved | AwaitingDecision} ->
//! Idle. `InterceptState` is the sole mutual exclusion: a second send
//! attempt while a scan is outstanding is dropped, not queued. The
//! approved-text slot is single-use and single-slot; if two approvals race,
//! the last writer wins (accepted limitation).

mod audit;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::config::GuardConfig;
use crate::error::RuleError;
use crate::page::{HostPage, PromptAdapter};
use crate::presenter::{Decision, DecisionSurface, DecisionView, ModalPresenter, Notice};
use crate::rules::RuleSet;
use crate::scanner::{RemoteScanner, ScanOutcome};
use crate::types::{DetectionResult, ThreatMatch};

pub use audit::{DecisionLog, GateRecord};

/// Process-wide interception state. Owned by the gate controller; the
/// interceptor only reads it through the accessors below.
#[derive(Debug, Default)]
pub struct InterceptState {
    scanning: bool,
    approved_text: Option<String>,
}

/// How one gate invocation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateOutcome {
    /// A scan was already in flight; this request was dropped.
    Busy,
    /// No usable input on the page; nothing to do.
    NoInput,
    /// Safe on both axes; the send was replayed automatically.
    AutoApproved,
    /// A decision surface ran; this is what the user chose.
    Resolved(Decision),
}

/// Merge the local detection list with the remote outcome.
///
/// A non-empty structured attack list from the remote scorer replaces the
/// local list entirely. Legacy boolean flags only append a synthetic entry
/// when the list lacks the corresponding generic name. `Unavailable` leaves
/// the local list untouched and PII/sanitized-text at their defaults.
pub fn merge_detection(
    original: &str,
    local: Vec<ThreatMatch>,
    outcome: &ScanOutcome,
) -> DetectionResult {
    match outcome {
        ScanOutcome::Unavailable => DetectionResult {
            threats: local,
            pii_labels: Vec::new(),
            sanitized_text: original.to_string(),
            risk_level: Default::default(),
            raw_remote: None,
        },
        ScanOutcome::Scored(remote) => {
            let mut threats = local;
            if let Some(security) = &remote.security {
                if !security.attacks.is_empty() {
                    threats = security.attacks.clone();
                } else {
                    fn has(list: &[ThreatMatch], name: &str) -> bool {
                        list.iter().any(|t| t.name == name)
                    }
                    if security.prompt_injection.as_ref().is_some_and(|f| f.detected)
                        && !has(&threats, "Prompt Injection")
                    {
                        threats.push(ThreatMatch::new("Prompt Injection", "prompt_injection_direct"));
                    }
                    if security.jailbreak.as_ref().is_some_and(|f| f.detected)
                        && !has(&threats, "Jailbreak")
                    {
                        threats.push(ThreatMatch::new("Jailbreak", "jailbreak"));
                    }
                }
            }
            DetectionResult {
                threats,
                pii_labels: remote.pii_flags.clone(),
                sanitized_text: remote
                    .materialized_prompt
                    .clone()
                    .filter(|s| !s.is_empty())
                    .unwrap_or_else(|| original.to_string()),
                risk_level: remote.security.as_ref().map(|s| s.overall_risk).unwrap_or_default(),
                raw_remote: Some(remote.clone()),
            }
        }
    }
}

/// Orchestrates one scan per send intent and owns all state transitions.
pub struct GateController {
    state: Mutex<InterceptState>,
    rules: RuleSet,
    scanner: Arc<dyn RemoteScanner>,
    presenter: ModalPresenter,
    adapter: Arc<PromptAdapter>,
    replay_delay: Duration,
    audit: Option<DecisionLog>,
}

impl GateController {
    pub fn new(
        config: &GuardConfig,
        scanner: Arc<dyn RemoteScanner>,
        surface: Arc<dyn DecisionSurface>,
    ) -> Result<Self, RuleError> {
        Ok(Self {
            state: Mutex::new(InterceptState::default()),
            rules: RuleSet::builtin()?,
            scanner,
            presenter: ModalPresenter::new(surface),
            adapter: Arc::new(PromptAdapter::default()),
            replay_delay: config.replay_delay,
            audit: config.audit_path.clone().map(DecisionLog::new),
        })
    }

    /// The adapter, shared with the interceptor.
    pub fn adapter(&self) -> Arc<PromptAdapter> {
        Arc::clone(&self.adapter)
    }

    pub fn presenter(&self) -> &ModalPresenter {
        &self.presenter
    }

    pub fn is_scanning(&self) -> bool {
        self.lock_state().scanning
    }

    pub fn approved_text(&self) -> Option<String> {
        self.lock_state().approved_text.clone()
    }

    /// Mark `text` as approved: the next matching send intent passes
    /// through untouched. Single slot; a newer approval displaces an
    /// unconsumed older one.
    pub fn approve(&self, text: &str) {
        self.lock_state().approved_text = Some(text.to_string());
    }

    /// Consume the approval slot if it names exactly `text`. Single-use:
    /// a second occurrence of the same text is intercepted again.
    pub fn consume_approval(&self, text: &str) -> bool {
        let mut state = self.lock_state();
        if state.approved_text.as_deref() == Some(text) {
            state.approved_text = None;
            true
        } else {
            false
        }
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, InterceptState> {
        self.state.lock().expect("intercept state lock poisoned")
    }

    /// Run the full scan pipeline against the page's current input.
    pub async fn scan_and_gate(&self, page: &dyn HostPage) -> GateOutcome {
        let Some(input) = self.adapter.locate_input(page) else {
            return GateOutcome::NoInput;
        };

        {
            let mut state = self.lock_state();
            if state.scanning {
                tracing::debug!("scan already in flight; dropping send attempt");
                return GateOutcome::Busy;
            }
            state.scanning = true;
        }

        let outcome = self.run_scan(page, &input.text).await;
        self.lock_state().scanning = false;
        outcome
    }

    async fn run_scan(&self, page: &dyn HostPage, original: &str) -> GateOutcome {
        self.presenter.show_scanning();

        // Local classification is synchronous and free; the remote call is
        // the only suspension point.
        let local = self.rules.detect(original);
        let remote = self.scanner.scan(original).await;
        let result = merge_detection(original, local, &remote);

        tracing::info!(
            host = %page.hostname(),
            threats = result.threats.len(),
            pii = result.pii_labels.len(),
            risk = %result.risk_level,
            remote_available = !remote.is_unavailable(),
            "classification complete"
        );

        if result.is_safe() {
            self.presenter.dismiss();
            self.presenter.toast(&Notice::SafeSending);
            self.approve(original);
            self.replay(page).await;
            self.record(page, &result, "auto_approved");
            return GateOutcome::AutoApproved;
        }

        let view = DecisionView::build(original, &result);
        let session = self.presenter.open(&view);
        let decision = session.resolve().await;

        match decision {
            Decision::Block => {
                self.presenter.toast(&Notice::Blocked);
                self.record(page, &result, "blocked");
            }
            Decision::Edit => {
                self.record(page, &result, "edited");
            }
            Decision::Cancel => {
                self.record(page, &result, "cancelled");
            }
            Decision::ProtectAndSend => {
                if let Some(input) = self.adapter.locate_input(page) {
                    self.adapter.write_text(page, &input.element, &result.sanitized_text);
                }
                self.approve(&result.sanitized_text);
                self.replay(page).await;
                self.record(page, &result, "protected");
            }
        }
        GateOutcome::Resolved(decision)
    }

    /// Replay the send after a short settle delay so the page's own state
    /// update does not race the synthetic submit.
    async fn replay(&self, page: &dyn HostPage) {
        tokio::time::sleep(self.replay_delay).await;
        let path = self.adapter.perform_send(page);
        tracing::debug!(?path, "replayed send");
    }

    fn record(&self, page: &dyn HostPage, result: &DetectionResult, outcome: &'static str) {
        let Some(audit) = &self.audit else { return };
        let record = GateRecord::new(
            &page.hostname(),
            result.risk_level,
            result.threats.iter().map(|t| t.name.clone()).collect(),
            result.pii_labels.clone(),
            outcome,
        );
        if let Err(e) = audit.append(&record) {
            tracing::warn!(error = %e, "failed to write decision audit record");
        }
    }
}
