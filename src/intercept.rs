//! Top-level event interception.
//!
//! The host bridge feeds every candidate event through [`Interceptor::on_event`],
//! which must answer synchronously: suppression has to be decided inside the
//! triggering event's handler, before anything awaits. Classification runs
//! afterwards on a spawned task. The approved-text check here is the sole
//! bypass path; it is what lets the programmatic replay through exactly once.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::config::GuardConfig;
use crate::gate::GateController;
use crate::page::{Element, HostPage, PromptAdapter};

/// Candidate user event, as observed at the outermost capture point.
#[derive(Debug, Clone)]
pub enum PageEvent {
    KeyDown {
        key: String,
        shift: bool,
        target: Element,
    },
    Click {
        target: Element,
    },
}

/// What the bridge should do with the native event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventDisposition {
    /// Leave the event alone.
    Pass,
    /// Prevent the default action and stop propagation; the scan pipeline
    /// has been started.
    Suppress,
}

/// Recognizes send intents and gates them.
pub struct Interceptor {
    gate: Arc<GateController>,
    adapter: Arc<PromptAdapter>,
    allowed_hosts: Vec<String>,
    enabled: AtomicBool,
}

impl Interceptor {
    pub fn new(config: &GuardConfig, gate: Arc<GateController>) -> Self {
        Self {
            adapter: gate.adapter(),
            gate,
            allowed_hosts: config.allowed_hosts.clone(),
            enabled: AtomicBool::new(config.enabled),
        }
    }

    /// Policy hook for the "protection toggled" notice. When disabled the
    /// interceptor performs no inspection at all.
    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::SeqCst);
        tracing::info!(enabled, "protection toggled");
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    fn host_allowed(&self, host: &str) -> bool {
        self.allowed_hosts
            .iter()
            .any(|h| host.contains(h.as_str()) || host.ends_with(h.as_str()))
    }

    fn is_send_intent(&self, page: &dyn HostPage, event: &PageEvent) -> bool {
        match event {
            PageEvent::KeyDown { key, shift, target } => {
                key == "Enter" && !shift && target.kind.is_editable()
            }
            PageEvent::Click { target } => page
                .enclosing_button(target)
                .is_some_and(|button| {
                    ["aria-label", "data-testid"].iter().any(|attr| {
                        page.attribute(&button, attr)
                            .is_some_and(|v| v.to_lowercase().contains("send"))
                    })
                }),
        }
    }

    /// Decide, without awaiting, whether to suppress `event`. On
    /// `Suppress` the gate pipeline has been spawned against `page`.
    pub fn on_event(&self, page: &Arc<dyn HostPage>, event: &PageEvent) -> EventDisposition {
        if !self.is_enabled() {
            return EventDisposition::Pass;
        }
        if !self.host_allowed(&page.hostname()) {
            return EventDisposition::Pass;
        }
        if !self.is_send_intent(page.as_ref(), event) {
            return EventDisposition::Pass;
        }

        // A page without usable text is left alone.
        let Some(input) = self.adapter.locate_input(page.as_ref()) else {
            return EventDisposition::Pass;
        };

        // Sole bypass: the replay of an approved send. Single-use.
        if self.gate.consume_approval(&input.text) {
            tracing::debug!("approved replay passing through");
            return EventDisposition::Pass;
        }

        let gate = Arc::clone(&self.gate);
        let page = Arc::clone(page);
        tokio::spawn(async move {
            let outcome = gate.scan_and_gate(page.as_ref()).await;
            tracing::debug!(?outcome, "gate pipeline finished");
        });
        EventDisposition::Suppress
    }
}
