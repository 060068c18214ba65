//! Engine assembly.
//!
//! Wires the configured scanner, gate controller, and interceptor together
//! behind one handle the host bridge drives.

use std::sync::Arc;

use crate::config::GuardConfig;
use crate::error::SetupError;
use crate::gate::GateController;
use crate::intercept::{EventDisposition, Interceptor, PageEvent};
use crate::page::HostPage;
use crate::presenter::{DecisionSurface, Notice};
use crate::relay::{RelayNotice, SanitizeReply, handle_notice, handle_sanitize};
use crate::scanner::HttpScanner;

/// Hosts that get the one-shot activation notice.
const FLAGSHIP_HOSTS: &[&str] = &["chat.openai.com", "chatgpt.com", "claude.ai", "gemini.google.com"];

/// The assembled interception engine, one instance per page load.
pub struct PromptGate {
    config: GuardConfig,
    gate: Arc<GateController>,
    interceptor: Arc<Interceptor>,
    scanner: Arc<HttpScanner>,
}

impl PromptGate {
    pub fn new(config: GuardConfig, surface: Arc<dyn DecisionSurface>) -> Result<Self, SetupError> {
        let scanner = Arc::new(HttpScanner::new(&config)?);
        let gate = Arc::new(GateController::new(&config, scanner.clone(), surface)?);
        let interceptor = Arc::new(Interceptor::new(&config, Arc::clone(&gate)));
        tracing::info!(
            hosts = config.allowed_hosts.len(),
            enabled = config.enabled,
            "prompt gate ready"
        );
        Ok(Self {
            config,
            gate,
            interceptor,
            scanner,
        })
    }

    /// Announce the engine on a freshly attached page.
    pub fn attach(&self, page: &dyn HostPage) {
        let host = page.hostname();
        if FLAGSHIP_HOSTS.iter().any(|h| host.contains(h)) {
            self.gate
                .presenter()
                .toast(&Notice::ProtectionActive { host: host.clone() });
        }
        tracing::info!(%host, "intercepting");
    }

    /// Feed one candidate event through the interceptor.
    pub fn on_event(&self, page: &Arc<dyn HostPage>, event: &PageEvent) -> EventDisposition {
        self.interceptor.on_event(page, event)
    }

    /// Apply an inbound relay notice.
    pub fn handle_notice(&self, notice: &RelayNotice) {
        handle_notice(&self.interceptor, notice);
    }

    /// Serve a sanitize request for a non-interception call site.
    pub async fn sanitize(&self, prompt: &str) -> SanitizeReply {
        handle_sanitize(self.scanner.as_ref(), prompt).await
    }

    pub fn config(&self) -> &GuardConfig {
        &self.config
    }

    pub fn gate(&self) -> &Arc<GateController> {
        &self.gate
    }

    pub fn interceptor(&self) -> &Arc<Interceptor> {
        &self.interceptor
    }

    pub fn scanner(&self) -> &Arc<HttpScanner> {
        &self.scanner
    }
}
