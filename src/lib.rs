//! PromptGate: an interception-and-gating engine for outgoing AI chat
//! prompts.
//!
//! The engine sits between a user's send action and the chat service. A
//! host bridge (webview glue, WebDriver harness) implements two small
//! seams -- [`page::HostPage`] for the DOM and
//! [`presenter::DecisionSurface`] for rendering -- and forwards candidate
//! events. The engine then:
//!
//! - recognizes send intents on supported hosts and suppresses them
//!   synchronously,
//! - classifies the pending text with a local rule table plus an optional
//!   remote scorer (single timed attempt, fail open to local-only),
//! - merges the two signals into one decision,
//! - drives a modal decision session when human judgment is needed, and
//! - re-injects approved or sanitized text and replays the send exactly
//!   once through a single-use approval slot.

pub mod config;
pub mod engine;
pub mod error;
pub mod gate;
pub mod intercept;
pub mod page;
pub mod presenter;
pub mod relay;
pub mod rules;
pub mod scanner;
pub mod types;

pub use config::GuardConfig;
pub use engine::PromptGate;
pub use gate::{GateController, GateOutcome};
pub use intercept::{EventDisposition, Interceptor, PageEvent};
pub use page::{HostPage, PromptAdapter};
pub use presenter::{Decision, DecisionSurface, DecisionView, ModalPresenter};
pub use rules::RuleSet;
pub use scanner::{HttpScanner, RemoteScanner, ScanOutcome};
pub use types::{DetectionResult, RemoteResponse, RiskLevel, ThreatMatch};
