//! Decision presenter.
//!
//! The engine owns the modal session state machine and its lifecycle; the
//! rendering surface only draws and forwards raw UI events. The event
//! receiver handed out by [`DecisionSurface::mount`] is the session's
//! listener resource: it is dropped on every exit path, so handlers can
//! never accumulate across repeated sends. At most one session exists at a
//! time; opening a new one forcibly tears down the prior session.

mod view;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;

pub use view::{Decision, DecisionLayout, DecisionView, MAX_DISPLAYED_THREATS};

/// Raw interaction forwarded by the surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiEvent {
    /// Confirm key. Maps to the layout's default action.
    Enter,
    Escape,
    /// Activation of the primary (focused) button.
    Primary,
    /// Activation of the secondary button.
    Secondary,
    /// Click outside the decision surface.
    Backdrop,
    /// The surface's close affordance.
    Close,
}

/// Transient, non-blocking notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// Prompt is safe; auto-forwarding.
    SafeSending,
    /// Prompt was blocked and not sent.
    Blocked,
    /// Protection became active on this page.
    ProtectionActive { host: String },
}

/// Rendering seam. Implementations draw the scanning indicator, the modal,
/// and toasts; they forward user interactions through the channel returned
/// by `mount`.
pub trait DecisionSurface: Send + Sync {
    /// Show the transient "scanning" indicator.
    fn show_scanning(&self);

    /// Render a decision modal and hand back its event stream. Mounting
    /// replaces anything currently shown, including the scanning
    /// indicator, and invalidates any previously handed-out stream.
    fn mount(&self, view: &DecisionView) -> mpsc::UnboundedReceiver<UiEvent>;

    /// Remove whatever is currently shown.
    fn unmount(&self);

    fn toast(&self, notice: &Notice);
}

struct SessionShared {
    closed: AtomicBool,
}

/// A live decision session. Resolving or dropping it releases the surface
/// and the event stream.
pub struct ModalSession {
    shared: Arc<SessionShared>,
    events: mpsc::UnboundedReceiver<UiEvent>,
    layout: DecisionLayout,
    surface: Arc<dyn DecisionSurface>,
}

impl ModalSession {
    /// Run the session until a terminal choice.
    ///
    /// A closed event stream (surface torn down, or this session superseded
    /// by a newer one) resolves to the layout's negative action.
    pub async fn resolve(mut self) -> Decision {
        let negative = self.layout.negative_decision();
        loop {
            if self.shared.closed.load(Ordering::SeqCst) {
                return negative;
            }
            let Some(event) = self.events.recv().await else {
                return negative;
            };
            if let Some(decision) = self.map_event(event) {
                return decision;
            }
        }
    }

    fn map_event(&self, event: UiEvent) -> Option<Decision> {
        match event {
            UiEvent::Enter | UiEvent::Primary => Some(self.layout.default_decision()),
            UiEvent::Secondary | UiEvent::Escape | UiEvent::Backdrop | UiEvent::Close => {
                Some(self.layout.negative_decision())
            }
        }
    }
}

impl Drop for ModalSession {
    fn drop(&mut self) {
        // Superseded sessions were already unmounted by the presenter.
        if !self.shared.closed.swap(true, Ordering::SeqCst) {
            self.surface.unmount();
        }
    }
}

/// Owns the single-session invariant on top of a rendering surface.
pub struct ModalPresenter {
    surface: Arc<dyn DecisionSurface>,
    current: Mutex<Option<Arc<SessionShared>>>,
}

impl ModalPresenter {
    pub fn new(surface: Arc<dyn DecisionSurface>) -> Self {
        Self {
            surface,
            current: Mutex::new(None),
        }
    }

    pub fn surface(&self) -> &Arc<dyn DecisionSurface> {
        &self.surface
    }

    pub fn show_scanning(&self) {
        self.surface.show_scanning();
    }

    /// Dismiss the scanning indicator (or anything else shown) without a
    /// decision.
    pub fn dismiss(&self) {
        self.surface.unmount();
    }

    pub fn toast(&self, notice: &Notice) {
        self.surface.toast(notice);
    }

    /// Open a decision session, tearing down any prior one first.
    pub fn open(&self, view: &DecisionView) -> ModalSession {
        let mut current = self.current.lock().expect("presenter lock poisoned");
        if let Some(prev) = current.take()
            && !prev.closed.swap(true, Ordering::SeqCst)
        {
            self.surface.unmount();
        }

        let events = self.surface.mount(view);
        let shared = Arc::new(SessionShared {
            closed: AtomicBool::new(false),
        });
        *current = Some(Arc::clone(&shared));

        ModalSession {
            shared,
            events,
            layout: view.layout,
            surface: Arc::clone(&self.surface),
        }
    }
}
