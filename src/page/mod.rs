//! Host page abstraction.
//!
//! The engine never talks to a DOM directly. The embedding environment (a
//! webview bridge, a WebDriver harness) implements [`HostPage`] and the
//! adapter layer built on top of it locates inputs and drives sends. The
//! engine only interferes with pages it can understand: every lookup
//! degrades to "not found" rather than an error.

mod adapter;

pub use adapter::{
    ChatGptLocator, GenericLocator, InputLocator, LocatedInput, PlaceholderLocator,
    PromptAdapter, RichEditorLocator, SendPath,
};

/// Opaque element handle. Identity is assigned by the host bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Element {
    pub id: u64,
    pub kind: ControlKind,
}

/// Coarse control classification, enough to choose a write path and to
/// recognize editable send targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ControlKind {
    TextArea,
    TextInput,
    /// Contenteditable region (ProseMirror and friends).
    RichText,
    Button,
    #[default]
    Other,
}

impl ControlKind {
    /// Whether a confirm keypress inside this control counts as a send
    /// intent.
    pub fn is_editable(self) -> bool {
        matches!(self, ControlKind::TextArea | ControlKind::TextInput | ControlKind::RichText)
    }
}

/// Event synthesized back into the host page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyntheticEvent {
    /// Standard "content changed" notification so the page's own reactive
    /// logic observes programmatic writes.
    Input,
    Click,
    KeyDown { key: String },
}

/// Capability surface the host bridge provides.
///
/// `query` takes the same CSS-ish selector strings the locator strategies
/// are written against; a bridge is free to interpret them however its
/// platform requires, as long as matching is stable within a page load.
pub trait HostPage: Send + Sync {
    fn hostname(&self) -> String;

    /// First element matching `selector`, if any.
    fn query(&self, selector: &str) -> Option<Element>;

    /// All button-like controls currently on the page.
    fn buttons(&self) -> Vec<Element>;

    fn read_text(&self, element: &Element) -> String;

    /// Write path for plain input-like controls.
    fn set_value(&self, element: &Element, text: &str);

    /// Write path for rich editable regions.
    fn set_rich_text(&self, element: &Element, text: &str);

    /// Accessible attribute lookup (aria-label, data-testid, ...).
    fn attribute(&self, element: &Element, name: &str) -> Option<String>;

    fn fire(&self, element: &Element, event: SyntheticEvent);

    /// Nearest enclosing button of `element`, for pointer events landing on
    /// a button's inner nodes. Returns the element itself when it already
    /// is a button.
    fn enclosing_button(&self, element: &Element) -> Option<Element>;
}
