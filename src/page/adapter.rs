//! Input location and send replay.
//!
//! One locator strategy per known product family plus a generic fallback,
//! tried in a fixed priority order. The first candidate whose extracted
//! text is non-blank after trimming wins.

use crate::page::{ControlKind, Element, HostPage, SyntheticEvent};

/// An editable control together with its current (trimmed) text.
#[derive(Debug, Clone)]
pub struct LocatedInput {
    pub element: Element,
    pub text: String,
}

/// A product-family strategy for finding the active prompt input.
pub trait InputLocator: Send + Sync {
    fn product(&self) -> &'static str;

    /// Selectors to try, most specific first.
    fn selectors(&self) -> &'static [&'static str];

    fn locate(&self, page: &dyn HostPage) -> Option<LocatedInput> {
        for selector in self.selectors() {
            if let Some(element) = page.query(selector) {
                let text = page.read_text(&element);
                let trimmed = text.trim();
                if !trimmed.is_empty() {
                    return Some(LocatedInput {
                        element,
                        text: trimmed.to_string(),
                    });
                }
            }
        }
        None
    }
}

/// ChatGPT's dedicated prompt textarea.
pub struct ChatGptLocator;

impl InputLocator for ChatGptLocator {
    fn product(&self) -> &'static str {
        "chatgpt"
    }

    fn selectors(&self) -> &'static [&'static str] {
        &["#prompt-textarea"]
    }
}

/// ProseMirror-style rich editors (Claude, Gemini).
pub struct RichEditorLocator;

impl InputLocator for RichEditorLocator {
    fn product(&self) -> &'static str {
        "rich-editor"
    }

    fn selectors(&self) -> &'static [&'static str] {
        &[
            r#"div.ProseMirror[contenteditable="true"]"#,
            r#"div[contenteditable="true"].ProseMirror"#,
        ]
    }
}

/// Controls identifiable by their placeholder text.
pub struct PlaceholderLocator;

impl InputLocator for PlaceholderLocator {
    fn product(&self) -> &'static str {
        "placeholder"
    }

    fn selectors(&self) -> &'static [&'static str] {
        &[
            r#"textarea[placeholder*="Message"]"#,
            r#"textarea[placeholder*="Send"]"#,
            r#"div[contenteditable="true"][data-placeholder]"#,
        ]
    }
}

/// Last-resort generic editable controls.
pub struct GenericLocator;

impl InputLocator for GenericLocator {
    fn product(&self) -> &'static str {
        "generic"
    }

    fn selectors(&self) -> &'static [&'static str] {
        &["textarea", r#"div[contenteditable="true"]"#]
    }
}

/// How a replayed send was delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendPath {
    /// Clicked a located send control.
    Button,
    /// No send control; synthesized an Enter keypress on the input.
    EnterKey,
    /// Nothing usable on the page; nothing was sent.
    NotFound,
}

/// Site adapter: locates inputs and send controls, writes text, replays
/// sends.
pub struct PromptAdapter {
    locators: Vec<Box<dyn InputLocator>>,
}

impl Default for PromptAdapter {
    fn default() -> Self {
        Self {
            locators: vec![
                Box::new(ChatGptLocator),
                Box::new(RichEditorLocator),
                Box::new(PlaceholderLocator),
                Box::new(GenericLocator),
            ],
        }
    }
}

impl PromptAdapter {
    pub fn new(locators: Vec<Box<dyn InputLocator>>) -> Self {
        Self { locators }
    }

    /// First strategy, in priority order, that finds a non-blank input.
    pub fn locate_input(&self, page: &dyn HostPage) -> Option<LocatedInput> {
        for locator in &self.locators {
            if let Some(found) = locator.locate(page) {
                tracing::debug!(product = locator.product(), "located prompt input");
                return Some(found);
            }
        }
        None
    }

    /// Write `text` into `element` and synthesize the content-changed
    /// notification so the host page's own state observes the update.
    pub fn write_text(&self, page: &dyn HostPage, element: &Element, text: &str) {
        match element.kind {
            ControlKind::RichText => page.set_rich_text(element, text),
            _ => page.set_value(element, text),
        }
        page.fire(element, SyntheticEvent::Input);
    }

    /// Find a control whose test identifier or accessible label
    /// case-insensitively contains "send".
    pub fn locate_send_control(&self, page: &dyn HostPage) -> Option<Element> {
        if let Some(button) = page.query(r#"button[data-testid="send-button"]"#) {
            return Some(button);
        }
        page.buttons().into_iter().find(|button| {
            ["aria-label", "data-testid"].iter().any(|attr| {
                page.attribute(button, attr)
                    .is_some_and(|v| v.to_lowercase().contains("send"))
            })
        })
    }

    /// Replay the send action: click the send control if one exists,
    /// otherwise dispatch Enter on the located input.
    pub fn perform_send(&self, page: &dyn HostPage) -> SendPath {
        if let Some(button) = self.locate_send_control(page) {
            page.fire(&button, SyntheticEvent::Click);
            return SendPath::Button;
        }
        if let Some(input) = self.locate_input(page) {
            page.fire(
                &input.element,
                SyntheticEvent::KeyDown {
                    key: "Enter".to_string(),
                },
            );
            return SendPath::EnterKey;
        }
        tracing::debug!("no send control or input found; nothing replayed");
        SendPath::NotFound
    }
}
