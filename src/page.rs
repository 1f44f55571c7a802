//! Host page abstraction.
//!
//! The orchestrator never touches a live document directly; it talks to a
//! [`ChatPage`] implementation injected at build time. That keeps element
//! discovery, typing and activation testable against a substitute page, and
//! leaves the binding to a concrete browser (CDP, WebDriver, injected
//! script) to the embedding application.

use crate::error::{CmsError, Result};
use std::sync::Mutex;

/// Opaque handle to a resolved page element.
///
/// The `id` is whatever identity the page implementation can offer that is
/// stable for the duration of a run; it also keys the single-flight guard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementRef {
    pub id: String,
}

impl ElementRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

/// Minimal surface of a chat-style host page.
///
/// `query_all` is the probe primitive the locator strategies are built on.
/// The interaction methods mirror what a send needs: focus the input box,
/// insert text, tell the host application the content changed, and activate
/// the send control with a user-level click.
pub trait ChatPage: Send + Sync {
    /// All elements currently matching the selector, in document order.
    fn query_all(&self, selector: &str) -> Vec<ElementRef>;

    /// First element matching the selector, if any.
    fn query(&self, selector: &str) -> Option<ElementRef> {
        self.query_all(selector).into_iter().next()
    }

    fn focus(&self, target: &ElementRef) -> Result<()>;

    fn insert_text(&self, target: &ElementRef, text: &str) -> Result<()>;

    fn emit_change(&self, target: &ElementRef) -> Result<()>;

    fn click(&self, target: &ElementRef) -> Result<()>;
}

/// One recorded interaction against an [`InMemoryPage`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageEvent {
    Focus(String),
    Insert { target: String, text: String },
    Change(String),
    Click(String),
}

struct MemoryElement {
    selector: String,
    id: String,
    visible: bool,
}

#[derive(Default)]
struct PageState {
    elements: Vec<MemoryElement>,
    events: Vec<PageEvent>,
}

/// In-memory [`ChatPage`] used by the test suite and the rehearsal binary.
///
/// Elements are registered under a literal selector string (no CSS engine —
/// `query_all` matches registered selectors exactly) and can be hidden or
/// revealed mid-run to mimic a host UI that only materializes its send
/// control after text entry. Every interaction is recorded.
#[derive(Default)]
pub struct InMemoryPage {
    state: Mutex<PageState>,
}

impl InMemoryPage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a visible element under a selector.
    pub fn add_element(&self, selector: impl Into<String>, id: impl Into<String>) {
        self.insert(selector.into(), id.into(), true);
    }

    /// Register an element that `query_all` will not return until revealed.
    pub fn add_hidden_element(&self, selector: impl Into<String>, id: impl Into<String>) {
        self.insert(selector.into(), id.into(), false);
    }

    fn insert(&self, selector: String, id: String, visible: bool) {
        self.state.lock().unwrap().elements.push(MemoryElement {
            selector,
            id,
            visible,
        });
    }

    /// Make a previously hidden element visible.
    pub fn reveal(&self, id: &str) {
        self.set_visible(id, true);
    }

    /// Hide an element from subsequent queries.
    pub fn hide(&self, id: &str) {
        self.set_visible(id, false);
    }

    fn set_visible(&self, id: &str, visible: bool) {
        let mut state = self.state.lock().unwrap();
        for element in state.elements.iter_mut().filter(|e| e.id == id) {
            element.visible = visible;
        }
    }

    /// Every text inserted so far, in order.
    pub fn typed_texts(&self) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .events
            .iter()
            .filter_map(|event| match event {
                PageEvent::Insert { text, .. } => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    /// Number of clicks recorded against an element.
    pub fn click_count(&self, id: &str) -> usize {
        self.state
            .lock()
            .unwrap()
            .events
            .iter()
            .filter(|event| matches!(event, PageEvent::Click(clicked) if clicked == id))
            .count()
    }

    /// Full interaction log.
    pub fn events(&self) -> Vec<PageEvent> {
        self.state.lock().unwrap().events.clone()
    }

    fn record(&self, target: &ElementRef, event: PageEvent) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        let known = state
            .elements
            .iter()
            .any(|e| e.id == target.id && e.visible);
        if !known {
            return Err(CmsError::page(format!(
                "element '{}' is not present on the page",
                target.id
            )));
        }
        state.events.push(event);
        Ok(())
    }
}

impl ChatPage for InMemoryPage {
    fn query_all(&self, selector: &str) -> Vec<ElementRef> {
        self.state
            .lock()
            .unwrap()
            .elements
            .iter()
            .filter(|e| e.visible && e.selector == selector)
            .map(|e| ElementRef::new(e.id.clone()))
            .collect()
    }

    fn focus(&self, target: &ElementRef) -> Result<()> {
        self.record(target, PageEvent::Focus(target.id.clone()))
    }

    fn insert_text(&self, target: &ElementRef, text: &str) -> Result<()> {
        self.record(
            target,
            PageEvent::Insert {
                target: target.id.clone(),
                text: text.to_string(),
            },
        )
    }

    fn emit_change(&self, target: &ElementRef) -> Result<()> {
        self.record(target, PageEvent::Change(target.id.clone()))
    }

    fn click(&self, target: &ElementRef) -> Result<()> {
        self.record(target, PageEvent::Click(target.id.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_matches_registered_selector() {
        let page = InMemoryPage::new();
        page.add_element("input", "box-1");
        page.add_element("input", "box-2");

        let matches = page.query_all("input");
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].id, "box-1");
        assert_eq!(page.query("input").unwrap().id, "box-1");
        assert!(page.query("missing").is_none());
    }

    #[test]
    fn test_hidden_element_invisible_until_revealed() {
        let page = InMemoryPage::new();
        page.add_hidden_element("button", "send");

        assert!(page.query("button").is_none());
        page.reveal("send");
        assert_eq!(page.query("button").unwrap().id, "send");
    }

    #[test]
    fn test_interactions_are_recorded() {
        let page = InMemoryPage::new();
        page.add_element("input", "box");
        let element = page.query("input").unwrap();

        page.focus(&element).unwrap();
        page.insert_text(&element, "hello").unwrap();
        page.emit_change(&element).unwrap();

        assert_eq!(page.typed_texts(), vec!["hello"]);
        assert_eq!(page.events().len(), 3);
    }

    #[test]
    fn test_interaction_with_unknown_element_fails() {
        let page = InMemoryPage::new();
        let ghost = ElementRef::new("ghost");
        assert!(page.focus(&ghost).is_err());
    }
}
