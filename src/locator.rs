//! Element discovery with ordered fallback strategies.
//!
//! A [`LocatorStrategy`] is one named probe attempting to resolve a target by
//! one heuristic. An [`ElementLocator`] owns an ordered list of them and
//! returns the first hit. There is no caching and no retry: every `find`
//! re-probes the live page, because interactive targets may be created or
//! destroyed between calls (a send control often only exists once the input
//! box has content).

use crate::page::{ChatPage, ElementRef};
use tracing::debug;

type Probe = Box<dyn Fn(&dyn ChatPage) -> Option<ElementRef> + Send + Sync>;

/// One named discovery probe.
pub struct LocatorStrategy {
    name: String,
    probe: Probe,
}

impl LocatorStrategy {
    /// Create a strategy from an arbitrary probe function.
    pub fn new(
        name: impl Into<String>,
        probe: impl Fn(&dyn ChatPage) -> Option<ElementRef> + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            probe: Box::new(probe),
        }
    }

    /// Strategy resolving the first element matching a selector.
    pub fn css(name: impl Into<String>, selector: impl Into<String>) -> Self {
        let selector = selector.into();
        Self::new(name, move |page| page.query(&selector))
    }

    /// Strategy resolving the n-th element (0-based) matching a selector.
    pub fn css_nth(name: impl Into<String>, selector: impl Into<String>, index: usize) -> Self {
        let selector = selector.into();
        Self::new(name, move |page| {
            page.query_all(&selector).into_iter().nth(index)
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Run the probe against the page.
    pub fn probe(&self, page: &dyn ChatPage) -> Option<ElementRef> {
        (self.probe)(page)
    }
}

impl std::fmt::Debug for LocatorStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocatorStrategy")
            .field("name", &self.name)
            .finish()
    }
}

/// Ordered list of discovery strategies for one target.
#[derive(Debug, Default)]
pub struct ElementLocator {
    strategies: Vec<LocatorStrategy>,
}

impl ElementLocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a strategy, builder style.
    pub fn with_strategy(mut self, strategy: LocatorStrategy) -> Self {
        self.strategies.push(strategy);
        self
    }

    pub fn push(&mut self, strategy: LocatorStrategy) {
        self.strategies.push(strategy);
    }

    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }

    /// Evaluate strategies in registration order and return the first hit.
    ///
    /// Evaluation is lazy: strategies after the first success never run.
    /// Returns `None` when every strategy fails.
    pub fn find(&self, page: &dyn ChatPage) -> Option<ElementRef> {
        for strategy in &self.strategies {
            debug!(strategy = strategy.name(), "trying discovery strategy");
            if let Some(element) = strategy.probe(page) {
                debug!(
                    strategy = strategy.name(),
                    element = %element.id,
                    "strategy resolved element"
                );
                return Some(element);
            }
        }
        debug!(strategies = self.strategies.len(), "all strategies failed");
        None
    }

    /// Default message box strategies: the second `contenteditable` region on
    /// the page, then the conversation pane's own editable div.
    pub fn message_box_defaults() -> Self {
        Self::new()
            .with_strategy(LocatorStrategy::css_nth(
                "contenteditable-secondary",
                "[contenteditable='true']",
                1,
            ))
            .with_strategy(LocatorStrategy::css(
                "main-contenteditable",
                "#main div[contenteditable='true']",
            ))
    }

    /// Default send button strategies: the test-id hook, then the send icon.
    pub fn send_button_defaults() -> Self {
        Self::new()
            .with_strategy(LocatorStrategy::css("send-testid", "[data-testid=\"send\"]"))
            .with_strategy(LocatorStrategy::css(
                "send-icon",
                "[data-icon=\"wds-ic-send-filled\"]",
            ))
    }
}
