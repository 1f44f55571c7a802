//! Send orchestration.
//!
//! [`MessageSender`] drives the repeat-loop × fragment-loop of a run: resolve
//! the input box, derive the batch once, then type → submit → hooks → pace
//! for every fragment. The builder is the sole entry point for assembling a
//! run; once built, a sender's configuration is immutable.

use crate::config::{Config, SplitRule};
use crate::error::{CmsError, Result};
use crate::locator::ElementLocator;
use crate::message;
use crate::page::{ChatPage, ElementRef};
use once_cell::sync::Lazy;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Fixed suspension after typing, before the send control is probed, giving
/// the host UI time to react to the new content. A UI-lag concession, not a
/// correctness requirement.
pub const SETTLE_DELAY: Duration = Duration::from_millis(100);

/// Descriptor of one send attempt, passed to the hooks. Ephemeral; lives only
/// for the duration of the attempt.
#[derive(Debug)]
pub struct SendAttempt<'a> {
    pub fragment: &'a str,
    pub repeat_index: usize,
    pub fragment_index: usize,
}

/// Callback invoked around each individual send.
pub type SendHook = Box<dyn Fn(&SendAttempt) -> anyhow::Result<()> + Send + Sync>;

/// What happened to one fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// The send control resolved and was clicked.
    Sent,
    /// The fragment was typed but no send control could be resolved; the run
    /// moved on without retrying.
    SkippedNoControl,
}

/// Record of one attempt, accumulated into the [`RunSummary`].
#[derive(Debug, Clone)]
pub struct AttemptRecord {
    pub fragment: String,
    pub repeat_index: usize,
    pub fragment_index: usize,
    pub outcome: SendOutcome,
    pub before_hook_error: Option<String>,
    pub after_hook_error: Option<String>,
}

/// Result of a completed (or cancelled) run.
#[derive(Debug, Default)]
pub struct RunSummary {
    pub attempts: Vec<AttemptRecord>,
    pub cancelled: bool,
}

impl RunSummary {
    pub fn sent_count(&self) -> usize {
        self.attempts
            .iter()
            .filter(|a| a.outcome == SendOutcome::Sent)
            .count()
    }

    pub fn skipped_count(&self) -> usize {
        self.attempts
            .iter()
            .filter(|a| a.outcome == SendOutcome::SkippedNoControl)
            .count()
    }

    pub fn hook_error_count(&self) -> usize {
        self.attempts
            .iter()
            .map(|a| {
                usize::from(a.before_hook_error.is_some())
                    + usize::from(a.after_hook_error.is_some())
            })
            .sum()
    }
}

// One active run per resolved input element, process-wide. Two orchestrators
// interleaving typing and clicks against the same element would corrupt both
// runs.
static ACTIVE_TARGETS: Lazy<Mutex<HashSet<String>>> = Lazy::new(|| Mutex::new(HashSet::new()));

struct TargetGuard {
    element_id: String,
}

impl TargetGuard {
    fn acquire(element_id: &str) -> Result<Self> {
        let mut active = ACTIVE_TARGETS.lock().unwrap();
        if !active.insert(element_id.to_string()) {
            return Err(CmsError::target_busy(element_id));
        }
        Ok(Self {
            element_id: element_id.to_string(),
        })
    }
}

impl Drop for TargetGuard {
    fn drop(&mut self) {
        ACTIVE_TARGETS.lock().unwrap().remove(&self.element_id);
    }
}

/// Builder for [`MessageSender`].
pub struct MessageSenderBuilder {
    config: Config,
    message_box_locator: ElementLocator,
    send_button_locator: ElementLocator,
    before_send: Option<SendHook>,
    after_send: Option<SendHook>,
    cancel_token: CancellationToken,
}

impl MessageSenderBuilder {
    fn new(config: Config) -> Self {
        Self {
            config,
            message_box_locator: ElementLocator::message_box_defaults(),
            send_button_locator: ElementLocator::send_button_defaults(),
            before_send: None,
            after_send: None,
            cancel_token: CancellationToken::new(),
        }
    }

    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.config.message = message.into();
        self
    }

    pub fn interval(mut self, interval: Duration) -> Self {
        self.config.interval = interval;
        self
    }

    /// Pacing interval given in seconds; negative values clamp to zero.
    pub fn interval_seconds(mut self, seconds: f64) -> Self {
        self.config.interval = Duration::from_secs_f64(seconds.max(0.0));
        self
    }

    /// Number of times the full batch is resent; zero clamps to 1.
    pub fn repeat(mut self, count: u32) -> Self {
        self.config.repeat_count = count.max(1);
        self
    }

    pub fn show_index(mut self, show: bool) -> Self {
        self.config.show_index = show;
        self
    }

    pub fn split(mut self, rule: SplitRule) -> Self {
        self.config.split_rule = rule;
        self
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.config.verbose = verbose;
        self
    }

    pub fn before_send(
        mut self,
        hook: impl Fn(&SendAttempt) -> anyhow::Result<()> + Send + Sync + 'static,
    ) -> Self {
        self.before_send = Some(Box::new(hook));
        self
    }

    pub fn after_send(
        mut self,
        hook: impl Fn(&SendAttempt) -> anyhow::Result<()> + Send + Sync + 'static,
    ) -> Self {
        self.after_send = Some(Box::new(hook));
        self
    }

    pub fn message_box_locator(mut self, locator: ElementLocator) -> Self {
        self.message_box_locator = locator;
        self
    }

    pub fn send_button_locator(mut self, locator: ElementLocator) -> Self {
        self.send_button_locator = locator;
        self
    }

    /// Cooperative abort signal, checked before every attempt and while
    /// waiting out the pacing interval.
    pub fn cancel_token(mut self, token: CancellationToken) -> Self {
        self.cancel_token = token;
        self
    }

    /// Bind the host page and finish the builder.
    pub fn build(self, page: Arc<dyn ChatPage>) -> Result<MessageSender> {
        self.config.validate()?;
        Ok(MessageSender {
            config: self.config.normalized(),
            message_box_locator: self.message_box_locator,
            send_button_locator: self.send_button_locator,
            before_send: self.before_send,
            after_send: self.after_send,
            cancel_token: self.cancel_token,
            page,
        })
    }
}

/// Orchestrates one send run against a host page.
pub struct MessageSender {
    config: Config,
    message_box_locator: ElementLocator,
    send_button_locator: ElementLocator,
    before_send: Option<SendHook>,
    after_send: Option<SendHook>,
    cancel_token: CancellationToken,
    page: Arc<dyn ChatPage>,
}

impl MessageSender {
    pub fn builder() -> MessageSenderBuilder {
        MessageSenderBuilder::new(Config::default())
    }

    /// Seed a builder from a loaded [`Config`].
    pub fn from_config(config: Config) -> MessageSenderBuilder {
        MessageSenderBuilder::new(config)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Perform the run: resolve the input box, derive the batch once, then
    /// send every fragment `repeat_count` times with pacing in between.
    ///
    /// Returns the per-attempt outcome list. Fails fast when the input box
    /// cannot be resolved or another run already owns the same target; both
    /// cases perform zero sends and invoke no hooks.
    pub async fn send_now(&self) -> Result<RunSummary> {
        let input_box = match self.message_box_locator.find(self.page.as_ref()) {
            Some(element) => element,
            None => {
                warn!("message input box not found, aborting run");
                return Err(CmsError::input_box_not_found(self.message_box_locator.len()));
            }
        };
        let _guard = TargetGuard::acquire(&input_box.id)?;

        let batch = message::build_batch(
            &self.config.message,
            &self.config.split_rule,
            self.config.show_index,
        );
        if batch.is_empty() {
            debug!("split rule produced no fragments, nothing to send");
            return Ok(RunSummary::default());
        }

        let mut summary = RunSummary::default();
        let repeat_count = self.config.repeat_count as usize;

        'run: for repeat_index in 0..repeat_count {
            for (fragment_index, fragment) in batch.iter().enumerate() {
                if self.cancel_token.is_cancelled() {
                    info!("run cancelled, stopping before the next send");
                    summary.cancelled = true;
                    break 'run;
                }

                let attempt = SendAttempt {
                    fragment,
                    repeat_index,
                    fragment_index,
                };

                let before_hook_error =
                    self.invoke_hook(self.before_send.as_ref(), &attempt, "before-send");

                self.type_fragment(&input_box, fragment).await?;

                // The send control is re-resolved for every attempt; some
                // hosts only materialize it once the input box has content.
                let outcome = match self.send_button_locator.find(self.page.as_ref()) {
                    Some(button) => {
                        self.page.click(&button)?;
                        if self.config.verbose {
                            info!(
                                "✅ sent \"{}\" (repeat {}/{})",
                                fragment,
                                repeat_index + 1,
                                repeat_count
                            );
                        }
                        SendOutcome::Sent
                    }
                    None => {
                        debug!(
                            fragment_index,
                            "send control not found, fragment typed but not confirmed sent"
                        );
                        SendOutcome::SkippedNoControl
                    }
                };

                let after_hook_error =
                    self.invoke_hook(self.after_send.as_ref(), &attempt, "after-send");

                summary.attempts.push(AttemptRecord {
                    fragment: fragment.clone(),
                    repeat_index,
                    fragment_index,
                    outcome,
                    before_hook_error,
                    after_hook_error,
                });

                let is_last =
                    repeat_index == repeat_count - 1 && fragment_index == batch.len() - 1;
                if !is_last {
                    tokio::select! {
                        _ = self.cancel_token.cancelled() => {
                            info!("run cancelled while pacing");
                            summary.cancelled = true;
                            break 'run;
                        }
                        _ = sleep(self.config.interval) => {}
                    }
                }
            }
        }

        Ok(summary)
    }

    async fn type_fragment(&self, input_box: &ElementRef, fragment: &str) -> Result<()> {
        self.page.focus(input_box)?;
        self.page.insert_text(input_box, fragment)?;
        self.page.emit_change(input_box)?;
        // Part of the in-flight attempt, so not raced against cancellation.
        sleep(SETTLE_DELAY).await;
        Ok(())
    }

    fn invoke_hook(
        &self,
        hook: Option<&SendHook>,
        attempt: &SendAttempt<'_>,
        stage: &str,
    ) -> Option<String> {
        let hook = hook?;
        match hook(attempt) {
            Ok(()) => None,
            Err(err) => {
                error!(
                    stage,
                    repeat = attempt.repeat_index,
                    fragment = attempt.fragment_index,
                    "hook failed: {err:#}"
                );
                Some(err.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::InMemoryPage;
    use std::sync::atomic::{AtomicUsize, Ordering};

    // Unique composer ids per test: the single-flight registry is
    // process-wide and tests run in parallel.
    fn chat_page(composer_id: &str) -> Arc<InMemoryPage> {
        let page = Arc::new(InMemoryPage::new());
        page.add_element("[contenteditable='true']", format!("{composer_id}-search"));
        page.add_element("[contenteditable='true']", composer_id);
        page.add_element("[data-testid=\"send\"]", "send-button");
        page
    }

    #[test]
    fn test_builder_clamps_repeat_count() {
        let page = chat_page("builder-clamp");
        let sender = MessageSender::builder()
            .message("hi")
            .repeat(0)
            .build(page)
            .unwrap();
        assert_eq!(sender.config().repeat_count, 1);
    }

    #[test]
    fn test_builder_clamps_negative_interval_seconds() {
        let page = chat_page("builder-interval");
        let sender = MessageSender::builder()
            .message("hi")
            .interval_seconds(-3.0)
            .build(page)
            .unwrap();
        assert_eq!(sender.config().interval, Duration::ZERO);
    }

    #[test]
    fn test_builder_rejects_empty_delimiter() {
        let page = chat_page("builder-delimiter");
        let result = MessageSender::builder()
            .message("a;b")
            .split(SplitRule::Delimiter(String::new()))
            .build(page);
        assert!(matches!(result, Err(CmsError::ConfigValidation(_))));
    }

    #[tokio::test]
    async fn test_empty_batch_is_a_valid_zero_send_run() {
        let page = chat_page("empty-batch");
        let sender = MessageSender::builder()
            .message("\n\n")
            .split(SplitRule::Newline)
            .build(page.clone())
            .unwrap();

        let summary = sender.send_now().await.unwrap();
        assert!(summary.attempts.is_empty());
        assert!(!summary.cancelled);
        assert!(page.typed_texts().is_empty());
    }

    #[tokio::test]
    async fn test_missing_input_box_invokes_no_hooks() {
        let page = Arc::new(InMemoryPage::new());
        let hook_calls = Arc::new(AtomicUsize::new(0));

        let before_calls = hook_calls.clone();
        let after_calls = hook_calls.clone();
        let sender = MessageSender::builder()
            .message("hi")
            .before_send(move |_| {
                before_calls.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
            .after_send(move |_| {
                after_calls.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
            .build(page)
            .unwrap();

        let result = sender.send_now().await;
        assert!(matches!(result, Err(CmsError::InputBoxNotFound { .. })));
        assert_eq!(hook_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_pre_cancelled_run_sends_nothing() {
        let page = chat_page("pre-cancelled");
        let token = CancellationToken::new();
        token.cancel();

        let sender = MessageSender::builder()
            .message("hi")
            .cancel_token(token)
            .build(page.clone())
            .unwrap();

        let summary = sender.send_now().await.unwrap();
        assert!(summary.cancelled);
        assert!(summary.attempts.is_empty());
        assert!(page.typed_texts().is_empty());
    }
}
