//! # Chat Message Sender
//!
//! A tool for automated, sequential submission of text into chat-style web
//! pages, with fallback element discovery and configurable pacing.
//!
//! ## Features
//!
//! - Locate the message input box and send control through ordered fallback
//!   discovery strategies
//! - Split one logical message into several fragments (newline or custom
//!   delimiter), optionally numbered
//! - Repeat the full batch a configurable number of times with a pacing
//!   interval between sends
//! - Before/after hooks around every individual send
//! - Per-attempt outcome reporting and cooperative cancellation
//! - JSON configuration file support
//!
//! ## Example
//!
//! ```no_run
//! use chat_message_sender::{InMemoryPage, MessageSender, SplitRule};
//! use std::sync::Arc;
//!
//! # async fn run() -> anyhow::Result<()> {
//! let page = Arc::new(InMemoryPage::new());
//! page.add_element("[contenteditable='true']", "search");
//! page.add_element("[contenteditable='true']", "composer");
//! page.add_element("[data-testid=\"send\"]", "send");
//!
//! let sender = MessageSender::builder()
//!     .message("first line\nsecond line")
//!     .split(SplitRule::Newline)
//!     .show_index(true)
//!     .repeat(2)
//!     .interval_seconds(1.5)
//!     .build(page)?;
//!
//! let summary = sender.send_now().await?;
//! println!("{} sent, {} skipped", summary.sent_count(), summary.skipped_count());
//! # Ok(())
//! # }
//! ```
//!
//! ## Configuration
//!
//! Configuration can be provided via JSON files:
//!
//! ```json
//! {
//!   "message": "status update",
//!   "interval": "2s",
//!   "repeat_count": 3,
//!   "show_index": true,
//!   "split_rule": "newline",
//!   "verbose": true
//! }
//! ```

pub mod config;
pub mod error;
pub mod locator;
pub mod message;
pub mod page;
pub mod sender;

pub use config::{Config, SplitRule};
pub use error::{CmsError, Result};
pub use locator::{ElementLocator, LocatorStrategy};
pub use page::{ChatPage, ElementRef, InMemoryPage};
pub use sender::{
    AttemptRecord, MessageSender, MessageSenderBuilder, RunSummary, SendAttempt, SendOutcome,
};
