//! Custom error types for chat-message-sender.
//!
//! This module provides structured error types using `thiserror` for better
//! error handling and more informative error messages.

use std::io;
use thiserror::Error;

/// Main error type for chat-message-sender operations.
#[derive(Error, Debug)]
pub enum CmsError {
    /// The message input box could not be resolved by any discovery strategy.
    #[error("input box not found after trying {strategies} discovery strategies")]
    InputBoxNotFound { strategies: usize },

    /// Another run is already active against the same input element.
    #[error("target '{element_id}' already has an active send run")]
    TargetBusy { element_id: String },

    /// Configuration validation error.
    #[error("configuration error: {0}")]
    ConfigValidation(String),

    /// Error reading or parsing configuration file.
    #[error("failed to load config from '{path}': {reason}")]
    ConfigLoad { path: String, reason: String },

    /// Error writing configuration file.
    #[error("failed to save config to '{path}': {reason}")]
    ConfigSave { path: String, reason: String },

    /// Error parsing duration string.
    #[error("invalid duration '{value}': {reason}")]
    InvalidDuration { value: String, reason: String },

    /// A page-level interaction (focus, insert, change, click) failed.
    #[error("page error: {0}")]
    Page(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for chat-message-sender operations.
pub type Result<T> = std::result::Result<T, CmsError>;

impl CmsError {
    /// Create a new InputBoxNotFound error.
    pub fn input_box_not_found(strategies: usize) -> Self {
        Self::InputBoxNotFound { strategies }
    }

    /// Create a new TargetBusy error.
    pub fn target_busy(element_id: impl Into<String>) -> Self {
        Self::TargetBusy {
            element_id: element_id.into(),
        }
    }

    /// Create a new ConfigValidation error.
    pub fn config_validation(message: impl Into<String>) -> Self {
        Self::ConfigValidation(message.into())
    }

    /// Create a new ConfigLoad error.
    pub fn config_load(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ConfigLoad {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a new ConfigSave error.
    pub fn config_save(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ConfigSave {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a new InvalidDuration error.
    pub fn invalid_duration(value: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidDuration {
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Create a new Page error.
    pub fn page(message: impl Into<String>) -> Self {
        Self::Page(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CmsError::input_box_not_found(2);
        assert_eq!(
            err.to_string(),
            "input box not found after trying 2 discovery strategies"
        );

        let err = CmsError::target_busy("main-input");
        assert_eq!(
            err.to_string(),
            "target 'main-input' already has an active send run"
        );

        let err = CmsError::config_validation("split delimiter cannot be empty");
        assert_eq!(
            err.to_string(),
            "configuration error: split delimiter cannot be empty"
        );
    }

    #[test]
    fn test_error_from_io() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let cms_err: CmsError = io_err.into();
        assert!(matches!(cms_err, CmsError::Io(_)));
    }
}
