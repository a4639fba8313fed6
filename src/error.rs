//! Error taxonomy shared by the service and RPC layers.
//!
//! `InvalidData` is recoverable by the caller (fix the input and retry),
//! `Security` and `NotAuthenticated` are permission faults, and `Internal`
//! wraps anything unexpected with the cause preserved.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Message keys understood by clients when rendering validation errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageKey {
    Required,
    Invalid,
    Failure,
    Null,
}

/// A single field-level message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalizableMessage {
    pub key: MessageKey,
    pub context: Option<String>,
    pub text: String,
}

impl LocalizableMessage {
    pub fn new(key: MessageKey, context: Option<&str>, text: impl Into<String>) -> Self {
        Self {
            key,
            context: context.map(str::to_string),
            text: text.into(),
        }
    }
}

/// Summary plus field-level details for a failed validation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationErrors {
    pub summary: LocalizableMessage,
    pub messages: Vec<LocalizableMessage>,
}

impl ValidationErrors {
    pub fn new(key: MessageKey, text: impl Into<String>) -> Self {
        Self {
            summary: LocalizableMessage::new(key, None, text),
            messages: Vec::new(),
        }
    }

    pub fn add(&mut self, key: MessageKey, context: &str, text: impl Into<String>) {
        self.messages.push(LocalizableMessage::new(key, Some(context), text));
    }

    pub fn add_global(&mut self, key: MessageKey, text: impl Into<String>) {
        self.messages.push(LocalizableMessage::new(key, None, text));
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn has_field(&self, context: &str) -> bool {
        self.messages
            .iter()
            .any(|message| message.context.as_deref() == Some(context))
    }

    /// Ok when nothing was recorded, otherwise an `InvalidDataError` carrying these details
    pub fn into_result(self, message: &str) -> Result<(), InvalidDataError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(InvalidDataError::with_details(message, self))
        }
    }
}

/// Validation or business-rule failure
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{message}")]
pub struct InvalidDataError {
    pub message: String,
    pub details: ValidationErrors,
}

impl InvalidDataError {
    pub fn with_details(message: &str, details: ValidationErrors) -> Self {
        Self {
            message: message.to_string(),
            details,
        }
    }

    /// Single-message failure, e.g. when generation gives up
    pub fn single(key: MessageKey, context: &str, text: &str) -> Self {
        let mut details = ValidationErrors::new(key, text);
        details.add(key, context, text);
        Self::with_details(text, details)
    }
}

/// Errors surfaced by every RPC operation
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Invalid data: {0}")]
    InvalidData(#[from] InvalidDataError),

    #[error("Security violation: {0}")]
    Security(String),

    #[error("Not authenticated")]
    NotAuthenticated,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("{message}")]
    Internal {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl ServiceError {
    pub fn internal(message: impl Into<String>) -> Self {
        ServiceError::Internal {
            message: message.into(),
            source: None,
        }
    }

    /// Wrap an unexpected failure as `"<context>: <cause>"`, keeping the cause
    pub fn wrap<E>(context: &str, error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        ServiceError::Internal {
            message: format!("{}: {}", context, error),
            source: Some(Box::new(error)),
        }
    }

    /// Errors the RPC layer passes through untouched instead of wrapping
    pub fn is_passthrough(&self) -> bool {
        matches!(
            self,
            ServiceError::InvalidData(_)
                | ServiceError::Security(_)
                | ServiceError::NotAuthenticated
                | ServiceError::NotFound(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_empty_validation_is_ok() {
        let details = ValidationErrors::new(MessageKey::Invalid, "Exchange is invalid");
        assert!(details.into_result("Exchange is invalid").is_ok());
    }

    #[test]
    fn test_validation_collects_messages() {
        let mut details = ValidationErrors::new(MessageKey::Invalid, "Exchange is invalid");
        details.add(MessageKey::Required, "name", "Exchange name is required");
        assert!(details.has_field("name"));

        let error = details.into_result("Exchange is invalid").unwrap_err();
        assert_eq!(error.to_string(), "Exchange is invalid");
        assert_eq!(error.details.messages.len(), 1);
        assert_eq!(error.details.messages[0].key, MessageKey::Required);
    }

    #[test]
    fn test_wrap_preserves_cause() {
        let cause = std::io::Error::new(std::io::ErrorKind::Other, "disk on fire");
        let error = ServiceError::wrap("Error saving exchange", cause);
        assert_eq!(error.to_string(), "Error saving exchange: disk on fire");
        assert!(error.source().is_some());
        assert!(!error.is_passthrough());
    }

    #[test]
    fn test_passthrough_kinds() {
        assert!(ServiceError::Security("nope".to_string()).is_passthrough());
        assert!(ServiceError::NotAuthenticated.is_passthrough());
        let invalid = InvalidDataError::single(MessageKey::Failure, "x", "failed");
        assert!(ServiceError::from(invalid).is_passthrough());
    }
}
