//! Error types for vault operations.
//!
//! A "not found" answer from the vault CLI is not an error: reads return
//! `Ok(None)` and deletes return `Ok(())`. Everything else surfaces as an
//! [`OpError`] and is propagated unchanged to the caller.

use std::path::PathBuf;

use thiserror::Error;

use crate::category::Category;

pub type Result<T> = std::result::Result<T, OpError>;

/// A nonzero exit from the vault CLI.
///
/// `command` is the rendered argument vector with secret values replaced,
/// so it is safe to log or display.
#[derive(Debug, Clone, Error)]
#[error("`{command}` failed (exit code {}): {}", exit_code_label(.exit_code), .output.trim())]
pub struct CommandFailure {
    pub exit_code: Option<i32>,
    pub output: String,
    pub command: String,
}

fn exit_code_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => code.to_string(),
        None => "none, terminated by signal".to_string(),
    }
}

impl CommandFailure {
    /// Whether the CLI reported that the requested resource does not exist.
    ///
    /// Two CLI generations word this differently; both are recognised.
    pub fn is_not_found(&self) -> bool {
        is_not_found(self.exit_code, &self.output)
    }
}

/// Classify an exit code and combined output as a "not found" answer.
pub fn is_not_found(exit_code: Option<i32>, output: &str) -> bool {
    match exit_code {
        Some(1) => output.contains("isn't an item in"),
        Some(4) => output.contains("resource was not found"),
        _ => false,
    }
}

#[derive(Debug, Error)]
pub enum OpError {
    #[error("failed to execute `{binary}`: {source}. Is the 1Password CLI installed?")]
    Spawn {
        binary: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to exchange data with `{binary}`: {source}")]
    Pipe {
        binary: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Command(#[from] CommandFailure),

    #[error("unknown template id {0}")]
    UnknownTemplate(String),

    #[error("item is not from {expected} (found {actual})")]
    WrongCategory { expected: Category, actual: Category },

    #[error("failed to decode {what}: {source}")]
    Json {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("field `{field}` expects {expected}, found {found}")]
    ShapeMismatch {
        field: String,
        expected: &'static str,
        found: String,
    },

    #[error("invalid base64 content: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("document item {0} carries no document attributes")]
    MissingDocumentAttributes(String),

    #[error("invalid document source: {0}")]
    InvalidDocumentSource(&'static str),

    #[error("item {0} could not be read back after it was created")]
    Vanished(String),

    #[error("invalid sex '{0}': expected 'male' or 'female'")]
    InvalidSex(String),

    #[error("invalid email address: {0}")]
    InvalidEmail(String),

    #[error("failed to read {}: {source}", .path.display())]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl OpError {
    pub(crate) fn json(what: &'static str) -> impl FnOnce(serde_json::Error) -> OpError {
        move |source| OpError::Json { what, source }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_item_exit_one() {
        assert!(is_not_found(
            Some(1),
            "[ERROR] 2021/03/01 \"abc\" isn't an item in the \"Private\" vault."
        ));
    }

    #[test]
    fn test_missing_resource_exit_four() {
        assert!(is_not_found(
            Some(4),
            "[ERROR] The requested resource was not found."
        ));
    }

    #[test]
    fn test_phrases_require_matching_exit_code() {
        assert!(!is_not_found(Some(4), "isn't an item in the vault"));
        assert!(!is_not_found(Some(1), "resource was not found"));
        assert!(!is_not_found(None, "isn't an item in the vault"));
    }

    #[test]
    fn test_other_failures_are_hard() {
        assert!(!is_not_found(Some(1), "You are not currently signed in."));
        assert!(!is_not_found(Some(2), ""));
    }

    #[test]
    fn test_failure_display_includes_command_and_output() {
        let failure = CommandFailure {
            exit_code: Some(1),
            output: "not signed in\n".to_string(),
            command: "op get item abc".to_string(),
        };
        assert_eq!(
            failure.to_string(),
            "`op get item abc` failed (exit code 1): not signed in"
        );
        assert!(!failure.is_not_found());
    }
}
