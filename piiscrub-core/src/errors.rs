//! errors.rs - Custom error types for the piiscrub-core library.
//!
//! This module defines a structured error enum for the library, providing
//! specific, actionable error types that can be handled programmatically.
//!
//! License: MIT OR APACHE 2.0

use thiserror::Error;

/// This enum represents all possible error types in the `piiscrub-core` library.
///
/// `#[non_exhaustive]` leaves room for new variants without breaking
/// downstream matches.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ScrubError {
    #[error("Failed to compile recognizer '{0}': {1}")]
    RuleCompilationError(String, regex::Error),

    #[error("Recognizer '{0}': pattern length ({1}) exceeds maximum allowed ({2})")]
    PatternLengthExceeded(String, usize, usize),

    #[error("Failed to build context scanner for recognizer '{0}': {1}")]
    ContextScannerError(String, String),

    #[error("Language '{0}' is not supported (supported: {1})")]
    UnsupportedLanguage(String, String),

    #[error("No recognizer supports entity '{0}'")]
    UnknownEntity(String),

    #[error("Span {start}..{end} is not a valid range of the input text (length {len})")]
    InvalidSpan { start: usize, end: usize, len: usize },

    #[error("Invalid operator for entity '{0}': {1}")]
    InvalidOperator(String, String),

    #[error("Failed to render placeholder template: {0}")]
    PlaceholderTemplate(String),

    #[error("Mapping store error: {0}")]
    MappingStore(String),

    #[error("Environment variable '{0}' is not set")]
    MissingApiKey(String),

    #[error("Suggestion request failed: {0}")]
    SuggestRequest(String),

    #[error("Suggestion response could not be parsed: {0}")]
    SuggestParse(String),

    #[error("Failed to serialize data: {0}")]
    SerializationError(String),

    #[error("An unexpected I/O error occurred: {0}")]
    IoError(#[from] std::io::Error),

    #[error("A critical system error occurred: {0}")]
    AnyhowWrapper(#[from] anyhow::Error),

    #[error("A fatal error occurred: {0}")]
    Fatal(String),
}
