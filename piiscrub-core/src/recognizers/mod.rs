//! Entity recognizers for piiscrub.
//!
//! `compiler` turns configured rules into compiled matchers, `pattern` runs them,
//! and `person` holds the rule-based name recognizer. New recognizers implement
//! the `Recognizer` trait and are registered on the analyzer.

pub mod compiler;
pub mod pattern;
pub mod person;

pub use pattern::PatternRecognizer;
pub use person::PersonRecognizer;
