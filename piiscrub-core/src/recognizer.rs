// piiscrub-core/src/recognizer.rs
//! Defines the core `Recognizer` trait.
//!
//! A recognizer finds one or more entity types in text. The analyzer holds a
//! registry of them (compiled pattern rules, the person name heuristic, and any
//! caller-supplied implementations) and merges their results.
//!
//! License: MIT OR APACHE 2.0

use std::fmt;

use crate::config::DEFAULT_LANGUAGE;
use crate::recognizer_result::RecognizerResult;

/// A trait that defines the contract every entity recognizer adheres to.
///
/// Implementations must be thread-safe so that one analyzer can be shared
/// across worker threads.
pub trait Recognizer: Send + Sync + fmt::Debug {
    /// Stable name, reported in each result's `recognizer_name`.
    fn name(&self) -> &str;

    /// Entity types this recognizer can emit.
    fn supported_entities(&self) -> Vec<String>;

    /// Language of the text this recognizer understands.
    fn supported_language(&self) -> &str {
        DEFAULT_LANGUAGE
    }

    /// Finds entities in `text`.
    ///
    /// # Arguments
    /// * `text` - The input string to scan.
    /// * `entities` - The entity types requested by the caller. Results for
    ///   other types must not be returned.
    fn analyze(&self, text: &str, entities: &[String]) -> Vec<RecognizerResult>;

    /// Whether any of `entities` is produced by this recognizer.
    fn wants_any(&self, entities: &[String]) -> bool {
        self.supported_entities().iter().any(|e| entities.contains(e))
    }
}
