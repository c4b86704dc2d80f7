// piiscrub-context/src/lib.rs
//! Context-word detection for PII recognizers.
//!
//! A recognizer match is more trustworthy when words such as "phone" or
//! "ssn" sit next to it. This crate finds those words around a span and
//! turns their presence into a score boost.
#![cfg_attr(not(test), no_std)]

extern crate alloc;

#[cfg(feature = "std")]
extern crate std;

pub mod context;
pub mod scoring;

pub use context::ContextScanner;
pub use scoring::{enhance_score, ContextWeights};

/// Confidence attached to a detection, in `[0.0, 1.0]`.
pub type Score = f64;
