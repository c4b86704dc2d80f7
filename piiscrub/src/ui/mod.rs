// piiscrub/src/ui/mod.rs
//! Terminal output: themes, messages, diffs and summary tables.

pub mod diff_viewer;
pub mod output_format;
pub mod summary;
pub mod theme;
