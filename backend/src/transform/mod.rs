//! ETL transformation module.
//!
//! This module turns the two raw CSV inputs into the cleaned wide table:
//! - Merge: inner join of messages and categories on `id`
//! - Categories: `name-digit;...` strings to binary label columns
//! - Clean: label normalization and duplicate removal
//! - Pipeline: load, clean, validate and store in one run

pub mod categories;
pub mod clean;
pub mod merge;
pub mod pipeline;

pub use categories::{expand_categories, parse_cell, ExpandedLabels};
pub use clean::{clean, CleanStats};
pub use merge::{merge_on_id, MergedRow};
pub use pipeline::*;
