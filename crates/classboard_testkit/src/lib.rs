//! # classboard testkit
//!
//! Shared fixtures and proptest generators for classboard tests.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod fixtures;
mod generators;

pub use fixtures::{
    sample_document, sample_document_at, score_on, student_with_roll, tiny_document,
};
pub use generators::{
    roll_strategy, score_strategy, student_strategy, timestamp_strategy,
};
