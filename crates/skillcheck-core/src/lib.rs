//! skillcheck-core — Quiz progression engine, collaborator traits, and scoring.
//!
//! This crate defines the question model, the batch-paginated session state
//! machine, and the seams (question source, explanation and recommendation
//! providers) that the rest of skillcheck plugs into.

pub mod clock;
pub mod driver;
pub mod engine;
pub mod error;
pub mod model;
pub mod parser;
pub mod report;
pub mod scoring;
pub mod traits;
