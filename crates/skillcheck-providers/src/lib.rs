//! skillcheck-providers — question, explanation and recommendation backends.
//!
//! Implements the collaborator traits from `skillcheck-core` for the bundled
//! offline bank and the Hugging Face inference API, and builds the set a
//! session needs from `skillcheck.toml`.

pub mod config;
pub mod error;
pub mod huggingface;
pub mod mock;
pub mod offline;

pub use config::{
    create_collaborators, load_config_from, ProviderConfig, RecommendationStrategy,
    SkillcheckConfig,
};
pub use error::ProviderError;
