//! CommentGuard Core
//!
//! Core types and error handling shared across CommentGuard components.
//!
//! This crate provides:
//! - The binary moderation [`Label`] and lexicon [`ConfidenceTier`]
//! - Pipeline [`Stage`] markers used in failure reports
//! - Error types and result handling

pub mod error;
pub mod types;

pub use error::{Error, Result};
pub use types::{ConfidenceTier, Label, Stage};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::types::{ConfidenceTier, Label, Stage};
}
