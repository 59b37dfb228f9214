//! Error types for butterfly-profile
//!
//! Setup failures only. Bad tag data never produces an error; it is recovered inside
//! the parsers and reported to the diagnostics sink.

use crate::config::ConfigError;
use crate::custom::{ModelLoadError, ModelValidationError};
use crate::ev::EvError;
use crate::parsers::PipelineError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    EncodedValue(#[from] EvError),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error(transparent)]
    ModelValidation(#[from] ModelValidationError),

    #[error(transparent)]
    ModelLoad(#[from] ModelLoadError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A compiled model used with flags from a different registry layout
    #[error("custom model was compiled for another registry layout")]
    IncompatibleModel,
}

/// Convenience result type for butterfly-profile operations
pub type Result<T> = std::result::Result<T, Error>;
