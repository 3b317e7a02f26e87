//! Error types for the print pipeline

use thiserror::Error;

use crate::request::RequestState;

/// Result type for pipeline operations
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Fatal pipeline errors
///
/// Parse failures and empty regions are not errors: they degrade and are
/// reported as diagnostics.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// The render backend failed
    #[error(transparent)]
    Render(#[from] crate::backend::BackendError),

    /// A tree mutation failed
    #[error("Document structure error: {0}")]
    Dom(#[from] printarea_dom::DomError),

    /// The request moved through its states out of order
    #[error("Invalid request transition: {from:?} -> {to:?}")]
    InvalidTransition { from: RequestState, to: RequestState },
}

/// Errors from loading configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The config file could not be read
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The config file is not valid TOML for [`crate::Settings`]
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}
