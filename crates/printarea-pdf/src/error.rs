//! Error types for PDF generation

use thiserror::Error;

use printarea_core::BackendError;

/// Result type for PDF operations
pub type Result<T> = std::result::Result<T, PdfError>;

/// Errors that can occur during PDF generation
#[derive(Error, Debug)]
pub enum PdfError {
    /// Typst compilation error
    #[error("Typst compilation failed: {0}")]
    Compilation(String),

    /// Font loading error
    #[error("Font error: {0}")]
    Font(String),

    /// Asset root is missing or not a directory
    #[error("Asset root not found: {0}")]
    AssetRoot(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<PdfError> for BackendError {
    fn from(err: PdfError) -> Self {
        match err {
            PdfError::Font(_) | PdfError::AssetRoot(_) => BackendError::Unavailable(err.to_string()),
            PdfError::Io(io) => BackendError::Io(io),
            PdfError::Compilation(_) => BackendError::RenderFailed(err.to_string()),
        }
    }
}
