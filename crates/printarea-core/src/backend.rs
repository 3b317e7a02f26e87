//! Render backend trait
//!
//! A backend turns an [`AssembledDocument`] into output bytes. The HTML
//! backend lives here; the tagged PDF backend is provided by
//! `printarea-pdf`.

use crate::assemble::AssembledDocument;

/// Errors raised by render backends
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// The backend could not be initialised (fonts, resources)
    #[error("Backend unavailable: {0}")]
    Unavailable(String),

    /// Rendering failed
    #[error("Rendering failed: {0}")]
    RenderFailed(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for backend operations
pub type BackendResult<T> = std::result::Result<T, BackendError>;

/// Produces output bytes from an assembled document
pub trait RenderBackend: Send + Sync {
    /// Backend name for logs
    fn name(&self) -> &'static str;

    /// MIME type of the output
    fn media_type(&self) -> &'static str;

    /// File extension of the output, without the dot
    fn extension(&self) -> &'static str;

    /// Render the document
    fn render(&self, document: &AssembledDocument) -> BackendResult<Vec<u8>>;
}

/// Emits the assembled page as UTF-8 HTML
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlBackend;

impl RenderBackend for HtmlBackend {
    fn name(&self) -> &'static str {
        "html"
    }

    fn media_type(&self) -> &'static str {
        "text/html; charset=utf-8"
    }

    fn extension(&self) -> &'static str {
        "html"
    }

    fn render(&self, document: &AssembledDocument) -> BackendResult<Vec<u8>> {
        Ok(document.to_html().into_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assemble::Assembler;
    use printarea_dom::load_fragment;

    #[test]
    fn test_html_backend_output() {
        let doc = load_fragment("<p>body</p>").document;
        let assembled = Assembler::default().assemble(doc, "T").unwrap();
        let bytes = HtmlBackend.render(&assembled).unwrap();
        let html = String::from_utf8(bytes).unwrap();
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<p>body</p>"));
        assert_eq!(HtmlBackend.extension(), "html");
    }

    #[test]
    fn test_backend_is_object_safe() {
        let backends: Vec<Box<dyn RenderBackend>> = vec![Box::new(HtmlBackend)];
        assert_eq!(backends[0].name(), "html");
    }
}
