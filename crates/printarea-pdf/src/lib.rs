//! printarea-pdf - Tagged PDF backend via Typst
//!
//! This crate renders assembled printarea documents to PDF using Typst as
//! the typesetting backend.
//!
//! # Architecture
//!
//! The PDF backend consists of two stages:
//!
//! 1. **Transpiler** - Converts an `AssembledDocument` to Typst markup
//! 2. **Compiler** - Compiles Typst markup to tagged PDF bytes
//!
//! # Example
//!
//! ```ignore
//! use printarea_core::{Pipeline, RenderRequest, Settings};
//! use printarea_pdf::TypstBackend;
//!
//! let settings = Settings::default();
//! let backend = TypstBackend::new(&settings.pdf);
//! let pipeline = Pipeline::new(settings, Box::new(backend));
//! let outcome = pipeline.run(&RenderRequest::new("1", "Report", "<h1>Q3</h1>"))?;
//! ```

mod compiler;
mod error;
mod transpiler;

pub use compiler::{CompileOptions, Compiler};
pub use error::{PdfError, Result};
pub use transpiler::Transpiler;

use printarea_core::config::PdfSettings;
use printarea_core::{AssembledDocument, BackendResult, RenderBackend};

/// Render backend producing tagged PDF through Typst
#[derive(Debug, Clone, Default)]
pub struct TypstBackend {
    transpiler: Transpiler,
    options: CompileOptions,
}

impl TypstBackend {
    /// Create a backend from PDF settings
    pub fn new(settings: &PdfSettings) -> Self {
        let transpiler = match &settings.asset_root {
            Some(root) => Transpiler::new().with_asset_root(root.clone()),
            None => Transpiler::new(),
        };
        Self {
            transpiler,
            options: CompileOptions {
                font_paths: settings.fonts.clone(),
                asset_root: settings.asset_root.clone(),
                tagged: settings.tagged,
            },
        }
    }

    /// Typst markup for a document, without compiling it
    pub fn markup(&self, document: &AssembledDocument) -> String {
        self.transpiler.transpile(document)
    }
}

impl RenderBackend for TypstBackend {
    fn name(&self) -> &'static str {
        "typst-pdf"
    }

    fn media_type(&self) -> &'static str {
        "application/pdf"
    }

    fn extension(&self) -> &'static str {
        "pdf"
    }

    fn render(&self, document: &AssembledDocument) -> BackendResult<Vec<u8>> {
        let markup = self.markup(document);
        log::debug!("Compiling {} bytes of Typst markup", markup.len());
        Ok(Compiler::compile_with_options(&markup, &self.options)?)
    }
}

/// Convenience function to render an assembled document to PDF
pub fn render_pdf(document: &AssembledDocument, settings: &PdfSettings) -> Result<Vec<u8>> {
    let backend = TypstBackend::new(settings);
    Compiler::compile_with_options(&backend.markup(document), &backend.options)
}
