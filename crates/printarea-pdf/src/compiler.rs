//! Typst to PDF compiler
//!
//! Compiles Typst markup to tagged PDF bytes using typst-as-lib.

use std::path::{Path, PathBuf};

use typst_as_lib::typst_kit_options::TypstKitFontOptions;
use typst_as_lib::TypstEngine;

use crate::error::{PdfError, Result};

/// Compilation options
#[derive(Debug, Clone)]
pub struct CompileOptions {
    /// Font files to load; when empty, embedded and system fonts are used
    pub font_paths: Vec<PathBuf>,
    /// Directory `#image` paths resolve against
    pub asset_root: Option<PathBuf>,
    /// Emit a tagged (structure tree) PDF
    pub tagged: bool,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            font_paths: Vec::new(),
            asset_root: None,
            tagged: true,
        }
    }
}

/// Compiler for converting Typst markup to PDF
pub struct Compiler;

impl Compiler {
    /// Compile Typst markup to PDF bytes
    pub fn compile(markup: &str) -> Result<Vec<u8>> {
        Self::compile_with_options(markup, &CompileOptions::default())
    }

    /// Compile with custom fonts
    pub fn compile_with_fonts(markup: &str, font_paths: &[&Path]) -> Result<Vec<u8>> {
        let options = CompileOptions {
            font_paths: font_paths.iter().map(|path| path.to_path_buf()).collect(),
            ..CompileOptions::default()
        };
        Self::compile_with_options(markup, &options)
    }

    /// Compile with fonts, an asset root and tagging control
    pub fn compile_with_options(markup: &str, options: &CompileOptions) -> Result<Vec<u8>> {
        let mut builder = TypstEngine::builder().main_file(markup.to_string());

        let mut fonts = Vec::with_capacity(options.font_paths.len());
        for font_path in &options.font_paths {
            let font_bytes = std::fs::read(font_path).map_err(|e| {
                PdfError::Font(format!("Failed to read font {}: {}", font_path.display(), e))
            })?;
            fonts.push(font_bytes);
        }
        if fonts.is_empty() {
            builder = builder.search_fonts_with(TypstKitFontOptions::default());
        } else {
            builder = builder.fonts(fonts);
        }

        if let Some(root) = &options.asset_root {
            if !root.is_dir() {
                return Err(PdfError::AssetRoot(root.display().to_string()));
            }
            builder = builder.with_file_system_resolver(root.clone());
        }

        let engine = builder.build();

        // compiled is Warned<Result<Document, Error>>
        let compiled = engine.compile();
        for warning in &compiled.warnings {
            log::warn!("Typst warning: {}", warning.message);
        }
        let document = compiled
            .output
            .map_err(|e| PdfError::Compilation(format!("{:?}", e)))?;

        let pdf_options = typst_pdf::PdfOptions {
            tagged: options.tagged,
            ..typst_pdf::PdfOptions::default()
        };
        let pdf_bytes = typst_pdf::pdf(&document, &pdf_options)
            .map_err(|e| PdfError::Compilation(format!("PDF generation failed: {:?}", e)))?;

        Ok(pdf_bytes.into())
    }
}
