//! printarea-core - Accessible print pipeline
//!
//! Turns the printable region of a rendered web page into a structured,
//! accessible document: headings form a strict outline, images carry
//! descriptions, links carry labels and tables carry captions and scoped
//! header cells. The output is handed to a [`RenderBackend`].
//!
//! # Example
//!
//! ```
//! use printarea_core::{HtmlBackend, Pipeline, RenderRequest, Settings};
//!
//! let pipeline = Pipeline::new(Settings::default(), Box::new(HtmlBackend));
//! let request = RenderRequest::new("post-7", "Quarterly Report", "<h1>Q3</h1><h3>Revenue</h3>");
//! let outcome = pipeline.run(&request).unwrap();
//!
//! assert_eq!(outcome.document.filename, "quarterly-report.html");
//! assert_eq!(outcome.report.headings_inserted, 1);
//! ```

pub mod annotate;
pub mod assemble;
pub mod backend;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod headings;
pub mod pipeline;
pub mod region;
pub mod request;
pub mod sanitize;

pub use annotate::{AnnotationReport, Annotator};
pub use assemble::{AssembledDocument, Assembler, ImageAlt, LinkAnnotation, OutlineEntry};
pub use backend::{BackendError, BackendResult, HtmlBackend, RenderBackend};
pub use config::{BackendKind, Settings};
pub use diagnostics::{Diagnostic, Severity};
pub use error::{ConfigError, PipelineError, Result};
pub use pipeline::{error_page, Pipeline, PipelineReport, PreparedDocument, RenderOutcome};
pub use region::{extract_region, Region, RegionSelector};
pub use request::{Disposition, RenderRequest, RenderedDocument, RequestState, RequestTracker};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
