//! Request pipeline
//!
//! Runs one [`RenderRequest`] through region extraction, loading,
//! sanitization, heading repair, accessibility annotation and assembly, then
//! hands the result to a [`RenderBackend`]. The pipeline is an explicitly
//! constructed value; nothing is shared between requests.

use printarea_dom::serialize::escape_text;
use printarea_dom::{load_fragment, Document, LoadOutcome};

use crate::annotate::{AnnotationReport, Annotator};
use crate::assemble::{AssembledDocument, Assembler};
use crate::backend::RenderBackend;
use crate::config::Settings;
use crate::diagnostics::{Diagnostic, EMPTY_CONTENT, EMPTY_REGION, PARSE_FAILURE};
use crate::error::{PipelineError, Result};
use crate::headings::{check_hierarchy, normalize_headings};
use crate::region::{extract_region, MatchKind, Region};
use crate::request::{RenderRequest, RenderedDocument, RequestState, RequestTracker};
use crate::sanitize::{sanitize, SanitizeReport};

/// How the region selector matched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegionMatch {
    /// Number of top-level matching elements
    pub count: usize,
    /// Whether they matched by class or id
    pub matched_by: MatchKind,
}

/// Everything the pipeline did to a request
#[derive(Debug, Clone, Default)]
pub struct PipelineReport {
    /// Degradations and structural findings
    pub diagnostics: Vec<Diagnostic>,
    /// Region match, when a selector was applied and matched
    pub region: Option<RegionMatch>,
    /// Sanitization counts
    pub sanitize: SanitizeReport,
    /// Empty headings inserted to close level gaps
    pub headings_inserted: usize,
    /// Accessibility annotation counts
    pub annotation: AnnotationReport,
    /// States visited by the request
    pub states: Vec<RequestState>,
}

impl PipelineReport {
    /// Whether any diagnostic carries `code`
    pub fn has_diagnostic(&self, code: &str) -> bool {
        self.diagnostics.iter().any(|d| d.has_code(code))
    }
}

/// An assembled document that has not been rendered yet
#[derive(Debug, Clone)]
pub struct PreparedDocument {
    /// The assembled document
    pub assembled: AssembledDocument,
    /// What the pipeline did so far
    pub report: PipelineReport,
}

/// A rendered request
#[derive(Debug, Clone)]
pub struct RenderOutcome {
    /// Output bytes and delivery metadata
    pub document: RenderedDocument,
    /// What the pipeline did
    pub report: PipelineReport,
}

/// The print pipeline
pub struct Pipeline {
    settings: Settings,
    annotator: Annotator,
    assembler: Assembler,
    backend: Box<dyn RenderBackend>,
}

impl Pipeline {
    /// Create a pipeline rendering through `backend`
    pub fn new(settings: Settings, backend: Box<dyn RenderBackend>) -> Self {
        let assembler = Assembler::new(&settings.document);
        Self {
            settings,
            annotator: Annotator::new(),
            assembler,
            backend,
        }
    }

    /// Active settings
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// The render backend
    pub fn backend(&self) -> &dyn RenderBackend {
        self.backend.as_ref()
    }

    /// Run a request to completion
    pub fn run(&self, request: &RenderRequest) -> Result<RenderOutcome> {
        let mut tracker = RequestTracker::new();
        self.run_tracked(request, &mut tracker)
    }

    /// Run a request, recording its states in `tracker`
    ///
    /// Any error leaves the tracker in [`RequestState::Failed`].
    pub fn run_tracked(
        &self,
        request: &RenderRequest,
        tracker: &mut RequestTracker,
    ) -> Result<RenderOutcome> {
        let PreparedDocument {
            assembled,
            mut report,
        } = self.prepare(request, tracker)?;

        log::debug!(
            "Rendering '{}' with the {} backend",
            assembled.title,
            self.backend.name()
        );
        let bytes = match self.backend.render(&assembled) {
            Ok(bytes) => bytes,
            Err(err) => {
                log::error!("Rendering '{}' failed: {}", request.source_id, err);
                tracker.fail();
                return Err(PipelineError::Render(err));
            }
        };
        tracker.advance(RequestState::Rendered)?;
        report.states = tracker.history().to_vec();

        let document = RenderedDocument {
            bytes,
            media_type: self.backend.media_type(),
            filename: request.filename(
                &self.settings.document.default_title,
                self.backend.extension(),
            ),
            disposition: request.disposition,
        };
        log::info!(
            "Rendered {} ({} bytes, {})",
            document.filename,
            document.bytes.len(),
            document.disposition.as_header_token()
        );
        Ok(RenderOutcome { document, report })
    }

    /// Run every stage up to and including assembly
    pub fn prepare(
        &self,
        request: &RenderRequest,
        tracker: &mut RequestTracker,
    ) -> Result<PreparedDocument> {
        let mut report = PipelineReport::default();
        match self.stages(request, tracker, &mut report) {
            Ok(assembled) => {
                report.states = tracker.history().to_vec();
                Ok(PreparedDocument { assembled, report })
            }
            Err(err) => {
                log::error!("Preparing '{}' failed: {}", request.source_id, err);
                tracker.fail();
                Err(err)
            }
        }
    }

    fn stages(
        &self,
        request: &RenderRequest,
        tracker: &mut RequestTracker,
        report: &mut PipelineReport,
    ) -> Result<AssembledDocument> {
        tracker.advance(RequestState::Parsing)?;
        let content = self.select_region(request, report);
        let mut doc = self.load(request, &content, report);
        report.sanitize = sanitize(&mut doc)?;
        if is_blank(&doc) {
            report.diagnostics.push(
                Diagnostic::warning("Content has nothing printable")
                    .with_code(EMPTY_CONTENT)
                    .with_file(request.source_id.as_str())
                    .with_help("The document will contain only the title and disclaimer"),
            );
        }

        tracker.advance(RequestState::Normalizing)?;
        report.diagnostics.extend(
            check_hierarchy(&doc)
                .into_iter()
                .map(|d| d.with_file(request.source_id.as_str())),
        );
        report.headings_inserted = normalize_headings(&mut doc)?;

        tracker.advance(RequestState::Annotating)?;
        report.annotation = self.annotator.annotate(&mut doc)?;

        tracker.advance(RequestState::Assembling)?;
        self.assembler
            .assemble(doc, request.title_or(&self.settings.document.default_title))
    }

    fn select_region(&self, request: &RenderRequest, report: &mut PipelineReport) -> String {
        let Some(selector) = &request.selector else {
            return request.content.clone();
        };
        let region = extract_region(&request.content, selector);
        match &region {
            Region::Selected {
                matches,
                matched_by,
                ..
            } => {
                report.region = Some(RegionMatch {
                    count: *matches,
                    matched_by: *matched_by,
                });
            }
            Region::FullDocument(_) => {
                report.diagnostics.push(
                    Diagnostic::warning(format!(
                        "Region selector '{}' matched nothing, printing the full page",
                        selector.value()
                    ))
                    .with_code(EMPTY_REGION)
                    .with_file(request.source_id.as_str()),
                );
            }
        }
        region.into_html()
    }

    fn load(&self, request: &RenderRequest, content: &str, report: &mut PipelineReport) -> Document {
        let loaded = load_fragment(content);
        if let LoadOutcome::Degraded(reason) = &loaded.outcome {
            log::warn!("Markup of '{}' degraded to text: {}", request.source_id, reason);
            report.diagnostics.push(
                Diagnostic::warning("Markup could not be parsed, printing it as plain text")
                    .with_code(PARSE_FAILURE)
                    .with_file(request.source_id.as_str())
                    .with_note(reason.as_str()),
            );
        }
        loaded.document
    }
}

fn is_blank(doc: &Document) -> bool {
    let root = doc.root();
    doc.visible_text(root).trim().is_empty()
        && doc.descendants_named(root, "img").is_empty()
        && doc.descendants_named(root, "table").is_empty()
}

/// User-facing page shown when a request fails
pub fn error_page(err: &PipelineError) -> String {
    let mut message = String::new();
    escape_text(&err.to_string(), &mut message);
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>Document could not be generated</title>\n</head>\n<body>\n\
         <main role=\"main\">\n<h1>Document could not be generated</h1>\n\
         <p>{}</p>\n</main>\n</body>\n</html>\n",
        message
    )
}
