//! Rendering requests and their lifecycle
//!
//! A request is created when a print action is invoked and dropped once the
//! output bytes or an error page have been produced. Nothing is persisted.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};
use crate::region::RegionSelector;

/// How the output is delivered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Disposition {
    /// Viewable in the browser
    #[default]
    Inline,
    /// Forced download
    Download,
}

impl Disposition {
    /// The `Content-Disposition` type token
    pub fn as_header_token(self) -> &'static str {
        match self {
            Disposition::Inline => "inline",
            Disposition::Download => "attachment",
        }
    }
}

/// Request lifecycle
///
/// `Idle -> Parsing -> Normalizing -> Annotating -> Assembling -> Rendered`,
/// with `Failed` reachable from every non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestState {
    Idle,
    Parsing,
    Normalizing,
    Annotating,
    Assembling,
    Rendered,
    Failed,
}

impl RequestState {
    /// Whether the request can move from `self` to `next`
    pub fn can_transition_to(self, next: RequestState) -> bool {
        use RequestState::*;
        match (self, next) {
            (Rendered, _) | (Failed, _) => false,
            (_, Failed) => true,
            (Idle, Parsing)
            | (Parsing, Normalizing)
            | (Normalizing, Annotating)
            | (Annotating, Assembling)
            | (Assembling, Rendered) => true,
            _ => false,
        }
    }

    /// Whether no further transitions are possible
    pub fn is_terminal(self) -> bool {
        matches!(self, RequestState::Rendered | RequestState::Failed)
    }
}

/// Tracks a request through its states
#[derive(Debug, Clone)]
pub struct RequestTracker {
    state: RequestState,
    history: Vec<RequestState>,
}

impl Default for RequestTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestTracker {
    /// Start in `Idle`
    pub fn new() -> Self {
        Self {
            state: RequestState::Idle,
            history: vec![RequestState::Idle],
        }
    }

    /// Current state
    pub fn state(&self) -> RequestState {
        self.state
    }

    /// Every state visited, in order
    pub fn history(&self) -> &[RequestState] {
        &self.history
    }

    /// Move to `next`, rejecting out-of-order transitions
    pub fn advance(&mut self, next: RequestState) -> Result<()> {
        if !self.state.can_transition_to(next) {
            return Err(PipelineError::InvalidTransition {
                from: self.state,
                to: next,
            });
        }
        log::debug!("Request state {:?} -> {:?}", self.state, next);
        self.state = next;
        self.history.push(next);
        Ok(())
    }

    /// Move to `Failed` unless already terminal
    pub fn fail(&mut self) {
        if !self.state.is_terminal() {
            self.state = RequestState::Failed;
            self.history.push(RequestState::Failed);
        }
    }
}

/// A request to render one document
#[derive(Debug, Clone)]
pub struct RenderRequest {
    /// Identifier of the source page (URL, post id, path)
    pub source_id: String,
    /// Document title, also used for the filename
    pub title: String,
    /// Rendered HTML of the page or region
    pub content: String,
    /// Region selector; `None` means the content is already the region
    pub selector: Option<RegionSelector>,
    /// Delivery mode
    pub disposition: Disposition,
}

impl RenderRequest {
    /// Create a request for already-extracted content
    pub fn new(
        source_id: impl Into<String>,
        title: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            source_id: source_id.into(),
            title: title.into(),
            content: content.into(),
            selector: None,
            disposition: Disposition::Inline,
        }
    }

    /// Select a region from the content before processing
    pub fn with_selector(mut self, selector: RegionSelector) -> Self {
        self.selector = Some(selector);
        self
    }

    /// Set the delivery mode
    pub fn with_disposition(mut self, disposition: Disposition) -> Self {
        self.disposition = disposition;
        self
    }

    /// The request title, or `default` when the title is blank
    pub fn title_or<'a>(&'a self, default: &'a str) -> &'a str {
        match self.title.trim() {
            "" => default,
            title => title,
        }
    }

    /// Output filename with the given extension
    pub fn filename(&self, default_title: &str, extension: &str) -> String {
        format!(
            "{}.{}",
            sanitize_filename(self.title_or(default_title)),
            extension
        )
    }
}

/// Output bytes plus delivery metadata
#[derive(Debug, Clone)]
pub struct RenderedDocument {
    /// Document bytes
    pub bytes: Vec<u8>,
    /// MIME type of `bytes`
    pub media_type: &'static str,
    /// Suggested filename
    pub filename: String,
    /// Delivery mode
    pub disposition: Disposition,
}

impl RenderedDocument {
    /// Value for a `Content-Disposition` header
    pub fn content_disposition(&self) -> String {
        format!(
            "{}; filename=\"{}\"",
            self.disposition.as_header_token(),
            self.filename
        )
    }
}

fn non_slug_chars() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"[^a-z0-9]+").expect("static pattern is valid"))
}

/// Turn a title into a filesystem- and header-safe file stem
///
/// Lowercases, replaces runs of anything but ASCII letters and digits with
/// a single `-`, and trims dashes. Empty results become `document`.
pub fn sanitize_filename(title: &str) -> String {
    let lowered = title.to_lowercase();
    let slug = non_slug_chars().replace_all(&lowered, "-");
    let slug = slug.trim_matches('-');
    if slug.is_empty() {
        "document".to_string()
    } else {
        slug.chars().take(100).collect::<String>().trim_end_matches('-').to_string()
    }
}
