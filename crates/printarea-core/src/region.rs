//! Region extraction
//!
//! Locates the printable region of a rendered page. A bare selector value
//! matches elements by class first and falls back to the element id; a
//! leading `.` or `#` restricts matching to class or id. When nothing
//! matches, the page is returned unmodified so the pipeline never produces
//! an empty document.

use printarea_dom::{load_document, outer_html, Document, NodeId};

use crate::config::DEFAULT_SELECTOR;

/// What the selector value is compared against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectorKind {
    /// Class first, then id
    Any,
    /// Class token only (`.value`)
    Class,
    /// Element id only (`#value`)
    Id,
}

/// Region selector
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionSelector {
    value: String,
    kind: SelectorKind,
}

impl Default for RegionSelector {
    fn default() -> Self {
        Self::new(DEFAULT_SELECTOR)
    }
}

impl RegionSelector {
    /// Parse a selector value (`name`, `.class` or `#id`)
    pub fn new(value: &str) -> Self {
        let value = value.trim();
        let (kind, value) = if let Some(class) = value.strip_prefix('.') {
            (SelectorKind::Class, class)
        } else if let Some(id) = value.strip_prefix('#') {
            (SelectorKind::Id, id)
        } else {
            (SelectorKind::Any, value)
        };
        Self {
            value: value.to_string(),
            kind,
        }
    }

    /// The bare selector value
    pub fn value(&self) -> &str {
        &self.value
    }

    /// The selector kind
    pub fn kind(&self) -> SelectorKind {
        self.kind
    }

    fn class_matches(&self, doc: &Document) -> Vec<NodeId> {
        self.outermost(doc, |doc, node| {
            doc.element(node).is_some_and(|e| e.has_class(&self.value))
        })
    }

    fn id_matches(&self, doc: &Document) -> Vec<NodeId> {
        self.outermost(doc, |doc, node| doc.attr(node, "id") == Some(self.value.as_str()))
    }

    /// Matching elements in document order, skipping ones nested in a match
    fn outermost<F>(&self, doc: &Document, matches: F) -> Vec<NodeId>
    where
        F: Fn(&Document, NodeId) -> bool,
    {
        let mut selected: Vec<NodeId> = Vec::new();
        for node in doc.descendants(doc.root()) {
            if !matches(doc, node) {
                continue;
            }
            if selected
                .iter()
                .any(|outer| doc.is_inclusive_ancestor(*outer, node))
            {
                continue;
            }
            selected.push(node);
        }
        selected
    }

    /// Select matching elements, honouring class-over-id priority
    pub fn select(&self, doc: &Document) -> (Vec<NodeId>, Option<MatchKind>) {
        if self.value.is_empty() {
            return (Vec::new(), None);
        }
        if self.kind != SelectorKind::Id {
            let by_class = self.class_matches(doc);
            if !by_class.is_empty() {
                return (by_class, Some(MatchKind::Class));
            }
        }
        if self.kind != SelectorKind::Class {
            let by_id = self.id_matches(doc);
            if !by_id.is_empty() {
                return (by_id, Some(MatchKind::Id));
            }
        }
        (Vec::new(), None)
    }
}

/// How the region was found
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    /// Matched by class token
    Class,
    /// Matched by element id
    Id,
}

/// The extracted region
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Region {
    /// Serialized matching elements, concatenated in document order
    Selected {
        html: String,
        matches: usize,
        matched_by: MatchKind,
    },
    /// Nothing matched; the original page
    FullDocument(String),
}

impl Region {
    /// The region markup
    pub fn html(&self) -> &str {
        match self {
            Region::Selected { html, .. } => html,
            Region::FullDocument(html) => html,
        }
    }

    /// Consume into the region markup
    pub fn into_html(self) -> String {
        match self {
            Region::Selected { html, .. } => html,
            Region::FullDocument(html) => html,
        }
    }

    /// Whether extraction fell back to the full page
    pub fn is_full_document(&self) -> bool {
        matches!(self, Region::FullDocument(_))
    }
}

/// Extract the region identified by `selector` from a rendered page
///
/// # Example
///
/// ```
/// use printarea_core::region::{extract_region, RegionSelector};
///
/// let region = extract_region("<p>hi</p>", &RegionSelector::default());
/// assert_eq!(region.html(), "<p>hi</p>");
/// assert!(region.is_full_document());
/// ```
pub fn extract_region(page_html: &str, selector: &RegionSelector) -> Region {
    let loaded = load_document(page_html);
    if loaded.is_degraded() {
        return Region::FullDocument(page_html.to_string());
    }

    let doc = &loaded.document;
    match selector.select(doc) {
        (nodes, Some(matched_by)) if !nodes.is_empty() => {
            let html: String = nodes.iter().map(|node| outer_html(doc, *node)).collect();
            log::debug!(
                "Selector '{}' matched {} element(s) by {:?}",
                selector.value(),
                nodes.len(),
                matched_by
            );
            Region::Selected {
                html,
                matches: nodes.len(),
                matched_by,
            }
        }
        _ => {
            log::warn!(
                "Selector '{}' matched nothing, using the full page",
                selector.value()
            );
            Region::FullDocument(page_html.to_string())
        }
    }
}
