//! Accessibility annotation
//!
//! Rewrites image, link and table markup so that assistive technology and
//! the tagged PDF export get meaningful semantics:
//!
//! - images: decorative images are marked presentational; informative ones
//!   get a visually hidden description cross-linked with `aria-describedby`
//! - links: `aria-label` from the visible text and a hidden " (link)" suffix
//! - tables: role, default caption, column and row header scopes
//!
//! This is a single-pass contract. Running it twice over the same tree is
//! not supported: image descriptions would be inserted again.

use std::collections::HashSet;

use printarea_dom::{Document, NodeId, Role};

use crate::error::Result;

/// Alt text given to images with an empty `alt`
pub const DECORATIVE_ALT: &str = "Decorative image";
/// Label for links without visible text
pub const LINK_PLACEHOLDER: &str = "Link";
/// Hidden suffix announcing a link
pub const LINK_SUFFIX: &str = " (link)";
/// Caption inserted into tables without one
pub const DEFAULT_CAPTION: &str = "Data Table";

/// Counts of what a pass changed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnnotationReport {
    /// Images given a hidden description
    pub images_described: usize,
    /// Images marked decorative
    pub images_decorative: usize,
    /// Links labelled
    pub links_labelled: usize,
    /// Links that received the hidden suffix
    pub link_suffixes_added: usize,
    /// Tables processed
    pub tables: usize,
    /// Default captions inserted
    pub captions_added: usize,
    /// Header rows synthesized from a first data row
    pub header_rows_added: usize,
    /// Row headers created from a first data cell
    pub row_headers_added: usize,
}

/// Accessibility annotator
///
/// # Example
///
/// ```
/// use printarea_core::annotate::Annotator;
/// use printarea_dom::{load_fragment, to_html};
///
/// let mut doc = load_fragment("<img src=\"a.png\" alt=\"\">").document;
/// Annotator::new().annotate(&mut doc).unwrap();
/// assert_eq!(
///     to_html(&doc),
///     "<img src=\"a.png\" alt=\"Decorative image\" role=\"presentation\">"
/// );
/// ```
#[derive(Debug, Clone)]
pub struct Annotator {
    id_prefix: String,
}

impl Default for Annotator {
    fn default() -> Self {
        Self::new()
    }
}

impl Annotator {
    /// Create an annotator with the default description id prefix
    pub fn new() -> Self {
        Self {
            id_prefix: "printarea-desc".to_string(),
        }
    }

    /// Run all annotation passes over the attached tree
    pub fn annotate(&self, doc: &mut Document) -> Result<AnnotationReport> {
        let mut report = AnnotationReport::default();
        self.annotate_images(doc, &mut report)?;
        self.annotate_links(doc, &mut report)?;
        self.annotate_tables(doc, &mut report)?;
        log::debug!("Annotation complete: {:?}", report);
        Ok(report)
    }

    fn annotate_images(&self, doc: &mut Document, report: &mut AnnotationReport) -> Result<()> {
        let mut ids = IdAllocator::new(doc, &self.id_prefix);

        for img in doc.descendants_named(doc.root(), "img") {
            let alt = doc.attr(img, "alt").unwrap_or("").trim().to_string();
            if alt.is_empty() {
                doc.set_attr(img, "alt", DECORATIVE_ALT);
                doc.set_role(img, Role::Presentational);
                report.images_decorative += 1;
                continue;
            }

            let id = ids.next();
            let description = doc.create_element_with("span", &[("id", id.as_str())]);
            doc.set_role(description, Role::VisuallyHidden);
            let text = doc.create_text(alt);
            doc.append_child(description, text)?;
            doc.insert_after(img, description)?;
            doc.set_attr(img, "aria-describedby", id);
            report.images_described += 1;
        }
        Ok(())
    }

    fn annotate_links(&self, doc: &mut Document, report: &mut AnnotationReport) -> Result<()> {
        let links: Vec<NodeId> = doc
            .descendants_named(doc.root(), "a")
            .into_iter()
            .filter(|link| doc.attr(*link, "href").is_some())
            .collect();

        for link in links {
            let visible = collapse_whitespace(&doc.visible_text(link));
            let label = if !visible.is_empty() {
                visible
            } else {
                match image_alt_text(doc, link) {
                    Some(alt) => alt,
                    None => LINK_PLACEHOLDER.to_string(),
                }
            };
            doc.set_attr(link, "aria-label", label);
            report.links_labelled += 1;

            if !ends_with_link_marker(&doc.text_content(link)) {
                let suffix = doc.create_element("span");
                doc.set_role(suffix, Role::VisuallyHidden);
                let text = doc.create_text(LINK_SUFFIX);
                doc.append_child(suffix, text)?;
                doc.append_child(link, suffix)?;
                report.link_suffixes_added += 1;
            }
        }
        Ok(())
    }

    fn annotate_tables(&self, doc: &mut Document, report: &mut AnnotationReport) -> Result<()> {
        for table in doc.descendants_named(doc.root(), "table") {
            doc.set_attr(table, "role", "table");
            report.tables += 1;

            if doc.child_named(table, "caption").is_none() {
                let caption = doc.create_element("caption");
                let text = doc.create_text(DEFAULT_CAPTION);
                doc.append_child(caption, text)?;
                doc.prepend_child(table, caption)?;
                report.captions_added += 1;
            }

            let rows = table_rows(doc, table);
            let mut header_rows: Vec<NodeId> = rows
                .iter()
                .copied()
                .filter(|row| is_header_row(doc, *row))
                .collect();

            if header_rows.is_empty() {
                if let Some(first) = rows.iter().copied().find(|row| !cells(doc, *row).is_empty())
                {
                    promote_to_header_row(doc, table, first)?;
                    header_rows.push(first);
                    report.header_rows_added += 1;
                }
            }

            for row in &rows {
                let row_cells = cells(doc, *row);
                if header_rows.contains(row) {
                    for cell in row_cells {
                        doc.rename(cell, "th");
                        doc.set_attr(cell, "scope", "col");
                    }
                    continue;
                }

                let authored: Vec<NodeId> = row_cells
                    .iter()
                    .copied()
                    .filter(|cell| doc.is_element(*cell, "th"))
                    .collect();
                if !authored.is_empty() {
                    for cell in authored {
                        doc.set_attr(cell, "scope", "col");
                    }
                } else if let Some(first) = row_cells.first().copied() {
                    doc.rename(first, "th");
                    doc.set_attr(first, "scope", "row");
                    report.row_headers_added += 1;
                }
            }
        }
        Ok(())
    }
}

/// Allocates ids not already used in the tree
struct IdAllocator {
    used: HashSet<String>,
    prefix: String,
    counter: usize,
}

impl IdAllocator {
    fn new(doc: &Document, prefix: &str) -> Self {
        Self {
            used: doc.ids().into_iter().map(str::to_string).collect(),
            prefix: prefix.to_string(),
            counter: 0,
        }
    }

    fn next(&mut self) -> String {
        loop {
            self.counter += 1;
            let candidate = format!("{}-{}", self.prefix, self.counter);
            if self.used.insert(candidate.clone()) {
                return candidate;
            }
        }
    }
}

/// Alt text of the informative images inside `node`, joined
fn image_alt_text(doc: &Document, node: NodeId) -> Option<String> {
    let alts: Vec<String> = doc
        .descendants_named(node, "img")
        .into_iter()
        .filter(|img| doc.role(*img) != Role::Presentational)
        .filter_map(|img| doc.attr(img, "alt").map(collapse_whitespace))
        .filter(|alt| !alt.is_empty())
        .collect();
    if alts.is_empty() {
        None
    } else {
        Some(alts.join(" "))
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Whether link text already ends with "(link)", ignoring case
pub fn ends_with_link_marker(text: &str) -> bool {
    text.trim_end().to_lowercase().ends_with("(link)")
}

/// Rows belonging to `table`, excluding rows of nested tables
pub fn table_rows(doc: &Document, table: NodeId) -> Vec<NodeId> {
    let mut rows = Vec::new();
    for child in doc.children(table) {
        match doc.tag_name(*child) {
            Some("tr") => rows.push(*child),
            Some("thead") | Some("tbody") | Some("tfoot") => rows.extend(
                doc.children(*child)
                    .iter()
                    .copied()
                    .filter(|row| doc.is_element(*row, "tr")),
            ),
            _ => {}
        }
    }
    rows
}

/// `td` and `th` children of a row
pub fn cells(doc: &Document, row: NodeId) -> Vec<NodeId> {
    doc.children(row)
        .iter()
        .copied()
        .filter(|cell| doc.is_element(*cell, "td") || doc.is_element(*cell, "th"))
        .collect()
}

/// A row in `thead`, or a row made only of `th` cells
pub fn is_header_row(doc: &Document, row: NodeId) -> bool {
    if doc
        .parent(row)
        .is_some_and(|parent| doc.is_element(parent, "thead"))
    {
        return true;
    }
    let row_cells = cells(doc, row);
    !row_cells.is_empty() && row_cells.iter().all(|cell| doc.is_element(*cell, "th"))
}

fn promote_to_header_row(doc: &mut Document, table: NodeId, row: NodeId) -> Result<()> {
    let thead = match doc.child_named(table, "thead") {
        Some(thead) => thead,
        None => {
            let thead = doc.create_element("thead");
            let anchor = doc.children(table).iter().copied().find(|child| {
                matches!(doc.tag_name(*child), Some("tbody") | Some("tfoot") | Some("tr"))
            });
            match anchor {
                Some(anchor) => doc.insert_before(anchor, thead)?,
                None => doc.append_child(table, thead)?,
            }
            thead
        }
    };

    let old_parent = doc.parent(row);
    doc.append_child(thead, row)?;

    if let Some(section) = old_parent {
        if section != table
            && doc.is_element(section, "tbody")
            && doc.element_children(section).is_empty()
        {
            doc.detach(section);
        }
    }
    Ok(())
}
