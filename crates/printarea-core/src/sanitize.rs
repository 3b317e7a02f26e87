//! Markup sanitization
//!
//! Removes content that has no place in a printed document: scripts,
//! embedded styles, page metadata, comments and inline event handlers.

use printarea_dom::{Document, NodeKind};

/// Elements removed together with their content
pub const STRIPPED_ELEMENTS: &[&str] = &[
    "script", "style", "noscript", "template", "iframe", "object", "embed", "head", "title",
    "meta", "link", "base",
];

/// Elements replaced by their children
const UNWRAPPED_ELEMENTS: &[&str] = &["html", "body"];

/// What sanitization removed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SanitizeReport {
    /// Elements removed with their content
    pub elements_removed: usize,
    /// Comments removed
    pub comments_removed: usize,
    /// Event handler and `javascript:` attributes removed
    pub attributes_removed: usize,
}

/// Strip unsafe and non-printable content in place
pub fn sanitize(doc: &mut Document) -> crate::Result<SanitizeReport> {
    let mut report = SanitizeReport::default();

    for node in doc.descendants(doc.root()) {
        if !doc.is_attached(node) {
            continue;
        }
        if matches!(doc.kind(node), NodeKind::Comment(_)) {
            doc.detach(node);
            report.comments_removed += 1;
            continue;
        }
        let Some(name) = doc.tag_name(node).map(str::to_string) else {
            continue;
        };
        if STRIPPED_ELEMENTS.contains(&name.as_str()) {
            doc.detach(node);
            report.elements_removed += 1;
        } else if UNWRAPPED_ELEMENTS.contains(&name.as_str()) {
            let children: Vec<_> = doc.children(node).to_vec();
            for child in children {
                doc.insert_before(node, child)?;
            }
            doc.detach(node);
        }
    }

    for node in doc.descendants(doc.root()) {
        let Some(element) = doc.element_mut(node) else {
            continue;
        };
        let unsafe_attrs: Vec<String> = element
            .attrs
            .iter()
            .filter(|(key, value)| {
                key.to_ascii_lowercase().starts_with("on")
                    || (matches!(*key, "href" | "src" | "action")
                        && value.trim_start().to_ascii_lowercase().starts_with("javascript:"))
            })
            .map(|(key, _)| key.to_string())
            .collect();
        for key in unsafe_attrs {
            element.attrs.remove(&key);
            report.attributes_removed += 1;
        }
    }

    if report != SanitizeReport::default() {
        log::debug!("Sanitized markup: {:?}", report);
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use printarea_dom::{load_fragment, to_html};

    fn sanitized(html: &str) -> (String, SanitizeReport) {
        let mut doc = load_fragment(html).document;
        let report = sanitize(&mut doc).unwrap();
        (to_html(&doc), report)
    }

    #[test]
    fn test_scripts_and_styles_removed() {
        let (html, report) = sanitized(
            "<p>a</p><script>alert(1)</script><style>p{}</style><noscript>x</noscript><p>b</p>",
        );
        assert_eq!(html, "<p>a</p><p>b</p>");
        assert_eq!(report.elements_removed, 3);
    }

    #[test]
    fn test_comments_removed() {
        let (html, report) = sanitized("<p>a<!-- hidden --></p>");
        assert_eq!(html, "<p>a</p>");
        assert_eq!(report.comments_removed, 1);
    }

    #[test]
    fn test_event_handlers_removed() {
        let (html, report) = sanitized(
            "<a href=\"javascript:void(0)\" onclick=\"x()\">go</a><img src=\"a.png\" onerror=\"y()\" alt=\"a\">",
        );
        assert_eq!(html, "<a>go</a><img src=\"a.png\" alt=\"a\">");
        assert_eq!(report.attributes_removed, 3);
    }

    #[test]
    fn test_page_wrappers_unwrapped() {
        let mut doc = printarea_dom::load_document(
            "<html><head><title>t</title></head><body><p>kept</p></body></html>",
        )
        .document;
        sanitize(&mut doc).unwrap();
        assert_eq!(to_html(&doc), "<p>kept</p>");
    }

    #[test]
    fn test_clean_markup_untouched() {
        let (html, report) = sanitized("<h1>T</h1><p class=\"x\">ok</p>");
        assert_eq!(html, "<h1>T</h1><p class=\"x\">ok</p>");
        assert_eq!(report, SanitizeReport::default());
    }
}
