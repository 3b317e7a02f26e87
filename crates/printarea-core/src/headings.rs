//! Heading hierarchy repair
//!
//! Headings must step down one level at a time (h1 -> h2 -> h3). Where the
//! markup skips levels, empty headings are inserted so that the PDF outline
//! stays strictly incremental. Going back up any number of levels is fine.

use printarea_dom::{Document, NodeId, Role};

use crate::diagnostics::{Diagnostic, HEADING_GAP};
use crate::error::Result;

/// A heading found in document order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeadingEntry {
    /// The heading element
    pub node: NodeId,
    /// Level 1-6
    pub level: u8,
}

/// Headings of the attached tree in document order
pub fn heading_sequence(doc: &Document) -> Vec<HeadingEntry> {
    doc.descendants(doc.root())
        .into_iter()
        .filter_map(|node| {
            doc.element(node)
                .and_then(|e| e.heading_level())
                .map(|level| HeadingEntry { node, level })
        })
        .collect()
}

/// Insert empty headings wherever a heading skips levels
///
/// The first heading is never padded. Returns the number of headings
/// inserted.
pub fn normalize_headings(doc: &mut Document) -> Result<usize> {
    let mut inserted = 0;
    let mut previous: Option<u8> = None;

    for entry in heading_sequence(doc) {
        if let Some(prev) = previous {
            if entry.level > prev + 1 {
                for level in (prev + 1)..entry.level {
                    let filler = doc.create_element(&format!("h{}", level));
                    doc.set_role(filler, Role::SyntheticHeading);
                    doc.insert_before(entry.node, filler)?;
                    inserted += 1;
                }
                log::debug!(
                    "Closed heading gap h{} -> h{} with {} heading(s)",
                    prev,
                    entry.level,
                    entry.level - prev - 1
                );
            }
        }
        previous = Some(entry.level);
    }

    Ok(inserted)
}

/// Report heading level gaps without changing the tree
pub fn check_hierarchy(doc: &Document) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    let mut previous: Option<u8> = None;

    for (index, entry) in heading_sequence(doc).iter().enumerate() {
        if let Some(prev) = previous {
            if entry.level > prev + 1 {
                let text = doc.visible_text(entry.node);
                let diagnostic = Diagnostic::warning(format!(
                    "Heading level jump (h{} -> h{}). Missing h{}?",
                    prev,
                    entry.level,
                    prev + 1
                ))
                .with_code(HEADING_GAP)
                .with_help(
                    "Empty intermediate headings will be inserted in the PDF outline. \
                     Adjust the heading level to avoid them.",
                )
                .with_note(format!(
                    "Heading #{} \"{}\"",
                    index + 1,
                    text.split_whitespace().collect::<Vec<_>>().join(" ")
                ));
                diagnostics.push(diagnostic);
            }
        }
        previous = Some(entry.level);
    }

    diagnostics
}

#[cfg(test)]
mod tests {
    use super::*;
    use printarea_dom::{load_fragment, to_html};

    fn levels(doc: &Document) -> Vec<u8> {
        heading_sequence(doc).iter().map(|h| h.level).collect()
    }

    fn normalized(html: &str) -> Document {
        let mut doc = load_fragment(html).document;
        normalize_headings(&mut doc).unwrap();
        doc
    }

    #[test]
    fn test_gap_of_one_level() {
        let doc = normalized("<h1>T</h1><h3>Sub</h3>");
        assert_eq!(to_html(&doc), "<h1>T</h1><h2></h2><h3>Sub</h3>");
    }

    #[test]
    fn test_gap_of_several_levels() {
        let doc = normalized("<h2>A</h2><h6>B</h6>");
        assert_eq!(levels(&doc), vec![2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_first_heading_never_padded() {
        let doc = normalized("<h4>Deep start</h4><p>x</p>");
        assert_eq!(levels(&doc), vec![4]);
    }

    #[test]
    fn test_same_level_needs_nothing() {
        let mut doc = load_fragment("<h2>A</h2><h2>B</h2><h2>C</h2>").document;
        assert_eq!(normalize_headings(&mut doc).unwrap(), 0);
    }

    #[test]
    fn test_going_back_up_is_valid() {
        let mut doc = load_fragment("<h1>A</h1><h2>B</h2><h3>C</h3><h1>D</h1><h2>E</h2>").document;
        assert_eq!(normalize_headings(&mut doc).unwrap(), 0);
    }

    #[test]
    fn test_nested_heading_padded_in_place() {
        let doc = normalized("<h1>A</h1><section><div><h4>B</h4></div></section>");
        assert_eq!(
            to_html(&doc),
            "<h1>A</h1><section><div><h2></h2><h3></h3><h4>B</h4></div></section>"
        );
    }

    #[test]
    fn test_synthetic_role_and_text_untouched() {
        let doc = normalized("<h1 class=\"big\">Title</h1><h3 id=\"s\">Sub</h3>");
        let seq = heading_sequence(&doc);
        assert_eq!(doc.role(seq[1].node), Role::SyntheticHeading);
        assert_eq!(doc.text_content(seq[1].node), "");
        assert_eq!(doc.text_content(seq[2].node), "Sub");
        assert_eq!(doc.attr(seq[0].node, "class"), Some("big"));
        assert_eq!(doc.attr(seq[2].node, "id"), Some("s"));
    }

    #[test]
    fn test_adjacent_headings_differ_by_at_most_one() {
        let inputs = [
            "<h1>a</h1><h6>b</h6><h2>c</h2><h5>d</h5>",
            "<h3>a</h3><h1>b</h1><h4>c</h4>",
            "<h2>a</h2><p><h5>b</h5></p><h6>c</h6><h1>d</h1><h3>e</h3>",
        ];
        for input in inputs {
            let doc = normalized(input);
            let seq = levels(&doc);
            for pair in seq.windows(2) {
                assert!(
                    pair[1] <= pair[0] + 1,
                    "{:?} has a gap after normalizing {}",
                    seq,
                    input
                );
            }
        }
    }

    #[test]
    fn test_check_reports_without_mutating() {
        let doc = load_fragment("<h1>A</h1><h3>B</h3><h5>C</h5>").document;
        let before = to_html(&doc);
        let diagnostics = check_hierarchy(&doc);
        assert_eq!(diagnostics.len(), 2);
        assert!(diagnostics[0].message.contains("h1 -> h3"));
        assert!(diagnostics[0].has_code(HEADING_GAP));
        assert_eq!(to_html(&doc), before);
    }

    #[test]
    fn test_check_ignores_deep_first_heading() {
        let doc = load_fragment("<h3>A</h3><h4>B</h4>").document;
        assert!(check_hierarchy(&doc).is_empty());
    }
}
