//! Markup loader
//!
//! Parses loosely-formed HTML with html5ever and copies the result into an
//! arena [`Document`]. Fragments have their HTML entities decoded before
//! parsing, so markup that arrives entity-escaped (`&lt;h1&gt;`) is parsed as
//! markup. Unknown or unbalanced tags are handled by the HTML5 recovery
//! rules rather than aborting.
//!
//! Loading fails closed: when no tree can be produced the decoded input is
//! kept as a single text node and the outcome is [`LoadOutcome::Degraded`].

use html5ever::driver::ParseOpts;
use html5ever::tendril::TendrilSink;
use html5ever::tree_builder::TreeBuilderOpts;
use html5ever::{parse_document, parse_fragment, LocalName, Namespace, QualName};
use html_escape::decode_html_entities;
use markup5ever_rcdom::{Handle, NodeData, RcDom};

use crate::error::Result;
use crate::tree::{Document, NodeId};

const HTML_NAMESPACE: &str = "http://www.w3.org/1999/xhtml";

/// How a load attempt ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The markup was parsed into a tree
    Parsed,
    /// Parsing failed; the tree holds the raw input as text
    Degraded(String),
}

/// A loaded tree plus how it was obtained
#[derive(Debug, Clone)]
pub struct Loaded {
    /// The element tree
    pub document: Document,
    /// Whether the tree is a real parse or the raw-text fallback
    pub outcome: LoadOutcome,
}

impl Loaded {
    /// Whether the loader fell back to raw text
    pub fn is_degraded(&self) -> bool {
        matches!(self.outcome, LoadOutcome::Degraded(_))
    }
}

/// Load an HTML fragment as it would appear inside `<body>`
///
/// Entities are decoded first, then the decoded text is parsed.
pub fn load_fragment(html: &str) -> Loaded {
    let decoded = decode_html_entities(html);
    finish(
        &decoded,
        parse_fragment_dom(&decoded).and_then(|dom| fragment_tree(&dom)),
    )
}

/// Load a complete page, keeping `html`, `head` and `body`
pub fn load_document(html: &str) -> Loaded {
    finish(html, parse_document_dom(html).and_then(|dom| document_tree(&dom)))
}

fn finish(input: &str, parsed: Result<Document>) -> Loaded {
    match parsed {
        Ok(document) => {
            if document.children(document.root()).is_empty() && !input.trim().is_empty() {
                log::warn!("Markup produced no nodes, keeping it as raw text");
                Loaded {
                    document: raw_text_tree(input),
                    outcome: LoadOutcome::Degraded("markup produced no nodes".to_string()),
                }
            } else {
                Loaded {
                    document,
                    outcome: LoadOutcome::Parsed,
                }
            }
        }
        Err(err) => {
            log::warn!("Markup could not be parsed ({}), keeping it as raw text", err);
            Loaded {
                document: raw_text_tree(input),
                outcome: LoadOutcome::Degraded(err.to_string()),
            }
        }
    }
}

fn raw_text_tree(input: &str) -> Document {
    let mut document = Document::new();
    let text = document.create_text(input);
    let root = document.root();
    // root accepts any child and `text` is fresh
    if let Err(err) = document.append_child(root, text) {
        log::error!("Failed to build fallback tree: {}", err);
    }
    document
}

fn parse_options() -> ParseOpts {
    ParseOpts {
        tree_builder: TreeBuilderOpts {
            drop_doctype: true,
            ..Default::default()
        },
        ..Default::default()
    }
}

fn parse_fragment_dom(html: &str) -> Result<RcDom> {
    let context = QualName::new(
        None,
        Namespace::from(HTML_NAMESPACE),
        LocalName::from("body"),
    );
    let dom = parse_fragment(RcDom::default(), parse_options(), context, Vec::new())
        .from_utf8()
        .read_from(&mut html.as_bytes())?;
    Ok(dom)
}

fn parse_document_dom(html: &str) -> Result<RcDom> {
    let dom = parse_document(RcDom::default(), parse_options())
        .from_utf8()
        .read_from(&mut html.as_bytes())?;
    Ok(dom)
}

fn fragment_tree(dom: &RcDom) -> Result<Document> {
    let mut document = Document::new();
    let root = document.root();
    // Fragment parsing wraps the content in a synthetic <html> element
    let wrapper = dom
        .document
        .children
        .borrow()
        .iter()
        .find(|child| is_html_element(child, "html"))
        .cloned();
    match wrapper {
        Some(html) => convert_children(&html, &mut document, root)?,
        None => convert_children(&dom.document, &mut document, root)?,
    }
    Ok(document)
}

fn document_tree(dom: &RcDom) -> Result<Document> {
    let mut document = Document::new();
    let root = document.root();
    convert_children(&dom.document, &mut document, root)?;
    Ok(document)
}

fn is_html_element(handle: &Handle, tag: &str) -> bool {
    match &handle.data {
        NodeData::Element { name, .. } => &*name.local == tag,
        _ => false,
    }
}

fn convert_children(handle: &Handle, document: &mut Document, parent: NodeId) -> Result<()> {
    for child in handle.children.borrow().iter() {
        convert_node(child, document, parent)?;
    }
    Ok(())
}

fn convert_node(handle: &Handle, document: &mut Document, parent: NodeId) -> Result<()> {
    match &handle.data {
        NodeData::Document => convert_children(handle, document, parent),
        NodeData::Doctype { .. } | NodeData::ProcessingInstruction { .. } => Ok(()),
        NodeData::Text { contents } => {
            let text = document.create_text(contents.borrow().to_string());
            document.append_child(parent, text)
        }
        NodeData::Comment { contents } => {
            let comment = document.create_comment(contents.to_string());
            document.append_child(parent, comment)
        }
        NodeData::Element {
            name,
            attrs,
            template_contents,
            ..
        } => {
            let id = document.create_element(&name.local);
            if let Some(element) = document.element_mut(id) {
                for attr in attrs.borrow().iter() {
                    let key = match &attr.name.prefix {
                        Some(prefix) => format!("{}:{}", prefix, attr.name.local),
                        None => attr.name.local.to_string(),
                    };
                    element.attrs.set(key, attr.value.to_string());
                }
            }
            document.append_child(parent, id)?;

            if let Some(contents) = template_contents.borrow().as_ref() {
                convert_children(contents, document, id)?;
            }
            convert_children(handle, document, id)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::serialize::to_html;

    #[test]
    fn test_fragment_keeps_top_level_nodes() {
        let loaded = load_fragment("<h1>T</h1><p>Body</p>");
        assert_eq!(loaded.outcome, LoadOutcome::Parsed);
        let doc = &loaded.document;
        let tags: Vec<_> = doc
            .children(doc.root())
            .iter()
            .filter_map(|id| doc.tag_name(*id))
            .collect();
        assert_eq!(tags, vec!["h1", "p"]);
    }

    #[test]
    fn test_escaped_markup_is_parsed() {
        let loaded = load_fragment("&lt;h1&gt;T&lt;/h1&gt;&lt;h3&gt;Sub&lt;/h3&gt;");
        assert_eq!(loaded.outcome, LoadOutcome::Parsed);
        let doc = &loaded.document;
        let tags: Vec<_> = doc
            .children(doc.root())
            .iter()
            .filter_map(|id| doc.tag_name(*id))
            .collect();
        assert_eq!(tags, vec!["h1", "h3"]);
        assert_eq!(to_html(doc), "<h1>T</h1><h3>Sub</h3>");
    }

    #[test]
    fn test_decoded_lone_angle_bracket_stays_text() {
        let loaded = load_fragment("<p>1 &lt; 2</p>");
        let doc = &loaded.document;
        let p = doc.children(doc.root())[0];
        assert_eq!(doc.text_content(p), "1 < 2");
    }

    #[test]
    fn test_entities_are_decoded() {
        let loaded = load_fragment("<p title=\"a &amp; b\">Caf&eacute; &lt;3</p>");
        let doc = &loaded.document;
        let p = doc.children(doc.root())[0];
        assert_eq!(doc.text_content(p), "Café <3");
        assert_eq!(doc.attr(p, "title"), Some("a & b"));
    }

    #[test]
    fn test_unbalanced_tags_recover() {
        let loaded = load_fragment("<div><p>one<p>two</span></div><b>tail");
        assert!(!loaded.is_degraded());
        let html = to_html(&loaded.document);
        assert_eq!(html, "<div><p>one</p><p>two</p></div><b>tail</b>");
    }

    #[test]
    fn test_unknown_tags_are_kept() {
        let loaded = load_fragment("<x-widget data-id=\"1\">inside</x-widget>");
        let doc = &loaded.document;
        let widget = doc.children(doc.root())[0];
        assert_eq!(doc.tag_name(widget), Some("x-widget"));
        assert_eq!(doc.text_content(widget), "inside");
    }

    #[test]
    fn test_fragment_does_not_hoist_style_into_head() {
        let loaded = load_fragment("<style>p{}</style><p>x</p>");
        let doc = &loaded.document;
        assert!(doc.child_named(doc.root(), "head").is_none());
        assert!(doc.child_named(doc.root(), "style").is_some());
    }

    #[test]
    fn test_nothing_parsed_degrades_to_text() {
        let loaded = load_fragment("</div>");
        assert!(loaded.is_degraded());
        let doc = &loaded.document;
        let children = doc.children(doc.root());
        assert_eq!(children.len(), 1);
        assert_eq!(doc.text(children[0]), Some("</div>"));
    }

    #[test]
    fn test_empty_input_is_not_degraded() {
        let loaded = load_fragment("");
        assert!(!loaded.is_degraded());
        assert!(loaded.document.children(loaded.document.root()).is_empty());
    }

    #[test]
    fn test_load_document_keeps_structure() {
        let loaded = load_document("<!DOCTYPE html><html><head><title>x</title></head><body><p>y</p></body></html>");
        let doc = &loaded.document;
        let html = doc.children(doc.root())[0];
        assert_eq!(doc.tag_name(html), Some("html"));
        assert!(doc.child_named(html, "head").is_some());
        assert!(doc.child_named(html, "body").is_some());
    }
}
