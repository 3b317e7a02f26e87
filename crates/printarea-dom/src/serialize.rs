//! HTML serialization of element trees
//!
//! Typed roles are rendered as markup here: visually hidden elements get the
//! `visually-hidden` class, presentational elements `role="presentation"`.

use crate::tree::{Document, NodeId, NodeKind, Role};

/// Class emitted for [`Role::VisuallyHidden`] elements
pub const VISUALLY_HIDDEN_CLASS: &str = "visually-hidden";

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style", "xmp", "iframe", "noembed", "noframes"];

/// Whether the tag never has content or an end tag
pub fn is_void_element(name: &str) -> bool {
    VOID_ELEMENTS.contains(&name)
}

/// Serialize a node and its subtree
pub fn outer_html(doc: &Document, id: NodeId) -> String {
    let mut out = String::new();
    write_node(doc, id, &mut out);
    out
}

/// Serialize the children of a node
pub fn inner_html(doc: &Document, id: NodeId) -> String {
    let mut out = String::new();
    for child in doc.children(id) {
        write_node(doc, *child, &mut out);
    }
    out
}

/// Serialize the whole attached tree
pub fn to_html(doc: &Document) -> String {
    inner_html(doc, doc.root())
}

fn write_node(doc: &Document, id: NodeId, out: &mut String) {
    match doc.kind(id) {
        NodeKind::Root => {
            for child in doc.children(id) {
                write_node(doc, *child, out);
            }
        }
        NodeKind::Text(text) => {
            let raw = doc
                .parent(id)
                .and_then(|parent| doc.tag_name(parent))
                .is_some_and(|name| RAW_TEXT_ELEMENTS.contains(&name));
            if raw {
                out.push_str(text);
            } else {
                escape_text(text, out);
            }
        }
        NodeKind::Comment(text) => {
            out.push_str("<!--");
            out.push_str(text);
            out.push_str("-->");
        }
        NodeKind::Element(element) => {
            out.push('<');
            out.push_str(&element.name);

            let mut wrote_class = false;
            let mut wrote_role = false;
            for (key, value) in element.attrs.iter() {
                let value = match (key, element.role) {
                    ("class", Role::VisuallyHidden) => {
                        wrote_class = true;
                        with_class(value, VISUALLY_HIDDEN_CLASS)
                    }
                    ("role", _) => {
                        wrote_role = true;
                        value.to_string()
                    }
                    _ => value.to_string(),
                };
                write_attr(key, &value, out);
            }
            if element.role == Role::VisuallyHidden && !wrote_class {
                write_attr("class", VISUALLY_HIDDEN_CLASS, out);
            }
            if element.role == Role::Presentational && !wrote_role {
                write_attr("role", "presentation", out);
            }
            out.push('>');

            if is_void_element(&element.name) {
                return;
            }
            for child in doc.children(id) {
                write_node(doc, *child, out);
            }
            out.push_str("</");
            out.push_str(&element.name);
            out.push('>');
        }
    }
}

fn with_class(existing: &str, class: &str) -> String {
    if existing.split_ascii_whitespace().any(|c| c == class) {
        existing.to_string()
    } else if existing.trim().is_empty() {
        class.to_string()
    } else {
        format!("{} {}", existing.trim(), class)
    }
}

fn write_attr(key: &str, value: &str, out: &mut String) {
    out.push(' ');
    out.push_str(key);
    out.push_str("=\"");
    escape_attr(value, out);
    out.push('"');
}

/// Escape character data for text content
pub fn escape_text(text: &str, out: &mut String) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            _ => out.push(ch),
        }
    }
}

/// Escape an attribute value for a double-quoted attribute
pub fn escape_attr(value: &str, out: &mut String) {
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            _ => out.push(ch),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialize_nested() {
        let mut doc = Document::new();
        let p = doc.create_element_with("p", &[("class", "lead")]);
        let text = doc.create_text("a < b & c");
        doc.append_child(doc.root(), p).unwrap();
        doc.append_child(p, text).unwrap();

        assert_eq!(to_html(&doc), r#"<p class="lead">a &lt; b &amp; c</p>"#);
    }

    #[test]
    fn test_void_elements_have_no_end_tag() {
        let mut doc = Document::new();
        let img = doc.create_element_with("img", &[("src", "a.png"), ("alt", "Say \"hi\"")]);
        doc.append_child(doc.root(), img).unwrap();

        assert_eq!(
            to_html(&doc),
            r#"<img src="a.png" alt="Say &quot;hi&quot;">"#
        );
    }

    #[test]
    fn test_visually_hidden_role_adds_class() {
        let mut doc = Document::new();
        let span = doc.create_element("span");
        doc.set_role(span, Role::VisuallyHidden);
        doc.append_child(doc.root(), span).unwrap();
        assert_eq!(to_html(&doc), r#"<span class="visually-hidden"></span>"#);

        doc.set_attr(span, "class", "note");
        assert_eq!(
            to_html(&doc),
            r#"<span class="note visually-hidden"></span>"#
        );
    }

    #[test]
    fn test_presentational_role() {
        let mut doc = Document::new();
        let img = doc.create_element_with("img", &[("alt", "Decorative image")]);
        doc.set_role(img, Role::Presentational);
        doc.append_child(doc.root(), img).unwrap();
        assert_eq!(
            to_html(&doc),
            r#"<img alt="Decorative image" role="presentation">"#
        );
    }

    #[test]
    fn test_style_text_is_raw() {
        let mut doc = Document::new();
        let style = doc.create_element("style");
        let css = doc.create_text("a > b { color: red }");
        doc.append_child(doc.root(), style).unwrap();
        doc.append_child(style, css).unwrap();
        assert_eq!(to_html(&doc), "<style>a > b { color: red }</style>");
    }

    #[test]
    fn test_detached_nodes_not_serialized() {
        let mut doc = Document::new();
        let keep = doc.create_element("p");
        let drop = doc.create_element("div");
        doc.append_child(doc.root(), keep).unwrap();
        doc.append_child(doc.root(), drop).unwrap();
        doc.detach(drop);
        assert_eq!(to_html(&doc), "<p></p>");
    }
}
