//! Arena-backed element tree
//!
//! Nodes live in a single `Vec` owned by [`Document`] and are addressed by
//! [`NodeId`]. Parent and child links are stored as indices, so passes can
//! hold ids across mutations without fighting the borrow checker.
//!
//! Detached nodes stay in the arena (ids remain stable) but are unreachable
//! from the root.

use std::fmt;

use crate::error::{DomError, Result};

/// Stable index of a node inside its [`Document`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(usize);

impl NodeId {
    /// Raw arena index
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Accessibility role of an element
///
/// Typed replacement for marker attributes: passes set it, the serializer
/// and render backends read it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Role {
    /// Ordinary content
    #[default]
    Content,
    /// Present for assistive technology only
    VisuallyHidden,
    /// Empty heading inserted to close a level gap
    SyntheticHeading,
    /// Decorative image skipped by assistive technology
    Presentational,
    /// Accessibility disclaimer banner
    Disclaimer,
}

/// Ordered attribute map with unique keys
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attributes {
    entries: Vec<(String, String)>,
}

impl Attributes {
    /// Create an empty attribute map
    pub fn new() -> Self {
        Self::default()
    }

    /// Get an attribute value
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Check whether an attribute is present
    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|(key, _)| key == name)
    }

    /// Set an attribute, replacing any existing value in place
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(key, _)| *key == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    /// Remove an attribute, returning its old value
    pub fn remove(&mut self, name: &str) -> Option<String> {
        let position = self.entries.iter().position(|(key, _)| key == name)?;
        Some(self.entries.remove(position).1)
    }

    /// Iterate attributes in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of attributes
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether there are no attributes
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// An element node's payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    /// Lowercase tag name
    pub name: String,
    /// Attribute map
    pub attrs: Attributes,
    /// Accessibility role set by the passes
    pub role: Role,
}

impl Element {
    /// Create an element with no attributes
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into().to_ascii_lowercase(),
            attrs: Attributes::new(),
            role: Role::Content,
        }
    }

    /// Whitespace-separated class tokens
    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.attrs.get("class").unwrap_or("").split_ascii_whitespace()
    }

    /// Check whether the class list contains `class`
    pub fn has_class(&self, class: &str) -> bool {
        self.classes().any(|c| c == class)
    }

    /// Heading level for `h1`..`h6`
    pub fn heading_level(&self) -> Option<u8> {
        heading_level(&self.name)
    }
}

/// Heading level encoded in a tag name (`h1`..`h6`)
pub fn heading_level(name: &str) -> Option<u8> {
    let bytes = name.as_bytes();
    if bytes.len() == 2 && (bytes[0] == b'h' || bytes[0] == b'H') {
        match bytes[1] {
            b'1'..=b'6' => Some(bytes[1] - b'0'),
            _ => None,
        }
    } else {
        None
    }
}

/// Kind of a node
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// The tree root; holds top-level content
    Root,
    /// An element
    Element(Element),
    /// Decoded character data
    Text(String),
    /// A comment
    Comment(String),
}

#[derive(Debug, Clone)]
struct Node {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// An in-memory element tree
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Node>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Create a tree holding only the root
    pub fn new() -> Self {
        Self {
            nodes: vec![Node {
                kind: NodeKind::Root,
                parent: None,
                children: Vec::new(),
            }],
        }
    }

    /// The root node
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    fn push(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            kind,
            parent: None,
            children: Vec::new(),
        });
        id
    }

    /// Create a detached element
    pub fn create_element(&mut self, name: &str) -> NodeId {
        self.push(NodeKind::Element(Element::new(name)))
    }

    /// Create a detached element with attributes
    pub fn create_element_with(&mut self, name: &str, attrs: &[(&str, &str)]) -> NodeId {
        let mut element = Element::new(name);
        for (key, value) in attrs {
            element.attrs.set(*key, *value);
        }
        self.push(NodeKind::Element(element))
    }

    /// Create a detached text node
    pub fn create_text(&mut self, text: impl Into<String>) -> NodeId {
        self.push(NodeKind::Text(text.into()))
    }

    /// Create a detached comment node
    pub fn create_comment(&mut self, text: impl Into<String>) -> NodeId {
        self.push(NodeKind::Comment(text.into()))
    }

    /// Kind of a node
    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.nodes[id.0].kind
    }

    /// Element payload, if the node is an element
    pub fn element(&self, id: NodeId) -> Option<&Element> {
        match &self.nodes[id.0].kind {
            NodeKind::Element(element) => Some(element),
            _ => None,
        }
    }

    /// Mutable element payload
    pub fn element_mut(&mut self, id: NodeId) -> Option<&mut Element> {
        match &mut self.nodes[id.0].kind {
            NodeKind::Element(element) => Some(element),
            _ => None,
        }
    }

    /// Tag name of an element node
    pub fn tag_name(&self, id: NodeId) -> Option<&str> {
        self.element(id).map(|e| e.name.as_str())
    }

    /// Whether the node is an element with the given tag name
    pub fn is_element(&self, id: NodeId, name: &str) -> bool {
        self.tag_name(id) == Some(name)
    }

    /// Text of a text node
    pub fn text(&self, id: NodeId) -> Option<&str> {
        match &self.nodes[id.0].kind {
            NodeKind::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Get an attribute of an element node
    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.element(id).and_then(|e| e.attrs.get(name))
    }

    /// Set an attribute on an element node; no-op on other kinds
    pub fn set_attr(&mut self, id: NodeId, name: &str, value: impl Into<String>) {
        if let Some(element) = self.element_mut(id) {
            element.attrs.set(name, value);
        }
    }

    /// Rename an element, keeping its attributes and children
    pub fn rename(&mut self, id: NodeId, name: &str) {
        if let Some(element) = self.element_mut(id) {
            element.name = name.to_ascii_lowercase();
        }
    }

    /// Role of an element (`Content` for non-elements)
    pub fn role(&self, id: NodeId) -> Role {
        self.element(id).map(|e| e.role).unwrap_or_default()
    }

    /// Set the role of an element
    pub fn set_role(&mut self, id: NodeId, role: Role) {
        if let Some(element) = self.element_mut(id) {
            element.role = role;
        }
    }

    /// Parent of a node
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    /// Ordered children of a node
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    /// Element children only
    pub fn element_children(&self, id: NodeId) -> Vec<NodeId> {
        self.children(id)
            .iter()
            .copied()
            .filter(|child| self.element(*child).is_some())
            .collect()
    }

    /// First child element with the given tag name
    pub fn child_named(&self, id: NodeId, name: &str) -> Option<NodeId> {
        self.children(id)
            .iter()
            .copied()
            .find(|child| self.is_element(*child, name))
    }

    /// Ancestors from the parent up to the root
    pub fn ancestors(&self, id: NodeId) -> Vec<NodeId> {
        let mut result = Vec::new();
        let mut current = self.parent(id);
        while let Some(node) = current {
            result.push(node);
            current = self.parent(node);
        }
        result
    }

    /// Whether `ancestor` is `id` or one of its ancestors
    pub fn is_inclusive_ancestor(&self, ancestor: NodeId, id: NodeId) -> bool {
        ancestor == id || self.ancestors(id).contains(&ancestor)
    }

    /// Whether the node is reachable from the root
    pub fn is_attached(&self, id: NodeId) -> bool {
        self.is_inclusive_ancestor(self.root(), id)
    }

    /// Descendants in document order, excluding `id` itself
    ///
    /// Returned as a snapshot so callers can mutate while iterating.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut result = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(node) = stack.pop() {
            result.push(node);
            stack.extend(self.children(node).iter().rev().copied());
        }
        result
    }

    /// Descendant elements with the given tag name, in document order
    pub fn descendants_named(&self, id: NodeId, name: &str) -> Vec<NodeId> {
        self.descendants(id)
            .into_iter()
            .filter(|node| self.is_element(*node, name))
            .collect()
    }

    /// All `id` attribute values in the attached tree
    pub fn ids(&self) -> Vec<&str> {
        self.descendants(self.root())
            .into_iter()
            .filter_map(|node| self.attr(node, "id"))
            .collect()
    }

    /// Concatenated text of a subtree
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(id, &mut out, false);
        out
    }

    /// Concatenated text of a subtree, skipping visually hidden elements
    pub fn visible_text(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(id, &mut out, true);
        out
    }

    fn collect_text(&self, id: NodeId, out: &mut String, visible_only: bool) {
        match &self.nodes[id.0].kind {
            NodeKind::Text(text) => out.push_str(text),
            NodeKind::Comment(_) => {}
            NodeKind::Element(element)
                if visible_only && element.role == Role::VisuallyHidden => {}
            _ => {
                for child in &self.nodes[id.0].children {
                    self.collect_text(*child, out, visible_only);
                }
            }
        }
    }

    fn check_insert(&self, parent: NodeId, child: NodeId) -> Result<()> {
        if child == self.root() {
            return Err(DomError::RootImmovable);
        }
        match self.kind(parent) {
            NodeKind::Root | NodeKind::Element(_) => {}
            _ => return Err(DomError::NotAContainer(parent)),
        }
        if self.is_inclusive_ancestor(child, parent) {
            return Err(DomError::Cycle { parent, child });
        }
        Ok(())
    }

    /// Remove a node from its parent; the subtree stays intact
    pub fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.nodes[id.0].parent.take() {
            self.nodes[parent.0].children.retain(|child| *child != id);
        }
    }

    /// Append `child` as the last child of `parent`, moving it if attached
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        self.check_insert(parent, child)?;
        self.detach(child);
        self.nodes[parent.0].children.push(child);
        self.nodes[child.0].parent = Some(parent);
        Ok(())
    }

    /// Insert `child` as the first child of `parent`
    pub fn prepend_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        self.check_insert(parent, child)?;
        self.detach(child);
        self.nodes[parent.0].children.insert(0, child);
        self.nodes[child.0].parent = Some(parent);
        Ok(())
    }

    /// Insert `node` immediately before `reference`
    pub fn insert_before(&mut self, reference: NodeId, node: NodeId) -> Result<()> {
        self.insert_sibling(reference, node, 0)
    }

    /// Insert `node` immediately after `reference`
    pub fn insert_after(&mut self, reference: NodeId, node: NodeId) -> Result<()> {
        self.insert_sibling(reference, node, 1)
    }

    fn insert_sibling(&mut self, reference: NodeId, node: NodeId, offset: usize) -> Result<()> {
        let parent = self.parent(reference).ok_or(DomError::Detached(reference))?;
        self.check_insert(parent, node)?;
        if node == reference {
            return Ok(());
        }
        self.detach(node);
        let position = self.nodes[parent.0]
            .children
            .iter()
            .position(|child| *child == reference)
            .ok_or(DomError::Detached(reference))?;
        self.nodes[parent.0]
            .children
            .insert(position + offset, node);
        self.nodes[node.0].parent = Some(parent);
        Ok(())
    }

    /// Move every child of `from` to the end of `to`
    pub fn move_children(&mut self, from: NodeId, to: NodeId) -> Result<()> {
        let children: Vec<NodeId> = self.children(from).to_vec();
        for child in children {
            self.append_child(to, child)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heading_level() {
        assert_eq!(heading_level("h1"), Some(1));
        assert_eq!(heading_level("h6"), Some(6));
        assert_eq!(heading_level("h7"), None);
        assert_eq!(heading_level("header"), None);
        assert_eq!(heading_level("hr"), None);
    }

    #[test]
    fn test_attributes_unique_keys() {
        let mut attrs = Attributes::new();
        attrs.set("alt", "one");
        attrs.set("src", "a.png");
        attrs.set("alt", "two");
        assert_eq!(attrs.len(), 2);
        assert_eq!(attrs.get("alt"), Some("two"));
        let keys: Vec<&str> = attrs.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["alt", "src"]);
        assert_eq!(attrs.remove("alt"), Some("two".to_string()));
        assert!(!attrs.contains("alt"));
    }

    #[test]
    fn test_append_and_descendants_order() {
        let mut doc = Document::new();
        let div = doc.create_element("div");
        let p1 = doc.create_element("p");
        let p2 = doc.create_element("p");
        let text = doc.create_text("hi");
        doc.append_child(doc.root(), div).unwrap();
        doc.append_child(div, p1).unwrap();
        doc.append_child(div, p2).unwrap();
        doc.append_child(p1, text).unwrap();

        assert_eq!(doc.descendants(doc.root()), vec![div, p1, text, p2]);
        assert_eq!(doc.parent(text), Some(p1));
        assert_eq!(doc.text_content(div), "hi");
    }

    #[test]
    fn test_insert_before_and_after() {
        let mut doc = Document::new();
        let a = doc.create_element("a");
        let b = doc.create_element("b");
        let c = doc.create_element("i");
        doc.append_child(doc.root(), b).unwrap();
        doc.insert_before(b, a).unwrap();
        doc.insert_after(b, c).unwrap();
        assert_eq!(doc.children(doc.root()), &[a, b, c]);
    }

    #[test]
    fn test_move_detaches_from_old_parent() {
        let mut doc = Document::new();
        let first = doc.create_element("div");
        let second = doc.create_element("div");
        let child = doc.create_element("span");
        doc.append_child(doc.root(), first).unwrap();
        doc.append_child(doc.root(), second).unwrap();
        doc.append_child(first, child).unwrap();
        doc.append_child(second, child).unwrap();

        assert!(doc.children(first).is_empty());
        assert_eq!(doc.children(second), &[child]);
        assert_eq!(doc.parent(child), Some(second));
    }

    #[test]
    fn test_detach_leaves_no_dangling_reference() {
        let mut doc = Document::new();
        let div = doc.create_element("div");
        let span = doc.create_element("span");
        doc.append_child(doc.root(), div).unwrap();
        doc.append_child(div, span).unwrap();
        doc.detach(span);

        assert!(doc.children(div).is_empty());
        assert_eq!(doc.parent(span), None);
        assert!(!doc.is_attached(span));
        assert!(!doc.descendants(doc.root()).contains(&span));
    }

    #[test]
    fn test_cycle_rejected() {
        let mut doc = Document::new();
        let outer = doc.create_element("div");
        let inner = doc.create_element("div");
        doc.append_child(doc.root(), outer).unwrap();
        doc.append_child(outer, inner).unwrap();

        let err = doc.append_child(inner, outer).unwrap_err();
        assert!(matches!(err, DomError::Cycle { .. }));
    }

    #[test]
    fn test_text_node_is_not_a_container() {
        let mut doc = Document::new();
        let text = doc.create_text("x");
        let span = doc.create_element("span");
        doc.append_child(doc.root(), text).unwrap();
        assert!(matches!(
            doc.append_child(text, span),
            Err(DomError::NotAContainer(_))
        ));
    }

    #[test]
    fn test_insert_next_to_detached_fails() {
        let mut doc = Document::new();
        let lonely = doc.create_element("p");
        let other = doc.create_element("p");
        assert!(matches!(
            doc.insert_before(lonely, other),
            Err(DomError::Detached(_))
        ));
    }

    #[test]
    fn test_visible_text_skips_hidden() {
        let mut doc = Document::new();
        let link = doc.create_element("a");
        let text = doc.create_text("Docs");
        let hidden = doc.create_element("span");
        let suffix = doc.create_text(" (link)");
        doc.append_child(doc.root(), link).unwrap();
        doc.append_child(link, text).unwrap();
        doc.append_child(link, hidden).unwrap();
        doc.append_child(hidden, suffix).unwrap();
        doc.set_role(hidden, Role::VisuallyHidden);

        assert_eq!(doc.text_content(link), "Docs (link)");
        assert_eq!(doc.visible_text(link), "Docs");
    }

    #[test]
    fn test_has_class() {
        let mut doc = Document::new();
        let div = doc.create_element_with("div", &[("class", "entry print-area  wide")]);
        let element = doc.element(div).unwrap();
        assert!(element.has_class("print-area"));
        assert!(!element.has_class("print"));
    }

    #[test]
    fn test_rename_keeps_attributes() {
        let mut doc = Document::new();
        let cell = doc.create_element_with("td", &[("colspan", "2")]);
        doc.rename(cell, "TH");
        assert_eq!(doc.tag_name(cell), Some("th"));
        assert_eq!(doc.attr(cell, "colspan"), Some("2"));
    }
}
