//! Owned, namespace-aware element tree.
//!
//! Parsed documents are copied out of the `roxmltree` arena into this tree so
//! that they can outlive the input buffer, be edited by collection adapters,
//! and be shared across threads. Child elements are reference counted; edits
//! go through `Arc::make_mut`, so shared subtrees are copied on write.

use std::sync::Arc;

use crate::qname::QName;

/// A single attribute.
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    pub name: QName,
    pub value: String,
}

/// A child node of an element.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element(Arc<Element>),
    Text(String),
    Comment(String),
    ProcessingInstruction {
        target: String,
        value: Option<String>,
    },
}

/// An element with its attributes and children.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    name: QName,
    attributes: Vec<Attribute>,
    children: Vec<Node>,
}

impl Element {
    /// Create an empty element.
    #[must_use]
    pub fn new(name: QName) -> Self {
        Self {
            name,
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &QName {
        &self.name
    }

    #[must_use]
    pub fn namespace(&self) -> Option<&str> {
        self.name.namespace()
    }

    #[must_use]
    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    #[must_use]
    pub fn children(&self) -> &[Node] {
        &self.children
    }

    /// Get an attribute value by qualified name.
    #[must_use]
    pub fn attribute(&self, name: &QName) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| &a.name == name)
            .map(|a| a.value.as_str())
    }

    /// Get an unqualified attribute value (the common case for Atom).
    ///
    /// # Examples
    /// ```
    /// use abdera_model::{Element, QName};
    ///
    /// let link = Element::new(QName::atom("link")).with_attribute(QName::local("rel"), "edit");
    /// assert_eq!(link.attr("rel"), Some("edit"));
    /// assert_eq!(link.attr("href"), None);
    /// ```
    #[must_use]
    pub fn attr(&self, local: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.name.namespace().is_none() && a.name.local_name() == local)
            .map(|a| a.value.as_str())
    }

    /// Set an attribute, replacing an existing value with the same name.
    pub fn set_attribute(&mut self, name: QName, value: impl Into<String>) {
        let value = value.into();
        match self.attributes.iter_mut().find(|a| a.name == name) {
            Some(existing) => existing.value = value,
            None => self.attributes.push(Attribute { name, value }),
        }
    }

    /// Builder form of [`Element::set_attribute`].
    #[must_use]
    pub fn with_attribute(mut self, name: QName, value: impl Into<String>) -> Self {
        self.set_attribute(name, value);
        self
    }

    /// Append a child node.
    pub fn push(&mut self, node: Node) {
        self.children.push(node);
    }

    /// Append a child element.
    pub fn push_element(&mut self, element: Element) {
        self.children.push(Node::Element(Arc::new(element)));
    }

    /// Builder form of [`Element::push_element`].
    #[must_use]
    pub fn with_child(mut self, element: Element) -> Self {
        self.push_element(element);
        self
    }

    /// Builder form that appends a text node.
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.children.push(Node::Text(text.into()));
        self
    }

    /// Replace all children with a single text node.
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.children = vec![Node::Text(text.into())];
    }

    /// Iterate over child elements (skips text, comments, etc.).
    pub fn elements(&self) -> impl Iterator<Item = &Arc<Element>> {
        self.children.iter().filter_map(|child| match child {
            Node::Element(element) => Some(element),
            _ => None,
        })
    }

    /// Find the first child element with the given name.
    #[must_use]
    pub fn find_child(&self, name: &QName) -> Option<&Arc<Element>> {
        self.elements().find(|child| child.name() == name)
    }

    /// Find all child elements with the given name.
    pub fn find_children<'a>(
        &'a self,
        name: &'a QName,
    ) -> impl Iterator<Item = &'a Arc<Element>> + 'a {
        self.elements().filter(move |child| child.name() == name)
    }

    /// Mutable access to the first child element with the given name.
    pub fn find_child_mut(&mut self, name: &QName) -> Option<&mut Element> {
        self.children.iter_mut().find_map(|child| match child {
            Node::Element(element) if element.name() == name => Some(Arc::make_mut(element)),
            _ => None,
        })
    }

    /// Remove all child elements with the given name.
    pub fn remove_children(&mut self, name: &QName) {
        self.retain_elements(|child| child.name() != name);
    }

    /// Keep only the child elements for which `keep` returns true. Other
    /// nodes are left alone.
    pub fn retain_elements(&mut self, mut keep: impl FnMut(&Element) -> bool) {
        self.children.retain(|child| match child {
            Node::Element(element) => keep(element),
            _ => true,
        });
    }

    /// Direct text content, concatenated. Returns `None` when there is none.
    #[must_use]
    pub fn text(&self) -> Option<String> {
        let text: String = self
            .children
            .iter()
            .filter_map(|child| match child {
                Node::Text(text) => Some(text.as_str()),
                _ => None,
            })
            .collect();
        (!text.is_empty()).then_some(text)
    }

    /// All descendant text, concatenated in document order.
    #[must_use]
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        collect_text(self, &mut out);
        out
    }

    /// Trimmed text of the first child element with the given name.
    #[must_use]
    pub fn child_text(&self, name: &QName) -> Option<String> {
        self.find_child(name)
            .map(|child| child.text_content().trim().to_string())
    }

    /// Set the text of the first child element with the given name,
    /// appending the child when it does not exist.
    pub fn set_child_text(&mut self, name: &QName, text: impl Into<String>) {
        match self.find_child_mut(name) {
            Some(child) => child.set_text(text),
            None => self.push_element(Element::new(name.clone()).with_text(text)),
        }
    }
}

fn collect_text(element: &Element, out: &mut String) {
    for child in &element.children {
        match child {
            Node::Text(text) => out.push_str(text),
            Node::Element(child) => collect_text(child, out),
            Node::Comment(_) | Node::ProcessingInstruction { .. } => {}
        }
    }
}
