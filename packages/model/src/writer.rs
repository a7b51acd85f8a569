//! XML serialization of the element tree.
//!
//! Namespaces are declared on the first element that needs them. Elements
//! keep their own prefix, or use the default namespace when they have none.
//! Namespaced attributes always get a prefix, generated as `ns0`, `ns1`, ...
//! when the name does not carry a usable one.

use crate::document::Document;
use crate::element::{Element, Node};
use crate::qname::ns;

const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;

/// Output options.
#[derive(Debug, Clone, Default)]
pub struct WriterOptions {
    /// Emit `<?xml version="1.0" encoding="UTF-8"?>` first.
    pub xml_declaration: bool,
    /// Indent element-only content by this many spaces per level.
    pub indent: Option<usize>,
}

impl WriterOptions {
    #[must_use]
    pub fn with_declaration(mut self) -> Self {
        self.xml_declaration = true;
        self
    }

    #[must_use]
    pub fn pretty(mut self, indent: usize) -> Self {
        self.indent = Some(indent);
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct Writer {
    options: WriterOptions,
}

impl Writer {
    #[must_use]
    pub fn new(options: WriterOptions) -> Self {
        Self { options }
    }

    /// Serialize a document.
    #[must_use]
    pub fn write_document(&self, document: &Document) -> String {
        self.write_element(document.root())
    }

    /// Serialize an element as a standalone document.
    ///
    /// # Examples
    /// ```
    /// use abdera_model::writer::Writer;
    /// use abdera_model::{Element, QName};
    ///
    /// let entry = Element::new(QName::atom("entry"))
    ///     .with_child(Element::new(QName::atom("title")).with_text("Fish & Chips"));
    /// assert_eq!(
    ///     Writer::default().write_element(&entry),
    ///     r#"<entry xmlns="http://www.w3.org/2005/Atom"><title>Fish &amp; Chips</title></entry>"#
    /// );
    /// ```
    #[must_use]
    pub fn write_element(&self, element: &Element) -> String {
        let mut out = String::new();
        if self.options.xml_declaration {
            out.push_str(XML_DECLARATION);
            if self.options.indent.is_some() {
                out.push('\n');
            }
        }
        self.element(&mut out, element, &Scope::default(), 0);
        out
    }

    fn element(&self, out: &mut String, element: &Element, parent: &Scope<'_>, depth: usize) {
        let mut scope = Scope::child(parent);

        let tag = match element.namespace() {
            Some(ns::XML) => qualify("xml", element.name().local_name()),
            Some(namespace) => {
                let prefix = element.name().prefix().unwrap_or_default();
                if scope.resolve(prefix) != Some(namespace) {
                    scope.bind(prefix, namespace);
                }
                qualify(prefix, element.name().local_name())
            }
            None => {
                if scope.resolve("").is_some_and(|default| !default.is_empty()) {
                    scope.bind("", "");
                }
                element.name().local_name().to_string()
            }
        };

        let attributes: Vec<(String, &str)> = element
            .attributes()
            .iter()
            .map(|attribute| {
                let local = attribute.name.local_name();
                let name = match attribute.name.namespace() {
                    None => local.to_string(),
                    Some(ns::XML) => qualify("xml", local),
                    Some(namespace) => {
                        let prefix = scope.attribute_prefix(namespace, attribute.name.prefix());
                        qualify(&prefix, local)
                    }
                };
                (name, attribute.value.as_str())
            })
            .collect();

        out.push('<');
        out.push_str(&tag);
        for (prefix, namespace) in &scope.bindings {
            if prefix.is_empty() {
                out.push_str(" xmlns=\"");
            } else {
                out.push_str(" xmlns:");
                out.push_str(prefix);
                out.push_str("=\"");
            }
            escape_attribute(out, namespace);
            out.push('"');
        }
        for (name, value) in attributes {
            out.push(' ');
            out.push_str(&name);
            out.push_str("=\"");
            escape_attribute(out, value);
            out.push('"');
        }

        let children = element.children();
        if children.is_empty() {
            out.push_str("/>");
            return;
        }
        out.push('>');

        let indent = self
            .options
            .indent
            .filter(|_| !children.iter().any(|child| matches!(child, Node::Text(_))));

        for child in children {
            if let Some(width) = indent {
                newline(out, width * (depth + 1));
            }
            match child {
                Node::Element(child) => self.element(out, child, &scope, depth + 1),
                Node::Text(text) => escape_text(out, text),
                Node::Comment(text) => {
                    out.push_str("<!--");
                    out.push_str(text);
                    out.push_str("-->");
                }
                Node::ProcessingInstruction { target, value } => {
                    out.push_str("<?");
                    out.push_str(target);
                    if let Some(value) = value {
                        out.push(' ');
                        out.push_str(value);
                    }
                    out.push_str("?>");
                }
            }
        }
        if let Some(width) = indent {
            newline(out, width * depth);
        }

        out.push_str("</");
        out.push_str(&tag);
        out.push('>');
    }
}

/// Namespace bindings introduced by one element, chained to its ancestors.
#[derive(Default)]
struct Scope<'a> {
    parent: Option<&'a Scope<'a>>,
    bindings: Vec<(String, String)>,
}

impl<'a> Scope<'a> {
    fn child(parent: &'a Scope<'a>) -> Self {
        Self {
            parent: Some(parent),
            bindings: Vec::new(),
        }
    }

    fn resolve(&self, prefix: &str) -> Option<&str> {
        self.bindings
            .iter()
            .rev()
            .find(|(bound, _)| bound == prefix)
            .map(|(_, namespace)| namespace.as_str())
            .or_else(|| self.parent.and_then(|parent| parent.resolve(prefix)))
    }

    fn bind(&mut self, prefix: &str, namespace: &str) {
        self.bindings.push((prefix.to_string(), namespace.to_string()));
    }

    /// Pick a non-empty prefix for an attribute namespace, declaring it when
    /// needed.
    fn attribute_prefix(&mut self, namespace: &str, preferred: Option<&str>) -> String {
        if let Some(preferred) = preferred {
            match self.resolve(preferred) {
                Some(bound) if bound == namespace => return preferred.to_string(),
                None => {
                    self.bind(preferred, namespace);
                    return preferred.to_string();
                }
                Some(_) => {}
            }
        }

        if let Some(existing) = self.existing_prefix(namespace) {
            return existing;
        }

        let mut counter = 0usize;
        loop {
            let candidate = format!("ns{counter}");
            if self.resolve(&candidate).is_none() {
                self.bind(&candidate, namespace);
                return candidate;
            }
            counter += 1;
        }
    }

    fn existing_prefix(&self, namespace: &str) -> Option<String> {
        let mut current = Some(self);
        while let Some(scope) = current {
            let found = scope.bindings.iter().rev().find(|(prefix, bound)| {
                !prefix.is_empty() && bound == namespace && self.resolve(prefix) == Some(namespace)
            });
            if let Some((prefix, _)) = found {
                return Some(prefix.clone());
            }
            current = scope.parent;
        }
        None
    }
}

fn qualify(prefix: &str, local: &str) -> String {
    if prefix.is_empty() {
        local.to_string()
    } else {
        format!("{prefix}:{local}")
    }
}

fn newline(out: &mut String, width: usize) {
    out.push('\n');
    out.push_str(&" ".repeat(width));
}

fn escape_text(out: &mut String, text: &str) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
}

fn escape_attribute(out: &mut String, value: &str) {
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '"' => out.push_str("&quot;"),
            '\n' => out.push_str("&#10;"),
            '\t' => out.push_str("&#9;"),
            _ => out.push(c),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extension::thread::InReplyTo;
    use crate::parser::Parser;
    use crate::qname::QName;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_prefixed_children_declare_once() {
        let entry = Element::new(QName::atom("entry"))
            .with_child(InReplyTo::element_for("urn:uuid:0", None))
            .with_child(Element::new(QName::app("control")).with_child(Element::new(QName::app("draft")).with_text("yes")));

        assert_eq!(
            Writer::default().write_element(&entry),
            concat!(
                r#"<entry xmlns="http://www.w3.org/2005/Atom">"#,
                r#"<thr:in-reply-to xmlns:thr="http://purl.org/syndication/thread/1.0" ref="urn:uuid:0"/>"#,
                r#"<app:control xmlns:app="http://www.w3.org/2007/app"><app:draft>yes</app:draft></app:control>"#,
                "</entry>"
            )
        );
    }

    #[test]
    fn test_namespaced_attribute_gets_generated_prefix() {
        let element = Element::new(QName::atom("link"))
            .with_attribute(QName::local("href"), "/a?x=1&y=\"2\"")
            .with_attribute(QName::new("urn:x", "flag"), "on")
            .with_attribute(QName::new(ns::XML, "lang"), "en");

        assert_eq!(
            Writer::default().write_element(&element),
            r#"<link xmlns="http://www.w3.org/2005/Atom" xmlns:ns0="urn:x" href="/a?x=1&amp;y=&quot;2&quot;" ns0:flag="on" xml:lang="en"/>"#
        );
    }

    #[test]
    fn test_unqualified_child_resets_default_namespace() {
        let element = Element::new(QName::atom("content")).with_child(Element::new(QName::local("plain")));
        assert_eq!(
            Writer::default().write_element(&element),
            r#"<content xmlns="http://www.w3.org/2005/Atom"><plain xmlns=""/></content>"#
        );
    }

    #[test]
    fn test_pretty_output_with_declaration() {
        let feed = Element::new(QName::atom("feed"))
            .with_child(Element::new(QName::atom("title")).with_text("a < b"))
            .with_child(Element::new(QName::atom("entry")));
        let writer = Writer::new(WriterOptions::default().with_declaration().pretty(2));

        assert_eq!(
            writer.write_element(&feed),
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
             <feed xmlns=\"http://www.w3.org/2005/Atom\">\n  \
             <title>a &lt; b</title>\n  \
             <entry/>\n\
             </feed>"
        );
    }

    #[test]
    fn test_written_document_parses_back() {
        let source = r#"<entry xmlns="http://www.w3.org/2005/Atom" xmlns:g="http://www.georss.org/georss"><title type="html">&lt;b&gt;x&lt;/b&gt;</title><g:point>1 2</g:point></entry>"#;
        let parser = Parser::default();
        let original = parser.parse_str(source, None).unwrap();
        let written = Writer::default().write_document(&original);
        let reparsed = parser.parse_str(&written, None).unwrap();

        assert_eq!(written, source);
        assert_eq!(reparsed.root(), original.root());
    }
}
