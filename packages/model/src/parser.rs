//! Filtered XML parser producing owned [`Document`]s.

use std::sync::Arc;

use roxmltree::NodeType;

use crate::document::{shared_default_factories, Document};
use crate::element::{Element, Node};
use crate::error::{ModelError, Result};
use crate::extension::ExtensionFactoryMap;
use crate::filter::{FilterOptions, ParseFilter};
use crate::qname::QName;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Options controlling a parse.
#[derive(Debug, Clone)]
pub struct ParserOptions {
    /// Filter deciding which elements and attributes are kept.
    pub filter: Option<Arc<dyn ParseFilter>>,
    /// Registry attached to parsed documents for wrapper resolution.
    pub factories: Arc<ExtensionFactoryMap>,
    /// Node-level flags used when no filter is set. A filter's own options
    /// take precedence.
    pub flags: FilterOptions,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self {
            filter: None,
            factories: shared_default_factories(),
            flags: FilterOptions::default(),
        }
    }
}

impl ParserOptions {
    #[must_use]
    pub fn with_filter(self, filter: impl ParseFilter + 'static) -> Self {
        self.with_shared_filter(Arc::new(filter))
    }

    #[must_use]
    pub fn with_shared_filter(mut self, filter: Arc<dyn ParseFilter>) -> Self {
        self.filter = Some(filter);
        self
    }

    #[must_use]
    pub fn with_factories(mut self, factories: Arc<ExtensionFactoryMap>) -> Self {
        self.factories = factories;
        self
    }

    #[must_use]
    pub fn ignore_comments(mut self, ignore: bool) -> Self {
        self.flags.ignore_comments = ignore;
        self
    }

    #[must_use]
    pub fn ignore_whitespace(mut self, ignore: bool) -> Self {
        self.flags.ignore_whitespace = ignore;
        self
    }

    #[must_use]
    pub fn ignore_processing_instructions(mut self, ignore: bool) -> Self {
        self.flags.ignore_processing_instructions = ignore;
        self
    }

    fn node_flags(&self) -> &FilterOptions {
        self.filter
            .as_deref()
            .map_or(&self.flags, |filter| filter.options())
    }
}

/// Parser that copies a `roxmltree` tree into the owned model, applying the
/// configured filter on the way.
#[derive(Debug, Clone, Default)]
pub struct Parser {
    options: ParserOptions,
}

impl Parser {
    /// Create a parser with the given options.
    #[must_use]
    pub fn new(options: ParserOptions) -> Self {
        Self { options }
    }

    #[must_use]
    pub fn options(&self) -> &ParserOptions {
        &self.options
    }

    /// Parse UTF-8 encoded bytes.
    ///
    /// # Errors
    /// Returns `Utf8` for non UTF-8 input, `XmlParse` for malformed XML,
    /// `Unacceptable` when a throwing filter rejects a node, and
    /// `EmptyDocument` when the root element is filtered out.
    pub fn parse(&self, input: &[u8], base: Option<&str>) -> Result<Document> {
        let input = input.strip_prefix(UTF8_BOM).unwrap_or(input);
        let text = std::str::from_utf8(input)?;
        self.parse_str(text, base)
    }

    /// Parse a string.
    ///
    /// # Examples
    /// ```
    /// use abdera_model::parser::Parser;
    /// use abdera_model::QName;
    ///
    /// let doc = Parser::default()
    ///     .parse_str(r#"<entry xmlns="http://www.w3.org/2005/Atom"><title>Hi</title></entry>"#, None)
    ///     .unwrap();
    /// assert_eq!(doc.root().child_text(&QName::atom("title")).as_deref(), Some("Hi"));
    /// ```
    pub fn parse_str(&self, input: &str, base: Option<&str>) -> Result<Document> {
        let tree = roxmltree::Document::parse(input)?;
        let root = self
            .convert(tree.root_element())?
            .ok_or(ModelError::EmptyDocument)?;

        tracing::debug!(root = %root.name(), "Parsed document");

        let mut document = Document::new(root).with_factories(Arc::clone(&self.options.factories));
        if let Some(base) = base {
            document = document.with_base(base);
        }
        Ok(document)
    }

    /// Convert an element and its accepted descendants.
    ///
    /// Returns `None` when the filter rejects the element; its subtree is
    /// dropped with it.
    fn convert(&self, node: roxmltree::Node<'_, '_>) -> Result<Option<Element>> {
        let name = qualified_name(node, node.tag_name().namespace(), node.tag_name().name());

        if let Some(filter) = &self.options.filter {
            if !filter.check(&name)? {
                tracing::trace!(element = %name, "Element rejected by filter");
                return Ok(None);
            }
        }

        let mut element = Element::new(name);

        for attribute in node.attributes() {
            let attribute_name = qualified_name(node, attribute.namespace(), attribute.name());
            if let Some(filter) = &self.options.filter {
                if !filter.check_attribute(element.name(), &attribute_name)? {
                    tracing::trace!(
                        element = %element.name(),
                        attribute = %attribute_name,
                        "Attribute rejected by filter"
                    );
                    continue;
                }
            }
            element.set_attribute(attribute_name, attribute.value());
        }

        let flags = *self.options.node_flags();
        for child in node.children() {
            match child.node_type() {
                NodeType::Element => {
                    if let Some(converted) = self.convert(child)? {
                        element.push_element(converted);
                    }
                }
                NodeType::Text => {
                    let text = child.text().unwrap_or_default();
                    if flags.ignore_whitespace && text.trim().is_empty() {
                        continue;
                    }
                    element.push(Node::Text(text.to_string()));
                }
                NodeType::Comment => {
                    if !flags.ignore_comments {
                        element.push(Node::Comment(child.text().unwrap_or_default().to_string()));
                    }
                }
                NodeType::PI => {
                    if let (false, Some(pi)) = (flags.ignore_processing_instructions, child.pi()) {
                        element.push(Node::ProcessingInstruction {
                            target: pi.target.to_string(),
                            value: pi.value.map(str::to_string),
                        });
                    }
                }
                NodeType::Root => {}
            }
        }

        Ok(Some(element))
    }
}

/// Build a name, keeping the prefix the document used for its namespace.
fn qualified_name(node: roxmltree::Node<'_, '_>, namespace: Option<&str>, local: &str) -> QName {
    match namespace {
        Some(namespace) => {
            let name = QName::new(namespace, local);
            match node.lookup_prefix(namespace) {
                Some(prefix) => name.with_prefix(prefix),
                None => name,
            }
        }
        None => QName::local(local),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extension::thread::{self, InReplyTo};
    use crate::filter::{CompoundParseFilter, CompoundPolicy, SetParseFilter};
    use crate::qname::ns;

    const ENTRY: &str = r#"<?xml version="1.0"?>
<entry xmlns="http://www.w3.org/2005/Atom" xmlns:thr="http://purl.org/syndication/thread/1.0">
  <!-- generated -->
  <id>urn:uuid:1</id>
  <title type="text">Hello</title>
  <link rel="edit" href="/entries/1" onclick="evil()"/>
  <thr:in-reply-to ref="urn:uuid:0"/>
  <content type="xhtml"><div xmlns="http://www.w3.org/1999/xhtml"><script>x</script>Body</div></content>
</entry>"#;

    #[test]
    fn test_parse_without_filter() {
        let doc = Parser::default().parse_str(ENTRY, Some("http://example.org/")).unwrap();
        let root = doc.root();

        assert_eq!(root.name(), &QName::atom("entry"));
        assert_eq!(root.child_text(&QName::atom("title")), Some("Hello".to_string()));
        assert_eq!(doc.base(), Some("http://example.org/"));
        // Whitespace and comments are dropped by default.
        assert!(root.children().iter().all(|c| matches!(c, Node::Element(_))));
    }

    #[test]
    fn test_prefix_is_kept() {
        let doc = Parser::default().parse_str(ENTRY, None).unwrap();
        let reply = doc.root().find_child(&thread::in_reply_to()).unwrap();
        assert_eq!(reply.name().prefix(), Some("thr"));
    }

    #[test]
    fn test_extension_resolution_on_parsed_document() {
        let doc = Parser::default().parse_str(ENTRY, None).unwrap();
        let reply = doc.root().find_child(&thread::in_reply_to()).unwrap();
        let extension = doc.extension(reply);
        assert_eq!(extension.downcast_ref::<InReplyTo>().unwrap().reference(), "urn:uuid:0");
    }

    #[test]
    fn test_blacklist_drops_subtree_and_attribute() {
        let link = QName::atom("link");
        let filter = SetParseFilter::blacklist()
            .add(QName::new("http://www.w3.org/1999/xhtml", "script"))
            .add_attribute(link.clone(), QName::local("onclick"))
            .build();
        let parser = Parser::new(ParserOptions::default().with_filter(filter));
        let doc = parser.parse_str(ENTRY, None).unwrap();

        let content = doc.root().find_child(&QName::atom("content")).unwrap();
        assert_eq!(content.text_content(), "Body");

        let link = doc.root().find_child(&link).unwrap();
        assert_eq!(link.attr("href"), Some("/entries/1"));
        assert_eq!(link.attr("onclick"), None);
    }

    #[test]
    fn test_whitelist_keeps_only_listed() {
        let filter = SetParseFilter::whitelist()
            .add(QName::atom("entry"))
            .add(QName::atom("title"))
            .build();
        let doc = Parser::new(ParserOptions::default().with_filter(filter))
            .parse_str(ENTRY, None)
            .unwrap();

        let names: Vec<_> = doc.root().elements().map(|e| e.name().local_name().to_string()).collect();
        assert_eq!(names, ["title"]);
    }

    #[test]
    fn test_throwing_filter_aborts_parse() {
        let filter = SetParseFilter::blacklist()
            .add(QName::atom("link"))
            .throw_on_unacceptable()
            .build();
        let err = Parser::new(ParserOptions::default().with_filter(filter))
            .parse_str(ENTRY, None)
            .unwrap_err();

        match err {
            ModelError::Unacceptable(u) => assert_eq!(u.qname(), &QName::atom("link")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_rejected_root_is_empty_document() {
        let filter = CompoundParseFilter::builder(CompoundPolicy::AcceptableToAll)
            .add(SetParseFilter::blacklist().add(QName::atom("entry")).build())
            .build()
            .unwrap();
        let err = Parser::new(ParserOptions::default().with_filter(filter))
            .parse_str(ENTRY, None)
            .unwrap_err();
        assert!(matches!(err, ModelError::EmptyDocument));
    }

    #[test]
    fn test_keep_comments_and_whitespace() {
        let filter = SetParseFilter::blacklist()
            .ignore_comments(false)
            .ignore_whitespace(false)
            .build();
        let doc = Parser::new(ParserOptions::default().with_filter(filter))
            .parse_str(ENTRY, None)
            .unwrap();

        let children = doc.root().children();
        assert!(children.iter().any(|c| matches!(c, Node::Comment(text) if text.trim() == "generated")));
        assert!(children.iter().any(|c| matches!(c, Node::Text(text) if text.trim().is_empty())));
    }

    #[test]
    fn test_processing_instructions() {
        let xml = r#"<root><?render fast?></root>"#;
        let kept = Parser::new(ParserOptions::default().ignore_processing_instructions(false))
            .parse_str(xml, None)
            .unwrap();
        assert_eq!(
            kept.root().children(),
            [Node::ProcessingInstruction {
                target: "render".to_string(),
                value: Some("fast".to_string()),
            }]
        );

        let dropped = Parser::default().parse_str(xml, None).unwrap();
        assert!(dropped.root().children().is_empty());
    }

    #[test]
    fn test_parse_bytes_with_bom() {
        let mut bytes = UTF8_BOM.to_vec();
        bytes.extend_from_slice(b"<feed xmlns=\"http://www.w3.org/2005/Atom\"/>");
        let doc = Parser::default().parse(&bytes, None).unwrap();
        assert!(doc.root().name().is(ns::ATOM, "feed"));
    }

    #[test]
    fn test_invalid_input() {
        assert!(matches!(
            Parser::default().parse(b"\xff\xfe<a/>", None),
            Err(ModelError::Utf8(_))
        ));
        assert!(matches!(
            Parser::default().parse_str("<a>", None),
            Err(ModelError::XmlParse(_))
        ));
    }
}
