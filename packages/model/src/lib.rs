//! Abdera object model.
//!
//! An owned, namespace-aware element tree for Atom and Atompub documents,
//! with a parser that applies [`filter::ParseFilter`]s while reading,
//! extension factories that resolve typed wrappers for vocabulary elements,
//! and a writer.
//!
//! ```
//! use abdera_model::atom::Entry;
//! use abdera_model::parser::Parser;
//!
//! let xml = r#"<entry xmlns="http://www.w3.org/2005/Atom"><title>Hello</title></entry>"#;
//! let entry = Entry::from_document(Parser::default().parse_str(xml, None).unwrap()).unwrap();
//! assert_eq!(entry.title().as_deref(), Some("Hello"));
//! ```

pub mod app;
pub mod atom;
pub mod document;
pub mod element;
pub mod error;
pub mod extension;
pub mod filter;
pub mod parser;
pub mod qname;
pub mod writer;

pub use document::Document;
pub use element::{Attribute, Element, Node};
pub use error::{FilterError, ModelError, Result, WrapperError};
pub use parser::{Parser, ParserOptions};
pub use qname::QName;
pub use writer::{Writer, WriterOptions};
