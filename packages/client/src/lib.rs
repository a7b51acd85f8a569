//! Abdera client - blocking access to Atompub servers.
//!
//! # Example
//!
//! ```no_run
//! use abdera_client::AbderaClient;
//! use abdera_model::atom::Entry;
//!
//! let client = AbderaClient::new("http://localhost:8080").unwrap();
//! let created = client
//!     .post_entry("/entries", &Entry::new().with_title("Hello"), Some("hello"))
//!     .unwrap();
//! println!("created at {:?}", created.location());
//! ```
//!
//! - [`client`]: The client and its responses
//! - [`http`]: Transport and retry policy
//! - [`error`]: Error types and Result alias

pub mod client;
pub mod error;
pub mod http;

pub use client::{AbderaClient, ClientResponse};
pub use error::{ClientError, Result};
pub use http::RetryPolicy;
