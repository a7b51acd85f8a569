//! Abdera server - Atom Publishing Protocol request processing.
//!
//! Requests are routed to targets (service, collection, entry, media,
//! categories), dispatched through a handler table and served from
//! collection adapters.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use abdera_server::basic::InMemoryAdapter;
//! use abdera_server::processor::Provider;
//! use abdera_server::request::RequestContext;
//! use abdera_server::route::RouteManager;
//! use abdera_server::workspace::{DefaultWorkspaceManager, WorkspaceInfo};
//! use axum::http::{Method, StatusCode};
//!
//! let workspaces = DefaultWorkspaceManager::new().with_workspace(
//!     WorkspaceInfo::new("Main").with_collection("notes", Arc::new(InMemoryAdapter::new("Notes", "Ann"))),
//! );
//! let provider = Provider::new(RouteManager::standard("/").unwrap(), Arc::new(workspaces));
//!
//! let response = provider.process(&RequestContext::new(Method::GET, "/notes"));
//! assert_eq!(response.status(), StatusCode::OK);
//! ```
//!
//! # Architecture
//!
//! - [`route`]: Path templates and target resolution
//! - [`target`]: Resolved request targets
//! - [`processor`]: Handler table and the request processor
//! - [`adapter`]: Collection adapter trait and accept maps
//! - [`workspace`]: Workspace managers
//! - [`multipart`]: multipart/related media posts
//! - [`basic`]: In-memory collection adapter
//! - [`request`] / [`response`]: Transport-independent request and response
//! - [`mime`]: Media type parsing and matching
//! - [`config`]: YAML and environment configuration
//! - [`http`]: axum binding
//! - [`cli`]: Command-line interface

pub mod adapter;
pub mod basic;
pub mod cli;
pub mod config;
pub mod error;
pub mod http;
pub mod mime;
pub mod multipart;
pub mod processor;
pub mod request;
pub mod response;
pub mod route;
pub mod target;
pub mod workspace;

pub use error::{AdapterError, MultipartError, Result, ServerError};
pub use processor::Provider;
