//! Atompub request processing.
//!
//! A request is resolved to a [`Target`], looked up in the [`HandlerTable`]
//! by target type and method, and handed to the handler, which talks to the
//! collection's adapter. Unknown targets and unsupported combinations are
//! 404; a method the table does not know for the target type is 405.

use std::collections::HashMap;
use std::sync::Arc;

use abdera_model::app;
use abdera_model::atom::{Entry, ENTRY_MEDIA_TYPE, FEED_MEDIA_TYPE};
use abdera_model::extension::control::{CATEGORIES_MEDIA_TYPE, SERVICE_MEDIA_TYPE};
use abdera_model::{Parser, ParserOptions};
use axum::http::{Method, StatusCode};

use crate::adapter::{AdapterContext, CollectionAdapter, MediaPart};
use crate::error::AdapterError;
use crate::multipart;
use crate::request::RequestContext;
use crate::response::{entity_tag_for, serialize, ResponseContext};
use crate::route::{RouteManager, TargetResolver};
use crate::target::{Target, TargetType};
use crate::workspace::WorkspaceManager;

/// Handler invoked for a resolved target.
pub type Handler = fn(&Provider, &RequestContext, &Target) -> ResponseContext;

/// What the handler table says about a `(target type, method)` pair.
#[derive(Clone, Copy)]
pub enum Dispatch {
    Handle(Handler),
    /// Deliberately unsupported; answered with 404.
    NotSupported,
}

impl std::fmt::Debug for Dispatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Handle(_) => f.write_str("Handle"),
            Self::NotSupported => f.write_str("NotSupported"),
        }
    }
}

const CANONICAL_METHODS: [Method; 5] = [Method::GET, Method::HEAD, Method::POST, Method::PUT, Method::DELETE];

/// Handlers keyed by target type and method.
#[derive(Debug, Clone, Default)]
pub struct HandlerTable {
    handlers: HashMap<(TargetType, Method), Dispatch>,
}

impl HandlerTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Service, collection, entry and media handling. Categories documents
    /// are not served.
    #[must_use]
    pub fn basic() -> Self {
        Self::new()
            .with(TargetType::Service, Method::GET, Dispatch::Handle(service))
            .with(TargetType::Service, Method::HEAD, Dispatch::Handle(service))
            .with(TargetType::Collection, Method::GET, Dispatch::Handle(collection_get))
            .with(TargetType::Collection, Method::HEAD, Dispatch::Handle(collection_get))
            .with(TargetType::Collection, Method::POST, Dispatch::Handle(collection_post))
            .with(TargetType::Entry, Method::GET, Dispatch::Handle(entry_get))
            .with(TargetType::Entry, Method::HEAD, Dispatch::Handle(entry_get))
            .with(TargetType::Entry, Method::PUT, Dispatch::Handle(entry_put))
            .with(TargetType::Entry, Method::DELETE, Dispatch::Handle(entry_delete))
            .with(TargetType::Media, Method::GET, Dispatch::Handle(media_get))
            .with(TargetType::Media, Method::HEAD, Dispatch::Handle(media_get))
            .with(TargetType::Categories, Method::GET, Dispatch::NotSupported)
            .with(TargetType::Categories, Method::HEAD, Dispatch::NotSupported)
    }

    /// [`HandlerTable::basic`] plus categories documents.
    #[must_use]
    pub fn standard() -> Self {
        Self::basic()
            .with(TargetType::Categories, Method::GET, Dispatch::Handle(categories_get))
            .with(TargetType::Categories, Method::HEAD, Dispatch::Handle(categories_get))
    }

    /// Register or replace an entry.
    #[must_use]
    pub fn with(mut self, target_type: TargetType, method: Method, dispatch: Dispatch) -> Self {
        self.handlers.insert((target_type, method), dispatch);
        self
    }

    #[must_use]
    pub fn dispatch(&self, target_type: TargetType, method: &Method) -> Option<Dispatch> {
        self.handlers.get(&(target_type, method.clone())).copied()
    }

    /// Methods with a handler for the target type, in canonical order.
    #[must_use]
    pub fn allowed(&self, target_type: TargetType) -> Vec<Method> {
        CANONICAL_METHODS
            .into_iter()
            .filter(|method| {
                matches!(
                    self.handlers.get(&(target_type, method.clone())),
                    Some(Dispatch::Handle(_))
                )
            })
            .collect()
    }
}

/// The request processor: routes, workspaces, handlers and the parser used
/// for request bodies.
#[derive(Clone)]
pub struct Provider {
    routes: RouteManager,
    workspaces: Arc<dyn WorkspaceManager>,
    handlers: HandlerTable,
    parser: Parser,
}

impl std::fmt::Debug for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Provider")
            .field("routes", &self.routes)
            .field("handlers", &self.handlers)
            .finish_non_exhaustive()
    }
}

impl Provider {
    /// A provider with the standard handler table and default parser.
    #[must_use]
    pub fn new(routes: RouteManager, workspaces: Arc<dyn WorkspaceManager>) -> Self {
        Self {
            routes,
            workspaces,
            handlers: HandlerTable::standard(),
            parser: Parser::default(),
        }
    }

    #[must_use]
    pub fn with_handlers(mut self, handlers: HandlerTable) -> Self {
        self.handlers = handlers;
        self
    }

    #[must_use]
    pub fn with_parser_options(mut self, options: ParserOptions) -> Self {
        self.parser = Parser::new(options);
        self
    }

    #[must_use]
    pub fn routes(&self) -> &RouteManager {
        &self.routes
    }

    #[must_use]
    pub fn workspaces(&self) -> &dyn WorkspaceManager {
        self.workspaces.as_ref()
    }

    #[must_use]
    pub fn handlers(&self) -> &HandlerTable {
        &self.handlers
    }

    /// Process one request to completion.
    #[must_use]
    pub fn process(&self, request: &RequestContext) -> ResponseContext {
        let method = request.method();
        let Some(target) = self.routes.resolve(method, request.uri()) else {
            tracing::debug!(%method, path = request.path(), status = 404, "No target");
            return ResponseContext::not_found();
        };
        let target_type = target.target_type();

        let response = match self.handlers.dispatch(target_type, method) {
            Some(Dispatch::Handle(handler)) => handler(self, request, &target),
            Some(Dispatch::NotSupported) => ResponseContext::not_found(),
            None => ResponseContext::method_not_allowed(self.handlers.allowed(target_type)),
        };

        tracing::debug!(
            %method,
            path = request.path(),
            %target_type,
            status = response.status().as_u16(),
            "Processed request"
        );
        response
    }

    fn parse_entry(&self, request: &RequestContext) -> Result<Entry, ResponseContext> {
        self.parser
            .parse(request.body(), None)
            .and_then(Entry::from_document)
            .map_err(|e| {
                tracing::debug!(error = %e, "Rejected request entry");
                ResponseContext::bad_request(e.to_string())
            })
    }
}

/// Look up the target's collection and run `handle` with its adapter.
fn with_collection(
    provider: &Provider,
    request: &RequestContext,
    target: &Target,
    handle: impl FnOnce(&dyn CollectionAdapter, &AdapterContext<'_>) -> ResponseContext,
) -> ResponseContext {
    let Some(name) = target.collection() else {
        return ResponseContext::not_found();
    };
    let Some(adapter) = provider.workspaces.collection(name) else {
        tracing::debug!(collection = name, "Unknown collection");
        return ResponseContext::not_found();
    };
    let slug = request.slug();
    let ctx = AdapterContext {
        collection: name,
        slug: slug.as_deref(),
        routes: &provider.routes,
    };
    handle(adapter.as_ref(), &ctx)
}

/// Like [`with_collection`], also requiring an entry name.
fn with_entry(
    provider: &Provider,
    request: &RequestContext,
    target: &Target,
    handle: impl FnOnce(&dyn CollectionAdapter, &AdapterContext<'_>, &str) -> ResponseContext,
) -> ResponseContext {
    let Some(id) = target.entry() else {
        return ResponseContext::not_found();
    };
    with_collection(provider, request, target, |adapter, ctx| handle(adapter, ctx, id))
}

fn adapter_error(ctx: &AdapterContext<'_>, error: &AdapterError) -> ResponseContext {
    match error {
        AdapterError::NotFound(_) => ResponseContext::not_found(),
        _ => {
            tracing::error!(collection = ctx.collection, error = %error, "Collection adapter failed");
            ResponseContext::server_error(error.to_string())
        }
    }
}

/// Attach the entry as body, with its entity tag and Last-Modified from
/// `updated`.
fn with_entry_body(response: ResponseContext, entry: Entry) -> ResponseContext {
    let updated = entry.updated().ok().flatten();
    let document = entry.into_document();
    let tag = entity_tag_for(&serialize(&document));
    let response = response.with_document(document, ENTRY_MEDIA_TYPE).with_entity_tag(tag);
    match updated {
        Some(updated) => response.with_last_modified(updated),
        None => response,
    }
}

fn entry_response(entry: Entry) -> ResponseContext {
    with_entry_body(ResponseContext::new(StatusCode::OK), entry)
}

/// 201 for a created entry, located at its edit link.
fn created_response(entry: Entry) -> ResponseContext {
    let Some(location) = entry.edit_link() else {
        tracing::error!("Created entry has no edit link");
        return ResponseContext::server_error("created entry has no edit link");
    };
    with_entry_body(ResponseContext::created(location), entry)
}

fn service(provider: &Provider, request: &RequestContext, _target: &Target) -> ResponseContext {
    let mut service = app::Service::new();
    for info in provider.workspaces.workspaces() {
        let mut workspace = app::Workspace::new(info.title.clone());
        for (name, adapter) in &info.collections {
            let ctx = AdapterContext {
                collection: name,
                slug: None,
                routes: &provider.routes,
            };
            let Some(href) = ctx.collection_url() else {
                continue;
            };
            let mut collection = adapter
                .accepts()
                .describe(app::Collection::new(href, adapter.title()));
            if let Some(categories) = adapter.categories() {
                collection = collection.with_categories(categories);
            }
            workspace = workspace.with_collection(collection);
        }
        service = service.with_workspace(workspace);
    }

    let document = service.into_document();
    let tag = provider
        .workspaces
        .entity_tag()
        .unwrap_or_else(|| entity_tag_for(&serialize(&document)));
    let mut response = ResponseContext::document(document, SERVICE_MEDIA_TYPE).with_entity_tag(tag);
    if let Some(modified) = provider.workspaces.last_modified() {
        response = response.with_last_modified(modified);
    }
    response.conditional(request)
}

fn collection_get(provider: &Provider, request: &RequestContext, target: &Target) -> ResponseContext {
    with_collection(provider, request, target, |adapter, ctx| match adapter.feed(ctx) {
        Ok(feed) => ResponseContext::document(feed.into_document(), FEED_MEDIA_TYPE),
        Err(e) => adapter_error(ctx, &e),
    })
}

fn collection_post(provider: &Provider, request: &RequestContext, target: &Target) -> ResponseContext {
    with_collection(provider, request, target, |adapter, ctx| {
        let accepts = adapter.accepts();
        let content_type = match request.parsed_content_type() {
            Ok(content_type) => content_type,
            Err(raw) => return ResponseContext::unsupported_media_type(format!("malformed Content-Type '{raw}'")),
        };
        let result = match content_type {
            None => match provider.parse_entry(request) {
                Ok(entry) => adapter.create_entry(ctx, entry),
                Err(response) => return response,
            },
            Some(media_type) if media_type.is_multipart_related() => {
                if !accepts.accepts_multipart() {
                    return ResponseContext::unsupported_media_type(
                        "multipart/related is not accepted by this collection",
                    );
                }
                match multipart::parse(&media_type, request.body(), accepts, provider.parser.options()) {
                    Ok(related) => adapter.create_media_entry(ctx, related.entry, related.media),
                    Err(e) => {
                        tracing::debug!(collection = ctx.collection, error = %e, "Rejected multipart/related post");
                        return ResponseContext::new(e.status()).with_text(e.to_string());
                    }
                }
            }
            Some(media_type) if media_type.is_atom_entry() => match provider.parse_entry(request) {
                Ok(entry) => adapter.create_entry(ctx, entry),
                Err(response) => return response,
            },
            Some(media_type) if media_type.is_atom() => {
                return ResponseContext::unsupported_media_type(format!("{media_type} is not an Atom entry"));
            }
            Some(media_type) => {
                if !accepts.accepts_media() {
                    tracing::debug!(collection = ctx.collection, %media_type, "Media posting not supported");
                    let allow = provider
                        .handlers
                        .allowed(TargetType::Collection)
                        .into_iter()
                        .filter(|method| *method != Method::POST)
                        .collect();
                    return ResponseContext::method_not_allowed(allow)
                        .with_text("Media posting is not supported by this collection");
                }
                if !accepts.matches_plain(&media_type) {
                    return ResponseContext::unsupported_media_type(format!(
                        "{} is not accepted by this collection",
                        media_type.essence()
                    ));
                }
                let content_type = media_type.to_string();
                adapter.create_media(ctx, MediaPart::new(content_type, request.body().to_vec()))
            }
        };

        match result {
            Ok(entry) => {
                tracing::info!(collection = ctx.collection, location = ?entry.edit_link(), "Created entry");
                created_response(entry)
            }
            Err(e) => adapter_error(ctx, &e),
        }
    })
}

fn entry_get(provider: &Provider, request: &RequestContext, target: &Target) -> ResponseContext {
    with_entry(provider, request, target, |adapter, ctx, id| match adapter.entry(ctx, id) {
        Ok(Some(entry)) => entry_response(entry).conditional(request),
        Ok(None) => ResponseContext::not_found(),
        Err(e) => adapter_error(ctx, &e),
    })
}

fn entry_put(provider: &Provider, request: &RequestContext, target: &Target) -> ResponseContext {
    with_entry(provider, request, target, |adapter, ctx, id| {
        match adapter.entry(ctx, id) {
            Ok(Some(_)) => {}
            Ok(None) => return ResponseContext::not_found(),
            Err(e) => return adapter_error(ctx, &e),
        }
        let is_entry = matches!(request.parsed_content_type(), Ok(Some(media_type)) if media_type.is_atom_entry());
        if !is_entry {
            return ResponseContext::unsupported_media_type("an Atom entry is required");
        }
        let entry = match provider.parse_entry(request) {
            Ok(entry) => entry,
            Err(response) => return response,
        };
        match adapter.update_entry(ctx, id, entry) {
            Ok(Some(entry)) => entry_response(entry),
            Ok(None) => ResponseContext::not_found(),
            Err(e) => adapter_error(ctx, &e),
        }
    })
}

fn entry_delete(provider: &Provider, request: &RequestContext, target: &Target) -> ResponseContext {
    with_entry(provider, request, target, |adapter, ctx, id| match adapter.delete_entry(ctx, id) {
        Ok(true) => {
            tracing::info!(collection = ctx.collection, entry = id, "Deleted entry");
            ResponseContext::no_content()
        }
        Ok(false) => ResponseContext::not_found(),
        Err(e) => adapter_error(ctx, &e),
    })
}

fn media_get(provider: &Provider, request: &RequestContext, target: &Target) -> ResponseContext {
    with_entry(provider, request, target, |adapter, ctx, id| match adapter.media(ctx, id) {
        Ok(Some(media)) => {
            let tag = entity_tag_for(&media.data);
            ResponseContext::new(StatusCode::OK)
                .with_media(media.data, &media.content_type)
                .with_entity_tag(tag)
                .conditional(request)
        }
        // A collection without media has no media resources.
        Ok(None) | Err(AdapterError::NotSupported(_)) => ResponseContext::not_found(),
        Err(e) => adapter_error(ctx, &e),
    })
}

fn categories_get(provider: &Provider, request: &RequestContext, target: &Target) -> ResponseContext {
    with_collection(provider, request, target, |adapter, _ctx| match adapter.categories() {
        Some(categories) => ResponseContext::document(categories.into_document(), CATEGORIES_MEDIA_TYPE),
        None => ResponseContext::not_found(),
    })
}
