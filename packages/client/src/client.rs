//! Blocking Atompub client.

use abdera_model::atom::{Entry, ENTRY_MEDIA_TYPE};
use abdera_model::{Document, Parser, ParserOptions, Writer, WriterOptions};
use reqwest::blocking::{Client, RequestBuilder};
use reqwest::header::{HeaderMap, CONTENT_LOCATION, CONTENT_TYPE, ETAG, IF_MATCH, IF_NONE_MATCH, LOCATION};
use reqwest::{Method, StatusCode};
use url::Url;

use crate::error::Result;
use crate::http::{create_client, send_with_retry, RetryPolicy};

/// A response with its body fully read.
#[derive(Debug, Clone)]
pub struct ClientResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl ClientResponse {
    fn header(&self, name: &reqwest::header::HeaderName) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }

    /// Parse the body as an Atom document.
    pub fn document(&self, options: &ParserOptions) -> Result<Document> {
        Ok(Parser::new(options.clone()).parse(&self.body, self.content_location())?)
    }

    /// Parse the body as an Atom entry.
    pub fn entry(&self, options: &ParserOptions) -> Result<Entry> {
        Ok(Entry::from_document(self.document(options)?)?)
    }

    #[must_use]
    pub fn entity_tag(&self) -> Option<&str> {
        self.header(&ETAG)
    }

    #[must_use]
    pub fn location(&self) -> Option<&str> {
        self.header(&LOCATION)
    }

    #[must_use]
    pub fn content_location(&self) -> Option<&str> {
        self.header(&CONTENT_LOCATION)
    }

    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.header(&CONTENT_TYPE)
    }
}

/// Client for one Atompub server.
///
/// Location headers can be passed back as paths. GET, HEAD, PUT and DELETE are
/// retried on transient failures, POST is sent once.
#[derive(Debug, Clone)]
pub struct AbderaClient {
    http: Client,
    base_url: Url,
    retry: RetryPolicy,
}

impl AbderaClient {
    /// Relative paths resolve against `base_url` as in RFC 3986, so give it a
    /// trailing `/` to resolve below it.
    pub fn new(base_url: &str) -> Result<Self> {
        Ok(Self {
            http: create_client()?,
            base_url: Url::parse(base_url)?,
            retry: RetryPolicy::default(),
        })
    }

    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Resolve a reference (a Location header, a path, a full URL) against
    /// the base URL.
    pub fn url(&self, reference: &str) -> Result<Url> {
        Ok(self.base_url.join(reference)?)
    }

    pub fn get(&self, path: &str) -> Result<ClientResponse> {
        self.send(Method::GET, path, self.retry, |request| request)
    }

    /// GET that the server may answer with 304 when `entity_tag` still
    /// matches.
    pub fn get_if_none_match(&self, path: &str, entity_tag: &str) -> Result<ClientResponse> {
        self.send(Method::GET, path, self.retry, |request| {
            request.header(IF_NONE_MATCH, entity_tag)
        })
    }

    pub fn head(&self, path: &str) -> Result<ClientResponse> {
        self.send(Method::HEAD, path, self.retry, |request| request)
    }

    /// POST an entry to a collection, with an optional Slug name hint.
    pub fn post_entry(&self, path: &str, entry: &Entry, slug: Option<&str>) -> Result<ClientResponse> {
        let body = serialize(entry);
        self.send(Method::POST, path, RetryPolicy::once(), |request| {
            with_slug(request, slug)
                .header(CONTENT_TYPE, ENTRY_MEDIA_TYPE)
                .body(body.clone())
        })
    }

    /// POST a media resource to a collection.
    pub fn post_media(
        &self,
        path: &str,
        content_type: &str,
        data: &[u8],
        slug: Option<&str>,
    ) -> Result<ClientResponse> {
        self.send(Method::POST, path, RetryPolicy::once(), |request| {
            with_slug(request, slug)
                .header(CONTENT_TYPE, content_type)
                .body(data.to_vec())
        })
    }

    /// PUT an entry, optionally only if it still has `entity_tag`.
    pub fn put(&self, path: &str, entry: &Entry, entity_tag: Option<&str>) -> Result<ClientResponse> {
        let body = serialize(entry);
        self.send(Method::PUT, path, self.retry, |request| {
            let request = request.header(CONTENT_TYPE, ENTRY_MEDIA_TYPE).body(body.clone());
            match entity_tag {
                Some(tag) => request.header(IF_MATCH, tag),
                None => request,
            }
        })
    }

    pub fn delete(&self, path: &str) -> Result<ClientResponse> {
        self.send(Method::DELETE, path, self.retry, |request| request)
    }

    fn send(
        &self,
        method: Method,
        path: &str,
        retry: RetryPolicy,
        decorate: impl Fn(RequestBuilder) -> RequestBuilder,
    ) -> Result<ClientResponse> {
        let url = self.url(path)?;
        tracing::debug!(%method, %url, "Sending request");

        let response = send_with_retry(retry, || decorate(self.http.request(method.clone(), url.clone())))?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes()?.to_vec();

        tracing::debug!(%method, %url, status = status.as_u16(), bytes = body.len(), "Received response");
        Ok(ClientResponse { status, headers, body })
    }
}

fn with_slug(request: RequestBuilder, slug: Option<&str>) -> RequestBuilder {
    match slug {
        Some(slug) => request.header("Slug", urlencoding::encode(slug).into_owned()),
        None => request,
    }
}

fn serialize(entry: &Entry) -> String {
    Writer::new(WriterOptions::default().with_declaration()).write_document(&entry.clone().into_document())
}
