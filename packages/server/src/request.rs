//! Incoming request context.

use axum::http::header::{CONTENT_TYPE, IF_MODIFIED_SINCE, IF_NONE_MATCH};
use axum::http::{HeaderMap, HeaderName, HeaderValue, Method};
use chrono::{DateTime, Utc};

use crate::mime::MediaType;

/// `Slug` request header (RFC 5023).
pub const SLUG: HeaderName = HeaderName::from_static("slug");

/// Transport-independent view of an HTTP request.
#[derive(Debug, Clone)]
pub struct RequestContext {
    method: Method,
    uri: String,
    headers: HeaderMap,
    body: Vec<u8>,
}

impl RequestContext {
    #[must_use]
    pub fn new(method: Method, uri: impl Into<String>) -> Self {
        Self {
            method,
            uri: uri.into(),
            headers: HeaderMap::new(),
            body: Vec::new(),
        }
    }

    /// Add a header. Values that are not valid header text are skipped.
    #[must_use]
    pub fn with_header(mut self, name: HeaderName, value: &str) -> Self {
        match HeaderValue::from_str(value) {
            Ok(value) => {
                self.headers.append(name, value);
            }
            Err(e) => tracing::warn!(header = %name, error = %e, "Skipping invalid header value"),
        }
        self
    }

    #[must_use]
    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    #[must_use]
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Request target as received, including any query string.
    #[must_use]
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// Path without the query string.
    #[must_use]
    pub fn path(&self) -> &str {
        self.uri.split_once('?').map_or(self.uri.as_str(), |(path, _)| path)
    }

    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    #[must_use]
    pub fn header(&self, name: &HeaderName) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }

    #[must_use]
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    #[must_use]
    pub fn has_body(&self) -> bool {
        !self.body.is_empty()
    }

    /// Parsed Content-Type, if present and well formed.
    #[must_use]
    pub fn content_type(&self) -> Option<MediaType> {
        self.header(&CONTENT_TYPE).and_then(MediaType::parse)
    }

    /// Content-Type as sent: `Ok(None)` when absent, `Err` with the raw value
    /// when present but not a media type.
    pub fn parsed_content_type(&self) -> Result<Option<MediaType>, String> {
        let Some(value) = self.headers.get(CONTENT_TYPE) else {
            return Ok(None);
        };
        let raw = String::from_utf8_lossy(value.as_bytes());
        match MediaType::parse(&raw) {
            Some(media_type) => Ok(Some(media_type)),
            None => Err(raw.into_owned()),
        }
    }

    /// Decoded `Slug` header.
    #[must_use]
    pub fn slug(&self) -> Option<String> {
        let raw = self.header(&SLUG)?.trim();
        if raw.is_empty() {
            return None;
        }
        Some(urlencoding::decode(raw).map_or_else(|_| raw.to_string(), |slug| slug.into_owned()))
    }

    /// Entity tags listed in `If-None-Match`.
    #[must_use]
    pub fn if_none_match(&self) -> Vec<String> {
        self.header(&IF_NONE_MATCH)
            .map(|value| {
                value
                    .split(',')
                    .map(|tag| tag.trim().trim_start_matches("W/").to_string())
                    .filter(|tag| !tag.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// `If-Modified-Since`, ignored when unparseable.
    #[must_use]
    pub fn if_modified_since(&self) -> Option<DateTime<Utc>> {
        let value = self.header(&IF_MODIFIED_SINCE)?;
        DateTime::parse_from_rfc2822(value)
            .ok()
            .map(|date| date.with_timezone(&Utc))
    }
}
