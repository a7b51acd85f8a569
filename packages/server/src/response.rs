//! Outgoing response context.

use abdera_model::{Document, Writer, WriterOptions};
use axum::http::{Method, StatusCode};
use chrono::{DateTime, SubsecRound, Utc};
use sha2::{Digest, Sha256};

use crate::request::RequestContext;

const TEXT_PLAIN: &str = "text/plain; charset=utf-8";

/// Response payload.
#[derive(Debug, Clone, Default)]
pub enum ResponseBody {
    #[default]
    Empty,
    Document(Document),
    Media(Vec<u8>),
    Text(String),
}

/// Transport-independent view of an HTTP response.
#[derive(Debug, Clone)]
pub struct ResponseContext {
    status: StatusCode,
    location: Option<String>,
    content_location: Option<String>,
    content_type: Option<String>,
    entity_tag: Option<String>,
    last_modified: Option<DateTime<Utc>>,
    allow: Vec<Method>,
    body: ResponseBody,
}

impl ResponseContext {
    #[must_use]
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            location: None,
            content_location: None,
            content_type: None,
            entity_tag: None,
            last_modified: None,
            allow: Vec::new(),
            body: ResponseBody::Empty,
        }
    }

    /// 200 with a document body.
    #[must_use]
    pub fn document(document: Document, content_type: &str) -> Self {
        Self::new(StatusCode::OK).with_document(document, content_type)
    }

    /// 201 pointing at the created resource.
    #[must_use]
    pub fn created(location: impl Into<String>) -> Self {
        let location = location.into();
        Self::new(StatusCode::CREATED)
            .with_content_location(location.clone())
            .with_location(location)
    }

    #[must_use]
    pub fn no_content() -> Self {
        Self::new(StatusCode::NO_CONTENT)
    }

    #[must_use]
    pub fn not_found() -> Self {
        Self::new(StatusCode::NOT_FOUND).with_text("Not Found")
    }

    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST).with_text(message)
    }

    /// 405 listing the allowed methods.
    #[must_use]
    pub fn method_not_allowed(allow: Vec<Method>) -> Self {
        let mut response = Self::new(StatusCode::METHOD_NOT_ALLOWED).with_text("Method Not Allowed");
        response.allow = allow;
        response
    }

    #[must_use]
    pub fn unsupported_media_type(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNSUPPORTED_MEDIA_TYPE).with_text(message)
    }

    #[must_use]
    pub fn server_error(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR).with_text(message)
    }

    #[must_use]
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    #[must_use]
    pub fn with_content_location(mut self, location: impl Into<String>) -> Self {
        self.content_location = Some(location.into());
        self
    }

    #[must_use]
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Set the entity tag, quoting it when needed.
    #[must_use]
    pub fn with_entity_tag(mut self, tag: impl Into<String>) -> Self {
        let tag = tag.into();
        self.entity_tag = Some(if tag.starts_with('"') || tag.starts_with("W/") {
            tag
        } else {
            format!("\"{tag}\"")
        });
        self
    }

    #[must_use]
    pub fn with_last_modified(mut self, date: DateTime<Utc>) -> Self {
        self.last_modified = Some(date.trunc_subsecs(0));
        self
    }

    #[must_use]
    pub fn with_document(mut self, document: Document, content_type: &str) -> Self {
        self.body = ResponseBody::Document(document);
        self.with_content_type(content_type)
    }

    #[must_use]
    pub fn with_media(mut self, data: Vec<u8>, content_type: &str) -> Self {
        self.body = ResponseBody::Media(data);
        self.with_content_type(content_type)
    }

    #[must_use]
    pub fn with_text(mut self, message: impl Into<String>) -> Self {
        self.body = ResponseBody::Text(message.into());
        self.with_content_type(TEXT_PLAIN)
    }

    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    #[must_use]
    pub fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }

    #[must_use]
    pub fn content_location(&self) -> Option<&str> {
        self.content_location.as_deref()
    }

    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    #[must_use]
    pub fn entity_tag(&self) -> Option<&str> {
        self.entity_tag.as_deref()
    }

    #[must_use]
    pub fn last_modified(&self) -> Option<DateTime<Utc>> {
        self.last_modified
    }

    #[must_use]
    pub fn allow(&self) -> &[Method] {
        &self.allow
    }

    #[must_use]
    pub fn body(&self) -> &ResponseBody {
        &self.body
    }

    /// Serialized body.
    #[must_use]
    pub fn body_bytes(&self) -> Vec<u8> {
        match &self.body {
            ResponseBody::Empty => Vec::new(),
            ResponseBody::Document(document) => serialize(document),
            ResponseBody::Media(data) => data.clone(),
            ResponseBody::Text(text) => text.clone().into_bytes(),
        }
    }

    /// Turn a successful read into 304 when the request's validators match.
    ///
    /// `If-None-Match` takes precedence over `If-Modified-Since`.
    #[must_use]
    pub fn conditional(self, request: &RequestContext) -> Self {
        if self.status != StatusCode::OK || !self.not_modified_for(request) {
            return self;
        }
        tracing::debug!(etag = ?self.entity_tag, "Validators match, not modified");
        Self {
            status: StatusCode::NOT_MODIFIED,
            body: ResponseBody::Empty,
            content_type: None,
            ..self
        }
    }

    fn not_modified_for(&self, request: &RequestContext) -> bool {
        let tags = request.if_none_match();
        if !tags.is_empty() {
            return tags.iter().any(|tag| {
                tag == "*" || self.entity_tag.as_deref().is_some_and(|own| own.trim_start_matches("W/") == tag)
            });
        }
        match (request.if_modified_since(), self.last_modified) {
            (Some(since), Some(modified)) => modified <= since,
            _ => false,
        }
    }
}

/// Serialize a document the way it is sent on the wire.
#[must_use]
pub fn serialize(document: &Document) -> Vec<u8> {
    Writer::new(WriterOptions::default().with_declaration())
        .write_document(document)
        .into_bytes()
}

/// Strong entity tag: quoted hex SHA-256 of the bytes.
#[must_use]
pub fn entity_tag_for(bytes: &[u8]) -> String {
    format!("\"{}\"", hex::encode(Sha256::digest(bytes)))
}

/// IMF-fixdate, as used by Last-Modified.
#[must_use]
pub fn http_date(date: &DateTime<Utc>) -> String {
    date.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use abdera_model::{Element, QName};
    use axum::http::header::{IF_MODIFIED_SINCE, IF_NONE_MATCH};
    use chrono::TimeZone;

    fn entry_response() -> ResponseContext {
        ResponseContext::document(Document::new(Element::new(QName::atom("entry"))), "application/atom+xml")
            .with_entity_tag("abc")
            .with_last_modified(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap())
    }

    #[test]
    fn test_body_bytes() {
        let body = String::from_utf8(entry_response().body_bytes()).unwrap();
        assert_eq!(
            body,
            r#"<?xml version="1.0" encoding="UTF-8"?><entry xmlns="http://www.w3.org/2005/Atom"/>"#
        );
    }

    #[test]
    fn test_entity_tag_is_stable_hex_digest() {
        let tag = entity_tag_for(b"hello");
        assert_eq!(
            tag,
            "\"2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824\""
        );
        assert_eq!(entry_response().entity_tag(), Some("\"abc\""));
    }

    #[test]
    fn test_if_none_match() {
        let request = RequestContext::new(Method::GET, "/").with_header(IF_NONE_MATCH, "\"abc\"");
        let response = entry_response().conditional(&request);
        assert_eq!(response.status(), StatusCode::NOT_MODIFIED);
        assert!(response.body_bytes().is_empty());
        assert_eq!(response.entity_tag(), Some("\"abc\""));

        let request = RequestContext::new(Method::GET, "/").with_header(IF_NONE_MATCH, "\"other\"");
        assert_eq!(entry_response().conditional(&request).status(), StatusCode::OK);
    }

    #[test]
    fn test_if_modified_since() {
        let fresh = RequestContext::new(Method::GET, "/").with_header(IF_MODIFIED_SINCE, "Mon, 01 Jan 2024 00:00:00 GMT");
        assert_eq!(entry_response().conditional(&fresh).status(), StatusCode::NOT_MODIFIED);

        let stale = RequestContext::new(Method::GET, "/").with_header(IF_MODIFIED_SINCE, "Sun, 31 Dec 2023 00:00:00 GMT");
        assert_eq!(entry_response().conditional(&stale).status(), StatusCode::OK);
    }

    #[test]
    fn test_errors_are_not_conditional() {
        let request = RequestContext::new(Method::GET, "/").with_header(IF_NONE_MATCH, "*");
        assert_eq!(ResponseContext::not_found().conditional(&request).status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_http_date() {
        let date = Utc.with_ymd_and_hms(1994, 11, 6, 8, 49, 37).unwrap();
        assert_eq!(http_date(&date), "Sun, 06 Nov 1994 08:49:37 GMT");
    }
}
