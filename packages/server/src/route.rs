//! Template routes mapping request paths to targets.
//!
//! A template such as `/:collection/:entry;media` is a sequence of literal
//! text and `:name` parameters. Parameters match one path segment, stopping
//! at `/`, `;` and `?`. Routes are tried in registration order.

use std::collections::BTreeMap;

use axum::http::Method;
use regex::Regex;

use crate::error::{Result, ServerError};
use crate::target::{Target, TargetType};

/// Names of the routes registered by [`RouteManager::standard`].
pub mod names {
    pub const SERVICE: &str = "service";
    pub const COLLECTION: &str = "collection";
    pub const CATEGORIES: &str = "categories";
    pub const ENTRY: &str = "entry";
    pub const MEDIA: &str = "media";
}

/// Resolves a request to a target.
pub trait TargetResolver: Send + Sync {
    /// Resolve a request path (query string allowed) to a target, or `None`
    /// when nothing matches.
    fn resolve(&self, method: &Method, path: &str) -> Option<Target>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param(String),
}

/// A named, compiled path template.
#[derive(Debug, Clone)]
pub struct Route {
    name: String,
    template: String,
    segments: Vec<Segment>,
    regex: Regex,
}

impl Route {
    /// Compile a template.
    ///
    /// # Errors
    /// Returns `InvalidRoute` when the template does not compile, for
    /// example when a parameter name is repeated.
    pub fn new(name: impl Into<String>, template: impl Into<String>) -> Result<Self> {
        let template = template.into();
        let segments = tokenize(&template);

        let mut pattern = String::from("^");
        for segment in &segments {
            match segment {
                Segment::Literal(text) => pattern.push_str(&regex::escape(text)),
                Segment::Param(param) => {
                    pattern.push_str(&format!("(?P<{param}>[^/;?]+)"));
                }
            }
        }
        pattern.push('$');

        let regex = Regex::new(&pattern).map_err(|source| ServerError::InvalidRoute {
            template: template.clone(),
            source,
        })?;

        Ok(Self {
            name: name.into(),
            template,
            segments,
            regex,
        })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Match a path without query string, returning the decoded parameters.
    #[must_use]
    pub fn matches(&self, path: &str) -> Option<BTreeMap<String, String>> {
        let captures = self.regex.captures(path)?;
        let params = self
            .regex
            .capture_names()
            .flatten()
            .filter_map(|param| {
                let raw = captures.name(param)?.as_str();
                let value = urlencoding::decode(raw).map_or_else(|_| raw.to_string(), |v| v.into_owned());
                Some((param.to_string(), value))
            })
            .collect();
        Some(params)
    }

    /// Expand the template with the given parameters, percent-encoding their
    /// values. Returns `None` when a parameter is missing.
    #[must_use]
    pub fn expand(&self, params: &[(&str, &str)]) -> Option<String> {
        let mut path = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => path.push_str(text),
                Segment::Param(param) => {
                    let (_, value) = params.iter().find(|(name, _)| *name == param.as_str())?;
                    path.push_str(&urlencoding::encode(value));
                }
            }
        }
        Some(path)
    }
}

fn tokenize(template: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut literal = String::new();
    let mut chars = template.chars().peekable();

    while let Some(c) = chars.next() {
        if c == ':' && chars.peek().is_some_and(|next| next.is_ascii_alphabetic() || *next == '_') {
            if !literal.is_empty() {
                segments.push(Segment::Literal(std::mem::take(&mut literal)));
            }
            let mut param = String::new();
            while let Some(&next) = chars.peek() {
                if next.is_ascii_alphanumeric() || next == '_' {
                    param.push(next);
                    chars.next();
                } else {
                    break;
                }
            }
            segments.push(Segment::Param(param));
        } else {
            literal.push(c);
        }
    }
    if !literal.is_empty() {
        segments.push(Segment::Literal(literal));
    }
    segments
}

/// Ordered list of routes under a base path.
#[derive(Debug, Clone, Default)]
pub struct RouteManager {
    base_path: String,
    routes: Vec<(Route, TargetType)>,
}

impl RouteManager {
    /// Create an empty manager. `base_path` is prefixed to every template;
    /// `/` and the empty string both mean the server root.
    #[must_use]
    pub fn new(base_path: &str) -> Self {
        Self {
            base_path: base_path.trim_end_matches('/').to_string(),
            routes: Vec::new(),
        }
    }

    /// Routes for service, categories, collection, media and entry targets.
    ///
    /// # Examples
    /// ```
    /// use abdera_server::route::{RouteManager, TargetResolver};
    /// use abdera_server::target::TargetType;
    /// use axum::http::Method;
    ///
    /// let routes = RouteManager::standard("/atom").unwrap();
    /// let target = routes.resolve(&Method::GET, "/atom/notes/first;media").unwrap();
    /// assert_eq!(target.target_type(), TargetType::Media);
    /// assert_eq!(target.entry(), Some("first"));
    /// ```
    pub fn standard(base_path: &str) -> Result<Self> {
        Self::new(base_path)
            .add_route(names::SERVICE, "/", TargetType::Service)?
            .add_route(names::CATEGORIES, "/:collection;categories", TargetType::Categories)?
            .add_route(names::COLLECTION, "/:collection", TargetType::Collection)?
            .add_route(names::MEDIA, "/:collection/:entry;media", TargetType::Media)?
            .add_route(names::ENTRY, "/:collection/:entry", TargetType::Entry)
    }

    /// Append a route.
    pub fn add_route(mut self, name: &str, template: &str, target_type: TargetType) -> Result<Self> {
        let route = Route::new(name, format!("{}{template}", self.base_path))?;
        tracing::debug!(route = name, template = route.template(), %target_type, "Registered route");
        self.routes.push((route, target_type));
        Ok(self)
    }

    #[must_use]
    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    #[must_use]
    pub fn route(&self, name: &str) -> Option<&Route> {
        self.routes
            .iter()
            .map(|(route, _)| route)
            .find(|route| route.name() == name)
    }

    /// Build the path of a named route.
    #[must_use]
    pub fn url_for(&self, name: &str, params: &[(&str, &str)]) -> Option<String> {
        self.route(name)?.expand(params)
    }
}

impl TargetResolver for RouteManager {
    fn resolve(&self, method: &Method, path: &str) -> Option<Target> {
        let path = path.split_once('?').map_or(path, |(path, _)| path);
        let found = self.routes.iter().find_map(|(route, target_type)| {
            route
                .matches(path)
                .map(|params| Target::new(*target_type, params))
        });
        if found.is_none() {
            tracing::debug!(%method, path, "No route matched");
        }
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn routes() -> RouteManager {
        RouteManager::standard("/").unwrap()
    }

    #[test]
    fn test_resolve_standard_routes() {
        let routes = routes();
        let cases = [
            ("/", TargetType::Service),
            ("/notes", TargetType::Collection),
            ("/notes;categories", TargetType::Categories),
            ("/notes/first", TargetType::Entry),
            ("/notes/first;media", TargetType::Media),
        ];
        for (path, expected) in cases {
            let target = routes.resolve(&Method::GET, path).unwrap();
            assert_eq!(target.target_type(), expected, "{path}");
        }
        assert!(routes.resolve(&Method::GET, "/notes/first/extra").is_none());
    }

    #[test]
    fn test_query_string_ignored() {
        let target = routes().resolve(&Method::GET, "/notes/first?page=2").unwrap();
        assert_eq!(target.entry(), Some("first"));
    }

    #[test]
    fn test_decoded_params_and_url_for() {
        let routes = RouteManager::standard("/atom/").unwrap();
        let path = routes
            .url_for(names::ENTRY, &[("collection", "notes"), ("entry", "hello world")])
            .unwrap();
        assert_eq!(path, "/atom/notes/hello%20world");

        let target = routes.resolve(&Method::GET, &path).unwrap();
        assert_eq!(target.entry(), Some("hello world"));

        assert_eq!(routes.url_for(names::ENTRY, &[("collection", "notes")]), None);
        assert_eq!(routes.url_for("missing", &[]), None);
    }

    #[test]
    fn test_resolve_is_idempotent() {
        let routes = routes();
        let first = routes.resolve(&Method::PUT, "/notes/first");
        let second = routes.resolve(&Method::PUT, "/notes/first");
        assert_eq!(first, second);
    }

    #[test]
    fn test_duplicate_param_is_invalid() {
        let err = Route::new("bad", "/:a/:a").unwrap_err();
        assert!(matches!(err, ServerError::InvalidRoute { .. }));
    }

    #[test]
    fn test_tokenize_keeps_port_like_colons() {
        assert_eq!(
            tokenize("/a:1/:b"),
            [Segment::Literal("/a:1/".to_string()), Segment::Param("b".to_string())]
        );
    }
}
