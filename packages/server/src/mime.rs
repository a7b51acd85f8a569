//! Media type parsing and matching.
//!
//! Parses `type/subtype; name=value` headers, lowercasing the type, subtype
//! and parameter names. Quoted parameter values are unquoted.

use std::fmt;

pub const ATOM: &str = "application/atom+xml";
pub const MULTIPART_RELATED: &str = "multipart/related";

/// A parsed media type or media range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaType {
    kind: String,
    subtype: String,
    params: Vec<(String, String)>,
}

impl MediaType {
    /// Parse a Content-Type value. Returns `None` when it has no `/`.
    ///
    /// # Examples
    /// ```
    /// use abdera_server::mime::MediaType;
    ///
    /// let mt = MediaType::parse(r#"multipart/related; boundary="xyz"; type="application/atom+xml""#).unwrap();
    /// assert_eq!(mt.essence(), "multipart/related");
    /// assert_eq!(mt.param("boundary"), Some("xyz"));
    /// ```
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        let mut segments = split_params(value).into_iter();
        let essence = segments.next()?;
        let (kind, subtype) = essence.trim().split_once('/')?;
        let (kind, subtype) = (kind.trim(), subtype.trim());
        if kind.is_empty() || subtype.is_empty() {
            return None;
        }

        let params = segments
            .filter_map(|segment| {
                let (name, value) = segment.split_once('=')?;
                Some((name.trim().to_ascii_lowercase(), unquote(value.trim())))
            })
            .collect();

        Some(Self {
            kind: kind.to_ascii_lowercase(),
            subtype: subtype.to_ascii_lowercase(),
            params,
        })
    }

    /// `type/subtype` without parameters.
    #[must_use]
    pub fn essence(&self) -> String {
        format!("{}/{}", self.kind, self.subtype)
    }

    #[must_use]
    pub fn kind(&self) -> &str {
        &self.kind
    }

    #[must_use]
    pub fn subtype(&self) -> &str {
        &self.subtype
    }

    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// `application/atom+xml` with any parameters.
    #[must_use]
    pub fn is_atom(&self) -> bool {
        self.kind == "application" && self.subtype == "atom+xml"
    }

    /// An Atom entry: no `type` parameter, or `type=entry`.
    #[must_use]
    pub fn is_atom_entry(&self) -> bool {
        self.is_atom()
            && self
                .param("type")
                .is_none_or(|kind| kind.eq_ignore_ascii_case("entry"))
    }

    #[must_use]
    pub fn is_multipart_related(&self) -> bool {
        self.kind == "multipart" && self.subtype == "related"
    }

    /// Check whether this type falls within `range`, which may use `*/*` or
    /// `type/*`. Parameters of the range must be present with equal values.
    #[must_use]
    pub fn matches(&self, range: &MediaType) -> bool {
        let kind_matches = range.kind == "*" || range.kind == self.kind;
        let subtype_matches = range.subtype == "*" || range.subtype == self.subtype;
        kind_matches
            && subtype_matches
            && range.params.iter().all(|(name, value)| {
                self.param(name)
                    .is_some_and(|own| own.eq_ignore_ascii_case(value))
            })
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.kind, self.subtype)?;
        for (name, value) in &self.params {
            write!(f, ";{name}={value}")?;
        }
        Ok(())
    }
}

/// Split on `;` outside quoted strings.
fn split_params(value: &str) -> Vec<&str> {
    let mut segments = Vec::new();
    let mut in_quotes = false;
    let mut start = 0;
    for (index, c) in value.char_indices() {
        match c {
            '"' => in_quotes = !in_quotes,
            ';' if !in_quotes => {
                segments.push(&value[start..index]);
                start = index + 1;
            }
            _ => {}
        }
    }
    segments.push(&value[start..]);
    segments
}

fn unquote(value: &str) -> String {
    value
        .strip_prefix('"')
        .and_then(|inner| inner.strip_suffix('"'))
        .map_or_else(|| value.to_string(), |inner| inner.replace("\\\"", "\""))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mt(value: &str) -> MediaType {
        MediaType::parse(value).unwrap()
    }

    #[test]
    fn test_parse_params() {
        let media = mt(r#"Multipart/Related; Boundary="a;b"; start="<entry@x>" ; type=application/atom+xml"#);
        assert_eq!(media.essence(), "multipart/related");
        assert!(media.is_multipart_related());
        assert_eq!(media.param("boundary"), Some("a;b"));
        assert_eq!(media.param("start"), Some("<entry@x>"));
        assert_eq!(media.param("type"), Some("application/atom+xml"));
    }

    #[test]
    fn test_rejects_invalid() {
        assert!(MediaType::parse("").is_none());
        assert!(MediaType::parse("text").is_none());
        assert!(MediaType::parse("/plain").is_none());
    }

    #[test]
    fn test_atom_entry() {
        assert!(mt("application/atom+xml").is_atom_entry());
        assert!(mt("application/atom+xml;type=entry").is_atom_entry());
        assert!(!mt("application/atom+xml;type=feed").is_atom_entry());
        assert!(mt("application/atom+xml;type=feed").is_atom());
        assert!(!mt("application/xml").is_atom());
    }

    #[test]
    fn test_ranges() {
        let png = mt("image/png");
        assert!(png.matches(&mt("*/*")));
        assert!(png.matches(&mt("image/*")));
        assert!(png.matches(&mt("image/png")));
        assert!(!png.matches(&mt("image/jpeg")));
        assert!(!png.matches(&mt("text/*")));

        let entry = mt("application/atom+xml; type=entry");
        assert!(entry.matches(&mt("application/atom+xml;type=entry")));
        assert!(!mt("application/atom+xml").matches(&mt("application/atom+xml;type=entry")));
    }
}
