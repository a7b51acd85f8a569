//! Splitting of multipart/related media posts (RFC 5023 media link entry
//! plus media resource in a single request).
//!
//! The Content-Type carries `boundary`, `type` (must be Atom) and an optional
//! `start` naming the root part by Content-ID. The entry part is the `start`
//! part when that part is Atom, otherwise the first Atom part. The first
//! remaining part is the media; its body is base64 unless the part declares a
//! binary-safe Content-Transfer-Encoding.

use abdera_model::atom::Entry;
use abdera_model::{Parser, ParserOptions};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::adapter::{AcceptMap, MediaPart};
use crate::error::MultipartError;
use crate::mime::MediaType;

const IDENTITY_ENCODINGS: [&str; 3] = ["binary", "8bit", "7bit"];

/// MIME headers of one part.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartHeaders {
    pub content_type: Option<String>,
    pub content_id: Option<String>,
    pub transfer_encoding: Option<String>,
}

impl PartHeaders {
    fn media_type(&self) -> Option<MediaType> {
        self.content_type.as_deref().and_then(MediaType::parse)
    }

    fn is_atom(&self) -> bool {
        self.media_type().is_some_and(|media_type| media_type.is_atom())
    }

    /// Content-ID without angle brackets.
    fn bare_content_id(&self) -> Option<&str> {
        self.content_id.as_deref().map(strip_angle_brackets)
    }
}

#[derive(Debug)]
struct Part<'a> {
    headers: PartHeaders,
    body: &'a [u8],
}

/// A split multipart/related request.
#[derive(Debug)]
pub struct MultipartRelated {
    pub entry: Entry,
    pub media: MediaPart,
    /// Headers of every part, in request order.
    pub parts: Vec<PartHeaders>,
}

/// Split a multipart/related body into its entry and media parts.
///
/// # Errors
/// Returns a [`MultipartError`]; its `status()` is 415 when the media type is
/// not accepted for multipart posts and 400 otherwise.
pub fn parse(
    content_type: &MediaType,
    body: &[u8],
    accepts: &AcceptMap,
    options: &ParserOptions,
) -> Result<MultipartRelated, MultipartError> {
    let boundary = content_type
        .param("boundary")
        .filter(|boundary| !boundary.is_empty())
        .ok_or(MultipartError::MissingBoundary)?;

    let kind = content_type.param("type").ok_or(MultipartError::MissingType)?;
    if !MediaType::parse(kind).is_some_and(|kind| kind.is_atom()) {
        return Err(MultipartError::NotAtom(kind.to_string()));
    }

    let parts = split(body, boundary);
    if parts.is_empty() {
        return Err(MultipartError::NoParts);
    }
    tracing::debug!(parts = parts.len(), boundary, "Split multipart/related body");

    let start = content_type.param("start").map(strip_angle_brackets);
    let entry_index = start
        .and_then(|start| {
            parts
                .iter()
                .position(|part| part.headers.bare_content_id() == Some(start) && part.headers.is_atom())
        })
        .or_else(|| parts.iter().position(|part| part.headers.is_atom()))
        .ok_or(MultipartError::MissingEntry)?;

    let (data_index, data) = parts
        .iter()
        .enumerate()
        .find(|(index, _)| *index != entry_index)
        .ok_or(MultipartError::MissingData)?;
    let data_type = data
        .headers
        .media_type()
        .ok_or(MultipartError::MissingContentType)?;

    if !accepts.matches_multipart(&data_type) {
        return Err(MultipartError::UnsupportedMediaType(data_type.essence()));
    }

    let media = MediaPart {
        content_type: data.headers.content_type.clone().unwrap_or_default(),
        content_id: data.headers.bare_content_id().map(str::to_string),
        data: decode(&data.headers, data.body)?,
    };

    let document = Parser::new(options.clone()).parse(parts[entry_index].body, None)?;
    let entry = Entry::from_document(document)?;

    tracing::debug!(entry_index, data_index, media_type = %data_type, "Resolved multipart parts");

    Ok(MultipartRelated {
        entry,
        media,
        parts: parts.into_iter().map(|part| part.headers).collect(),
    })
}

fn decode(headers: &PartHeaders, body: &[u8]) -> Result<Vec<u8>, MultipartError> {
    let identity = headers.transfer_encoding.as_deref().is_some_and(|encoding| {
        IDENTITY_ENCODINGS
            .iter()
            .any(|identity| encoding.eq_ignore_ascii_case(identity))
    });
    if identity {
        return Ok(body.to_vec());
    }
    let compact: Vec<u8> = body
        .iter()
        .copied()
        .filter(|byte| !byte.is_ascii_whitespace())
        .collect();
    Ok(STANDARD.decode(compact)?)
}

/// Split a body on `--boundary` delimiter lines, stopping at the close
/// delimiter. Preamble and epilogue are dropped.
fn split<'a>(body: &'a [u8], boundary: &str) -> Vec<Part<'a>> {
    let delimiter = format!("--{boundary}");
    let delimiter = delimiter.as_bytes();

    let positions: Vec<usize> = (0..body.len())
        .filter(|&index| {
            (index == 0 || body[index - 1] == b'\n')
                && body[index..].starts_with(delimiter)
                && ends_delimiter(&body[index + delimiter.len()..])
        })
        .collect();

    let mut parts = Vec::new();
    for (i, &position) in positions.iter().enumerate() {
        let after = position + delimiter.len();
        if body[after..].starts_with(b"--") {
            break;
        }
        let Some(&next) = positions.get(i + 1) else {
            break;
        };
        let content = &body[skip_line(body, after).min(next)..next];
        parts.push(parse_part(strip_trailing_newline(content)));
    }
    parts
}

/// RFC 2046: a delimiter is followed by `--`, or by optional linear
/// whitespace and the end of the line.
fn ends_delimiter(rest: &[u8]) -> bool {
    if rest.starts_with(b"--") {
        return true;
    }
    let line = rest
        .iter()
        .position(|&byte| byte == b'\n')
        .map_or(rest, |end| &rest[..end]);
    let line = line.strip_suffix(b"\r").unwrap_or(line);
    line.iter().all(|&byte| byte == b' ' || byte == b'\t')
}

/// Index just past the end of the line containing `from`.
fn skip_line(body: &[u8], from: usize) -> usize {
    body[from..]
        .iter()
        .position(|&byte| byte == b'\n')
        .map_or(body.len(), |offset| from + offset + 1)
}

fn strip_trailing_newline(content: &[u8]) -> &[u8] {
    let content = content.strip_suffix(b"\n").unwrap_or(content);
    content.strip_suffix(b"\r").unwrap_or(content)
}

fn parse_part(content: &[u8]) -> Part<'_> {
    let mut headers = PartHeaders::default();
    let mut offset = 0;

    while offset < content.len() {
        let end = skip_line(content, offset);
        let line = String::from_utf8_lossy(&content[offset..end]);
        let line = line.trim_end_matches(['\r', '\n']);
        offset = end;
        if line.is_empty() {
            break;
        }
        let Some((name, value)) = line.split_once(':') else {
            continue;
        };
        let value = Some(value.trim().to_string());
        match name.trim().to_ascii_lowercase().as_str() {
            "content-type" => headers.content_type = value,
            "content-id" => headers.content_id = value,
            "content-transfer-encoding" => headers.transfer_encoding = value,
            _ => {}
        }
    }

    Part {
        headers,
        body: &content[offset.min(content.len())..],
    }
}

fn strip_angle_brackets(value: &str) -> &str {
    let value = value.trim();
    value
        .strip_prefix('<')
        .and_then(|inner| inner.strip_suffix('>'))
        .unwrap_or(value)
}
