use axum::http::StatusCode;
use thiserror::Error;

use abdera_model::ModelError;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("model error: {0}")]
    Model(#[from] ModelError),

    #[error("invalid route template '{template}': {source}")]
    InvalidRoute {
        template: String,
        #[source]
        source: regex::Error,
    },
}

pub type Result<T> = std::result::Result<T, ServerError>;

/// Failure reported by a collection adapter.
#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("not supported: {0}")]
    NotSupported(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("model error: {0}")]
    Model(#[from] ModelError),
}

pub type AdapterResult<T> = std::result::Result<T, AdapterError>;

/// Failure while splitting a multipart/related request.
#[derive(Debug, Error)]
pub enum MultipartError {
    #[error("multipart/related request has no boundary parameter")]
    MissingBoundary,

    #[error("multipart/related request has no type parameter")]
    MissingType,

    #[error("multipart/related type must be an Atom media type, got '{0}'")]
    NotAtom(String),

    #[error("multipart/related request has no parts")]
    NoParts,

    #[error("multipart/related request has no Atom entry part")]
    MissingEntry,

    #[error("multipart/related request has no media part")]
    MissingData,

    #[error("media part has no Content-Type")]
    MissingContentType,

    #[error("media type '{0}' is not accepted in a multipart/related post")]
    UnsupportedMediaType(String),

    #[error("media part is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("entry part could not be parsed: {0}")]
    Entry(#[from] ModelError),
}

impl MultipartError {
    /// Status code reported to the client.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::UnsupportedMediaType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            _ => StatusCode::BAD_REQUEST,
        }
    }
}
