use thiserror::Error;

use abdera_model::ModelError;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("request failed after {attempts} attempts: {message}")]
    RetriesExhausted { attempts: u32, message: String },

    #[error("response is not an Atom document: {0}")]
    Model(#[from] ModelError),
}

pub type Result<T> = std::result::Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retries_exhausted_message() {
        let err = ClientError::RetriesExhausted {
            attempts: 3,
            message: "Server error: 503 Service Unavailable".into(),
        };
        assert_eq!(
            err.to_string(),
            "request failed after 3 attempts: Server error: 503 Service Unavailable"
        );
    }
}
