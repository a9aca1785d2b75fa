//! Error taxonomy shared by the clients and pipelines.
//!
//! Clients classify their failures into [`LanguageModelError`] or [`SearchIndexError`]; the
//! pipelines wrap those into [`UpstreamError`] and [`EmbeddingError`] with the context of the
//! step that failed.
use thiserror::Error;

pub type BoxedError = Box<dyn std::error::Error + Send + Sync>;

/// Failures of a hosted language or embedding model.
#[derive(Error, Debug)]
pub enum LanguageModelError {
    #[error("Context length exceeded: {0}")]
    ContextLengthExceeded(BoxedError),
    #[error("Permanent error: {0}")]
    PermanentError(BoxedError),
    #[error("Transient error: {0}")]
    TransientError(BoxedError),
}

impl LanguageModelError {
    pub fn permanent(e: impl Into<BoxedError>) -> Self {
        Self::PermanentError(e.into())
    }

    pub fn transient(e: impl Into<BoxedError>) -> Self {
        Self::TransientError(e.into())
    }

    /// Whether retrying the same request could succeed.
    ///
    /// Only an oversized input is excluded; a rejected request is still retried since the
    /// hosted endpoints report throttling and overload as ordinary client errors.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::ContextLengthExceeded(_))
    }
}

impl From<anyhow::Error> for LanguageModelError {
    fn from(e: anyhow::Error) -> Self {
        Self::PermanentError(e.into())
    }
}

/// A generation call failed or returned something that is not what was asked for.
#[derive(Error, Debug)]
pub enum UpstreamError {
    #[error("generation request failed")]
    Request(#[from] LanguageModelError),
    #[error("malformed generation response: {reason}")]
    Malformed { reason: String },
}

impl UpstreamError {
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::Malformed {
            reason: reason.into(),
        }
    }
}

/// Embedding a text field of a record failed, after the retry policy gave up.
#[derive(Error, Debug)]
#[error("failed to embed `{field}` of record {record}")]
pub struct EmbeddingError {
    pub field: &'static str,
    pub record: usize,
    #[source]
    pub source: LanguageModelError,
}

/// Failures talking to the search service.
#[derive(Error, Debug)]
pub enum SearchIndexError {
    #[error("index `{index}` rejected the schema change ({status}): {message}")]
    SchemaConflict {
        index: String,
        status: u16,
        message: String,
    },
    #[error("batch {batch} was not fully uploaded: {reason}")]
    Upload { batch: usize, reason: String },
    #[error("search service returned {status}: {message}")]
    Response { status: u16, message: String },
    #[error("search service request failed: {0}")]
    Request(#[source] BoxedError),
}

impl SearchIndexError {
    pub fn request(e: impl Into<BoxedError>) -> Self {
        Self::Request(e.into())
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required environment variable `{name}`")]
    Missing { name: &'static str },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_context_length_is_final() {
        let io = || std::io::Error::other("boom");

        assert!(LanguageModelError::transient(io()).is_retryable());
        assert!(LanguageModelError::permanent(io()).is_retryable());
        assert!(!LanguageModelError::ContextLengthExceeded(io().into()).is_retryable());
    }

    #[test]
    fn test_embedding_error_keeps_source() {
        let err = EmbeddingError {
            field: "genre",
            record: 7,
            source: LanguageModelError::transient(std::io::Error::other("rate limited")),
        };

        assert_eq!(err.to_string(), "failed to embed `genre` of record 7");
        let source = std::error::Error::source(&err).unwrap();
        assert_eq!(source.to_string(), "Transient error: rate limited");
    }
}
