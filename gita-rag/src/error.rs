//! Error types for the `gita-rag` crate.
//!
//! "No matching passages" is deliberately *not* represented here: an
//! empty retrieval result is a normal outcome and flows through the
//! success path as an empty `Vec`.

use thiserror::Error;

/// Errors that can occur across the offline pipeline and the online
/// question-answering path.
#[derive(Debug, Error)]
pub enum GitaError {
    /// A malformed request from the caller (missing query/author, zero k).
    #[error("invalid input: {0}")]
    Input(String),

    /// A configuration or invariant violation detected before any
    /// external call (builder validation, prompt template validation,
    /// embedding model mismatch against the collection manifest).
    #[error("configuration error: {0}")]
    Config(String),

    /// The vector index could not be reached or refused the operation.
    #[error("service unavailable ({service}): {message}")]
    ServiceUnavailable {
        /// The backend that could not be reached.
        service: String,
        /// A description of the failure.
        message: String,
    },

    /// An external dependency (embedding service, generative model)
    /// failed while handling an otherwise valid request.
    #[error("dependency error ({service}): {message}")]
    Dependency {
        /// The dependency that produced the error.
        service: String,
        /// A description of the failure.
        message: String,
    },

    /// An offline preprocessing or ingestion step failed.
    #[error("ingestion error ({stage}): {message}")]
    Ingestion {
        /// The pipeline stage that failed (normalize, artifacts, load…).
        stage: String,
        /// A description of the failure.
        message: String,
    },

    /// Text-to-speech rendering failed. Never blocks the primary answer.
    #[error("audio generation error: {0}")]
    Audio(String),
}

/// A convenience result type for gita-rag operations.
pub type Result<T> = std::result::Result<T, GitaError>;
