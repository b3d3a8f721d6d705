//! Error handling types shared by every layer of the pipeline.

use thiserror::Error;

/// Result type alias for operations that can fail with a pipeline [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the repository processing pipeline.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error.
    #[error("I/O error: {message}")]
    Io {
        /// Description of the I/O error.
        message: String,
        /// Optional source error.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// JSON parsing or serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Request validation failure (bad URL, unknown repo id, path traversal, ...).
    ///
    /// Never recorded as a job failure; surfaced directly to the API caller.
    #[error("validation error: {message}")]
    Validation {
        /// Human-readable description.
        message: String,
    },

    /// A repository already has a non-terminal task; submission rejected.
    #[error("conflict: repository already has an active task {existing_task_id}")]
    Conflict {
        /// The id of the task already in flight.
        existing_task_id: String,
    },

    /// Resource not found (repository, task, wiki page, ...).
    #[error("not found: {resource}")]
    NotFound {
        /// The resource that was not found.
        resource: String,
    },

    /// Transient failure from an external collaborator (LLM, embedding, Git, vector
    /// store) that is retryable at the call level.
    #[error("transient external error ({kind}): {message}")]
    Transient {
        /// Coarse classification (`rate_limit`, `connection`, `timeout`).
        kind: TransientKind,
        /// Description of the failure.
        message: String,
    },

    /// Context-length / token-budget exceeded; triggers progressive degradation.
    #[error("token budget exceeded: {message}")]
    TokenBudget {
        /// Description of the overflow.
        message: String,
    },

    /// Vector store error.
    #[error("vector store error: {message}")]
    VectorStore {
        /// Description of the vector store error.
        message: String,
    },

    /// Embedding provider error.
    #[error("embedding provider error: {message}")]
    Embedding {
        /// Description of the embedding error.
        message: String,
    },

    /// LLM provider error.
    #[error("LLM provider error: {message}")]
    Llm {
        /// Description of the LLM error.
        message: String,
    },

    /// Database error.
    #[error("database error: {message}")]
    Database {
        /// Description of the database error.
        message: String,
        /// Optional source error.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Git subprocess error.
    #[error("git error: {message}")]
    Git {
        /// Description of the git error.
        message: String,
    },

    /// Cooperative cancellation sentinel.
    ///
    /// Propagates cleanly up through the pipeline and ends the job in
    /// `cancelled` rather than `failed`. Never retried.
    #[error("task {task_id} was cancelled")]
    Cancelled {
        /// The id of the cancelled task.
        task_id: String,
    },

    /// Job record or owning repository is missing or already terminal; the
    /// runner should silently drop the job rather than resurrect it.
    #[error("ghost job: {task_id}")]
    GhostJob {
        /// The id of the stale task.
        task_id: String,
    },

    /// Internal invariant violation.
    #[error("internal error: {message}")]
    Internal {
        /// Description of the internal error.
        message: String,
    },
}

/// Coarse classification of a transient external failure, used to decide
/// retry/backoff and degradation behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransientKind {
    /// Provider rate limit hit; retry with backoff.
    RateLimit,
    /// Connection reset/refused/timeout at the transport level.
    Connection,
    /// Request exceeded its deadline.
    Timeout,
}

impl std::fmt::Display for TransientKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::RateLimit => "rate_limit",
            Self::Connection => "connection",
            Self::Timeout => "timeout",
        };
        f.write_str(s)
    }
}

impl Error {
    /// Create a validation error.
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a not-found error.
    pub fn not_found<S: Into<String>>(resource: S) -> Self {
        Self::NotFound {
            resource: resource.into(),
        }
    }

    /// Create a conflict error carrying the id of the already-active task.
    pub fn conflict<S: Into<String>>(existing_task_id: S) -> Self {
        Self::Conflict {
            existing_task_id: existing_task_id.into(),
        }
    }

    /// Create a transient error.
    pub fn transient<S: Into<String>>(kind: TransientKind, message: S) -> Self {
        Self::Transient {
            kind,
            message: message.into(),
        }
    }

    /// Returns `true` if this error class is retryable at the call level.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transient { .. })
    }

    /// Create a vector store error.
    pub fn vector_store<S: Into<String>>(message: S) -> Self {
        Self::VectorStore {
            message: message.into(),
        }
    }

    /// Create an embedding error.
    pub fn embedding<S: Into<String>>(message: S) -> Self {
        Self::Embedding {
            message: message.into(),
        }
    }

    /// Create an LLM error.
    pub fn llm<S: Into<String>>(message: S) -> Self {
        Self::Llm {
            message: message.into(),
        }
    }

    /// Create a database error.
    pub fn database<S: Into<String>>(message: S) -> Self {
        Self::Database {
            message: message.into(),
            source: None,
        }
    }

    /// Create a database error with an underlying source.
    pub fn database_with_source<S, E>(message: S, source: E) -> Self
    where
        S: Into<String>,
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Database {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a git error.
    pub fn git<S: Into<String>>(message: S) -> Self {
        Self::Git {
            message: message.into(),
        }
    }

    /// Create an internal error.
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(source: std::io::Error) -> Self {
        Self::Io {
            message: source.to_string(),
            source: Some(Box::new(source)),
        }
    }
}
