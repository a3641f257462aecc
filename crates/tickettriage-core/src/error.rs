//! Error types for TicketTriage

/// Result type alias using TicketTriage's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for TicketTriage operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Configuration errors
    #[error("configuration error: {0}")]
    Config(String),

    /// The inference provider returned a non-success status or an unusable envelope
    #[error("backend error: {0}")]
    Backend(String),

    /// Transport failures talking to the inference provider
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Raw model output failed to parse as the classification contract
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Parsed model output violates a field constraint
    #[error("schema violation: {0}")]
    SchemaViolation(String),

    /// The classification retry budget ran out
    #[error("classification failed after {attempts} attempts")]
    RetriesExhausted { attempts: u32 },
}

impl Error {
    /// Create a new configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new backend error
    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend(msg.into())
    }

    /// Create a new schema violation error
    pub fn schema(msg: impl Into<String>) -> Self {
        Self::SchemaViolation(msg.into())
    }

    /// Whether the pipeline may retry after this error.
    ///
    /// Only schema-conformance failures are retried; transport and provider
    /// errors abort the request immediately.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Serialization(_) | Self::SchemaViolation(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_errors_are_retryable() {
        assert!(Error::schema("confidence out of range").is_retryable());
        let parse_err: Error = serde_json::from_str::<serde_json::Value>("not json")
            .unwrap_err()
            .into();
        assert!(parse_err.is_retryable());
    }

    #[test]
    fn test_backend_errors_are_not_retryable() {
        assert!(!Error::backend("status 502").is_retryable());
        assert!(!Error::config("missing key").is_retryable());
        assert!(!Error::RetriesExhausted { attempts: 3 }.is_retryable());
    }
}
