use storefront_core::DomainError;

pub type CatalogResult<T> = Result<T, CatalogError>;

/// Failure talking to the remote catalog.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CatalogError {
    #[error("network error: {0}")]
    Network(String),
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },
    #[error("not found: {0}")]
    NotFound(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("parse error: {0}")]
    Parse(String),
    /// Refused on the client before any request was sent.
    #[error("rejected: {0}")]
    Rejected(String),
}

impl CatalogError {
    /// Map a non-success HTTP status and its `{error}` message.
    pub fn from_status(status: u16, message: String) -> Self {
        match status {
            404 => CatalogError::NotFound(message),
            409 | 412 => CatalogError::Conflict(message),
            _ => CatalogError::Api { status, message },
        }
    }

    /// Worth retrying: the request may succeed unchanged.
    pub fn is_transient(&self) -> bool {
        match self {
            CatalogError::Network(_) => true,
            CatalogError::Api { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }
}

impl From<DomainError> for CatalogError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::NotFound(what) => CatalogError::NotFound(what),
            DomainError::Conflict(msg) => CatalogError::Conflict(msg),
            other => CatalogError::Rejected(other.to_string()),
        }
    }
}
