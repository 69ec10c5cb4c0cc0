//! Error types.

/// Result type for veth-namer operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while reconciling container links.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Netlink failure (socket, kernel answer or namespace join).
    #[error(transparent)]
    Netlink(#[from] crate::netlink::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encoding or decoding error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML decoding error.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Configuration is well-formed YAML but semantically invalid.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Docker answered with a non-success status.
    #[error("docker API error (status {status}): {message}")]
    Docker { status: u16, message: String },

    /// HTTP transport error talking to Docker.
    #[error("HTTP error: {0}")]
    Http(String),

    /// Listing links inside a container namespace failed.
    #[error("link enumeration failed: {0}")]
    Enumeration(String),

    /// No host link carries the given index.
    #[error("link with index {index} not found")]
    LinkNotFound { index: u32 },

    /// The Docker event stream ended.
    #[error("docker event stream closed")]
    EventStreamClosed,
}

impl From<hyper::Error> for Error {
    fn from(e: hyper::Error) -> Self {
        Error::Http(e.to_string())
    }
}

impl Error {
    /// Check if this error means the object does not exist.
    pub fn is_not_found(&self) -> bool {
        match self {
            Error::Netlink(e) => e.is_not_found(),
            Error::Docker { status, .. } => *status == 404,
            Error::LinkNotFound { .. } => true,
            _ => false,
        }
    }
}
