//! Netlink errors.

use std::io;

/// Result type for netlink operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors from the route socket, the kernel, or a namespace switch.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Socket I/O failed.
    #[error("netlink I/O error: {0}")]
    Io(#[from] io::Error),

    /// The kernel refused a request.
    #[error("{operation}: {source}")]
    Kernel {
        /// What was being asked for.
        operation: String,
        /// The errno the kernel answered with.
        source: io::Error,
    },

    /// The kernel answer could not be decoded.
    #[error("malformed netlink message: {0}")]
    Malformed(String),

    /// A namespace file could not be opened or joined.
    #[error("cannot enter namespace '{path}': {source}")]
    Namespace {
        /// Path of the namespace file.
        path: String,
        /// Underlying OS error.
        source: io::Error,
    },
}

impl Error {
    /// Build a kernel error from the (negative) code of an `NLMSG_ERROR` answer.
    pub fn from_errno(code: i32) -> Self {
        Self::Kernel {
            operation: "netlink request".into(),
            source: io::Error::from_raw_os_error(code.abs()),
        }
    }

    /// Name the operation a kernel error belongs to.
    pub(crate) fn during(self, operation: impl Into<String>) -> Self {
        match self {
            Self::Kernel { source, .. } => Self::Kernel {
                operation: operation.into(),
                source,
            },
            other => other,
        }
    }

    /// The errno carried by a kernel or namespace error.
    pub fn errno(&self) -> Option<i32> {
        match self {
            Self::Kernel { source, .. } | Self::Namespace { source, .. } => source.raw_os_error(),
            _ => None,
        }
    }

    /// The link or namespace does not exist (ENODEV, ENOENT).
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Namespace { source, .. } => source.kind() == io::ErrorKind::NotFound,
            _ => matches!(self.errno(), Some(libc::ENODEV | libc::ENOENT)),
        }
    }
}
