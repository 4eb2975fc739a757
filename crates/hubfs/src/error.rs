//! Error taxonomy for file operations.

use thiserror::Error;

use crate::credential::CredentialError;
use crate::remote::RemoteError;

/// Error returned by every file operation.
///
/// Remote failures pass through unchanged as [`FsError::Remote`]. Everything
/// else is detected locally, before the remote is contacted.
#[derive(Debug, Error)]
pub enum FsError {
    /// The URL could not be decoded.
    #[error("invalid URL `{url}`: {reason}")]
    InvalidUrl { url: String, reason: String },

    /// The URL names a backend kind nobody handles.
    #[error("invalid URL: unrecognised kind `{0}`")]
    UnknownKind(String),

    /// A file, directory or branch name that cannot be used.
    #[error("invalid name `{0}`")]
    InvalidName(String),

    /// The operation has no meaning on a repository root.
    #[error("cannot {op} repository root")]
    Root { op: &'static str },

    /// A create targeted a path that is already present.
    #[error("{what} already exists: {path}")]
    AlreadyExists { what: &'static str, path: String },

    /// The user dismissed the commit message prompt.
    #[error("commit aborted")]
    Aborted,

    /// The backend does not offer this operation.
    #[error("{op} is not supported by the {backend} backend")]
    Unsupported { op: Operation, backend: &'static str },

    /// The named object is not present in the fetched record.
    #[error("not found: {0}")]
    NotFound(String),

    /// Content could not be converted between bytes and text.
    #[error("encoding error: {0}")]
    Encoding(String),

    /// No provider is registered for the URL's scheme.
    #[error("no filesystem registered for `{0}`")]
    NoProvider(String),

    #[error(transparent)]
    Credential(#[from] CredentialError),

    #[error(transparent)]
    Remote(#[from] RemoteError),
}

impl FsError {
    pub(crate) fn invalid_url(url: &str, reason: impl Into<String>) -> Self {
        Self::InvalidUrl {
            url: url.to_string(),
            reason: reason.into(),
        }
    }

    /// True when the user cancelled the operation.
    ///
    /// Hosts should swallow this rather than present it as a failure.
    pub fn is_user_abort(&self) -> bool {
        matches!(self, Self::Aborted)
    }

    /// True for capability errors, as opposed to real failures.
    pub fn is_unsupported(&self) -> bool {
        matches!(self, Self::Unsupported { .. })
    }
}

/// Operations of the generic file contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    List,
    Read,
    Write,
    CreateFile,
    CreateDirectory,
    Delete,
    Move,
    Rename,
    Copy,
    Exists,
    Stat,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::List => "list",
            Self::Read => "read",
            Self::Write => "write",
            Self::CreateFile => "create file",
            Self::CreateDirectory => "create directory",
            Self::Delete => "delete",
            Self::Move => "move",
            Self::Rename => "rename",
            Self::Copy => "copy",
            Self::Exists => "exists",
            Self::Stat => "stat",
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

pub type FsResult<T> = Result<T, FsError>;
