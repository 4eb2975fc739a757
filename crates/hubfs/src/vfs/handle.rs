//! Backend-independent file handle.

use super::gist::{self, GistHandle};
use super::repo::{self, RepoHandle};
use super::types::{DirEntry, Stat};
use crate::encoding::{Content, FileData};
use crate::error::{FsError, FsResult, Operation};
use crate::url::Kind;

/// A handle on one `gh://` URL.
///
/// Operations a backend does not offer fail with [`FsError::Unsupported`];
/// ask [`Handle::supports`] first to avoid that.
#[derive(Debug)]
pub enum Handle {
    Repo(RepoHandle),
    Gist(GistHandle),
}

fn gist_unsupported<T>(op: Operation) -> FsResult<T> {
    Err(FsError::Unsupported {
        op,
        backend: gist::BACKEND,
    })
}

impl Handle {
    pub fn kind(&self) -> Kind {
        match self {
            Self::Repo(_) => Kind::Repo,
            Self::Gist(_) => Kind::Gist,
        }
    }

    pub fn url(&self) -> String {
        match self {
            Self::Repo(h) => h.url(),
            Self::Gist(h) => h.url(),
        }
    }

    pub fn supports(&self, op: Operation) -> bool {
        match self {
            Self::Repo(h) => h.supports(op),
            Self::Gist(h) => h.supports(op),
        }
    }

    pub async fn list(&self) -> FsResult<Vec<DirEntry>> {
        match self {
            Self::Repo(h) => h.list().await,
            Self::Gist(_) => gist_unsupported(Operation::List),
        }
    }

    pub async fn read(&self, encoding: Option<&str>) -> FsResult<Content> {
        match self {
            Self::Repo(h) => h.read(encoding).await,
            Self::Gist(h) => h.read(encoding).await,
        }
    }

    /// Content decoded with the configured text charset.
    pub async fn read_text(&self) -> FsResult<String> {
        let content = match self {
            Self::Repo(h) => {
                let charset = h.context().settings().text_encoding().to_string();
                h.read(Some(&charset)).await?
            }
            Self::Gist(h) => {
                let charset = h.context().settings().text_encoding().to_string();
                h.read(Some(&charset)).await?
            }
        };
        match content {
            Content::Text(text) => Ok(text),
            Content::Binary(bytes) => String::from_utf8(bytes)
                .map_err(|err| FsError::Encoding(err.to_string())),
        }
    }

    pub async fn write(self, data: impl Into<FileData>, encoding: Option<&str>) -> FsResult<()> {
        match self {
            Self::Repo(h) => h.write(data.into(), encoding).await,
            Self::Gist(h) => h.write(data.into(), encoding).await,
        }
    }

    pub async fn create_file(self, name: &str, data: impl Into<FileData>) -> FsResult<String> {
        match self {
            Self::Repo(h) => h.create_file(name, data.into()).await,
            Self::Gist(_) => gist_unsupported(Operation::CreateFile),
        }
    }

    pub async fn create_directory(self, name: &str) -> FsResult<String> {
        match self {
            Self::Repo(h) => h.create_directory(name).await,
            Self::Gist(_) => gist_unsupported(Operation::CreateDirectory),
        }
    }

    pub async fn delete(self) -> FsResult<()> {
        match self {
            Self::Repo(h) => h.delete().await,
            Self::Gist(_) => gist_unsupported(Operation::Delete),
        }
    }

    pub async fn move_to(self, destination: &str) -> FsResult<String> {
        match self {
            Self::Repo(h) => h.move_to(destination).await,
            Self::Gist(_) => gist_unsupported(Operation::Move),
        }
    }

    pub async fn rename_to(self, name: &str) -> FsResult<String> {
        match self {
            Self::Repo(h) => h.rename_to(name).await,
            Self::Gist(_) => gist_unsupported(Operation::Rename),
        }
    }

    /// Neither backend can copy.
    pub async fn copy_to(self, _destination: &str) -> FsResult<String> {
        let backend = match self {
            Self::Repo(_) => repo::BACKEND,
            Self::Gist(_) => gist::BACKEND,
        };
        Err(FsError::Unsupported {
            op: Operation::Copy,
            backend,
        })
    }

    pub async fn exists(&self) -> FsResult<bool> {
        match self {
            Self::Repo(h) => h.exists().await,
            Self::Gist(h) => h.exists().await,
        }
    }

    pub async fn stat(&self) -> FsResult<Stat> {
        match self {
            Self::Repo(h) => h.stat().await,
            Self::Gist(h) => h.stat().await,
        }
    }
}

impl From<RepoHandle> for Handle {
    fn from(handle: RepoHandle) -> Self {
        Self::Repo(handle)
    }
}

impl From<GistHandle> for Handle {
    fn from(handle: GistHandle) -> Self {
        Self::Gist(handle)
    }
}
