//! The remote store as seen by the adapter.
//!
//! These traits are the capability surface the backends call. A REST binding
//! implements them against a hosting service; [`memory::MemoryHub`] implements
//! them in memory.
//!
//! Branch arguments are `None` for the repository's default branch.

pub mod memory;

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::encoding::Upload;

/// Failure reported by the remote store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemoteError {
    #[error("remote object not found: {0}")]
    NotFound(String),

    #[error("not a directory: {0}")]
    NotADirectory(String),

    /// The supplied content identity does not match the current one.
    #[error("conflict: {0}")]
    Conflict(String),

    #[error("already exists: {0}")]
    AlreadyExists(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("unauthorized")]
    Unauthorized,

    #[error("transport error: {0}")]
    Transport(String),
}

pub type RemoteResult<T> = Result<T, RemoteError>;

/// Type of an entry in a directory listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Dir,
}

/// One entry of a remote directory listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteEntry {
    pub name: String,
    /// Full path from the repository root.
    pub path: String,
    #[serde(rename = "type")]
    pub kind: EntryKind,
}

/// A file inside a gist record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GistFile {
    pub filename: String,
    pub size: u64,
    pub content: String,
}

impl GistFile {
    pub fn new(filename: impl Into<String>, content: impl Into<String>) -> Self {
        let content = content.into();
        Self {
            filename: filename.into(),
            size: content.len() as u64,
            content,
        }
    }
}

/// A gist with all of its files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GistRecord {
    pub id: String,
    pub description: Option<String>,
    pub public: bool,
    pub owner: String,
    pub files: BTreeMap<String, GistFile>,
}

/// Fields for creating a gist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewGist {
    pub description: Option<String>,
    pub public: bool,
    pub files: BTreeMap<String, String>,
}

/// A repository visible to the authenticated user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoSummary {
    pub owner: String,
    pub name: String,
    pub private: bool,
}

impl RepoSummary {
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

/// Operations on one repository.
#[async_trait]
pub trait RepoApi: Send + Sync {
    /// Content identity of the object at `path`.
    async fn get_sha(&self, branch: Option<&str>, path: &str) -> RemoteResult<String>;

    /// Raw bytes of a blob.
    async fn get_blob(&self, sha: &str) -> RemoteResult<Vec<u8>>;

    /// Create or overwrite a file with one commit.
    async fn write_file(
        &self,
        branch: Option<&str>,
        path: &str,
        upload: &Upload,
        message: &str,
    ) -> RemoteResult<()>;

    /// Delete a file; `sha` must be its current identity.
    async fn delete_file(
        &self,
        branch: Option<&str>,
        path: &str,
        message: &str,
        sha: &str,
    ) -> RemoteResult<()>;

    /// Move a file or directory within a branch.
    async fn move_file(&self, branch: Option<&str>, from: &str, to: &str) -> RemoteResult<()>;

    async fn create_branch(&self, from: &str, name: &str) -> RemoteResult<()>;

    /// Direct children of a directory; `""` is the root.
    async fn list_directory(&self, branch: Option<&str>, path: &str)
    -> RemoteResult<Vec<RemoteEntry>>;

    async fn list_branches(&self) -> RemoteResult<Vec<String>>;
}

/// Operations on one gist.
#[async_trait]
pub trait GistApi: Send + Sync {
    async fn read(&self) -> RemoteResult<GistRecord>;

    /// Partial update. `None` content removes the file.
    async fn update(&self, files: BTreeMap<String, Option<String>>) -> RemoteResult<GistRecord>;

    async fn delete(&self) -> RemoteResult<()>;
}

/// Operations scoped to the authenticated user.
#[async_trait]
pub trait UserApi: Send + Sync {
    async fn list_repositories(&self) -> RemoteResult<Vec<RepoSummary>>;

    async fn list_gists(&self) -> RemoteResult<Vec<GistRecord>>;

    async fn create_gist(&self, gist: NewGist) -> RemoteResult<GistRecord>;
}

/// Creates authenticated clients.
pub trait Connector: Send + Sync {
    fn repo(&self, token: &str, owner: &str, name: &str) -> Arc<dyn RepoApi>;

    fn gist(&self, token: &str, gist_id: &str) -> Arc<dyn GistApi>;

    fn user(&self, token: &str) -> Arc<dyn UserApi>;
}
