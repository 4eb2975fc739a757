//! Repository backend.
//!
//! A [`RepoHandle`] addresses one path inside one branch. The authenticated
//! client and the path's content id are each fetched at most once per handle.
//! Mutating operations consume the handle, so a later operation on the same
//! path always starts from a fresh content id.

use std::sync::Arc;

use tokio::sync::OnceCell;
use tracing::{debug, warn};

use super::types::{DirEntry, Stat};
use crate::commit::CommitAction;
use crate::context::HubContext;
use crate::encoding::{self, Content, FileData, Upload};
use crate::error::{FsError, FsResult, Operation};
use crate::remote::{EntryKind, RemoteError, RepoApi};
use crate::url::{self, RemoteUrl, RepoLocation};

pub(crate) const BACKEND: &str = "repository";

/// Placeholder committed to materialise an otherwise empty directory.
const KEEP_FILE: &str = ".gitkeep";

pub struct RepoHandle {
    ctx: Arc<HubContext>,
    loc: RepoLocation,
    api: OnceCell<Arc<dyn RepoApi>>,
    sha: OnceCell<String>,
}

impl RepoHandle {
    pub fn new(ctx: Arc<HubContext>, loc: RepoLocation) -> Self {
        Self {
            ctx,
            loc,
            api: OnceCell::new(),
            sha: OnceCell::new(),
        }
    }

    pub fn location(&self) -> &RepoLocation {
        &self.loc
    }

    pub fn url(&self) -> String {
        RemoteUrl::Repo(self.loc.clone()).to_string()
    }

    pub(crate) fn context(&self) -> &HubContext {
        &self.ctx
    }

    pub(crate) fn supports(&self, op: Operation) -> bool {
        match op {
            Operation::Copy => false,
            Operation::Move | Operation::Rename => self.ctx.settings().allow_move,
            _ => true,
        }
    }

    async fn api(&self) -> FsResult<&Arc<dyn RepoApi>> {
        self.api
            .get_or_try_init(|| async {
                let token = self.ctx.token().await?;
                debug!(owner = %self.loc.owner, repo = %self.loc.repo, "connecting");
                Ok::<_, FsError>(self.ctx.connector().repo(&token, &self.loc.owner, &self.loc.repo))
            })
            .await
    }

    async fn sha(&self) -> FsResult<&str> {
        let sha = self
            .sha
            .get_or_try_init(|| async {
                let api = self.api().await?;
                Ok::<_, FsError>(api.get_sha(self.loc.branch(), &self.loc.path).await?)
            })
            .await?;
        Ok(sha.as_str())
    }

    fn require_path(&self, op: &'static str) -> FsResult<()> {
        if self.loc.is_root() {
            return Err(FsError::Root { op });
        }
        Ok(())
    }

    fn url_for(&self, path: &str) -> String {
        RemoteUrl::Repo(self.loc.with_path(path)).to_string()
    }

    fn trace(&self, op: Operation) {
        debug!(
            owner = %self.loc.owner,
            repo = %self.loc.repo,
            branch = ?self.loc.branch,
            path = %self.loc.path,
            %op,
            "repository operation"
        );
    }

    /// Any failure other than a missing path is logged and treated as absence.
    async fn path_exists(&self, api: &dyn RepoApi, path: &str) -> bool {
        match api.get_sha(self.loc.branch(), path).await {
            Ok(_) => true,
            Err(RemoteError::NotFound(_)) => false,
            Err(err) => {
                warn!(path, error = %err, "existence check failed, treating path as absent");
                false
            }
        }
    }

    pub async fn list(&self) -> FsResult<Vec<DirEntry>> {
        self.trace(Operation::List);
        let api = self.api().await?;
        let entries = api.list_directory(self.loc.branch(), &self.loc.path).await?;
        Ok(entries
            .into_iter()
            .map(|entry| DirEntry {
                url: self.url_for(&entry.path),
                is_directory: entry.kind == EntryKind::Dir,
                is_file: entry.kind == EntryKind::File,
                name: entry.name,
            })
            .collect())
    }

    /// Blob content, decoded with `encoding` when one is given.
    pub async fn read(&self, encoding: Option<&str>) -> FsResult<Content> {
        self.trace(Operation::Read);
        self.require_path("read")?;
        let sha = self.sha().await?;
        let bytes = self.api().await?.get_blob(sha).await?;
        encoding::read_content(bytes, encoding)
    }

    pub async fn write(self, data: FileData, encoding: Option<&str>) -> FsResult<()> {
        self.trace(Operation::Write);
        self.require_path("write")?;
        let message = self.ctx.gate().message(CommitAction::Update, &self.loc.path).await?;
        let upload = encoding::prepare_upload(data, encoding)?;
        let api = self.api().await?;
        api.write_file(self.loc.branch(), &self.loc.path, &upload, &message)
            .await?;
        Ok(())
    }

    /// Create `name` under this directory; returns the new file's URL.
    pub async fn create_file(self, name: &str, data: FileData) -> FsResult<String> {
        self.trace(Operation::CreateFile);
        check_name(name)?;
        let path = url::join_path(&self.loc.path, name);
        let upload = encoding::prepare_upload(data, None)?;
        self.create(&path, "file", &path, upload).await?;
        Ok(self.url_for(&path))
    }

    /// Create directory `name` under this directory; returns its URL.
    pub async fn create_directory(self, name: &str) -> FsResult<String> {
        self.trace(Operation::CreateDirectory);
        check_name(name)?;
        let path = url::join_path(&self.loc.path, name);
        let keep = url::join_path(&path, KEEP_FILE);
        self.create(&path, "directory", &keep, Upload::text("")).await?;
        Ok(self.url_for(&path))
    }

    async fn create(
        &self,
        path: &str,
        what: &'static str,
        target: &str,
        upload: Upload,
    ) -> FsResult<()> {
        let api = self.api().await?;
        if self.path_exists(api.as_ref(), path).await {
            return Err(FsError::AlreadyExists {
                what,
                path: path.to_string(),
            });
        }
        let message = self.ctx.gate().message(CommitAction::Create, path).await?;
        api.write_file(self.loc.branch(), target, &upload, &message)
            .await?;
        Ok(())
    }

    pub async fn delete(self) -> FsResult<()> {
        self.trace(Operation::Delete);
        self.require_path("delete")?;
        let api = self.api().await?;
        let sha = self.sha().await?;
        let message = self.ctx.gate().message(CommitAction::Delete, &self.loc.path).await?;
        api.delete_file(self.loc.branch(), &self.loc.path, &message, sha)
            .await?;
        Ok(())
    }

    /// Move into the directory `destination`, keeping the base name.
    ///
    /// Only destinations in the same repository branch are supported.
    pub async fn move_to(self, destination: &str) -> FsResult<String> {
        self.trace(Operation::Move);
        self.require_move(Operation::Move, "move")?;
        let target = match RemoteUrl::parse(destination)? {
            RemoteUrl::Repo(target) if target.same_tree(&self.loc) => target,
            _ => {
                debug!(destination, "move target outside this repository branch");
                return Err(FsError::Unsupported {
                    op: Operation::Move,
                    backend: BACKEND,
                });
            }
        };
        let path = url::join_path(&target.path, url::base_name(&self.loc.path));
        self.relocate(&path).await
    }

    /// Rename in place, keeping the parent directory.
    pub async fn rename_to(self, name: &str) -> FsResult<String> {
        self.trace(Operation::Rename);
        self.require_move(Operation::Rename, "rename")?;
        check_name(name)?;
        let path = url::join_path(url::parent_path(&self.loc.path), name);
        self.relocate(&path).await
    }

    fn require_move(&self, op: Operation, verb: &'static str) -> FsResult<()> {
        if !self.ctx.settings().allow_move {
            return Err(FsError::Unsupported { op, backend: BACKEND });
        }
        self.require_path(verb)
    }

    async fn relocate(&self, path: &str) -> FsResult<String> {
        let url = self.url_for(path);
        if path.trim_end_matches('/') == self.loc.path.trim_end_matches('/') {
            return Ok(url);
        }
        let api = self.api().await?;
        api.move_file(self.loc.branch(), &self.loc.path, path).await?;
        Ok(url)
    }

    pub async fn exists(&self) -> FsResult<bool> {
        self.trace(Operation::Exists);
        if self.loc.is_root() {
            return Ok(true);
        }
        let api = self.api().await?;
        Ok(self.path_exists(api.as_ref(), &self.loc.path).await)
    }

    pub async fn stat(&self) -> FsResult<Stat> {
        self.trace(Operation::Stat);
        if self.loc.is_root() {
            return Ok(Stat {
                length: 0,
                name: format!("github/{}/{}", self.loc.owner, self.loc.repo),
                is_directory: true,
                is_file: false,
                content_type: None,
            });
        }
        let name = url::base_name(&self.loc.path);
        let sha = self.sha().await?;
        if self.loc.path.ends_with('/') {
            return Ok(Stat {
                length: 0,
                name: name.to_string(),
                is_directory: true,
                is_file: false,
                content_type: None,
            });
        }
        let bytes = self.api().await?.get_blob(sha).await?;
        let stat = Stat::file(name, bytes.len() as u64, &self.loc.path);
        Ok(stat)
    }
}

/// A single path segment.
fn check_name(name: &str) -> FsResult<()> {
    if name.is_empty() || name.contains('/') {
        return Err(FsError::InvalidName(name.to_string()));
    }
    Ok(())
}

impl std::fmt::Debug for RepoHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RepoHandle")
            .field("location", &self.loc)
            .field("connected", &self.api.initialized())
            .finish()
    }
}
