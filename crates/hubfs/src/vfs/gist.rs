//! Gist backend.
//!
//! Gists are flat and text-only: a handle names one file of one gist, and
//! only read, write, exists and stat are offered.

use std::collections::BTreeMap;
use std::sync::Arc;

use tokio::sync::OnceCell;
use tracing::debug;

use super::types::Stat;
use crate::context::HubContext;
use crate::encoding::{self, Content, FileData};
use crate::error::{FsError, FsResult, Operation};
use crate::remote::{GistApi, GistFile};
use crate::url::{GistLocation, RemoteUrl};

pub(crate) const BACKEND: &str = "gist";

pub struct GistHandle {
    ctx: Arc<HubContext>,
    loc: GistLocation,
    api: OnceCell<Arc<dyn GistApi>>,
    file: OnceCell<Option<GistFile>>,
}

impl GistHandle {
    pub fn new(ctx: Arc<HubContext>, loc: GistLocation) -> Self {
        Self {
            ctx,
            loc,
            api: OnceCell::new(),
            file: OnceCell::new(),
        }
    }

    pub fn location(&self) -> &GistLocation {
        &self.loc
    }

    pub fn url(&self) -> String {
        RemoteUrl::Gist(self.loc.clone()).to_string()
    }

    pub(crate) fn context(&self) -> &HubContext {
        &self.ctx
    }

    pub(crate) fn supports(&self, op: Operation) -> bool {
        matches!(
            op,
            Operation::Read | Operation::Write | Operation::Exists | Operation::Stat
        )
    }

    async fn api(&self) -> FsResult<&Arc<dyn GistApi>> {
        self.api
            .get_or_try_init(|| async {
                let token = self.ctx.token().await?;
                Ok::<_, FsError>(self.ctx.connector().gist(&token, &self.loc.gist_id))
            })
            .await
    }

    /// The file's record inside the gist, fetched once.
    async fn file(&self) -> FsResult<Option<&GistFile>> {
        let file = self
            .file
            .get_or_try_init(|| async {
                let record = self.api().await?.read().await?;
                Ok::<_, FsError>(record.files.get(&self.loc.file_name).cloned())
            })
            .await?;
        Ok(file.as_ref())
    }

    async fn require_file(&self) -> FsResult<&GistFile> {
        self.file()
            .await?
            .ok_or_else(|| FsError::NotFound(format!("{}/{}", self.loc.gist_id, self.loc.file_name)))
    }

    fn trace(&self, op: Operation) {
        debug!(
            gist = %self.loc.gist_id,
            file = %self.loc.file_name,
            %op,
            "gist operation"
        );
    }

    pub async fn read(&self, encoding: Option<&str>) -> FsResult<Content> {
        self.trace(Operation::Read);
        let file = self.require_file().await?;
        encoding::read_content(file.content.clone().into_bytes(), encoding)
    }

    /// Replace the file's content. Bytes are decoded to text first.
    pub async fn write(self, data: FileData, encoding: Option<&str>) -> FsResult<()> {
        self.trace(Operation::Write);
        let text = encoding::to_text(data, encoding)?;
        let files = BTreeMap::from([(self.loc.file_name.clone(), Some(text))]);
        self.api().await?.update(files).await?;
        Ok(())
    }

    pub async fn exists(&self) -> FsResult<bool> {
        self.trace(Operation::Exists);
        Ok(self.file().await?.is_some())
    }

    pub async fn stat(&self) -> FsResult<Stat> {
        self.trace(Operation::Stat);
        let file = self.require_file().await?;
        Ok(Stat::file(&file.filename, file.size, &file.filename))
    }
}

impl std::fmt::Debug for GistHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GistHandle")
            .field("location", &self.loc)
            .field("fetched", &self.file.initialized())
            .finish()
    }
}
