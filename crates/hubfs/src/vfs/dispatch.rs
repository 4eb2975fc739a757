//! The `gh` provider.

use std::sync::Arc;

use super::gist::GistHandle;
use super::handle::Handle;
use super::repo::RepoHandle;
use super::router::{FsRouter, Provider};
use crate::context::HubContext;
use crate::error::FsResult;
use crate::url::{RemoteUrl, SCHEME};

/// Decodes `gh://` URLs and opens the matching backend.
#[derive(Debug, Clone)]
pub struct HubFs {
    ctx: Arc<HubContext>,
}

impl HubFs {
    pub fn new(ctx: Arc<HubContext>) -> Self {
        Self { ctx }
    }

    pub fn context(&self) -> &Arc<HubContext> {
        &self.ctx
    }

    /// Register with `router`, returning whatever provider held `gh` before.
    pub fn install(self, router: &mut FsRouter) -> Option<Arc<dyn Provider>> {
        router.register(Arc::new(self))
    }
}

impl Provider for HubFs {
    fn scheme(&self) -> &str {
        SCHEME
    }

    fn open(&self, url: &str) -> FsResult<Handle> {
        let handle = match RemoteUrl::parse(url)? {
            RemoteUrl::Repo(loc) => Handle::Repo(RepoHandle::new(Arc::clone(&self.ctx), loc)),
            RemoteUrl::Gist(loc) => Handle::Gist(GistHandle::new(Arc::clone(&self.ctx), loc)),
        };
        tracing::trace!(url, kind = %handle.kind(), "opened handle");
        Ok(handle)
    }
}
