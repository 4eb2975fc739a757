//! Session-level browsing of repositories, branches and gists.
//!
//! Listings are cached for the life of the catalog and kept in step with the
//! mutations made through it. [`Catalog::clear_cache`] forces a re-fetch.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, info};

use crate::context::HubContext;
use crate::error::{FsError, FsResult};
use crate::remote::{GistRecord, NewGist, RepoSummary};
use crate::url::RemoteUrl;

const NEW_GIST_CONTENT: &str = "# New gist";
const NEW_GIST_FILE_CONTENT: &str = "# New gist file";

/// A gist as shown in a picker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GistSummary {
    pub id: String,
    pub description: Option<String>,
    pub public: bool,
    pub files: Vec<String>,
}

impl GistSummary {
    /// Description, or the first file name when the gist has none.
    pub fn label(&self) -> &str {
        match self.description.as_deref() {
            Some(description) if !description.is_empty() => description,
            _ => self.files.first().map_or(self.id.as_str(), String::as_str),
        }
    }
}

impl From<GistRecord> for GistSummary {
    fn from(record: GistRecord) -> Self {
        Self {
            id: record.id,
            description: record.description,
            public: record.public,
            files: record.files.into_keys().collect(),
        }
    }
}

#[derive(Default)]
struct Cache {
    repos: Option<Vec<RepoSummary>>,
    branches: HashMap<(String, String), Vec<String>>,
    gists: Option<Vec<GistSummary>>,
}

impl Cache {
    fn gist_mut(&mut self, id: &str) -> Option<&mut GistSummary> {
        self.gists.as_mut()?.iter_mut().find(|gist| gist.id == id)
    }
}

pub struct Catalog {
    ctx: Arc<HubContext>,
    cache: Mutex<Cache>,
}

/// Branch names are limited to letters, digits, `-` and `_`.
fn valid_branch_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

fn valid_file_name(name: &str) -> bool {
    !name.trim().is_empty() && !name.contains('/')
}

impl Catalog {
    pub fn new(ctx: Arc<HubContext>) -> Self {
        Self {
            ctx,
            cache: Mutex::new(Cache::default()),
        }
    }

    fn cache(&self) -> MutexGuard<'_, Cache> {
        self.cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn clear_cache(&self) {
        *self.cache() = Cache::default();
    }

    pub async fn list_repositories(&self) -> FsResult<Vec<RepoSummary>> {
        let cached = self.cache().repos.clone();
        if let Some(repos) = cached {
            return Ok(repos);
        }
        let token = self.ctx.token().await?;
        let repos = self.ctx.connector().user(&token).list_repositories().await?;
        debug!(count = repos.len(), "fetched repositories");
        self.cache().repos = Some(repos.clone());
        Ok(repos)
    }

    pub async fn list_branches(&self, owner: &str, repo: &str) -> FsResult<Vec<String>> {
        let key = (owner.to_string(), repo.to_string());
        let cached = self.cache().branches.get(&key).cloned();
        if let Some(branches) = cached {
            return Ok(branches);
        }
        let token = self.ctx.token().await?;
        let branches = self
            .ctx
            .connector()
            .repo(&token, owner, repo)
            .list_branches()
            .await?;
        self.cache().branches.insert(key, branches.clone());
        Ok(branches)
    }

    /// Branch `new_name` off `from`; returns the new branch's root URL.
    pub async fn create_branch(
        &self,
        owner: &str,
        repo: &str,
        from: &str,
        new_name: &str,
    ) -> FsResult<RemoteUrl> {
        if !valid_branch_name(new_name) {
            return Err(FsError::InvalidName(new_name.to_string()));
        }
        let token = self.ctx.token().await?;
        self.ctx
            .connector()
            .repo(&token, owner, repo)
            .create_branch(from, new_name)
            .await?;
        info!(owner, repo, from, branch = new_name, "created branch");

        let key = (owner.to_string(), repo.to_string());
        if let Some(branches) = self.cache().branches.get_mut(&key) {
            branches.push(new_name.to_string());
        }
        Ok(RemoteUrl::repo(owner, repo, Some(new_name), ""))
    }

    pub async fn list_gists(&self) -> FsResult<Vec<GistSummary>> {
        let cached = self.cache().gists.clone();
        if let Some(gists) = cached {
            return Ok(gists);
        }
        let token = self.ctx.token().await?;
        let records = self.ctx.connector().user(&token).list_gists().await?;
        let gists: Vec<GistSummary> = records.into_iter().map(GistSummary::from).collect();
        debug!(count = gists.len(), "fetched gists");
        self.cache().gists = Some(gists.clone());
        Ok(gists)
    }

    pub async fn list_gist_files(&self, gist_id: &str) -> FsResult<Vec<String>> {
        let cached = self.cache().gist_mut(gist_id).map(|gist| gist.files.clone());
        if let Some(files) = cached {
            return Ok(files);
        }
        let token = self.ctx.token().await?;
        let record = self.ctx.connector().gist(&token, gist_id).read().await?;
        let files: Vec<String> = record.files.keys().cloned().collect();
        if let Some(gists) = self.cache().gists.as_mut() {
            gists.push(GistSummary::from(record));
        }
        Ok(files)
    }

    /// New gist holding one seeded file; returns that file's URL.
    pub async fn create_gist(
        &self,
        description: Option<&str>,
        public: bool,
        file_name: &str,
    ) -> FsResult<RemoteUrl> {
        if !valid_file_name(file_name) {
            return Err(FsError::InvalidName(file_name.to_string()));
        }
        let token = self.ctx.token().await?;
        let record = self
            .ctx
            .connector()
            .user(&token)
            .create_gist(NewGist {
                description: description.map(String::from),
                public,
                files: BTreeMap::from([(file_name.to_string(), NEW_GIST_CONTENT.to_string())]),
            })
            .await?;
        info!(gist = %record.id, public, "created gist");

        let url = RemoteUrl::gist(&record.id, file_name);
        if let Some(gists) = self.cache().gists.as_mut() {
            gists.push(GistSummary::from(record));
        }
        Ok(url)
    }

    /// Add a seeded file to an existing gist; returns the file's URL.
    pub async fn add_gist_file(&self, gist_id: &str, file_name: &str) -> FsResult<RemoteUrl> {
        if !valid_file_name(file_name) {
            return Err(FsError::InvalidName(file_name.to_string()));
        }
        let token = self.ctx.token().await?;
        let files = BTreeMap::from([(
            file_name.to_string(),
            Some(NEW_GIST_FILE_CONTENT.to_string()),
        )]);
        self.ctx.connector().gist(&token, gist_id).update(files).await?;

        if let Some(gist) = self.cache().gist_mut(gist_id) {
            if !gist.files.iter().any(|f| f == file_name) {
                gist.files.push(file_name.to_string());
            }
        }
        Ok(RemoteUrl::gist(gist_id, file_name))
    }

    pub async fn delete_gist(&self, gist_id: &str) -> FsResult<()> {
        let token = self.ctx.token().await?;
        self.ctx.connector().gist(&token, gist_id).delete().await?;
        info!(gist = gist_id, "deleted gist");
        if let Some(gists) = self.cache().gists.as_mut() {
            gists.retain(|gist| gist.id != gist_id);
        }
        Ok(())
    }

    pub async fn delete_gist_file(&self, gist_id: &str, file_name: &str) -> FsResult<()> {
        let token = self.ctx.token().await?;
        let files = BTreeMap::from([(file_name.to_string(), None)]);
        self.ctx.connector().gist(&token, gist_id).update(files).await?;
        if let Some(gist) = self.cache().gist_mut(gist_id) {
            gist.files.retain(|f| f != file_name);
        }
        Ok(())
    }
}

impl std::fmt::Debug for Catalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Catalog").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("feature-x", true)]
    #[case("fix_123", true)]
    #[case("", false)]
    #[case("has space", false)]
    #[case("nested/name", false)]
    #[case("dots.not.allowed", false)]
    fn branch_names(#[case] name: &str, #[case] ok: bool) {
        assert_eq!(valid_branch_name(name), ok);
    }

    #[test]
    fn gist_label_falls_back_to_first_file() {
        let gist = GistSummary {
            id: "abc".into(),
            description: None,
            public: true,
            files: vec!["notes.md".into(), "todo.md".into()],
        };
        assert_eq!(gist.label(), "notes.md");

        let described = GistSummary {
            description: Some("Scratch".into()),
            ..gist
        };
        assert_eq!(described.label(), "Scratch");
    }
}
