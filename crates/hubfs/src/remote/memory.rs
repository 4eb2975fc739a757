//! In-memory remote store.
//!
//! Models repositories, branches and gists with the same failure behaviour as
//! a hosting service: content identities are git-style blob ids, deletes must
//! present the current id, and clients built for the wrong token are refused.
//! Every call is recorded so tests can assert which remote calls happened.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use sha1::{Digest, Sha1};
use tokio::sync::RwLock;

use super::{
    Connector, EntryKind, GistApi, GistFile, GistRecord, NewGist, RemoteEntry, RemoteError,
    RemoteResult, RepoApi, RepoSummary, UserApi,
};
use crate::encoding::Upload;

/// A remote call observed by [`MemoryHub`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteCall {
    Connect { token: String },
    GetSha { branch: Option<String>, path: String },
    GetBlob { sha: String },
    WriteFile { branch: Option<String>, path: String, message: String, encoded: bool },
    DeleteFile { branch: Option<String>, path: String, message: String, sha: String },
    MoveFile { branch: Option<String>, from: String, to: String },
    CreateBranch { from: String, name: String },
    ListDirectory { branch: Option<String>, path: String },
    ListBranches,
    GistRead { id: String },
    GistUpdate { id: String, files: Vec<String> },
    GistDelete { id: String },
    ListRepositories,
    ListGists,
    CreateGist,
}

impl RemoteCall {
    /// True for calls that change remote state.
    pub fn is_mutation(&self) -> bool {
        matches!(
            self,
            RemoteCall::WriteFile { .. }
                | RemoteCall::DeleteFile { .. }
                | RemoteCall::MoveFile { .. }
                | RemoteCall::CreateBranch { .. }
                | RemoteCall::GistUpdate { .. }
                | RemoteCall::GistDelete { .. }
                | RemoteCall::CreateGist
        )
    }
}

#[derive(Debug)]
struct Repository {
    default_branch: String,
    private: bool,
    /// branch → path → blob sha
    branches: BTreeMap<String, BTreeMap<String, String>>,
}

#[derive(Debug, Default)]
struct State {
    repos: BTreeMap<(String, String), Repository>,
    blobs: HashMap<String, Vec<u8>>,
    gists: BTreeMap<String, GistRecord>,
    next_gist: u64,
}

#[derive(Debug)]
struct Inner {
    token: Option<String>,
    login: String,
    state: RwLock<State>,
    calls: Mutex<Vec<RemoteCall>>,
    failures: Mutex<HashMap<&'static str, RemoteError>>,
}

/// In-memory hosting service.
///
/// Cloning shares the underlying store.
#[derive(Debug, Clone)]
pub struct MemoryHub {
    inner: Arc<Inner>,
}

impl Default for MemoryHub {
    fn default() -> Self {
        Self::new()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn blob_sha(bytes: &[u8]) -> String {
    let mut hasher = Sha1::new();
    hasher.update(format!("blob {}\0", bytes.len()).as_bytes());
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

fn tree_sha(path: &str) -> String {
    let mut hasher = Sha1::new();
    hasher.update(format!("tree {path}").as_bytes());
    format!("{:x}", hasher.finalize())
}

fn trim(path: &str) -> &str {
    path.trim_matches('/')
}

fn is_under(key: &str, dir: &str) -> bool {
    key.len() > dir.len() && key.starts_with(dir) && key.as_bytes()[dir.len()] == b'/'
}

impl MemoryHub {
    /// A store that accepts any token.
    pub fn new() -> Self {
        Self::build(None, "octocat")
    }

    /// A store that refuses clients built with any other token.
    pub fn with_token(token: impl Into<String>) -> Self {
        Self::build(Some(token.into()), "octocat")
    }

    fn build(token: Option<String>, login: &str) -> Self {
        Self {
            inner: Arc::new(Inner {
                token,
                login: login.to_string(),
                state: RwLock::new(State::default()),
                calls: Mutex::new(Vec::new()),
                failures: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Create an empty repository with a `main` branch.
    pub async fn add_repo(&self, owner: &str, name: &str) {
        let mut state = self.inner.state.write().await;
        let mut branches = BTreeMap::new();
        branches.insert("main".to_string(), BTreeMap::new());
        state.repos.insert(
            (owner.to_string(), name.to_string()),
            Repository {
                default_branch: "main".to_string(),
                private: false,
                branches,
            },
        );
    }

    /// Store a file directly, bypassing the call log.
    pub async fn put_file(
        &self,
        owner: &str,
        name: &str,
        branch: Option<&str>,
        path: &str,
        bytes: &[u8],
    ) {
        let mut state = self.inner.state.write().await;
        let sha = blob_sha(bytes);
        state.blobs.insert(sha.clone(), bytes.to_vec());
        if let Some(repo) = state.repos.get_mut(&(owner.to_string(), name.to_string())) {
            let branch = branch.unwrap_or(&repo.default_branch).to_string();
            repo.branches
                .entry(branch)
                .or_default()
                .insert(trim(path).to_string(), sha);
        }
    }

    /// Current bytes of a file, if present.
    pub async fn file(
        &self,
        owner: &str,
        name: &str,
        branch: Option<&str>,
        path: &str,
    ) -> Option<Vec<u8>> {
        let state = self.inner.state.read().await;
        let repo = state.repos.get(&(owner.to_string(), name.to_string()))?;
        let branch = branch.unwrap_or(&repo.default_branch);
        let sha = repo.branches.get(branch)?.get(trim(path))?;
        state.blobs.get(sha).cloned()
    }

    /// Current identity of a file, if present.
    pub async fn sha_of(
        &self,
        owner: &str,
        name: &str,
        branch: Option<&str>,
        path: &str,
    ) -> Option<String> {
        let state = self.inner.state.read().await;
        let repo = state.repos.get(&(owner.to_string(), name.to_string()))?;
        let branch = branch.unwrap_or(&repo.default_branch);
        repo.branches.get(branch)?.get(trim(path)).cloned()
    }

    /// Store a gist directly, bypassing the call log.
    pub async fn add_gist(&self, id: &str, files: &[(&str, &str)]) {
        let mut state = self.inner.state.write().await;
        let record = GistRecord {
            id: id.to_string(),
            description: None,
            public: true,
            owner: self.inner.login.clone(),
            files: files
                .iter()
                .map(|(name, content)| (name.to_string(), GistFile::new(*name, *content)))
                .collect(),
        };
        state.gists.insert(id.to_string(), record);
    }

    pub async fn gist_record(&self, id: &str) -> Option<GistRecord> {
        self.inner.state.read().await.gists.get(id).cloned()
    }

    /// Every call recorded so far, oldest first.
    pub fn calls(&self) -> Vec<RemoteCall> {
        lock(&self.inner.calls).clone()
    }

    pub fn clear_calls(&self) {
        lock(&self.inner.calls).clear();
    }

    /// Make the next call to `op` (e.g. `"get_sha"`) fail with `error`.
    pub fn fail_next(&self, op: &'static str, error: RemoteError) {
        lock(&self.inner.failures).insert(op, error);
    }

    fn record(&self, call: RemoteCall) {
        lock(&self.inner.calls).push(call);
    }

    fn check(&self, token: &str, op: &'static str) -> RemoteResult<()> {
        if let Some(expected) = &self.inner.token {
            if expected != token {
                return Err(RemoteError::Unauthorized);
            }
        }
        match lock(&self.inner.failures).remove(op) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

impl Connector for MemoryHub {
    fn repo(&self, token: &str, owner: &str, name: &str) -> Arc<dyn RepoApi> {
        self.record(RemoteCall::Connect {
            token: token.to_string(),
        });
        Arc::new(MemoryRepo {
            hub: self.clone(),
            token: token.to_string(),
            key: (owner.to_string(), name.to_string()),
        })
    }

    fn gist(&self, token: &str, gist_id: &str) -> Arc<dyn GistApi> {
        self.record(RemoteCall::Connect {
            token: token.to_string(),
        });
        Arc::new(MemoryGist {
            hub: self.clone(),
            token: token.to_string(),
            id: gist_id.to_string(),
        })
    }

    fn user(&self, token: &str) -> Arc<dyn UserApi> {
        self.record(RemoteCall::Connect {
            token: token.to_string(),
        });
        Arc::new(MemoryUser {
            hub: self.clone(),
            token: token.to_string(),
        })
    }
}

struct MemoryRepo {
    hub: MemoryHub,
    token: String,
    key: (String, String),
}

impl MemoryRepo {
    fn full_name(&self) -> String {
        format!("{}/{}", self.key.0, self.key.1)
    }

    fn repository<'a>(&self, state: &'a State) -> RemoteResult<&'a Repository> {
        state
            .repos
            .get(&self.key)
            .ok_or_else(|| RemoteError::NotFound(self.full_name()))
    }

    fn files<'a>(
        &self,
        state: &'a State,
        branch: Option<&str>,
    ) -> RemoteResult<&'a BTreeMap<String, String>> {
        let repo = self.repository(state)?;
        let branch = branch.unwrap_or(&repo.default_branch);
        repo.branches
            .get(branch)
            .ok_or_else(|| RemoteError::NotFound(format!("branch {branch}")))
    }

    fn files_mut<'a>(
        &self,
        state: &'a mut State,
        branch: Option<&str>,
    ) -> RemoteResult<&'a mut BTreeMap<String, String>> {
        let full_name = self.full_name();
        let repo = state
            .repos
            .get_mut(&self.key)
            .ok_or(RemoteError::NotFound(full_name))?;
        let branch = branch.unwrap_or(&repo.default_branch).to_string();
        repo.branches
            .get_mut(&branch)
            .ok_or_else(|| RemoteError::NotFound(format!("branch {branch}")))
    }
}

#[async_trait]
impl RepoApi for MemoryRepo {
    async fn get_sha(&self, branch: Option<&str>, path: &str) -> RemoteResult<String> {
        self.hub.record(RemoteCall::GetSha {
            branch: branch.map(String::from),
            path: path.to_string(),
        });
        self.hub.check(&self.token, "get_sha")?;

        let state = self.hub.inner.state.read().await;
        let files = self.files(&state, branch)?;
        let path = trim(path);
        if let Some(sha) = files.get(path) {
            return Ok(sha.clone());
        }
        if path.is_empty() || files.keys().any(|k| is_under(k, path)) {
            return Ok(tree_sha(path));
        }
        Err(RemoteError::NotFound(path.to_string()))
    }

    async fn get_blob(&self, sha: &str) -> RemoteResult<Vec<u8>> {
        self.hub.record(RemoteCall::GetBlob {
            sha: sha.to_string(),
        });
        self.hub.check(&self.token, "get_blob")?;

        let state = self.hub.inner.state.read().await;
        state
            .blobs
            .get(sha)
            .cloned()
            .ok_or_else(|| RemoteError::NotFound(format!("blob {sha}")))
    }

    async fn write_file(
        &self,
        branch: Option<&str>,
        path: &str,
        upload: &Upload,
        message: &str,
    ) -> RemoteResult<()> {
        self.hub.record(RemoteCall::WriteFile {
            branch: branch.map(String::from),
            path: path.to_string(),
            message: message.to_string(),
            encoded: upload.encoded,
        });
        self.hub.check(&self.token, "write_file")?;

        let bytes = upload
            .to_bytes()
            .map_err(|e| RemoteError::BadRequest(e.to_string()))?;
        let path = trim(path);
        if path.is_empty() {
            return Err(RemoteError::BadRequest("empty path".to_string()));
        }

        let mut state = self.hub.inner.state.write().await;
        let sha = blob_sha(&bytes);
        {
            let files = self.files_mut(&mut state, branch)?;
            if files.keys().any(|k| is_under(k, path)) {
                return Err(RemoteError::BadRequest(format!("{path} is a directory")));
            }
            files.insert(path.to_string(), sha.clone());
        }
        state.blobs.insert(sha, bytes);
        Ok(())
    }

    async fn delete_file(
        &self,
        branch: Option<&str>,
        path: &str,
        message: &str,
        sha: &str,
    ) -> RemoteResult<()> {
        self.hub.record(RemoteCall::DeleteFile {
            branch: branch.map(String::from),
            path: path.to_string(),
            message: message.to_string(),
            sha: sha.to_string(),
        });
        self.hub.check(&self.token, "delete_file")?;

        let mut state = self.hub.inner.state.write().await;
        let files = self.files_mut(&mut state, branch)?;
        let path = trim(path);
        let current = files.get(path).cloned();
        match current {
            None => Err(RemoteError::NotFound(path.to_string())),
            Some(current) if current != sha => Err(RemoteError::Conflict(format!(
                "{path} does not match {sha}"
            ))),
            Some(_) => {
                files.remove(path);
                Ok(())
            }
        }
    }

    async fn move_file(&self, branch: Option<&str>, from: &str, to: &str) -> RemoteResult<()> {
        self.hub.record(RemoteCall::MoveFile {
            branch: branch.map(String::from),
            from: from.to_string(),
            to: to.to_string(),
        });
        self.hub.check(&self.token, "move_file")?;

        let mut state = self.hub.inner.state.write().await;
        let files = self.files_mut(&mut state, branch)?;
        let (from, to) = (trim(from), trim(to));
        if files.contains_key(to) || files.keys().any(|k| is_under(k, to)) {
            return Err(RemoteError::AlreadyExists(to.to_string()));
        }

        let moving: Vec<String> = files
            .keys()
            .filter(|k| k.as_str() == from || is_under(k, from))
            .cloned()
            .collect();
        if moving.is_empty() {
            return Err(RemoteError::NotFound(from.to_string()));
        }
        for old in moving {
            if let Some(sha) = files.remove(&old) {
                let new = format!("{to}{}", &old[from.len()..]);
                files.insert(new, sha);
            }
        }
        Ok(())
    }

    async fn create_branch(&self, from: &str, name: &str) -> RemoteResult<()> {
        self.hub.record(RemoteCall::CreateBranch {
            from: from.to_string(),
            name: name.to_string(),
        });
        self.hub.check(&self.token, "create_branch")?;

        let mut state = self.hub.inner.state.write().await;
        let full_name = self.full_name();
        let repo = state
            .repos
            .get_mut(&self.key)
            .ok_or(RemoteError::NotFound(full_name))?;
        if repo.branches.contains_key(name) {
            return Err(RemoteError::AlreadyExists(format!("branch {name}")));
        }
        let files = repo
            .branches
            .get(from)
            .cloned()
            .ok_or_else(|| RemoteError::NotFound(format!("branch {from}")))?;
        repo.branches.insert(name.to_string(), files);
        Ok(())
    }

    async fn list_directory(
        &self,
        branch: Option<&str>,
        path: &str,
    ) -> RemoteResult<Vec<RemoteEntry>> {
        self.hub.record(RemoteCall::ListDirectory {
            branch: branch.map(String::from),
            path: path.to_string(),
        });
        self.hub.check(&self.token, "list_directory")?;

        let state = self.hub.inner.state.read().await;
        let files = self.files(&state, branch)?;
        let dir = trim(path);
        if !dir.is_empty() && files.contains_key(dir) {
            return Err(RemoteError::NotADirectory(dir.to_string()));
        }

        let mut entries: BTreeMap<String, RemoteEntry> = BTreeMap::new();
        for key in files.keys() {
            let rel = if dir.is_empty() {
                key.as_str()
            } else if is_under(key, dir) {
                &key[dir.len() + 1..]
            } else {
                continue;
            };
            let (name, kind) = match rel.split_once('/') {
                Some((name, _)) => (name, EntryKind::Dir),
                None => (rel, EntryKind::File),
            };
            let child = if dir.is_empty() {
                name.to_string()
            } else {
                format!("{dir}/{name}")
            };
            entries.entry(name.to_string()).or_insert(RemoteEntry {
                name: name.to_string(),
                path: child,
                kind,
            });
        }

        if !dir.is_empty() && entries.is_empty() {
            return Err(RemoteError::NotFound(dir.to_string()));
        }
        Ok(entries.into_values().collect())
    }

    async fn list_branches(&self) -> RemoteResult<Vec<String>> {
        self.hub.record(RemoteCall::ListBranches);
        self.hub.check(&self.token, "list_branches")?;

        let state = self.hub.inner.state.read().await;
        Ok(self.repository(&state)?.branches.keys().cloned().collect())
    }
}

struct MemoryGist {
    hub: MemoryHub,
    token: String,
    id: String,
}

#[async_trait]
impl GistApi for MemoryGist {
    async fn read(&self) -> RemoteResult<GistRecord> {
        self.hub.record(RemoteCall::GistRead {
            id: self.id.clone(),
        });
        self.hub.check(&self.token, "gist_read")?;

        let state = self.hub.inner.state.read().await;
        state
            .gists
            .get(&self.id)
            .cloned()
            .ok_or_else(|| RemoteError::NotFound(format!("gist {}", self.id)))
    }

    async fn update(&self, files: BTreeMap<String, Option<String>>) -> RemoteResult<GistRecord> {
        self.hub.record(RemoteCall::GistUpdate {
            id: self.id.clone(),
            files: files.keys().cloned().collect(),
        });
        self.hub.check(&self.token, "gist_update")?;

        let mut state = self.hub.inner.state.write().await;
        let record = state
            .gists
            .get_mut(&self.id)
            .ok_or_else(|| RemoteError::NotFound(format!("gist {}", self.id)))?;
        for (name, content) in files {
            match content {
                Some(content) => {
                    record.files.insert(name.clone(), GistFile::new(name, content));
                }
                None => {
                    if record.files.remove(&name).is_none() {
                        return Err(RemoteError::NotFound(name));
                    }
                }
            }
        }
        Ok(record.clone())
    }

    async fn delete(&self) -> RemoteResult<()> {
        self.hub.record(RemoteCall::GistDelete {
            id: self.id.clone(),
        });
        self.hub.check(&self.token, "gist_delete")?;

        let mut state = self.hub.inner.state.write().await;
        state
            .gists
            .remove(&self.id)
            .map(|_| ())
            .ok_or_else(|| RemoteError::NotFound(format!("gist {}", self.id)))
    }
}

struct MemoryUser {
    hub: MemoryHub,
    token: String,
}

#[async_trait]
impl UserApi for MemoryUser {
    async fn list_repositories(&self) -> RemoteResult<Vec<RepoSummary>> {
        self.hub.record(RemoteCall::ListRepositories);
        self.hub.check(&self.token, "list_repositories")?;

        let state = self.hub.inner.state.read().await;
        Ok(state
            .repos
            .iter()
            .map(|((owner, name), repo)| RepoSummary {
                owner: owner.clone(),
                name: name.clone(),
                private: repo.private,
            })
            .collect())
    }

    async fn list_gists(&self) -> RemoteResult<Vec<GistRecord>> {
        self.hub.record(RemoteCall::ListGists);
        self.hub.check(&self.token, "list_gists")?;

        let state = self.hub.inner.state.read().await;
        Ok(state.gists.values().cloned().collect())
    }

    async fn create_gist(&self, gist: NewGist) -> RemoteResult<GistRecord> {
        self.hub.record(RemoteCall::CreateGist);
        self.hub.check(&self.token, "create_gist")?;

        if gist.files.is_empty() {
            return Err(RemoteError::BadRequest("a gist needs at least one file".to_string()));
        }
        let mut state = self.hub.inner.state.write().await;
        state.next_gist += 1;
        let id = format!("{:032x}", state.next_gist);
        let record = GistRecord {
            id: id.clone(),
            description: gist.description,
            public: gist.public,
            owner: self.hub.inner.login.clone(),
            files: gist
                .files
                .into_iter()
                .map(|(name, content)| (name.clone(), GistFile::new(name, content)))
                .collect(),
        };
        state.gists.insert(id, record.clone());
        Ok(record)
    }
}
