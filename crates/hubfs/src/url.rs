//! The `gh://` URL scheme.
//!
//! ```text
//! gh://repo/{owner}/{repo}[@{branch}]/{path...}
//! gh://gist/{gist_id}/{file_name}
//! ```
//!
//! No percent-encoding is performed. Path segments are separated by `/` and
//! must not contain it. An empty repository path is the repository root.

use std::fmt;
use std::str::FromStr;

use crate::error::{FsError, FsResult};

/// URL scheme handled by this crate.
pub const SCHEME: &str = "gh";

const PREFIX: &str = "gh://";

/// Backend kind encoded in the first URL segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Repo,
    Gist,
}

impl Kind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Kind::Repo => "repo",
            Kind::Gist => "gist",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A location inside a repository branch.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepoLocation {
    pub owner: String,
    pub repo: String,
    /// `None` means the repository's default branch.
    pub branch: Option<String>,
    /// Path without a leading `/`. Empty for the root.
    pub path: String,
}

impl RepoLocation {
    pub fn new(
        owner: impl Into<String>,
        repo: impl Into<String>,
        branch: Option<String>,
        path: &str,
    ) -> Self {
        Self {
            owner: owner.into(),
            repo: repo.into(),
            branch: branch.filter(|b| !b.is_empty()),
            path: normalize(path).to_string(),
        }
    }

    pub fn is_root(&self) -> bool {
        self.path.is_empty()
    }

    /// Same repository and branch, different path.
    pub fn with_path(&self, path: &str) -> Self {
        Self {
            owner: self.owner.clone(),
            repo: self.repo.clone(),
            branch: self.branch.clone(),
            path: normalize(path).to_string(),
        }
    }

    /// True when both locations address the same repository branch.
    pub fn same_tree(&self, other: &RepoLocation) -> bool {
        self.owner == other.owner && self.repo == other.repo && self.branch == other.branch
    }

    pub fn branch(&self) -> Option<&str> {
        self.branch.as_deref()
    }
}

/// A single file inside a gist.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GistLocation {
    pub gist_id: String,
    pub file_name: String,
}

impl GistLocation {
    pub fn new(gist_id: impl Into<String>, file_name: impl Into<String>) -> Self {
        Self {
            gist_id: gist_id.into(),
            file_name: file_name.into(),
        }
    }
}

/// A decoded `gh://` URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RemoteUrl {
    Repo(RepoLocation),
    Gist(GistLocation),
}

impl RemoteUrl {
    pub fn repo(owner: &str, repo: &str, branch: Option<&str>, path: &str) -> Self {
        Self::Repo(RepoLocation::new(owner, repo, branch.map(String::from), path))
    }

    pub fn gist(gist_id: &str, file_name: &str) -> Self {
        Self::Gist(GistLocation::new(gist_id, file_name))
    }

    pub fn parse(url: &str) -> FsResult<Self> {
        decode(url)
    }

    pub fn kind(&self) -> Kind {
        match self {
            Self::Repo(_) => Kind::Repo,
            Self::Gist(_) => Kind::Gist,
        }
    }
}

impl fmt::Display for RemoteUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Repo(loc) => f.write_str(&encode(
                Kind::Repo,
                &loc.owner,
                &loc.repo,
                &loc.path,
                loc.branch(),
            )),
            Self::Gist(loc) => f.write_str(&encode(
                Kind::Gist,
                "",
                &loc.gist_id,
                &loc.file_name,
                None,
            )),
        }
    }
}

impl FromStr for RemoteUrl {
    type Err = FsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        decode(s)
    }
}

impl From<RepoLocation> for RemoteUrl {
    fn from(loc: RepoLocation) -> Self {
        Self::Repo(loc)
    }
}

impl From<GistLocation> for RemoteUrl {
    fn from(loc: GistLocation) -> Self {
        Self::Gist(loc)
    }
}

/// Build a URL from its parts.
///
/// For gists `owner` and `branch` are ignored: the gist id and file name are
/// the whole identity.
pub fn encode(
    kind: Kind,
    owner: &str,
    repo_or_gist: &str,
    path: &str,
    branch: Option<&str>,
) -> String {
    match kind {
        Kind::Gist => format!("{PREFIX}gist/{repo_or_gist}/{path}"),
        Kind::Repo => {
            let mut url = format!("{PREFIX}repo/{owner}/{repo_or_gist}");
            if let Some(branch) = branch.filter(|b| !b.is_empty()) {
                url.push('@');
                url.push_str(branch);
            }
            let path = normalize(path);
            if !path.is_empty() {
                url.push('/');
                url.push_str(path);
            }
            url
        }
    }
}

/// Parse a `gh://` URL.
pub fn decode(url: &str) -> FsResult<RemoteUrl> {
    let rest = url
        .strip_prefix(PREFIX)
        .ok_or_else(|| FsError::invalid_url(url, format!("expected `{PREFIX}` prefix")))?;

    let mut segments = rest.split('/');
    let kind = segments.next().unwrap_or_default();

    match kind {
        "gist" => {
            let gist_id = segments
                .next()
                .filter(|s| !s.is_empty())
                .ok_or_else(|| FsError::invalid_url(url, "missing gist id"))?;
            let file_name = segments
                .next()
                .filter(|s| !s.is_empty())
                .ok_or_else(|| FsError::invalid_url(url, "missing gist file name"))?;
            if segments.next().is_some() {
                return Err(FsError::invalid_url(url, "gists have no nested paths"));
            }
            Ok(RemoteUrl::gist(gist_id, file_name))
        }
        "repo" => {
            let owner = segments
                .next()
                .filter(|s| !s.is_empty())
                .ok_or_else(|| FsError::invalid_url(url, "missing owner"))?;
            let repo_at_branch = segments
                .next()
                .filter(|s| !s.is_empty())
                .ok_or_else(|| FsError::invalid_url(url, "missing repository name"))?;
            let (repo, branch) = match repo_at_branch.split_once('@') {
                Some((repo, branch)) => (repo, Some(branch)),
                None => (repo_at_branch, None),
            };
            if repo.is_empty() {
                return Err(FsError::invalid_url(url, "missing repository name"));
            }
            let path = segments.collect::<Vec<_>>().join("/");
            Ok(RemoteUrl::repo(owner, repo, branch, &path))
        }
        "" => Err(FsError::invalid_url(url, "missing kind")),
        other => Err(FsError::UnknownKind(other.to_string())),
    }
}

/// Strip leading separators. `"/"` becomes the empty root path.
fn normalize(path: &str) -> &str {
    path.trim_start_matches('/')
}

/// Join a directory path and a name with a single separator.
pub fn join_path(dir: &str, name: &str) -> String {
    let dir = dir.trim_end_matches('/');
    let name = name.trim_start_matches('/');
    if dir.is_empty() {
        name.to_string()
    } else {
        format!("{dir}/{name}")
    }
}

/// Parent directory of a path; empty for top-level entries.
pub fn parent_path(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    match trimmed.rsplit_once('/') {
        Some((parent, _)) => parent,
        None => "",
    }
}

/// Last segment of a path, ignoring a trailing separator.
pub fn base_name(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    match trimmed.rsplit_once('/') {
        Some((_, name)) => name,
        None => trimmed,
    }
}
