//! Scheme-keyed provider table.
//!
//! The host asks the router to perform an operation on a URL; the router
//! picks the provider registered for the URL's scheme, opens a fresh handle
//! and runs the operation on it. Handles are never reused across calls.

use std::collections::BTreeMap;
use std::sync::Arc;

use super::handle::Handle;
use super::types::{DirEntry, Stat};
use crate::encoding::{Content, FileData};
use crate::error::{FsError, FsResult, Operation};

/// Opens handles for one URL scheme.
pub trait Provider: Send + Sync {
    /// Scheme without `://`, e.g. `gh`.
    fn scheme(&self) -> &str;

    fn matches(&self, url: &str) -> bool {
        url.strip_prefix(self.scheme())
            .is_some_and(|rest| rest.starts_with("://"))
    }

    fn open(&self, url: &str) -> FsResult<Handle>;
}

/// Registry of providers.
#[derive(Default)]
pub struct FsRouter {
    providers: BTreeMap<String, Arc<dyn Provider>>,
}

fn scheme_of(url: &str) -> &str {
    url.split_once("://").map_or("", |(scheme, _)| scheme)
}

impl FsRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a provider, replacing and returning any previous provider
    /// for the same scheme.
    pub fn register(&mut self, provider: Arc<dyn Provider>) -> Option<Arc<dyn Provider>> {
        let scheme = provider.scheme().to_string();
        let previous = self.providers.insert(scheme.clone(), provider);
        if previous.is_some() {
            tracing::debug!(%scheme, "replaced filesystem provider");
        }
        previous
    }

    pub fn unregister(&mut self, scheme: &str) -> Option<Arc<dyn Provider>> {
        self.providers.remove(scheme)
    }

    pub fn schemes(&self) -> Vec<&str> {
        self.providers.keys().map(String::as_str).collect()
    }

    pub fn provider_for(&self, url: &str) -> Option<Arc<dyn Provider>> {
        self.providers
            .get(scheme_of(url))
            .filter(|provider| provider.matches(url))
            .cloned()
    }

    /// A fresh handle on `url`.
    pub fn open(&self, url: &str) -> FsResult<Handle> {
        let provider = self
            .provider_for(url)
            .ok_or_else(|| FsError::NoProvider(url.to_string()))?;
        provider.open(url)
    }

    pub fn supports(&self, url: &str, op: Operation) -> FsResult<bool> {
        Ok(self.open(url)?.supports(op))
    }

    pub async fn list(&self, url: &str) -> FsResult<Vec<DirEntry>> {
        self.open(url)?.list().await
    }

    pub async fn read(&self, url: &str, encoding: Option<&str>) -> FsResult<Content> {
        self.open(url)?.read(encoding).await
    }

    pub async fn read_text(&self, url: &str) -> FsResult<String> {
        self.open(url)?.read_text().await
    }

    pub async fn write(
        &self,
        url: &str,
        data: impl Into<FileData>,
        encoding: Option<&str>,
    ) -> FsResult<()> {
        self.open(url)?.write(data, encoding).await
    }

    pub async fn create_file(
        &self,
        url: &str,
        name: &str,
        data: impl Into<FileData>,
    ) -> FsResult<String> {
        self.open(url)?.create_file(name, data).await
    }

    pub async fn create_directory(&self, url: &str, name: &str) -> FsResult<String> {
        self.open(url)?.create_directory(name).await
    }

    pub async fn delete(&self, url: &str) -> FsResult<()> {
        self.open(url)?.delete().await
    }

    pub async fn move_to(&self, url: &str, destination: &str) -> FsResult<String> {
        self.open(url)?.move_to(destination).await
    }

    pub async fn rename_to(&self, url: &str, name: &str) -> FsResult<String> {
        self.open(url)?.rename_to(name).await
    }

    pub async fn copy_to(&self, url: &str, destination: &str) -> FsResult<String> {
        self.open(url)?.copy_to(destination).await
    }

    pub async fn exists(&self, url: &str) -> FsResult<bool> {
        self.open(url)?.exists().await
    }

    pub async fn stat(&self, url: &str) -> FsResult<Stat> {
        self.open(url)?.stat().await
    }
}

impl std::fmt::Debug for FsRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FsRouter")
            .field("schemes", &self.schemes())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scheme_is_text_before_separator() {
        assert_eq!(scheme_of("gh://repo/a/b"), "gh");
        assert_eq!(scheme_of("file:///tmp"), "file");
        assert_eq!(scheme_of("no-scheme"), "");
    }

    #[test]
    fn unknown_scheme_has_no_provider() {
        let router = FsRouter::new();
        let err = router.open("s3://bucket/key").unwrap_err();
        assert!(matches!(err, FsError::NoProvider(url) if url == "s3://bucket/key"));
    }
}
