mod support;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use hubfs::credential::{CredentialError, CredentialSource, SharedCredential};
use hubfs::prompt::AcceptDefault;
use hubfs::remote::RemoteError;
use hubfs::remote::memory::{MemoryHub, RemoteCall};
use hubfs::vfs::{FsRouter, Handle, HubFs, Provider};
use hubfs::{FsError, FsResult, HubContext};
use rstest::rstest;
use support::{TOKEN, quiet, widgets};

/// Serves `mirror://` by rewriting to `gh://`.
struct Mirror(HubFs);

impl Provider for Mirror {
    fn scheme(&self) -> &str {
        "mirror"
    }

    fn open(&self, url: &str) -> FsResult<Handle> {
        let rewritten = url.replacen("mirror://", "gh://", 1);
        self.0.open(&rewritten)
    }
}

struct Counting {
    calls: AtomicUsize,
}

#[async_trait]
impl CredentialSource for Counting {
    async fn resolve(&self) -> Result<String, CredentialError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;
        Ok(TOKEN.to_string())
    }
}

fn hubfs(hub: &MemoryHub) -> HubFs {
    HubFs::new(support::context(hub, quiet(), Arc::new(AcceptDefault)))
}

#[tokio::test]
async fn test_reregistering_replaces_provider() {
    let first = widgets().await;
    let second = widgets().await;
    second
        .put_file("acme", "widgets", None, "README.md", b"from second")
        .await;

    let mut router = FsRouter::new();
    assert!(hubfs(&first).install(&mut router).is_none());
    let replaced = hubfs(&second).install(&mut router);
    assert_eq!(replaced.map(|p| p.scheme().to_string()).as_deref(), Some("gh"));
    assert_eq!(router.schemes(), ["gh"]);

    let text = router.read_text("gh://repo/acme/widgets/README.md").await.unwrap();
    assert_eq!(text, "from second");
    assert!(first.calls().is_empty());
}

#[tokio::test]
async fn test_providers_are_keyed_by_scheme() {
    let hub = widgets().await;
    let mut router = FsRouter::new();
    hubfs(&hub).install(&mut router);
    router.register(Arc::new(Mirror(hubfs(&hub))));

    assert_eq!(router.schemes(), ["gh", "mirror"]);
    assert_eq!(
        router.read_text("mirror://repo/acme/widgets/README.md").await.unwrap(),
        "# Widgets\n"
    );

    assert!(router.unregister("mirror").is_some());
    let err = router.open("mirror://repo/acme/widgets/README.md").unwrap_err();
    assert!(matches!(err, FsError::NoProvider(_)));
}

#[rstest]
#[case("file:///etc/hosts")]
#[case("gh:/repo/acme/widgets")]
#[case("not a url")]
fn test_unrouted_urls(#[case] url: &str) {
    let hub = MemoryHub::new();
    let mut router = FsRouter::new();
    hubfs(&hub).install(&mut router);

    let err = router.open(url).unwrap_err();
    assert!(matches!(err, FsError::NoProvider(_)), "{url}: {err}");
}

#[rstest]
#[case("gh://tree/acme/widgets", "tree")]
#[case("gh://blob/abc/file", "blob")]
fn test_unknown_kind(#[case] url: &str, #[case] kind: &str) {
    let hub = MemoryHub::new();
    let mut router = FsRouter::new();
    hubfs(&hub).install(&mut router);

    let err = router.open(url).unwrap_err();
    assert!(matches!(err, FsError::UnknownKind(ref k) if k == kind), "{err}");
    assert!(hub.calls().is_empty());
}

#[tokio::test]
async fn test_open_yields_backend_for_kind() {
    let hub = MemoryHub::new();
    let fs = hubfs(&hub);

    let repo = fs.open("gh://repo/acme/widgets@dev/src").unwrap();
    assert!(matches!(repo, Handle::Repo(ref h) if h.location().branch() == Some("dev")));
    assert_eq!(repo.url(), "gh://repo/acme/widgets@dev/src");

    let gist = fs.open("gh://gist/abc/notes.md").unwrap();
    assert!(matches!(gist, Handle::Gist(ref h) if h.location().file_name == "notes.md"));
}

#[tokio::test]
async fn test_concurrent_operations_resolve_token_once() {
    let hub = widgets().await;
    let source = Arc::new(Counting {
        calls: AtomicUsize::new(0),
    });
    let credential = Arc::new(SharedCredential::new(source.clone()));
    let ctx = Arc::new(HubContext::new(
        Arc::new(hub.clone()),
        credential.clone(),
        quiet(),
        Arc::new(AcceptDefault),
    ));
    let mut router = FsRouter::new();
    HubFs::new(ctx).install(&mut router);

    let (a, b, c) = tokio::join!(
        router.read_text("gh://repo/acme/widgets/README.md"),
        router.exists("gh://repo/acme/widgets/src/lib.rs"),
        router.list("gh://repo/acme/widgets/src"),
    );
    a.unwrap();
    assert!(b.unwrap());
    assert_eq!(c.unwrap().len(), 2);
    assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    assert!(credential.is_resolved());
}

#[tokio::test]
async fn test_wrong_token_surfaces_unauthorized() {
    let hub = widgets().await;
    let credential = Arc::new(SharedCredential::new(Arc::new(
        hubfs::credential::StaticCredential::new("stale"),
    )));
    let ctx = Arc::new(HubContext::new(
        Arc::new(hub.clone()),
        credential.clone(),
        quiet(),
        Arc::new(AcceptDefault),
    ));
    let mut router = FsRouter::new();
    HubFs::new(ctx).install(&mut router);

    let err = router
        .read_text("gh://repo/acme/widgets/README.md")
        .await
        .unwrap_err();
    assert!(matches!(err, FsError::Remote(RemoteError::Unauthorized)));

    credential.update(TOKEN);
    assert_eq!(
        router.read_text("gh://repo/acme/widgets/README.md").await.unwrap(),
        "# Widgets\n"
    );
    assert!(hub.calls().contains(&RemoteCall::Connect {
        token: TOKEN.to_string()
    }));
}

#[tokio::test]
async fn test_missing_credential_fails_before_remote_calls() {
    let hub = widgets().await;
    let settings = hubfs::Settings {
        token_env: "HUBFS_ROUTER_TEST_UNSET_TOKEN".into(),
        ..quiet()
    };
    let ctx = Arc::new(HubContext::from_env(
        Arc::new(hub.clone()),
        settings,
        Arc::new(AcceptDefault),
    ));
    let mut router = FsRouter::new();
    HubFs::new(ctx).install(&mut router);

    let err = router.exists("gh://repo/acme/widgets/README.md").await.unwrap_err();
    assert!(matches!(
        err,
        FsError::Credential(CredentialError::MissingEnv(ref var)) if var == "HUBFS_ROUTER_TEST_UNSET_TOKEN"
    ));
    assert!(hub.calls().is_empty());
}
