//! hubfs: a virtual filesystem over hosted git repositories and gists.
//!
//! Files are addressed by `gh://` URLs:
//!
//! ```text
//! gh://repo/{owner}/{repo}[@{branch}]/{path...}
//! gh://gist/{gist_id}/{file_name}
//! ```
//!
//! # Shape
//!
//! - [`url`] encodes and decodes addresses.
//! - [`encoding`] bridges bytes, text and named charsets.
//! - [`vfs`] holds the per-URL [`vfs::Handle`], the repository and gist
//!   backends behind it, and the scheme-keyed [`vfs::FsRouter`].
//! - [`remote`] is the seam to the hosting service, with an in-memory
//!   implementation in [`remote::memory`].
//! - [`credential`] memoizes the session token; [`commit`] asks for commit
//!   messages; [`catalog`] lists and creates repositories, branches and gists.
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use hubfs::prompt::AcceptDefault;
//! use hubfs::remote::memory::MemoryHub;
//! use hubfs::vfs::{FsRouter, HubFs};
//! use hubfs::{HubContext, Settings};
//!
//! # async fn demo() -> hubfs::FsResult<()> {
//! let ctx = HubContext::from_env(
//!     Arc::new(MemoryHub::new()),
//!     Settings::default(),
//!     Arc::new(AcceptDefault),
//! );
//! let mut router = FsRouter::new();
//! HubFs::new(Arc::new(ctx)).install(&mut router);
//!
//! let readme = router.read_text("gh://repo/acme/widgets/README.md").await?;
//! # let _ = readme;
//! # Ok(())
//! # }
//! ```

pub mod catalog;
pub mod commit;
pub mod config;
pub mod context;
pub mod credential;
pub mod encoding;
pub mod error;
pub mod prompt;
pub mod remote;
pub mod url;
pub mod vfs;

pub use catalog::Catalog;
pub use config::Settings;
pub use context::HubContext;
pub use error::{FsError, FsResult, Operation};
pub use url::RemoteUrl;
