//! File operations over `gh://` URLs.

mod dispatch;
mod gist;
mod handle;
mod repo;
mod router;
mod types;

pub use dispatch::HubFs;
pub use gist::GistHandle;
pub use handle::Handle;
pub use repo::RepoHandle;
pub use router::{FsRouter, Provider};
pub use types::{DirEntry, Stat};
