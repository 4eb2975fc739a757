//! Commit message gate for repository mutations.

use std::sync::Arc;

use crate::error::{FsError, FsResult};
use crate::prompt::{AcceptDefault, Prompt};

/// Kind of repository mutation a message is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitAction {
    Update,
    Create,
    Delete,
}

impl CommitAction {
    pub fn verb(&self) -> &'static str {
        match self {
            Self::Update => "update",
            Self::Create => "create",
            Self::Delete => "delete",
        }
    }

    pub fn default_message(&self, path: &str) -> String {
        format!("{} {path}", self.verb())
    }
}

/// Decides the commit message, and whether the mutation happens at all.
#[derive(Clone)]
pub struct CommitGate {
    ask: bool,
    prompt: Arc<dyn Prompt>,
}

impl CommitGate {
    pub fn new(ask: bool, prompt: Arc<dyn Prompt>) -> Self {
        Self { ask, prompt }
    }

    /// Always use the default message.
    pub fn silent() -> Self {
        Self::new(false, Arc::new(AcceptDefault))
    }

    /// Message for `action` on `path`.
    ///
    /// Returns [`FsError::Aborted`] when the user dismisses the prompt or
    /// clears the message.
    pub async fn message(&self, action: CommitAction, path: &str) -> FsResult<String> {
        let default = action.default_message(path);
        if !self.ask {
            return Ok(default);
        }
        match self.prompt.text("Commit message", &default).await {
            Some(message) if !message.trim().is_empty() => Ok(message),
            _ => {
                tracing::info!(path, action = action.verb(), "commit aborted by user");
                Err(FsError::Aborted)
            }
        }
    }
}

impl std::fmt::Debug for CommitGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommitGate").field("ask", &self.ask).finish()
    }
}
