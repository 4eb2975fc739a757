//! Session credential shared by all handles.
//!
//! The token is resolved at most once per session, even when many operations
//! ask for it at the same time. A failed resolution is not remembered, so the
//! next operation tries again.

use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use thiserror::Error;

use crate::prompt::Prompt;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CredentialError {
    #[error("no access token in ${0}")]
    MissingEnv(String),

    #[error("access token prompt was dismissed")]
    Declined,

    #[error("credential lookup failed: {0}")]
    Other(String),
}

/// Where the access token comes from.
#[async_trait]
pub trait CredentialSource: Send + Sync {
    async fn resolve(&self) -> Result<String, CredentialError>;
}

/// A fixed token.
#[derive(Clone)]
pub struct StaticCredential(String);

impl StaticCredential {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

impl std::fmt::Debug for StaticCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("StaticCredential(..)")
    }
}

#[async_trait]
impl CredentialSource for StaticCredential {
    async fn resolve(&self) -> Result<String, CredentialError> {
        Ok(self.0.clone())
    }
}

/// Token read from an environment variable.
#[derive(Debug, Clone)]
pub struct EnvCredential {
    var: String,
}

impl EnvCredential {
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

#[async_trait]
impl CredentialSource for EnvCredential {
    async fn resolve(&self) -> Result<String, CredentialError> {
        match std::env::var(&self.var) {
            Ok(token) if !token.trim().is_empty() => Ok(token.trim().to_string()),
            _ => Err(CredentialError::MissingEnv(self.var.clone())),
        }
    }
}

/// Token typed in by the user.
pub struct PromptCredential {
    prompt: Arc<dyn Prompt>,
}

impl PromptCredential {
    pub fn new(prompt: Arc<dyn Prompt>) -> Self {
        Self { prompt }
    }
}

#[async_trait]
impl CredentialSource for PromptCredential {
    async fn resolve(&self) -> Result<String, CredentialError> {
        match self.prompt.text("Enter github token", "").await {
            Some(token) if !token.trim().is_empty() => Ok(token.trim().to_string()),
            _ => Err(CredentialError::Declined),
        }
    }
}

/// Memoized token accessor.
///
/// Callers that arrive while a resolution is in flight wait for it and share
/// its outcome, failure included.
pub struct SharedCredential {
    source: Arc<dyn CredentialSource>,
    state: Mutex<TokenState>,
    attempt: tokio::sync::Mutex<()>,
}

#[derive(Default)]
struct TokenState {
    token: Option<String>,
    attempts: u64,
    last_error: Option<CredentialError>,
}

impl SharedCredential {
    pub fn new(source: Arc<dyn CredentialSource>) -> Self {
        Self {
            source,
            state: Mutex::new(TokenState::default()),
            attempt: tokio::sync::Mutex::new(()),
        }
    }

    fn state(&self) -> MutexGuard<'_, TokenState> {
        self.state.lock().unwrap_or_else(|p| p.into_inner())
    }

    /// The session token, resolving it on first use.
    pub async fn token(&self) -> Result<String, CredentialError> {
        let seen = {
            let state = self.state();
            if let Some(token) = &state.token {
                return Ok(token.clone());
            }
            state.attempts
        };

        let _attempt = self.attempt.lock().await;
        {
            let state = self.state();
            if let Some(token) = &state.token {
                return Ok(token.clone());
            }
            if let Some(err) = state.last_error.as_ref().filter(|_| state.attempts != seen) {
                return Err(err.clone());
            }
        }

        tracing::debug!("resolving access token");
        let result = self.source.resolve().await;
        let mut state = self.state();
        state.attempts += 1;
        match &result {
            Ok(token) => {
                state.token = Some(token.clone());
                state.last_error = None;
            }
            Err(err) => state.last_error = Some(err.clone()),
        }
        result
    }

    /// Replace the token, e.g. after the user enters a new one.
    pub fn update(&self, token: impl Into<String>) {
        let mut state = self.state();
        state.token = Some(token.into());
        state.last_error = None;
    }

    /// Forget the token; the next call resolves again.
    pub fn reset(&self) {
        let mut state = self.state();
        state.token = None;
        state.last_error = None;
    }

    pub fn is_resolved(&self) -> bool {
        self.state().token.is_some()
    }
}

impl std::fmt::Debug for SharedCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedCredential")
            .field("resolved", &self.is_resolved())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Counting {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl CredentialSource for Counting {
        async fn resolve(&self) -> Result<String, CredentialError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::task::yield_now().await;
            Ok(format!("token-{n}"))
        }
    }

    struct Failing;

    #[async_trait]
    impl CredentialSource for Failing {
        async fn resolve(&self) -> Result<String, CredentialError> {
            Err(CredentialError::Declined)
        }
    }

    #[tokio::test]
    async fn test_concurrent_callers_resolve_once() {
        let source = Arc::new(Counting {
            calls: AtomicUsize::new(0),
        });
        let cred = SharedCredential::new(source.clone());

        let (a, b, c) = tokio::join!(cred.token(), cred.token(), cred.token());
        assert_eq!(a.unwrap(), "token-0");
        assert_eq!(b.unwrap(), "token-0");
        assert_eq!(c.unwrap(), "token-0");
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_update_and_reset() {
        let source = Arc::new(Counting {
            calls: AtomicUsize::new(0),
        });
        let cred = SharedCredential::new(source.clone());
        assert_eq!(cred.token().await.unwrap(), "token-0");

        cred.update("typed-in");
        assert_eq!(cred.token().await.unwrap(), "typed-in");

        cred.reset();
        assert!(!cred.is_resolved());
        assert_eq!(cred.token().await.unwrap(), "token-1");
    }

    #[tokio::test]
    async fn test_failure_is_not_cached() {
        let cred = SharedCredential::new(Arc::new(Failing));
        assert_eq!(cred.token().await.unwrap_err(), CredentialError::Declined);
        assert!(!cred.is_resolved());
    }

    #[tokio::test]
    async fn test_concurrent_callers_share_one_failure() {
        struct Dismissed {
            calls: AtomicUsize,
        }

        #[async_trait]
        impl CredentialSource for Dismissed {
            async fn resolve(&self) -> Result<String, CredentialError> {
                self.calls.fetch_add(1, Ordering::SeqCst);
                tokio::task::yield_now().await;
                Err(CredentialError::Declined)
            }
        }

        let source = Arc::new(Dismissed {
            calls: AtomicUsize::new(0),
        });
        let cred = SharedCredential::new(source.clone());

        let (a, b, c) = tokio::join!(cred.token(), cred.token(), cred.token());
        for result in [a, b, c] {
            assert_eq!(result.unwrap_err(), CredentialError::Declined);
        }
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);

        assert_eq!(cred.token().await.unwrap_err(), CredentialError::Declined);
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_env_credential_missing() {
        let source = EnvCredential::new("HUBFS_TEST_TOKEN_THAT_IS_NOT_SET");
        assert_eq!(
            source.resolve().await.unwrap_err(),
            CredentialError::MissingEnv("HUBFS_TEST_TOKEN_THAT_IS_NOT_SET".into())
        );
    }

    #[tokio::test]
    async fn test_prompt_credential_declined() {
        struct Dismiss;

        #[async_trait]
        impl Prompt for Dismiss {
            async fn text(&self, _: &str, _: &str) -> Option<String> {
                None
            }
        }

        let source = PromptCredential::new(Arc::new(Dismiss));
        assert_eq!(source.resolve().await.unwrap_err(), CredentialError::Declined);
    }
}
