//! Session state shared by every handle.

use std::sync::Arc;

use crate::commit::CommitGate;
use crate::config::Settings;
use crate::credential::{EnvCredential, SharedCredential};
use crate::error::FsResult;
use crate::prompt::Prompt;
use crate::remote::Connector;

/// What a handle needs beyond its URL.
///
/// Built once by the host and passed around as `Arc<HubContext>`.
pub struct HubContext {
    connector: Arc<dyn Connector>,
    credential: Arc<SharedCredential>,
    gate: CommitGate,
    settings: Settings,
}

impl HubContext {
    pub fn new(
        connector: Arc<dyn Connector>,
        credential: Arc<SharedCredential>,
        settings: Settings,
        prompt: Arc<dyn Prompt>,
    ) -> Self {
        let gate = CommitGate::new(settings.ask_commit_message, prompt);
        Self {
            connector,
            credential,
            gate,
            settings,
        }
    }

    /// Context whose token comes from the environment variable named in
    /// `settings.token_env`.
    pub fn from_env(
        connector: Arc<dyn Connector>,
        settings: Settings,
        prompt: Arc<dyn Prompt>,
    ) -> Self {
        let source = EnvCredential::new(settings.token_env.clone());
        let credential = Arc::new(SharedCredential::new(Arc::new(source)));
        Self::new(connector, credential, settings, prompt)
    }

    pub fn connector(&self) -> &dyn Connector {
        self.connector.as_ref()
    }

    pub fn credential(&self) -> &Arc<SharedCredential> {
        &self.credential
    }

    pub fn gate(&self) -> &CommitGate {
        &self.gate
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub(crate) async fn token(&self) -> FsResult<String> {
        Ok(self.credential.token().await?)
    }
}

impl std::fmt::Debug for HubContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HubContext")
            .field("credential", &self.credential)
            .field("gate", &self.gate)
            .field("settings", &self.settings)
            .finish()
    }
}
