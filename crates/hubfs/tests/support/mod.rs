#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use hubfs::credential::{SharedCredential, StaticCredential};
use hubfs::prompt::{AcceptDefault, Prompt};
use hubfs::remote::memory::{MemoryHub, RemoteCall};
use hubfs::vfs::{FsRouter, HubFs};
use hubfs::{HubContext, Settings};

pub const TOKEN: &str = "ghp_test";

/// Prompt that replays queued answers and records what it was asked.
#[derive(Default)]
pub struct Scripted {
    answers: Mutex<VecDeque<Option<String>>>,
    pub seen: Mutex<Vec<(String, String)>>,
}

impl Scripted {
    pub fn answering(answers: &[Option<&str>]) -> Arc<Self> {
        Arc::new(Self {
            answers: Mutex::new(answers.iter().map(|a| a.map(String::from)).collect()),
            seen: Mutex::new(Vec::new()),
        })
    }

    pub fn seen(&self) -> Vec<(String, String)> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl Prompt for Scripted {
    async fn text(&self, title: &str, default: &str) -> Option<String> {
        self.seen
            .lock()
            .unwrap()
            .push((title.to_string(), default.to_string()));
        self.answers.lock().unwrap().pop_front().flatten()
    }
}

pub fn quiet() -> Settings {
    Settings {
        ask_commit_message: false,
        ..Settings::default()
    }
}

pub fn context(hub: &MemoryHub, settings: Settings, prompt: Arc<dyn Prompt>) -> Arc<HubContext> {
    let credential = Arc::new(SharedCredential::new(Arc::new(StaticCredential::new(TOKEN))));
    Arc::new(HubContext::new(
        Arc::new(hub.clone()),
        credential,
        settings,
        prompt,
    ))
}

pub fn router_with(hub: &MemoryHub, settings: Settings, prompt: Arc<dyn Prompt>) -> FsRouter {
    let mut router = FsRouter::new();
    HubFs::new(context(hub, settings, prompt)).install(&mut router);
    router
}

/// Router that never prompts.
pub fn router(hub: &MemoryHub) -> FsRouter {
    router_with(hub, quiet(), Arc::new(AcceptDefault))
}

/// `acme/widgets` with a handful of files on `main`.
pub async fn widgets() -> MemoryHub {
    let hub = MemoryHub::with_token(TOKEN);
    hub.add_repo("acme", "widgets").await;
    hub.put_file("acme", "widgets", None, "README.md", b"# Widgets\n").await;
    hub.put_file("acme", "widgets", None, "src/lib.rs", b"pub fn answer() -> u32 { 42 }\n")
        .await;
    hub.put_file("acme", "widgets", None, "src/util/mod.rs", b"").await;
    hub.put_file("acme", "widgets", None, "logo.png", &[0x89, b'P', b'N', b'G', 0, 0xff])
        .await;
    hub
}

pub fn mutations(hub: &MemoryHub) -> Vec<RemoteCall> {
    hub.calls().into_iter().filter(RemoteCall::is_mutation).collect()
}
