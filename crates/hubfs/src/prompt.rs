//! Host prompt seam.

use async_trait::async_trait;

/// Asks the user for a line of text.
///
/// `None` means the prompt was dismissed.
#[async_trait]
pub trait Prompt: Send + Sync {
    async fn text(&self, title: &str, default: &str) -> Option<String>;
}

/// Answers every prompt with its default. For non-interactive hosts.
#[derive(Debug, Default, Clone, Copy)]
pub struct AcceptDefault;

#[async_trait]
impl Prompt for AcceptDefault {
    async fn text(&self, _title: &str, default: &str) -> Option<String> {
        Some(default.to_string())
    }
}
