use async_trait::async_trait;

use crate::error::Result;

/// A text-completion service: prompt in, text out. Implementations own their
/// transport, credentials and timeouts.
#[async_trait]
pub trait TextCompletion: Send + Sync {
    fn name(&self) -> &str;
    async fn complete(&self, prompt: &str) -> Result<String>;
}
