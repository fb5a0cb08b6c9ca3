//! The chat-model seam the classifier is built on.

use async_trait::async_trait;
use switchboard_common::Result;

/// One-shot chat completion.
///
/// Routing is single-turn: the classifier sends a system prompt
/// and the user's query, and reads back one assistant message. No history
/// is kept between calls.
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn complete(&self, system: &str, user: &str) -> Result<String>;

    fn model_name(&self) -> &str;
}

#[async_trait]
impl ChatModel for Box<dyn ChatModel> {
    async fn complete(&self, system: &str, user: &str) -> Result<String> {
        (**self).complete(system, user).await
    }

    fn model_name(&self) -> &str {
        (**self).model_name()
    }
}
