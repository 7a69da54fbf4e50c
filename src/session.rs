//! Multi-turn chat state.

use std::sync::Arc;

use docqa_core::{ChatMessage, LanguageModel, ModelError};

/// The selected model and the conversation so far.
///
/// A turn whose completion fails is rolled back, so the history only ever
/// holds answered user messages followed by their replies.
pub struct ChatSession {
    model: Arc<dyn LanguageModel>,
    history: Vec<ChatMessage>,
}

impl ChatSession {
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        Self {
            model,
            history: Vec::new(),
        }
    }

    /// Send `prompt` with the whole history and record the reply.
    pub async fn send(&mut self, prompt: &str) -> Result<String, ModelError> {
        self.history.push(ChatMessage::user(prompt));
        match self.model.complete(&self.history).await {
            Ok(reply) => {
                self.history.push(ChatMessage::assistant(reply.clone()));
                Ok(reply)
            }
            Err(e) => {
                self.history.pop();
                Err(e)
            }
        }
    }

    pub fn clear(&mut self) {
        self.history.clear();
    }

    pub fn history(&self) -> &[ChatMessage] {
        &self.history
    }

    pub fn model_name(&self) -> &str {
        self.model.model_name()
    }
}
