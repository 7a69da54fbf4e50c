//! Answer generation: context assembly plus a call to the language model.
//!
//! The retrieved chunks are joined, in rank order, into a context block
//! bounded by a [`ContextBudget`]. The block is substituted into the
//! instruction template's `{context}` placeholder to form the system
//! message; the question is sent as the user message.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::error::{ModelError, RagError, Result};
use crate::models::{Answer, Chunk};

/// Instruction template used when none is configured.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are an assistant for question-answering tasks. \
Use the following pieces of retrieved context to answer the question. \
If you don't know the answer, say that you don't know. \
Use three sentences maximum and keep the answer concise.\n\n{context}";

/// Placeholder replaced with the assembled context block.
pub const CONTEXT_PLACEHOLDER: &str = "{context}";

const CHUNK_SEPARATOR: &str = "\n\n";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One message of a chat-completion prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// A chat-completion endpoint.
///
/// Implementations may stream internally; callers only see the final
/// assembled string. Timeouts are the implementation's responsibility and
/// are reported as [`ModelError`].
#[async_trait]
pub trait LanguageModel: Send + Sync {
    fn model_name(&self) -> &str;
    async fn complete(&self, messages: &[ChatMessage]) -> std::result::Result<String, ModelError>;
}

/// Upper bound on the assembled context block, in characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContextBudget {
    pub max_chars: usize,
}

impl Default for ContextBudget {
    fn default() -> Self {
        Self { max_chars: 12_000 }
    }
}

/// Join chunks in rank order into a block of at most `budget.max_chars`
/// characters.
///
/// Whole chunks are added until the next one would overflow. If the first
/// chunk alone overflows it is cut at the budget so the block is never
/// empty when chunks exist. Returns the block and how many chunks it uses.
pub fn assemble_context(chunks: &[Chunk], budget: ContextBudget) -> (String, usize) {
    let sep_len = CHUNK_SEPARATOR.chars().count();
    let mut block = String::new();
    let mut used_chars = 0;
    let mut used = 0;

    for chunk in chunks {
        let len = chunk.text.chars().count();
        let needed = if used == 0 { len } else { sep_len + len };
        if used_chars + needed > budget.max_chars {
            if used == 0 {
                block.extend(chunk.text.chars().take(budget.max_chars));
                used = 1;
            }
            break;
        }
        if used > 0 {
            block.push_str(CHUNK_SEPARATOR);
        }
        block.push_str(&chunk.text);
        used_chars += needed;
        used += 1;
    }

    (block, used)
}

/// Composes prompts from retrieved chunks and asks the language model.
pub struct AnswerGenerator<'a> {
    model: &'a dyn LanguageModel,
    system_prompt: &'a str,
    budget: ContextBudget,
}

impl<'a> AnswerGenerator<'a> {
    pub fn new(model: &'a dyn LanguageModel) -> Self {
        Self {
            model,
            system_prompt: DEFAULT_SYSTEM_PROMPT,
            budget: ContextBudget::default(),
        }
    }

    /// Use a custom template. A template without `{context}` gets the block
    /// appended after a blank line.
    pub fn with_system_prompt(mut self, template: &'a str) -> Self {
        self.system_prompt = template;
        self
    }

    pub fn with_budget(mut self, budget: ContextBudget) -> Self {
        self.budget = budget;
        self
    }

    /// Build the `[system, user]` messages for `query`.
    pub fn compose(&self, query: &str, retrieved: &[Chunk]) -> (Vec<ChatMessage>, usize) {
        let (context, used) = assemble_context(retrieved, self.budget);
        let system = if self.system_prompt.contains(CONTEXT_PLACEHOLDER) {
            self.system_prompt.replace(CONTEXT_PLACEHOLDER, &context)
        } else {
            format!("{}\n\n{}", self.system_prompt, context)
        };
        (vec![ChatMessage::system(system), ChatMessage::user(query)], used)
    }

    /// Ask the model once. Failures become [`RagError::GenerationFailure`]
    /// and are not retried.
    pub async fn generate(&self, query: &str, retrieved: Vec<Chunk>) -> Result<Answer> {
        let (messages, used) = self.compose(query, &retrieved);
        let text = self.model.complete(&messages).await.map_err(|e| {
            error!(model = self.model.model_name(), error = %e, "generation failed");
            RagError::GenerationFailure(e)
        })?;

        info!(
            model = self.model.model_name(),
            context_chunks = used,
            retrieved = retrieved.len(),
            "generated answer"
        );

        Ok(Answer {
            text,
            context: retrieved,
            context_chunks_used: used,
        })
    }
}
