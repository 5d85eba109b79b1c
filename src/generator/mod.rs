//! Response generation
//!
//! A [`ResponseGenerator`] turns the latest prompt plus the conversation so
//! far into the assistant's next utterance. Failures are values, not errors:
//! [`Generation::Failed`] carries the reason and the coordinator converts it
//! to [`FALLBACK_REPLY`] with [`Generation::into_text`].

mod gemini;

use async_trait::async_trait;

pub use gemini::{
    Candidate, Content, GEMINI_API_BASE, GeminiClient, GenerateContentRequest,
    GenerateContentResponse, Part,
};

use crate::conversation::Message;
use crate::persona::FALLBACK_REPLY;

/// Outcome of one generation request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Generation {
    /// Text produced by the model, verbatim
    Reply(String),
    /// Transport, service, or empty-output failure
    Failed(String),
}

impl Generation {
    /// Classify a raw service result; empty text counts as a failure
    #[must_use]
    pub fn from_result(result: crate::Result<String>) -> Self {
        match result {
            Ok(text) if text.is_empty() => Self::Failed("empty response from API".to_string()),
            Ok(text) => Self::Reply(text),
            Err(e) => Self::Failed(e.to_string()),
        }
    }

    /// Whether the model produced a reply
    #[must_use]
    pub const fn is_reply(&self) -> bool {
        matches!(self, Self::Reply(_))
    }

    /// Text to show and speak: the reply, or the fixed fallback
    #[must_use]
    pub fn into_text(self) -> String {
        match self {
            Self::Reply(text) => text,
            Self::Failed(_) => FALLBACK_REPLY.to_string(),
        }
    }
}

/// Produces the assistant's next utterance
#[async_trait]
pub trait ResponseGenerator: Send + Sync {
    /// Generate a reply to `prompt` given `history` (oldest first; in a
    /// conversation it already ends with the user turn for `prompt`)
    async fn generate(&self, prompt: &str, history: &[Message]) -> Generation;
}

/// Generate a reply, substituting the fallback text on failure
pub async fn generate_response(
    generator: &dyn ResponseGenerator,
    prompt: &str,
    history: &[Message],
) -> String {
    generator.generate(prompt, history).await.into_text()
}
