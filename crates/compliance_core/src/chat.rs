//! crates/compliance_core/src/chat.rs
//!
//! The compliance assistant: forwards a conversation under a fixed scope prompt.

use std::sync::Arc;
use tracing::info;

use crate::domain::ChatMessage;
use crate::ports::{ChunkStream, LlmService, PortError};

pub const CHAT_SYSTEM_PROMPT: &str = r#"You are a compliance information assistant for Indian businesses, covering GST, income tax, MCA/ROC filings, RBI/FEMA, SEBI and labour law.

Scope:
- Give general, educational information about compliance requirements, due dates, procedures and penalties.
- Keep answers clear and concise; use short lists where they help.

Boundaries:
- You do NOT draft notices, replies to notices, appeals or any other filing. If asked, explain that drafting is available to verified Chartered Accountants through the drafting tool.
- You do not give advice on a specific case. Always recommend consulting a qualified Chartered Accountant or lawyer before acting.
- If you are unsure, say so rather than guessing."#;

#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("messages must be a non-empty array")]
    EmptyConversation,

    #[error(transparent)]
    Upstream(#[from] PortError),
}

#[derive(Clone)]
pub struct ChatProxy {
    llm: Arc<dyn LlmService>,
}

impl ChatProxy {
    pub fn new(llm: Arc<dyn LlmService>) -> Self {
        Self { llm }
    }

    /// Opens the upstream stream for `messages` under the fixed system prompt.
    pub async fn open(&self, messages: &[ChatMessage]) -> Result<ChunkStream, ChatError> {
        if messages.is_empty() {
            return Err(ChatError::EmptyConversation);
        }
        info!("Forwarding chat with {} messages", messages.len());
        Ok(self.llm.stream(CHAT_SYSTEM_PROMPT, messages).await?)
    }
}
