//! Answer composition and streaming generation.
//!
//! Assembles the final prompt from the question, the retrieved context,
//! and the conversation history, then drives a streaming chat-completion
//! call. Tokens are forwarded as the backend produces them.

use crate::config::Prompts;
use crate::error::{Result, SvarError};
use crate::openai::create_client;
use async_openai::types::{
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
};
use futures::{Stream, StreamExt};
use std::collections::HashMap;
use std::pin::Pin;
use std::time::Duration;
use tracing::{debug, instrument};

/// Speaker of a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}

/// One prior turn of the conversation.
#[derive(Debug, Clone)]
pub struct ChatTurn {
    pub role: Role,
    pub content: String,
}

impl ChatTurn {
    /// A user turn.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// An assistant turn.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Stream of generated answer tokens.
pub type TokenStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

/// Composes answer prompts and drives streaming generation.
pub struct AnswerComposer {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: String,
    prompts: Prompts,
    max_history_turns: usize,
}

impl AnswerComposer {
    /// Create a new answer composer.
    pub fn new(model: &str, timeout: Duration) -> Self {
        Self {
            client: create_client(timeout),
            model: model.to_string(),
            prompts: Prompts::default(),
            max_history_turns: 20,
        }
    }

    /// Set custom prompts.
    pub fn with_prompts(mut self, prompts: Prompts) -> Self {
        self.prompts = prompts;
        self
    }

    /// Set the number of history turns kept in the prompt.
    pub fn with_max_history_turns(mut self, max_history_turns: usize) -> Self {
        self.max_history_turns = max_history_turns;
        self
    }

    /// Assemble the generation prompt.
    ///
    /// History turns are rendered as `role: content` lines in chronological
    /// order, trimmed to the configured window from the end.
    pub fn compose_prompt(&self, question: &str, context: &str, history: &[ChatTurn]) -> String {
        let start = history.len().saturating_sub(self.max_history_turns);
        let history_text = if history[start..].is_empty() {
            "(none)".to_string()
        } else {
            history[start..]
                .iter()
                .map(|turn| format!("{}: {}", turn.role, turn.content))
                .collect::<Vec<_>>()
                .join("\n")
        };

        let mut vars = HashMap::new();
        vars.insert("question".to_string(), question.to_string());
        vars.insert("context".to_string(), context.to_string());
        vars.insert("history".to_string(), history_text);

        Prompts::render(&self.prompts.answer.user, &vars)
    }

    /// Start a streaming generation call for an assembled prompt.
    ///
    /// Tokens are yielded as the backend produces them; nothing is buffered
    /// ahead of the consumer. Dropping the returned stream drops the
    /// underlying HTTP response, which aborts the backend call; partially
    /// emitted text is discarded, not replayed.
    #[instrument(skip(self, prompt))]
    pub async fn generate(&self, prompt: &str) -> Result<TokenStream> {
        let messages: Vec<ChatCompletionRequestMessage> = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(self.prompts.answer.system.clone())
                .build()
                .map_err(|e| SvarError::Generation(e.to_string()))?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(prompt.to_string())
                .build()
                .map_err(|e| SvarError::Generation(e.to_string()))?
                .into(),
        ];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .stream(true)
            .build()
            .map_err(|e| SvarError::Generation(e.to_string()))?;

        let stream = self
            .client
            .chat()
            .create_stream(request)
            .await
            .map_err(|e| SvarError::OpenAI(format!("Failed to start generation: {}", e)))?;

        debug!("Generation stream started");

        let tokens = stream.filter_map(|item| async move {
            match item {
                Ok(response) => response
                    .choices
                    .into_iter()
                    .next()
                    .and_then(|choice| choice.delta.content)
                    .filter(|token| !token.is_empty())
                    .map(Ok),
                Err(e) => Some(Err(SvarError::Generation(e.to_string()))),
            }
        });

        Ok(Box::pin(tokens))
    }

    /// Compose the prompt for a question and stream the answer.
    pub async fn answer(
        &self,
        question: &str,
        context: &str,
        history: &[ChatTurn],
    ) -> Result<TokenStream> {
        let prompt = self.compose_prompt(question, context, history);
        self.generate(&prompt).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn composer() -> AnswerComposer {
        AnswerComposer::new("gpt-4o-mini", Duration::from_secs(30))
    }

    #[test]
    fn test_compose_prompt_contains_all_parts() {
        let history = vec![
            ChatTurn::user("What is a mammal?"),
            ChatTurn::assistant("An animal that feeds its young milk."),
        ];

        let prompt = composer().compose_prompt(
            "Are cats mammals?",
            "[00:10] Cats are mammals.",
            &history,
        );

        assert!(prompt.contains("Are cats mammals?"));
        assert!(prompt.contains("[00:10] Cats are mammals."));
        assert!(prompt.contains("user: What is a mammal?"));
        assert!(prompt.contains("assistant: An animal that feeds its young milk."));

        let user_pos = prompt.find("user: What is a mammal?").unwrap();
        let assistant_pos = prompt.find("assistant:").unwrap();
        assert!(user_pos < assistant_pos);
    }

    #[test]
    fn test_empty_history_renders_placeholder() {
        let prompt = composer().compose_prompt("Q?", "ctx", &[]);
        assert!(prompt.contains("(none)"));
    }

    #[test]
    fn test_history_trimmed_to_window() {
        let history: Vec<ChatTurn> = (0..30)
            .map(|i| ChatTurn::user(format!("message {}", i)))
            .collect();

        let prompt = composer()
            .with_max_history_turns(4)
            .compose_prompt("Q?", "ctx", &history);

        assert!(!prompt.contains("message 25"));
        assert!(prompt.contains("message 26"));
        assert!(prompt.contains("message 29"));
    }
}
