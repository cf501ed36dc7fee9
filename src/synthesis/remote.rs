//! Answer synthesis through a remote completion model.

use std::sync::Arc;

use crate::config::RemoteSettings;
use crate::domain::Query;
use crate::providers::ai::{CompletionRequest, LlmProvider, LlmResult, Message};
use crate::retrieval::{render_context, ContextBlock};

const SYSTEM_PROMPT: &str = "You answer questions using only the user's notes provided below. \
Cite every fact with the inline marker [File: <path>] using the exact path shown for that note. \
If the notes do not contain the answer, say so plainly instead of guessing.";

/// Sends the question and retrieved notes to a completion model.
#[derive(Clone)]
pub struct RemoteSynthesizer {
    provider: Arc<dyn LlmProvider>,
    document_chars: usize,
    temperature: f32,
    max_tokens: Option<usize>,
}

impl RemoteSynthesizer {
    pub fn new(provider: Arc<dyn LlmProvider>, document_chars: usize) -> Self {
        let defaults = RemoteSettings::default();
        Self {
            provider,
            document_chars,
            temperature: defaults.temperature,
            max_tokens: defaults.max_tokens,
        }
    }

    pub fn with_sampling(mut self, temperature: f32, max_tokens: Option<usize>) -> Self {
        self.temperature = temperature;
        self.max_tokens = max_tokens;
        self
    }

    /// Builds the request: prior turns, then the notes and question.
    pub fn build_request(&self, query: &Query, blocks: &[ContextBlock]) -> CompletionRequest {
        let mut messages: Vec<Message> = query.history.iter().map(Message::from).collect();

        let context = render_context(blocks, Some(self.document_chars));
        messages.push(Message::user(format!(
            "Notes:\n\n{context}\n\nQuestion: {}",
            query.text.trim()
        )));

        CompletionRequest::new(messages)
            .with_system_prompt(SYSTEM_PROMPT)
            .with_temperature(self.temperature)
            .with_max_tokens(self.max_tokens)
    }

    /// Makes one completion call. Errors propagate to the caller.
    pub async fn synthesize(&self, query: &Query, blocks: &[ContextBlock]) -> LlmResult<String> {
        let request = self.build_request(query, blocks);
        tracing::debug!(
            provider = self.provider.name(),
            model = self.provider.model(),
            documents = blocks.len(),
            "Requesting remote synthesis"
        );
        let response = self.provider.complete(&request).await?;
        Ok(response.text.trim().to_string())
    }
}

impl std::fmt::Debug for RemoteSynthesizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteSynthesizer")
            .field("provider", &self.provider.name())
            .field("document_chars", &self.document_chars)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Turn;
    use crate::providers::ai::{CompletionResponse, FinishReason, LlmError, Role, TokenUsage};
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use std::sync::Mutex;

    struct ScriptedProvider {
        reply: Option<String>,
        seen: Mutex<Vec<CompletionRequest>>,
    }

    impl ScriptedProvider {
        fn replying(text: &str) -> Self {
            Self {
                reply: Some(text.to_string()),
                seen: Mutex::new(Vec::new()),
            }
        }

        fn failing() -> Self {
            Self {
                reply: None,
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl LlmProvider for ScriptedProvider {
        fn name(&self) -> &str {
            "scripted"
        }

        fn model(&self) -> &str {
            "scripted-1"
        }

        async fn complete(&self, request: &CompletionRequest) -> LlmResult<CompletionResponse> {
            self.seen.lock().unwrap().push(request.clone());
            match &self.reply {
                Some(text) => Ok(CompletionResponse {
                    text: text.clone(),
                    tokens_used: TokenUsage::default(),
                    finish_reason: FinishReason::Stop,
                }),
                None => Err(LlmError::Unavailable("offline".to_string())),
            }
        }
    }

    #[test]
    fn request_echoes_history_and_truncates_context() {
        let synth = RemoteSynthesizer::new(Arc::new(ScriptedProvider::replying("")), 5);
        let query = Query::new("what about bread?").with_history(vec![
            Turn::user("list groceries"),
            Turn::assistant("Milk and eggs [File: groceries.md]"),
        ]);
        let blocks = vec![ContextBlock::new("groceries.md", "milk, eggs, bread")];

        let request = synth.build_request(&query, &blocks);

        assert!(request
            .system_prompt
            .as_deref()
            .unwrap()
            .contains("[File: <path>]"));
        assert_eq!(request.messages.len(), 3);
        assert_eq!(request.messages[0], Message::user("list groceries"));
        assert_eq!(request.messages[1].role, Role::Assistant);
        assert_eq!(
            request.messages[2].content,
            "Notes:\n\n[File: groceries.md]\nmilk,\n[...]\n\nQuestion: what about bread?"
        );
    }

    #[tokio::test]
    async fn returns_trimmed_completion() {
        let provider = Arc::new(ScriptedProvider::replying("  Bread is listed [File: g.md]\n"));
        let synth = RemoteSynthesizer::new(provider.clone(), 4000).with_sampling(0.0, Some(64));

        let answer = synth
            .synthesize(&Query::new("bread?"), &[ContextBlock::new("g.md", "bread")])
            .await
            .unwrap();

        assert_eq!(answer, "Bread is listed [File: g.md]");
        let seen = provider.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].temperature, 0.0);
        assert_eq!(seen[0].max_tokens, Some(64));
    }

    #[tokio::test]
    async fn provider_errors_propagate() {
        let synth = RemoteSynthesizer::new(Arc::new(ScriptedProvider::failing()), 4000);
        let result = synth.synthesize(&Query::new("bread?"), &[]).await;
        assert!(matches!(result, Err(LlmError::Unavailable(_))));
    }
}
