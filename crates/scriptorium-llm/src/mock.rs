//! Mock provider for deterministic testing
//!
//! Returns scripted responses without any network calls. Queued replies are
//! served first, then the first rule whose pattern occurs in the prompt, then
//! the default response.

use crate::LlmError;
use async_trait::async_trait;
use scriptorium_domain::traits::LlmProvider;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// A scripted reply
#[derive(Debug, Clone)]
enum MockReply {
    Text(String),
    Error(String),
    Delayed(Duration, String),
}

/// Mock LLM provider
///
/// Clones share their script, call count and prompt log.
///
/// # Examples
///
/// ```
/// use scriptorium_llm::MockProvider;
/// use scriptorium_domain::traits::LlmProvider;
///
/// let provider = MockProvider::new("{}");
/// provider.add_response("chapter one", r#"{"theses": []}"#);
///
/// let rt = tokio::runtime::Runtime::new().unwrap();
/// let reply = rt.block_on(provider.generate("system", "text of chapter one")).unwrap();
/// assert_eq!(reply, r#"{"theses": []}"#);
/// assert_eq!(provider.call_count(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct MockProvider {
    model: String,
    default_response: String,
    rules: Arc<Mutex<Vec<(String, MockReply)>>>,
    queue: Arc<Mutex<VecDeque<MockReply>>>,
    call_count: Arc<Mutex<usize>>,
    prompts: Arc<Mutex<Vec<String>>>,
}

impl MockProvider {
    /// Create a MockProvider with a fixed response for all prompts
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            model: "mock".to_string(),
            default_response: response.into(),
            rules: Arc::new(Mutex::new(Vec::new())),
            queue: Arc::new(Mutex::new(VecDeque::new())),
            call_count: Arc::new(Mutex::new(0)),
            prompts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Respond with `response` to prompts containing `pattern`
    pub fn add_response(&self, pattern: impl Into<String>, response: impl Into<String>) {
        self.push_rule(pattern.into(), MockReply::Text(response.into()));
    }

    /// Fail prompts containing `pattern`
    pub fn add_error(&self, pattern: impl Into<String>) {
        self.push_rule(pattern.into(), MockReply::Error("Mock error".to_string()));
    }

    /// Answer prompts containing `pattern` only after `delay`
    pub fn add_delay(&self, pattern: impl Into<String>, delay: Duration, response: impl Into<String>) {
        self.push_rule(pattern.into(), MockReply::Delayed(delay, response.into()));
    }

    /// Queue a response for the next call, ahead of any rule
    pub fn queue_response(&self, response: impl Into<String>) {
        if let Ok(mut queue) = self.queue.lock() {
            queue.push_back(MockReply::Text(response.into()));
        }
    }

    /// Queue an error for the next call, ahead of any rule
    pub fn queue_error(&self, message: impl Into<String>) {
        if let Ok(mut queue) = self.queue.lock() {
            queue.push_back(MockReply::Error(message.into()));
        }
    }

    /// Get the number of times generate was called
    pub fn call_count(&self) -> usize {
        self.call_count.lock().map(|c| *c).unwrap_or(0)
    }

    /// Reset the call count and prompt log
    pub fn reset_call_count(&self) {
        if let Ok(mut count) = self.call_count.lock() {
            *count = 0;
        }
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.clear();
        }
    }

    /// Prompts received so far, in call order
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }

    fn push_rule(&self, pattern: String, reply: MockReply) {
        if let Ok(mut rules) = self.rules.lock() {
            rules.push((pattern, reply));
        }
    }

    fn next_reply(&self, prompt: &str) -> MockReply {
        if let Some(reply) = self.queue.lock().ok().and_then(|mut q| q.pop_front()) {
            return reply;
        }
        let rules = match self.rules.lock() {
            Ok(rules) => rules,
            Err(_) => return MockReply::Error("Mock state poisoned".to_string()),
        };
        rules
            .iter()
            .find(|(pattern, _)| prompt.contains(pattern.as_str()))
            .map(|(_, reply)| reply.clone())
            .unwrap_or_else(|| MockReply::Text(self.default_response.clone()))
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new("Default mock response")
    }
}

#[async_trait]
impl LlmProvider for MockProvider {
    type Error = LlmError;

    fn model_name(&self) -> &str {
        &self.model
    }

    async fn generate(&self, _system: &str, prompt: &str) -> Result<String, Self::Error> {
        if let Ok(mut count) = self.call_count.lock() {
            *count += 1;
        }
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.to_string());
        }

        match self.next_reply(prompt) {
            MockReply::Text(text) => Ok(text),
            MockReply::Error(message) => Err(LlmError::Other(message)),
            MockReply::Delayed(delay, text) => {
                tokio::time::sleep(delay).await;
                Ok(text)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_provider_default() {
        let provider = MockProvider::new("Test response");
        let result = provider.generate("sys", "any prompt").await;
        assert_eq!(result.unwrap(), "Test response");
    }

    #[tokio::test]
    async fn test_mock_provider_rules_match_substrings_in_order() {
        let provider = MockProvider::default();
        provider.add_response("hello", "world");
        provider.add_response("hello there", "never reached");
        provider.add_response("foo", "bar");

        assert_eq!(provider.generate("", "say hello there").await.unwrap(), "world");
        assert_eq!(provider.generate("", "foo!").await.unwrap(), "bar");
        assert_eq!(
            provider.generate("", "unknown").await.unwrap(),
            "Default mock response"
        );
    }

    #[tokio::test]
    async fn test_queue_takes_precedence() {
        let provider = MockProvider::new("default");
        provider.add_response("x", "rule");
        provider.queue_response("first");
        provider.queue_error("boom");

        assert_eq!(provider.generate("", "x").await.unwrap(), "first");
        assert!(matches!(
            provider.generate("", "x").await,
            Err(LlmError::Other(m)) if m == "boom"
        ));
        assert_eq!(provider.generate("", "x").await.unwrap(), "rule");
    }

    #[tokio::test]
    async fn test_mock_provider_call_count_and_prompts() {
        let provider = MockProvider::new("test");
        assert_eq!(provider.call_count(), 0);

        provider.generate("", "prompt1").await.unwrap();
        provider.generate("", "prompt2").await.unwrap();
        assert_eq!(provider.call_count(), 2);
        assert_eq!(provider.prompts(), vec!["prompt1", "prompt2"]);

        provider.reset_call_count();
        assert_eq!(provider.call_count(), 0);
        assert!(provider.prompts().is_empty());
    }

    #[tokio::test]
    async fn test_mock_provider_error() {
        let provider = MockProvider::default();
        provider.add_error("bad prompt");

        let result = provider.generate("", "a bad prompt").await;
        assert!(matches!(result.unwrap_err(), LlmError::Other(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_mock_provider_delay() {
        let provider = MockProvider::default();
        provider.add_delay("slow", Duration::from_secs(10), "late");

        let start = tokio::time::Instant::now();
        assert_eq!(provider.generate("", "slow").await.unwrap(), "late");
        assert!(start.elapsed() >= Duration::from_secs(10));
    }

    #[tokio::test]
    async fn test_mock_provider_clone_shares_state() {
        let provider1 = MockProvider::new("test");
        let provider2 = provider1.clone();

        provider1.generate("", "test").await.unwrap();

        assert_eq!(provider1.call_count(), 1);
        assert_eq!(provider2.call_count(), 1);
    }
}
