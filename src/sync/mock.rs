//! Mock translation provider for testing
//!
//! Deterministic, network-free provider that answers in the same two-section
//! format a real model is asked for. It also records every prompt it receives
//! so tests can count provider calls.
//!
//! # Example
//!
//! ```ignore
//! use mirror_translate::sync::{MockMode, MockProvider, TranslationProvider};
//!
//! #[tokio::test]
//! async fn test_translation() {
//!     let mock = MockProvider::new(MockMode::Suffix);
//!     let raw = mock.complete(&prompt).await.unwrap();
//!     assert!(raw.contains("bonjour_en"));
//! }
//! ```

use crate::sync::error::{SyncError, SyncResult};
use crate::sync::parser::format_response;
use crate::sync::prompt::{PromptMode, PromptSpec};
use crate::sync::translator::TranslationProvider;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Mock reply modes for testing different scenarios
#[derive(Debug, Clone)]
pub enum MockMode {
    /// Append the target language to every token: "bonjour" → "bonjour_en",
    /// with a one-to-one word mapping
    Suffix,

    /// Predefined replies keyed by the trimmed input text or word; unknown
    /// inputs fall back to `Suffix`
    Scripted(HashMap<String, String>),

    /// Reverse token order (word-order-changing languages), mapping each
    /// token to itself
    Reorder,

    /// Always return this raw reply
    Raw(String),

    /// Simulate provider errors
    Error(SyncError),
}

#[derive(Debug, Clone)]
pub struct MockProvider {
    mode: MockMode,
    /// Optional simulated network delay (in milliseconds)
    delay_ms: u64,
    calls: Arc<Mutex<Vec<PromptSpec>>>,
}

impl MockProvider {
    pub fn new(mode: MockMode) -> Self {
        Self {
            mode,
            delay_ms: 0,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Create a MockProvider that waits `delay_ms` before every reply
    pub fn with_delay(mode: MockMode, delay_ms: u64) -> Self {
        Self {
            delay_ms,
            ..Self::new(mode)
        }
    }

    /// Convenience constructor for `Scripted` from `(input, reply)` pairs
    pub fn scripted<'a>(replies: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let map = replies
            .into_iter()
            .map(|(input, reply)| (input.to_string(), reply.to_string()))
            .collect();
        Self::new(MockMode::Scripted(map))
    }

    /// Prompts received so far, in call order
    ///
    /// A call is recorded when it starts, so calls aborted during the
    /// simulated delay still show up here.
    pub fn calls(&self) -> Vec<PromptSpec> {
        self.calls
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().map(|calls| calls.len()).unwrap_or(0)
    }

    async fn apply_delay(&self) {
        if self.delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.delay_ms)).await;
        }
    }

    fn record(&self, prompt: &PromptSpec) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(prompt.clone());
        }
    }

    fn suffix_reply(prompt: &PromptSpec) -> String {
        let target = prompt.target.as_str();
        match &prompt.mode {
            PromptMode::SingleWord { word, .. } => format!("{}_{}", word, target),
            PromptMode::FullText { text } => {
                let mapping: Vec<(String, String)> = text
                    .split_whitespace()
                    .map(|w| (w.to_string(), format!("{}_{}", w, target)))
                    .collect();
                let translation = mapping
                    .iter()
                    .map(|(_, t)| t.as_str())
                    .collect::<Vec<_>>()
                    .join(" ");
                format_response(&translation, &mapping)
            }
        }
    }

    fn reply(&self, prompt: &PromptSpec) -> SyncResult<String> {
        match &self.mode {
            MockMode::Suffix => Ok(Self::suffix_reply(prompt)),
            MockMode::Scripted(map) => Ok(map
                .get(prompt.input().trim())
                .cloned()
                .unwrap_or_else(|| Self::suffix_reply(prompt))),
            MockMode::Reorder => match &prompt.mode {
                PromptMode::SingleWord { word, .. } => Ok(word.clone()),
                PromptMode::FullText { text } => {
                    let words: Vec<&str> = text.split_whitespace().rev().collect();
                    let mapping: Vec<(String, String)> = words
                        .iter()
                        .map(|w| (w.to_string(), w.to_string()))
                        .collect();
                    Ok(format_response(&words.join(" "), &mapping))
                }
            },
            MockMode::Raw(raw) => Ok(raw.clone()),
            MockMode::Error(err) => Err(err.clone()),
        }
    }
}

#[async_trait]
impl TranslationProvider for MockProvider {
    async fn complete(&self, prompt: &PromptSpec) -> SyncResult<String> {
        self.record(prompt);
        self.apply_delay().await;
        self.reply(prompt)
    }

    fn provider_name(&self) -> &str {
        "Mock Provider"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::buffer::LanguageTag;
    use crate::sync::parser::parse_response;
    use crate::sync::prompt::Formality;

    fn full(text: &str) -> PromptSpec {
        PromptSpec::full_text(
            text,
            LanguageTag::new("fr").unwrap(),
            LanguageTag::new("en").unwrap(),
            Formality::Informal,
        )
    }

    fn word(word: &str, context: &str) -> PromptSpec {
        PromptSpec::single_word(
            word,
            context,
            LanguageTag::new("en").unwrap(),
            LanguageTag::new("fr").unwrap(),
            Formality::Informal,
        )
    }

    // ========== Suffix Mode Tests ==========

    #[tokio::test]
    async fn test_suffix_full_text_parses() {
        let mock = MockProvider::new(MockMode::Suffix);
        let raw = mock.complete(&full("le chat")).await.unwrap();
        let parsed = parse_response(&raw);
        assert_eq!(parsed.translation, "le_en chat_en");
        assert_eq!(
            parsed.mapping,
            vec![
                ("le".to_string(), "le_en".to_string()),
                ("chat".to_string(), "chat_en".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_suffix_single_word() {
        let mock = MockProvider::new(MockMode::Suffix);
        let raw = mock.complete(&word("the", "le chat")).await.unwrap();
        assert_eq!(raw, "the_fr");
    }

    // ========== Scripted Mode Tests ==========

    #[tokio::test]
    async fn test_scripted_reply_by_trimmed_input() {
        let mock = MockProvider::scripted([("Bonjour.", "Full Translation:\nHello.")]);
        let raw = mock.complete(&full("  Bonjour.  ")).await.unwrap();
        assert_eq!(raw, "Full Translation:\nHello.");
    }

    #[tokio::test]
    async fn test_scripted_falls_back_to_suffix() {
        let mock = MockProvider::scripted([("Bonjour.", "Hello.")]);
        let raw = mock.complete(&word("the", "")).await.unwrap();
        assert_eq!(raw, "the_fr");
    }

    // ========== Reorder / Raw / Error ==========

    #[tokio::test]
    async fn test_reorder_reverses_tokens() {
        let mock = MockProvider::new(MockMode::Reorder);
        let raw = mock.complete(&full("one two three")).await.unwrap();
        assert_eq!(parse_response(&raw).translation, "three two one");
    }

    #[tokio::test]
    async fn test_raw_reply() {
        let mock = MockProvider::new(MockMode::Raw("anything".to_string()));
        assert_eq!(mock.complete(&full("x")).await.unwrap(), "anything");
    }

    #[tokio::test]
    async fn test_error_mode_returns_error() {
        let mock = MockProvider::new(MockMode::Error(SyncError::RateLimited("429".to_string())));
        match mock.complete(&full("x")).await {
            Err(SyncError::RateLimited(msg)) => assert_eq!(msg, "429"),
            other => panic!("Expected RateLimited, got {:?}", other),
        }
    }

    // ========== Call Log / Delay ==========

    #[tokio::test]
    async fn test_calls_are_recorded_in_order() {
        let mock = MockProvider::new(MockMode::Suffix);
        mock.complete(&full("a")).await.unwrap();
        mock.complete(&word("b", "")).await.unwrap();
        let calls = mock.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].input(), "a");
        assert!(calls[1].is_single_word());
    }

    #[tokio::test(start_paused = true)]
    async fn test_delay_adds_latency() {
        let mock = MockProvider::with_delay(MockMode::Suffix, 50);
        let start = tokio::time::Instant::now();
        mock.complete(&full("hello")).await.unwrap();
        assert!(start.elapsed() >= Duration::from_millis(50));
    }

    #[test]
    fn test_provider_name() {
        let mock = MockProvider::new(MockMode::Suffix);
        assert_eq!(mock.provider_name(), "Mock Provider");
    }
}
