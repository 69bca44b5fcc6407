//! Session settings
//!
//! Everything here can be changed while a session runs; nothing is persisted.

use crate::sync::buffer::{BufferId, LanguageTag};
use crate::sync::prompt::Formality;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Quiet period used to coalesce keystrokes when none is configured
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(400);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Language of buffer A
    pub language_a: LanguageTag,
    /// Language of buffer B
    pub language_b: LanguageTag,
    pub formality: Formality,
    /// Replace words typed in the other buffer's language
    pub language_guard: bool,
    #[serde(with = "duration_ms")]
    pub debounce: Duration,
}

impl SessionConfig {
    /// Create a configuration for a pair of languages
    ///
    /// Formality defaults to informal, the language guard is off and the
    /// debounce is [`DEFAULT_DEBOUNCE`].
    ///
    /// # Arguments
    ///
    /// * `language_a` - Language of buffer A
    /// * `language_b` - Language of buffer B
    ///
    /// # Example
    ///
    /// ```ignore
    /// let config = SessionConfig::new(LanguageTag::new("fr")?, LanguageTag::new("en")?)
    ///     .with_language_guard(true)
    ///     .with_debounce(Duration::from_millis(250));
    /// ```
    pub fn new(language_a: LanguageTag, language_b: LanguageTag) -> Self {
        Self {
            language_a,
            language_b,
            formality: Formality::default(),
            language_guard: false,
            debounce: DEFAULT_DEBOUNCE,
        }
    }

    pub fn with_formality(mut self, formality: Formality) -> Self {
        self.formality = formality;
        self
    }

    /// Turn wrong-language word replacement on or off
    pub fn with_language_guard(mut self, enabled: bool) -> Self {
        self.language_guard = enabled;
        self
    }

    /// Quiet period before a typed edit is sent
    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    /// Language of one buffer
    pub fn language(&self, buffer: BufferId) -> &LanguageTag {
        match buffer {
            BufferId::A => &self.language_a,
            BufferId::B => &self.language_b,
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::new(
            LanguageTag::new("fr").expect("built-in tag is valid"),
            LanguageTag::new("en").expect("built-in tag is valid"),
        )
    }
}

mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(deserializer)?))
    }
}
