//! Requests sent to the translation provider
//!
//! A `PromptSpec` is the structured form of a request. Providers that talk to a
//! chat model turn it into text with [`PromptSpec::render`]; the mock reads the
//! fields directly.

use crate::sync::buffer::LanguageTag;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Register requested from the provider
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Formality {
    Formal,
    #[default]
    Informal,
}

impl FromStr for Formality {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "formal" => Ok(Formality::Formal),
            "informal" => Ok(Formality::Informal),
            other => Err(format!("Unknown formality: {}", other)),
        }
    }
}

impl fmt::Display for Formality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Formality::Formal => f.write_str("formal"),
            Formality::Informal => f.write_str("informal"),
        }
    }
}

/// Full-text translation or single-word correction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptMode {
    FullText { text: String },
    SingleWord { word: String, context: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptSpec {
    pub mode: PromptMode,
    pub source: LanguageTag,
    pub target: LanguageTag,
    pub formality: Formality,
}

impl PromptSpec {
    /// Request a translation of a whole buffer
    ///
    /// # Arguments
    ///
    /// * `text` - The full content of the edited buffer, untrimmed
    /// * `source` - Language of the edited buffer
    /// * `target` - Language of the other buffer
    /// * `formality` - Register the translation should use
    ///
    /// # Example
    ///
    /// ```ignore
    /// let prompt = PromptSpec::full_text("Bonjour.", fr, en, Formality::Informal);
    /// assert_eq!(prompt.input(), "Bonjour.");
    /// ```
    pub fn full_text(
        text: impl Into<String>,
        source: LanguageTag,
        target: LanguageTag,
        formality: Formality,
    ) -> Self {
        Self {
            mode: PromptMode::FullText { text: text.into() },
            source,
            target,
            formality,
        }
    }

    /// Request a one-word translation for the language guard
    ///
    /// # Arguments
    ///
    /// * `word` - The token that looks like it was typed in the wrong language
    /// * `context` - Up to seven tokens preceding `word`, space-joined; may be empty
    /// * `source` - The language `word` appears to be in
    /// * `target` - The language of the buffer it was typed into
    /// * `formality` - Register the answer should use
    pub fn single_word(
        word: impl Into<String>,
        context: impl Into<String>,
        source: LanguageTag,
        target: LanguageTag,
        formality: Formality,
    ) -> Self {
        Self {
            mode: PromptMode::SingleWord {
                word: word.into(),
                context: context.into(),
            },
            source,
            target,
            formality,
        }
    }

    /// The text or word being translated
    pub fn input(&self) -> &str {
        match &self.mode {
            PromptMode::FullText { text } => text,
            PromptMode::SingleWord { word, .. } => word,
        }
    }

    pub fn is_single_word(&self) -> bool {
        matches!(self.mode, PromptMode::SingleWord { .. })
    }

    /// Instruction text for a chat-completion model
    ///
    /// Full-text prompts ask for the two-section reply that
    /// [`parse_response`](crate::sync::parser::parse_response) reads;
    /// single-word prompts ask for the bare word.
    pub fn render(&self) -> String {
        let register = match self.formality {
            Formality::Formal => "Make it formal.",
            Formality::Informal => "Make it informal.",
        };
        match &self.mode {
            PromptMode::FullText { text } => format!(
                "Translate this text from {source} to {target}.\n\
                 Then, provide your response in this format:\n\
                 Full Translation:\n\
                 [the complete translation, on several lines if needed]\n\
                 Word Mapping:\n\
                 [sourceWord1] -> [targetWord1]\n\
                 [sourceWord2] -> [targetWord2]\n\
                 ...\n\
                 Text: \"{text}\"\n\
                 {register}\n\
                 IMPORTANT: Do NOT return JSON. Only free text with these two sections, none of your commentary.",
                source = self.source.display_name(),
                target = self.target.display_name(),
            ),
            PromptMode::SingleWord { word, context } => {
                let mut prompt = format!(
                    "Translate this {source} word to {target}: {word}. {register}",
                    source = self.source.display_name(),
                    target = self.target.display_name(),
                );
                if !context.is_empty() {
                    prompt.push_str(&format!(" It appears after: \"{}\".", context));
                }
                prompt.push_str(" I want a one word answer, no brackets or anything else.");
                prompt
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tag(s: &str) -> LanguageTag {
        LanguageTag::new(s).unwrap()
    }

    #[test]
    fn test_formality_parse_and_display() {
        assert_eq!("Formal".parse::<Formality>(), Ok(Formality::Formal));
        assert_eq!(" informal ".parse::<Formality>(), Ok(Formality::Informal));
        assert!("casual".parse::<Formality>().is_err());
        assert_eq!(Formality::Formal.to_string(), "formal");
        assert_eq!(Formality::default(), Formality::Informal);
    }

    #[test]
    fn test_full_text_prompt_names_sections() {
        let request = PromptSpec::full_text("Bonjour.", tag("fr"), tag("en"), Formality::Informal);
        let prompt = request.render();
        assert!(prompt.contains("from French to English"));
        assert!(prompt.contains("Full Translation:"));
        assert!(prompt.contains("Word Mapping:"));
        assert!(prompt.contains("Text: \"Bonjour.\""));
        assert!(prompt.contains("Make it informal."));
        assert_eq!(request.input(), "Bonjour.");
        assert!(!request.is_single_word());
    }

    #[test]
    fn test_single_word_prompt_includes_context() {
        let request = PromptSpec::single_word("the", "le chat", tag("en"), tag("fr"), Formality::Formal);
        let prompt = request.render();
        assert!(prompt.contains("English word to French: the"));
        assert!(prompt.contains("\"le chat\""));
        assert!(prompt.contains("Make it formal."));
        assert!(prompt.contains("one word answer"));
        assert!(request.is_single_word());
    }

    #[test]
    fn test_single_word_prompt_without_context() {
        let request = PromptSpec::single_word("the", "", tag("en"), tag("fr"), Formality::Informal);
        assert!(!request.render().contains("appears after"));
    }
}
