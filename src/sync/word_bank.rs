//! Closed-class word lists used to spot words typed in the wrong language
//!
//! A bank only holds articles, pronouns and conjunctions, so a miss means
//! nothing: foreign content words are expected to slip through.

use crate::sync::buffer::LanguageTag;
use std::collections::{HashMap, HashSet};

const FRENCH_WORDS: &[&str] = &[
    "je", "tu", "il", "elle", "nous", "vous", "ils", "elles", "le", "la", "les", "un", "une", "de",
    "à", "et", "ou", "mais", "dans",
];

const ENGLISH_WORDS: &[&str] = &[
    "I", "you", "he", "she", "we", "they", "it", "a", "an", "the", "of", "and", "or", "but", "in",
    "on", "with", "by", "for",
];

/// Set of lower-cased tokens for one language
#[derive(Debug, Clone, Default)]
pub struct WordBank {
    words: HashSet<String>,
}

impl WordBank {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a bank holding `words`, lower-cased
    ///
    /// # Example
    ///
    /// ```ignore
    /// let bank = WordBank::from_words(["Der", "die", "das"]);
    /// assert!(bank.contains("DER"));
    /// ```
    pub fn from_words<'a>(words: impl IntoIterator<Item = &'a str>) -> Self {
        let mut bank = Self::new();
        for word in words {
            bank.set(word);
        }
        bank
    }

    /// Built-in list for `language`; empty for languages without one
    pub fn builtin(language: &LanguageTag) -> Self {
        match language.as_str() {
            "fr" => Self::from_words(FRENCH_WORDS.iter().copied()),
            "en" => Self::from_words(ENGLISH_WORDS.iter().copied()),
            _ => Self::new(),
        }
    }

    /// Add `token` to the bank
    ///
    /// Tokens are stored lower-cased, so later lookups ignore case. Adding a
    /// token twice is harmless.
    pub fn set(&mut self, token: &str) {
        self.words.insert(token.to_lowercase());
    }

    /// Case-insensitive exact match
    ///
    /// No stemming and no punctuation stripping: `"the."` is not `"the"`.
    ///
    /// # Arguments
    ///
    /// * `token` - A single whitespace-free token as typed
    ///
    /// # Returns
    ///
    /// * `true` - If the lower-cased token is in the bank
    /// * `false` - Otherwise; a miss says nothing about the token's language
    pub fn contains(&self, token: &str) -> bool {
        self.words.contains(&token.to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

/// Banks for every language seen in the session, built lazily from the built-in lists
#[derive(Debug, Clone, Default)]
pub struct WordBanks {
    banks: HashMap<LanguageTag, WordBank>,
}

impl WordBanks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bank for `language`, built from the built-in list on first use
    pub fn bank(&mut self, language: &LanguageTag) -> &WordBank {
        self.banks
            .entry(language.clone())
            .or_insert_with(|| WordBank::builtin(language))
    }

    /// Replace the bank used for `language`
    pub fn insert(&mut self, language: LanguageTag, bank: WordBank) {
        self.banks.insert(language, bank);
    }

    /// Whether `token` belongs to the bank of `language`
    ///
    /// Takes `&mut self` because the bank may be built on this call.
    pub fn contains(&mut self, language: &LanguageTag, token: &str) -> bool {
        self.bank(language).contains(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tag(s: &str) -> LanguageTag {
        LanguageTag::new(s).unwrap()
    }

    #[test]
    fn test_contains_is_case_insensitive() {
        let bank = WordBank::builtin(&tag("en"));
        assert!(bank.contains("the"));
        assert!(bank.contains("The"));
        assert!(bank.contains("i"));
        assert!(bank.contains("I"));
    }

    #[test]
    fn test_exact_match_only() {
        let bank = WordBank::builtin(&tag("en"));
        assert!(!bank.contains("then"));
        assert!(!bank.contains("the."));
        assert!(!bank.contains("th"));
    }

    #[test]
    fn test_french_bank_handles_accents() {
        let bank = WordBank::builtin(&tag("fr"));
        assert!(bank.contains("à"));
        assert!(bank.contains("À"));
        assert!(bank.contains("mais"));
        assert_eq!(bank.len(), FRENCH_WORDS.len());
    }

    #[test]
    fn test_unknown_language_is_empty() {
        assert!(WordBank::builtin(&tag("ja")).is_empty());
    }

    #[test]
    fn test_registry_allows_overrides() {
        let mut banks = WordBanks::new();
        assert!(banks.contains(&tag("en"), "with"));
        banks.insert(tag("en"), WordBank::from_words(["hello"]));
        assert!(!banks.contains(&tag("en"), "with"));
        assert!(banks.contains(&tag("en"), "HELLO"));
    }
}
