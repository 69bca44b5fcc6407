//! Buffers and the small value types shared by every engine component
//!
//! Offsets exposed to the UI (carets, selections) count UTF-16 code units, the
//! unit text widgets report. The helpers at the bottom convert between those
//! offsets and byte indices into Rust strings.

use crate::sync::error::{SyncError, SyncResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Language identifier such as `fr` or `en`
///
/// Tags are normalized on construction: lower-cased, with region and script
/// subtags dropped (`fr-FR` → `fr`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LanguageTag(String);

impl LanguageTag {
    pub fn new(tag: &str) -> SyncResult<Self> {
        validate_language(tag)?;
        Ok(Self(normalize_language(tag)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// English display name used when rendering prompts
    pub fn display_name(&self) -> &str {
        match self.0.as_str() {
            "en" => "English",
            "fr" => "French",
            "es" => "Spanish",
            "de" => "German",
            "zh" => "Chinese",
            other => other,
        }
    }
}

impl fmt::Display for LanguageTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for LanguageTag {
    type Error = SyncError;

    fn try_from(value: String) -> SyncResult<Self> {
        LanguageTag::new(&value)
    }
}

impl From<LanguageTag> for String {
    fn from(tag: LanguageTag) -> Self {
        tag.0
    }
}

/// Strip region information and lower-case a language code
///
/// - `en-US` → `en`
/// - `zh-Hans` → `zh`
/// - `FR` → `fr`
pub fn normalize_language(tag: &str) -> String {
    tag.split(['-', '_'])
        .next()
        .unwrap_or(tag)
        .to_lowercase()
}

/// Check that a language code only contains alphanumerics, hyphens and underscores
pub fn validate_language(tag: &str) -> SyncResult<()> {
    if tag.is_empty() {
        return Err(SyncError::InvalidLanguage(
            "Language tag is empty".to_string(),
        ));
    }

    if !tag
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(SyncError::InvalidLanguage(format!(
            "Invalid characters in language tag: {}",
            tag
        )));
    }

    Ok(())
}

/// One of the two editable buffers of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BufferId {
    A,
    B,
}

impl BufferId {
    pub fn other(self) -> Self {
        match self {
            BufferId::A => BufferId::B,
            BufferId::B => BufferId::A,
        }
    }
}

impl fmt::Display for BufferId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BufferId::A => f.write_str("A"),
            BufferId::B => f.write_str("B"),
        }
    }
}

/// Translation direction between the two buffers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    AtoB,
    BtoA,
}

impl Direction {
    /// Direction that translates edits made in `buffer`
    pub fn from_source(buffer: BufferId) -> Self {
        match buffer {
            BufferId::A => Direction::AtoB,
            BufferId::B => Direction::BtoA,
        }
    }

    pub fn source(self) -> BufferId {
        match self {
            Direction::AtoB => BufferId::A,
            Direction::BtoA => BufferId::B,
        }
    }

    pub fn target(self) -> BufferId {
        self.source().other()
    }

    pub fn reverse(self) -> Self {
        Direction::from_source(self.target())
    }

    pub(crate) fn index(self) -> usize {
        match self {
            Direction::AtoB => 0,
            Direction::BtoA => 1,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}->{}", self.source(), self.target())
    }
}

/// Highlight or selection span, in UTF-16 code units
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionRange {
    pub start: usize,
    pub end: usize,
}

impl SelectionRange {
    /// Build a range for `content`, ordering the ends and clamping both to its length
    pub fn clamped(a: usize, b: usize, content: &str) -> Self {
        let len = utf16_len(content);
        let (start, end) = if a <= b { (a, b) } else { (b, a) };
        Self {
            start: start.min(len),
            end: end.min(len),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Slice of `content` covered by this range
    pub fn slice<'a>(&self, content: &'a str) -> &'a str {
        let start = byte_index(content, self.start);
        let end = byte_index(content, self.end);
        &content[start..end.max(start)]
    }
}

/// One side's editable text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextBuffer {
    content: String,
    language: LanguageTag,
    version: u64,
    caret: usize,
}

impl TextBuffer {
    pub fn new(language: LanguageTag) -> Self {
        Self {
            content: String::new(),
            language,
            version: 0,
            caret: 0,
        }
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn language(&self) -> &LanguageTag {
        &self.language
    }

    /// Incremented on every content replacement
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Caret position in UTF-16 code units
    pub fn caret(&self) -> usize {
        self.caret
    }

    /// Replace the whole content, keeping the caret offset where it still fits
    pub fn replace(&mut self, content: impl Into<String>) -> u64 {
        self.content = content.into();
        self.version += 1;
        self.caret = crate::sync::align::restore_caret(&self.content, self.caret);
        self.version
    }

    pub fn set_caret(&mut self, offset: usize) {
        self.caret = offset.min(utf16_len(&self.content));
    }

    pub fn set_language(&mut self, language: LanguageTag) {
        self.language = language;
    }
}

/// Length of `text` in UTF-16 code units
pub fn utf16_len(text: &str) -> usize {
    text.chars().map(char::len_utf16).sum()
}

/// Byte index in `text` for a UTF-16 offset
///
/// Offsets past the end clamp to `text.len()`. An offset that falls inside a
/// surrogate pair rounds down to the start of that character.
pub fn byte_index(text: &str, utf16_offset: usize) -> usize {
    let mut units = 0;
    for (idx, ch) in text.char_indices() {
        let next = units + ch.len_utf16();
        if next > utf16_offset {
            return idx;
        }
        units = next;
    }
    text.len()
}

/// UTF-16 offset of a byte index in `text`
pub fn utf16_offset(text: &str, byte_idx: usize) -> usize {
    utf16_len(&text[..byte_idx.min(text.len())])
}
