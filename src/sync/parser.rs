//! Parser for the two-section provider reply
//!
//! The provider is asked to answer in this shape:
//!
//! ```text
//! Full Translation:
//! Bonjour le monde
//!
//! Word Mapping:
//! Hello -> Bonjour
//! world -> monde
//! ```
//!
//! Markers are matched case-insensitively anywhere in a line, and text that
//! follows a marker on the same line belongs to that marker's section.
//! Parsing is total: anything unexpected degrades to a shorter result.

use regex::Regex;
use std::sync::LazyLock;
use tracing::warn;

static TRANSLATION_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)full translation:").expect("valid marker regex"));
static MAPPING_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)word mapping:").expect("valid marker regex"));

const ARROW: &str = "->";

/// Translation text and word pairs recovered from a provider reply
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedResponse {
    pub translation: String,
    pub mapping: Vec<(String, String)>,
    /// A section marker was missing, or the mapping marker came first
    ///
    /// The recovered fields are still usable; the flag is only for logging.
    pub degraded: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Translation,
    Mapping,
}

/// A line classified by the marker it carries, with the text after the marker
fn classify(line: &str) -> Option<(Section, &str)> {
    if let Some(m) = MAPPING_MARKER.find(line) {
        return Some((Section::Mapping, &line[m.end()..]));
    }
    if let Some(m) = TRANSLATION_MARKER.find(line) {
        return Some((Section::Translation, &line[m.end()..]));
    }
    None
}

/// Split a mapping line once on the first arrow
///
/// Returns `None` unless both sides are non-empty after trimming.
pub fn parse_mapping_line(line: &str) -> Option<(String, String)> {
    let (source, target) = line.split_once(ARROW)?;
    let (source, target) = (source.trim(), target.trim());
    if source.is_empty() || target.is_empty() {
        return None;
    }
    Some((source.to_string(), target.to_string()))
}

/// Parse a raw provider reply; never fails
///
/// Lines before any marker count as translation text. Translation lines are
/// joined with single spaces, so the result never contains a newline. When
/// the mapping marker comes before the translation marker, everything above
/// it is the translation and the mappings are dropped.
///
/// # Arguments
///
/// * `raw` - The provider's reply, as returned by
///   [`TranslationProvider::complete`](crate::sync::TranslationProvider::complete)
///
/// # Returns
///
/// The translation, the word pairs in reply order, and whether the reply
/// was missing a marker.
///
/// # Example
///
/// ```ignore
/// let parsed = parse_response("Full Translation:\nHello world\n\nWord Mapping:\nBonjour -> Hello");
/// assert_eq!(parsed.translation, "Hello world");
/// assert_eq!(parsed.mapping, vec![("Bonjour".to_string(), "Hello".to_string())]);
/// ```
pub fn parse_response(raw: &str) -> ParsedResponse {
    let lines: Vec<&str> = raw.lines().map(str::trim).collect();

    let first_translation = lines
        .iter()
        .position(|l| matches!(classify(l), Some((Section::Translation, _))));
    let first_mapping = lines
        .iter()
        .position(|l| matches!(classify(l), Some((Section::Mapping, _))));

    if let (Some(t), Some(m)) = (first_translation, first_mapping) {
        if m < t {
            warn!("word mapping section precedes the translation; ignoring mappings");
            return ParsedResponse {
                translation: join_words(lines[..m].iter().copied()),
                mapping: Vec::new(),
                degraded: true,
            };
        }
    }

    let mut translation_parts = Vec::new();
    let mut mapping = Vec::new();
    let mut section = Section::Translation;

    for line in lines {
        let body = match classify(line) {
            Some((marker, rest)) => {
                section = marker;
                rest.trim()
            }
            None => line,
        };
        if body.is_empty() {
            continue;
        }
        match section {
            Section::Translation => translation_parts.push(body),
            // Malformed mapping lines are dropped silently
            Section::Mapping => mapping.extend(parse_mapping_line(body)),
        }
    }

    ParsedResponse {
        translation: join_words(translation_parts),
        mapping,
        degraded: first_translation.is_none() || first_mapping.is_none(),
    }
}

fn join_words<'a>(parts: impl IntoIterator<Item = &'a str>) -> String {
    parts
        .into_iter()
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
        .trim()
        .to_string()
}

/// Render a translation and its mapping in the reply format the parser reads
pub fn format_response(translation: &str, mapping: &[(String, String)]) -> String {
    let mut out = String::from("Full Translation:\n");
    out.push_str(translation);
    out.push_str("\n\nWord Mapping:\n");
    for (source, target) in mapping {
        out.push_str(&format!("{} {} {}\n", source, ARROW, target));
    }
    out
}
