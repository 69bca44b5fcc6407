//! Selection alignment and caret preservation
//!
//! Alignment is best effort. It assumes mapped tokens appear in the same
//! relative order in both buffers, and resolves repeated tokens by taking the
//! first match. All offsets are UTF-16 code units.

use crate::sync::buffer::{SelectionRange, byte_index, utf16_len, utf16_offset};
use crate::sync::mapping::MappingTable;

/// Which side of the mapping table the selected buffer corresponds to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup {
    /// Selection is in the buffer the table's source tokens came from
    Forward,
    /// Selection is in the buffer the table's target tokens came from
    Backward,
}

/// Map `selection` in `source` to the equivalent span of `target`
///
/// The first and last selected words are looked up in the table, and the
/// target span starts at the first occurrence of the first word's
/// translation and covers the translations of every entry in between.
///
/// # Arguments
///
/// * `source` - Content of the buffer holding the selection
/// * `selection` - Selection in `source`, in UTF-16 code units
/// * `target` - Content of the buffer to highlight
/// * `table` - The current word mapping
/// * `lookup` - Which side of the table `source` corresponds to
///
/// # Returns
///
/// The range to highlight in `target`, or `None` when the selection is blank,
/// its first or last word has no entry in the table, or the last word maps
/// to an earlier entry than the first.
///
/// # Example
///
/// ```ignore
/// let mut table = MappingTable::new();
/// table.rebuild(vec![("Bonjour".to_string(), "Hello".to_string())], Direction::AtoB);
/// let span = align_selection("Bonjour monde", SelectionRange { start: 0, end: 7 },
///     "Hello world", &table, Lookup::Forward);
/// assert_eq!(span, Some(SelectionRange { start: 0, end: 5 }));
/// ```
pub fn align_selection(
    source: &str,
    selection: SelectionRange,
    target: &str,
    table: &MappingTable,
    lookup: Lookup,
) -> Option<SelectionRange> {
    let selected = selection.slice(source).trim();
    let selected_words: Vec<&str> = selected.split_whitespace().collect();
    let first = *selected_words.first()?;
    let last = *selected_words.last()?;

    let pairs: Vec<(&str, &str)> = table
        .entries()
        .iter()
        .map(|e| match lookup {
            Lookup::Forward => (e.source.as_str(), e.target.as_str()),
            Lookup::Backward => (e.target.as_str(), e.source.as_str()),
        })
        .collect();

    let start_index = pairs.iter().position(|(from, _)| *from == first)?;
    let end_index = pairs.iter().rposition(|(from, _)| *from == last)?;
    if end_index < start_index {
        return None;
    }

    let translated_words: Vec<&str> = pairs[start_index..=end_index]
        .iter()
        .map(|(_, to)| *to)
        .collect();
    let translated_text = translated_words.join(" ");

    let start_byte = target.find(translated_words[0])?;
    let start = utf16_offset(target, start_byte);
    let end = (start + utf16_len(&translated_text)).min(utf16_len(target));
    Some(SelectionRange { start, end })
}

/// Caret offset to use after the buffer content is replaced by `content`
///
/// The offset is kept as is when it still fits, otherwise clamped to the end.
pub fn restore_caret(content: &str, offset: usize) -> usize {
    offset.min(utf16_len(content))
}

/// Caret location inside text rendered as several consecutive segments
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaretPosition {
    pub segment: usize,
    pub offset: usize,
}

/// Count of code units between the start of `segments` and `position`
pub fn caret_offset(segments: &[&str], position: CaretPosition) -> usize {
    let before: usize = segments
        .iter()
        .take(position.segment)
        .map(|s| utf16_len(s))
        .sum();
    let within = segments
        .get(position.segment)
        .map(|s| position.offset.min(utf16_len(s)))
        .unwrap_or(0);
    before + within
}

/// Walk `segments` accumulating lengths until `offset` is reached
///
/// Offsets past the end land at the end of the last segment. Returns `None`
/// when there is no text at all.
pub fn locate_caret(segments: &[&str], offset: usize) -> Option<CaretPosition> {
    let total: usize = segments.iter().map(|s| utf16_len(s)).sum();
    if total == 0 {
        return None;
    }
    let offset = offset.min(total);

    let mut current = 0;
    for (segment, text) in segments.iter().enumerate() {
        let next = current + utf16_len(text);
        if offset <= next && !text.is_empty() {
            return Some(CaretPosition {
                segment,
                offset: offset - current,
            });
        }
        current = next;
    }
    None
}

/// Split `content` into plain and highlighted runs for rendering
pub fn highlight_segments(content: &str, highlight: Option<SelectionRange>) -> Vec<&str> {
    let Some(range) = highlight else {
        return vec![content];
    };
    let start = byte_index(content, range.start);
    let end = byte_index(content, range.end).max(start);
    vec![&content[..start], &content[start..end], &content[end..]]
}
