//! Word mapping between the two buffers

use crate::sync::buffer::Direction;
use serde::{Deserialize, Serialize};

/// One aligned token pair from the latest translation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingEntry {
    pub source: String,
    pub target: String,
}

impl MappingEntry {
    /// Create an entry pairing `source` with its translation `target`
    ///
    /// # Example
    ///
    /// ```ignore
    /// let entry = MappingEntry::new("chat", "cat");
    /// assert_eq!(entry.target, "cat");
    /// ```
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
        }
    }
}

impl From<(String, String)> for MappingEntry {
    fn from((source, target): (String, String)) -> Self {
        Self { source, target }
    }
}

/// Ordered source → target pairs of the latest translation
///
/// The table is rebuilt wholesale after every successful translation and never
/// patched. Duplicate source tokens are allowed; lookups return the last one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MappingTable {
    entries: Vec<MappingEntry>,
    direction: Option<Direction>,
}

impl MappingTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace every entry with `pairs`, remembering the direction they were produced for
    ///
    /// The new entries are collected before anything is touched, so readers
    /// see either the old table or the new one, never a mix. Nothing of the
    /// previous table survives, including its direction.
    ///
    /// # Arguments
    ///
    /// * `pairs` - Token pairs in reply order; anything convertible into a `MappingEntry`
    /// * `direction` - Direction of the translation the pairs came from
    ///
    /// # Example
    ///
    /// ```ignore
    /// table.rebuild(vec![("Bonjour".to_string(), "Hello".to_string())], Direction::AtoB);
    /// assert_eq!(table.lookup_forward("Bonjour"), Some("Hello"));
    /// ```
    pub fn rebuild<I, E>(&mut self, pairs: I, direction: Direction)
    where
        I: IntoIterator<Item = E>,
        E: Into<MappingEntry>,
    {
        // Collected first so the swap below is the only mutation.
        let entries: Vec<MappingEntry> = pairs.into_iter().map(Into::into).collect();
        self.entries = entries;
        self.direction = Some(direction);
    }

    /// Drop all entries and forget the direction
    pub fn clear(&mut self) {
        self.entries.clear();
        self.direction = None;
    }

    /// Target token for a source token
    ///
    /// Exact match. When the source token appears more than once, the last
    /// entry wins.
    ///
    /// # Returns
    ///
    /// * `Some(&str)` - The target token of the last matching entry
    /// * `None` - If no entry has `token` as its source
    pub fn lookup_forward(&self, token: &str) -> Option<&str> {
        self.entries
            .iter()
            .rev()
            .find(|e| e.source == token)
            .map(|e| e.target.as_str())
    }

    /// Source token for a target token; the mirror of [`lookup_forward`](Self::lookup_forward)
    pub fn lookup_backward(&self, token: &str) -> Option<&str> {
        self.entries
            .iter()
            .rev()
            .find(|e| e.target == token)
            .map(|e| e.source.as_str())
    }

    /// All entries in the order the provider listed them
    pub fn entries(&self) -> &[MappingEntry] {
        &self.entries
    }

    /// Direction of the translation the entries came from
    pub fn direction(&self) -> Option<Direction> {
        self.direction
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(list: &[(&str, &str)]) -> Vec<MappingEntry> {
        list.iter().map(|(s, t)| MappingEntry::new(*s, *t)).collect()
    }

    #[test]
    fn test_rebuild_replaces_everything() {
        let mut table = MappingTable::new();
        table.rebuild(pairs(&[("le", "the"), ("chat", "cat")]), Direction::AtoB);
        table.rebuild(pairs(&[("the", "le")]), Direction::BtoA);

        assert_eq!(table.entries(), pairs(&[("the", "le")]).as_slice());
        assert_eq!(table.direction(), Some(Direction::BtoA));
        assert_eq!(table.lookup_forward("chat"), None);
    }

    #[test]
    fn test_lookup_last_write_wins() {
        let mut table = MappingTable::new();
        table.rebuild(
            pairs(&[("le", "the"), ("chat", "cat"), ("le", "it")]),
            Direction::AtoB,
        );
        assert_eq!(table.lookup_forward("le"), Some("it"));
        assert_eq!(table.lookup_forward("chien"), None);
    }

    #[test]
    fn test_lookup_backward() {
        let mut table = MappingTable::new();
        table.rebuild(
            pairs(&[("Bonjour", "Hello"), ("Salut", "Hello")]),
            Direction::AtoB,
        );
        assert_eq!(table.lookup_backward("Hello"), Some("Salut"));
        assert_eq!(table.lookup_backward("Bonjour"), None);
    }

    #[test]
    fn test_rebuild_from_tuples_keeps_order() {
        let mut table = MappingTable::new();
        let raw = vec![
            ("b".to_string(), "2".to_string()),
            ("a".to_string(), "1".to_string()),
        ];
        table.rebuild(raw, Direction::AtoB);
        let sources: Vec<&str> = table.entries().iter().map(|e| e.source.as_str()).collect();
        assert_eq!(sources, vec!["b", "a"]);
    }

    #[test]
    fn test_clear() {
        let mut table = MappingTable::new();
        table.rebuild(pairs(&[("a", "b")]), Direction::AtoB);
        table.clear();
        assert!(table.is_empty());
        assert_eq!(table.direction(), None);
    }
}
