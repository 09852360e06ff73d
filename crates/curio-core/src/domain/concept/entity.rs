//! Concept entity types for the knowledge graph
//!
//! This module defines the core types for learned concepts. A concept is a
//! word the system has been taught, classified as a part of speech, with a
//! bag of dynamic attributes that grows as the conversation teaches more.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Part of speech for a learned concept
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConceptKind {
    /// A thing (e.g., "dog", "saturday")
    Noun,
    /// An action (e.g., "run", "watch")
    Verb,
    /// A quality (e.g., "cold", "renewing")
    Adjective,
}

impl ConceptKind {
    /// Get the string representation (also the stored form)
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Noun => "Noun",
            Self::Verb => "Verb",
            Self::Adjective => "Adjective",
        }
    }

    /// Parse from string
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "noun" => Some(Self::Noun),
            "verb" => Some(Self::Verb),
            "adjective" | "adj" => Some(Self::Adjective),
            _ => None,
        }
    }

    /// Get all concept kinds
    pub fn all() -> &'static [ConceptKind] {
        &[Self::Noun, Self::Verb, Self::Adjective]
    }
}

impl std::fmt::Display for ConceptKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Ordered bag of dynamic attributes: attribute name -> distinct values.
///
/// Invariants: no name maps to an empty list, and values within a name are
/// distinct. Iteration order is deterministic (sorted by name).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttributeBag {
    map: BTreeMap<String, Vec<String>>,
}

impl AttributeBag {
    /// Create an empty bag
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a value under a name. Returns false when the value was already
    /// present (re-assertions are deduplicated in memory; their weight
    /// accumulates in storage on save).
    pub fn add(&mut self, name: impl Into<String>, value: impl Into<String>) -> bool {
        let name = name.into();
        let value = value.into();
        let values = self.map.entry(name).or_default();
        if values.iter().any(|v| *v == value) {
            return false;
        }
        values.push(value);
        true
    }

    /// Add a value under a numbered variant of `base`.
    ///
    /// Walks `base`, `base_2`, `base_3`, ... in order: a slot that already
    /// holds the value absorbs the assertion, otherwise the value lands in
    /// the first slot not yet taken. Existing slots are never overwritten.
    /// Returns the key used and whether anything new was written.
    pub fn add_numbered(&mut self, base: &str, value: &str) -> (String, bool) {
        let mut n = 1usize;
        loop {
            let key = if n == 1 {
                base.to_string()
            } else {
                format!("{}_{}", base, n)
            };
            match self.map.get(&key) {
                Some(values) if values.iter().any(|v| v == value) => return (key, false),
                Some(_) => n += 1,
                None => {
                    self.map.insert(key.clone(), vec![value.to_string()]);
                    return (key, true);
                }
            }
        }
    }

    /// The first key in the `base`, `base_2`, `base_3`, ... sequence that
    /// is not yet present.
    pub fn next_numbered_key(&self, base: &str) -> String {
        let mut n = 1usize;
        loop {
            let key = if n == 1 {
                base.to_string()
            } else {
                format!("{}_{}", base, n)
            };
            if !self.map.contains_key(&key) {
                return key;
            }
            n += 1;
        }
    }

    /// Values stored under a name
    pub fn values(&self, name: &str) -> Option<&[String]> {
        self.map.get(name).map(|v| v.as_slice())
    }

    /// First (highest-weight after a load) value stored under a name
    pub fn first(&self, name: &str) -> Option<&str> {
        self.map.get(name).and_then(|v| v.first()).map(|s| s.as_str())
    }

    /// Whether any value is stored under a name
    pub fn contains(&self, name: &str) -> bool {
        self.map.contains_key(name)
    }

    /// Remove a value from a name. Removing the last value removes the
    /// name entirely so empty lists never survive.
    pub fn remove(&mut self, name: &str, value: &str) -> bool {
        let Some(values) = self.map.get_mut(name) else {
            return false;
        };
        let before = values.len();
        values.retain(|v| v != value);
        let removed = values.len() != before;
        if values.is_empty() {
            self.map.remove(name);
        }
        removed
    }

    /// Iterate over attribute names in sorted order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.map.keys().map(|s| s.as_str())
    }

    /// Iterate over (name, values) pairs in sorted name order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.map.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Iterate over every (name, value) pair, flattened
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.map
            .iter()
            .flat_map(|(k, vs)| vs.iter().map(move |v| (k.as_str(), v.as_str())))
    }

    /// Number of attribute names
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Whether the bag holds no attributes
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

/// A learned concept: a word, its part of speech, and its attributes.
///
/// The identity is the lowercase word itself and is unique across the
/// store. Attributes are free-form named lists that accumulate as the
/// user teaches facts about the concept.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConceptEntity {
    /// Unique identifier for the concept
    pub id: String,
    /// The lowercase word this concept stands for
    pub identity: String,
    /// Part of speech
    pub kind: ConceptKind,
    /// Dynamic attributes
    pub attributes: AttributeBag,
    /// When the concept was created
    pub created_at: DateTime<Utc>,
    /// When the concept was last updated
    pub updated_at: DateTime<Utc>,
}

impl ConceptEntity {
    /// Create a new concept. The identity is trimmed and lowercased.
    pub fn new(identity: impl Into<String>, kind: ConceptKind) -> Self {
        let identity = identity.into().trim().to_lowercase();
        let now = Utc::now();

        Self {
            id: Uuid::new_v4().to_string(),
            identity,
            kind,
            attributes: AttributeBag::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Add an attribute (builder form, for tests and seeding)
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.add(name, value);
        self
    }

    /// Add an attribute value; bumps `updated_at` when something changed
    pub fn add_attribute(&mut self, name: impl Into<String>, value: impl Into<String>) -> bool {
        let added = self.attributes.add(name, value);
        if added {
            self.updated_at = Utc::now();
        }
        added
    }

    /// Add a relation under a numbered key variant; bumps `updated_at`
    /// when something changed. Returns the key the value landed in.
    pub fn add_relation(&mut self, base: &str, value: &str) -> (String, bool) {
        let (key, added) = self.attributes.add_numbered(base, value);
        if added {
            self.updated_at = Utc::now();
        }
        (key, added)
    }

    /// Remove an attribute value; bumps `updated_at` when something changed
    pub fn remove_attribute(&mut self, name: &str, value: &str) -> bool {
        let removed = self.attributes.remove(name, value);
        if removed {
            self.updated_at = Utc::now();
        }
        removed
    }

    /// Whether the concept has any value for an attribute name
    pub fn has_attribute(&self, name: &str) -> bool {
        self.attributes.contains(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_concept_creation_normalizes_identity() {
        let concept = ConceptEntity::new("  Dog ", ConceptKind::Noun);

        assert!(!concept.id.is_empty());
        assert_eq!(concept.identity, "dog");
        assert_eq!(concept.kind, ConceptKind::Noun);
        assert!(concept.attributes.is_empty());
    }

    #[test]
    fn test_add_deduplicates_values() {
        let mut bag = AttributeBag::new();

        assert!(bag.add("is", "animal"));
        assert!(!bag.add("is", "animal"));
        assert!(bag.add("is", "pet"));

        assert_eq!(bag.values("is"), Some(&["animal".to_string(), "pet".to_string()][..]));
    }

    #[test]
    fn test_remove_prunes_empty_lists() {
        let mut bag = AttributeBag::new();
        bag.add("is", "animal");

        assert!(bag.remove("is", "animal"));
        assert!(!bag.contains("is"));
        assert!(bag.is_empty());

        // Removing from a missing name is a no-op
        assert!(!bag.remove("is", "animal"));
    }

    #[test]
    fn test_numbered_keys_never_overwrite() {
        let mut bag = AttributeBag::new();

        let (key, added) = bag.add_numbered("is", "animal");
        assert_eq!(key, "is");
        assert!(added);

        // Distinct value moves to the next slot
        let (key, added) = bag.add_numbered("is", "loyal");
        assert_eq!(key, "is_2");
        assert!(added);

        let (key, added) = bag.add_numbered("is", "mammal");
        assert_eq!(key, "is_3");
        assert!(added);

        // Re-asserting an existing value reuses its slot
        let (key, added) = bag.add_numbered("is", "loyal");
        assert_eq!(key, "is_2");
        assert!(!added);

        assert_eq!(bag.values("is"), Some(&["animal".to_string()][..]));
        assert_eq!(bag.values("is_2"), Some(&["loyal".to_string()][..]));
    }

    #[test]
    fn test_next_numbered_key() {
        let mut bag = AttributeBag::new();
        assert_eq!(bag.next_numbered_key("is"), "is");

        bag.add("is", "animal");
        assert_eq!(bag.next_numbered_key("is"), "is_2");

        bag.add("is_2", "loyal");
        assert_eq!(bag.next_numbered_key("is"), "is_3");
    }

    #[test]
    fn test_mutation_bumps_updated_at() {
        let mut concept = ConceptEntity::new("dog", ConceptKind::Noun);
        let created = concept.updated_at;

        assert!(concept.add_attribute("is", "animal"));
        assert!(concept.updated_at >= created);

        // No-op add does not touch the timestamp
        let after_add = concept.updated_at;
        assert!(!concept.add_attribute("is", "animal"));
        assert_eq!(concept.updated_at, after_add);
    }

    #[test]
    fn test_entries_flattens_pairs() {
        let mut bag = AttributeBag::new();
        bag.add("is", "animal");
        bag.add("is", "pet");
        bag.add("can_do", "bark");

        let entries: Vec<(&str, &str)> = bag.entries().collect();
        assert_eq!(
            entries,
            vec![("can_do", "bark"), ("is", "animal"), ("is", "pet")]
        );
    }

    #[test]
    fn test_kind_parsing() {
        assert_eq!(ConceptKind::parse("noun"), Some(ConceptKind::Noun));
        assert_eq!(ConceptKind::parse("VERB"), Some(ConceptKind::Verb));
        assert_eq!(ConceptKind::parse("adjective"), Some(ConceptKind::Adjective));
        assert_eq!(ConceptKind::parse("adj"), Some(ConceptKind::Adjective));
        assert_eq!(ConceptKind::parse("adverb"), None);
    }

    #[test]
    fn test_kind_round_trips_through_storage_form() {
        for kind in ConceptKind::all() {
            assert_eq!(ConceptKind::parse(kind.as_str()), Some(*kind));
        }
    }
}
