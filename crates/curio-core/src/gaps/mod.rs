//! Knowledge gap analysis
//!
//! Every concept kind carries a fixed schedule of expected attributes.
//! The analyzer scans that schedule to pick the next thing worth asking
//! about, measures how complete a concept is, and ranks concepts by how
//! much is still missing. The scan order is fixed so question sequencing
//! is deterministic and testable.

use crate::domain::concept::{ConceptEntity, ConceptKind};

const NOUN_PRIORITY: &[&str] = &[
    "is", "can_do", "can_have", "feels_like", "used_for", "part_of", "can_be",
];
const VERB_PRIORITY: &[&str] = &["performed_by", "affects", "feels_like", "requires", "results_in"];
const ADJECTIVE_PRIORITY: &[&str] = &[
    "describes", "intensity", "opposite", "similar_to", "can_describe",
];

const NOUN_STANDARD: &[&str] = &[
    "is", "feels_like", "can_do", "can_have", "can_be", "part_of", "used_for",
];
const VERB_STANDARD: &[&str] = &["performed_by", "affects", "requires", "results_in", "feels_like"];

/// Attribute names asked about first, most important leading.
pub fn priority_fields(kind: ConceptKind) -> &'static [&'static str] {
    match kind {
        ConceptKind::Noun => NOUN_PRIORITY,
        ConceptKind::Verb => VERB_PRIORITY,
        ConceptKind::Adjective => ADJECTIVE_PRIORITY,
    }
}

/// The full set of expected attribute names for a kind. This is the
/// denominator for completeness.
pub fn standard_fields(kind: ConceptKind) -> &'static [&'static str] {
    match kind {
        ConceptKind::Noun => NOUN_STANDARD,
        ConceptKind::Verb => VERB_STANDARD,
        ConceptKind::Adjective => ADJECTIVE_PRIORITY,
    }
}

/// A concept with missing attributes, ready for display.
#[derive(Debug, Clone)]
pub struct GapReport {
    pub identity: String,
    pub kind: ConceptKind,
    /// Filled fraction of the expected attributes, 0.0 to 1.0
    pub completeness: f64,
    /// `(1 - completeness) * 100`, higher means more missing
    pub priority: f64,
    /// Missing expected attributes, in standard order
    pub missing: Vec<String>,
}

/// The next attribute worth asking about: the first missing name in
/// priority order, falling back to the standard schedule. `None` when
/// nothing is missing.
pub fn find_next_gap(concept: &ConceptEntity) -> Option<&'static str> {
    let missing = |field: &&&str| !concept.attributes.contains(field);

    priority_fields(concept.kind)
        .iter()
        .find(missing)
        .or_else(|| standard_fields(concept.kind).iter().find(missing))
        .copied()
}

/// Every expected attribute the concept is still missing.
pub fn all_gaps(concept: &ConceptEntity) -> Vec<&'static str> {
    standard_fields(concept.kind)
        .iter()
        .filter(|field| !concept.attributes.contains(field))
        .copied()
        .collect()
}

/// Filled fraction of the expected attributes. An empty schedule counts
/// as fully complete.
pub fn completeness(concept: &ConceptEntity) -> f64 {
    let fields = standard_fields(concept.kind);
    if fields.is_empty() {
        return 1.0;
    }

    let filled = fields
        .iter()
        .filter(|field| concept.attributes.contains(field))
        .count();
    filled as f64 / fields.len() as f64
}

/// Rank concepts by how much is missing, most incomplete first. Concepts
/// with nothing missing are excluded. Ties keep input order.
pub fn rank(concepts: &[ConceptEntity]) -> Vec<GapReport> {
    let mut reports: Vec<GapReport> = concepts
        .iter()
        .filter_map(|concept| {
            let missing = all_gaps(concept);
            if missing.is_empty() {
                return None;
            }
            let completeness = completeness(concept);
            Some(GapReport {
                identity: concept.identity.clone(),
                kind: concept.kind,
                completeness,
                priority: (1.0 - completeness) * 100.0,
                missing: missing.into_iter().map(String::from).collect(),
            })
        })
        .collect();

    reports.sort_by(|a, b| {
        b.priority
            .partial_cmp(&a.priority)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    reports
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_noun_asks_is_first() {
        let dog = ConceptEntity::new("dog", ConceptKind::Noun);
        assert_eq!(find_next_gap(&dog), Some("is"));
    }

    #[test]
    fn test_gap_order_is_deterministic() {
        let dog = ConceptEntity::new("dog", ConceptKind::Noun).with_attribute("is", "animal");

        // "is" is filled, so the next priority field comes up, every time
        assert_eq!(find_next_gap(&dog), Some("can_do"));
        assert_eq!(find_next_gap(&dog), Some("can_do"));
    }

    #[test]
    fn test_numbered_variants_do_not_fill_the_base_field() {
        let mut dog = ConceptEntity::new("dog", ConceptKind::Noun);
        dog.add_attribute("is_2", "furry");

        assert_eq!(find_next_gap(&dog), Some("is"));
    }

    #[test]
    fn test_verb_and_adjective_schedules() {
        let run = ConceptEntity::new("run", ConceptKind::Verb);
        assert_eq!(find_next_gap(&run), Some("performed_by"));

        let cold = ConceptEntity::new("cold", ConceptKind::Adjective);
        assert_eq!(find_next_gap(&cold), Some("describes"));
    }

    #[test]
    fn test_fully_described_concept_has_no_gap() {
        let mut cold = ConceptEntity::new("cold", ConceptKind::Adjective);
        for field in standard_fields(ConceptKind::Adjective) {
            cold.add_attribute(*field, "something");
        }

        assert_eq!(find_next_gap(&cold), None);
        assert!(all_gaps(&cold).is_empty());
        assert_eq!(completeness(&cold), 1.0);
    }

    #[test]
    fn test_completeness_fraction() {
        let dog = ConceptEntity::new("dog", ConceptKind::Noun).with_attribute("is", "animal");

        let expected = 1.0 / NOUN_STANDARD.len() as f64;
        assert!((completeness(&dog) - expected).abs() < f64::EPSILON);
    }

    #[test]
    fn test_rank_orders_most_incomplete_first() {
        let empty = ConceptEntity::new("cat", ConceptKind::Noun);
        let partial = ConceptEntity::new("dog", ConceptKind::Noun)
            .with_attribute("is", "animal")
            .with_attribute("can_do", "bark");
        let mut complete = ConceptEntity::new("cold", ConceptKind::Adjective);
        for field in standard_fields(ConceptKind::Adjective) {
            complete.add_attribute(*field, "x");
        }

        let reports = rank(&[partial.clone(), empty.clone(), complete]);

        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0].identity, "cat");
        assert_eq!(reports[1].identity, "dog");
        assert!(reports[0].priority > reports[1].priority);
        assert_eq!(reports[0].missing.len(), NOUN_STANDARD.len());
    }
}
