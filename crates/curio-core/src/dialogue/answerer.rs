//! Question answering from stored knowledge
//!
//! Looks the addressed concept up by exact attribute key and phrases an
//! answer with a confidence grade. `is` never falls back to `is_2`; a
//! numbered key only surfaces through the any-property scan. When nothing
//! is known the answer honestly says so and invites teaching.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::domain::concept::ConceptEntity;
use crate::parser::{Question, QuestionKind};

use super::templates::base_field;

/// Outcome of an answer lookup.
#[derive(Debug, Clone)]
pub struct AnswerResult {
    /// Whether the reply actually answers the question
    pub answered: bool,
    /// The reply text
    pub answer: String,
    /// Concept the answer speaks about
    pub concept: Option<String>,
    /// Attribute the answer was read from
    pub attribute: Option<String>,
    /// 0.0 (nothing known) to 0.95 (confirmed fact)
    pub confidence: f64,
}

/// Answers questions against loaded concepts.
#[derive(Debug)]
pub struct QuestionAnswerer {
    rng: StdRng,
}

impl Default for QuestionAnswerer {
    fn default() -> Self {
        Self::new()
    }
}

impl QuestionAnswerer {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Seeded constructor for deterministic template choice in tests
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Answer a classified question about an already-loaded concept.
    /// `None` means the store had no such concept.
    pub fn answer(&mut self, question: &Question, concept: Option<&ConceptEntity>) -> AnswerResult {
        let word = question.target.as_deref().unwrap_or("that").to_string();

        let Some(concept) = concept else {
            return self.unknown(&word);
        };

        match question.kind {
            QuestionKind::Definition => self.answer_definition(concept),
            QuestionKind::Confirmation => self.answer_confirmation(concept, question),
            QuestionKind::Ability => self.answer_with_attribute(concept, "can_do", "can", 0.85),
            QuestionKind::Manner => self.answer_with_attribute(concept, "is", "is", 0.85),
            QuestionKind::General => self
                .any_property_answer(concept)
                .unwrap_or_else(|| self.unknown(&concept.identity)),
        }
    }

    /// A conversational follow-up after a confident answer, or nothing.
    pub fn follow_up(&mut self, result: &AnswerResult) -> Option<String> {
        if !result.answered || result.confidence <= 0.5 {
            return None;
        }
        let word = result.concept.as_deref()?;

        Some(self.pick(vec![
            format!("Do you have any experience with {word}?"),
            format!("What else would you like to know about {word}?"),
            format!("That reminds me, I'd love to learn more about things related to {word}."),
        ]))
    }

    fn answer_definition(&mut self, concept: &ConceptEntity) -> AnswerResult {
        let word = &concept.identity;

        if let Some(value) = concept.attributes.first("is") {
            let answer = self.pick(vec![
                format!("{word} is {value}."),
                format!("I know that {word} is {value}."),
                format!("From what I've learned, {word} is {value}."),
            ]);
            return AnswerResult {
                answered: true,
                answer,
                concept: Some(word.clone()),
                attribute: Some("is".to_string()),
                confidence: 0.9,
            };
        }

        if let Some(result) = self.any_property_answer(concept) {
            return result;
        }

        let answer = self.pick(vec![
            format!("I know about {word}, but I don't have many details yet."),
            format!("I've heard of {word}, but I'd love to learn more!"),
            format!("I know {word} exists, but what else can you tell me?"),
        ]);
        AnswerResult {
            answered: true,
            answer,
            concept: Some(word.clone()),
            attribute: None,
            confidence: 0.5,
        }
    }

    fn answer_confirmation(&mut self, concept: &ConceptEntity, question: &Question) -> AnswerResult {
        let word = &concept.identity;
        let is_values = concept.attributes.values("is").unwrap_or(&[]);

        if let Some(queried) = &question.value {
            let queried_lower = queried.to_lowercase();
            if is_values.iter().any(|v| v.to_lowercase() == queried_lower) {
                let answer = self.pick(vec![
                    format!("Yes, {word} is {queried}!"),
                    format!("That's right! {word} is {queried}."),
                    format!("Correct! I know that {word} is {queried}."),
                ]);
                return AnswerResult {
                    answered: true,
                    answer,
                    concept: Some(word.clone()),
                    attribute: Some("is".to_string()),
                    confidence: 0.95,
                };
            }
            if let Some(known) = is_values.first() {
                let answer = self.pick(vec![
                    format!("I don't think so. I know {word} is {known}."),
                    format!("Not exactly. From what I learned, {word} is {known}."),
                    format!("Hmm, I don't have that information. But {word} is {known}."),
                ]);
                return AnswerResult {
                    answered: true,
                    answer,
                    concept: Some(word.clone()),
                    attribute: Some("is".to_string()),
                    confidence: 0.7,
                };
            }
        }

        self.any_property_answer(concept)
            .unwrap_or_else(|| self.unknown(word))
    }

    fn answer_with_attribute(
        &mut self,
        concept: &ConceptEntity,
        attribute: &str,
        phrase: &str,
        confidence: f64,
    ) -> AnswerResult {
        let word = &concept.identity;

        if let Some(value) = concept.attributes.first(attribute) {
            let answer = self.property_phrase(word, phrase, value);
            return AnswerResult {
                answered: true,
                answer,
                concept: Some(word.clone()),
                attribute: Some(attribute.to_string()),
                confidence,
            };
        }

        self.any_property_answer(concept)
            .unwrap_or_else(|| self.unknown(word))
    }

    /// First stored attribute of any name, phrased naturally.
    fn any_property_answer(&mut self, concept: &ConceptEntity) -> Option<AnswerResult> {
        let (name, values) = concept.attributes.iter().next()?;
        let value = values.first()?;
        let name = name.to_string();

        let answer = self.property_phrase(
            &concept.identity,
            relation_phrase(&name),
            value,
        );
        Some(AnswerResult {
            answered: true,
            answer,
            concept: Some(concept.identity.clone()),
            attribute: Some(name),
            confidence: 0.7,
        })
    }

    fn unknown(&mut self, word: &str) -> AnswerResult {
        let answer = self.pick(vec![
            format!("I don't know about {word} yet. Can you tell me?"),
            format!("Hmm, I haven't learned about {word}. What can you tell me?"),
            format!("I don't have information about {word}. Would you like to teach me?"),
        ]);
        AnswerResult {
            answered: false,
            answer,
            concept: Some(word.to_string()),
            attribute: None,
            confidence: 0.0,
        }
    }

    fn property_phrase(&mut self, word: &str, relation: &str, value: &str) -> String {
        self.pick(vec![
            format!("{word} {relation} {value}."),
            format!("I believe {word} {relation} {value}."),
            format!("Based on what I know, {word} {relation} {value}."),
        ])
    }

    fn pick(&mut self, mut options: Vec<String>) -> String {
        let index = self.rng.gen_range(0..options.len());
        options.swap_remove(index)
    }
}

/// Natural-language rendering of an attribute name; numbered variants
/// phrase like their base.
fn relation_phrase(attribute: &str) -> &str {
    match base_field(attribute) {
        "is" => "is",
        "can_do" => "can",
        "can_have" => "can have",
        "can_be" => "can be",
        "feels_like" => "feels like",
        "part_of" => "is part of",
        "used_for" => "is used for",
        "performed_by" => "is performed by",
        "affects" => "affects",
        "requires" => "requires",
        "results_in" => "results in",
        "describes" => "describes",
        "can_describe" => "can describe",
        "opposite" => "is the opposite of",
        "similar_to" => "is similar to",
        other => other,
    }
}
