//! Conversational phrasing
//!
//! All the fixed wording lives here: gap questions keyed by attribute and
//! concept kind, confirmations for learned facts, greeting and
//! part-of-speech prompts. Keeping the strings in one place keeps the
//! engine logic readable and the wording testable.

use rand::Rng;

use crate::domain::concept::ConceptKind;
use crate::parser::{Relation, RelationTriple};

const GREETING_PLAIN: &[&str] = &[
    "Hello! What would you like to teach me today?",
    "Hello! I'm ready to learn something new.",
    "Hello there! Tell me about something you find interesting.",
];

const GREETING_ASKED_HOW: &[&str] = &[
    "Hello! I'm doing well and eager to learn. What's on your mind?",
    "Hello! I'm well, thank you for asking. What would you like to talk about?",
    "Hello! All good here. What should we explore today?",
];

/// Question asked to fill a missing attribute, phrased per attribute and
/// concept kind.
pub fn gap_question(word: &str, field: &str, kind: ConceptKind) -> String {
    use ConceptKind::{Adjective, Noun, Verb};

    let specific = match (field, kind) {
        ("is", Noun) => Some(format!("What is {word}?")),
        ("is", Verb) => Some(format!("What kind of action is {word}?")),
        ("is", Adjective) => Some(format!("What does {word} describe?")),
        ("feels_like", Noun) => Some(format!("What does {word} feel like?")),
        ("feels_like", Verb) => Some(format!("What does it feel like to {word}?")),
        ("feels_like", Adjective) => Some(format!("How does something {word} feel?")),
        ("can_do", Noun) => Some(format!("What can {word} do?")),
        ("can_do", Verb) => Some(format!("What can happen when you {word}?")),
        ("can_do", Adjective) => Some(format!("What can {word} things do?")),
        ("can_have", Noun) => Some(format!("What can {word} have?")),
        ("can_have", Verb) => Some(format!("What do you need to {word}?")),
        ("can_have", Adjective) => Some(format!("What can {word} things have?")),
        ("can_be", Noun) => Some(format!("What can {word} be?")),
        ("can_be", Verb) => Some(format!("What states result from {word}?")),
        ("can_be", Adjective) => Some(format!("What else can be {word}?")),
        ("part_of", Noun) => Some(format!("What is {word} part of?")),
        ("part_of", Verb) => Some(format!("What process is {word} part of?")),
        ("part_of", Adjective) => Some(format!("What category is {word} part of?")),
        ("used_for", Noun) => Some(format!("What is {word} used for?")),
        ("used_for", Verb) => Some(format!("Why do people {word}?")),
        ("used_for", Adjective) => Some(format!("When is {word} used?")),
        ("performed_by", Verb) => Some(format!("Who or what can {word}?")),
        ("affects", Verb) => Some(format!("What does {word} affect?")),
        ("requires", Verb) => Some(format!("What does {word} require?")),
        ("results_in", Verb) => Some(format!("What does {word} result in?")),
        ("describes", Adjective) => Some(format!("What does {word} describe?")),
        ("intensity", Adjective) => Some(format!("How intense or strong is {word}?")),
        ("opposite", Adjective) => Some(format!("What is the opposite of {word}?")),
        ("similar_to", Adjective) => Some(format!("What is similar to {word}?")),
        ("can_describe", Adjective) => Some(format!("What kinds of things can be {word}?")),
        _ => None,
    };

    specific
        .unwrap_or_else(|| format!("Tell me about the {} of {word}?", relation_description(field)))
}

/// Human description of an attribute name, for generic phrasing.
pub fn relation_description(field: &str) -> &str {
    match field {
        "is" => "state or quality of being",
        "feels_like" => "sensory or emotional quality",
        "can_do" => "capable action",
        "can_have" => "possession or containment",
        "can_be" => "potential state",
        "part_of" => "component relationship",
        "used_for" => "purpose or function",
        "performed_by" => "agent of action",
        "affects" => "target of action",
        "requires" => "prerequisite",
        "results_in" => "consequence",
        "describes" => "described concept",
        "intensity" => "degree or strength",
        "opposite" => "antonym",
        "similar_to" => "synonym or related concept",
        "can_describe" => "describable types",
        other => other,
    }
}

/// Confirmation after a direct property answer filled `field` on `word`.
/// Numbered variants confirm with their base wording (`is_2` reads as
/// `is`).
pub fn learned_confirmation(word: &str, field: &str, value: &str) -> String {
    match base_field(field) {
        "is" => format!("I see, {word} is {value}."),
        "feels_like" => format!("I understand, {word} feels like {value}."),
        "can_do" => format!("Got it, {word} can {value}."),
        "can_have" => format!("I see, {word} can have {value}."),
        "can_be" => format!("Understood, {word} can be {value}."),
        "part_of" => format!("I see, {word} is part of {value}."),
        "used_for" => format!("Got it, {word} is used for {value}."),
        "performed_by" => format!("I understand, {word} is performed by {value}."),
        "affects" => format!("I see, {word} affects {value}."),
        "requires" => format!("Got it, {word} requires {value}."),
        "results_in" => format!("I understand, {word} results in {value}."),
        "describes" => format!("I see, {word} describes {value}."),
        "intensity" => format!("Got it, {word} has intensity: {value}."),
        "opposite" => format!("I see, the opposite of {word} is {value}."),
        "similar_to" => format!("I understand, {word} is similar to {value}."),
        "can_describe" => format!("Got it, {word} can describe {value}."),
        base => format!("I learned that {word} has {base}: {value}."),
    }
}

/// Confirmation of what a statement taught, built from its first relation.
/// First-person subjects flip to second person so the reply talks back to
/// the user.
pub fn statement_confirmation(relations: &[RelationTriple]) -> String {
    let Some(first) = relations.first() else {
        return "I'm listening and learning from what you say.".to_string();
    };

    let (subject, be) = convert_pronoun(&first.source);
    let target = &first.target;

    match first.relation {
        Relation::Is => format!("I see, {subject} {be} {target}."),
        Relation::CanHave => format!("Got it, {subject} can have {target}."),
        Relation::CanDo => format!("I understand, {subject} can {target}."),
        Relation::FeelsLike => format!("I see, {subject} feels like {target}."),
        Relation::Action => format!("I learned about {subject}."),
    }
}

/// Flip first-person words to second person, with the matching be-form.
pub fn convert_pronoun(word: &str) -> (String, &'static str) {
    match word {
        "i" | "me" => ("you".to_string(), "are"),
        "my" => ("your".to_string(), "is"),
        _ => (word.to_string(), "is"),
    }
}

/// Strip a numeric disambiguator: `is_2` -> `is`, `feels_like_3` ->
/// `feels_like`.
pub fn base_field(field: &str) -> &str {
    match field.rsplit_once('_') {
        Some((base, suffix)) if suffix.chars().all(|c| c.is_ascii_digit()) => base,
        _ => field,
    }
}

/// Prompt for the part of speech of a word the system has never seen.
pub fn pos_question(word: &str) -> String {
    format!("I don't know the word '{word}' yet. What part of speech is it - a noun, verb, or adjective?")
}

/// Thanks after a part-of-speech answer stored the word.
pub fn pos_thanks(word: &str, kind: ConceptKind) -> String {
    format!(
        "Thank you! I've learned that '{word}' is a {}.",
        kind.as_str().to_lowercase()
    )
}

/// Re-prompt when a part-of-speech answer did not name one.
pub fn pos_clarification(word: &str) -> String {
    format!("I didn't catch that. Is '{word}' a noun, a verb, or an adjective?")
}

/// Reply when the property question was passed on.
pub fn property_pass() -> String {
    "That's okay! Tell me about something else.".to_string()
}

/// Reply when a property answer could not be read.
pub fn property_clarification() -> String {
    "I didn't quite understand. Could you rephrase that?".to_string()
}

/// Greeting reply; acknowledges being asked how it is doing.
pub fn greeting_reply<R: Rng>(rng: &mut R, asked_how: bool) -> String {
    let pool = if asked_how {
        GREETING_ASKED_HOW
    } else {
        GREETING_PLAIN
    };
    choose(rng, pool).to_string()
}

/// Pick one entry from a fixed pool.
pub fn choose<'a, R: Rng>(rng: &mut R, pool: &[&'a str]) -> &'a str {
    pool[rng.gen_range(0..pool.len())]
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_gap_question_table() {
        assert_eq!(gap_question("dog", "is", ConceptKind::Noun), "What is dog?");
        assert_eq!(
            gap_question("dog", "can_do", ConceptKind::Noun),
            "What can dog do?"
        );
        assert_eq!(
            gap_question("run", "performed_by", ConceptKind::Verb),
            "Who or what can run?"
        );
        assert_eq!(
            gap_question("cold", "can_describe", ConceptKind::Adjective),
            "What kinds of things can be cold?"
        );
    }

    #[test]
    fn test_gap_question_falls_back_to_description() {
        let question = gap_question("dog", "color", ConceptKind::Noun);
        assert_eq!(question, "Tell me about the color of dog?");

        let question = gap_question("run", "intensity", ConceptKind::Verb);
        assert!(question.contains("degree or strength"));
    }

    #[test]
    fn test_statement_confirmation_converts_first_person() {
        let relations = vec![RelationTriple {
            source: "i".to_string(),
            relation: Relation::Is,
            target: "well".to_string(),
        }];

        assert_eq!(statement_confirmation(&relations), "I see, you are well.");
    }

    #[test]
    fn test_statement_confirmation_third_person() {
        let relations = vec![RelationTriple {
            source: "dog".to_string(),
            relation: Relation::Is,
            target: "friendly".to_string(),
        }];

        assert_eq!(
            statement_confirmation(&relations),
            "I see, dog is friendly."
        );
    }

    #[test]
    fn test_statement_confirmation_without_relations() {
        assert_eq!(
            statement_confirmation(&[]),
            "I'm listening and learning from what you say."
        );
    }

    #[test]
    fn test_numbered_fields_confirm_with_base_wording() {
        assert_eq!(
            learned_confirmation("dog", "is_2", "furry"),
            "I see, dog is furry."
        );
        assert_eq!(base_field("feels_like_3"), "feels_like");
        assert_eq!(base_field("is"), "is");
        // only trailing digits strip
        assert_eq!(base_field("part_of"), "part_of");
    }

    #[test]
    fn test_pos_prompts_carry_the_required_words() {
        let question = pos_question("saturday");
        assert!(question.contains("saturday"));
        assert!(question.contains("part of speech"));

        let thanks = pos_thanks("saturday", ConceptKind::Noun);
        assert!(thanks.to_lowercase().contains("thank"));
        assert!(thanks.contains("saturday"));
        assert!(thanks.contains("noun"));
    }

    #[test]
    fn test_greeting_replies_open_with_hello() {
        let mut rng = StdRng::seed_from_u64(7);
        for asked_how in [true, false] {
            for _ in 0..10 {
                let reply = greeting_reply(&mut rng, asked_how);
                assert!(reply.starts_with("Hello"));
            }
        }
    }
}
