//! Rule-based utterance parsing
//!
//! Turns a raw line of chat into a shallow subject/verb/object shape plus
//! trailing descriptors, sentence type, question classification, greeting,
//! and the words the system has never seen. Parsing is a pure function:
//! the caller supplies the set of identities already in the store and gets
//! back a [`ParsedUtterance`] with no side effects.

use std::collections::HashSet;

/// Articles and demonstratives skipped when picking slot words.
const STOP_WORDS: &[&str] = &["the", "a", "an", "this", "that", "these", "those"];

/// Articles, used to type the object of an `is` statement.
const ARTICLES: &[&str] = &["a", "an", "the"];

/// Greeting openers.
const GREETINGS: &[&str] = &["hello", "hi", "hey", "greetings", "howdy"];

/// Interrogative words.
const QUESTION_WORDS: &[&str] = &["what", "who", "where", "when", "why", "how", "which"];

/// Tokens that mark a question when they lead the utterance.
const QUESTION_STARTERS: &[&str] = &[
    "what", "who", "where", "when", "why", "how", "which", "is", "are", "can", "do", "does", "did",
];

/// Everyday action verbs (with their common inflections) that the parser
/// recognizes as the main verb when no relation verb is present.
const COMMON_VERBS: &[&str] = &[
    "do", "does", "did", "make", "makes", "made", "go", "goes", "went", "get", "gets", "got",
    "see", "saw", "know", "knew", "think", "thought", "take", "takes", "took", "come", "comes",
    "came", "want", "wants", "wanted", "use", "uses", "used", "find", "finds", "found", "give",
    "gives", "gave", "tell", "tells", "told", "work", "works", "worked", "call", "calls",
    "called", "try", "tries", "tried", "ask", "asks", "asked", "need", "needs", "needed",
    "become", "becomes", "became", "leave", "leaves", "left", "put", "puts", "help", "helps",
    "helped",
];

/// Closed-class function words. These can never be taught as concepts, so
/// they are filtered from the descriptor slot and from unknown-word
/// detection.
const FUNCTION_WORDS: &[&str] = &[
    // pronouns and possessives
    "i", "me", "my", "mine", "myself", "you", "your", "yours", "yourself", "we", "us", "our",
    "ours", "they", "them", "their", "theirs", "he", "him", "his", "she", "her", "hers", "it",
    "its",
    // conjunctions
    "and", "or", "but", "so", "because", "if", "then", "than", "while",
    // prepositions
    "in", "on", "at", "to", "for", "of", "with", "from", "by", "about", "into", "onto", "over",
    "under", "after", "before", "during", "between", "through", "around", "near",
    // auxiliaries and modals not already relation verbs
    "be", "been", "being", "will", "would", "shall", "should", "may", "might", "must",
    // negation and affirmation
    "not", "no", "yes",
    // common adverbs and particles
    "very", "really", "quite", "just", "also", "too", "only", "even", "still", "already",
    "again", "always", "never", "sometimes", "often", "now", "here", "there",
    // quantifiers
    "some", "any", "all", "many", "much", "few", "more", "most", "other", "another", "each",
    "every", "both",
];

/// Everyday open-class words treated as already acquired. A word outside
/// this list (and outside the store) is worth a clarifying question; a word
/// inside it is not. Day and month names are deliberately absent so that
/// casual mentions of them exercise the part-of-speech flow.
const CORE_VOCABULARY: &[&str] = &[
    // time
    "day", "days", "night", "nights", "morning", "evening", "afternoon", "today", "tonight",
    "yesterday", "tomorrow", "time", "week", "weeks", "month", "months", "year", "years",
    "hour", "hours", "minute", "moment", "weekend",
    // qualities
    "good", "bad", "big", "small", "little", "hot", "cold", "warm", "cool", "new", "old",
    "young", "happy", "sad", "nice", "fine", "well", "great", "long", "short", "high", "low",
    "full", "empty", "hard", "soft", "easy", "early", "late", "busy", "free", "real", "whole",
    "same", "different", "right", "wrong", "better", "best", "worse", "worst",
    // things
    "thing", "things", "people", "person", "friend", "friends", "family", "home", "house",
    "food", "water", "drink", "movie", "movies", "book", "books", "music", "song", "word",
    "words", "name", "work", "school", "life", "world", "weather", "way", "place", "part",
    "end", "start", "question", "answer", "noun", "verb", "adjective",
    // actions outside the verb lists
    "love", "loves", "loved", "loving", "like", "likes", "liked", "enjoy", "enjoys", "enjoyed",
    "enjoying", "watch", "watches", "watched", "watching", "play", "plays", "played",
    "playing", "eat", "eats", "ate", "eating", "read", "reads", "reading", "run", "runs",
    "ran", "running", "walk", "walks", "walked", "walking", "talk", "talks", "talked",
    "talking", "live", "lives", "lived", "living", "learn", "learns", "learning", "teach",
    "teaches", "teaching", "feeling", "going", "doing", "having",
];

/// How the main verb relates its subject to its object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    /// State or quality: is, am, are, was, were
    Is,
    /// Possession: has, have, had
    CanHave,
    /// Capability: can, could
    CanDo,
    /// Sensory or emotional quality: feels, feel, felt
    FeelsLike,
    /// Any other recognized verb
    Action,
}

impl Relation {
    /// Attribute name the relation is stored under
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Is => "is",
            Self::CanHave => "can_have",
            Self::CanDo => "can_do",
            Self::FeelsLike => "feels_like",
            Self::Action => "action",
        }
    }

    /// Whether the relation produces a stored subject-object fact
    pub fn is_relational(&self) -> bool {
        !matches!(self, Self::Action)
    }

    fn from_verb(verb: &str) -> Option<Self> {
        match verb {
            "is" | "am" | "are" | "was" | "were" => Some(Self::Is),
            "has" | "have" | "had" => Some(Self::CanHave),
            "can" | "could" => Some(Self::CanDo),
            "feels" | "feel" | "felt" => Some(Self::FeelsLike),
            _ => None,
        }
    }
}

/// Broad shape of the utterance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SentenceType {
    Statement,
    Question,
    Command,
}

/// What a question is asking for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestionKind {
    /// "What is X?"
    Definition,
    /// "Is X Y?"
    Confirmation,
    /// "Can X ...?" / "What can X do?"
    Ability,
    /// "How is/does X ...?"
    Manner,
    /// Anything else interrogative
    General,
}

/// A classified question with the concept it asks about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    pub kind: QuestionKind,
    /// Concept the question addresses, when one could be located
    pub target: Option<String>,
    /// Queried value for confirmation questions ("Is X *Y*?")
    pub value: Option<String>,
}

/// A subject-relation-target fact extracted from a statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationTriple {
    pub source: String,
    pub relation: Relation,
    pub target: String,
}

/// Structured view of one utterance.
#[derive(Debug, Clone)]
pub struct ParsedUtterance {
    /// The raw input line
    pub original: String,
    /// Lowercased tokens with punctuation stripped
    pub tokens: Vec<String>,
    /// Last non-stop word before the verb
    pub subject: Option<String>,
    /// Every candidate subject word before the verb
    pub subjects: Vec<String>,
    /// The main verb as written
    pub verb: Option<String>,
    /// Canonical relation of the main verb
    pub relation: Option<Relation>,
    /// First non-stop word after the verb
    pub object: Option<String>,
    /// Whether an article sat directly before the object
    pub object_has_article: bool,
    /// Descriptor words trailing the object
    pub adjectives: Vec<String>,
    pub sentence_type: SentenceType,
    /// Present when the utterance is a question
    pub question: Option<Question>,
    /// Content words the system has no record of, in utterance order
    pub unknown_words: Vec<String>,
    /// Greeting opener, when the utterance starts with one
    pub greeting: Option<String>,
}

impl ParsedUtterance {
    /// Whether the utterance is a question
    pub fn is_question(&self) -> bool {
        self.sentence_type == SentenceType::Question
    }

    /// Whether the utterance is a statement
    pub fn is_statement(&self) -> bool {
        self.sentence_type == SentenceType::Statement
    }
}

/// Whether a token is an article or demonstrative that carries no content.
pub fn is_stop_word(word: &str) -> bool {
    STOP_WORDS.contains(&word)
}

/// Whether a token is a closed-class word that can never name a concept.
pub fn is_function_word(word: &str) -> bool {
    FUNCTION_WORDS.contains(&word)
}

/// Split a line into lowercase tokens. Punctuation becomes whitespace so
/// that "cold,Saturday" still splits; apostrophes stay inside contractions.
pub fn tokenize(text: &str) -> Vec<String> {
    text.chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '\'' {
                c
            } else {
                ' '
            }
        })
        .collect::<String>()
        .split_whitespace()
        .map(|t| t.to_lowercase())
        .collect()
}

/// Parse one utterance against the set of identities already stored.
pub fn parse(text: &str, known: &HashSet<String>) -> ParsedUtterance {
    let original = text.trim().to_string();
    let tokens = tokenize(&original);

    let greeting = tokens
        .first()
        .filter(|t| GREETINGS.contains(&t.as_str()))
        .cloned();

    let verb_slot = find_verb(&tokens);
    let (verb, relation) = match &verb_slot {
        Some((_, verb, relation)) => (Some(verb.clone()), Some(*relation)),
        None => (None, None),
    };

    // Slot extraction around the verb: last candidate before it is the
    // subject, first non-stop word after it is the object, the rest of the
    // tail describes the object.
    let mut subjects = Vec::new();
    let mut object = None;
    let mut object_has_article = false;
    let mut adjectives = Vec::new();

    if let Some((verb_idx, _, _)) = verb_slot {
        for token in &tokens[..verb_idx] {
            if is_slot_noise(token) {
                continue;
            }
            subjects.push(token.clone());
        }

        let mut seen_object = false;
        for (offset, token) in tokens[verb_idx + 1..].iter().enumerate() {
            if STOP_WORDS.contains(&token.as_str()) {
                continue;
            }
            if !seen_object {
                seen_object = true;
                object = Some(token.clone());
                let raw_idx = verb_idx + 1 + offset;
                object_has_article = raw_idx > 0
                    && ARTICLES.contains(&tokens[raw_idx - 1].as_str());
            } else if !FUNCTION_WORDS.contains(&token.as_str()) {
                adjectives.push(token.clone());
            }
        }
    }

    let subject = subjects.last().cloned();

    let sentence_type = classify_sentence(&original, &tokens, &verb_slot, &greeting);

    let question = if sentence_type == SentenceType::Question {
        Some(classify_question(
            &tokens,
            &greeting,
            &verb_slot,
            &subject,
            &object,
            &adjectives,
        ))
    } else {
        None
    };

    let unknown_words = find_unknown_words(&tokens, &subject, &verb, &object, known);

    ParsedUtterance {
        original,
        tokens,
        subject,
        subjects,
        verb,
        relation,
        object,
        object_has_article,
        adjectives,
        sentence_type,
        question,
        unknown_words,
        greeting,
    }
}

/// Extract the stored facts a statement asserts: one subject-object triple
/// for relation verbs, plus an `is` triple tying each descriptor to the
/// object.
pub fn extract_relations(parsed: &ParsedUtterance) -> Vec<RelationTriple> {
    let mut relations = Vec::new();

    if let (Some(subject), Some(object), Some(relation)) =
        (&parsed.subject, &parsed.object, parsed.relation)
    {
        if relation.is_relational() {
            relations.push(RelationTriple {
                source: subject.clone(),
                relation,
                target: object.clone(),
            });
        }
    }

    if let Some(object) = &parsed.object {
        for adjective in &parsed.adjectives {
            relations.push(RelationTriple {
                source: object.clone(),
                relation: Relation::Is,
                target: adjective.clone(),
            });
        }
    }

    relations
}

/// Locate the main verb: the first relation verb, else the first common
/// verb.
fn find_verb(tokens: &[String]) -> Option<(usize, String, Relation)> {
    for (i, token) in tokens.iter().enumerate() {
        if let Some(relation) = Relation::from_verb(token) {
            return Some((i, token.clone(), relation));
        }
    }
    for (i, token) in tokens.iter().enumerate() {
        if COMMON_VERBS.contains(&token.as_str()) {
            return Some((i, token.clone(), Relation::Action));
        }
    }
    None
}

/// Words that never fill the subject slot.
fn is_slot_noise(token: &str) -> bool {
    STOP_WORDS.contains(&token)
        || QUESTION_WORDS.contains(&token)
        || GREETINGS.contains(&token)
}

fn classify_sentence(
    original: &str,
    tokens: &[String],
    verb_slot: &Option<(usize, String, Relation)>,
    greeting: &Option<String>,
) -> SentenceType {
    if original.ends_with('?') {
        return SentenceType::Question;
    }

    // Skip a leading greeting when deciding the shape.
    let lead_idx = usize::from(greeting.is_some());
    if let Some(lead) = tokens.get(lead_idx) {
        if QUESTION_STARTERS.contains(&lead.as_str()) {
            return SentenceType::Question;
        }
    }

    // A bare leading action verb reads as an instruction.
    if let Some((idx, _, relation)) = verb_slot {
        if *idx == lead_idx && *relation == Relation::Action {
            return SentenceType::Command;
        }
    }

    SentenceType::Statement
}

fn classify_question(
    tokens: &[String],
    greeting: &Option<String>,
    verb_slot: &Option<(usize, String, Relation)>,
    subject: &Option<String>,
    object: &Option<String>,
    adjectives: &[String],
) -> Question {
    let lead_idx = usize::from(greeting.is_some());
    let lead = tokens.get(lead_idx).map(|s| s.as_str()).unwrap_or("");
    let relation = verb_slot.as_ref().map(|(_, _, r)| *r);
    let verb_leads = matches!(verb_slot, Some((idx, _, _)) if *idx == lead_idx);

    let target = object
        .clone()
        .or_else(|| subject.clone())
        .or_else(|| first_content_token(tokens));

    let kind = match lead {
        "what" => match relation {
            Some(Relation::CanDo) => QuestionKind::Ability,
            Some(Relation::Is) => QuestionKind::Definition,
            _ => QuestionKind::General,
        },
        "how" => QuestionKind::Manner,
        "can" => QuestionKind::Ability,
        "is" | "are" if verb_leads => QuestionKind::Confirmation,
        _ => QuestionKind::General,
    };

    let value = if kind == QuestionKind::Confirmation {
        adjectives.first().cloned()
    } else {
        None
    };

    Question { kind, target, value }
}

/// First token that could name a concept, for question targets with no
/// parseable slots.
fn first_content_token(tokens: &[String]) -> Option<String> {
    tokens
        .iter()
        .find(|t| {
            let t = t.as_str();
            !STOP_WORDS.contains(&t)
                && !FUNCTION_WORDS.contains(&t)
                && !QUESTION_WORDS.contains(&t)
                && !GREETINGS.contains(&t)
                && Relation::from_verb(t).is_none()
                && !COMMON_VERBS.contains(&t)
        })
        .cloned()
}

/// Words the system cannot place. Subject, verb, and object slots are
/// exempt (the engine can type those from context); everything else that
/// is not a function word, not everyday vocabulary, and not already in the
/// store needs a part-of-speech answer before it can carry facts.
fn find_unknown_words(
    tokens: &[String],
    subject: &Option<String>,
    verb: &Option<String>,
    object: &Option<String>,
    known: &HashSet<String>,
) -> Vec<String> {
    let in_slot = |t: &str| {
        subject.as_deref() == Some(t) || verb.as_deref() == Some(t) || object.as_deref() == Some(t)
    };

    let mut unknown: Vec<String> = Vec::new();
    for token in tokens {
        let t = token.as_str();
        if in_slot(t)
            || STOP_WORDS.contains(&t)
            || FUNCTION_WORDS.contains(&t)
            || CORE_VOCABULARY.contains(&t)
            || QUESTION_WORDS.contains(&t)
            || GREETINGS.contains(&t)
            || COMMON_VERBS.contains(&t)
            || Relation::from_verb(t).is_some()
            || known.contains(t)
            || unknown.iter().any(|u| u == t)
        {
            continue;
        }
        unknown.push(token.clone());
    }
    unknown
}
