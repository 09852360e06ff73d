//! Utility-scored reply selection
//!
//! Every turn the engine drafts several reply candidates, each produced by
//! a different strategy, and scores them with a weighted utility function:
//!
//! ```text
//! S = (W_h x happiness) + (W_k x knowledge) + (W_f x flow) + personality
//! ```
//!
//! - **happiness** rewards replies whose tone matches the user's sentiment
//! - **knowledge** rewards asking questions, doubly so when a gap is open
//! - **flow** rewards replies that keep the conversation moving and
//!   penalizes dead ends
//! - **personality** is a flat bonus per warm word, and replies containing
//!   a forbidden word are removed before selection entirely
//!
//! The winner is not always sent verbatim: a few composition rules splice
//! the strongest candidates together, for example leading a gap question
//! with a consoling opener when the user sounded upset.

use std::cmp::Ordering;
use std::collections::HashSet;

use rand::prelude::*;

use crate::dialogue::AnswerResult;
use crate::sentiment::{self, Sentiment, SentimentReading};

/// Replies that kill a conversation when sent on their own.
const DEAD_END_REPLIES: [&str; 7] = ["okay", "ok", "yes", "no", "sure", "fine", "alright"];

/// Phrases that tie a reply back to earlier topics.
const CONNECTION_PHRASES: [&str; 4] =
    ["reminds me", "speaking of", "that makes me think", "related to"];

/// Words the personality never says. Candidates containing one are
/// discarded before scoring.
const FORBIDDEN_WORDS: [&str; 7] = ["hate", "hurt", "kill", "destroy", "stupid", "ugly", "die"];

/// Warm words worth a small flat bonus each.
const KIND_WORDS: [&str; 7] = ["help", "good", "friend", "happy", "love", "care", "kind"];

/// Consoling phrases matched against replies to upset users.
const SUPPORTIVE_PHRASES: [&str; 7] =
    ["sorry", "understand", "difficult", "hard", "hope", "better", "here for you"];

/// Celebratory phrases matched against replies to happy users.
const CELEBRATORY_PHRASES: [&str; 6] =
    ["great", "wonderful", "glad", "excited", "congratulations", "amazing"];

const EMPATHY_POSITIVE: [&str; 4] = [
    "That's wonderful!",
    "I'm so glad to hear that!",
    "That sounds great!",
    "How exciting!",
];

const EMPATHY_NEGATIVE: [&str; 4] = [
    "I'm sorry to hear that.",
    "That sounds difficult.",
    "I understand that must be hard.",
    "I'm here with you.",
];

const EMPATHY_NEUTRAL: [&str; 3] = ["I see.", "Interesting!", "Tell me more."];

/// Flat boost so that answering takes precedence when the user asked.
const ANSWER_PRIORITY_BONUS: f64 = 15.0;

/// Turn records kept before the oldest are dropped.
pub const DEFAULT_HISTORY_LIMIT: usize = 100;

/// The reply strategies a turn can draft candidates from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Answers a question from stored knowledge
    Answerer,
    /// Asks about the most pressing knowledge gap
    Learner,
    /// Mirrors the user's sentiment
    Empath,
    /// Bridges to a recently discussed subject
    Connector,
    /// Invites more detail about the current topic
    Elaborator,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::Answerer => "answerer",
            Strategy::Learner => "learner",
            Strategy::Empath => "empath",
            Strategy::Connector => "connector",
            Strategy::Elaborator => "elaborator",
        }
    }
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Weights for the three scored factors.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScorerWeights {
    pub happiness: f64,
    pub knowledge: f64,
    pub flow: f64,
}

impl Default for ScorerWeights {
    fn default() -> Self {
        Self {
            happiness: 1.5,
            knowledge: 2.0,
            flow: 1.0,
        }
    }
}

/// Per-factor contributions, already weighted.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ScoreBreakdown {
    pub happiness: f64,
    pub knowledge: f64,
    pub flow: f64,
    pub personality: f64,
    pub answer_priority: f64,
}

impl ScoreBreakdown {
    pub fn total(&self) -> f64 {
        self.happiness + self.knowledge + self.flow + self.personality + self.answer_priority
    }
}

/// A drafted reply with its provenance and score.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub text: String,
    pub strategy: Strategy,
    /// Standalone opening sentence, kept separate so composition can
    /// reuse it without re-parsing the text. Only empath replies set it.
    pub opener: Option<String>,
    pub score: f64,
    pub breakdown: ScoreBreakdown,
}

impl Candidate {
    fn new(text: String, strategy: Strategy) -> Self {
        Self {
            text,
            strategy,
            opener: None,
            score: 0.0,
            breakdown: ScoreBreakdown::default(),
        }
    }
}

/// Everything the scorer needs to know about one turn.
#[derive(Debug, Default)]
pub struct TurnRequest<'a> {
    /// Raw user input, used for sentiment
    pub input: &'a str,
    pub is_question: bool,
    pub is_statement: bool,
    /// Subject the user talked about, if parsed
    pub subject: Option<&'a str>,
    /// Object of the sentence, fallback topic for elaboration
    pub object: Option<&'a str>,
    /// Ready-made question about the most pressing gap
    pub gap_question: Option<&'a str>,
    /// Recently discussed subjects other than the current one
    pub related: &'a [String],
    /// Confirmation text already produced by the learning path
    pub base_response: Option<&'a str>,
    /// Answer lookup result when the user asked a question
    pub answer: Option<&'a AnswerResult>,
}

/// The scorer's verdict for one turn.
#[derive(Debug, Clone)]
pub struct TurnDecision {
    /// Final reply text after composition
    pub response: String,
    /// Winning strategy, `None` when every candidate was discarded
    pub strategy: Option<Strategy>,
    pub score: f64,
    pub sentiment: SentimentReading,
    pub turn: u64,
}

/// One line of scoring history.
#[derive(Debug, Clone)]
pub struct TurnRecord {
    pub turn: u64,
    pub strategy: Strategy,
    pub score: f64,
    pub running_total: f64,
}

/// Aggregated scoring statistics.
#[derive(Debug, Clone)]
pub struct ScorerStats {
    pub total_score: f64,
    pub turns: u64,
    pub average_score: f64,
    /// Up to the last ten turn records
    pub recent: Vec<TurnRecord>,
}

/// Drafts, scores, and composes reply candidates.
#[derive(Debug)]
pub struct ReplyScorer {
    weights: ScorerWeights,
    history: Vec<TurnRecord>,
    history_limit: usize,
    turn_count: u64,
    total_score: f64,
    rng: StdRng,
}

impl Default for ReplyScorer {
    fn default() -> Self {
        Self::new(ScorerWeights::default(), DEFAULT_HISTORY_LIMIT)
    }
}

impl ReplyScorer {
    pub fn new(weights: ScorerWeights, history_limit: usize) -> Self {
        Self {
            weights,
            history: Vec::new(),
            history_limit: history_limit.max(1),
            turn_count: 0,
            total_score: 0.0,
            rng: StdRng::from_entropy(),
        }
    }

    /// Fixed-seed constructor for reproducible candidate pools in tests
    pub fn with_seed(weights: ScorerWeights, history_limit: usize, seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            ..Self::new(weights, history_limit)
        }
    }

    /// Run one turn: draft candidates, discard forbidden ones, score the
    /// rest, and compose the final reply. When nothing survives the filter
    /// the base response (or a listening acknowledgement) is returned and
    /// no history is recorded.
    pub fn play_turn(&mut self, request: &TurnRequest<'_>) -> TurnDecision {
        self.turn_count += 1;

        let sentiment = sentiment::classify(request.input);
        let mut candidates = self.generate_candidates(request, sentiment.label);
        candidates.retain(|c| !contains_forbidden_word(&c.text));

        if candidates.is_empty() {
            return TurnDecision {
                response: request
                    .base_response
                    .unwrap_or("I'm listening.")
                    .to_string(),
                strategy: None,
                score: 0.0,
                sentiment,
                turn: self.turn_count,
            };
        }

        let has_gap = request.gap_question.is_some();
        for candidate in &mut candidates {
            self.evaluate(candidate, sentiment.label, has_gap, request.is_question);
        }

        // Stable sort keeps generation order on ties, which favors earlier
        // strategies: answerer, learner, empath, connector, elaborator.
        candidates.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));

        let response = compose_reply(&candidates, request.base_response, request.is_question);
        let best = &candidates[0];

        self.total_score += best.score;
        self.history.push(TurnRecord {
            turn: self.turn_count,
            strategy: best.strategy,
            score: best.score,
            running_total: self.total_score,
        });
        if self.history.len() > self.history_limit {
            let excess = self.history.len() - self.history_limit;
            self.history.drain(..excess);
        }

        TurnDecision {
            response,
            strategy: Some(best.strategy),
            score: best.score,
            sentiment,
            turn: self.turn_count,
        }
    }

    pub fn stats(&self) -> ScorerStats {
        let recent_from = self.history.len().saturating_sub(10);
        ScorerStats {
            total_score: self.total_score,
            turns: self.turn_count,
            average_score: self.total_score / self.turn_count.max(1) as f64,
            recent: self.history[recent_from..].to_vec(),
        }
    }

    /// Forget all scoring state for a fresh session.
    pub fn reset(&mut self) {
        self.history.clear();
        self.turn_count = 0;
        self.total_score = 0.0;
    }

    fn generate_candidates(
        &mut self,
        request: &TurnRequest<'_>,
        sentiment: Sentiment,
    ) -> Vec<Candidate> {
        let mut candidates = Vec::new();

        if request.is_question {
            if let Some(answer) = request.answer {
                candidates.push(self.answerer_candidate(answer, request.gap_question));
            }
        }

        if let Some(question) = request.gap_question {
            candidates.push(Candidate::new(question.to_string(), Strategy::Learner));
        }

        candidates.push(self.empath_candidate(sentiment, request.gap_question));

        if let Some(candidate) = self.connector_candidate(request) {
            candidates.push(candidate);
        }

        if request.is_statement {
            if let Some(candidate) = self.elaborator_candidate(request) {
                candidates.push(candidate);
            }
        }

        candidates
    }

    /// Answer plus a follow-up. Confident answers append a gap question
    /// or an invitation to elaborate; unsure answers already ask the user
    /// to teach, so they stand alone.
    fn answerer_candidate(
        &mut self,
        answer: &AnswerResult,
        gap_question: Option<&str>,
    ) -> Candidate {
        let mut text = answer.answer.clone();

        if answer.answered && answer.confidence > 0.5 {
            if let Some(question) = gap_question {
                text.push_str(&format!(" By the way, {}", question.to_lowercase()));
            } else {
                let topic = answer.concept.as_deref().unwrap_or("that");
                let extra = self.pick(vec![
                    format!("I find {topic} quite interesting!"),
                    format!("Would you like to know more about {topic}?"),
                    format!("Tell me more about your experience with {topic}!"),
                ]);
                text.push(' ');
                text.push_str(&extra);
            }
        }

        Candidate::new(text, Strategy::Answerer)
    }

    fn empath_candidate(&mut self, sentiment: Sentiment, gap_question: Option<&str>) -> Candidate {
        let pool: &[&str] = match sentiment {
            Sentiment::Positive => &EMPATHY_POSITIVE,
            Sentiment::Negative => &EMPATHY_NEGATIVE,
            Sentiment::Neutral => &EMPATHY_NEUTRAL,
        };
        let opener = pool[self.rng.gen_range(0..pool.len())];

        let continuation = match gap_question {
            Some(question) => format!("By the way, {}", question.to_lowercase()),
            None => "Tell me more!".to_string(),
        };

        let mut candidate = Candidate::new(format!("{opener} {continuation}"), Strategy::Empath);
        candidate.opener = Some(opener.to_string());
        candidate
    }

    fn connector_candidate(&mut self, request: &TurnRequest<'_>) -> Option<Candidate> {
        let subject = request.subject?;
        if request.related.is_empty() {
            return None;
        }

        let related = &request.related[self.rng.gen_range(0..request.related.len())];
        let text = self.pick(vec![
            format!("Speaking of {subject}, it reminds me of {related}."),
            format!("That makes me think of {related}. Are they related?"),
            format!(
                "Interesting! {} and {related} might be connected.",
                capitalize(subject)
            ),
        ]);

        Some(Candidate::new(text, Strategy::Connector))
    }

    fn elaborator_candidate(&mut self, request: &TurnRequest<'_>) -> Option<Candidate> {
        let topic = request.subject.or(request.object)?;

        let mut options = vec![
            format!("That's interesting about {topic}! I'd love to know more."),
            format!(
                "I see! {} sounds fascinating. What else can you tell me?",
                capitalize(topic)
            ),
            format!("Thanks for sharing! That helps me understand {topic} better."),
        ];
        if !request.related.is_empty() {
            let related = &request.related[self.rng.gen_range(0..request.related.len())];
            options.push(format!(
                "Interesting! That reminds me of {related}. Are they related?"
            ));
        }

        Some(Candidate::new(self.pick(options), Strategy::Elaborator))
    }

    fn evaluate(
        &self,
        candidate: &mut Candidate,
        sentiment: Sentiment,
        has_gap: bool,
        is_question: bool,
    ) {
        let breakdown = ScoreBreakdown {
            happiness: happiness_score(&candidate.text, sentiment) * self.weights.happiness,
            knowledge: knowledge_score(&candidate.text, has_gap) * self.weights.knowledge,
            flow: flow_score(&candidate.text) * self.weights.flow,
            personality: personality_score(&candidate.text),
            answer_priority: if is_question && candidate.strategy == Strategy::Answerer {
                ANSWER_PRIORITY_BONUS
            } else {
                0.0
            },
        };
        candidate.score = breakdown.total();
        candidate.breakdown = breakdown;
    }

    fn pick(&mut self, mut options: Vec<String>) -> String {
        let index = self.rng.gen_range(0..options.len());
        options.swap_remove(index)
    }
}

/// Composition rules, applied to the score-sorted candidates in order:
///
/// 1. a positive-scoring answer wins outright when the user asked
/// 2. a winning empath reply already carries the gap question, send as-is
/// 3. a winning gap question gets a consoling opener in front when the
///    empath draft was supportive
/// 4. a winning learner or elaborator reply is appended to the learning
///    confirmation so the user hears what was understood first
fn compose_reply(
    candidates: &[Candidate],
    base_response: Option<&str>,
    is_question: bool,
) -> String {
    let best = &candidates[0];
    let empath = candidates.iter().find(|c| c.strategy == Strategy::Empath);
    let learner = candidates.iter().find(|c| c.strategy == Strategy::Learner);
    let answerer = candidates.iter().find(|c| c.strategy == Strategy::Answerer);

    if is_question {
        if let Some(answerer) = answerer {
            if answerer.score > 0.0 {
                return answerer.text.clone();
            }
        }
    }

    if best.strategy == Strategy::Empath {
        if let Some(learner) = learner {
            if learner.score > 0.0 {
                return best.text.clone();
            }
        }
    }

    if best.strategy == Strategy::Learner {
        if let Some(empath) = empath {
            let lower = empath.text.to_lowercase();
            let supportive = ["sorry", "understand", "difficult"]
                .iter()
                .any(|word| lower.contains(word));
            if supportive {
                if let Some(opener) = &empath.opener {
                    if opener.ends_with('.') {
                        return format!("{opener} {}", best.text);
                    }
                }
            }
        }
    }

    if let Some(base) = base_response {
        if matches!(best.strategy, Strategy::Learner | Strategy::Elaborator) {
            return format!("{base} {}", best.text);
        }
    }

    best.text.clone()
}

fn contains_forbidden_word(text: &str) -> bool {
    text.to_lowercase()
        .split_whitespace()
        .map(|word| word.trim_matches(|c: char| !c.is_alphanumeric()))
        .any(|word| FORBIDDEN_WORDS.contains(&word))
}

fn happiness_score(text: &str, sentiment: Sentiment) -> f64 {
    let phrases: &[&str] = match sentiment {
        Sentiment::Negative => &SUPPORTIVE_PHRASES,
        Sentiment::Positive => &CELEBRATORY_PHRASES,
        Sentiment::Neutral => return 0.0,
    };

    let lower = text.to_lowercase();
    let mut score: f64 = 0.0;
    for phrase in phrases {
        if lower.contains(phrase) {
            score += 3.0;
        }
    }
    score.min(10.0)
}

fn knowledge_score(text: &str, has_gap: bool) -> f64 {
    let mut score = 0.0;
    if text.contains('?') {
        score += 5.0;
        if has_gap {
            score += 5.0;
        }
    }
    score
}

fn flow_score(text: &str) -> f64 {
    let lower = text.trim().to_lowercase();
    let word_count = lower.split_whitespace().count();
    let mut score = 0.0;

    if DEAD_END_REPLIES.contains(&lower.as_str()) || word_count <= 2 {
        score -= 5.0;
    }
    if text.trim_end().ends_with('?') {
        score += 5.0;
    }
    if word_count > 10 {
        score += 2.0;
    }
    for phrase in &CONNECTION_PHRASES {
        if lower.contains(phrase) {
            score += 3.0;
            break;
        }
    }

    score
}

fn personality_score(text: &str) -> f64 {
    let lower = text.to_lowercase();
    let words: HashSet<&str> = lower
        .split_whitespace()
        .map(|word| word.trim_matches(|c: char| !c.is_alphanumeric()))
        .collect();
    KIND_WORDS.iter().filter(|w| words.contains(*w)).count() as f64 * 2.0
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn statement_request<'a>(
        input: &'a str,
        subject: Option<&'a str>,
        gap_question: Option<&'a str>,
        base_response: Option<&'a str>,
    ) -> TurnRequest<'a> {
        TurnRequest {
            input,
            is_statement: true,
            subject,
            gap_question,
            base_response,
            ..TurnRequest::default()
        }
    }

    fn scored(text: &str, strategy: Strategy, score: f64) -> Candidate {
        Candidate {
            score,
            ..Candidate::new(text.to_string(), strategy)
        }
    }

    #[test]
    fn test_gap_question_wins_neutral_statements() {
        let mut scorer = ReplyScorer::with_seed(ScorerWeights::default(), 100, 11);
        let request = statement_request(
            "a dog is an animal",
            None,
            Some("What is dog?"),
            Some("I see, dog is animal."),
        );

        let decision = scorer.play_turn(&request);

        // question about an open gap: knowledge 10 * 2.0 + flow 5 * 1.0
        assert_eq!(decision.score, 25.0);
        assert_eq!(decision.strategy, Some(Strategy::Learner));
        assert!(decision.response.starts_with("I see, dog is animal."));
        assert!(decision.response.ends_with("What is dog?"));
    }

    #[test]
    fn test_question_input_answered_verbatim() {
        let mut scorer = ReplyScorer::with_seed(ScorerWeights::default(), 100, 3);
        let answer = AnswerResult {
            answered: true,
            answer: "dog is animal.".to_string(),
            concept: Some("dog".to_string()),
            attribute: Some("is".to_string()),
            confidence: 0.9,
        };
        let request = TurnRequest {
            input: "what is a dog?",
            is_question: true,
            answer: Some(&answer),
            ..TurnRequest::default()
        };

        let decision = scorer.play_turn(&request);

        assert_eq!(decision.strategy, Some(Strategy::Answerer));
        assert!(decision.response.starts_with("dog is animal."));
        // confident answer carries an elaboration about the same concept
        assert!(decision.response.contains("dog"));
        assert!(decision.response.len() > "dog is animal.".len());
    }

    #[test]
    fn test_unsure_answer_stands_alone() {
        let mut scorer = ReplyScorer::with_seed(ScorerWeights::default(), 100, 4);
        let answer = AnswerResult {
            answered: false,
            answer: "I don't know about quokka yet. Can you tell me?".to_string(),
            concept: Some("quokka".to_string()),
            attribute: None,
            confidence: 0.0,
        };
        let candidate = scorer.answerer_candidate(&answer, None);

        assert_eq!(candidate.text, answer.answer);
    }

    #[test]
    fn test_forbidden_candidates_fall_back_without_history() {
        let mut scorer = ReplyScorer::with_seed(ScorerWeights::default(), 100, 5);
        let request = statement_request(
            "kill is a verb",
            Some("kill"),
            Some("What is kill?"),
            None,
        );

        let decision = scorer.play_turn(&request);

        assert_eq!(decision.response, "I'm listening.");
        assert_eq!(decision.strategy, None);
        assert_eq!(decision.score, 0.0);

        let stats = scorer.stats();
        assert_eq!(stats.turns, 1);
        assert_eq!(stats.total_score, 0.0);
        assert!(stats.recent.is_empty());
    }

    #[test]
    fn test_supportive_opener_leads_gap_question() {
        let candidates = vec![
            scored("What is exam?", Strategy::Learner, 30.0),
            Candidate {
                opener: Some("I'm sorry to hear that.".to_string()),
                ..scored(
                    "I'm sorry to hear that. By the way, what is exam?",
                    Strategy::Empath,
                    29.5,
                )
            },
        ];

        let reply = compose_reply(&candidates, None, false);

        assert_eq!(reply, "I'm sorry to hear that. What is exam?");
    }

    #[test]
    fn test_exclamatory_opener_is_not_prepended() {
        let candidates = vec![
            scored("What is exam?", Strategy::Learner, 30.0),
            Candidate {
                opener: Some("Interesting!".to_string()),
                ..scored(
                    "Interesting! By the way, what is exam?",
                    Strategy::Empath,
                    10.0,
                )
            },
        ];

        let reply = compose_reply(&candidates, None, false);

        assert_eq!(reply, "What is exam?");
    }

    #[test]
    fn test_winning_empath_sent_as_is() {
        let candidates = vec![
            Candidate {
                opener: Some("That sounds difficult.".to_string()),
                ..scored(
                    "That sounds difficult. By the way, what is exam?",
                    Strategy::Empath,
                    34.0,
                )
            },
            scored("What is exam?", Strategy::Learner, 30.0),
        ];

        let reply = compose_reply(&candidates, Some("I see, exam is hard."), false);

        assert_eq!(reply, "That sounds difficult. By the way, what is exam?");
    }

    #[test]
    fn test_connector_bridges_to_related_subject() {
        let mut scorer = ReplyScorer::with_seed(ScorerWeights::default(), 100, 6);
        let related = vec!["cat".to_string()];
        let request = TurnRequest {
            input: "the dog runs fast",
            is_statement: true,
            subject: Some("dog"),
            related: &related,
            ..TurnRequest::default()
        };

        let candidate = scorer.connector_candidate(&request).unwrap();

        assert_eq!(candidate.strategy, Strategy::Connector);
        assert!(candidate.text.contains("cat"));
    }

    #[test]
    fn test_connector_needs_subject_and_related() {
        let mut scorer = ReplyScorer::with_seed(ScorerWeights::default(), 100, 7);
        let related = vec!["cat".to_string()];

        let without_subject = TurnRequest {
            input: "hello",
            related: &related,
            ..TurnRequest::default()
        };
        assert!(scorer.connector_candidate(&without_subject).is_none());

        let without_related = TurnRequest {
            input: "the dog runs fast",
            subject: Some("dog"),
            ..TurnRequest::default()
        };
        assert!(scorer.connector_candidate(&without_related).is_none());
    }

    #[test]
    fn test_elaborator_topic_falls_back_to_object() {
        let mut scorer = ReplyScorer::with_seed(ScorerWeights::default(), 100, 8);
        let request = TurnRequest {
            input: "there goes the train",
            is_statement: true,
            object: Some("train"),
            ..TurnRequest::default()
        };

        let candidate = scorer.elaborator_candidate(&request).unwrap();

        assert_eq!(candidate.strategy, Strategy::Elaborator);
        assert!(candidate.text.to_lowercase().contains("train"));
    }

    #[test]
    fn test_empath_without_gap_invites_more() {
        let mut scorer = ReplyScorer::with_seed(ScorerWeights::default(), 100, 9);

        let candidate = scorer.empath_candidate(Sentiment::Neutral, None);

        assert!(candidate.text.ends_with("Tell me more!"));
        assert!(candidate.opener.is_some());
    }

    #[test]
    fn test_empath_lowercases_the_gap_question() {
        let mut scorer = ReplyScorer::with_seed(ScorerWeights::default(), 100, 10);

        let candidate = scorer.empath_candidate(Sentiment::Positive, Some("What is Saturday?"));

        assert!(candidate.text.contains("By the way, what is saturday?"));
    }

    #[test]
    fn test_happiness_capped_at_ten() {
        let text = "I'm sorry, I understand this is difficult and hard, I hope it gets better.";
        assert_eq!(happiness_score(text, Sentiment::Negative), 10.0);
        // tone words only count when they match the user's sentiment
        assert_eq!(happiness_score(text, Sentiment::Neutral), 0.0);
    }

    #[test]
    fn test_flow_penalizes_dead_ends() {
        assert_eq!(flow_score("Okay"), -5.0);
        assert_eq!(flow_score("Yes."), -5.0);
        assert_eq!(flow_score("What else can you tell me about dogs?"), 5.0);
    }

    #[test]
    fn test_personality_counts_each_kind_word_once() {
        assert_eq!(personality_score("A friend is a good friend"), 4.0);
    }

    #[test]
    fn test_forbidden_word_detection_ignores_punctuation() {
        assert!(contains_forbidden_word("What is kill?"));
        assert!(!contains_forbidden_word("What is skill?"));
    }

    #[test]
    fn test_stats_track_recent_turns() {
        let mut scorer = ReplyScorer::with_seed(ScorerWeights::default(), 100, 12);
        let request = statement_request(
            "a dog is an animal",
            None,
            Some("What is dog?"),
            Some("I see, dog is animal."),
        );

        scorer.play_turn(&request);
        scorer.play_turn(&request);

        let stats = scorer.stats();
        assert_eq!(stats.turns, 2);
        assert_eq!(stats.recent.len(), 2);
        assert_eq!(stats.total_score, 50.0);
        assert_eq!(stats.average_score, 25.0);
        assert!(stats.recent[1].running_total > stats.recent[0].running_total);

        scorer.reset();
        let stats = scorer.stats();
        assert_eq!(stats.turns, 0);
        assert!(stats.recent.is_empty());
    }

    #[test]
    fn test_history_is_bounded() {
        let mut scorer = ReplyScorer::with_seed(ScorerWeights::default(), 3, 13);
        let request = statement_request(
            "a dog is an animal",
            Some("dog"),
            Some("What does dog feel like?"),
            None,
        );

        for _ in 0..5 {
            scorer.play_turn(&request);
        }

        assert_eq!(scorer.history.len(), 3);
        assert_eq!(scorer.history[0].turn, 3);
        assert_eq!(scorer.stats().turns, 5);
    }
}
