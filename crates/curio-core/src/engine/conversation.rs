//! Conversation turn processing
//!
//! One `process_turn` call takes the user's line through the full
//! pipeline: control commands, pending-question answers, parsing,
//! unknown-word queueing, learning from statements, answering questions,
//! and reply selection through the scorer.

use std::collections::HashSet;

use rand::prelude::*;
use tracing::{debug, info, warn};

use crate::dialogue::templates;
use crate::dialogue::{ConversationSession, PendingQuestion, QuestionAnswerer};
use crate::domain::concept::{ConceptEntity, ConceptKind, ConceptRepository, ConceptStore};
use crate::error::Result;
use crate::gaps;
use crate::parser::{self, ParsedUtterance, Relation, RelationTriple};

use super::scorer::{
    ReplyScorer, ScorerStats, ScorerWeights, TurnDecision, TurnRequest, DEFAULT_HISTORY_LIMIT,
};

/// Tunables for a conversation engine.
#[derive(Debug, Clone)]
pub struct EngineSettings {
    /// Name the system answers to when greeted
    pub name: String,
    /// Utility weights for reply scoring
    pub weights: ScorerWeights,
    /// Scoring history records kept
    pub history_limit: usize,
    /// Route replies through the utility scorer. When off, replies are
    /// composed directly from confirmations, questions, and answers.
    pub use_scorer: bool,
    /// Append the winning strategy and score to every scored reply
    pub debug: bool,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            name: "curio".to_string(),
            weights: ScorerWeights::default(),
            history_limit: DEFAULT_HISTORY_LIMIT,
            use_scorer: true,
            debug: false,
        }
    }
}

/// What a processed turn did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnKind {
    /// Input was blank
    Empty,
    /// Replied to a greeting
    Greeting,
    /// Said goodbye
    Farewell,
    /// Ran a control command (help, stats, debug)
    Command,
    /// Could not read the input, asked to rephrase
    Clarification,
    /// User skipped a pending question
    Passed,
    /// Asked for the part of speech of a new word
    AskingPos,
    /// Stored a part-of-speech answer
    PosAnswered,
    /// Stored a part-of-speech answer and asked about the next queued word
    PosAnsweredAskingNext,
    /// Learned from a statement
    Learned,
    /// Learned from a statement and asked a follow-up question
    LearnedAndAsking,
    /// Stored the answer to a pending property question
    LearnedAnswer,
    /// Asked a question without new input to learn from
    Asking,
    /// Answered a question from stored knowledge
    Answered,
    /// Recovered from a storage failure
    Error,
}

impl TurnKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TurnKind::Empty => "empty",
            TurnKind::Greeting => "greeting",
            TurnKind::Farewell => "farewell",
            TurnKind::Command => "command",
            TurnKind::Clarification => "clarification",
            TurnKind::Passed => "passed",
            TurnKind::AskingPos => "asking_pos",
            TurnKind::PosAnswered => "pos_answered",
            TurnKind::PosAnsweredAskingNext => "pos_answered_asking_next",
            TurnKind::Learned => "learned",
            TurnKind::LearnedAndAsking => "learned_and_asking",
            TurnKind::LearnedAnswer => "learned_answer",
            TurnKind::Asking => "asking",
            TurnKind::Answered => "answered",
            TurnKind::Error => "error",
        }
    }
}

impl std::fmt::Display for TurnKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The result of one processed turn.
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    pub kind: TurnKind,
    /// Reply shown to the user
    pub message: String,
    /// Question the reply asked, when it expects an answer next turn
    pub question: Option<String>,
    /// Concepts written this turn
    pub objects_updated: usize,
}

impl TurnOutcome {
    fn simple(kind: TurnKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            question: None,
            objects_updated: 0,
        }
    }
}

/// A gap question ready to ask, with the state needed to store its answer.
struct GapPrompt {
    identity: String,
    field: &'static str,
    question: String,
}

fn gap_prompt(concept: &ConceptEntity) -> Option<GapPrompt> {
    gaps::find_next_gap(concept).map(|field| GapPrompt {
        identity: concept.identity.clone(),
        field,
        question: templates::gap_question(&concept.identity, field, concept.kind),
    })
}

/// The conversational learning loop over a concept store.
pub struct ConversationEngine<R: ConceptRepository> {
    store: ConceptStore<R>,
    session: ConversationSession,
    scorer: ReplyScorer,
    answerer: QuestionAnswerer,
    rng: StdRng,
    name: String,
    use_scorer: bool,
}

impl<R: ConceptRepository> ConversationEngine<R> {
    pub fn new(store: ConceptStore<R>, settings: EngineSettings) -> Self {
        Self {
            session: ConversationSession::new(settings.debug),
            scorer: ReplyScorer::new(settings.weights, settings.history_limit),
            answerer: QuestionAnswerer::new(),
            rng: StdRng::from_entropy(),
            name: settings.name.to_lowercase(),
            use_scorer: settings.use_scorer,
            store,
        }
    }

    /// Fixed-seed constructor so replies drawn from template pools are
    /// reproducible in tests
    pub fn with_seed(store: ConceptStore<R>, settings: EngineSettings, seed: u64) -> Self {
        Self {
            session: ConversationSession::new(settings.debug),
            scorer: ReplyScorer::with_seed(settings.weights, settings.history_limit, seed),
            answerer: QuestionAnswerer::with_seed(seed.wrapping_add(1)),
            rng: StdRng::seed_from_u64(seed.wrapping_add(2)),
            name: settings.name.to_lowercase(),
            use_scorer: settings.use_scorer,
            store,
        }
    }

    pub fn store(&self) -> &ConceptStore<R> {
        &self.store
    }

    pub fn session(&self) -> &ConversationSession {
        &self.session
    }

    pub fn scorer_stats(&self) -> ScorerStats {
        self.scorer.stats()
    }

    /// Process one line of user input.
    ///
    /// Storage failures and other recoverable errors become an apologetic
    /// reply with the session state untouched, so a flaky disk never ends
    /// the conversation. Contract violations still propagate.
    pub async fn process_turn(&mut self, raw: &str) -> Result<TurnOutcome> {
        match self.run_turn(raw).await {
            Ok(outcome) => {
                info!(
                    kind = outcome.kind.as_str(),
                    updated = outcome.objects_updated,
                    "Turn complete"
                );
                Ok(outcome)
            }
            Err(err) if err.is_recoverable() => {
                warn!(error = %err, code = err.code(), "Turn failed, recovering");
                Ok(TurnOutcome::simple(
                    TurnKind::Error,
                    "I had trouble remembering that just now. Could you say it again?",
                ))
            }
            Err(err) => Err(err),
        }
    }

    async fn run_turn(&mut self, raw: &str) -> Result<TurnOutcome> {
        let input = raw.trim();

        if input.is_empty() {
            return Ok(self.handle_empty());
        }
        if let Some(outcome) = self.handle_control(input).await? {
            return Ok(outcome);
        }

        // a pending question consumes the input before anything else,
        // unless the input is plainly a fresh statement
        match self.session.pending().clone() {
            PendingQuestion::PartOfSpeech { word } => {
                return self.handle_pos_answer(input, &word).await;
            }
            PendingQuestion::Property {
                identity,
                attribute,
            } => {
                let known = self.known_words().await?;
                let parsed = parser::parse(input, &known);
                if !teaches_something_new(&parsed) {
                    return self
                        .handle_property_answer(&parsed, &identity, &attribute)
                        .await;
                }
                // the user moved on instead of answering
                debug!(identity = %identity, attribute = %attribute, "Pending question dropped");
                self.session.clear_pending();
                return self.dispatch(input, parsed).await;
            }
            PendingQuestion::None => {}
        }

        let known = self.known_words().await?;
        let parsed = parser::parse(input, &known);
        self.dispatch(input, parsed).await
    }

    async fn dispatch(&mut self, input: &str, parsed: ParsedUtterance) -> Result<TurnOutcome> {
        debug!(
            sentence = ?parsed.sentence_type,
            subject = parsed.subject.as_deref().unwrap_or("-"),
            unknown = parsed.unknown_words.len(),
            "Parsed input"
        );

        if parsed.is_question() {
            let targets_me = parsed
                .question
                .as_ref()
                .and_then(|q| q.target.as_deref())
                .map(|t| t == "you" || t == self.name)
                .unwrap_or(false);
            let aimless = parsed
                .question
                .as_ref()
                .map(|q| q.target.is_none())
                .unwrap_or(true);
            if parsed.greeting.is_some() && (targets_me || aimless) {
                return Ok(self.greet(targets_me));
            }
            return self.handle_question(input, &parsed).await;
        }

        // only full statements teach words; commands never queue
        if parsed.is_statement() && !parsed.unknown_words.is_empty() {
            return Ok(self.queue_unknown_words(&parsed));
        }

        let relations = parser::extract_relations(&parsed);
        if parsed.greeting.is_some() && relations.is_empty() {
            return Ok(self.greet(false));
        }

        self.learn_from(input, &parsed, relations).await
    }

    fn handle_empty(&mut self) -> TurnOutcome {
        match self.session.pending().clone() {
            PendingQuestion::Property { .. } => {
                self.session.clear_pending();
                TurnOutcome::simple(TurnKind::Passed, templates::property_pass())
            }
            PendingQuestion::PartOfSpeech { word } => {
                TurnOutcome::simple(TurnKind::Clarification, templates::pos_clarification(&word))
            }
            PendingQuestion::None => TurnOutcome::simple(TurnKind::Empty, "I'm listening."),
        }
    }

    /// Control commands work even while a question is pending.
    async fn handle_control(&mut self, input: &str) -> Result<Option<TurnOutcome>> {
        let outcome = match input.to_lowercase().as_str() {
            "quit" | "exit" | "bye" | "goodbye" => Some(TurnOutcome::simple(
                TurnKind::Farewell,
                "Goodbye! Keep learning!",
            )),
            "help" => Some(TurnOutcome::simple(TurnKind::Command, help_text())),
            "stats" => Some(self.stats_reply().await?),
            "debug on" => {
                self.session.debug = true;
                Some(TurnOutcome::simple(TurnKind::Command, "Debug output enabled."))
            }
            "debug off" => {
                self.session.debug = false;
                Some(TurnOutcome::simple(TurnKind::Command, "Debug output disabled."))
            }
            "?" => Some(self.ask_about_gap().await?),
            _ => None,
        };
        Ok(outcome)
    }

    /// A bare question mark asks the engine to pick its own question: the
    /// first concept in creation order that still has a gap.
    async fn ask_about_gap(&mut self) -> Result<TurnOutcome> {
        let concepts = self.store.list_all(None).await?;
        for concept in &concepts {
            if let Some(prompt) = gap_prompt(concept) {
                self.session.expect_property(&prompt.identity, prompt.field);
                return Ok(TurnOutcome {
                    kind: TurnKind::Asking,
                    message: prompt.question.clone(),
                    question: Some(prompt.question),
                    objects_updated: 0,
                });
            }
        }
        Ok(TurnOutcome::simple(
            TurnKind::Command,
            "I don't have a question right now. Tell me something new!",
        ))
    }

    async fn stats_reply(&self) -> Result<TurnOutcome> {
        let store = self.store.stats().await?;
        let scorer = self.scorer.stats();
        let message = format!(
            "I know {} concepts ({} nouns, {} verbs, {} adjectives) holding {} facts. \
             Conversation score {:.1} over {} turns, averaging {:.1}.",
            store.total_concepts,
            store.nouns,
            store.verbs,
            store.adjectives,
            store.total_attributes,
            scorer.total_score,
            scorer.turns,
            scorer.average_score,
        );
        Ok(TurnOutcome::simple(TurnKind::Command, message))
    }

    /// Store a part-of-speech answer for `word`, then move to the next
    /// queued word if any.
    async fn handle_pos_answer(&mut self, input: &str, word: &str) -> Result<TurnOutcome> {
        let lower = input.to_lowercase();
        let kind = if lower.contains("noun") {
            Some(ConceptKind::Noun)
        } else if lower.contains("verb") {
            Some(ConceptKind::Verb)
        } else if lower.contains("adj") {
            Some(ConceptKind::Adjective)
        } else {
            None
        };

        let Some(kind) = kind else {
            return Ok(TurnOutcome::simple(
                TurnKind::Clarification,
                templates::pos_clarification(word),
            ));
        };

        self.store.create_or_get(word, kind).await?;
        let mut message = templates::pos_thanks(word, kind);

        match self.session.next_queued_word() {
            Some(next) => {
                let question = templates::pos_question(&next);
                self.session.expect_part_of_speech(&next);
                message.push(' ');
                message.push_str(&question);
                Ok(TurnOutcome {
                    kind: TurnKind::PosAnsweredAskingNext,
                    message,
                    question: Some(question),
                    objects_updated: 1,
                })
            }
            None => {
                self.session.clear_pending();
                Ok(TurnOutcome {
                    kind: TurnKind::PosAnswered,
                    message,
                    question: None,
                    objects_updated: 1,
                })
            }
        }
    }

    /// Store the answer to a pending gap question directly under the asked
    /// attribute. No numbering here: the question named one attribute and
    /// the answer fills exactly that one.
    async fn handle_property_answer(
        &mut self,
        parsed: &ParsedUtterance,
        identity: &str,
        attribute: &str,
    ) -> Result<TurnOutcome> {
        let value = parsed.object.clone().or_else(|| {
            parsed
                .tokens
                .iter()
                .find(|t| !parser::is_stop_word(t))
                .cloned()
        });

        let Some(value) = value else {
            return Ok(TurnOutcome::simple(
                TurnKind::Clarification,
                templates::property_clarification(),
            ));
        };

        let mut concept = self.store.require(identity).await?;
        concept.add_attribute(attribute, value.as_str());
        self.store.save(&concept).await?;
        self.session.clear_pending();

        Ok(TurnOutcome {
            kind: TurnKind::LearnedAnswer,
            message: templates::learned_confirmation(identity, attribute, &value),
            question: None,
            objects_updated: 1,
        })
    }

    /// Queue every unknown word from a statement and ask about the first.
    fn queue_unknown_words(&mut self, parsed: &ParsedUtterance) -> TurnOutcome {
        self.session
            .queue_part_of_speech(parsed.unknown_words.iter().cloned());

        match self.session.next_queued_word() {
            Some(word) => {
                let question = templates::pos_question(&word);
                self.session.expect_part_of_speech(&word);
                TurnOutcome {
                    kind: TurnKind::AskingPos,
                    message: question.clone(),
                    question: Some(question),
                    objects_updated: 0,
                }
            }
            None => TurnOutcome::simple(
                TurnKind::Learned,
                templates::statement_confirmation(&[]),
            ),
        }
    }

    fn greet(&mut self, asked_how: bool) -> TurnOutcome {
        TurnOutcome::simple(
            TurnKind::Greeting,
            templates::greeting_reply(&mut self.rng, asked_how),
        )
    }

    /// Learn every relation a statement asserts, then pick a reply.
    async fn learn_from(
        &mut self,
        input: &str,
        parsed: &ParsedUtterance,
        relations: Vec<RelationTriple>,
    ) -> Result<TurnOutcome> {
        let mut touched: Vec<ConceptEntity> = Vec::new();

        for triple in &relations {
            let source_kind = if Some(&triple.source) == parsed.subject.as_ref() {
                ConceptKind::Noun
            } else {
                object_kind(parsed)
            };
            let source_pos = self.touch(&mut touched, &triple.source, source_kind).await?;
            touched[source_pos].add_relation(triple.relation.as_str(), &triple.target);

            let target_kind = target_kind(triple, parsed);
            let target_pos = self.touch(&mut touched, &triple.target, target_kind).await?;
            // an adjective learns what it can describe from the sentence
            // that used it, so "saturday is cold" also teaches "cold"
            if triple.relation == Relation::Is
                && touched[target_pos].kind == ConceptKind::Adjective
            {
                touched[target_pos].add_relation("can_describe", &triple.source);
            }
        }

        // a plain action verb still becomes a concept of its own
        if parsed.relation == Some(Relation::Action) {
            if let Some(verb) = &parsed.verb {
                self.touch(&mut touched, verb, ConceptKind::Verb).await?;
            }
        }

        for concept in &touched {
            self.store.save(concept).await?;
        }
        let objects_updated = touched.len();

        if let Some(subject) = &parsed.subject {
            self.session.note_subject(subject);
        }

        let base = templates::statement_confirmation(&relations);
        let gap = touched.iter().find_map(gap_prompt);

        if !self.use_scorer {
            return Ok(match gap {
                Some(prompt) => {
                    self.session.expect_property(&prompt.identity, prompt.field);
                    TurnOutcome {
                        kind: TurnKind::LearnedAndAsking,
                        message: format!("{base} {}", prompt.question),
                        question: Some(prompt.question),
                        objects_updated,
                    }
                }
                None => TurnOutcome {
                    kind: TurnKind::Learned,
                    message: base,
                    question: None,
                    objects_updated,
                },
            });
        }

        let related = self.session.related_subjects(parsed.subject.as_deref());
        let request = TurnRequest {
            input,
            is_question: false,
            is_statement: true,
            subject: parsed.subject.as_deref(),
            object: parsed.object.as_deref(),
            gap_question: gap.as_ref().map(|p| p.question.as_str()),
            related: &related,
            base_response: Some(&base),
            answer: None,
        };
        let decision = self.scorer.play_turn(&request);

        let mut message = decision.response.clone();
        let asked = self.arm_gap_question(gap, &message);
        if self.session.debug {
            message.push_str(&debug_suffix(&decision));
        }

        Ok(TurnOutcome {
            kind: if asked.is_some() {
                TurnKind::LearnedAndAsking
            } else {
                TurnKind::Learned
            },
            message,
            question: asked,
            objects_updated,
        })
    }

    /// Answer a question from stored knowledge, routed through the scorer
    /// when it is enabled.
    async fn handle_question(
        &mut self,
        input: &str,
        parsed: &ParsedUtterance,
    ) -> Result<TurnOutcome> {
        let Some(question) = parsed.question.clone() else {
            return Ok(TurnOutcome::simple(
                TurnKind::Clarification,
                templates::property_clarification(),
            ));
        };

        let concept = match question.target.as_deref() {
            Some(target) => self.store.load(target).await?,
            None => None,
        };
        let answer = self.answerer.answer(&question, concept.as_ref());
        let gap = concept.as_ref().and_then(gap_prompt);

        if !self.use_scorer {
            let mut message = answer.answer.clone();
            if let Some(extra) = self.answerer.follow_up(&answer) {
                message.push(' ');
                message.push_str(&extra);
            }
            return Ok(TurnOutcome::simple(TurnKind::Answered, message));
        }

        let related = self.session.related_subjects(parsed.subject.as_deref());
        let request = TurnRequest {
            input,
            is_question: true,
            is_statement: false,
            subject: parsed.subject.as_deref(),
            object: parsed.object.as_deref(),
            gap_question: gap.as_ref().map(|p| p.question.as_str()),
            related: &related,
            base_response: None,
            answer: Some(&answer),
        };
        let decision = self.scorer.play_turn(&request);

        let mut message = decision.response.clone();
        let asked = self.arm_gap_question(gap, &message);
        if self.session.debug {
            message.push_str(&debug_suffix(&decision));
        }

        Ok(TurnOutcome {
            kind: TurnKind::Answered,
            message,
            question: asked,
            objects_updated: 0,
        })
    }

    /// Set the pending property question only when the composed reply
    /// actually asked it; a reply that dropped the question must not make
    /// the next input look like an answer.
    fn arm_gap_question(&mut self, gap: Option<GapPrompt>, message: &str) -> Option<String> {
        let prompt = gap?;
        if message
            .to_lowercase()
            .contains(&prompt.question.to_lowercase())
        {
            self.session.expect_property(&prompt.identity, prompt.field);
            Some(prompt.question)
        } else {
            None
        }
    }

    /// Load-or-create a concept into the touched list, returning its index.
    async fn touch(
        &self,
        touched: &mut Vec<ConceptEntity>,
        identity: &str,
        kind: ConceptKind,
    ) -> Result<usize> {
        if let Some(pos) = touched.iter().position(|c| c.identity == identity) {
            return Ok(pos);
        }
        let concept = self.store.create_or_get(identity, kind).await?;
        touched.push(concept);
        Ok(touched.len() - 1)
    }

    async fn known_words(&self) -> Result<HashSet<String>> {
        let mut known = self.store.known_identities().await?;
        known.insert(self.name.clone());
        Ok(known)
    }
}

/// A complete subject-verb-object statement about a nameable concept.
/// While a question is pending this shape means the user moved on rather
/// than answered; pronoun subjects ("it can bark") still read as answers.
fn teaches_something_new(parsed: &ParsedUtterance) -> bool {
    parsed.is_statement()
        && parsed.object.is_some()
        && parsed
            .subject
            .as_deref()
            .is_some_and(|s| !parser::is_function_word(s))
}

/// Kind for the sentence object: an article marks a noun, a bare word
/// after "is" reads as an adjective.
fn object_kind(parsed: &ParsedUtterance) -> ConceptKind {
    if parsed.object_has_article || parsed.relation != Some(Relation::Is) {
        ConceptKind::Noun
    } else {
        ConceptKind::Adjective
    }
}

fn target_kind(triple: &RelationTriple, parsed: &ParsedUtterance) -> ConceptKind {
    if triple.relation != Relation::Is {
        return ConceptKind::Noun;
    }
    if Some(&triple.target) == parsed.object.as_ref() {
        object_kind(parsed)
    } else {
        // descriptor triples always teach adjectives
        ConceptKind::Adjective
    }
}

fn debug_suffix(decision: &TurnDecision) -> String {
    let strategy = decision
        .strategy
        .map(|s| s.as_str())
        .unwrap_or("fallback");
    format!(" [strategy={strategy} score={:.1}]", decision.score)
}

fn help_text() -> String {
    "Teach me with plain statements like 'a dog is an animal' and ask me questions \
     like 'what is a dog?'. Commands: '?' makes me ask about something I want to know, \
     'stats' shows what I have learned, 'debug on' or 'debug off' toggles scoring \
     detail, and 'quit' says goodbye."
        .to_string()
}
