//! Per-conversation state
//!
//! One session exists per chat. It tracks the question the engine is
//! waiting on, the queue of words still needing a part-of-speech answer,
//! and the subjects mentioned recently. Nothing here is persisted; the
//! session dies with the conversation.

use std::collections::VecDeque;

/// Most recent subjects kept for the connector strategy.
const RECENT_SUBJECTS_LIMIT: usize = 5;

/// The question the engine is waiting on, if any. A pending
/// part-of-speech question always carries its word, so the two can never
/// disagree.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PendingQuestion {
    #[default]
    None,
    /// Waiting for the value of `attribute` on the concept `identity`
    Property { identity: String, attribute: String },
    /// Waiting to hear what part of speech `word` is
    PartOfSpeech { word: String },
}

/// Mutable state for one conversation.
#[derive(Debug, Default)]
pub struct ConversationSession {
    pending: PendingQuestion,
    pos_queue: VecDeque<String>,
    recent_subjects: VecDeque<String>,
    /// When set, replies carry the chosen strategy and score
    pub debug: bool,
}

impl ConversationSession {
    pub fn new(debug: bool) -> Self {
        Self {
            debug,
            ..Self::default()
        }
    }

    /// The question currently awaiting an answer
    pub fn pending(&self) -> &PendingQuestion {
        &self.pending
    }

    /// Wait for a property answer. Replaces any other pending question.
    pub fn expect_property(&mut self, identity: impl Into<String>, attribute: impl Into<String>) {
        self.pending = PendingQuestion::Property {
            identity: identity.into(),
            attribute: attribute.into(),
        };
    }

    /// Wait for a part-of-speech answer. Replaces any other pending
    /// question.
    pub fn expect_part_of_speech(&mut self, word: impl Into<String>) {
        self.pending = PendingQuestion::PartOfSpeech { word: word.into() };
    }

    /// Stop waiting for an answer
    pub fn clear_pending(&mut self) {
        self.pending = PendingQuestion::None;
    }

    /// Whether any question is pending
    pub fn is_waiting(&self) -> bool {
        self.pending != PendingQuestion::None
    }

    /// Queue words for part-of-speech clarification, skipping duplicates
    /// already queued or currently asked about.
    pub fn queue_part_of_speech<I, S>(&mut self, words: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for word in words {
            let word = word.into();
            let already_pending =
                matches!(&self.pending, PendingQuestion::PartOfSpeech { word: w } if *w == word);
            if already_pending || self.pos_queue.contains(&word) {
                continue;
            }
            self.pos_queue.push_back(word);
        }
    }

    /// Pop the next word awaiting a part-of-speech answer, strictly FIFO
    pub fn next_queued_word(&mut self) -> Option<String> {
        self.pos_queue.pop_front()
    }

    /// Words still queued for part-of-speech answers
    pub fn queued_words(&self) -> usize {
        self.pos_queue.len()
    }

    /// Remember a subject was talked about. Repeats move to the front;
    /// the ring holds the last few distinct subjects.
    pub fn note_subject(&mut self, word: impl Into<String>) {
        let word = word.into();
        self.recent_subjects.retain(|w| *w != word);
        self.recent_subjects.push_front(word);
        self.recent_subjects.truncate(RECENT_SUBJECTS_LIMIT);
    }

    /// Recently discussed subjects other than the current one, most
    /// recent first
    pub fn related_subjects(&self, current: Option<&str>) -> Vec<String> {
        self.recent_subjects
            .iter()
            .filter(|w| Some(w.as_str()) != current)
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_pending_question_at_a_time() {
        let mut session = ConversationSession::default();
        assert!(!session.is_waiting());

        session.expect_property("dog", "can_do");
        session.expect_part_of_speech("saturday");

        assert_eq!(
            session.pending(),
            &PendingQuestion::PartOfSpeech {
                word: "saturday".to_string()
            }
        );

        session.clear_pending();
        assert!(!session.is_waiting());
    }

    #[test]
    fn test_pos_queue_is_fifo_and_deduplicated() {
        let mut session = ConversationSession::default();
        session.expect_part_of_speech("zorp");
        session.queue_part_of_speech(["glim", "zorp", "glim", "fler"]);

        assert_eq!(session.queued_words(), 2);
        assert_eq!(session.next_queued_word().as_deref(), Some("glim"));
        assert_eq!(session.next_queued_word().as_deref(), Some("fler"));
        assert_eq!(session.next_queued_word(), None);
    }

    #[test]
    fn test_recent_subjects_ring() {
        let mut session = ConversationSession::default();
        for word in ["a", "b", "c", "d", "e", "f"] {
            session.note_subject(word);
        }

        // capped at five, oldest dropped
        let related = session.related_subjects(None);
        assert_eq!(related, vec!["f", "e", "d", "c", "b"]);

        // repeat mention moves to the front without duplicating
        session.note_subject("d");
        let related = session.related_subjects(None);
        assert_eq!(related, vec!["d", "f", "e", "c", "b"]);
    }

    #[test]
    fn test_related_subjects_exclude_current() {
        let mut session = ConversationSession::default();
        session.note_subject("dog");
        session.note_subject("cat");

        assert_eq!(session.related_subjects(Some("cat")), vec!["dog"]);
    }
}
