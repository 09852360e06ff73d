//! Conversational learning engine
//!
//! This module ties the rest of the crate into a chat loop. The key
//! components are:
//!
//! - **Conversation Engine**: processes one user line at a time, routing it
//!   through control commands, pending-question answers, parsing, learning,
//!   and answering.
//!
//! - **Reply Scorer**: drafts reply candidates from five strategies and
//!   picks the best under a weighted utility of happiness, knowledge, and
//!   conversational flow.
//!
//! ## How It Works
//!
//! 1. The engine trims the input and handles controls (`quit`, `help`,
//!    `stats`, `debug on/off`, `?`) before anything else
//! 2. If a question is pending, the input is consumed as its answer
//! 3. Otherwise the input is parsed; questions are answered from the store,
//!    statements grow it, and unfamiliar words trigger part-of-speech
//!    questions
//! 4. On learning and answering turns the scorer drafts candidates,
//!    discards any containing a forbidden word, scores the rest, and
//!    composes the final reply
//!
//! ## Example
//!
//! ```rust,ignore
//! use curio_core::domain::concept::ConceptStore;
//! use curio_core::engine::{ConversationEngine, EngineSettings};
//! use curio_core::infrastructure::concept::SqliteConceptRepository;
//! use curio_core::storage::Database;
//! use std::sync::Arc;
//!
//! let db = Database::in_memory().await?;
//! let store = ConceptStore::new(Arc::new(SqliteConceptRepository::new(db.pool().clone())));
//! let mut engine = ConversationEngine::new(store, EngineSettings::default());
//!
//! let outcome = engine.process_turn("A dog is an animal.").await?;
//! println!("{}", outcome.message);
//! ```

mod conversation;
mod scorer;

pub use conversation::{ConversationEngine, EngineSettings, TurnKind, TurnOutcome};
pub use scorer::{
    Candidate, ReplyScorer, ScoreBreakdown, ScorerStats, ScorerWeights, Strategy, TurnDecision,
    TurnRecord, TurnRequest, DEFAULT_HISTORY_LIMIT,
};
