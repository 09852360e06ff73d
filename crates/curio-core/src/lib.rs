//! Curio Core Library
//!
//! This crate provides the core functionality for curio, a conversational
//! system that learns from what you tell it, including:
//! - Utterance parsing (subject/verb/object, questions, greetings)
//! - Concept domain model (dynamic attributes with weights)
//! - Storage (SQLite concept persistence)
//! - Knowledge gap analysis and question generation
//! - Dialogue templates, session state, and question answering
//! - Utility-scored reply selection
//! - Sentiment classification

pub mod config;
pub mod dialogue;
pub mod domain;
pub mod engine;
pub mod error;
pub mod gaps;
pub mod infrastructure;
pub mod parser;
pub mod sentiment;
pub mod storage;

pub use error::{Error, Result};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::Config;
    pub use crate::domain::concept::{ConceptEntity, ConceptKind, ConceptStore};
    pub use crate::engine::{ConversationEngine, EngineSettings, TurnKind, TurnOutcome};
    pub use crate::error::{Error, Result};
    pub use crate::infrastructure::concept::SqliteConceptRepository;
    pub use crate::storage::{Database, DatabaseConfig};
}
