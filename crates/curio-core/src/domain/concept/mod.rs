//! Concept domain module
//!
//! A concept is a word the system has learned: a part of speech plus a bag
//! of dynamic attributes that grows as the conversation teaches facts.
//!
//! - **ConceptEntity**: a learned word with weighted attribute values
//! - **ConceptRepository**: persistence trait (SQLite implementation lives
//!   in `infrastructure::concept`)
//! - **ConceptStore**: high-level service with normalization and contract
//!   checks

mod entity;
mod repository;
mod service;

pub use entity::{AttributeBag, ConceptEntity, ConceptKind};
pub use repository::{ConceptRepository, StoreStats};
pub use service::ConceptStore;
