//! Repository trait for concept persistence
//!
//! The trait abstracts over storage backends so the conversation layer can
//! be tested against an in-memory SQLite database.

use async_trait::async_trait;

use crate::error::Result;

use super::entity::{ConceptEntity, ConceptKind};

/// Repository trait for concept persistence
#[async_trait]
pub trait ConceptRepository: Send + Sync {
    /// Insert the concept if its identity is new, otherwise return the
    /// stored concept untouched (the stored kind wins over the requested
    /// one). Attributes are loaded either way.
    async fn create_or_get(&self, identity: &str, kind: ConceptKind) -> Result<ConceptEntity>;

    /// Load a concept with its attributes. Values within each attribute
    /// name come back ordered by weight (heaviest first).
    async fn load(&self, identity: &str) -> Result<Option<ConceptEntity>>;

    /// Persist a concept and every attribute pair it holds in memory.
    /// New (name, value) pairs insert with weight 1; pairs already stored
    /// get their weight bumped by 1.
    async fn save(&self, entity: &ConceptEntity) -> Result<()>;

    /// List all concepts in creation order
    async fn list(&self) -> Result<Vec<ConceptEntity>>;

    /// List concepts of one kind in creation order
    async fn list_by_kind(&self, kind: ConceptKind) -> Result<Vec<ConceptEntity>>;

    /// All known identities (lowercase)
    async fn identities(&self) -> Result<Vec<String>>;

    /// Count stored concepts
    async fn count(&self) -> Result<u64>;

    /// Aggregate store statistics
    async fn stats(&self) -> Result<StoreStats>;
}

/// Aggregate statistics about the concept store
#[derive(Debug, Clone, Default)]
pub struct StoreStats {
    /// Total number of concepts
    pub total_concepts: u64,
    /// Concepts stored as nouns
    pub nouns: u64,
    /// Concepts stored as verbs
    pub verbs: u64,
    /// Concepts stored as adjectives
    pub adjectives: u64,
    /// Total number of attribute rows
    pub total_attributes: u64,
}
