//! Concept store service
//!
//! High-level operations over a [`ConceptRepository`]: identity
//! normalization, contract checks, and the lookups the conversation
//! engine and CLI build on.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::debug;

use crate::error::{Error, Result};

use super::entity::{ConceptEntity, ConceptKind};
use super::repository::{ConceptRepository, StoreStats};

/// Store for learned concepts
pub struct ConceptStore<R: ConceptRepository> {
    /// Repository for persistence
    repository: Arc<R>,
}

impl<R: ConceptRepository> ConceptStore<R> {
    /// Create a new concept store
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    /// Create a concept if it does not exist yet, otherwise return the
    /// stored one. Idempotent: the stored kind wins over `kind`.
    pub async fn create_or_get(&self, identity: &str, kind: ConceptKind) -> Result<ConceptEntity> {
        let identity = Self::normalize(identity)?;
        let concept = self.repository.create_or_get(&identity, kind).await?;
        debug!(identity = %concept.identity, kind = %concept.kind, "Concept resolved");
        Ok(concept)
    }

    /// Load a concept with its attributes
    pub async fn load(&self, identity: &str) -> Result<Option<ConceptEntity>> {
        let identity = Self::normalize(identity)?;
        self.repository.load(&identity).await
    }

    /// Load a concept, failing when it is unknown
    pub async fn require(&self, identity: &str) -> Result<ConceptEntity> {
        let identity = Self::normalize(identity)?;
        self.repository
            .load(&identity)
            .await?
            .ok_or(Error::ConceptNotFound { identity })
    }

    /// Persist a concept and all of its in-memory attributes.
    ///
    /// Saving the same (name, value) pair repeatedly accumulates weight on
    /// its stored row. Saving a concept without an identity is a contract
    /// violation, not a user error.
    pub async fn save(&self, entity: &ConceptEntity) -> Result<()> {
        if entity.identity.trim().is_empty() {
            return Err(Error::Precondition(
                "cannot save a concept without an identity".to_string(),
            ));
        }
        self.repository.save(entity).await?;
        debug!(identity = %entity.identity, attributes = entity.attributes.len(), "Concept saved");
        Ok(())
    }

    /// List concepts, optionally filtered by kind, in creation order
    pub async fn list_all(&self, kind: Option<ConceptKind>) -> Result<Vec<ConceptEntity>> {
        match kind {
            Some(kind) => self.repository.list_by_kind(kind).await,
            None => self.repository.list().await,
        }
    }

    /// The set of known identities, for unknown-word detection
    pub async fn known_identities(&self) -> Result<HashSet<String>> {
        Ok(self.repository.identities().await?.into_iter().collect())
    }

    /// Count stored concepts
    pub async fn count(&self) -> Result<u64> {
        self.repository.count().await
    }

    /// Aggregate store statistics
    pub async fn stats(&self) -> Result<StoreStats> {
        self.repository.stats().await
    }

    fn normalize(identity: &str) -> Result<String> {
        let identity = identity.trim().to_lowercase();
        if identity.is_empty() {
            return Err(Error::Precondition(
                "concept identity must not be empty".to_string(),
            ));
        }
        Ok(identity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::concept::SqliteConceptRepository;
    use crate::storage::Database;

    async fn test_store() -> ConceptStore<SqliteConceptRepository> {
        let db = Database::in_memory().await.expect("Failed to create database");
        ConceptStore::new(Arc::new(SqliteConceptRepository::new(db.pool().clone())))
    }

    #[tokio::test]
    async fn test_save_empty_identity_is_a_contract_violation() {
        let store = test_store().await;

        let mut concept = ConceptEntity::new("dog", ConceptKind::Noun);
        concept.identity = String::new();

        let err = store.save(&concept).await.unwrap_err();
        assert!(matches!(err, Error::Precondition(_)));
        assert!(!err.is_recoverable());
    }

    #[tokio::test]
    async fn test_require_unknown_concept() {
        let store = test_store().await;

        let err = store.require("unicorn").await.unwrap_err();
        assert!(matches!(err, Error::ConceptNotFound { identity } if identity == "unicorn"));
    }

    #[tokio::test]
    async fn test_identity_normalized_on_every_path() {
        let store = test_store().await;

        store.create_or_get("  Dog ", ConceptKind::Noun).await.unwrap();

        let loaded = store.load("DOG").await.unwrap();
        assert!(loaded.is_some());
        assert_eq!(loaded.unwrap().identity, "dog");

        let known = store.known_identities().await.unwrap();
        assert!(known.contains("dog"));
    }

    #[tokio::test]
    async fn test_list_all_with_kind_filter() {
        let store = test_store().await;

        store.create_or_get("dog", ConceptKind::Noun).await.unwrap();
        store.create_or_get("run", ConceptKind::Verb).await.unwrap();
        store.create_or_get("cold", ConceptKind::Adjective).await.unwrap();

        assert_eq!(store.list_all(None).await.unwrap().len(), 3);
        let nouns = store.list_all(Some(ConceptKind::Noun)).await.unwrap();
        assert_eq!(nouns.len(), 1);
        assert_eq!(nouns[0].identity, "dog");
    }
}
