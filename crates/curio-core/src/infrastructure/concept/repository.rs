//! SQLite implementation of the ConceptRepository
//!
//! Attribute rows are unique per (concept, name, value); re-asserting a
//! stored fact bumps its weight instead of inserting a duplicate.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqlitePool};
use tracing::debug;

use crate::domain::concept::{
    AttributeBag, ConceptEntity, ConceptKind, ConceptRepository, StoreStats,
};
use crate::error::{Error, Result};

/// SQLite implementation of the concept repository
#[derive(Clone)]
pub struct SqliteConceptRepository {
    pool: SqlitePool,
}

impl SqliteConceptRepository {
    /// Create a new SQLite concept repository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Load the attribute bag for a concept. Rows come back grouped by
    /// name with the heaviest value first, so `first()` on the bag yields
    /// the most reinforced fact.
    async fn load_attributes(&self, concept_id: &str) -> Result<AttributeBag> {
        let rows: Vec<(String, String)> = sqlx::query_as(
            r#"
            SELECT name, value FROM attributes
            WHERE concept_id = ?
            ORDER BY name ASC, weight DESC, id ASC
            "#,
        )
        .bind(concept_id)
        .fetch_all(&self.pool)
        .await?;

        let mut bag = AttributeBag::new();
        for (name, value) in rows {
            bag.add(name, value);
        }
        Ok(bag)
    }

    async fn load_row(&self, identity: &str) -> Result<Option<ConceptRow>> {
        let row: Option<ConceptRow> = sqlx::query_as("SELECT * FROM concepts WHERE identity = ?")
            .bind(identity)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }
}

#[async_trait]
impl ConceptRepository for SqliteConceptRepository {
    async fn create_or_get(&self, identity: &str, kind: ConceptKind) -> Result<ConceptEntity> {
        let candidate = ConceptEntity::new(identity, kind);

        // The unique identity index makes concurrent creates collapse into
        // one row; a conflict means the concept already exists and its
        // stored kind wins.
        sqlx::query(
            r#"
            INSERT INTO concepts (id, identity, kind, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(identity) DO NOTHING
            "#,
        )
        .bind(&candidate.id)
        .bind(&candidate.identity)
        .bind(candidate.kind.as_str())
        .bind(candidate.created_at.to_rfc3339())
        .bind(candidate.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        self.load(&candidate.identity)
            .await?
            .ok_or(Error::ConceptNotFound {
                identity: candidate.identity,
            })
    }

    async fn load(&self, identity: &str) -> Result<Option<ConceptEntity>> {
        let Some(row) = self.load_row(identity).await? else {
            return Ok(None);
        };

        let attributes = self.load_attributes(&row.id).await?;
        row.into_entity(attributes).map(Some)
    }

    async fn save(&self, entity: &ConceptEntity) -> Result<()> {
        // Upsert the concept row. The stored id and kind are kept on
        // conflict; only the freshness timestamp moves.
        sqlx::query(
            r#"
            INSERT INTO concepts (id, identity, kind, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(identity) DO UPDATE SET
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&entity.id)
        .bind(&entity.identity)
        .bind(entity.kind.as_str())
        .bind(entity.created_at.to_rfc3339())
        .bind(entity.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        // Attribute inserts must reference the stored row, which can be
        // older than the in-memory entity.
        let (concept_id,): (String,) = sqlx::query_as("SELECT id FROM concepts WHERE identity = ?")
            .bind(&entity.identity)
            .fetch_one(&self.pool)
            .await?;

        for (name, value) in entity.attributes.entries() {
            sqlx::query(
                r#"
                INSERT INTO attributes (concept_id, name, value, weight, created_at)
                VALUES (?, ?, ?, 1, ?)
                ON CONFLICT(concept_id, name, value) DO UPDATE SET
                    weight = weight + 1
                "#,
            )
            .bind(&concept_id)
            .bind(name)
            .bind(value)
            .bind(Utc::now().to_rfc3339())
            .execute(&self.pool)
            .await?;
        }

        debug!(identity = %entity.identity, "Concept saved");
        Ok(())
    }

    async fn list(&self) -> Result<Vec<ConceptEntity>> {
        let rows: Vec<ConceptRow> =
            sqlx::query_as("SELECT * FROM concepts ORDER BY created_at ASC, id ASC")
                .fetch_all(&self.pool)
                .await?;

        let mut concepts = Vec::with_capacity(rows.len());
        for row in rows {
            let attributes = self.load_attributes(&row.id).await?;
            concepts.push(row.into_entity(attributes)?);
        }
        Ok(concepts)
    }

    async fn list_by_kind(&self, kind: ConceptKind) -> Result<Vec<ConceptEntity>> {
        let rows: Vec<ConceptRow> =
            sqlx::query_as("SELECT * FROM concepts WHERE kind = ? ORDER BY created_at ASC, id ASC")
                .bind(kind.as_str())
                .fetch_all(&self.pool)
                .await?;

        let mut concepts = Vec::with_capacity(rows.len());
        for row in rows {
            let attributes = self.load_attributes(&row.id).await?;
            concepts.push(row.into_entity(attributes)?);
        }
        Ok(concepts)
    }

    async fn identities(&self) -> Result<Vec<String>> {
        let rows: Vec<(String,)> = sqlx::query_as("SELECT identity FROM concepts ORDER BY identity")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(|(identity,)| identity).collect())
    }

    async fn count(&self) -> Result<u64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM concepts")
            .fetch_one(&self.pool)
            .await?;
        Ok(count as u64)
    }

    async fn stats(&self) -> Result<StoreStats> {
        let (total_concepts,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM concepts")
            .fetch_one(&self.pool)
            .await?;

        let (total_attributes,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM attributes")
            .fetch_one(&self.pool)
            .await?;

        let by_kind: Vec<(String, i64)> =
            sqlx::query_as("SELECT kind, COUNT(*) FROM concepts GROUP BY kind")
                .fetch_all(&self.pool)
                .await?;

        let mut stats = StoreStats {
            total_concepts: total_concepts as u64,
            total_attributes: total_attributes as u64,
            ..Default::default()
        };
        for (kind, count) in by_kind {
            match ConceptKind::parse(&kind) {
                Some(ConceptKind::Noun) => stats.nouns = count as u64,
                Some(ConceptKind::Verb) => stats.verbs = count as u64,
                Some(ConceptKind::Adjective) => stats.adjectives = count as u64,
                None => {
                    return Err(Error::InvalidRecord(format!(
                        "unknown concept kind in store: {}",
                        kind
                    )))
                }
            }
        }
        Ok(stats)
    }
}

// ========== Database Row Types ==========

#[derive(Debug, FromRow)]
struct ConceptRow {
    id: String,
    identity: String,
    kind: String,
    created_at: String,
    updated_at: String,
}

impl ConceptRow {
    fn into_entity(self, attributes: AttributeBag) -> Result<ConceptEntity> {
        let kind = ConceptKind::parse(&self.kind)
            .ok_or_else(|| Error::InvalidRecord(format!("invalid concept kind: {}", self.kind)))?;

        let created_at = DateTime::parse_from_rfc3339(&self.created_at)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now());

        let updated_at = DateTime::parse_from_rfc3339(&self.updated_at)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now());

        Ok(ConceptEntity {
            id: self.id,
            identity: self.identity,
            kind,
            attributes,
            created_at,
            updated_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::migrations::run_migrations;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn setup_test_repo() -> SqliteConceptRepository {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("Failed to create test pool");

        run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        SqliteConceptRepository::new(pool)
    }

    #[tokio::test]
    async fn test_create_or_get_is_idempotent() {
        let repo = setup_test_repo().await;

        let first = repo.create_or_get("dog", ConceptKind::Noun).await.unwrap();
        let second = repo.create_or_get("dog", ConceptKind::Noun).await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(repo.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_stored_kind_wins_on_reget() {
        let repo = setup_test_repo().await;

        repo.create_or_get("run", ConceptKind::Verb).await.unwrap();
        let again = repo.create_or_get("run", ConceptKind::Noun).await.unwrap();

        assert_eq!(again.kind, ConceptKind::Verb);
    }

    #[tokio::test]
    async fn test_save_accumulates_weight_on_repeated_facts() {
        let repo = setup_test_repo().await;

        let mut dog = repo.create_or_get("dog", ConceptKind::Noun).await.unwrap();
        dog.add_attribute("is", "animal");

        // Three saves of the same in-memory pair: one row, weight 3
        repo.save(&dog).await.unwrap();
        repo.save(&dog).await.unwrap();
        repo.save(&dog).await.unwrap();

        let rows: Vec<(String, String, i64)> =
            sqlx::query_as("SELECT name, value, weight FROM attributes")
                .fetch_all(&repo.pool)
                .await
                .unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0], ("is".to_string(), "animal".to_string(), 3));
    }

    #[tokio::test]
    async fn test_load_orders_values_by_weight() {
        let repo = setup_test_repo().await;

        let mut sky = repo.create_or_get("sky", ConceptKind::Noun).await.unwrap();
        sky.add_attribute("is", "blue");
        sky.add_attribute("is", "vast");
        repo.save(&sky).await.unwrap();

        // Reinforce "vast" so it outweighs "blue"
        let mut reinforce = ConceptEntity::new("sky", ConceptKind::Noun);
        reinforce.add_attribute("is", "vast");
        repo.save(&reinforce).await.unwrap();
        repo.save(&reinforce).await.unwrap();

        let loaded = repo.load("sky").await.unwrap().unwrap();
        assert_eq!(loaded.attributes.first("is"), Some("vast"));
        assert_eq!(loaded.attributes.values("is").unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_save_reuses_stored_row_for_fresh_entities() {
        let repo = setup_test_repo().await;

        let original = repo.create_or_get("dog", ConceptKind::Noun).await.unwrap();

        // A fresh entity for the same identity has a different uuid; the
        // stored row and its id must survive the save.
        let mut fresh = ConceptEntity::new("dog", ConceptKind::Noun);
        fresh.add_attribute("is", "animal");
        repo.save(&fresh).await.unwrap();

        let loaded = repo.load("dog").await.unwrap().unwrap();
        assert_eq!(loaded.id, original.id);
        assert_eq!(loaded.attributes.first("is"), Some("animal"));
        assert_eq!(repo.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_list_preserves_creation_order() {
        let repo = setup_test_repo().await;

        repo.create_or_get("alpha", ConceptKind::Noun).await.unwrap();
        repo.create_or_get("beta", ConceptKind::Verb).await.unwrap();
        repo.create_or_get("gamma", ConceptKind::Adjective).await.unwrap();

        let all = repo.list().await.unwrap();
        let identities: Vec<&str> = all.iter().map(|c| c.identity.as_str()).collect();
        assert_eq!(identities, vec!["alpha", "beta", "gamma"]);
    }

    #[tokio::test]
    async fn test_list_by_kind_filters() {
        let repo = setup_test_repo().await;

        repo.create_or_get("dog", ConceptKind::Noun).await.unwrap();
        repo.create_or_get("cat", ConceptKind::Noun).await.unwrap();
        repo.create_or_get("run", ConceptKind::Verb).await.unwrap();

        let nouns = repo.list_by_kind(ConceptKind::Noun).await.unwrap();
        assert_eq!(nouns.len(), 2);
        let verbs = repo.list_by_kind(ConceptKind::Verb).await.unwrap();
        assert_eq!(verbs.len(), 1);
        let adjectives = repo.list_by_kind(ConceptKind::Adjective).await.unwrap();
        assert!(adjectives.is_empty());
    }

    #[tokio::test]
    async fn test_stats_counts_by_kind() {
        let repo = setup_test_repo().await;

        let mut dog = repo.create_or_get("dog", ConceptKind::Noun).await.unwrap();
        dog.add_attribute("is", "animal");
        dog.add_attribute("can_do", "bark");
        repo.save(&dog).await.unwrap();
        repo.create_or_get("run", ConceptKind::Verb).await.unwrap();

        let stats = repo.stats().await.unwrap();
        assert_eq!(stats.total_concepts, 2);
        assert_eq!(stats.nouns, 1);
        assert_eq!(stats.verbs, 1);
        assert_eq!(stats.adjectives, 0);
        assert_eq!(stats.total_attributes, 2);
    }

    #[tokio::test]
    async fn test_distinct_values_keep_separate_rows() {
        let repo = setup_test_repo().await;

        let mut dog = repo.create_or_get("dog", ConceptKind::Noun).await.unwrap();
        dog.add_attribute("is", "animal");
        dog.add_attribute("is_2", "loyal");
        repo.save(&dog).await.unwrap();

        let loaded = repo.load("dog").await.unwrap().unwrap();
        assert_eq!(loaded.attributes.values("is"), Some(&["animal".to_string()][..]));
        assert_eq!(loaded.attributes.values("is_2"), Some(&["loyal".to_string()][..]));
    }
}
