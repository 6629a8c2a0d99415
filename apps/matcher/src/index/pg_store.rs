//! PostgreSQL + pgvector backend.
//!
//! `vector_collections` holds one row per collection (metric, fixed
//! dimensions, next id); `vector_documents` holds the embedded rows.
//! Inserts lock the collection row (`FOR UPDATE`) for the whole transaction,
//! so id assignment is serialized across tasks and processes.

use async_trait::async_trait;
use pgvector::Vector;
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use tracing::info;

use crate::index::metadata::StoredMetadata;
use crate::index::metric::DistanceMetric;
use crate::index::store::{CollectionInfo, EmbeddedDocument, Neighbor, VectorStore};
use crate::index::IndexError;

pub struct PgVectorStore {
    pool: PgPool,
}

#[derive(FromRow)]
struct CollectionRow {
    name: String,
    metric: String,
    dimensions: Option<i32>,
    count: i64,
}

impl CollectionRow {
    fn into_info(self) -> Result<CollectionInfo, IndexError> {
        Ok(CollectionInfo {
            metric: self.metric.parse()?,
            count: self.count as usize,
            dimensions: self.dimensions.map(|d| d as usize),
            name: self.name,
        })
    }
}

#[derive(FromRow)]
struct NeighborRow {
    id: String,
    content: String,
    metadata: Json<StoredMetadata>,
    distance: f32,
}

impl PgVectorStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Enables the `vector` extension and creates both tables when missing.
    pub async fn ensure_schema(&self) -> Result<(), IndexError> {
        sqlx::query("CREATE EXTENSION IF NOT EXISTS vector")
            .execute(&self.pool)
            .await?;
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS vector_collections (
                name       TEXT PRIMARY KEY,
                metric     TEXT NOT NULL,
                dimensions INTEGER,
                next_id    BIGINT NOT NULL DEFAULT 0,
                created_at TIMESTAMPTZ NOT NULL DEFAULT now()
            )
            "#,
        )
        .execute(&self.pool)
        .await?;
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS vector_documents (
                collection TEXT NOT NULL REFERENCES vector_collections (name) ON DELETE CASCADE,
                id         TEXT NOT NULL,
                content    TEXT NOT NULL,
                embedding  VECTOR NOT NULL,
                metadata   JSONB NOT NULL,
                PRIMARY KEY (collection, id)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        info!("pgvector schema ready");
        Ok(())
    }
}

#[async_trait]
impl VectorStore for PgVectorStore {
    async fn create_collection(
        &self,
        name: &str,
        metric: DistanceMetric,
    ) -> Result<CollectionInfo, IndexError> {
        let inserted = sqlx::query(
            "INSERT INTO vector_collections (name, metric) VALUES ($1, $2) ON CONFLICT (name) DO NOTHING",
        )
        .bind(name)
        .bind(metric.to_string())
        .execute(&self.pool)
        .await?;

        if inserted.rows_affected() == 0 {
            return Err(IndexError::CollectionExists(name.to_string()));
        }
        Ok(CollectionInfo {
            name: name.to_string(),
            metric,
            count: 0,
            dimensions: None,
        })
    }

    async fn collection(&self, name: &str) -> Result<CollectionInfo, IndexError> {
        let row: Option<CollectionRow> = sqlx::query_as(
            r#"
            SELECT c.name, c.metric, c.dimensions,
                   (SELECT COUNT(*) FROM vector_documents d WHERE d.collection = c.name) AS count
            FROM vector_collections c
            WHERE c.name = $1
            "#,
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        row.ok_or_else(|| IndexError::CollectionNotFound(name.to_string()))?
            .into_info()
    }

    async fn delete_collection(&self, name: &str) -> Result<(), IndexError> {
        let deleted = sqlx::query("DELETE FROM vector_collections WHERE name = $1")
            .bind(name)
            .execute(&self.pool)
            .await?;
        if deleted.rows_affected() == 0 {
            return Err(IndexError::CollectionNotFound(name.to_string()));
        }
        Ok(())
    }

    async fn insert(
        &self,
        name: &str,
        documents: Vec<EmbeddedDocument>,
    ) -> Result<Vec<String>, IndexError> {
        let Some(first) = documents.first() else {
            return Ok(Vec::new());
        };
        let first_len = first.embedding.len();

        // dropped without commit on any early return, which rolls back
        let mut tx = self.pool.begin().await?;
        let locked: Option<(i64, Option<i32>)> = sqlx::query_as(
            "SELECT next_id, dimensions FROM vector_collections WHERE name = $1 FOR UPDATE",
        )
        .bind(name)
        .fetch_optional(&mut *tx)
        .await?;
        let Some((next_id, dimensions)) = locked else {
            return Err(IndexError::CollectionNotFound(name.to_string()));
        };

        let expected = dimensions.map(|d| d as usize).unwrap_or(first_len);
        if let Some(bad) = documents.iter().find(|d| d.embedding.len() != expected) {
            return Err(IndexError::DimensionMismatch {
                expected,
                actual: bad.embedding.len(),
            });
        }

        let mut ids = Vec::with_capacity(documents.len());
        for (position, document) in documents.into_iter().enumerate() {
            let id = format!("id_{}", next_id + position as i64);
            sqlx::query(
                r#"
                INSERT INTO vector_documents (collection, id, content, embedding, metadata)
                VALUES ($1, $2, $3, $4, $5)
                "#,
            )
            .bind(name)
            .bind(&id)
            .bind(&document.text)
            .bind(Vector::from(document.embedding))
            .bind(Json(&document.metadata))
            .execute(&mut *tx)
            .await?;
            ids.push(id);
        }

        sqlx::query("UPDATE vector_collections SET next_id = $2, dimensions = $3 WHERE name = $1")
            .bind(name)
            .bind(next_id + ids.len() as i64)
            .bind(expected as i32)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        Ok(ids)
    }

    async fn nearest(
        &self,
        name: &str,
        metric: DistanceMetric,
        query: &[f32],
        k: usize,
    ) -> Result<Vec<Neighbor>, IndexError> {
        if k == 0 {
            return Ok(Vec::new());
        }
        let sql = format!(
            r#"
            SELECT id, content, metadata, (embedding {op} $2)::REAL AS distance
            FROM vector_documents
            WHERE collection = $1
            ORDER BY embedding {op} $2
            LIMIT $3
            "#,
            op = metric.operator()
        );
        let rows: Vec<NeighborRow> = sqlx::query_as(&sql)
            .bind(name)
            .bind(Vector::from(query.to_vec()))
            .bind(k as i64)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .into_iter()
            .map(|row| Neighbor {
                id: row.id,
                text: row.content,
                metadata: row.metadata.0,
                distance: row.distance,
            })
            .collect())
    }
}
