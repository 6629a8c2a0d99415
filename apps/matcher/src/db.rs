use anyhow::Result;
use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::index::MatchResult;

/// Creates and returns a PostgreSQL connection pool.
pub async fn create_pool(database_url: &str) -> Result<PgPool> {
    info!("Connecting to PostgreSQL...");

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await?;

    info!("PostgreSQL connection pool established");
    Ok(pool)
}

/// Sink for ranked job matches of one resume.
#[async_trait]
pub trait MatchStore: Send + Sync {
    /// Stores `matches` in rank order and returns the id grouping them.
    async fn save_matches(
        &self,
        resume_path: &str,
        matches: &[MatchResult],
    ) -> Result<Uuid, sqlx::Error>;
}

pub struct PgMatchStore {
    pool: PgPool,
}

impl PgMatchStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Creates the match table when it does not exist yet.
    pub async fn ensure_schema(&self) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS jd_resume_match_result (
                id               BIGSERIAL PRIMARY KEY,
                run_id           UUID NOT NULL,
                resume_path      TEXT NOT NULL,
                job_description  TEXT NOT NULL,
                similarity_score REAL NOT NULL,
                chunk_id         TEXT NOT NULL,
                rank             INTEGER NOT NULL,
                created_at       TIMESTAMPTZ NOT NULL DEFAULT now()
            )
            "#,
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl MatchStore for PgMatchStore {
    async fn save_matches(
        &self,
        resume_path: &str,
        matches: &[MatchResult],
    ) -> Result<Uuid, sqlx::Error> {
        let run_id = Uuid::new_v4();
        let mut tx = self.pool.begin().await?;

        for (rank, result) in matches.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO jd_resume_match_result
                    (run_id, resume_path, job_description, similarity_score, chunk_id, rank)
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(run_id)
            .bind(resume_path)
            .bind(&result.text)
            .bind(result.similarity_score)
            .bind(&result.chunk_id)
            .bind(rank as i32)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        info!(
            "Saved {} match(es) for {resume_path} (run {run_id})",
            matches.len()
        );
        Ok(run_id)
    }
}
