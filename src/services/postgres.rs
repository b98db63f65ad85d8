use crate::services::visitors::{Visit, VisitorSummary};
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Row};
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur when interacting with PostgreSQL
#[derive(Debug, Error)]
pub enum PostgresError {
    #[error("SQLx error: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    MigrateError(#[from] sqlx::migrate::MigrateError),
}

/// PostgreSQL backend for the visitor counter and visit log
///
/// The counter lives in a single-row table so the total survives visit log
/// pruning; every visit bumps it and appends to `visit_log` in one
/// transaction.
pub struct PostgresClient {
    pool: PgPool,
}

impl PostgresClient {
    /// Create a new PostgreSQL client from a connection string
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self, PostgresError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(Duration::from_secs(5))
            .idle_timeout(Duration::from_secs(600))
            .test_before_acquire(true)
            .connect(database_url)
            .await?;

        // Run migrations on startup
        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self { pool })
    }

    /// Record a visit and return the new total
    pub async fn record_visit(&self, visit: &Visit) -> Result<i64, PostgresError> {
        let mut tx = self.pool.begin().await?;

        let total: i64 = sqlx::query(
            r#"
            UPDATE visitor_counter
            SET total = total + 1, updated_at = NOW()
            WHERE id = 1
            RETURNING total
            "#,
        )
        .fetch_one(&mut *tx)
        .await?
        .get("total");

        sqlx::query(
            r#"
            INSERT INTO visit_log (id, path, ip, user_agent, referrer, visited_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(visit.id)
        .bind(&visit.path)
        .bind(&visit.ip)
        .bind(&visit.user_agent)
        .bind(&visit.referrer)
        .bind(visit.visited_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::debug!("Recorded visit to {} (total {})", visit.path, total);
        Ok(total)
    }

    /// Total, today's count and the most recent visits
    pub async fn summary(&self, limit: u32) -> Result<VisitorSummary, PostgresError> {
        let total: i64 = sqlx::query("SELECT total FROM visitor_counter WHERE id = 1")
            .fetch_optional(&self.pool)
            .await?
            .map(|row| row.get("total"))
            .unwrap_or(0);

        let today: i64 = sqlx::query(
            r#"
            SELECT COUNT(*) AS today
            FROM visit_log
            WHERE visited_at >= date_trunc('day', NOW())
            "#,
        )
        .fetch_one(&self.pool)
        .await?
        .get("today");

        let rows = sqlx::query(
            r#"
            SELECT id, path, ip, user_agent, referrer, visited_at
            FROM visit_log
            ORDER BY visited_at DESC
            LIMIT $1
            "#,
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        let recent = rows
            .iter()
            .map(|row| Visit {
                id: row.get("id"),
                path: row.get("path"),
                ip: row.get("ip"),
                user_agent: row.get("user_agent"),
                referrer: row.get("referrer"),
                visited_at: row.get("visited_at"),
            })
            .collect();

        Ok(VisitorSummary { total, today, recent })
    }

    /// Health check for the database connection
    pub async fn health_check(&self) -> Result<bool, PostgresError> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map(|_| true)
            .map_err(Into::into)
    }
}
