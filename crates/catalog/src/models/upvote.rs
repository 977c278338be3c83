//! User upvote link rows.

use anyhow::{Context, Result};
use serde::Serialize;
use sqlx::PgPool;

/// Upvote record: at most one row per (user, circle) pair.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Upvote {
    pub user_id: i64,
    pub circle_id: i64,

    /// Unix timestamp when created.
    pub created: i64,
}

impl Upvote {
    /// Upvote a circle. A repeat upvote is a no-op; returns whether a row
    /// was actually inserted.
    pub async fn add(pool: &PgPool, user_id: i64, circle_id: i64) -> Result<bool> {
        let now = chrono::Utc::now().timestamp();
        let result = sqlx::query(
            r#"
            INSERT INTO user_upvote (user_id, circle_id, created)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id, circle_id) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(circle_id)
        .bind(now)
        .execute(pool)
        .await
        .context("failed to add upvote")?;

        Ok(result.rows_affected() > 0)
    }

    /// Withdraw an upvote. Returns whether a row was deleted.
    pub async fn remove(pool: &PgPool, user_id: i64, circle_id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM user_upvote WHERE user_id = $1 AND circle_id = $2")
            .bind(user_id)
            .bind(circle_id)
            .execute(pool)
            .await
            .context("failed to remove upvote")?;

        Ok(result.rows_affected() > 0)
    }

    /// Count upvotes for a circle.
    pub async fn count_for_circle(pool: &PgPool, circle_id: i64) -> Result<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM user_upvote WHERE circle_id = $1")
                .bind(circle_id)
                .fetch_one(pool)
                .await
                .context("failed to count upvotes for circle")?;

        Ok(count)
    }
}
