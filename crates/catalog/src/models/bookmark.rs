//! User bookmark link rows.

use anyhow::{Context, Result};
use serde::Serialize;
use sqlx::PgPool;

/// Bookmark record: at most one row per (user, circle) pair.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Bookmark {
    pub user_id: i64,
    pub circle_id: i64,

    /// Unix timestamp when created.
    pub created: i64,
}

impl Bookmark {
    /// Bookmark a circle for a user. A repeat bookmark is a no-op; returns
    /// whether a row was actually inserted.
    pub async fn add(pool: &PgPool, user_id: i64, circle_id: i64) -> Result<bool> {
        let now = chrono::Utc::now().timestamp();
        let result = sqlx::query(
            r#"
            INSERT INTO user_bookmark (user_id, circle_id, created)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id, circle_id) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(circle_id)
        .bind(now)
        .execute(pool)
        .await
        .context("failed to add bookmark")?;

        Ok(result.rows_affected() > 0)
    }

    /// Remove a bookmark. Returns whether a row was deleted.
    pub async fn remove(pool: &PgPool, user_id: i64, circle_id: i64) -> Result<bool> {
        let result =
            sqlx::query("DELETE FROM user_bookmark WHERE user_id = $1 AND circle_id = $2")
                .bind(user_id)
                .bind(circle_id)
                .execute(pool)
                .await
                .context("failed to remove bookmark")?;

        Ok(result.rows_affected() > 0)
    }
}
