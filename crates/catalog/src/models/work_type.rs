//! Work-type reference taxonomy (prints, doujinshi, acrylic goods, ...).

use anyhow::{Context, Result};
use serde::Serialize;
use sqlx::PgPool;

/// Work-type record.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct WorkType {
    pub id: i64,

    pub name: String,

    /// Unix timestamp when created.
    pub created: i64,
}

impl WorkType {
    /// Find a work type by ID.
    pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<Self>> {
        let work_type =
            sqlx::query_as::<_, WorkType>("SELECT id, name, created FROM work_type WHERE id = $1")
                .bind(id)
                .fetch_optional(pool)
                .await
                .context("failed to fetch work type by id")?;

        Ok(work_type)
    }

    /// List all work types, alphabetically.
    pub async fn list(pool: &PgPool) -> Result<Vec<Self>> {
        let work_types = sqlx::query_as::<_, WorkType>(
            "SELECT id, name, created FROM work_type ORDER BY name ASC",
        )
        .fetch_all(pool)
        .await
        .context("failed to list work types")?;

        Ok(work_types)
    }
}
