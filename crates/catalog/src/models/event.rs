//! Event model, a convention a circle attends.

use anyhow::{Context, Result};
use serde::Serialize;
use sqlx::PgPool;

/// Event record.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Event {
    pub id: i64,

    /// Display name.
    pub name: String,

    /// Unique URL slug.
    pub slug: String,

    /// Unix timestamp when created.
    pub created: i64,
}

impl Event {
    /// Find an event by slug.
    pub async fn find_by_slug(pool: &PgPool, slug: &str) -> Result<Option<Self>> {
        let event =
            sqlx::query_as::<_, Event>("SELECT id, name, slug, created FROM event WHERE slug = $1")
                .bind(slug)
                .fetch_optional(pool)
                .await
                .context("failed to fetch event by slug")?;

        Ok(event)
    }

    /// List all events, newest first.
    pub async fn list(pool: &PgPool) -> Result<Vec<Self>> {
        let events = sqlx::query_as::<_, Event>(
            "SELECT id, name, slug, created FROM event ORDER BY created DESC",
        )
        .fetch_all(pool)
        .await
        .context("failed to list events")?;

        Ok(events)
    }
}
