//! Fandom reference taxonomy.
//!
//! Administrative CRUD for fandoms lives outside this crate; the catalog
//! only reads them (filter sources and join targets).

use anyhow::{Context, Result};
use serde::Serialize;
use sqlx::PgPool;

/// Fandom record.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Fandom {
    pub id: i64,

    pub name: String,

    /// Hidden fandoms are kept out of filter listings but remain joinable.
    pub visible: bool,

    /// Unix timestamp when created.
    pub created: i64,
}

impl Fandom {
    /// Find a fandom by ID.
    pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<Self>> {
        let fandom = sqlx::query_as::<_, Fandom>(
            "SELECT id, name, visible, created FROM fandom WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("failed to fetch fandom by id")?;

        Ok(fandom)
    }

    /// List visible fandoms, alphabetically.
    pub async fn list_visible(pool: &PgPool) -> Result<Vec<Self>> {
        let fandoms = sqlx::query_as::<_, Fandom>(
            "SELECT id, name, visible, created FROM fandom WHERE visible = TRUE ORDER BY name ASC",
        )
        .fetch_all(pool)
        .await
        .context("failed to list fandoms")?;

        Ok(fandoms)
    }
}
