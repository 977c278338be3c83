//! Product model, a work a circle sells.
//!
//! Products are owned exclusively by one circle and mutated only through
//! [`crate::products::ProductService`], which reconciles the whole list in
//! one transaction.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

/// Product record.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Product {
    pub id: i64,

    /// Owning circle.
    pub circle_id: i64,

    pub name: String,

    /// URL of the product image in object storage.
    pub image_url: String,

    /// Unix timestamp when created.
    pub created: i64,

    /// Unix timestamp when last changed.
    pub changed: i64,

    /// Soft-delete marker; live rows have NULL here.
    pub deleted_at: Option<i64>,
}

/// Caller-supplied target state for one product.
///
/// An `id` means "update that product of mine"; no `id` means "create".
#[derive(Debug, Clone, Deserialize)]
pub struct ProductSpec {
    pub id: Option<i64>,
    pub name: String,
    pub image_url: String,
}

impl Product {
    /// List a circle's live products.
    pub async fn list_for_circle(pool: &PgPool, circle_id: i64) -> Result<Vec<Self>> {
        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, circle_id, name, image_url, created, changed, deleted_at
            FROM product
            WHERE circle_id = $1 AND deleted_at IS NULL
            ORDER BY id ASC
            "#,
        )
        .bind(circle_id)
        .fetch_all(pool)
        .await
        .context("failed to list products for circle")?;

        Ok(products)
    }
}
