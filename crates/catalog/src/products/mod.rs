//! Product reconciliation engine.
//!
//! A circle's product list is replaced as a whole: the caller sends the
//! target state and this service computes and applies the minimal
//! create/update/delete diff inside one transaction. Either the stored set
//! ends up exactly matching the target, or nothing changes at all.

use sqlx::PgPool;

use crate::error::{CatalogError, CatalogResult};
use crate::models::{Product, ProductSpec};

/// Business cap on products per circle.
pub const MAX_PRODUCTS_PER_CIRCLE: usize = 5;

const PRODUCT_COLUMNS: &str = "id, circle_id, name, image_url, created, changed, deleted_at";

/// Transactional product writer.
#[derive(Clone)]
pub struct ProductService {
    pool: PgPool,
}

impl ProductService {
    /// Create a new ProductService.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Replace a circle's product list with the target specs.
    ///
    /// Specs carrying an id update that product (scoped by circle, so one
    /// circle cannot touch another's rows); specs without an id create new
    /// products; stored products absent from the target are removed.
    /// Returns the resulting live product list.
    ///
    /// All writes run in one read-committed transaction: a failure at any
    /// step (including an update matching zero rows, surfaced as
    /// `NotFound`) rolls everything back. Concurrent calls for the same
    /// circle serialize at the transaction boundary; last commit wins.
    pub async fn replace_products(
        &self,
        circle_id: i64,
        specs: Vec<ProductSpec>,
    ) -> CatalogResult<Vec<Product>> {
        if specs.len() > MAX_PRODUCTS_PER_CIRCLE {
            return Err(CatalogError::LimitExceeded {
                count: specs.len(),
                max: MAX_PRODUCTS_PER_CIRCLE,
            });
        }

        let circle_exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM circle WHERE id = $1 AND deleted_at IS NULL)",
        )
        .bind(circle_id)
        .fetch_one(&self.pool)
        .await
        .map_err(storage("circle lookup"))?;

        if !circle_exists {
            return Err(CatalogError::NotFound);
        }

        let (updates, creates) = partition_specs(specs);
        let now = chrono::Utc::now().timestamp();

        // Dropping the transaction on any early return rolls it back.
        let mut tx = self.pool.begin().await.map_err(storage("begin"))?;

        let mut updated_ids = Vec::with_capacity(updates.len());
        for (id, spec) in updates {
            let result = sqlx::query(
                r#"
                UPDATE product
                SET name = $1, image_url = $2, changed = $3
                WHERE id = $4 AND circle_id = $5 AND deleted_at IS NULL
                "#,
            )
            .bind(&spec.name)
            .bind(&spec.image_url)
            .bind(now)
            .bind(id)
            .bind(circle_id)
            .execute(&mut *tx)
            .await
            .map_err(storage("product update"))?;

            if result.rows_affected() == 0 {
                tracing::warn!(
                    circle_id,
                    product_id = id,
                    "product update matched no rows, aborting reconciliation"
                );
                return Err(CatalogError::NotFound);
            }
            updated_ids.push(id);
        }

        let mut created_ids = Vec::with_capacity(creates.len());
        for spec in creates {
            let id: i64 = sqlx::query_scalar(
                r#"
                INSERT INTO product (circle_id, name, image_url, created, changed)
                VALUES ($1, $2, $3, $4, $4)
                RETURNING id
                "#,
            )
            .bind(circle_id)
            .bind(&spec.name)
            .bind(&spec.image_url)
            .bind(now)
            .fetch_one(&mut *tx)
            .await
            .map_err(storage("product insert"))?;
            created_ids.push(id);
        }

        let current_ids: Vec<i64> =
            sqlx::query_scalar("SELECT id FROM product WHERE circle_id = $1 AND deleted_at IS NULL")
                .bind(circle_id)
                .fetch_all(&mut *tx)
                .await
                .map_err(storage("product id scan"))?;

        let stale = ids_to_delete(&current_ids, &updated_ids, &created_ids);
        if !stale.is_empty() {
            sqlx::query(
                "UPDATE product SET deleted_at = $1, changed = $1 WHERE circle_id = $2 AND id = ANY($3)",
            )
            .bind(now)
            .bind(circle_id)
            .bind(&stale)
            .execute(&mut *tx)
            .await
            .map_err(storage("product delete"))?;
        }

        let finals: Vec<Product> = sqlx::query_as(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM product WHERE circle_id = $1 AND deleted_at IS NULL ORDER BY id ASC",
        ))
        .bind(circle_id)
        .fetch_all(&mut *tx)
        .await
        .map_err(storage("product refetch"))?;

        tx.commit().await.map_err(storage("commit"))?;

        Ok(finals)
    }
}

/// Split target specs into (id, spec) updates and id-less creates,
/// preserving caller order within each group.
fn partition_specs(specs: Vec<ProductSpec>) -> (Vec<(i64, ProductSpec)>, Vec<ProductSpec>) {
    let mut updates = Vec::new();
    let mut creates = Vec::new();
    for spec in specs {
        match spec.id {
            Some(id) => updates.push((id, spec)),
            None => creates.push(spec),
        }
    }
    (updates, creates)
}

/// Stored ids that survived neither an update nor a create this pass.
/// Freshly created rows are never deletion candidates.
fn ids_to_delete(current: &[i64], updated: &[i64], created: &[i64]) -> Vec<i64> {
    current
        .iter()
        .copied()
        .filter(|id| !updated.contains(id) && !created.contains(id))
        .collect()
}

/// Log a failed reconciliation step and wrap the driver error.
fn storage(context: &'static str) -> impl FnOnce(sqlx::Error) -> CatalogError {
    move |e| {
        tracing::error!(error = %e, context, "product reconciliation failed");
        CatalogError::Storage(e)
    }
}
