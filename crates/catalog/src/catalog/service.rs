//! Catalog query service.
//!
//! Orchestrates one listing request: validate the filter, count matching
//! circles (DISTINCT under join fan-out), compute page metadata, fetch the
//! page of denormalized rows, and collapse them into nested aggregates.
//! Pure read path; a `CatalogService` holds only the pool and is shared
//! freely across concurrent requests.

use serde::Serialize;
use sqlx::PgPool;

use super::aggregate::{CircleListing, collapse};
use super::filter::CircleFilter;
use super::pagination::Pagination;
use super::query_builder::CircleQueryBuilder;
use super::raw::CircleRaw;
use crate::error::{CatalogError, CatalogResult};

/// One page of circle listings plus its metadata.
#[derive(Debug, Clone, Serialize)]
pub struct CircleList {
    pub circles: Vec<CircleListing>,
    pub pagination: Pagination,
}

/// Read-side catalog service.
#[derive(Clone)]
pub struct CatalogService {
    pool: PgPool,
}

impl CatalogService {
    /// Create a new CatalogService.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// List circles matching the filter, newest first.
    ///
    /// `acting_user` drives the bookmarked/upvoted overlay flags; anonymous
    /// callers get them unset. A page past the end yields an empty list, not
    /// an error.
    pub async fn list_circles(
        &self,
        filter: &CircleFilter,
        acting_user: Option<i64>,
    ) -> CatalogResult<CircleList> {
        filter.validate()?;
        if filter.bookmarked_only && acting_user.is_none() {
            return Err(CatalogError::InvalidFilter(
                "bookmarked_only requires an acting user".to_string(),
            ));
        }

        let builder = CircleQueryBuilder::new(filter, acting_user);
        self.run(filter, builder).await
    }

    /// List the circles a user has bookmarked, most recently bookmarked
    /// first. The user id comes from the auth collaborator and must be a
    /// real (non-zero) identity.
    pub async fn list_bookmarked_circles(
        &self,
        user_id: i64,
        filter: &CircleFilter,
    ) -> CatalogResult<CircleList> {
        if user_id <= 0 {
            return Err(CatalogError::InvalidFilter(
                "bookmark listing requires an acting user id".to_string(),
            ));
        }
        filter.validate()?;

        let mut bookmarked = filter.clone();
        bookmarked.bookmarked_only = true;

        let builder = CircleQueryBuilder::new(&bookmarked, Some(user_id)).bookmark_ordered();
        self.run(&bookmarked, builder).await
    }

    /// Count, page metadata, row fetch, collapse.
    ///
    /// Both reads share one transaction with a statement timeout; they are
    /// not required to observe a single atomic snapshot (page metadata is
    /// advisory under concurrent writes).
    async fn run(
        &self,
        filter: &CircleFilter,
        builder: CircleQueryBuilder<'_>,
    ) -> CatalogResult<CircleList> {
        let mut tx = self.pool.begin().await.map_err(storage("begin"))?;

        sqlx::query("SET LOCAL statement_timeout = '10s'")
            .execute(&mut *tx)
            .await
            .map_err(storage("statement timeout"))?;

        let total: i64 = sqlx::query_scalar(&builder.build_count())
            .fetch_one(&mut *tx)
            .await
            .map_err(storage("circle count"))?;

        let pagination = Pagination::new(total.max(0) as u64, filter.page, filter.limit);

        let rows: Vec<CircleRaw> = sqlx::query_as(&builder.build_rows())
            .fetch_all(&mut *tx)
            .await
            .map_err(storage("circle page fetch"))?;

        tx.commit().await.map_err(storage("commit"))?;

        Ok(CircleList {
            circles: collapse(rows),
            pagination,
        })
    }
}

/// Log a failed catalog query and wrap the driver error.
fn storage(context: &'static str) -> impl FnOnce(sqlx::Error) -> CatalogError {
    move |e| {
        tracing::error!(error = %e, context, "catalog query failed");
        CatalogError::Storage(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::postgres::PgPoolOptions;

    fn lazy_service() -> CatalogService {
        // connect_lazy never touches the network; validation paths reject
        // bad input before any query would run.
        #[allow(clippy::expect_used)]
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/bancarella_test")
            .expect("lazy pool");
        CatalogService::new(pool)
    }

    fn block_on<F: std::future::Future>(f: F) -> F::Output {
        // The validation paths under test never yield, so polling once on a
        // noop waker is enough; no runtime needed.
        use std::task::{Context, Poll, Waker};
        let mut f = Box::pin(f);
        let waker = Waker::noop();
        let mut cx = Context::from_waker(waker);
        match f.as_mut().poll(&mut cx) {
            Poll::Ready(out) => out,
            Poll::Pending => unreachable!("validation path should not suspend"),
        }
    }

    #[tokio::test]
    async fn invalid_page_rejected_before_any_query() {
        let service = lazy_service();
        let filter = CircleFilter {
            page: 0,
            ..Default::default()
        };
        let result = block_on(service.list_circles(&filter, None));
        assert!(matches!(result, Err(CatalogError::InvalidFilter(_))));
    }

    #[tokio::test]
    async fn oversized_limit_rejected_before_any_query() {
        let service = lazy_service();
        let filter = CircleFilter {
            limit: 50,
            ..Default::default()
        };
        let result = block_on(service.list_circles(&filter, None));
        assert!(matches!(result, Err(CatalogError::InvalidFilter(_))));
    }

    #[tokio::test]
    async fn bookmarked_only_requires_an_acting_user() {
        let service = lazy_service();
        let filter = CircleFilter {
            bookmarked_only: true,
            ..Default::default()
        };
        let result = block_on(service.list_circles(&filter, None));
        assert!(matches!(result, Err(CatalogError::InvalidFilter(_))));
    }

    #[tokio::test]
    async fn bookmark_listing_rejects_anonymous_ids() {
        let service = lazy_service();
        let filter = CircleFilter::default();
        for user_id in [0, -1] {
            let result = block_on(service.list_bookmarked_circles(user_id, &filter));
            assert!(
                matches!(result, Err(CatalogError::InvalidFilter(_))),
                "user id {user_id} must be rejected"
            );
        }
    }
}
