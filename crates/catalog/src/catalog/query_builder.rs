//! Circle listing query builder using SeaQuery.
//!
//! Renders three PostgreSQL statements from one validated [`CircleFilter`]:
//! a circle count, a page window of circle ids, and the denormalized join
//! that the aggregator collapses. The page window is always applied to
//! circles, never to fan-out rows, so a page holds exactly `limit` circles
//! regardless of how many fandom/work-type links each one carries.

use sea_query::{
    Alias, Asterisk, Expr, Func, Iden, Order, PostgresQueryBuilder, Query,
    SelectStatement, SimpleExpr,
};

use super::filter::CircleFilter;

#[derive(Iden)]
enum Circle {
    Table,
    Id,
    Name,
    Slug,
    Rating,
    Day,
    Published,
    Verified,
    EventId,
    ReferralId,
    Created,
    Changed,
    DeletedAt,
}

#[derive(Iden)]
enum Fandom {
    Table,
    Id,
    Name,
}

#[derive(Iden)]
enum WorkType {
    Table,
    Id,
    Name,
}

#[derive(Iden)]
enum Event {
    Table,
    Id,
    Name,
    Slug,
}

#[derive(Iden)]
enum CircleFandom {
    Table,
    CircleId,
    FandomId,
}

#[derive(Iden)]
enum CircleWorkType {
    Table,
    CircleId,
    WorkTypeId,
}

#[derive(Iden)]
enum UserBookmark {
    Table,
    UserId,
    CircleId,
    Created,
}

#[derive(Iden)]
enum UserUpvote {
    Table,
    UserId,
    CircleId,
    Created,
}

/// Listing order for the page window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ListingOrder {
    /// Newest circles first (default catalog order).
    Created,
    /// Most recently bookmarked first (bookmark listing).
    BookmarkedAt,
}

/// Query builder for circle listings.
pub struct CircleQueryBuilder<'a> {
    filter: &'a CircleFilter,
    acting_user: Option<i64>,
    order: ListingOrder,
}

impl<'a> CircleQueryBuilder<'a> {
    /// Create a builder ordering by circle creation time.
    pub fn new(filter: &'a CircleFilter, acting_user: Option<i64>) -> Self {
        Self {
            filter,
            acting_user,
            order: ListingOrder::Created,
        }
    }

    /// Switch to bookmark-creation-time ordering (bookmark listing).
    pub fn bookmark_ordered(mut self) -> Self {
        self.order = ListingOrder::BookmarkedAt;
        self
    }

    /// Whether the active predicate produces multiple rows per circle, so
    /// circle counts must deduplicate.
    pub fn needs_distinct(&self) -> bool {
        self.filter.needs_distinct()
    }

    /// Build the count query: `COUNT(DISTINCT circle.id)` under join
    /// fan-out, plain `COUNT(*)` otherwise.
    pub fn build_count(&self) -> String {
        let mut query = Query::select();

        if self.needs_distinct() {
            query.expr(Func::count_distinct(Expr::col((Circle::Table, Circle::Id))));
        } else {
            query.expr(Expr::col(Asterisk).count());
        }

        query.from(Circle::Table);
        self.add_filter_joins(&mut query);
        self.add_conditions(&mut query);

        query.to_string(PostgresQueryBuilder)
    }

    /// Build the denormalized row query for the requested page.
    ///
    /// One output row per (circle x fandom link x work-type link); the page
    /// window lives in an id subquery so the outer fan-out cannot shrink or
    /// split a page of circles.
    pub fn build_rows(&self) -> String {
        let mut query = Query::select();

        query.columns([
            (Circle::Table, Circle::Id),
            (Circle::Table, Circle::Name),
            (Circle::Table, Circle::Slug),
            (Circle::Table, Circle::Rating),
            (Circle::Table, Circle::Day),
            (Circle::Table, Circle::Published),
            (Circle::Table, Circle::Verified),
            (Circle::Table, Circle::EventId),
            (Circle::Table, Circle::ReferralId),
            (Circle::Table, Circle::Created),
            (Circle::Table, Circle::Changed),
        ]);
        query.expr_as(Expr::col((Fandom::Table, Fandom::Id)), Alias::new("fandom_id"));
        query.expr_as(
            Expr::col((Fandom::Table, Fandom::Name)),
            Alias::new("fandom_name"),
        );
        query.expr_as(
            Expr::col((WorkType::Table, WorkType::Id)),
            Alias::new("work_type_id"),
        );
        query.expr_as(
            Expr::col((WorkType::Table, WorkType::Name)),
            Alias::new("work_type_name"),
        );
        query.expr_as(Expr::col((Event::Table, Event::Name)), Alias::new("event_name"));
        query.expr_as(Expr::col((Event::Table, Event::Slug)), Alias::new("event_slug"));

        query.from(Circle::Table);
        query.left_join(
            CircleFandom::Table,
            Expr::col((CircleFandom::Table, CircleFandom::CircleId))
                .equals((Circle::Table, Circle::Id)),
        );
        query.left_join(
            Fandom::Table,
            Expr::col((Fandom::Table, Fandom::Id))
                .equals((CircleFandom::Table, CircleFandom::FandomId)),
        );
        query.left_join(
            CircleWorkType::Table,
            Expr::col((CircleWorkType::Table, CircleWorkType::CircleId))
                .equals((Circle::Table, Circle::Id)),
        );
        query.left_join(
            WorkType::Table,
            Expr::col((WorkType::Table, WorkType::Id))
                .equals((CircleWorkType::Table, CircleWorkType::WorkTypeId)),
        );
        query.left_join(
            Event::Table,
            Expr::col((Event::Table, Event::Id)).equals((Circle::Table, Circle::EventId)),
        );

        if let Some(user_id) = self.acting_user {
            query.expr_as(
                Expr::col((UserBookmark::Table, UserBookmark::Created)),
                Alias::new("bookmarked_at"),
            );
            query.expr_as(
                Expr::col((UserUpvote::Table, UserUpvote::Created)),
                Alias::new("upvoted_at"),
            );
            query.left_join(
                UserBookmark::Table,
                Expr::col((UserBookmark::Table, UserBookmark::CircleId))
                    .equals((Circle::Table, Circle::Id))
                    .and(Expr::col((UserBookmark::Table, UserBookmark::UserId)).eq(user_id)),
            );
            query.left_join(
                UserUpvote::Table,
                Expr::col((UserUpvote::Table, UserUpvote::CircleId))
                    .equals((Circle::Table, Circle::Id))
                    .and(Expr::col((UserUpvote::Table, UserUpvote::UserId)).eq(user_id)),
            );
        } else {
            // Anonymous: no overlay joins, but the projection shape stays fixed.
            query.expr_as(Expr::cust("CAST(NULL AS BIGINT)"), Alias::new("bookmarked_at"));
            query.expr_as(Expr::cust("CAST(NULL AS BIGINT)"), Alias::new("upvoted_at"));
        }

        query.and_where(Expr::col((Circle::Table, Circle::Id)).in_subquery(self.page_ids_query()));

        match self.order {
            ListingOrder::BookmarkedAt if self.acting_user.is_some() => {
                query.order_by((UserBookmark::Table, UserBookmark::Created), Order::Desc);
            }
            _ => {
                query.order_by((Circle::Table, Circle::Created), Order::Desc);
            }
        }

        query.to_string(PostgresQueryBuilder)
    }

    /// The page window subquery: ids of the circles on the requested page.
    fn page_ids_query(&self) -> SelectStatement {
        let mut query = Query::select();

        query.column((Circle::Table, Circle::Id));
        query.from(Circle::Table);
        self.add_filter_joins(&mut query);
        self.add_conditions(&mut query);

        // Join fan-out would repeat ids and corrupt LIMIT/OFFSET; grouping by
        // the primary key collapses the window back to one row per circle.
        if self.needs_distinct() {
            query.group_by_col((Circle::Table, Circle::Id));
        }

        match self.order {
            ListingOrder::BookmarkedAt if self.acting_user.is_some() => {
                if self.needs_distinct() {
                    query.order_by_expr(
                        Func::max(Expr::col((UserBookmark::Table, UserBookmark::Created))).into(),
                        Order::Desc,
                    );
                } else {
                    query.order_by((UserBookmark::Table, UserBookmark::Created), Order::Desc);
                }
            }
            _ => {
                query.order_by((Circle::Table, Circle::Created), Order::Desc);
            }
        }

        query.limit(u64::from(self.filter.limit));
        query.offset(self.filter.offset());

        query
    }

    /// Joins the active predicate needs. Count and page-window queries join
    /// only what their filters reference; the full display joins live in
    /// [`Self::build_rows`].
    fn add_filter_joins(&self, query: &mut SelectStatement) {
        if !self.filter.fandom_ids.is_empty() {
            query.inner_join(
                CircleFandom::Table,
                Expr::col((CircleFandom::Table, CircleFandom::CircleId))
                    .equals((Circle::Table, Circle::Id)),
            );
        }
        if !self.filter.work_type_ids.is_empty() {
            query.inner_join(
                CircleWorkType::Table,
                Expr::col((CircleWorkType::Table, CircleWorkType::CircleId))
                    .equals((Circle::Table, Circle::Id)),
            );
        }
        if self.event_slug().is_some() {
            query.inner_join(
                Event::Table,
                Expr::col((Event::Table, Event::Id)).equals((Circle::Table, Circle::EventId)),
            );
        }
        if self.filter.bookmarked_only || self.order == ListingOrder::BookmarkedAt {
            // User ids are positive; an absent acting user matches no rows.
            let user_id = self.acting_user.unwrap_or(0);
            query.inner_join(
                UserBookmark::Table,
                Expr::col((UserBookmark::Table, UserBookmark::CircleId))
                    .equals((Circle::Table, Circle::Id))
                    .and(Expr::col((UserBookmark::Table, UserBookmark::UserId)).eq(user_id)),
            );
        }
    }

    /// Apply the predicate conditions.
    fn add_conditions(&self, query: &mut SelectStatement) {
        for condition in self.conditions() {
            query.and_where(condition);
        }
    }

    /// The normalized predicate: one entry per active filter, soft-deleted
    /// circles always excluded, absent fields contributing nothing.
    fn conditions(&self) -> Vec<SimpleExpr> {
        let mut conditions = Vec::new();

        conditions.push(Expr::col((Circle::Table, Circle::DeletedAt)).is_null());

        if let Some(term) = self.filter.search_term() {
            let pattern = format!("%{}%", escape_like_wildcards(&term.to_lowercase()));
            conditions.push(
                Expr::expr(Func::lower(Expr::col((Circle::Table, Circle::Name)))).like(pattern),
            );
        }

        if !self.filter.ratings.is_empty() {
            let col = Expr::col((Circle::Table, Circle::Rating));
            if self.filter.ratings.len() == 1 {
                conditions.push(col.eq(self.filter.ratings[0].as_str()));
            } else {
                conditions.push(col.is_in(self.filter.ratings.iter().map(|r| r.as_str())));
            }
        }

        if let Some(day) = self.filter.day {
            conditions.push(Expr::col((Circle::Table, Circle::Day)).eq(day.as_str()));
        }

        if !self.filter.fandom_ids.is_empty() {
            conditions.push(
                Expr::col((CircleFandom::Table, CircleFandom::FandomId))
                    .is_in(self.filter.fandom_ids.iter().copied()),
            );
        }

        if !self.filter.work_type_ids.is_empty() {
            conditions.push(
                Expr::col((CircleWorkType::Table, CircleWorkType::WorkTypeId))
                    .is_in(self.filter.work_type_ids.iter().copied()),
            );
        }

        if let Some(slug) = self.event_slug() {
            conditions.push(Expr::col((Event::Table, Event::Slug)).eq(slug));
        }

        conditions
    }

    /// Event slug filter, if one is actually present.
    fn event_slug(&self) -> Option<&str> {
        self.filter
            .event_slug
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

/// Escape SQL LIKE wildcard characters (`%`, `_`, `\`) in a value.
fn escape_like_wildcards(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}
