//! Circle catalog query engine.
//!
//! This module provides:
//! - CircleFilter: validated, strongly typed search filters
//! - CircleQueryBuilder: SeaQuery-based SQL generation
//! - collapse: join fan-out rows -> nested circle aggregates
//! - Pagination: page metadata arithmetic
//! - CatalogService: orchestration of one listing request

mod aggregate;
mod filter;
mod pagination;
mod query_builder;
mod raw;
mod service;

pub use aggregate::{CircleListing, EventRef, FandomRef, WorkTypeRef, collapse};
pub use filter::{CircleFilter, MAX_PAGE_SIZE};
pub use pagination::Pagination;
pub use query_builder::CircleQueryBuilder;
pub use raw::CircleRaw;
pub use service::{CatalogService, CircleList};
