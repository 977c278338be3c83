//! Catalog error types.

use thiserror::Error;

/// Errors surfaced by the catalog core.
///
/// `Storage` deliberately displays nothing driver-specific; the wrapped
/// `sqlx::Error` stays available through `source()` for logging. Status-code
/// mapping belongs to the HTTP collaborator, not this crate.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Filter input rejected before any query executes.
    #[error("invalid filter: {0}")]
    InvalidFilter(String),

    /// The requested circle or product does not exist (or is not owned by
    /// the circle it was addressed through).
    #[error("not found")]
    NotFound,

    /// A product list exceeded the per-circle cap.
    #[error("product limit exceeded: {count} (maximum {max})")]
    LimitExceeded { count: usize, max: usize },

    /// An underlying query or transaction failed.
    #[error("storage error")]
    Storage(#[from] sqlx::Error),
}

/// Result type alias using CatalogError.
pub type CatalogResult<T> = Result<T, CatalogError>;
