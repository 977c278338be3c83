//! Denormalized join projection.

/// One raw row of the circle listing join: the circle's scalar columns
/// duplicated across every (fandom link x work-type link) combination, plus
/// the joined relation columns and the acting user's overlay columns.
///
/// This is an internal transport shape; it must be collapsed by
/// [`super::aggregate::collapse`] before anything leaves the service.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CircleRaw {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub rating: Option<String>,
    pub day: Option<String>,
    pub published: bool,
    pub verified: bool,
    pub event_id: Option<i64>,
    pub referral_id: Option<i64>,
    pub created: i64,
    pub changed: i64,

    pub fandom_id: Option<i64>,
    pub fandom_name: Option<String>,
    pub work_type_id: Option<i64>,
    pub work_type_name: Option<String>,
    pub event_name: Option<String>,
    pub event_slug: Option<String>,

    /// When the acting user bookmarked this circle, if they did.
    pub bookmarked_at: Option<i64>,

    /// When the acting user upvoted this circle, if they did.
    pub upvoted_at: Option<i64>,
}
