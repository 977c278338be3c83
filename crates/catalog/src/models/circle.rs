//! Circle model, the vendor entity listed in the catalog.

use anyhow::{Context, Result, bail};
use rand::Rng;
use rand::distributions::Alphanumeric;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

/// Content rating classification for a circle's works.
///
/// A circle without a rating is "unrated" and stored as NULL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Rating {
    Ga,
    Pg,
    M,
}

impl Rating {
    /// Storage representation.
    pub fn as_str(self) -> &'static str {
        match self {
            Rating::Ga => "GA",
            Rating::Pg => "PG",
            Rating::M => "M",
        }
    }
}

impl std::str::FromStr for Rating {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "GA" => Ok(Rating::Ga),
            "PG" => Ok(Rating::Pg),
            "M" => Ok(Rating::M),
            other => bail!("unknown rating: {other}"),
        }
    }
}

/// Which convention day(s) the circle attends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttendanceDay {
    First,
    Second,
    Both,
}

impl AttendanceDay {
    /// Storage representation.
    pub fn as_str(self) -> &'static str {
        match self {
            AttendanceDay::First => "first",
            AttendanceDay::Second => "second",
            AttendanceDay::Both => "both",
        }
    }
}

impl std::str::FromStr for AttendanceDay {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "first" => Ok(AttendanceDay::First),
            "second" => Ok(AttendanceDay::Second),
            "both" => Ok(AttendanceDay::Both),
            other => bail!("unknown attendance day: {other}"),
        }
    }
}

/// Circle record.
///
/// `rating` and `day` mirror their storage columns (nullable TEXT); use
/// [`Circle::rating`] / [`Circle::day`] for the typed view.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Circle {
    pub id: i64,

    /// Display name.
    pub name: String,

    /// Unique URL slug, derived once at creation and never recomputed.
    pub slug: String,

    pub rating: Option<String>,

    pub day: Option<String>,

    /// Whether the circle is visible in the public catalog.
    pub published: bool,

    /// Whether the circle passed manual verification.
    pub verified: bool,

    /// Event the circle attends, if any.
    pub event_id: Option<i64>,

    /// Referral code used at signup, if any.
    pub referral_id: Option<i64>,

    /// Unix timestamp when created.
    pub created: i64,

    /// Unix timestamp when last changed.
    pub changed: i64,

    /// Soft-delete marker; live rows have NULL here.
    pub deleted_at: Option<i64>,
}

impl Circle {
    /// Typed view of the rating column. Unknown stored values read as unrated.
    pub fn rating(&self) -> Option<Rating> {
        self.rating.as_deref().and_then(|s| s.parse().ok())
    }

    /// Typed view of the attendance day column.
    pub fn day(&self) -> Option<AttendanceDay> {
        self.day.as_deref().and_then(|s| s.parse().ok())
    }
}

/// Input for creating a circle.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateCircle {
    pub name: String,
    pub rating: Option<Rating>,
    pub day: Option<AttendanceDay>,
    pub event_id: Option<i64>,
    pub referral_id: Option<i64>,
}

/// Input for updating a circle. `None` fields are left unchanged; the slug
/// is never touched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateCircle {
    pub name: Option<String>,
    pub rating: Option<Rating>,
    pub day: Option<AttendanceDay>,
    pub published: Option<bool>,
    pub verified: Option<bool>,
    pub event_id: Option<i64>,
}

const CIRCLE_COLUMNS: &str = "id, name, slug, rating, day, published, verified, event_id, \
     referral_id, created, changed, deleted_at";

/// Length of the random slug disambiguator.
const SLUG_SUFFIX_LEN: usize = 6;

/// Attempts before giving up on finding a free slug.
const SLUG_ATTEMPTS: usize = 3;

/// Convert a circle name into a URL-safe slug.
///
/// Lowercases, replaces non-alphanumeric characters with hyphens, collapses
/// runs, and trims the ends. May return an empty string for pure non-ASCII
/// input; the random disambiguator still yields a usable slug then.
pub fn slugify(name: &str) -> String {
    let mapped: String = name
        .to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect();

    let mut slug = String::with_capacity(mapped.len());
    let mut prev_was_hyphen = true;
    for c in mapped.chars() {
        if c == '-' {
            if !prev_was_hyphen {
                slug.push('-');
            }
            prev_was_hyphen = true;
        } else {
            slug.push(c);
            prev_was_hyphen = false;
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug.truncate(64);
    slug
}

/// Slug candidate: slugified name plus a short random disambiguator.
fn slug_candidate(name: &str) -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(SLUG_SUFFIX_LEN)
        .map(char::from)
        .collect();
    let suffix = suffix.to_ascii_lowercase();

    let base = slugify(name);
    if base.is_empty() {
        suffix
    } else {
        format!("{base}-{suffix}")
    }
}

impl Circle {
    /// Create a new circle with a freshly derived slug.
    pub async fn create(pool: &PgPool, input: CreateCircle) -> Result<Self> {
        let now = chrono::Utc::now().timestamp();
        let slug = Self::generate_slug(pool, &input.name).await?;

        let circle = sqlx::query_as::<_, Circle>(&format!(
            r#"
            INSERT INTO circle (name, slug, rating, day, published, verified, event_id, referral_id, created, changed)
            VALUES ($1, $2, $3, $4, FALSE, FALSE, $5, $6, $7, $7)
            RETURNING {CIRCLE_COLUMNS}
            "#,
        ))
        .bind(&input.name)
        .bind(&slug)
        .bind(input.rating.map(Rating::as_str))
        .bind(input.day.map(AttendanceDay::as_str))
        .bind(input.event_id)
        .bind(input.referral_id)
        .bind(now)
        .fetch_one(pool)
        .await
        .context("failed to create circle")?;

        Ok(circle)
    }

    /// Pick a slug not used by any live circle.
    ///
    /// The random suffix makes collisions vanishingly rare; the retry loop
    /// covers the remainder.
    async fn generate_slug(pool: &PgPool, name: &str) -> Result<String> {
        for _ in 0..SLUG_ATTEMPTS {
            let candidate = slug_candidate(name);
            let taken: bool = sqlx::query_scalar(
                "SELECT EXISTS(SELECT 1 FROM circle WHERE slug = $1 AND deleted_at IS NULL)",
            )
            .bind(&candidate)
            .fetch_one(pool)
            .await
            .context("failed to check slug availability")?;

            if !taken {
                return Ok(candidate);
            }
        }
        bail!("could not find a free slug for '{name}'")
    }

    /// Find a live circle by ID.
    pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<Self>> {
        let circle = sqlx::query_as::<_, Circle>(&format!(
            "SELECT {CIRCLE_COLUMNS} FROM circle WHERE id = $1 AND deleted_at IS NULL",
        ))
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("failed to fetch circle by id")?;

        Ok(circle)
    }

    /// Find a live circle by slug.
    pub async fn find_by_slug(pool: &PgPool, slug: &str) -> Result<Option<Self>> {
        let circle = sqlx::query_as::<_, Circle>(&format!(
            "SELECT {CIRCLE_COLUMNS} FROM circle WHERE slug = $1 AND deleted_at IS NULL",
        ))
        .bind(slug)
        .fetch_optional(pool)
        .await
        .context("failed to fetch circle by slug")?;

        Ok(circle)
    }

    /// Update a circle. Returns None when the circle does not exist.
    pub async fn update(pool: &PgPool, id: i64, input: UpdateCircle) -> Result<Option<Self>> {
        let Some(existing) = Self::find_by_id(pool, id).await? else {
            return Ok(None);
        };

        let now = chrono::Utc::now().timestamp();
        let name = input.name.unwrap_or(existing.name);
        let rating = input
            .rating
            .map(|r| r.as_str().to_string())
            .or(existing.rating);
        let day = input.day.map(|d| d.as_str().to_string()).or(existing.day);
        let published = input.published.unwrap_or(existing.published);
        let verified = input.verified.unwrap_or(existing.verified);
        let event_id = input.event_id.or(existing.event_id);

        let circle = sqlx::query_as::<_, Circle>(&format!(
            r#"
            UPDATE circle
            SET name = $1, rating = $2, day = $3, published = $4, verified = $5, event_id = $6, changed = $7
            WHERE id = $8 AND deleted_at IS NULL
            RETURNING {CIRCLE_COLUMNS}
            "#,
        ))
        .bind(&name)
        .bind(&rating)
        .bind(&day)
        .bind(published)
        .bind(verified)
        .bind(event_id)
        .bind(now)
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("failed to update circle")?;

        Ok(circle)
    }

    /// Soft-delete a circle. Returns whether a live row was affected.
    pub async fn delete(pool: &PgPool, id: i64) -> Result<bool> {
        let now = chrono::Utc::now().timestamp();
        let result =
            sqlx::query("UPDATE circle SET deleted_at = $1 WHERE id = $2 AND deleted_at IS NULL")
                .bind(now)
                .bind(id)
                .execute(pool)
                .await
                .context("failed to delete circle")?;

        Ok(result.rows_affected() > 0)
    }

    /// Replace the circle's fandom links with the given set.
    pub async fn set_fandoms(pool: &PgPool, circle_id: i64, fandom_ids: &[i64]) -> Result<()> {
        let mut tx = pool.begin().await.context("failed to start transaction")?;
        let now = chrono::Utc::now().timestamp();

        sqlx::query("DELETE FROM circle_fandom WHERE circle_id = $1")
            .bind(circle_id)
            .execute(&mut *tx)
            .await
            .context("failed to clear fandom links")?;

        for fandom_id in fandom_ids {
            sqlx::query(
                "INSERT INTO circle_fandom (circle_id, fandom_id, created) VALUES ($1, $2, $3)",
            )
            .bind(circle_id)
            .bind(fandom_id)
            .bind(now)
            .execute(&mut *tx)
            .await
            .context("failed to insert fandom link")?;
        }

        tx.commit().await.context("failed to commit fandom links")?;
        Ok(())
    }

    /// Replace the circle's work-type links with the given set.
    pub async fn set_work_types(pool: &PgPool, circle_id: i64, work_type_ids: &[i64]) -> Result<()> {
        let mut tx = pool.begin().await.context("failed to start transaction")?;
        let now = chrono::Utc::now().timestamp();

        sqlx::query("DELETE FROM circle_work_type WHERE circle_id = $1")
            .bind(circle_id)
            .execute(&mut *tx)
            .await
            .context("failed to clear work-type links")?;

        for work_type_id in work_type_ids {
            sqlx::query(
                "INSERT INTO circle_work_type (circle_id, work_type_id, created) VALUES ($1, $2, $3)",
            )
            .bind(circle_id)
            .bind(work_type_id)
            .bind(now)
            .execute(&mut *tx)
            .await
            .context("failed to insert work-type link")?;
        }

        tx.commit()
            .await
            .context("failed to commit work-type links")?;
        Ok(())
    }
}
