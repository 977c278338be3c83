//! Collapse denormalized join rows into nested circle aggregates.

use std::collections::HashMap;

use serde::Serialize;

use super::raw::CircleRaw;
use crate::models::{AttendanceDay, Rating};

/// A fandom attached to a circle listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FandomRef {
    pub id: i64,
    pub name: String,
}

/// A work type attached to a circle listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkTypeRef {
    pub id: i64,
    pub name: String,
}

/// The event a circle attends, as shown in listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventRef {
    pub id: i64,
    pub name: String,
    pub slug: String,
}

/// One circle in a listing: scalar fields, deduplicated relations, and the
/// acting user's overlay flags.
#[derive(Debug, Clone, Serialize)]
pub struct CircleListing {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub rating: Option<Rating>,
    pub day: Option<AttendanceDay>,
    pub published: bool,
    pub verified: bool,
    pub event: Option<EventRef>,
    pub fandoms: Vec<FandomRef>,
    pub work_types: Vec<WorkTypeRef>,
    pub bookmarked: bool,
    pub bookmarked_at: Option<i64>,
    pub upvoted: bool,
    pub created: i64,
    pub changed: i64,
}

impl CircleListing {
    /// Materialize a listing from the scalar columns of one raw row. The
    /// relation collections start empty; overlays start unset.
    fn from_scalars(row: &CircleRaw) -> Self {
        let event = match (row.event_id, &row.event_name, &row.event_slug) {
            (Some(id), Some(name), Some(slug)) => Some(EventRef {
                id,
                name: name.clone(),
                slug: slug.clone(),
            }),
            _ => None,
        };

        Self {
            id: row.id,
            name: row.name.clone(),
            slug: row.slug.clone(),
            rating: row.rating.as_deref().and_then(|s| s.parse().ok()),
            day: row.day.as_deref().and_then(|s| s.parse().ok()),
            published: row.published,
            verified: row.verified,
            event,
            fandoms: Vec::new(),
            work_types: Vec::new(),
            bookmarked: false,
            bookmarked_at: None,
            upvoted: false,
            created: row.created,
            changed: row.changed,
        }
    }
}

/// Collapse raw join rows into one aggregate per circle.
///
/// Output order is first-seen order of each circle id, kept with a vector
/// plus an id-to-index map. Per circle, fandoms and work types behave as
/// insertion-ordered sets; overlay fields come from the first row that
/// carries a non-null value. The same circle id never appears twice in the
/// result, no matter how far the join fanned out.
pub fn collapse(rows: Vec<CircleRaw>) -> Vec<CircleListing> {
    let mut listings: Vec<CircleListing> = Vec::new();
    let mut index: HashMap<i64, usize> = HashMap::new();

    for row in rows {
        let slot = match index.get(&row.id) {
            Some(&slot) => slot,
            None => {
                index.insert(row.id, listings.len());
                listings.push(CircleListing::from_scalars(&row));
                listings.len() - 1
            }
        };
        let listing = &mut listings[slot];

        if let (Some(id), Some(name)) = (row.fandom_id, row.fandom_name) {
            if !listing.fandoms.iter().any(|f| f.id == id) {
                listing.fandoms.push(FandomRef { id, name });
            }
        }

        if let (Some(id), Some(name)) = (row.work_type_id, row.work_type_name) {
            if !listing.work_types.iter().any(|w| w.id == id) {
                listing.work_types.push(WorkTypeRef { id, name });
            }
        }

        if listing.bookmarked_at.is_none() && row.bookmarked_at.is_some() {
            listing.bookmarked_at = row.bookmarked_at;
            listing.bookmarked = true;
        }
        if !listing.upvoted && row.upvoted_at.is_some() {
            listing.upvoted = true;
        }
    }

    listings
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(id: i64, fandom: Option<(i64, &str)>, work_type: Option<(i64, &str)>) -> CircleRaw {
        CircleRaw {
            id,
            name: format!("circle-{id}"),
            slug: format!("circle-{id}-abc123"),
            rating: Some("GA".to_string()),
            day: Some("first".to_string()),
            published: true,
            verified: false,
            event_id: None,
            referral_id: None,
            created: 1_700_000_000 + id,
            changed: 1_700_000_000 + id,
            fandom_id: fandom.map(|(fid, _)| fid),
            fandom_name: fandom.map(|(_, n)| n.to_string()),
            work_type_id: work_type.map(|(wid, _)| wid),
            work_type_name: work_type.map(|(_, n)| n.to_string()),
            event_name: None,
            event_slug: None,
            bookmarked_at: None,
            upvoted_at: None,
        }
    }

    #[test]
    fn empty_input_collapses_to_nothing() {
        assert!(collapse(Vec::new()).is_empty());
    }

    #[test]
    fn fanout_rows_collapse_to_one_listing() {
        // 3 fandoms x 2 work types = 6 raw rows for one circle.
        let mut rows = Vec::new();
        for f in [(1, "alpha"), (2, "beta"), (3, "gamma")] {
            for w in [(10, "prints"), (20, "doujinshi")] {
                rows.push(raw(1, Some(f), Some(w)));
            }
        }

        let listings = collapse(rows);
        assert_eq!(listings.len(), 1);
        assert_eq!(
            listings[0].fandoms.iter().map(|f| f.id).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
        assert_eq!(
            listings[0]
                .work_types
                .iter()
                .map(|w| w.id)
                .collect::<Vec<_>>(),
            vec![10, 20]
        );
    }

    #[test]
    fn no_duplicate_circles_even_when_rows_interleave() {
        let rows = vec![
            raw(1, Some((1, "alpha")), None),
            raw(2, Some((1, "alpha")), None),
            raw(1, Some((2, "beta")), None),
            raw(2, Some((2, "beta")), None),
            raw(1, Some((1, "alpha")), None),
        ];

        let listings = collapse(rows);
        let ids: Vec<i64> = listings.iter().map(|l| l.id).collect();
        assert_eq!(ids, vec![1, 2], "first-seen order, no repeats");
        assert_eq!(listings[0].fandoms.len(), 2, "repeat link rows deduplicate");
    }

    #[test]
    fn first_seen_order_is_preserved() {
        let rows = vec![
            raw(30, None, None),
            raw(10, None, None),
            raw(20, None, None),
        ];
        let ids: Vec<i64> = collapse(rows).iter().map(|l| l.id).collect();
        assert_eq!(ids, vec![30, 10, 20]);
    }

    #[test]
    fn null_relations_contribute_nothing() {
        let listings = collapse(vec![raw(1, None, None)]);
        assert_eq!(listings.len(), 1);
        assert!(listings[0].fandoms.is_empty());
        assert!(listings[0].work_types.is_empty());
    }

    #[test]
    fn overlays_come_from_first_non_null_row() {
        let mut first = raw(1, Some((1, "alpha")), None);
        first.upvoted_at = Some(5);
        let mut second = raw(1, Some((2, "beta")), None);
        second.bookmarked_at = Some(1_700_000_123);
        let mut third = raw(1, Some((3, "gamma")), None);
        third.bookmarked_at = Some(999);

        let listings = collapse(vec![first, second, third]);
        assert_eq!(listings.len(), 1);
        assert!(listings[0].bookmarked);
        assert_eq!(
            listings[0].bookmarked_at,
            Some(1_700_000_123),
            "first non-null value wins"
        );
        assert!(listings[0].upvoted);
    }

    #[test]
    fn scalar_fields_copied_once() {
        let mut row = raw(7, Some((1, "alpha")), None);
        row.event_id = Some(3);
        row.event_name = Some("Summer Fest".to_string());
        row.event_slug = Some("summer-fest".to_string());

        let listings = collapse(vec![row]);
        let listing = &listings[0];
        assert_eq!(listing.rating, Some(Rating::Ga));
        assert_eq!(listing.day, Some(AttendanceDay::First));
        assert_eq!(
            listing.event,
            Some(EventRef {
                id: 3,
                name: "Summer Fest".to_string(),
                slug: "summer-fest".to_string(),
            })
        );
    }

    #[test]
    fn listing_serializes_with_nested_relations() {
        let listings = collapse(vec![raw(1, Some((1, "alpha")), Some((10, "prints")))]);
        let json = serde_json::to_value(&listings[0]).unwrap();
        assert_eq!(json["rating"], "GA");
        assert_eq!(json["fandoms"][0]["name"], "alpha");
        assert_eq!(json["work_types"][0]["id"], 10);
        assert_eq!(json["bookmarked"], false);
    }
}
