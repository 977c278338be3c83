//! Database models.

pub mod bookmark;
pub mod circle;
pub mod event;
pub mod fandom;
pub mod product;
pub mod upvote;
pub mod work_type;

pub use bookmark::Bookmark;
pub use circle::{AttendanceDay, Circle, CreateCircle, Rating, UpdateCircle};
pub use event::Event;
pub use fandom::Fandom;
pub use product::{Product, ProductSpec};
pub use upvote::Upvote;
pub use work_type::WorkType;
