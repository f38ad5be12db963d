//! # Compass Core
//!
//! Domain types shared by every Compass crate: the catalog entities the API
//! hands back (solutions, comments, ratings), the JSON envelopes they travel
//! in, and the paging arithmetic used by the feeds.
//!
//! ```text
//! ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//! │   Solution   │   │   Comment    │   │    Rating    │
//! │  (by slug)   │◄──│ OFFICIAL/USER│   │  score 1..=5 │
//! └──────────────┘   └──────────────┘   └──────────────┘
//!         ▲                  │                  │
//!         └──────── ApiResponse / PagedResponse ┘
//! ```

pub mod envelope;
pub mod model;
pub mod page;

pub use envelope::{ApiResponse, ErrorBody, Page, PagedResponse};
pub use model::{
    Comment, CommentType, CurrentUser, NewComment, NewRating, Rating, RatingSummary, Solution,
    MAX_SCORE, MIN_SCORE,
};
pub use page::{PageRequest, PAGE_SIZE};

/// Result type for compass-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while validating or decoding catalog data
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Content is empty")]
    EmptyContent,

    #[error("Score {0} is outside 1..=5")]
    InvalidScore(u8),

    #[error("Response was not successful: {0}")]
    Unsuccessful(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}
