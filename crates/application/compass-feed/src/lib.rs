//! # Compass Feed
//!
//! State behind a solution page: the solution itself plus three
//! independently paginated feeds.
//!
//! ```text
//!                 ┌────────────────────────────┐
//!   open(slug) ──>│       FeedController       │──> Notifier (toasts)
//!                 │                            │──> Session  (login prompt)
//!                 │  solution      StateCell   │
//!                 │  official      Feed<Comment> (1 page max)
//!                 │  user          Feed<Comment>
//!                 │  ratings       Feed<Rating>
//!                 └────────────────────────────┘
//!                              │
//!                          ApiClient
//! ```
//!
//! ## Feed protocol
//!
//! - `reset` empties a feed and bumps its generation
//! - `load_more` is a no-op while a page is in flight or once exhausted
//! - the page index advances only after a successful fetch
//! - results from a superseded generation or after teardown are dropped

pub mod controller;
pub mod feed;
pub mod notify;
pub mod session;
pub mod state;

pub use controller::{FeedController, LoadOutcome, SubmitOutcome};
pub use feed::{Feed, FeedKind, FeedPolicy, FeedState, FeedStatus, PageTicket};
pub use notify::{Level, Notification, NotificationLog, Notifier};
pub use session::{Session, TokenSession};
pub use state::StateCell;
