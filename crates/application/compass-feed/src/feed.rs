//! One paginated list tied to a solution slug.
//!
//! State machine: `Idle → Loading → Idle(has_more)`. A failed load returns
//! to `Idle` with the page index untouched. `reset` moves any state back to
//! an empty `Idle` and bumps the generation so results of requests issued
//! before the reset are ignored.

use crate::state::StateCell;
use compass_core::{Page, PageRequest, PAGE_SIZE};
use std::fmt;
use tracing::{debug, trace};

/// The three feeds of a solution page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeedKind {
    OfficialComments,
    UserComments,
    Ratings,
}

impl FeedKind {
    pub fn all() -> [FeedKind; 3] {
        [
            FeedKind::OfficialComments,
            FeedKind::UserComments,
            FeedKind::Ratings,
        ]
    }

    pub fn label(&self) -> &'static str {
        match self {
            FeedKind::OfficialComments => "official comments",
            FeedKind::UserComments => "comments",
            FeedKind::Ratings => "ratings",
        }
    }
}

impl fmt::Display for FeedKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Paging rules of a feed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedPolicy {
    pub page_size: u32,
    /// Stop after this many pages regardless of the server total
    pub max_pages: Option<u32>,
}

impl FeedPolicy {
    pub fn for_kind(kind: FeedKind) -> Self {
        match kind {
            FeedKind::OfficialComments => Self {
                page_size: PAGE_SIZE,
                max_pages: Some(1),
            },
            FeedKind::UserComments | FeedKind::Ratings => Self::default(),
        }
    }

    fn allows_page(&self, page_index: u32) -> bool {
        self.max_pages.map_or(true, |max| page_index < max)
    }
}

impl Default for FeedPolicy {
    fn default() -> Self {
        Self {
            page_size: PAGE_SIZE,
            max_pages: None,
        }
    }
}

/// Observable state of one feed
#[derive(Debug, Clone, PartialEq)]
pub struct FeedState<T> {
    /// Items in server order
    pub items: Vec<T>,
    /// Pages fetched so far; the next request skips `page_index * page_size`
    pub page_index: u32,
    /// Total reported by the last successful fetch
    pub total: u64,
    pub has_more: bool,
    pub is_loading: bool,
    /// Bumped by every reset
    pub generation: u64,
}

impl<T> FeedState<T> {
    fn empty(generation: u64) -> Self {
        Self {
            items: Vec::new(),
            page_index: 0,
            total: 0,
            has_more: true,
            is_loading: false,
            generation,
        }
    }
}

/// Item-free summary of a feed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedStatus {
    pub kind: FeedKind,
    pub len: usize,
    pub total: u64,
    pub page_index: u32,
    pub has_more: bool,
    pub is_loading: bool,
}

/// Permission to fetch one page, handed out by [`Feed::begin_load`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageTicket {
    pub generation: u64,
    pub page: PageRequest,
}

/// A paginated feed
#[derive(Debug)]
pub struct Feed<T> {
    kind: FeedKind,
    policy: FeedPolicy,
    cell: StateCell<FeedState<T>>,
}

impl<T> Feed<T> {
    pub fn new(kind: FeedKind) -> Self {
        Self::with_policy(kind, FeedPolicy::for_kind(kind))
    }

    pub fn with_policy(kind: FeedKind, policy: FeedPolicy) -> Self {
        Self {
            kind,
            policy,
            cell: StateCell::new(kind.label(), FeedState::empty(0)),
        }
    }

    pub fn kind(&self) -> FeedKind {
        self.kind
    }

    pub fn policy(&self) -> FeedPolicy {
        self.policy
    }

    /// Empty the feed and invalidate outstanding tickets
    pub fn reset(&self) {
        self.cell.update(|state| {
            *state = FeedState::empty(state.generation + 1);
        });
        debug!(feed = %self.kind, "feed reset");
    }

    /// Mark the feed loading and return the page to fetch, or `None` when a
    /// load is already in flight or the feed is exhausted.
    pub fn begin_load(&self) -> Option<PageTicket> {
        let mut ticket = None;
        self.cell.update_if(|state| {
            if state.is_loading || !state.has_more {
                return false;
            }
            state.is_loading = true;
            ticket = Some(PageTicket {
                generation: state.generation,
                page: PageRequest::with_size(state.page_index, self.policy.page_size),
            });
            true
        });

        match &ticket {
            Some(t) => trace!(feed = %self.kind, skip = t.page.skip, "page requested"),
            None => trace!(feed = %self.kind, "load skipped"),
        }
        ticket
    }

    /// Append a fetched page. Returns false when the ticket is stale.
    pub fn complete(&self, ticket: &PageTicket, page: Page<T>) -> bool {
        let kind = self.kind;
        let policy = self.policy;
        self.cell.update_if(|state| {
            if state.generation != ticket.generation {
                return false;
            }
            state.items.extend(page.items);
            state.total = page.total;
            state.page_index += 1;
            state.has_more =
                (state.items.len() as u64) < state.total && policy.allows_page(state.page_index);
            state.is_loading = false;
            debug!(
                feed = %kind,
                len = state.items.len(),
                total = state.total,
                has_more = state.has_more,
                "page appended"
            );
            true
        })
    }

    /// Release the loading flag after a failed fetch. Returns false when the
    /// ticket is stale.
    pub fn fail(&self, ticket: &PageTicket) -> bool {
        self.cell.update_if(|state| {
            if state.generation != ticket.generation {
                return false;
            }
            state.is_loading = false;
            true
        })
    }

    pub fn status(&self) -> FeedStatus {
        self.cell.with(|state| FeedStatus {
            kind: self.kind,
            len: state.items.len(),
            total: state.total,
            page_index: state.page_index,
            has_more: state.has_more,
            is_loading: state.is_loading,
        })
    }

    pub fn subscribe(&self) -> tokio::sync::watch::Receiver<FeedState<T>> {
        self.cell.subscribe()
    }
}

impl<T: Clone> Feed<T> {
    pub fn snapshot(&self) -> FeedState<T> {
        self.cell.get()
    }

    pub fn items(&self) -> Vec<T> {
        self.cell.with(|state| state.items.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(range: std::ops::Range<u32>, total: u64) -> Page<u32> {
        Page::new(range.collect(), total)
    }

    #[test]
    fn test_fresh_feed_is_idle_with_more() {
        let feed: Feed<u32> = Feed::new(FeedKind::UserComments);
        let status = feed.status();
        assert_eq!(status.len, 0);
        assert!(status.has_more);
        assert!(!status.is_loading);
    }

    #[test]
    fn test_pages_accumulate_until_total() {
        let feed = Feed::new(FeedKind::Ratings);

        let t = feed.begin_load().unwrap();
        assert_eq!(t.page, PageRequest { skip: 0, limit: 10 });
        assert!(feed.complete(&t, page(0..10, 25)));
        assert_eq!((feed.status().len, feed.status().has_more), (10, true));

        let t = feed.begin_load().unwrap();
        assert_eq!(t.page.skip, 10);
        assert!(feed.complete(&t, page(10..20, 25)));
        assert_eq!((feed.status().len, feed.status().has_more), (20, true));

        let t = feed.begin_load().unwrap();
        assert_eq!(t.page.skip, 20);
        assert!(feed.complete(&t, page(20..25, 25)));
        assert_eq!((feed.status().len, feed.status().has_more), (25, false));

        assert!(feed.begin_load().is_none());
        assert_eq!(feed.items(), (0..25).collect::<Vec<_>>());
    }

    #[test]
    fn test_in_flight_guard() {
        let feed: Feed<u32> = Feed::new(FeedKind::UserComments);
        let first = feed.begin_load();
        assert!(first.is_some());
        assert!(feed.status().is_loading);
        assert!(feed.begin_load().is_none());
    }

    #[test]
    fn test_failure_releases_without_advancing() {
        let feed: Feed<u32> = Feed::new(FeedKind::UserComments);
        let t = feed.begin_load().unwrap();
        assert!(feed.fail(&t));

        let status = feed.status();
        assert!(!status.is_loading);
        assert!(status.has_more);
        assert_eq!(status.page_index, 0);

        let retry = feed.begin_load().unwrap();
        assert_eq!(retry.page.skip, 0);
    }

    #[test]
    fn test_official_policy_stops_after_one_page() {
        let feed = Feed::new(FeedKind::OfficialComments);
        let t = feed.begin_load().unwrap();
        assert!(feed.complete(&t, page(0..10, 15)));
        assert!(!feed.status().has_more);
        assert!(feed.begin_load().is_none());
    }

    #[test]
    fn test_reset_discards_stale_ticket() {
        let feed = Feed::new(FeedKind::UserComments);
        let t = feed.begin_load().unwrap();
        assert!(feed.complete(&t, page(0..10, 30)));

        let stale = feed.begin_load().unwrap();
        feed.reset();
        let status = feed.status();
        assert_eq!((status.len, status.page_index, status.total), (0, 0, 0));
        assert!(status.has_more && !status.is_loading);

        assert!(!feed.complete(&stale, page(10..20, 30)));
        assert!(!feed.fail(&stale));
        assert_eq!(feed.status().len, 0);

        let fresh = feed.begin_load().unwrap();
        assert_eq!(fresh.page.skip, 0);
        assert_eq!(fresh.generation, stale.generation + 1);
    }

    #[test]
    fn test_subscribers_see_transitions() {
        let feed = Feed::new(FeedKind::Ratings);
        let mut rx = feed.subscribe();

        let t = feed.begin_load().unwrap();
        assert!(rx.has_changed().unwrap());
        assert!(rx.borrow_and_update().is_loading);

        feed.complete(&t, page(0..3, 3));
        let state = rx.borrow_and_update().clone();
        assert_eq!(state.items, vec![0, 1, 2]);
        assert!(!state.has_more);
    }
}
