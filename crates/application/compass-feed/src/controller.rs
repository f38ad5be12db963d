//! Solution page controller.
//!
//! Owns the current solution, its rating summary and the three feeds, and
//! turns every I/O failure into exactly one notification. Nothing here
//! returns an error to the caller; outcomes are reported as plain enums so
//! front-ends and tests can branch on them.

use crate::feed::{Feed, FeedKind, FeedStatus};
use crate::notify::{Notification, Notifier};
use crate::session::Session;
use crate::state::StateCell;
use compass_client::ApiClient;
use compass_core::{
    Comment, CommentType, NewComment, NewRating, Page, PageRequest, Rating, RatingSummary,
    Solution, MAX_SCORE, MIN_SCORE,
};
use std::future::Future;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Result of one `load_more`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Page appended
    Loaded { appended: usize },
    /// No request issued: loading, exhausted, or no slug open
    Skipped,
    /// Request failed; notified
    Failed,
    /// Answer arrived for a feed that was reset meanwhile
    Discarded,
    /// Controller torn down
    Cancelled,
}

/// Result of a comment or rating submission
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    Submitted,
    /// Empty input; nothing sent
    Skipped,
    /// Validation warning raised; nothing sent
    Rejected,
    /// Server answered 401; login prompt raised
    LoginRequired,
    /// Request failed; notified
    Failed,
    Cancelled,
}

/// Draft input of the comment and rating forms
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Compose {
    pub comment: String,
    pub rating_score: u8,
    pub rating_comment: String,
}

pub struct FeedController {
    api: ApiClient,
    notifier: Arc<dyn Notifier>,
    session: Arc<dyn Session>,

    slug: StateCell<Option<String>>,
    solution: StateCell<Option<Solution>>,
    summary: StateCell<Option<RatingSummary>>,
    my_rating: StateCell<Option<Rating>>,
    compose: StateCell<Compose>,

    official: Feed<Comment>,
    user_comments: Feed<Comment>,
    ratings: Feed<Rating>,

    teardown: CancellationToken,
}

impl FeedController {
    pub fn new(api: ApiClient, notifier: Arc<dyn Notifier>, session: Arc<dyn Session>) -> Self {
        Self {
            api,
            notifier,
            session,
            slug: StateCell::new("slug", None),
            solution: StateCell::new("solution", None),
            summary: StateCell::new("rating_summary", None),
            my_rating: StateCell::new("my_rating", None),
            compose: StateCell::new("compose", Compose::default()),
            official: Feed::new(FeedKind::OfficialComments),
            user_comments: Feed::new(FeedKind::UserComments),
            ratings: Feed::new(FeedKind::Ratings),
            teardown: CancellationToken::new(),
        }
    }

    // ============== State access ==============

    pub fn slug(&self) -> Option<String> {
        self.slug.get()
    }

    pub fn solution(&self) -> Option<Solution> {
        self.solution.get()
    }

    pub fn summary(&self) -> Option<RatingSummary> {
        self.summary.get()
    }

    /// The signed-in user's own rating of the open solution
    pub fn my_rating(&self) -> Option<Rating> {
        self.my_rating.get()
    }

    pub fn compose(&self) -> Compose {
        self.compose.get()
    }

    pub fn set_comment_draft(&self, text: &str) {
        self.compose.update(|c| c.comment = text.to_string());
    }

    pub fn set_rating_draft(&self, score: u8, comment: &str) {
        self.compose.update(|c| {
            c.rating_score = score;
            c.rating_comment = comment.to_string();
        });
    }

    pub fn official_comments(&self) -> &Feed<Comment> {
        &self.official
    }

    pub fn user_comments(&self) -> &Feed<Comment> {
        &self.user_comments
    }

    pub fn ratings(&self) -> &Feed<Rating> {
        &self.ratings
    }

    pub fn status(&self, kind: FeedKind) -> FeedStatus {
        match kind {
            FeedKind::OfficialComments => self.official.status(),
            FeedKind::UserComments => self.user_comments.status(),
            FeedKind::Ratings => self.ratings.status(),
        }
    }

    // ============== Navigation ==============

    /// Show `slug`: load the solution, its summary and the first page of
    /// every feed. Call again whenever the slug changes.
    pub async fn open(&self, slug: &str) {
        if self.teardown.is_cancelled() {
            return;
        }
        if self.slug.get().as_deref() != Some(slug) {
            debug!(slug, "switching solution");
            self.solution.set(None);
            self.summary.set(None);
            self.my_rating.set(None);
            self.compose.set(Compose::default());
        }
        self.slug.set(Some(slug.to_string()));

        tokio::join!(
            self.load_solution(slug),
            self.load_summary(slug),
            self.load_my_rating(slug),
            self.reset_and_load_all(slug),
        );
    }

    /// Point the feeds at `slug` and empty them without fetching
    pub fn reset_all(&self, slug: &str) {
        self.slug.set(Some(slug.to_string()));
        self.official.reset();
        self.user_comments.reset();
        self.ratings.reset();
    }

    /// Empty every feed, then fetch the first page of each concurrently
    pub async fn reset_and_load_all(&self, slug: &str) {
        self.reset_all(slug);
        tokio::join!(
            self.load_more(FeedKind::OfficialComments),
            self.load_more(FeedKind::UserComments),
            self.load_more(FeedKind::Ratings),
        );
    }

    /// Cancel everything in flight; later calls do nothing
    pub fn teardown(&self) {
        debug!(slug = ?self.slug.get(), "controller torn down");
        self.teardown.cancel();
    }

    // ============== Loading ==============

    /// Fetch the next page of `kind`
    pub async fn load_more(&self, kind: FeedKind) -> LoadOutcome {
        let Some(slug) = self.slug.get() else {
            return LoadOutcome::Skipped;
        };
        let api = self.api.clone();

        match kind {
            FeedKind::OfficialComments => {
                self.load_page(&self.official, move |page| async move {
                    api.comments(&slug, CommentType::Official, page).await
                })
                .await
            }
            FeedKind::UserComments => {
                self.load_page(&self.user_comments, move |page| async move {
                    api.comments(&slug, CommentType::User, page).await
                })
                .await
            }
            FeedKind::Ratings => {
                self.load_page(&self.ratings, move |page| async move {
                    api.ratings(&slug, page).await
                })
                .await
            }
        }
    }

    async fn load_page<T, F, Fut>(&self, feed: &Feed<T>, fetch: F) -> LoadOutcome
    where
        F: FnOnce(PageRequest) -> Fut,
        Fut: Future<Output = compass_client::Result<Page<T>>>,
    {
        if self.teardown.is_cancelled() {
            return LoadOutcome::Cancelled;
        }
        let Some(ticket) = feed.begin_load() else {
            return LoadOutcome::Skipped;
        };

        let result = tokio::select! {
            biased;
            _ = self.teardown.cancelled() => return LoadOutcome::Cancelled,
            result = fetch(ticket.page) => result,
        };

        match result {
            Ok(page) => {
                let appended = page.items.len();
                if feed.complete(&ticket, page) {
                    LoadOutcome::Loaded { appended }
                } else {
                    debug!(feed = %feed.kind(), "stale page dropped");
                    LoadOutcome::Discarded
                }
            }
            Err(e) => {
                if !feed.fail(&ticket) {
                    debug!(feed = %feed.kind(), error = %e, "stale failure dropped");
                    return LoadOutcome::Discarded;
                }
                warn!(feed = %feed.kind(), error = %e, "page load failed");
                self.notifier
                    .notify(Notification::error(format!("Failed to load {}", feed.kind())));
                LoadOutcome::Failed
            }
        }
    }

    /// Fetch the solution entity; returns whether it was stored
    pub async fn load_solution(&self, slug: &str) -> bool {
        if self.teardown.is_cancelled() {
            return false;
        }
        let result = tokio::select! {
            biased;
            _ = self.teardown.cancelled() => return false,
            result = self.api.solution(slug) => result,
        };
        if !self.is_current(slug) {
            debug!(slug, "stale solution dropped");
            return false;
        }

        match result {
            Ok(solution) => {
                self.solution.set(Some(solution));
                true
            }
            Err(e) => {
                warn!(slug, error = %e, "solution load failed");
                self.notifier
                    .notify(Notification::error("Failed to load solution"));
                false
            }
        }
    }

    /// Fetch rating statistics. Failures clear the summary and are only
    /// logged.
    pub async fn load_summary(&self, slug: &str) -> bool {
        if self.teardown.is_cancelled() {
            return false;
        }
        let result = tokio::select! {
            biased;
            _ = self.teardown.cancelled() => return false,
            result = self.api.rating_summary(slug) => result,
        };
        if !self.is_current(slug) {
            return false;
        }

        match result {
            Ok(summary) => {
                self.summary.set(Some(summary));
                true
            }
            Err(e) => {
                warn!(slug, error = %e, "rating summary unavailable");
                self.summary.set(None);
                false
            }
        }
    }

    /// Fetch the caller's own rating. Skipped without a session; failures
    /// clear it and are only logged.
    pub async fn load_my_rating(&self, slug: &str) -> bool {
        if self.teardown.is_cancelled() || !self.session.is_authenticated() {
            return false;
        }
        let result = tokio::select! {
            biased;
            _ = self.teardown.cancelled() => return false,
            result = self.api.my_rating(slug) => result,
        };
        if !self.is_current(slug) {
            return false;
        }

        match result {
            Ok(rating) => {
                self.my_rating.set(rating);
                true
            }
            Err(e) => {
                warn!(slug, error = %e, "own rating unavailable");
                self.my_rating.set(None);
                false
            }
        }
    }

    // ============== Mutations ==============

    /// Post a comment. Whitespace-only text is ignored.
    pub async fn submit_comment(&self, slug: &str, text: &str) -> SubmitOutcome {
        let Ok(comment) = NewComment::new(text) else {
            debug!(slug, "empty comment ignored");
            return SubmitOutcome::Skipped;
        };
        if self.teardown.is_cancelled() {
            return SubmitOutcome::Cancelled;
        }

        let result = tokio::select! {
            biased;
            _ = self.teardown.cancelled() => return SubmitOutcome::Cancelled,
            result = self.api.post_comment(slug, &comment) => result,
        };

        match result {
            Ok(()) => {
                info!(slug, "comment posted");
                self.compose.update(|c| c.comment.clear());
                self.notifier
                    .notify(Notification::success("Comment posted"));
                if self.is_current(slug) {
                    self.reload_comments().await;
                }
                SubmitOutcome::Submitted
            }
            Err(e) if e.is_unauthorized() => {
                info!(slug, "comment rejected: not signed in");
                self.session.prompt_login();
                SubmitOutcome::LoginRequired
            }
            Err(e) => {
                warn!(slug, error = %e, "comment failed");
                self.notifier
                    .notify(Notification::error("Failed to post comment"));
                SubmitOutcome::Failed
            }
        }
    }

    /// Rate the solution. Requires a session and a score in 1..=5.
    pub async fn submit_rating(&self, slug: &str, score: u8, comment: &str) -> SubmitOutcome {
        if !self.session.is_authenticated() {
            self.notifier
                .notify(Notification::warning("Please log in to rate this solution"));
            return SubmitOutcome::Rejected;
        }
        if score == 0 {
            self.notifier
                .notify(Notification::warning("Please select a rating"));
            return SubmitOutcome::Rejected;
        }
        let rating = match NewRating::new(score, comment) {
            Ok(rating) => rating,
            Err(e) => {
                debug!(slug, error = %e, "rating rejected");
                self.notifier.notify(Notification::warning(format!(
                    "Rating must be between {MIN_SCORE} and {MAX_SCORE}"
                )));
                return SubmitOutcome::Rejected;
            }
        };
        if self.teardown.is_cancelled() {
            return SubmitOutcome::Cancelled;
        }

        let result = tokio::select! {
            biased;
            _ = self.teardown.cancelled() => return SubmitOutcome::Cancelled,
            result = self.api.post_rating(slug, &rating) => result,
        };

        match result {
            Ok(()) => {
                info!(slug, score, "rating submitted");
                self.compose.update(|c| {
                    c.rating_score = 0;
                    c.rating_comment.clear();
                });
                self.notifier
                    .notify(Notification::success("Rating submitted"));
                if self.is_current(slug) {
                    // Aggregates on the solution are server-computed
                    self.ratings.reset();
                    tokio::join!(
                        self.load_more(FeedKind::Ratings),
                        self.load_solution(slug),
                        self.load_summary(slug),
                        self.load_my_rating(slug),
                    );
                }
                SubmitOutcome::Submitted
            }
            Err(e) => {
                warn!(slug, error = %e, "rating failed");
                let message = e
                    .detail()
                    .map(str::to_string)
                    .unwrap_or_else(|| "Failed to submit rating".to_string());
                self.notifier.notify(Notification::error(message));
                SubmitOutcome::Failed
            }
        }
    }

    async fn reload_comments(&self) {
        self.official.reset();
        self.user_comments.reset();
        tokio::join!(
            self.load_more(FeedKind::OfficialComments),
            self.load_more(FeedKind::UserComments),
        );
    }

    /// `slug` is the open solution, or nothing is open yet
    fn is_current(&self, slug: &str) -> bool {
        self.slug
            .with(|current| current.as_deref().map_or(true, |c| c == slug))
    }
}
