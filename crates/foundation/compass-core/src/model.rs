//! Catalog entities as the API returns them.
//!
//! Fields the client never reads are kept in `extra` so a solution can be
//! round-tripped to a renderer without losing data.

use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Lowest score a rating may carry
pub const MIN_SCORE: u8 = 1;

/// Highest score a rating may carry
pub const MAX_SCORE: u8 = 5;

/// A cataloged technology solution, keyed by slug
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Solution {
    pub slug: String,

    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub category: Option<String>,

    #[serde(default)]
    pub tags: Vec<String>,

    /// Server-computed average score
    #[serde(default)]
    pub rating: Option<f64>,

    /// Server-computed number of ratings
    #[serde(default)]
    pub rating_count: u64,

    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Who wrote a comment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CommentType {
    /// Written by the catalog maintainers
    Official,
    /// Written by a regular user
    User,
}

impl CommentType {
    /// Value of the `type` query parameter
    pub fn as_query(&self) -> &'static str {
        match self {
            CommentType::Official => "OFFICIAL",
            CommentType::User => "USER",
        }
    }
}

impl fmt::Display for CommentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_query())
    }
}

/// A comment attached to a solution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    #[serde(default, alias = "_id")]
    pub id: Option<String>,

    pub content: String,

    #[serde(default)]
    pub username: Option<String>,

    #[serde(default)]
    pub full_name: Option<String>,

    #[serde(default, rename = "type")]
    pub comment_type: Option<CommentType>,

    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Comment {
    /// Best display name for the author
    pub fn author(&self) -> &str {
        self.full_name
            .as_deref()
            .or(self.username.as_deref())
            .unwrap_or("anonymous")
    }
}

/// A user's rating of a solution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rating {
    #[serde(default, alias = "_id")]
    pub id: Option<String>,

    #[serde(default)]
    pub solution_slug: Option<String>,

    #[serde(default)]
    pub username: Option<String>,

    #[serde(default)]
    pub full_name: Option<String>,

    pub score: u8,

    #[serde(default)]
    pub comment: Option<String>,

    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Rating {
    pub fn author(&self) -> &str {
        self.full_name
            .as_deref()
            .or(self.username.as_deref())
            .unwrap_or("anonymous")
    }
}

/// Aggregate rating statistics for one solution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingSummary {
    #[serde(default)]
    pub average: f64,

    #[serde(default)]
    pub count: u64,

    /// Number of ratings per score, keyed "1" through "5"
    #[serde(default)]
    pub distribution: BTreeMap<String, u64>,
}

impl RatingSummary {
    /// Count for one score, zero when the server omitted it
    pub fn count_for(&self, score: u8) -> u64 {
        self.distribution
            .get(&score.to_string())
            .copied()
            .unwrap_or(0)
    }
}

impl Default for RatingSummary {
    fn default() -> Self {
        Self {
            average: 0.0,
            count: 0,
            distribution: (MIN_SCORE..=MAX_SCORE).map(|s| (s.to_string(), 0)).collect(),
        }
    }
}

/// The signed-in user as reported by `/users/me`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentUser {
    pub username: String,

    #[serde(default)]
    pub full_name: Option<String>,

    #[serde(default)]
    pub email: Option<String>,

    #[serde(default)]
    pub is_superuser: bool,
}

/// Body of `POST /solutions/{slug}/comments`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewComment {
    pub content: String,
}

impl NewComment {
    /// Trims `content`; whitespace-only text is rejected.
    pub fn new(content: &str) -> Result<Self> {
        let content = content.trim();
        if content.is_empty() {
            return Err(Error::EmptyContent);
        }
        Ok(Self {
            content: content.to_string(),
        })
    }
}

/// Body of `POST /solutions/{slug}/ratings`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRating {
    pub score: u8,
    pub comment: String,
}

impl NewRating {
    pub fn new(score: u8, comment: &str) -> Result<Self> {
        if !(MIN_SCORE..=MAX_SCORE).contains(&score) {
            return Err(Error::InvalidScore(score));
        }
        Ok(Self {
            score,
            comment: comment.trim().to_string(),
        })
    }
}
