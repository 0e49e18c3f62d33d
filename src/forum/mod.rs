//! External forum source: the collaborator the synchronizer pulls from.
//!
//! The source is an HTTP JSON API in production ([`HttpForumSource`]); the
//! trait exists so the sync engine can be exercised against fakes in tests.

mod http;
mod types;

pub use http::HttpForumSource;
pub use types::*;

use std::collections::HashSet;

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceError {
    /// The source reports the post as deleted or never existing.
    #[error("post {post_id} not found")]
    NotFound { post_id: i64 },
    /// The source refuses access to the post (private).
    #[error("post {post_id} is not accessible")]
    Forbidden { post_id: i64 },
    /// The source answered with an unexpected status.
    #[error("forum API returned status {status}")]
    Http { status: u16 },
    /// The source could not be reached at all (timeout, DNS, connect).
    #[error("forum source unreachable: {0}")]
    Unreachable(#[from] reqwest::Error),
    /// The source answered with a body we could not parse.
    #[error("malformed forum response: {0}")]
    Malformed(#[from] serde_json::Error),
}

impl SourceError {
    /// Whether the error means the post is gone for good (tombstone it),
    /// as opposed to a transient failure that should fail the sync pass.
    #[must_use]
    pub fn is_gone(&self) -> bool {
        matches!(self, Self::NotFound { .. } | Self::Forbidden { .. })
    }
}

/// Read-only view of the upstream forum.
#[async_trait]
pub trait ForumSource: Send + Sync {
    /// Posts created or modified after `since` (RFC 3339).
    async fn get_changes(
        &self,
        course_id: &str,
        since: &str,
    ) -> Result<Vec<PostRef>, SourceError>;

    /// The complete set of post ids currently visible in the course.
    async fn get_full_id_listing(&self, course_id: &str) -> Result<HashSet<i64>, SourceError>;

    /// Full detail for one post. Deleted/private posts surface as
    /// [`SourceError::NotFound`] / [`SourceError::Forbidden`], or as an
    /// active response whose status says so.
    async fn get_post_detail(&self, course_id: &str, post_id: i64)
        -> Result<RawPost, SourceError>;

    /// Course-level counters (enrollment, totals).
    async fn get_statistics(&self, course_id: &str) -> Result<CourseStatistics, SourceError>;
}
