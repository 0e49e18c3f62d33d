use serde::{Deserialize, Serialize};

/// A normalized forum post, the unit record of a course mirror.
///
/// `body` and all answer/followup texts are plain text with HTML already
/// stripped by the normalizer. List-valued fields live in JSON columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub course_id: String,
    pub post_id: i64,
    pub created: String,
    pub modified: String,
    pub subject: String,
    pub body: String,
    pub tags: Vec<String>,
    pub post_type: Option<String>,
    pub student_answer: Option<Answer>,
    pub instructor_answer: Option<Answer>,
    pub followups: Vec<Followup>,
    pub num_views: i64,
    pub num_unresolved_followups: i64,
    pub resolved: bool,
    pub assignees: Vec<String>,
    /// SHA-256 over the watched fields, used to detect changes on re-sync.
    pub content_hash: String,
}

/// A student or instructor answer attached to a post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    pub text: String,
    pub author_id: Option<String>,
    pub created: Option<String>,
}

/// A followup discussion on a post, with its response thread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Followup {
    pub text: String,
    pub responses: Vec<String>,
}

/// A course row: sync watermark plus denormalized counters.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Course {
    pub course_id: String,
    /// RFC 3339 checkpoint of the last successful sync pass, if any.
    pub last_sync_at: Option<String>,
    pub num_posts: i64,
    pub num_students: i64,
    pub created_at: String,
}
