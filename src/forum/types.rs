use serde::{Deserialize, Serialize};

/// Visibility/lifecycle state the source reports for a post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    Active,
    Deleted,
    Private,
}

impl PostStatus {
    /// Whether the post should be removed from (or never enter) the mirror.
    #[must_use]
    pub fn is_gone(self) -> bool {
        matches!(self, Self::Deleted | Self::Private)
    }
}

/// A post as the forum source serves it: HTML content, typed children for
/// answers and followups. The normalizer turns this into a flat [`crate::db::Post`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawPost {
    pub id: i64,
    pub status: PostStatus,
    pub created: String,
    pub modified: String,
    #[serde(rename = "type")]
    pub post_type: Option<String>,
    pub subject: String,
    /// HTML body.
    pub content: String,
    #[serde(default)]
    pub folders: Vec<String>,
    #[serde(default)]
    pub num_views: i64,
    #[serde(default)]
    pub resolved: bool,
    #[serde(default)]
    pub assignees: Vec<String>,
    #[serde(default)]
    pub children: Vec<RawChild>,
}

/// A child node of a post: an answer, a followup, or a followup response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawChild {
    #[serde(rename = "type")]
    pub child_type: ChildType,
    /// HTML content of the child.
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub author_id: Option<String>,
    #[serde(default)]
    pub created: Option<String>,
    /// Followups carry their own resolution flag.
    #[serde(default)]
    pub resolved: bool,
    /// Responses to a followup.
    #[serde(default)]
    pub children: Vec<RawChild>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChildType {
    StudentAnswer,
    InstructorAnswer,
    Followup,
    Feedback,
}

/// A change-feed entry: a post that was created or modified after the
/// requested watermark.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostRef {
    pub post_id: i64,
    pub modified: String,
}

/// Course-level counters the source exposes.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct CourseStatistics {
    pub total_posts: i64,
    pub num_students: i64,
}
