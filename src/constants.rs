//! Shared constants used across the service.

use std::time::Duration;

/// Weight of the primary (subject + body + tags) sub-model in the combined
/// recommendation score.
pub const PRIMARY_MODEL_WEIGHT: f64 = 0.4;

/// Weight of each of the instructor-answer, student-answer and followup
/// sub-models.
pub const SECONDARY_MODEL_WEIGHT: f64 = 0.2;

/// Minimum combined score a post must exceed to appear in recommendations.
pub const SCORE_THRESHOLD: f64 = 0.1;

/// Default maximum age of a course's in-memory sub-models before they are
/// reloaded from the model store.
pub const DEFAULT_MODEL_RELOAD_DELAY: Duration = Duration::from_secs(150);

/// Default interval between background sync passes.
pub const DEFAULT_SYNC_INTERVAL: Duration = Duration::from_secs(120);

/// Default timeout for a single forum-source HTTP request. A hung fetch fails
/// the sync pass instead of wedging it.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// User agent sent on forum API requests.
pub const SYNC_USER_AGENT: &str = concat!("forum-recommender/", env!("CARGO_PKG_VERSION"));
