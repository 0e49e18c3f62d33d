use std::collections::{HashMap, HashSet};

use anyhow::{Context, Result};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use super::models::{Answer, Course, Followup, Post};
use crate::model::vectorizer::{SparseMatrix, TfidfVectorizer};
use crate::model::{SubModel, SubModelKind};

// ========== Courses ==========

/// Get a course row, if the course has been seen before.
pub async fn get_course(pool: &SqlitePool, course_id: &str) -> Result<Option<Course>> {
    sqlx::query_as("SELECT * FROM courses WHERE course_id = ?")
        .bind(course_id)
        .fetch_optional(pool)
        .await
        .context("Failed to fetch course")
}

/// Whether a course is known to the store.
pub async fn course_exists(pool: &SqlitePool, course_id: &str) -> Result<bool> {
    Ok(get_course(pool, course_id).await?.is_some())
}

/// The checkpoint of the course's last successful sync, if any.
pub async fn get_checkpoint(pool: &SqlitePool, course_id: &str) -> Result<Option<String>> {
    Ok(get_course(pool, course_id)
        .await?
        .and_then(|c| c.last_sync_at))
}

// ========== Posts ==========

/// Get a single post.
pub async fn get_post(pool: &SqlitePool, course_id: &str, post_id: i64) -> Result<Option<Post>> {
    let row = sqlx::query("SELECT * FROM posts WHERE course_id = ? AND post_id = ?")
        .bind(course_id)
        .bind(post_id)
        .fetch_optional(pool)
        .await
        .context("Failed to fetch post")?;

    row.map(|r| post_from_row(&r)).transpose()
}

/// Get all posts of a course, ordered by post id for deterministic corpus
/// construction.
pub async fn get_all_posts(pool: &SqlitePool, course_id: &str) -> Result<Vec<Post>> {
    let rows = sqlx::query("SELECT * FROM posts WHERE course_id = ? ORDER BY post_id")
        .bind(course_id)
        .fetch_all(pool)
        .await
        .context("Failed to fetch posts")?;

    rows.iter().map(post_from_row).collect()
}

/// The exact set of post ids currently persisted for a course.
pub async fn get_all_post_ids(pool: &SqlitePool, course_id: &str) -> Result<HashSet<i64>> {
    let rows: Vec<(i64,)> = sqlx::query_as("SELECT post_id FROM posts WHERE course_id = ?")
        .bind(course_id)
        .fetch_all(pool)
        .await
        .context("Failed to fetch post ids")?;

    Ok(rows.into_iter().map(|(id,)| id).collect())
}

/// Content hashes of all persisted posts, keyed by post id. Used by the
/// synchronizer to skip upserts for unchanged posts.
pub async fn get_post_content_hashes(
    pool: &SqlitePool,
    course_id: &str,
) -> Result<HashMap<i64, String>> {
    let rows: Vec<(i64, String)> =
        sqlx::query_as("SELECT post_id, content_hash FROM posts WHERE course_id = ?")
            .bind(course_id)
            .fetch_all(pool)
            .await
            .context("Failed to fetch post content hashes")?;

    Ok(rows.into_iter().collect())
}

/// Number of posts persisted for a course.
pub async fn count_posts(pool: &SqlitePool, course_id: &str) -> Result<i64> {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM posts WHERE course_id = ?")
        .bind(course_id)
        .fetch_one(pool)
        .await
        .context("Failed to count posts")?;

    Ok(count)
}

/// Apply one sync pass's staged writes as a single transaction: post upserts,
/// post deletions, and the course row update (checkpoint + counters). Either
/// everything commits or nothing does, which keeps the persisted id set and
/// the checkpoint consistent with each other.
pub async fn apply_sync_batch(
    pool: &SqlitePool,
    course_id: &str,
    upserts: &[Post],
    deleted_ids: &[i64],
    checkpoint: &str,
    num_students: i64,
) -> Result<()> {
    let mut tx = pool.begin().await.context("Failed to begin sync batch")?;

    sqlx::query("INSERT OR IGNORE INTO courses (course_id) VALUES (?)")
        .bind(course_id)
        .execute(&mut *tx)
        .await
        .context("Failed to ensure course row")?;

    for post in upserts {
        upsert_post(&mut tx, post).await?;
    }

    for post_id in deleted_ids {
        sqlx::query("DELETE FROM posts WHERE course_id = ? AND post_id = ?")
            .bind(course_id)
            .bind(post_id)
            .execute(&mut *tx)
            .await
            .context("Failed to delete post")?;
    }

    let (num_posts,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM posts WHERE course_id = ?")
        .bind(course_id)
        .fetch_one(&mut *tx)
        .await
        .context("Failed to recount posts")?;

    sqlx::query(
        r"
        UPDATE courses
        SET last_sync_at = ?, num_posts = ?, num_students = ?
        WHERE course_id = ?
        ",
    )
    .bind(checkpoint)
    .bind(num_posts)
    .bind(num_students)
    .bind(course_id)
    .execute(&mut *tx)
    .await
    .context("Failed to update course row")?;

    tx.commit().await.context("Failed to commit sync batch")?;

    Ok(())
}

async fn upsert_post(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    post: &Post,
) -> Result<()> {
    let tags = serde_json::to_string(&post.tags).context("Failed to encode tags")?;
    let student_answer = post
        .student_answer
        .as_ref()
        .map(serde_json::to_string)
        .transpose()
        .context("Failed to encode student answer")?;
    let instructor_answer = post
        .instructor_answer
        .as_ref()
        .map(serde_json::to_string)
        .transpose()
        .context("Failed to encode instructor answer")?;
    let followups = serde_json::to_string(&post.followups).context("Failed to encode followups")?;
    let assignees = serde_json::to_string(&post.assignees).context("Failed to encode assignees")?;

    sqlx::query(
        r"
        INSERT INTO posts (
            course_id, post_id, created, modified, subject, body, tags, post_type,
            student_answer, instructor_answer, followups, num_views,
            num_unresolved_followups, resolved, assignees, content_hash
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT (course_id, post_id) DO UPDATE SET
            created = excluded.created,
            modified = excluded.modified,
            subject = excluded.subject,
            body = excluded.body,
            tags = excluded.tags,
            post_type = excluded.post_type,
            student_answer = excluded.student_answer,
            instructor_answer = excluded.instructor_answer,
            followups = excluded.followups,
            num_views = excluded.num_views,
            num_unresolved_followups = excluded.num_unresolved_followups,
            resolved = excluded.resolved,
            assignees = excluded.assignees,
            content_hash = excluded.content_hash,
            synced_at = datetime('now')
        ",
    )
    .bind(&post.course_id)
    .bind(post.post_id)
    .bind(&post.created)
    .bind(&post.modified)
    .bind(&post.subject)
    .bind(&post.body)
    .bind(tags)
    .bind(&post.post_type)
    .bind(student_answer)
    .bind(instructor_answer)
    .bind(followups)
    .bind(post.num_views)
    .bind(post.num_unresolved_followups)
    .bind(post.resolved)
    .bind(assignees)
    .bind(&post.content_hash)
    .execute(&mut **tx)
    .await
    .context("Failed to upsert post")?;

    Ok(())
}

fn post_from_row(row: &SqliteRow) -> Result<Post> {
    let tags: String = row.try_get("tags")?;
    let student_answer: Option<String> = row.try_get("student_answer")?;
    let instructor_answer: Option<String> = row.try_get("instructor_answer")?;
    let followups: String = row.try_get("followups")?;
    let assignees: String = row.try_get("assignees")?;

    Ok(Post {
        course_id: row.try_get("course_id")?,
        post_id: row.try_get("post_id")?,
        created: row.try_get("created")?,
        modified: row.try_get("modified")?,
        subject: row.try_get("subject")?,
        body: row.try_get("body")?,
        tags: serde_json::from_str(&tags).context("Failed to decode tags")?,
        post_type: row.try_get("post_type")?,
        student_answer: decode_answer(student_answer.as_deref())?,
        instructor_answer: decode_answer(instructor_answer.as_deref())?,
        followups: serde_json::from_str::<Vec<Followup>>(&followups)
            .context("Failed to decode followups")?,
        num_views: row.try_get("num_views")?,
        num_unresolved_followups: row.try_get("num_unresolved_followups")?,
        resolved: row.try_get("resolved")?,
        assignees: serde_json::from_str(&assignees).context("Failed to decode assignees")?,
        content_hash: row.try_get("content_hash")?,
    })
}

fn decode_answer(raw: Option<&str>) -> Result<Option<Answer>> {
    raw.map(serde_json::from_str)
        .transpose()
        .context("Failed to decode answer")
}

// ========== Sub-model artifacts ==========

/// Persist a sub-model as one atomic row per `(course_id, kind)`.
pub async fn put_model(
    pool: &SqlitePool,
    course_id: &str,
    kind: SubModelKind,
    vectorizer: &TfidfVectorizer,
    matrix: &SparseMatrix,
    post_ids: &[i64],
) -> Result<()> {
    let vectorizer_json =
        serde_json::to_string(vectorizer).context("Failed to encode vectorizer")?;
    let matrix_json = serde_json::to_string(matrix).context("Failed to encode matrix")?;
    let post_ids_json = serde_json::to_string(post_ids).context("Failed to encode post id list")?;

    sqlx::query(
        r"
        INSERT INTO models (course_id, kind, vectorizer, matrix, post_ids, built_at)
        VALUES (?, ?, ?, ?, ?, datetime('now'))
        ON CONFLICT (course_id, kind) DO UPDATE SET
            vectorizer = excluded.vectorizer,
            matrix = excluded.matrix,
            post_ids = excluded.post_ids,
            built_at = excluded.built_at
        ",
    )
    .bind(course_id)
    .bind(kind.as_str())
    .bind(vectorizer_json)
    .bind(matrix_json)
    .bind(post_ids_json)
    .execute(pool)
    .await
    .context("Failed to persist sub-model")?;

    Ok(())
}

/// Load a sub-model, or `None` if no artifact is persisted for the kind.
pub async fn get_model(
    pool: &SqlitePool,
    course_id: &str,
    kind: SubModelKind,
) -> Result<Option<SubModel>> {
    let row: Option<(String, String, String)> = sqlx::query_as(
        "SELECT vectorizer, matrix, post_ids FROM models WHERE course_id = ? AND kind = ?",
    )
    .bind(course_id)
    .bind(kind.as_str())
    .fetch_optional(pool)
    .await
    .context("Failed to fetch sub-model")?;

    let Some((vectorizer, matrix, post_ids)) = row else {
        return Ok(None);
    };

    Ok(Some(SubModel {
        vectorizer: serde_json::from_str(&vectorizer).context("Failed to decode vectorizer")?,
        matrix: serde_json::from_str(&matrix).context("Failed to decode matrix")?,
        post_ids: serde_json::from_str(&post_ids).context("Failed to decode post id list")?,
    }))
}

/// Remove a persisted sub-model. Used when a rebuild finds the kind's corpus
/// empty, so stale artifacts never outlive the posts they were built from.
pub async fn delete_model(pool: &SqlitePool, course_id: &str, kind: SubModelKind) -> Result<()> {
    sqlx::query("DELETE FROM models WHERE course_id = ? AND kind = ?")
        .bind(course_id)
        .bind(kind.as_str())
        .execute(pool)
        .await
        .context("Failed to delete sub-model")?;

    Ok(())
}
