use anyhow::{Context, Result};
use sqlx::SqlitePool;
use tracing::debug;

/// Run all pending migrations.
pub async fn run(pool: &SqlitePool) -> Result<()> {
    create_migration_table(pool).await?;
    let current_version = get_schema_version(pool).await?;

    if current_version < 1 {
        debug!("Running migration v1");
        run_migration_v1(pool).await?;
        set_schema_version(pool, 1).await?;
    }

    Ok(())
}

async fn create_migration_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r"
        CREATE TABLE IF NOT EXISTS _schema_version (
            version INTEGER PRIMARY KEY
        )
        ",
    )
    .execute(pool)
    .await
    .context("Failed to create schema version table")?;

    Ok(())
}

async fn get_schema_version(pool: &SqlitePool) -> Result<i32> {
    let row: Option<(i32,)> = sqlx::query_as("SELECT version FROM _schema_version LIMIT 1")
        .fetch_optional(pool)
        .await
        .context("Failed to get schema version")?;

    Ok(row.map_or(0, |(v,)| v))
}

async fn set_schema_version(pool: &SqlitePool, version: i32) -> Result<()> {
    sqlx::query("DELETE FROM _schema_version")
        .execute(pool)
        .await?;
    sqlx::query("INSERT INTO _schema_version (version) VALUES (?)")
        .bind(version)
        .execute(pool)
        .await?;
    Ok(())
}

async fn run_migration_v1(pool: &SqlitePool) -> Result<()> {
    debug!("Running migration v1: creating initial schema");

    // Courses table: sync checkpoint plus denormalized counters
    sqlx::query(
        r"
        CREATE TABLE IF NOT EXISTS courses (
            course_id TEXT PRIMARY KEY,
            last_sync_at TEXT,
            num_posts INTEGER NOT NULL DEFAULT 0,
            num_students INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        )
        ",
    )
    .execute(pool)
    .await
    .context("Failed to create courses table")?;

    // Posts table: one row per (course, post), list fields as JSON
    sqlx::query(
        r"
        CREATE TABLE IF NOT EXISTS posts (
            course_id TEXT NOT NULL,
            post_id INTEGER NOT NULL,
            created TEXT NOT NULL,
            modified TEXT NOT NULL,
            subject TEXT NOT NULL,
            body TEXT NOT NULL,
            tags TEXT NOT NULL DEFAULT '[]',
            post_type TEXT,
            student_answer TEXT,
            instructor_answer TEXT,
            followups TEXT NOT NULL DEFAULT '[]',
            num_views INTEGER NOT NULL DEFAULT 0,
            num_unresolved_followups INTEGER NOT NULL DEFAULT 0,
            resolved INTEGER NOT NULL DEFAULT 0,
            assignees TEXT NOT NULL DEFAULT '[]',
            content_hash TEXT NOT NULL,
            synced_at TEXT NOT NULL DEFAULT (datetime('now')),
            PRIMARY KEY (course_id, post_id)
        )
        ",
    )
    .execute(pool)
    .await
    .context("Failed to create posts table")?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_posts_course ON posts(course_id)")
        .execute(pool)
        .await
        .context("Failed to create posts course index")?;

    // Sub-model artifacts: one row per (course, kind), written atomically
    sqlx::query(
        r"
        CREATE TABLE IF NOT EXISTS models (
            course_id TEXT NOT NULL,
            kind TEXT NOT NULL,
            vectorizer TEXT NOT NULL,
            matrix TEXT NOT NULL,
            post_ids TEXT NOT NULL,
            built_at TEXT NOT NULL DEFAULT (datetime('now')),
            PRIMARY KEY (course_id, kind)
        )
        ",
    )
    .execute(pool)
    .await
    .context("Failed to create models table")?;

    Ok(())
}
