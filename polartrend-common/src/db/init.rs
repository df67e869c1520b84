//! Database initialization
//!
//! Opens (or creates) the SQLite database, applies the pragmas the service
//! relies on, and creates all tables idempotently. Safe to call on every
//! startup.

use crate::Result;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::path::Path;
use tracing::{info, warn};

/// Initialize database connection and create tables if needed
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .connect(&db_url)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    configure_pragmas(&pool).await?;
    create_tables(&pool).await?;
    init_default_settings(&pool).await?;

    Ok(pool)
}

/// Open an in-memory database with the full schema (test helper)
pub async fn init_in_memory() -> Result<SqlitePool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await?;

    configure_pragmas(&pool).await?;
    create_tables(&pool).await?;
    init_default_settings(&pool).await?;

    Ok(pool)
}

async fn configure_pragmas(pool: &SqlitePool) -> Result<()> {
    sqlx::query("PRAGMA foreign_keys = ON").execute(pool).await?;

    // WAL allows concurrent readers while the poller or snapshot job writes
    sqlx::query("PRAGMA journal_mode = WAL").execute(pool).await?;

    sqlx::query("PRAGMA busy_timeout = 5000").execute(pool).await?;

    Ok(())
}

async fn create_tables(pool: &SqlitePool) -> Result<()> {
    create_settings_table(pool).await?;
    create_users_table(pool).await?;
    create_trends_table(pool).await?;
    create_reddit_mentions_table(pool).await?;
    create_candidate_mentions_table(pool).await?;
    create_similar_trends_table(pool).await?;
    create_trend_history_table(pool).await?;

    Ok(())
}

/// Create the settings table
///
/// Stores runtime tunables and the session signing secret.
pub async fn create_settings_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS settings (
            key TEXT PRIMARY KEY,
            value TEXT,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_users_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id TEXT PRIMARY KEY,
            email TEXT NOT NULL UNIQUE,
            name TEXT,
            password_hash TEXT NOT NULL,
            password_salt TEXT NOT NULL,
            role TEXT NOT NULL DEFAULT 'USER' CHECK (role IN ('USER', 'ADMIN')),
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_trends_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS trends (
            id TEXT PRIMARY KEY,
            title TEXT NOT NULL,
            slug TEXT NOT NULL,
            description TEXT,
            mentions_24h INTEGER NOT NULL DEFAULT 0,
            historical_count INTEGER NOT NULL DEFAULT 0,
            maturity_stage TEXT NOT NULL CHECK (maturity_stage IN ('DISCOVERY', 'POLAR_TREND', 'EARLY_MAINSTREAM', 'SATURATION')),
            accuracy_status TEXT NOT NULL CHECK (accuracy_status IN ('TOO_EARLY', 'RISING', 'EXPLODING')),
            first_detected_at TIMESTAMP NOT NULL,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            CHECK (mentions_24h >= 0),
            CHECK (historical_count >= 0)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_trends_title ON trends(title)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_trends_stage ON trends(maturity_stage)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_trends_mentions ON trends(mentions_24h)")
        .execute(pool)
        .await?;

    Ok(())
}

async fn create_reddit_mentions_table(pool: &SqlitePool) -> Result<()> {
    // post_url is the natural dedup key within a trend
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS reddit_mentions (
            id TEXT PRIMARY KEY,
            trend_id TEXT NOT NULL REFERENCES trends(id) ON DELETE CASCADE,
            subreddit TEXT NOT NULL,
            post_title TEXT NOT NULL,
            post_url TEXT NOT NULL,
            mentioned_at TIMESTAMP NOT NULL,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            UNIQUE (trend_id, post_url)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_reddit_mentions_trend ON reddit_mentions(trend_id, mentioned_at)")
        .execute(pool)
        .await?;

    Ok(())
}

async fn create_candidate_mentions_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS reddit_candidate_mentions (
            id TEXT PRIMARY KEY,
            candidate TEXT NOT NULL,
            subreddit TEXT NOT NULL,
            post_title TEXT NOT NULL,
            post_url TEXT NOT NULL UNIQUE,
            mentioned_at TIMESTAMP NOT NULL,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_candidates_keyword ON reddit_candidate_mentions(candidate, mentioned_at)")
        .execute(pool)
        .await?;

    Ok(())
}

async fn create_similar_trends_table(pool: &SqlitePool) -> Result<()> {
    // Edges are always written as symmetric pairs with equal scores
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS similar_trends (
            from_trend_id TEXT NOT NULL REFERENCES trends(id) ON DELETE CASCADE,
            to_trend_id TEXT NOT NULL REFERENCES trends(id) ON DELETE CASCADE,
            similarity_score REAL NOT NULL,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            PRIMARY KEY (from_trend_id, to_trend_id),
            CHECK (similarity_score >= 0.0 AND similarity_score <= 1.0),
            CHECK (from_trend_id <> to_trend_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_similar_trends_from ON similar_trends(from_trend_id, similarity_score)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_similar_trends_to ON similar_trends(to_trend_id)")
        .execute(pool)
        .await?;

    Ok(())
}

async fn create_trend_history_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS trend_history (
            id TEXT PRIMARY KEY,
            trend_id TEXT NOT NULL REFERENCES trends(id) ON DELETE CASCADE,
            snapshot_date TIMESTAMP NOT NULL,
            mentions_24h INTEGER NOT NULL,
            maturity_stage TEXT NOT NULL CHECK (maturity_stage IN ('DISCOVERY', 'POLAR_TREND', 'EARLY_MAINSTREAM', 'SATURATION')),
            accuracy_status TEXT NOT NULL CHECK (accuracy_status IN ('TOO_EARLY', 'RISING', 'EXPLODING')),
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_trend_history_trend ON trend_history(trend_id, snapshot_date)")
        .execute(pool)
        .await?;

    Ok(())
}

/// Initialize or update default settings
///
/// Ensures all runtime tunables exist with default values; NULL values are
/// reset to their defaults.
async fn init_default_settings(pool: &SqlitePool) -> Result<()> {
    // Ingestion poller
    ensure_setting(pool, "poll_interval_secs", "30").await?;
    ensure_setting(pool, "reddit_page_size", "25").await?;
    ensure_setting(pool, "trend_threshold", "1").await?;
    ensure_setting(pool, "candidate_window_minutes", "1440").await?; // 24 hours

    // Snapshot job
    ensure_setting(pool, "snapshot_interval_secs", "60").await?;

    // Session lifetimes
    ensure_setting(pool, "access_token_ttl_secs", "3600").await?; // 1 hour
    ensure_setting(pool, "refresh_token_ttl_secs", "7776000").await?; // 90 days

    info!("Default settings initialized");
    Ok(())
}

/// Ensure a setting exists with the specified default value
///
/// If the setting doesn't exist, it will be created with the default.
/// If the setting exists but has a NULL value, it will be reset to the default.
pub async fn ensure_setting(pool: &SqlitePool, key: &str, default_value: &str) -> Result<()> {
    let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM settings WHERE key = ?)")
        .bind(key)
        .fetch_one(pool)
        .await?;

    if !exists {
        // INSERT OR IGNORE handles concurrent initialization races
        sqlx::query("INSERT OR IGNORE INTO settings (key, value) VALUES (?, ?)")
            .bind(key)
            .bind(default_value)
            .execute(pool)
            .await?;

        return Ok(());
    }

    let value: Option<String> = sqlx::query_scalar("SELECT value FROM settings WHERE key = ?")
        .bind(key)
        .fetch_one(pool)
        .await?;

    if value.is_none() {
        sqlx::query("UPDATE settings SET value = ? WHERE key = ?")
            .bind(default_value)
            .bind(key)
            .execute(pool)
            .await?;

        warn!("Setting '{}' was NULL, reset to default: {}", key, default_value);
    }

    Ok(())
}
